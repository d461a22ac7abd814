use std::path::PathBuf;

/// Library-level structured errors for cappatch.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
	#[error("Failed to parse rule catalog: {origin}")]
	CatalogParseError {
		origin: String,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid regex pattern in rule {id}: {pattern}")]
	InvalidRegex {
		id: String,
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Mutually exclusive options in rule {id}: {option1} and {option2}")]
	MutuallyExclusive {
		id: String,
		option1: String,
		option2: String,
	},

	#[error("Rule {id} needs either assign/value or pattern/replacement")]
	IncompleteRule { id: String },

	#[error("Duplicate {kind} in rule catalog: {name}")]
	Duplicate { kind: &'static str, name: String },

	#[error("Profile {profile} references unknown category: {category}")]
	UnknownCategory { profile: String, category: String },

	#[error("Profile not defined in rule catalog: {name}")]
	UnknownProfile { name: String },

	#[error("Unknown GPU preset: {name}")]
	UnknownGpuPreset { name: String },

	#[error("Profile {name} resolves to no rules")]
	NoRules { name: String },

	#[error("Search root is not accessible: {path}")]
	RootInaccessible {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to read file: {path}")]
	ReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write file: {path}")]
	WriteError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Result type alias using PatchError.
pub type Result<T> = std::result::Result<T, PatchError>;
