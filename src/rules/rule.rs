use crate::error::{PatchError, Result};
use regex::{Regex, RegexBuilder, bytes};

/// A single text rewrite: pattern, replacement template and identifier.
///
/// The replacement uses `regex` expansion syntax (`${1}`, `$name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRule {
	/// Stable identifier, unique within a rule set.
	pub id: String,

	/// Regex locating the text to rewrite.
	pub pattern: String,

	/// Replacement template, may reference capture groups of `pattern`.
	pub replacement: String,
}

impl PatchRule {
	/// Create a rule from a raw pattern and replacement template.
	pub fn new(
		id: impl Into<String>,
		pattern: impl Into<String>,
		replacement: impl Into<String>,
	) -> Self {
		PatchRule {
			id: id.into(),
			pattern: pattern.into(),
			replacement: replacement.into(),
		}
	}

	/// Create a rule rewriting the value of a `variable = value;` statement.
	pub fn assignment(id: impl Into<String>, variable: &str, value: &str) -> Self {
		PatchRule::new(
			id,
			assignment_pattern(variable),
			assignment_replacement(value),
		)
	}

	/// Compile the pattern in multi-line mode, for both text and raw bytes.
	pub fn compile(&self) -> Result<CompiledRule> {
		let invalid = |source| PatchError::InvalidRegex {
			id: self.id.clone(),
			pattern: self.pattern.clone(),
			source,
		};
		let regex = RegexBuilder::new(&self.pattern)
			.multi_line(true)
			.build()
			.map_err(invalid)?;
		let bytes_regex = bytes::RegexBuilder::new(&self.pattern)
			.multi_line(true)
			.build()
			.map_err(invalid)?;

		Ok(CompiledRule {
			rule: self.clone(),
			regex,
			bytes_regex,
		})
	}
}

/// Build the match pattern for a `variable = value;` statement.
///
/// Group 1 captures the variable name, the `=` and the whitespace around it.
/// Group 2 captures the value up to the terminating `;`, which is matched but
/// not captured. The value may not start with `=`, so `name == x` comparisons
/// are left alone.
///
/// The variable name is escaped. A name starting with a word character must
/// start on a word boundary, so `foo.bar` never matches inside `xfoo.bar`;
/// a name starting with punctuation (`->field`, `(*p).x`) is its own
/// delimiter and needs no boundary.
pub fn assignment_pattern(variable: &str) -> String {
	let boundary = match variable.chars().next() {
		Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
		_ => "",
	};
	format!(
		r"({boundary}{}\s*=\s*)([^=;][^;]*);",
		regex::escape(variable)
	)
}

/// Build the replacement template that keeps group 1 and writes `value;`.
pub fn assignment_replacement(value: &str) -> String {
	format!("${{1}}{};", value.replace('$', "$$"))
}

/// A rule with its pattern compiled, ready to apply.
#[derive(Debug, Clone)]
pub struct CompiledRule {
	/// The source rule.
	pub rule: PatchRule,

	regex: Regex,
	bytes_regex: bytes::Regex,
}

impl CompiledRule {
	pub fn id(&self) -> &str {
		&self.rule.id
	}

	/// Check whether the rule matches anywhere in `text`.
	pub fn is_match(&self, text: &str) -> bool {
		self.regex.is_match(text)
	}

	/// Replace every match in `text`.
	///
	/// Returns `None` when nothing matched.
	pub fn apply(&self, text: &str) -> Option<String> {
		if !self.regex.is_match(text) {
			return None;
		}
		Some(
			self.regex
				.replace_all(text, self.rule.replacement.as_str())
				.into_owned(),
		)
	}

	/// Replace every match in raw file content.
	///
	/// Byte sequences that are not valid UTF-8 never match and are kept
	/// exactly as they are. Returns `None` when nothing matched.
	pub fn apply_bytes(&self, content: &[u8]) -> Option<Vec<u8>> {
		if !self.bytes_regex.is_match(content) {
			return None;
		}
		Some(
			self.bytes_regex
				.replace_all(content, self.rule.replacement.as_bytes())
				.into_owned(),
		)
	}
}

/// Compile a list of rules, failing on the first malformed pattern.
pub fn compile_rules(rules: &[PatchRule]) -> Result<Vec<CompiledRule>> {
	rules.iter().map(PatchRule::compile).collect()
}
