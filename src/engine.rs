//! Patch application.
//!
//! This module handles:
//! - Applying an ordered rule list to in-memory text or raw file content
//! - Patching a single file, writing only when the content changed
//! - Running a resolved profile over every discovered target file

use crate::discovery::TargetSpec;
use crate::error::{PatchError, Result};
use crate::rules::{CompiledRule, RuleSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File access used by the engine.
pub trait FileSystem {
	fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
	fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl FileSystem for DiskFs {
	fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
		std::fs::read(path)
	}

	fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
		std::fs::write(path, contents)
	}
}

/// Text after applying a rule list, with the ids of the rules that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patched<'r> {
	pub content: String,
	pub matched: Vec<&'r str>,
}

/// Apply `rules` to `content` in order.
///
/// Each rule sees the output of the previous one. A rule without a match
/// leaves the text as it is.
pub fn apply(content: &str, rules: &[CompiledRule]) -> String {
	apply_traced(content, rules).content
}

/// Like [`apply`], also recording which rules matched.
pub fn apply_traced<'r>(content: &str, rules: &'r [CompiledRule]) -> Patched<'r> {
	let mut text = content.to_string();
	let mut matched = Vec::new();

	for rule in rules {
		if let Some(next) = rule.apply(&text) {
			text = next;
			matched.push(rule.id());
		}
	}

	Patched {
		content: text,
		matched,
	}
}

/// Apply `rules` to raw file content in order, recording which rules matched.
///
/// Bytes that are not valid UTF-8 never match a rule and are kept as they are.
pub fn apply_bytes_traced<'r>(
	content: &[u8],
	rules: &'r [CompiledRule],
) -> (Vec<u8>, Vec<&'r str>) {
	let mut bytes = content.to_vec();
	let mut matched = Vec::new();

	for rule in rules {
		if let Some(next) = rule.apply_bytes(&bytes) {
			bytes = next;
			matched.push(rule.id());
		}
	}

	(bytes, matched)
}

/// Patch one file. Returns whether its content changed.
///
/// The file is patched as raw bytes, so content that is not valid UTF-8 is
/// written back unchanged around the rewritten statements. Nothing is written
/// when the patched content equals the original, or when `dry_run` is set.
pub fn apply_to_file<F: FileSystem>(
	fs: &F,
	path: &Path,
	rules: &[CompiledRule],
	dry_run: bool,
) -> Result<bool> {
	let original = fs.read(path).map_err(|source| PatchError::ReadError {
		path: path.to_path_buf(),
		source,
	})?;

	if std::str::from_utf8(&original).is_err() {
		debug!("{} is not valid UTF-8, invalid bytes are kept", path.display());
	}

	let (patched, matched) = apply_bytes_traced(&original, rules);
	for id in &matched {
		debug!("{}: rule {id} matched", path.display());
	}

	if patched == original {
		return Ok(false);
	}

	if !dry_run {
		fs.write(path, &patched)
			.map_err(|source| PatchError::WriteError {
				path: path.to_path_buf(),
				source,
			})?;
	}

	Ok(true)
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct RunReport {
	/// Directory the target files were searched in.
	pub search_root: PathBuf,

	/// Number of target files found.
	pub visited: usize,

	/// Files whose content changed (or would change, in a dry run).
	pub changed: Vec<PathBuf>,

	/// Files that could not be read or written.
	pub failed: Vec<(PathBuf, PatchError)>,
}

impl RunReport {
	pub fn changed_count(&self) -> usize {
		self.changed.len()
	}

	pub fn is_clean(&self) -> bool {
		self.failed.is_empty()
	}
}

/// Applies one resolved rule list to every target file under a root.
#[derive(Debug)]
pub struct Patcher<F = DiskFs> {
	rules: Vec<CompiledRule>,
	targets: TargetSpec,
	fs: F,
	dry_run: bool,
}

impl Patcher<DiskFs> {
	pub fn new(rules: Vec<CompiledRule>) -> Self {
		Patcher::with_fs(rules, DiskFs)
	}

	/// Resolve `profile` from `rule_set` and build a patcher for it.
	///
	/// An unknown profile falls back to the rule set's fallback profile with
	/// a warning. A profile that resolves to no rules is an error.
	pub fn for_profile(rule_set: &RuleSet, profile: &str) -> Result<Self> {
		let resolved = rule_set.resolve(profile);
		if resolved.fell_back() {
			warn!(
				"Unknown profile {:?}, falling back to {:?}",
				resolved.requested, resolved.name
			);
		}
		if resolved.rules.is_empty() {
			return Err(PatchError::NoRules {
				name: resolved.name,
			});
		}
		debug!(
			"Profile {} resolved to {} rules",
			resolved.name,
			resolved.rules.len()
		);
		Ok(Patcher::new(resolved.rules))
	}
}

impl<F: FileSystem> Patcher<F> {
	pub fn with_fs(rules: Vec<CompiledRule>, fs: F) -> Self {
		Patcher {
			rules,
			targets: TargetSpec::default(),
			fs,
			dry_run: false,
		}
	}

	pub fn targets(mut self, targets: TargetSpec) -> Self {
		self.targets = targets;
		self
	}

	pub fn dry_run(mut self, dry_run: bool) -> Self {
		self.dry_run = dry_run;
		self
	}

	pub fn rules(&self) -> &[CompiledRule] {
		&self.rules
	}

	/// Patch a single file with this patcher's rules.
	pub fn apply_to_file(&self, path: &Path) -> Result<bool> {
		apply_to_file(&self.fs, path, &self.rules, self.dry_run)
	}

	/// Discover target files under `root` and patch each of them.
	///
	/// Per-file read and write failures are logged and collected in the
	/// report; only an inaccessible root aborts the run.
	pub fn run(&self, root: &Path) -> Result<RunReport> {
		let discovery = self.targets.discover(root)?;
		if discovery.files.is_empty() {
			info!("No target files under {}", discovery.search_root.display());
		}

		let mut report = RunReport {
			search_root: discovery.search_root,
			visited: discovery.files.len(),
			..Default::default()
		};

		for path in discovery.files {
			match self.apply_to_file(&path) {
				Ok(true) => {
					if self.dry_run {
						info!("Would patch: {}", path.display());
					} else {
						info!("Patched: {}", path.display());
					}
					report.changed.push(path);
				}
				Ok(false) => debug!("Unchanged: {}", path.display()),
				Err(e) => {
					warn!("Skipping {}: {e}", path.display());
					report.failed.push((path, e));
				}
			}
		}

		Ok(report)
	}
}

/// Resolve `profile`, patch every target file under `root`, and return how
/// many files changed.
pub fn run(rule_set: &RuleSet, root: &Path, profile: &str) -> Result<usize> {
	let report = Patcher::for_profile(rule_set, profile)?.run(root)?;
	Ok(report.changed_count())
}
