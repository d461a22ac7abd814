//! Target file discovery.
//!
//! Finds the files a run will patch: every file named like a target under the
//! search root, skipping excluded directories.

use crate::error::{PatchError, Result};
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// What to look for and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
	/// Base file names to patch.
	pub file_names: Vec<String>,

	/// Directory names whose subtrees are never patched.
	pub excluded_dirs: Vec<String>,

	/// Subdirectories of the root tried first, in priority order.
	pub probe_dirs: Vec<PathBuf>,
}

impl Default for TargetSpec {
	fn default() -> Self {
		TargetSpec {
			file_names: vec!["device.c".to_string()],
			excluded_dirs: ["tests", "demos", "include", ".git"]
				.into_iter()
				.map(String::from)
				.collect(),
			probe_dirs: vec![PathBuf::from("libs/vkd3d"), PathBuf::from("src")],
		}
	}
}

/// Files found under a root, and the directory they were searched in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
	pub search_root: PathBuf,
	pub files: Vec<PathBuf>,
}

impl TargetSpec {
	/// Discover target files under `root`.
	///
	/// The first probe directory that exists and holds at least one target
	/// file becomes the search root; otherwise `root` itself is searched. A
	/// missing root yields no files.
	pub fn discover(&self, root: &Path) -> Result<Discovery> {
		let root = std::path::absolute(root).map_err(|source| PatchError::RootInaccessible {
			path: root.to_path_buf(),
			source,
		})?;

		for probe in &self.probe_dirs {
			let candidate = root.join(probe);
			if !candidate.is_dir() {
				continue;
			}
			match self.find_files(&candidate) {
				Ok(files) if !files.is_empty() => {
					debug!("Using search root {}", candidate.display());
					return Ok(Discovery {
						search_root: candidate,
						files,
					});
				}
				Ok(_) => {}
				Err(e) => warn!("Skipping probe directory {}: {e}", candidate.display()),
			}
		}

		let files = self.find_files(&root)?;
		Ok(Discovery {
			search_root: root,
			files,
		})
	}

	/// Recursively list target files under `root`, sorted by path.
	///
	/// Excluded directories are pruned by name at any depth below `root`.
	/// Unreadable entries below the root are logged and skipped; a root that
	/// exists but cannot be listed is an error.
	pub fn find_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
		match std::fs::read_dir(root) {
			Ok(_) => {}
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
			Err(source) => {
				return Err(PatchError::RootInaccessible {
					path: root.to_path_buf(),
					source,
				});
			}
		}

		let walker = WalkDir::new(root)
			.follow_links(false)
			.sort_by_file_name()
			.into_iter()
			.filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry));

		let mut files = Vec::new();
		for entry in walker {
			let entry = match entry {
				Ok(e) => e,
				Err(e) if e.depth() == 0 => {
					return Err(PatchError::RootInaccessible {
						path: root.to_path_buf(),
						source: e.into(),
					});
				}
				Err(e) => {
					warn!("Error walking directory {}: {e}", root.display());
					continue;
				}
			};

			if entry.file_type().is_file() && self.is_target(entry.file_name()) {
				files.push(entry.into_path());
			}
		}

		Ok(files)
	}

	fn is_target(&self, name: &OsStr) -> bool {
		self.file_names.iter().any(|target| name == target.as_str())
	}

	fn is_excluded(&self, entry: &DirEntry) -> bool {
		entry.file_type().is_dir()
			&& self
				.excluded_dirs
				.iter()
				.any(|dir| entry.file_name() == dir.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	fn touch(root: &Path, relative: &str) -> PathBuf {
		let path = root.join(relative);
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		fs::write(&path, "adapter_id.vendor_id = 0x10DE;\n").unwrap();
		path
	}

	fn relative(discovery: &Discovery, root: &Path) -> Vec<String> {
		let root = std::path::absolute(root).unwrap();
		discovery
			.files
			.iter()
			.map(|f| {
				f.strip_prefix(&root)
					.unwrap()
					.to_string_lossy()
					.replace('\\', "/")
			})
			.collect()
	}

	#[test]
	fn test_finds_target_files_recursively() {
		let temp = tempfile::tempdir().unwrap();
		touch(temp.path(), "a/device.c");
		touch(temp.path(), "b/c/device.c");
		touch(temp.path(), "b/c/other.c");

		let discovery = TargetSpec::default().discover(temp.path()).unwrap();

		assert_eq!(
			relative(&discovery, temp.path()),
			vec!["a/device.c", "b/c/device.c"]
		);
	}

	#[test]
	fn test_excluded_directories_are_skipped() {
		let temp = tempfile::tempdir().unwrap();
		touch(temp.path(), "tests/device.c");
		touch(temp.path(), "lib/demos/device.c");
		touch(temp.path(), "lib/include/device.c");
		touch(temp.path(), ".git/device.c");
		touch(temp.path(), "lib/device.c");

		let discovery = TargetSpec::default().discover(temp.path()).unwrap();

		assert_eq!(relative(&discovery, temp.path()), vec!["lib/device.c"]);
	}

	#[test]
	fn test_excluded_name_must_be_a_whole_segment() {
		let temp = tempfile::tempdir().unwrap();
		touch(temp.path(), "latests/device.c");
		touch(temp.path(), "tests_extra/device.c");

		let discovery = TargetSpec::default().discover(temp.path()).unwrap();

		assert_eq!(
			relative(&discovery, temp.path()),
			vec!["latests/device.c", "tests_extra/device.c"]
		);
	}

	#[test]
	fn test_root_inside_excluded_name_is_searched() {
		let temp = tempfile::tempdir().unwrap();
		let root = temp.path().join("tests");
		touch(&root, "device.c");

		let discovery = TargetSpec::default().discover(&root).unwrap();

		assert_eq!(discovery.files.len(), 1);
	}

	#[test]
	fn test_probe_prefers_libs_vkd3d() {
		let temp = tempfile::tempdir().unwrap();
		touch(temp.path(), "libs/vkd3d/libs/vkd3d/device.c");
		touch(temp.path(), "src/device.c");
		touch(temp.path(), "elsewhere/device.c");

		let discovery = TargetSpec::default().discover(temp.path()).unwrap();

		assert!(discovery.search_root.ends_with("libs/vkd3d"));
		assert_eq!(discovery.files.len(), 1);
		assert!(discovery.files[0].ends_with("libs/vkd3d/libs/vkd3d/device.c"));
	}

	#[test]
	fn test_probe_skips_directory_without_targets() {
		let temp = tempfile::tempdir().unwrap();
		fs::create_dir_all(temp.path().join("libs/vkd3d")).unwrap();
		touch(temp.path(), "src/device.c");
		touch(temp.path(), "other/device.c");

		let discovery = TargetSpec::default().discover(temp.path()).unwrap();

		assert!(discovery.search_root.ends_with("src"));
		assert_eq!(discovery.files.len(), 1);
	}

	#[test]
	fn test_probe_ignores_excluded_targets() {
		let temp = tempfile::tempdir().unwrap();
		touch(temp.path(), "src/tests/device.c");
		touch(temp.path(), "dlls/device.c");

		let discovery = TargetSpec::default().discover(temp.path()).unwrap();

		assert_eq!(
			discovery.search_root,
			std::path::absolute(temp.path()).unwrap()
		);
		assert_eq!(relative(&discovery, temp.path()), vec!["dlls/device.c"]);
	}

	#[test]
	fn test_missing_root_yields_no_files() {
		let temp = tempfile::tempdir().unwrap();
		let discovery = TargetSpec::default()
			.discover(&temp.path().join("nope"))
			.unwrap();

		assert!(discovery.files.is_empty());
	}

	#[test]
	fn test_discovery_is_repeatable() {
		let temp = tempfile::tempdir().unwrap();
		touch(temp.path(), "z/device.c");
		touch(temp.path(), "a/device.c");
		touch(temp.path(), "m/n/device.c");

		let spec = TargetSpec::default();
		let first = spec.discover(temp.path()).unwrap();
		let second = spec.discover(temp.path()).unwrap();

		assert_eq!(first, second);
	}

	#[test]
	fn test_custom_file_names() {
		let temp = tempfile::tempdir().unwrap();
		touch(temp.path(), "a/device.c");
		touch(temp.path(), "a/caps.c");

		let spec = TargetSpec {
			file_names: vec!["caps.c".to_string()],
			..Default::default()
		};
		let discovery = spec.discover(temp.path()).unwrap();

		assert_eq!(relative(&discovery, temp.path()), vec!["a/caps.c"]);
	}
}
