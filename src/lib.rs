//! Cappatch - retarget hard-coded capability constants in a source tree.
//!
//! This library provides the core functionality for cappatch, including:
//! - Patch rules and the `name = value;` pattern generator
//! - Rule categories composed into named profiles
//! - The embedded rule catalog and GPU identity presets
//! - Target file discovery and the patch engine
//!
//! # Example
//!
//! ```no_run
//! use cappatch_cli::catalog::builtin_catalog;
//! use cappatch_cli::engine::Patcher;
//! use std::path::Path;
//!
//! let catalog = builtin_catalog().unwrap();
//! let gpu = catalog.gpu(None).unwrap();
//! let rule_set = catalog.rule_set(gpu).unwrap();
//!
//! let report = Patcher::for_profile(&rule_set, "high")
//!     .unwrap()
//!     .run(Path::new("vkd3d-proton"))
//!     .unwrap();
//! println!("{} file(s) changed", report.changed_count());
//! ```

pub mod catalog;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod rules;

pub use error::{PatchError, Result};
