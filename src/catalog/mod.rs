//! Rule catalog loading for cappatch.
//!
//! This module handles:
//! - Parsing the embedded TOML catalog
//! - Validating rule definitions and GPU presets
//! - Building the compiled rule set for a selected GPU

pub mod parser;
pub mod types;

pub use parser::{BUILTIN_CATALOG, builtin_catalog, parse_catalog_str};
pub use types::{Catalog, CategoryDef, ProfileDef, RuleDef};
