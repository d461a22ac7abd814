//! Patch rules and their composition.
//!
//! This module handles:
//! - The rule record and the `name = value;` pattern generator
//! - Grouping rules into categories and categories into profiles
//! - Resolving a profile name to an ordered rule list

pub mod profile;
pub mod rule;

pub use profile::{Category, Profile, ResolvedProfile, RuleSet};
pub use rule::{
	CompiledRule, PatchRule, assignment_pattern, assignment_replacement, compile_rules,
};
