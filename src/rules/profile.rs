use crate::error::{PatchError, Result};
use crate::rules::rule::{CompiledRule, PatchRule, compile_rules};
use std::collections::HashSet;

/// A named, ordered group of rules for one capability area.
#[derive(Debug, Clone)]
pub struct Category {
	pub name: String,
	pub description: String,
	pub rules: Vec<PatchRule>,
}

impl Category {
	pub fn new(
		name: impl Into<String>,
		description: impl Into<String>,
		rules: Vec<PatchRule>,
	) -> Self {
		Category {
			name: name.into(),
			description: description.into(),
			rules,
		}
	}
}

/// A named, ordered list of category names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
	pub name: String,
	pub categories: Vec<String>,
}

impl Profile {
	pub fn new<I, S>(name: impl Into<String>, categories: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Profile {
			name: name.into(),
			categories: categories.into_iter().map(Into::into).collect(),
		}
	}
}

/// A compiled category, kept in definition order inside a [`RuleSet`].
#[derive(Debug, Clone)]
struct CompiledCategory {
	category: Category,
	rules: Vec<CompiledRule>,
}

/// The outcome of resolving a profile name.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
	/// Name of the profile the rules came from.
	pub name: String,

	/// Name that was asked for.
	pub requested: String,

	/// Concatenated rules of every category, in profile order.
	pub rules: Vec<CompiledRule>,
}

impl ResolvedProfile {
	/// True when the requested name was unknown and the fallback was used.
	pub fn fell_back(&self) -> bool {
		self.name != self.requested
	}
}

/// Immutable set of categories and profiles, compiled once at start-up.
///
/// Construction validates everything a run depends on: rule ids and names are
/// unique, profiles only reference known categories, the default and fallback
/// profiles exist, and every pattern compiles.
#[derive(Debug, Clone)]
pub struct RuleSet {
	categories: Vec<CompiledCategory>,
	profiles: Vec<Profile>,
	default_profile: String,
	fallback_index: usize,
}

impl RuleSet {
	pub fn new(
		categories: Vec<Category>,
		profiles: Vec<Profile>,
		default_profile: impl Into<String>,
		fallback_profile: impl Into<String>,
	) -> Result<Self> {
		let default_profile = default_profile.into();
		let fallback_profile = fallback_profile.into();

		let mut category_names = HashSet::new();
		let mut rule_ids = HashSet::new();
		for category in &categories {
			if !category_names.insert(category.name.as_str()) {
				return Err(PatchError::Duplicate {
					kind: "category",
					name: category.name.clone(),
				});
			}
			for rule in &category.rules {
				if !rule_ids.insert(rule.id.as_str()) {
					return Err(PatchError::Duplicate {
						kind: "rule id",
						name: rule.id.clone(),
					});
				}
			}
		}

		let mut profile_names = HashSet::new();
		for profile in &profiles {
			if !profile_names.insert(profile.name.as_str()) {
				return Err(PatchError::Duplicate {
					kind: "profile",
					name: profile.name.clone(),
				});
			}
			if let Some(missing) = profile
				.categories
				.iter()
				.find(|name| !category_names.contains(name.as_str()))
			{
				return Err(PatchError::UnknownCategory {
					profile: profile.name.clone(),
					category: missing.clone(),
				});
			}
		}

		if !profile_names.contains(default_profile.as_str()) {
			return Err(PatchError::UnknownProfile {
				name: default_profile,
			});
		}
		let fallback_index = profiles
			.iter()
			.position(|p| p.name == fallback_profile)
			.ok_or(PatchError::UnknownProfile {
				name: fallback_profile,
			})?;

		let categories = categories
			.into_iter()
			.map(|category| {
				let rules = compile_rules(&category.rules)?;
				Ok(CompiledCategory { category, rules })
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(RuleSet {
			categories,
			profiles,
			default_profile,
			fallback_index,
		})
	}

	pub fn default_profile(&self) -> &str {
		&self.default_profile
	}

	pub fn fallback_profile(&self) -> &str {
		&self.profiles[self.fallback_index].name
	}

	pub fn profiles(&self) -> &[Profile] {
		&self.profiles
	}

	pub fn categories(&self) -> impl Iterator<Item = &Category> {
		self.categories.iter().map(|c| &c.category)
	}

	pub fn profile(&self, name: &str) -> Option<&Profile> {
		self.profiles.iter().find(|p| p.name == name)
	}

	pub fn category(&self, name: &str) -> Option<&Category> {
		self.categories().find(|c| c.name == name)
	}

	/// Resolve a profile name to its flat, ordered rule list.
	///
	/// An unknown name resolves to the fallback profile instead of failing,
	/// so a partial setup still patches the minimum. Check
	/// [`ResolvedProfile::fell_back`] to report it.
	pub fn resolve(&self, name: &str) -> ResolvedProfile {
		let profile = self
			.profile(name)
			.unwrap_or(&self.profiles[self.fallback_index]);

		let rules = profile
			.categories
			.iter()
			.filter_map(|name| self.categories.iter().find(|c| &c.category.name == name))
			.flat_map(|c| c.rules.iter().cloned())
			.collect();

		ResolvedProfile {
			name: profile.name.clone(),
			requested: name.to_string(),
			rules,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_categories() -> Vec<Category> {
		vec![
			Category::new(
				"identity",
				"Adapter identity",
				vec![
					PatchRule::assignment("vid", "adapter_id.vendor_id", "0x1002"),
					PatchRule::assignment("did", "adapter_id.device_id", "0x73DF"),
				],
			),
			Category::new(
				"waves",
				"Wave intrinsics",
				vec![PatchRule::assignment("wv0", "options1.WaveOps", "TRUE")],
			),
		]
	}

	fn sample_profiles() -> Vec<Profile> {
		vec![
			Profile::new("full", ["identity", "waves"]),
			Profile::new("minimal", ["identity"]),
		]
	}

	fn ids(resolved: &ResolvedProfile) -> Vec<&str> {
		resolved.rules.iter().map(|r| r.id()).collect()
	}

	#[test]
	fn test_resolve_concatenates_in_profile_order() {
		let set = RuleSet::new(sample_categories(), sample_profiles(), "full", "minimal").unwrap();
		let resolved = set.resolve("full");

		assert_eq!(resolved.name, "full");
		assert!(!resolved.fell_back());
		assert_eq!(ids(&resolved), vec!["vid", "did", "wv0"]);
	}

	#[test]
	fn test_resolve_follows_profile_not_definition_order() {
		let profiles = vec![
			Profile::new("reversed", ["waves", "identity"]),
			Profile::new("minimal", ["identity"]),
		];
		let set = RuleSet::new(sample_categories(), profiles, "reversed", "minimal").unwrap();

		assert_eq!(ids(&set.resolve("reversed")), vec!["wv0", "vid", "did"]);
	}

	#[test]
	fn test_unknown_profile_falls_back() {
		let set = RuleSet::new(sample_categories(), sample_profiles(), "full", "minimal").unwrap();
		let resolved = set.resolve("ultra");

		assert_eq!(resolved.name, "minimal");
		assert_eq!(resolved.requested, "ultra");
		assert!(resolved.fell_back());
		assert_eq!(ids(&resolved), vec!["vid", "did"]);
	}

	#[test]
	fn test_empty_profile_resolves_to_no_rules() {
		let profiles = vec![Profile::new("none", Vec::<String>::new())];
		let set = RuleSet::new(sample_categories(), profiles, "none", "none").unwrap();

		assert!(set.resolve("none").rules.is_empty());
	}

	#[test]
	fn test_duplicate_rule_id_rejected() {
		let mut categories = sample_categories();
		categories[1]
			.rules
			.push(PatchRule::assignment("vid", "x.y", "1"));

		match RuleSet::new(categories, sample_profiles(), "full", "minimal").unwrap_err() {
			PatchError::Duplicate { kind, name } => {
				assert_eq!(kind, "rule id");
				assert_eq!(name, "vid");
			}
			other => panic!("Expected Duplicate error, got {other:?}"),
		}
	}

	#[test]
	fn test_duplicate_category_rejected() {
		let mut categories = sample_categories();
		categories.push(Category::new("waves", "", Vec::new()));

		assert!(matches!(
			RuleSet::new(categories, sample_profiles(), "full", "minimal"),
			Err(PatchError::Duplicate { kind: "category", .. })
		));
	}

	#[test]
	fn test_profile_with_unknown_category_rejected() {
		let profiles = vec![
			Profile::new("full", ["identity", "mesh"]),
			Profile::new("minimal", ["identity"]),
		];

		match RuleSet::new(sample_categories(), profiles, "full", "minimal").unwrap_err() {
			PatchError::UnknownCategory { profile, category } => {
				assert_eq!(profile, "full");
				assert_eq!(category, "mesh");
			}
			other => panic!("Expected UnknownCategory error, got {other:?}"),
		}
	}

	#[test]
	fn test_missing_fallback_rejected() {
		assert!(matches!(
			RuleSet::new(sample_categories(), sample_profiles(), "full", "tiny"),
			Err(PatchError::UnknownProfile { name }) if name == "tiny"
		));
	}

	#[test]
	fn test_invalid_pattern_rejected_at_construction() {
		let categories = vec![Category::new(
			"identity",
			"",
			vec![PatchRule::new("bad", "(unclosed", "x")],
		)];
		let profiles = vec![Profile::new("minimal", ["identity"])];

		assert!(matches!(
			RuleSet::new(categories, profiles, "minimal", "minimal"),
			Err(PatchError::InvalidRegex { .. })
		));
	}
}
