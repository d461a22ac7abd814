use crate::error::PatchError;
use crate::gpu::{DEVICE_IDENTITY, GpuIdentity};
use crate::rules::{Category, PatchRule, Profile, RuleSet};
use serde::Deserialize;

/// Top-level rule catalog document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Catalog {
	/// Profile used when none is requested.
	pub default_profile: String,

	/// Profile used when the requested one is unknown.
	pub fallback_profile: String,

	/// GPU preset used when none is requested.
	pub default_gpu: String,

	/// Adapter identities to choose from.
	#[serde(default)]
	pub gpus: Vec<GpuIdentity>,

	/// Capability categories, in definition order.
	/// The device-identity category is generated from the selected GPU and
	/// must not be listed here.
	#[serde(default)]
	pub categories: Vec<CategoryDef>,

	/// Profiles composing categories.
	#[serde(default)]
	pub profiles: Vec<ProfileDef>,
}

/// A category as written in the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CategoryDef {
	pub name: String,

	#[serde(default)]
	pub description: String,

	#[serde(default)]
	pub rules: Vec<RuleDef>,
}

/// A profile as written in the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProfileDef {
	pub name: String,

	#[serde(default)]
	pub description: String,

	/// Category names, concatenated in this order.
	#[serde(default)]
	pub categories: Vec<String>,
}

/// A rule as written in the catalog.
///
/// Either `assign` + `value` (a `name = value;` rewrite) or
/// `pattern` + `replacement` (a raw regex rewrite).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleDef {
	/// Identifier, unique across the catalog.
	pub id: String,

	/// Variable whose assigned value is rewritten.
	pub assign: Option<String>,

	/// New value for `assign`, without the trailing `;`.
	pub value: Option<String>,

	/// Raw regex (mutually exclusive with `assign`).
	pub pattern: Option<String>,

	/// Replacement template for `pattern`.
	pub replacement: Option<String>,
}

impl RuleDef {
	/// Validate the definition and turn it into a [`PatchRule`].
	pub fn to_rule(&self) -> Result<PatchRule, PatchError> {
		match (&self.assign, &self.pattern) {
			(Some(_), Some(_)) => Err(PatchError::MutuallyExclusive {
				id: self.id.clone(),
				option1: "assign".to_string(),
				option2: "pattern".to_string(),
			}),
			(Some(variable), None) => match &self.value {
				Some(value) if self.replacement.is_none() => {
					Ok(PatchRule::assignment(&self.id, variable, value))
				}
				Some(_) => Err(PatchError::MutuallyExclusive {
					id: self.id.clone(),
					option1: "value".to_string(),
					option2: "replacement".to_string(),
				}),
				None => Err(PatchError::IncompleteRule {
					id: self.id.clone(),
				}),
			},
			(None, Some(pattern)) => match &self.replacement {
				Some(replacement) if self.value.is_none() => {
					Ok(PatchRule::new(&self.id, pattern, replacement))
				}
				Some(_) => Err(PatchError::MutuallyExclusive {
					id: self.id.clone(),
					option1: "value".to_string(),
					option2: "replacement".to_string(),
				}),
				None => Err(PatchError::IncompleteRule {
					id: self.id.clone(),
				}),
			},
			(None, None) => Err(PatchError::IncompleteRule {
				id: self.id.clone(),
			}),
		}
	}
}

impl Catalog {
	/// Validate every rule definition and the preset table.
	///
	/// Profile and category cross-references are checked when the rule set
	/// is built, see [`crate::rules::RuleSet::new`].
	pub fn validate(&self) -> Result<(), PatchError> {
		for category in &self.categories {
			if category.name == DEVICE_IDENTITY {
				return Err(PatchError::Duplicate {
					kind: "category",
					name: category.name.clone(),
				});
			}
			for rule in &category.rules {
				rule.to_rule()?;
			}
		}

		for (i, gpu) in self.gpus.iter().enumerate() {
			if self.gpus[..i].iter().any(|other| other.name == gpu.name) {
				return Err(PatchError::Duplicate {
					kind: "GPU preset",
					name: gpu.name.clone(),
				});
			}
		}

		self.gpu(None).map(|_| ())
	}

	/// Look up a GPU preset, or the default one when `name` is `None`.
	pub fn gpu(&self, name: Option<&str>) -> Result<&GpuIdentity, PatchError> {
		let name = name.unwrap_or(self.default_gpu.as_str());
		self.gpus
			.iter()
			.find(|gpu| gpu.name == name)
			.ok_or_else(|| PatchError::UnknownGpuPreset {
				name: name.to_string(),
			})
	}

	/// Build the compiled rule set for the given adapter.
	///
	/// The generated device-identity category comes first, followed by the
	/// catalog categories in definition order.
	pub fn rule_set(&self, gpu: &GpuIdentity) -> Result<RuleSet, PatchError> {
		let mut categories = vec![gpu.category()];
		for def in &self.categories {
			let rules = def
				.rules
				.iter()
				.map(RuleDef::to_rule)
				.collect::<Result<Vec<_>, _>>()?;
			categories.push(Category::new(&def.name, &def.description, rules));
		}

		let profiles = self
			.profiles
			.iter()
			.map(|def| Profile::new(&def.name, &def.categories))
			.collect();

		RuleSet::new(
			categories,
			profiles,
			&self.default_profile,
			&self.fallback_profile,
		)
	}
}
