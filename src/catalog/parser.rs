use crate::catalog::types::Catalog;
use crate::error::{PatchError, Result};

/// The catalog compiled into the binary.
pub const BUILTIN_CATALOG: &str = include_str!("catalog.toml");

/// Parse and validate the built-in catalog.
pub fn builtin_catalog() -> Result<Catalog> {
	parse_catalog_str(BUILTIN_CATALOG, "built-in catalog")
}

/// Parse a catalog from a string. `origin` names it in errors.
pub fn parse_catalog_str(content: &str, origin: &str) -> Result<Catalog> {
	let catalog: Catalog =
		toml::from_str(content).map_err(|source| PatchError::CatalogParseError {
			origin: origin.to_string(),
			source,
		})?;

	catalog.validate()?;

	Ok(catalog)
}
