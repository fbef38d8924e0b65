//! Taxonomy registry: loads the built-in taxonomies from embedded TOML.
//!
//! Each `.toml` file in `packages/classify/taxonomies/` is baked into the
//! binary at compile time via [`include_str!`]. Adding a taxonomy version is
//! a matter of dropping a new TOML file next to the others and listing it
//! below.

use crate::{Taxonomy, TaxonomyError, parse_taxonomy_toml};

/// TOML configs embedded at compile time.
const TAXONOMY_TOMLS: &[(&str, &str)] = &[
    (
        "service_types",
        include_str!("../taxonomies/service_types.toml"),
    ),
    (
        "service_codes",
        include_str!("../taxonomies/service_codes.toml"),
    ),
];

/// Id of the taxonomy used when none is requested.
pub const DEFAULT_TAXONOMY_ID: &str = "service_types";

/// Returns every built-in taxonomy, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so
/// this is caught by the tests below).
#[must_use]
pub fn builtin_taxonomies() -> Vec<Taxonomy> {
    TAXONOMY_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_taxonomy_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up one built-in taxonomy by id.
///
/// # Errors
///
/// * [`TaxonomyError::Unknown`] if no built-in taxonomy has that id
/// * [`TaxonomyError::Parse`] if its embedded TOML is malformed
pub fn builtin_taxonomy(id: &str) -> Result<Taxonomy, TaxonomyError> {
    let (_, toml) = TAXONOMY_TOMLS
        .iter()
        .find(|(name, _)| *name == id)
        .ok_or_else(|| TaxonomyError::Unknown { id: id.to_string() })?;
    parse_taxonomy_toml(toml)
}

/// Ids of the built-in taxonomies, in registry order.
#[must_use]
pub fn builtin_taxonomy_ids() -> Vec<&'static str> {
    TAXONOMY_TOMLS.iter().map(|(name, _)| *name).collect()
}
