#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Classification of service records into fire, accident and rescue.
//!
//! Category membership is decided by an exact lookup of a pre-normalized key
//! in a [`Taxonomy`]. Taxonomies are configuration data: the built-in ones
//! are embedded TOML files (see [`registry`]) and others can be parsed at
//! runtime with [`parse_taxonomy_toml`].

pub mod registry;

use std::collections::BTreeSet;

use fire_stats_service_models::{ServiceCategory, ServiceRecord};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use registry::{DEFAULT_TAXONOMY_ID, builtin_taxonomies, builtin_taxonomy, builtin_taxonomy_ids};

/// Errors that can occur while loading a taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    /// TOML parsing failed.
    #[error("Taxonomy parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// No built-in taxonomy has the requested id.
    #[error("Unknown taxonomy: {id}")]
    Unknown {
        /// The requested id.
        id: String,
    },

    /// The taxonomy parsed but is unusable.
    #[error("Invalid taxonomy: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// Which record column a taxonomy's keys are matched against.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CodeBasis {
    /// Human-readable service type; keys are lowercased, trimmed and have
    /// whitespace collapsed.
    ServiceType,
    /// Terse service code; keys are trimmed and uppercased.
    ServiceCode,
}

impl CodeBasis {
    /// Canonical lookup key of a raw value under this basis.
    #[must_use]
    pub fn key(self, raw: &str) -> String {
        match self {
            Self::ServiceType => raw
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase(),
            Self::ServiceCode => raw.trim().to_uppercase(),
        }
    }

    /// The record value this basis reads.
    #[must_use]
    pub fn value(self, record: &ServiceRecord) -> &str {
        match self {
            Self::ServiceType => &record.service_type,
            Self::ServiceCode => &record.service_code,
        }
    }
}

/// On-disk shape of a taxonomy TOML file.
#[derive(Debug, Deserialize)]
struct TaxonomyDefinition {
    id: String,
    name: String,
    basis: CodeBasis,
    categories: CategoryDefinition,
}

#[derive(Debug, Deserialize)]
struct CategoryDefinition {
    fire: Vec<String>,
    accident: Vec<String>,
    #[serde(default)]
    rescue: Vec<String>,
}

/// A set of category code lists with normalized keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    /// Unique identifier (e.g. `"service_types"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Column the keys are matched against.
    pub basis: CodeBasis,
    /// Normalized fire keys.
    pub fire: BTreeSet<String>,
    /// Normalized accident keys.
    pub accident: BTreeSet<String>,
    /// Normalized rescue keys, empty for two-category taxonomies.
    pub rescue: BTreeSet<String>,
}

impl Taxonomy {
    /// Whether this taxonomy distinguishes rescues.
    #[must_use]
    pub fn has_rescue(&self) -> bool {
        !self.rescue.is_empty()
    }

    /// Categories this taxonomy can assign, in precedence order.
    #[must_use]
    pub fn categories(&self) -> Vec<ServiceCategory> {
        ServiceCategory::all()
            .iter()
            .copied()
            .filter(|c| *c != ServiceCategory::Rescue || self.has_rescue())
            .collect()
    }

    /// Category of a raw service code or type. Blank and unknown values are
    /// unclassified.
    #[must_use]
    pub fn classify_value(&self, raw: &str) -> Option<ServiceCategory> {
        let key = self.basis.key(raw);
        if key.is_empty() {
            return None;
        }
        if self.fire.contains(&key) {
            Some(ServiceCategory::Fire)
        } else if self.accident.contains(&key) {
            Some(ServiceCategory::Accident)
        } else if self.rescue.contains(&key) {
            Some(ServiceCategory::Rescue)
        } else {
            None
        }
    }

    /// Category of a record, read from the column named by [`Self::basis`].
    #[must_use]
    pub fn classify(&self, record: &ServiceRecord) -> Option<ServiceCategory> {
        self.classify_value(self.basis.value(record))
    }
}

/// Parses a taxonomy from TOML, normalizing every key for its basis.
///
/// # Errors
///
/// * [`TaxonomyError::Parse`] if the TOML is malformed
/// * [`TaxonomyError::Invalid`] if the id is blank or a category list holds
///   a blank key
pub fn parse_taxonomy_toml(toml_str: &str) -> Result<Taxonomy, TaxonomyError> {
    let def: TaxonomyDefinition = toml::de::from_str(toml_str)?;

    if def.id.trim().is_empty() {
        return Err(TaxonomyError::Invalid {
            message: "taxonomy id is empty".to_string(),
        });
    }

    let normalize = |category: &str, keys: Vec<String>| -> Result<BTreeSet<String>, TaxonomyError> {
        keys.iter()
            .map(|raw| {
                let key = def.basis.key(raw);
                if key.is_empty() {
                    Err(TaxonomyError::Invalid {
                        message: format!("{}: blank {category} key", def.id),
                    })
                } else {
                    Ok(key)
                }
            })
            .collect()
    };

    let fire = normalize("fire", def.categories.fire)?;
    let accident = normalize("accident", def.categories.accident)?;
    let rescue = normalize("rescue", def.categories.rescue)?;

    for key in accident.iter().chain(&rescue) {
        if fire.contains(key) {
            log::warn!("{}: {key:?} is listed as fire and another category", def.id);
        }
    }

    Ok(Taxonomy {
        id: def.id,
        name: def.name,
        basis: def.basis,
        fire,
        accident,
        rescue,
    })
}

/// Records split by category. Subsets are disjoint; unclassified records
/// are in none of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedGroup<'a> {
    pub fires: Vec<&'a ServiceRecord>,
    pub accidents: Vec<&'a ServiceRecord>,
    pub rescues: Vec<&'a ServiceRecord>,
}

impl<'a> ClassifiedGroup<'a> {
    /// Records of one category.
    #[must_use]
    pub fn get(&self, category: ServiceCategory) -> &[&'a ServiceRecord] {
        match category {
            ServiceCategory::Fire => &self.fires,
            ServiceCategory::Accident => &self.accidents,
            ServiceCategory::Rescue => &self.rescues,
        }
    }

    /// Number of classified records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fires.len() + self.accidents.len() + self.rescues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits `records` by category, keeping input order inside each subset.
#[must_use]
pub fn classify_records<'a>(
    taxonomy: &Taxonomy,
    records: impl IntoIterator<Item = &'a ServiceRecord>,
) -> ClassifiedGroup<'a> {
    let mut group = ClassifiedGroup::default();
    for record in records {
        match taxonomy.classify(record) {
            Some(ServiceCategory::Fire) => group.fires.push(record),
            Some(ServiceCategory::Accident) => group.accidents.push(record),
            Some(ServiceCategory::Rescue) => group.rescues.push(record),
            None => {}
        }
    }
    group
}

#[cfg(test)]
mod tests {
    use fire_stats_service_models::{CallDate, Personnel};
    use uuid::Uuid;

    use super::*;

    fn record(row_index: usize, code: &str, service_type: &str) -> ServiceRecord {
        ServiceRecord {
            row_index,
            id: Uuid::new_v4(),
            timestamp: String::new(),
            call_time: String::new(),
            requested_at: CallDate::Known(
                chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            ),
            part_number: String::new(),
            service_code: code.to_string(),
            address: String::new(),
            locality: String::new(),
            service_type: service_type.to_string(),
            description: String::new(),
            involved_vehicles: Vec::new(),
            personnel_involved: Personnel::Count(0),
            extra_data: String::new(),
            units_involved: None,
            transfer_performed: None,
            affected_surface: String::new(),
            call_schedule: String::new(),
        }
    }

    #[test]
    fn service_type_keys_ignore_case_and_spacing() {
        let taxonomy = builtin_taxonomy("service_types").unwrap();
        assert_eq!(
            taxonomy.classify_value("  incendios-VIVIENDA "),
            Some(ServiceCategory::Fire)
        );
        assert_eq!(
            taxonomy.classify_value("Rescate-servicio   de ambulancia"),
            Some(ServiceCategory::Rescue)
        );
        assert_eq!(
            taxonomy.classify_value("accidente aéreo"),
            Some(ServiceCategory::Accident)
        );
    }

    #[test]
    fn service_code_keys_are_uppercased() {
        let taxonomy = builtin_taxonomy("service_codes").unwrap();
        assert_eq!(taxonomy.classify_value(" 1a "), Some(ServiceCategory::Fire));
        assert_eq!(taxonomy.classify_value("3B"), Some(ServiceCategory::Accident));
        assert_eq!(taxonomy.classify_value("2H"), None);
    }

    #[test]
    fn blank_and_unknown_codes_are_unclassified() {
        let taxonomy = builtin_taxonomy("service_codes").unwrap();
        assert_eq!(taxonomy.classify(&record(0, "", "")), None);
        assert_eq!(taxonomy.classify(&record(0, "9Z", "")), None);
    }

    #[test]
    fn classify_records_splits_disjoint_subsets() {
        let taxonomy = builtin_taxonomy("service_types").unwrap();
        let records = vec![
            record(0, "1A", "Incendios-vivienda"),
            record(1, "3A", "Accidente-Transito"),
            record(2, "2H", "Rescate-personas"),
            record(3, "", "Servicios especiales-otros"),
            record(4, "1B", "Incendio Forestal"),
        ];
        let group = classify_records(&taxonomy, &records);

        let rows = |subset: &[&ServiceRecord]| subset.iter().map(|r| r.row_index).collect::<Vec<_>>();
        assert_eq!(rows(&group.fires), vec![0, 4]);
        assert_eq!(rows(&group.accidents), vec![1]);
        assert_eq!(rows(&group.rescues), vec![2]);
        assert_eq!(group.len(), 4);
    }

    #[test]
    fn two_category_taxonomy_never_yields_rescues() {
        let taxonomy = builtin_taxonomy("service_codes").unwrap();
        let records = vec![record(0, "1A", "Rescate-personas"), record(1, "2H", "")];
        let group = classify_records(&taxonomy, &records);
        assert!(group.rescues.is_empty());
        assert_eq!(group.fires.len(), 1);
        assert_eq!(
            taxonomy.categories(),
            vec![ServiceCategory::Fire, ServiceCategory::Accident]
        );
    }

    #[test]
    fn classification_is_idempotent() {
        let taxonomy = builtin_taxonomy("service_types").unwrap();
        let records = vec![
            record(0, "", "Incendios-Otros"),
            record(1, "", "Accidente-Transito"),
            record(2, "", "desconocido"),
        ];
        assert_eq!(
            classify_records(&taxonomy, &records),
            classify_records(&taxonomy, &records)
        );
    }

    #[test]
    fn fire_takes_precedence_over_other_categories() {
        let taxonomy = parse_taxonomy_toml(
            r#"
            id = "overlap"
            name = "Overlap"
            basis = "service_code"

            [categories]
            fire = ["X"]
            accident = ["x", "Y"]
            "#,
        )
        .unwrap();
        assert_eq!(taxonomy.classify_value("x"), Some(ServiceCategory::Fire));
        assert_eq!(taxonomy.classify_value("y"), Some(ServiceCategory::Accident));
    }

    #[test]
    fn rejects_blank_keys_and_bad_toml() {
        let blank = parse_taxonomy_toml(
            r#"
            id = "blank"
            name = "Blank"
            basis = "service_type"

            [categories]
            fire = ["  "]
            accident = []
            "#,
        );
        assert!(matches!(blank, Err(TaxonomyError::Invalid { .. })));
        assert!(matches!(
            parse_taxonomy_toml("id = "),
            Err(TaxonomyError::Parse(_))
        ));
    }
}
