//! Dataset-wide tallies: service codes, service types, localities and units
//! involved.
//!
//! Service types and localities are folded to a canonical spelling before
//! counting, so the distinct lists and the counts agree on their keys.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use fire_stats_analytics_models::CountSummary;
use fire_stats_service_models::ServiceRecord;
use regex::Regex;

/// Canonical name of the catch-all special services type.
pub const SPECIAL_SERVICES_LABEL: &str = "Servicios especiales-otros";

/// Abbreviated `VILL` prefix of locality names.
static VILL_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^VILL\s").expect("valid regex"));

/// Which record column to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountKey {
    ServiceCode,
    ServiceType,
}

impl CountKey {
    fn of(self, record: &ServiceRecord) -> String {
        match self {
            Self::ServiceCode => record.service_code.clone(),
            Self::ServiceType => fold_service_type(&record.service_type),
        }
    }
}

/// Folds the many spellings of "special services - other" into one name.
#[must_use]
pub fn fold_service_type(service_type: &str) -> String {
    let lower = service_type.to_lowercase();
    if lower.contains("especial") && lower.contains("otro") {
        SPECIAL_SERVICES_LABEL.to_string()
    } else {
        service_type.trim().to_string()
    }
}

/// Expands a leading `VILL ` to `VILLA ` and collapses whitespace.
#[must_use]
pub fn normalize_locality(locality: &str) -> String {
    let expanded = VILL_PREFIX_RE.replace(locality.trim(), "VILLA ");
    expanded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Non-blank service codes, sorted.
#[must_use]
pub fn distinct_service_codes(records: &[ServiceRecord]) -> Vec<String> {
    distinct(records.iter().map(|r| r.service_code.clone()))
}

/// Non-blank folded service types, sorted.
#[must_use]
pub fn distinct_service_types(records: &[ServiceRecord]) -> Vec<String> {
    distinct(records.iter().map(|r| fold_service_type(&r.service_type)))
}

/// Non-blank normalized localities, sorted.
#[must_use]
pub fn distinct_localities(records: &[ServiceRecord]) -> Vec<String> {
    distinct(records.iter().map(|r| normalize_locality(&r.locality)))
}

fn count_by(records: &[ServiceRecord], keys: &[String], key: CountKey) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> = keys.iter().map(|k| (k.clone(), 0)).collect();
    for record in records {
        if let Some(count) = counts.get_mut(&key.of(record)) {
            *count += 1;
        }
    }
    counts
}

/// Records per service code, for the requested codes only (zero when a code
/// has no records).
#[must_use]
pub fn count_service_codes(records: &[ServiceRecord], codes: &[String]) -> BTreeMap<String, u64> {
    count_by(records, codes, CountKey::ServiceCode)
}

/// Records per folded service type, for the requested types only.
#[must_use]
pub fn count_service_types(records: &[ServiceRecord], types: &[String]) -> BTreeMap<String, u64> {
    count_by(records, types, CountKey::ServiceType)
}

/// Records per locality and then per code or type, seeded with zeros for
/// every requested locality/value pair.
#[must_use]
pub fn count_by_locality(
    records: &[ServiceRecord],
    localities: &[String],
    values: &[String],
    key: CountKey,
) -> BTreeMap<String, BTreeMap<String, u64>> {
    let mut counts: BTreeMap<String, BTreeMap<String, u64>> = localities
        .iter()
        .map(|l| (l.clone(), values.iter().map(|v| (v.clone(), 0)).collect()))
        .collect();

    for record in records {
        let Some(by_value) = counts.get_mut(&normalize_locality(&record.locality)) else {
            continue;
        };
        if let Some(count) = by_value.get_mut(&key.of(record)) {
            *count += 1;
        }
    }
    counts
}

/// Sum of units involved over the records that recorded it.
#[must_use]
pub fn total_units_involved(records: &[ServiceRecord]) -> i64 {
    records.iter().filter_map(|r| r.units_involved).sum()
}

/// Units involved per requested locality.
#[must_use]
pub fn units_involved_by_locality(
    records: &[ServiceRecord],
    localities: &[String],
) -> BTreeMap<String, i64> {
    let mut totals: BTreeMap<String, i64> = localities.iter().map(|l| (l.clone(), 0)).collect();
    for record in records {
        let (Some(units), Some(total)) = (
            record.units_involved,
            totals.get_mut(&normalize_locality(&record.locality)),
        ) else {
            continue;
        };
        *total += units;
    }
    totals
}

/// Every counter over every distinct code, type and locality of the data.
#[must_use]
pub fn summary_counts(records: &[ServiceRecord]) -> CountSummary {
    let codes = distinct_service_codes(records);
    let types = distinct_service_types(records);
    let localities = distinct_localities(records);

    let mut locality_totals: BTreeMap<String, u64> =
        localities.iter().map(|l| (l.clone(), 0)).collect();
    for record in records {
        if let Some(count) = locality_totals.get_mut(&normalize_locality(&record.locality)) {
            *count += 1;
        }
    }

    CountSummary {
        service_codes: count_service_codes(records, &codes),
        service_types: count_service_types(records, &types),
        localities: locality_totals,
        service_codes_by_locality: count_by_locality(
            records,
            &localities,
            &codes,
            CountKey::ServiceCode,
        ),
        service_types_by_locality: count_by_locality(
            records,
            &localities,
            &types,
            CountKey::ServiceType,
        ),
        total_units_involved: total_units_involved(records),
        units_involved_by_locality: units_involved_by_locality(records, &localities),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    fn at(locality: &str, code: &str, service_type: &str, units: Option<i64>) -> ServiceRecord {
        ServiceRecord {
            locality: locality.to_string(),
            units_involved: units,
            ..record(0, Some((2024, 1, 1)), code, service_type)
        }
    }

    fn sample() -> Vec<ServiceRecord> {
        vec![
            at("VILLA DOLORES", "1A", "Incendios-vivienda", Some(2)),
            at("VILL  DOLORES", "1A", "Incendios-vivienda", Some(1)),
            at("SAN PEDRO", "2H", "Servicios Especiales - Otros", None),
            at("SAN PEDRO", "", "servicio especial (otro)", Some(3)),
            at("", "3A", "Accidente-Transito", Some(4)),
        ]
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn distinct_lists_are_sorted_and_folded() {
        let records = sample();
        assert_eq!(distinct_service_codes(&records), strings(&["1A", "2H", "3A"]));
        assert_eq!(
            distinct_service_types(&records),
            strings(&["Accidente-Transito", "Incendios-vivienda", SPECIAL_SERVICES_LABEL])
        );
        assert_eq!(
            distinct_localities(&records),
            strings(&["SAN PEDRO", "VILLA DOLORES"])
        );
    }

    #[test]
    fn locality_normalization() {
        assert_eq!(normalize_locality(" vill   Dolores "), "VILLA Dolores");
        assert_eq!(normalize_locality("VILLARINO"), "VILLARINO");
    }

    #[test]
    fn counts_are_seeded_with_zeros() {
        let records = sample();
        let counts = count_service_codes(&records, &strings(&["1A", "9Z"]));
        assert_eq!(counts.get("1A"), Some(&2));
        assert_eq!(counts.get("9Z"), Some(&0));
        assert_eq!(counts.len(), 2);

        let types = count_service_types(&records, &strings(&[SPECIAL_SERVICES_LABEL]));
        assert_eq!(types.get(SPECIAL_SERVICES_LABEL), Some(&2));
    }

    #[test]
    fn counts_by_locality_use_normalized_names() {
        let records = sample();
        let counts = count_by_locality(
            &records,
            &strings(&["VILLA DOLORES", "SAN PEDRO"]),
            &strings(&["1A", "2H"]),
            CountKey::ServiceCode,
        );
        assert_eq!(counts["VILLA DOLORES"]["1A"], 2);
        assert_eq!(counts["VILLA DOLORES"]["2H"], 0);
        assert_eq!(counts["SAN PEDRO"]["2H"], 1);
    }

    #[test]
    fn units_involved_totals() {
        let records = sample();
        assert_eq!(total_units_involved(&records), 10);
        let by_locality =
            units_involved_by_locality(&records, &strings(&["VILLA DOLORES", "SAN PEDRO"]));
        assert_eq!(by_locality["VILLA DOLORES"], 3);
        assert_eq!(by_locality["SAN PEDRO"], 3);
    }

    #[test]
    fn summary_bundles_every_counter() {
        let summary = summary_counts(&sample());
        assert_eq!(summary.service_codes.len(), 3);
        assert_eq!(summary.localities["VILLA DOLORES"], 2);
        assert_eq!(
            summary.service_types_by_locality["SAN PEDRO"][SPECIAL_SERVICES_LABEL],
            2
        );
        assert_eq!(summary.total_units_involved, 10);
    }
}
