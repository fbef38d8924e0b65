#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident locations: address cleaning, per-street tallies and fuzzy
//! grouping of street-name spellings into a location tree.

pub mod clean;
pub mod cluster;
pub mod similarity;

use std::collections::BTreeSet;

use fire_stats_classify::{Taxonomy, classify_records};
use fire_stats_service_models::ServiceRecord;
use serde::Serialize;
use uuid::Uuid;

pub use clean::{CleanedAddress, classify_address, clean_street};
pub use cluster::{StreetTallies, StreetTally, group_similar_streets, tally_streets};
pub use similarity::trigram_similarity;

use crate::clean::intersection_streets;

/// Number of groups kept by default in the location tree.
pub const DEFAULT_GROUP_LIMIT: usize = 50;

/// One spelling of a street (or intersection) inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetMember {
    pub name: String,
    pub incident_count: usize,
    pub is_intersection: bool,
    pub record_ids: Vec<Uuid>,
    pub row_indices: Vec<usize>,
}

impl From<&StreetTally> for StreetMember {
    fn from(tally: &StreetTally) -> Self {
        Self {
            name: tally.name.clone(),
            incident_count: tally.count(),
            is_intersection: tally.is_intersection,
            record_ids: tally.record_ids.clone(),
            row_indices: tally.row_indices.clone(),
        }
    }
}

/// A cluster of similar street names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetGroup {
    pub group_name: String,
    pub total_incident_count: usize,
    pub is_intersection_group: bool,
    /// Busiest spelling first.
    pub members: Vec<StreetMember>,
}

fn group_name(names: &[&str], is_intersection_group: bool) -> String {
    let [first, rest @ ..] = names else {
        return String::new();
    };
    if rest.is_empty() {
        return (*first).to_string();
    }

    let shortest = rest.iter().fold(*first, |shortest, name| {
        if name.chars().count() < shortest.chars().count() {
            *name
        } else {
            shortest
        }
    });

    if is_intersection_group {
        let streets: BTreeSet<&str> = names
            .iter()
            .flat_map(|name| intersection_streets(name))
            .collect();
        format!("Grupo: {shortest} ({} calles)", streets.len())
    } else {
        format!("Grupo: {shortest} ({} variantes)", names.len())
    }
}

/// Builds the location tree: tallies every record's street, clusters
/// similar spellings and keeps the `limit` busiest groups.
///
/// Groups are ordered by total incidents descending, ties by name.
#[must_use]
pub fn build_street_groups(records: &[ServiceRecord], limit: usize) -> Vec<StreetGroup> {
    let tallies = tally_streets(records);
    let names: Vec<&str> = tallies.entries().iter().map(|t| t.name.as_str()).collect();
    let clusters = group_similar_streets(&names);
    log::debug!(
        "Clustered {} street keys into {} groups",
        names.len(),
        clusters.len()
    );

    let mut groups: Vec<StreetGroup> = clusters
        .iter()
        .map(|cluster| {
            let mut members: Vec<StreetMember> = cluster
                .iter()
                .filter_map(|name| tallies.get(name))
                .map(StreetMember::from)
                .collect();
            members.sort_by(|a, b| b.incident_count.cmp(&a.incident_count));

            let is_intersection_group = members.iter().any(|m| m.is_intersection);
            StreetGroup {
                group_name: group_name(cluster, is_intersection_group),
                total_incident_count: members.iter().map(|m| m.incident_count).sum(),
                is_intersection_group,
                members,
            }
        })
        .collect();

    groups.sort_by(|a, b| {
        b.total_incident_count
            .cmp(&a.total_incident_count)
            .then_with(|| a.group_name.cmp(&b.group_name))
    });
    groups.truncate(limit);
    groups
}

/// A street key with its number of incidents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetCount {
    pub name: String,
    pub count: usize,
}

/// Street tallies of the fire and accident records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetsByCategory {
    pub fires: Vec<StreetCount>,
    pub accidents: Vec<StreetCount>,
}

fn sorted_counts<'a>(records: impl IntoIterator<Item = &'a ServiceRecord>) -> Vec<StreetCount> {
    let mut counts: Vec<StreetCount> = tally_streets(records)
        .entries()
        .iter()
        .map(|t| StreetCount {
            name: t.name.clone(),
            count: t.count(),
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    counts
}

/// Busiest streets among fires and among accidents, most incidents first.
#[must_use]
pub fn streets_by_category(records: &[ServiceRecord], taxonomy: &Taxonomy) -> StreetsByCategory {
    let classified = classify_records(taxonomy, records);
    StreetsByCategory {
        fires: sorted_counts(classified.fires.iter().copied()),
        accidents: sorted_counts(classified.accidents.iter().copied()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use fire_stats_service_models::{CallDate, Personnel, ServiceRecord};
    use uuid::Uuid;

    /// A dated record at `address`; everything else blank.
    pub fn at(row_index: usize, address: &str) -> ServiceRecord {
        ServiceRecord {
            row_index,
            id: Uuid::new_v4(),
            timestamp: String::new(),
            call_time: String::new(),
            requested_at: CallDate::Known(
                NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            ),
            part_number: String::new(),
            service_code: String::new(),
            address: address.to_string(),
            locality: String::new(),
            service_type: String::new(),
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

    pub fn typed(row_index: usize, address: &str, service_type: &str) -> ServiceRecord {
        ServiceRecord {
            service_type: service_type.to_string(),
            ..at(row_index, address)
        }
    }
}
