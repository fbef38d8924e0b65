//! Tallying of cleaned street keys and fuzzy grouping of their spellings.

use std::collections::HashMap;

use fire_stats_service_models::ServiceRecord;
use uuid::Uuid;

use crate::clean::{CleanedAddress, classify_address, intersection_streets, is_intersection_key};
use crate::similarity::trigram_similarity;

/// Minimum similarity for two single streets to share a group.
pub const STREET_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Minimum similarity between any component streets for two intersections
/// to share a group.
pub const INTERSECTION_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Records counted under one street key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetTally {
    pub name: String,
    pub is_intersection: bool,
    pub record_ids: Vec<Uuid>,
    pub row_indices: Vec<usize>,
}

impl StreetTally {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_intersection: is_intersection_key(name),
            record_ids: vec![],
            row_indices: vec![],
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.record_ids.len()
    }
}

/// Street tallies in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct StreetTallies {
    entries: Vec<StreetTally>,
    index: HashMap<String, usize>,
}

impl StreetTallies {
    fn add(&mut self, key: &str, record: &ServiceRecord) {
        let position = if let Some(&position) = self.index.get(key) {
            position
        } else {
            self.entries.push(StreetTally::new(key));
            self.index.insert(key.to_string(), self.entries.len() - 1);
            self.entries.len() - 1
        };
        let entry = &mut self.entries[position];
        entry.record_ids.push(record.id);
        entry.row_indices.push(record.row_index);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StreetTally> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn entries(&self) -> &[StreetTally] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counts records per cleaned street key.
///
/// An intersection record is counted once under each of its component
/// streets and once under the intersection key itself.
#[must_use]
pub fn tally_streets<'a>(records: impl IntoIterator<Item = &'a ServiceRecord>) -> StreetTallies {
    let mut tallies = StreetTallies::default();

    for record in records {
        match classify_address(&record.address) {
            CleanedAddress::Street(street) => tallies.add(&street, record),
            CleanedAddress::Intersection { key, streets } => {
                for street in &streets {
                    if tallies
                        .get(street)
                        .is_some_and(|t| t.record_ids.last() == Some(&record.id))
                    {
                        continue;
                    }
                    tallies.add(street, record);
                }
                tallies.add(&key, record);
            }
            CleanedAddress::Empty => {
                log::trace!("Row {}: no usable street in address", record.row_index);
            }
        }
    }

    tallies
}

/// Greedy single-pass clustering: each name not yet assigned seeds a group
/// and absorbs every later unassigned name similar to the seed.
fn greedy_groups<'a>(names: &[&'a str], similar: impl Fn(&str, &str) -> bool) -> Vec<Vec<&'a str>> {
    let mut assigned = vec![false; names.len()];
    let mut groups = vec![];

    for (i, &seed) in names.iter().enumerate() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let mut group = vec![seed];
        for (j, &candidate) in names.iter().enumerate().skip(i + 1) {
            if !assigned[j] && similar(seed, candidate) {
                assigned[j] = true;
                group.push(candidate);
            }
        }
        groups.push(group);
    }

    groups
}

fn intersections_similar(a: &str, b: &str) -> bool {
    let b_streets = intersection_streets(b);
    intersection_streets(a).iter().any(|x| {
        b_streets
            .iter()
            .any(|y| trigram_similarity(x, y) > INTERSECTION_SIMILARITY_THRESHOLD)
    })
}

/// Clusters street keys, single streets and intersections separately.
///
/// Single streets join a group when their similarity to the group's seed
/// exceeds [`STREET_SIMILARITY_THRESHOLD`]. Intersections join when any of
/// their component streets exceeds [`INTERSECTION_SIMILARITY_THRESHOLD`]
/// against any component of the seed. Groups come out in seed order.
#[must_use]
pub fn group_similar_streets<'a>(names: &[&'a str]) -> Vec<Vec<&'a str>> {
    let (intersections, streets): (Vec<&str>, Vec<&str>) =
        names.iter().partition(|n| is_intersection_key(n));

    let mut groups = greedy_groups(&streets, |a, b| {
        trigram_similarity(a, b) > STREET_SIMILARITY_THRESHOLD
    });
    groups.extend(greedy_groups(&intersections, intersections_similar));
    groups
}
