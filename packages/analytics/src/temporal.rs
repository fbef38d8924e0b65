//! Partitioning of records by calendar year and month.

use std::collections::BTreeMap;

use fire_stats_classify::{ClassifiedGroup, Taxonomy, classify_records};
use fire_stats_service_models::{RowDiagnostic, ServiceRecord};

/// Records grouped by year, plus the records that had no year.
#[derive(Debug, Clone, Default)]
pub struct YearGrouping<'a> {
    /// Records of each year, ordered by date (input order on ties).
    pub years: BTreeMap<i32, Vec<&'a ServiceRecord>>,
    /// One error per record left out for lacking a date.
    pub excluded: Vec<RowDiagnostic>,
}

/// Groups records by year.
///
/// Records without a known date are excluded with a diagnostic; inside a
/// year records are ordered by month then date, ties keeping input order.
#[must_use]
pub fn group_by_year(records: &[ServiceRecord]) -> YearGrouping<'_> {
    let mut grouping = YearGrouping::default();

    for record in records {
        if let Some(year) = record.year() {
            grouping.years.entry(year).or_default().push(record);
        } else {
            log::warn!(
                "Row {}: no call date, left out of yearly grouping",
                record.row_index
            );
            grouping.excluded.push(RowDiagnostic::row_error(
                record.row_index,
                "Record has no call date and was left out of yearly grouping",
                None,
            ));
        }
    }

    for records in grouping.years.values_mut() {
        records.sort_by_key(|r| r.requested_at.date_time());
    }

    grouping
}

/// Groups dated records by year, then month (1-12). Undated records are
/// dropped (see [`group_by_year`]).
#[must_use]
pub fn group_by_year_and_month(
    records: &[ServiceRecord],
) -> BTreeMap<i32, BTreeMap<u32, Vec<&ServiceRecord>>> {
    group_by_year(records)
        .years
        .into_iter()
        .map(|(year, records)| {
            let mut months: BTreeMap<u32, Vec<&ServiceRecord>> = BTreeMap::new();
            for record in records {
                if let Some(month) = record.month() {
                    months.entry(month).or_default().push(record);
                }
            }
            (year, months)
        })
        .collect()
}

/// Records of one calendar month (1-12). Undated records match no month.
#[must_use]
pub fn filter_by_month<'a>(
    records: impl IntoIterator<Item = &'a ServiceRecord>,
    month: u32,
) -> Vec<&'a ServiceRecord> {
    records
        .into_iter()
        .filter(|r| r.month() == Some(month))
        .collect()
}

/// Records of one month of a year, with their classification.
#[derive(Debug, Clone, Default)]
pub struct MonthBucket<'a> {
    /// Calendar month (1-12).
    pub month: u32,
    /// Every record of the month, classified or not.
    pub records: Vec<&'a ServiceRecord>,
    /// The month's records split by category.
    pub classified: ClassifiedGroup<'a>,
}

/// Splits the records of one year into twelve month buckets, January
/// first. Months without records are empty buckets.
#[must_use]
pub fn monthly_buckets<'a>(
    records_of_year: &[&'a ServiceRecord],
    taxonomy: &Taxonomy,
) -> [MonthBucket<'a>; 12] {
    std::array::from_fn(|i| {
        let month = u32::try_from(i + 1).unwrap_or_default();
        let records = filter_by_month(records_of_year.iter().copied(), month);
        let classified = classify_records(taxonomy, records.iter().copied());
        MonthBucket {
            month,
            records,
            classified,
        }
    })
}

#[cfg(test)]
mod tests {
    use fire_stats_classify::builtin_taxonomy;

    use super::*;
    use crate::test_support::{accident, fire, record, rows};

    #[test]
    fn groups_by_year_in_date_order() {
        let records = vec![
            fire(0, 2024, 3, 10),
            fire(1, 2023, 12, 31),
            accident(2, 2024, 1, 5),
            fire(3, 2024, 3, 2),
            accident(4, 2024, 3, 2),
        ];
        let grouping = group_by_year(&records);

        assert_eq!(grouping.years.keys().copied().collect::<Vec<_>>(), vec![2023, 2024]);
        assert_eq!(rows(&grouping.years[&2023]), vec![1]);
        assert_eq!(rows(&grouping.years[&2024]), vec![2, 3, 4, 0]);
        assert!(grouping.excluded.is_empty());
    }

    #[test]
    fn undated_records_are_excluded_with_diagnostic() {
        let records = vec![fire(0, 2024, 1, 1), record(1, None, "1A", "")];
        let grouping = group_by_year(&records);

        assert_eq!(grouping.years.values().map(Vec::len).sum::<usize>(), 1);
        assert_eq!(grouping.excluded.len(), 1);
        assert_eq!(grouping.excluded[0].row_index, 1);
    }

    #[test]
    fn blank_code_with_date_is_still_grouped() {
        let records = vec![record(0, Some((2024, 5, 1)), "", "")];
        let grouping = group_by_year(&records);
        assert_eq!(rows(&grouping.years[&2024]), vec![0]);
    }

    #[test]
    fn groups_by_year_and_month() {
        let records = vec![
            fire(0, 2024, 3, 10),
            fire(1, 2024, 1, 1),
            fire(2, 2025, 3, 1),
            record(3, None, "1A", ""),
        ];
        let grouped = group_by_year_and_month(&records);

        assert_eq!(grouped[&2024].keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(rows(&grouped[&2025][&3]), vec![2]);
    }

    #[test]
    fn filter_by_month_ignores_undated_records() {
        let records = vec![
            fire(0, 2024, 2, 1),
            record(1, None, "1A", ""),
            fire(2, 2023, 2, 28),
        ];
        assert_eq!(rows(&filter_by_month(&records, 2)), vec![0, 2]);
        assert!(filter_by_month(&records, 0).is_empty());
    }

    #[test]
    fn monthly_buckets_cover_all_twelve_months() {
        let taxonomy = builtin_taxonomy("service_types").unwrap();
        let records = vec![
            fire(0, 2024, 1, 3),
            accident(1, 2024, 1, 4),
            fire(2, 2024, 8, 9),
            record(3, Some((2024, 8, 9)), "", "Servicios especiales-otros"),
        ];
        let refs: Vec<&ServiceRecord> = records.iter().collect();
        let buckets = monthly_buckets(&refs, &taxonomy);

        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[0].month, 1);
        assert_eq!(rows(&buckets[0].classified.fires), vec![0]);
        assert_eq!(rows(&buckets[0].classified.accidents), vec![1]);
        assert_eq!(buckets[7].records.len(), 2);
        assert_eq!(buckets[7].classified.len(), 1);
        assert!(buckets[11].records.is_empty());
    }
}
