//! Yearly category statistics.
//!
//! For each year and category the twelve monthly counts are reduced to a
//! mean, a mode, a total and the busiest/quietest month.

use std::collections::BTreeMap;

use fire_stats_analytics_models::{
    CategoryStatistic, CategoryTrends, Extreme, MONTH_NAMES, Mode, MonthCodeCounts,
    YearlyCodeCounts, YearlyStatistic, month_name,
};
use fire_stats_classify::Taxonomy;
use fire_stats_service_models::{RowDiagnostic, ServiceCategory, ServiceRecord};
use serde::Serialize;

use crate::UNSPECIFIED_LABEL;
use crate::breakdown::category_trends;
use crate::temporal::{MonthBucket, YearGrouping, group_by_year, monthly_buckets};

/// Reduces twelve monthly counts (January first) to a statistic.
///
/// The average is over all twelve months. The mode lists every most
/// frequent value ascending. On ties for max or min the earliest month
/// wins.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn category_statistic(counts: &[u64; 12]) -> CategoryStatistic {
    let total: u64 = counts.iter().sum();

    CategoryStatistic {
        average: total as f64 / 12.0,
        mode: mode(counts),
        total,
        monthly_values: *counts,
        max: extreme(counts, |candidate, best| candidate > best),
        min: extreme(counts, |candidate, best| candidate < best),
    }
}

fn mode(counts: &[u64; 12]) -> Mode {
    let mut frequency: BTreeMap<u64, usize> = BTreeMap::new();
    for count in counts {
        *frequency.entry(*count).or_default() += 1;
    }
    let top = frequency.values().copied().max().unwrap_or_default();
    let mut modes: Vec<u64> = frequency
        .into_iter()
        .filter(|(_, n)| *n == top)
        .map(|(value, _)| value)
        .collect();

    if modes.len() == 1 {
        Mode::Single(modes.remove(0))
    } else {
        Mode::Tied(modes)
    }
}

/// Scans months in order, replacing the best only on a strict improvement.
fn extreme(counts: &[u64; 12], better: impl Fn(u64, u64) -> bool) -> Extreme {
    let mut best = 0;
    for (index, count) in counts.iter().enumerate().skip(1) {
        if better(*count, counts[best]) {
            best = index;
        }
    }
    Extreme {
        value: counts[best],
        month_name: MONTH_NAMES[best].to_string(),
        month_index: best,
    }
}

fn category_counts(buckets: &[MonthBucket<'_>; 12], category: ServiceCategory) -> [u64; 12] {
    std::array::from_fn(|i| buckets[i].classified.get(category).len() as u64)
}

fn statistics_of(grouping: &YearGrouping<'_>, taxonomy: &Taxonomy) -> Vec<YearlyStatistic> {
    grouping
        .years
        .iter()
        .map(|(&year, records_of_year)| {
            let buckets = monthly_buckets(records_of_year, taxonomy);
            let stat = |category| category_statistic(&category_counts(&buckets, category));

            YearlyStatistic {
                year,
                fires: stat(ServiceCategory::Fire),
                accidents: stat(ServiceCategory::Accident),
                rescues: taxonomy
                    .has_rescue()
                    .then(|| stat(ServiceCategory::Rescue)),
                months_with_data: buckets
                    .iter()
                    .filter(|b| !b.records.is_empty())
                    .map(|b| b.month)
                    .collect(),
                total_records: records_of_year.len() as u64,
            }
        })
        .collect()
}

/// Computes the statistics of every year present, years ascending.
///
/// Undated records are left out (see [`group_by_year`]); use
/// [`statistics_report`] to keep their diagnostics. Rescue statistics are
/// only produced for taxonomies that distinguish rescues.
#[must_use]
pub fn yearly_statistics(records: &[ServiceRecord], taxonomy: &Taxonomy) -> Vec<YearlyStatistic> {
    statistics_of(&group_by_year(records), taxonomy)
}

fn tally_codes(records: &[&ServiceRecord]) -> BTreeMap<String, u64> {
    let mut tally = BTreeMap::new();
    for record in records {
        let code = if record.service_code.is_empty() {
            UNSPECIFIED_LABEL.to_string()
        } else {
            record.service_code.clone()
        };
        *tally.entry(code).or_default() += 1;
    }
    tally
}

fn code_counts_of(grouping: &YearGrouping<'_>, taxonomy: &Taxonomy) -> Vec<YearlyCodeCounts> {
    grouping
        .years
        .iter()
        .map(|(&year, records_of_year)| {
            let months = monthly_buckets(records_of_year, taxonomy)
                .iter()
                .map(|bucket| MonthCodeCounts {
                    month: bucket.month,
                    month_name: month_name(bucket.month).unwrap_or_default().to_string(),
                    fires: tally_codes(&bucket.classified.fires),
                    accidents: tally_codes(&bucket.classified.accidents),
                    rescues: tally_codes(&bucket.classified.rescues),
                })
                .collect();
            YearlyCodeCounts { year, months }
        })
        .collect()
}

/// Per year and month, the service codes of each category's records.
#[must_use]
pub fn monthly_code_counts(records: &[ServiceRecord], taxonomy: &Taxonomy) -> Vec<YearlyCodeCounts> {
    code_counts_of(&group_by_year(records), taxonomy)
}

/// Yearly statistics, trends and code counts together with the records
/// left out for lacking a date.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsReport {
    pub statistics: Vec<YearlyStatistic>,
    pub trends: Vec<CategoryTrends>,
    pub code_counts: Vec<YearlyCodeCounts>,
    /// One error per undated record, in input order.
    pub excluded: Vec<RowDiagnostic>,
}

/// Groups the records once and derives every yearly output from it.
#[must_use]
pub fn statistics_report(records: &[ServiceRecord], taxonomy: &Taxonomy) -> StatisticsReport {
    let grouping = group_by_year(records);
    let statistics = statistics_of(&grouping, taxonomy);
    let trends = statistics.iter().filter_map(category_trends).collect();

    StatisticsReport {
        code_counts: code_counts_of(&grouping, taxonomy),
        trends,
        statistics,
        excluded: grouping.excluded,
    }
}
