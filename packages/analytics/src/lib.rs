#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation engine for normalized service records.
//!
//! Records are partitioned by year and month ([`temporal`]), reduced to
//! yearly category statistics ([`stats`]), tallied per code, type and
//! locality ([`counts`]) and broken down per month ([`breakdown`]). Every
//! function is a pure computation over a slice of records; nothing here
//! fails, so there is no error type.

pub mod breakdown;
pub mod counts;
pub mod stats;
pub mod temporal;

pub use breakdown::{category_trends, month_over_month_trend, monthly_breakdown};
pub use counts::summary_counts;
pub use stats::{
    StatisticsReport, category_statistic, monthly_code_counts, statistics_report,
    yearly_statistics,
};
pub use temporal::{
    MonthBucket, YearGrouping, filter_by_month, group_by_year, group_by_year_and_month,
    monthly_buckets,
};

/// Label used for blank values in tallies.
pub const UNSPECIFIED_LABEL: &str = "Sin especificar";
