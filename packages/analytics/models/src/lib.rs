#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types of the aggregation engine.
//!
//! Yearly statistics, per-month code counts, counters and monthly
//! breakdowns. All types serialize with `camelCase` field names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Spanish month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Name of a calendar month (1-12).
#[must_use]
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(index).copied()
}

/// Most frequent monthly value(s).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mode {
    /// A single most frequent value.
    Single(u64),
    /// Several values tied for most frequent, ascending.
    Tied(Vec<u64>),
}

impl Mode {
    /// All modal values, ascending.
    #[must_use]
    pub fn values(&self) -> Vec<u64> {
        match self {
            Self::Single(v) => vec![*v],
            Self::Tied(vs) => vs.clone(),
        }
    }
}

/// The month holding a maximum or minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extreme {
    /// The monthly count.
    pub value: u64,
    /// Spanish month name.
    pub month_name: String,
    /// Zero-based month index (0 = January).
    pub month_index: usize,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Statistics of one category over the twelve months of a year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatistic {
    /// Mean monthly count over twelve months, at full precision. Serialized
    /// rounded to two decimals.
    #[serde(serialize_with = "serialize_rounded")]
    pub average: f64,
    /// Most frequent monthly count(s).
    pub mode: Mode,
    /// Total for the year.
    pub total: u64,
    /// Count per month, January first.
    pub monthly_values: [u64; 12],
    /// Busiest month (first month wins ties).
    pub max: Extreme,
    /// Quietest month (first month wins ties).
    pub min: Extreme,
}

impl CategoryStatistic {
    /// Average rounded to two decimals, for display.
    #[must_use]
    pub fn rounded_average(&self) -> f64 {
        round2(self.average)
    }
}

/// Statistics of one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyStatistic {
    pub year: i32,
    pub fires: CategoryStatistic,
    pub accidents: CategoryStatistic,
    /// Present only for taxonomies that distinguish rescues.
    pub rescues: Option<CategoryStatistic>,
    /// Months (1-12) with at least one record, ascending.
    pub months_with_data: Vec<u32>,
    /// Number of records of the year, classified or not.
    pub total_records: u64,
}

/// Service code tallies of one month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCodeCounts {
    /// Calendar month (1-12).
    pub month: u32,
    pub month_name: String,
    pub fires: BTreeMap<String, u64>,
    pub accidents: BTreeMap<String, u64>,
    pub rescues: BTreeMap<String, u64>,
}

/// Per-month service code tallies of one year, for chart rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyCodeCounts {
    pub year: i32,
    /// Always twelve entries, January first.
    pub months: Vec<MonthCodeCounts>,
}

/// Direction of a month-over-month change.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Comparison of a count between two months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    /// Count in the earlier month.
    pub previous: u64,
    /// Count in the later month.
    pub current: u64,
    /// `current - previous`.
    pub change: i64,
    /// Percentage change from `previous` to `current`.
    pub percent_change: f64,
    pub direction: TrendDirection,
}

/// Trends of each category between the last two months with data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTrends {
    pub year: i32,
    /// Earlier month compared (1-12).
    pub previous_month: u32,
    /// Later month compared (1-12).
    pub current_month: u32,
    pub fires: Trend,
    pub accidents: Trend,
    pub rescues: Option<Trend>,
}

/// Dataset-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountSummary {
    /// Records per service code.
    pub service_codes: BTreeMap<String, u64>,
    /// Records per (folded) service type.
    pub service_types: BTreeMap<String, u64>,
    /// Records per (normalized) locality.
    pub localities: BTreeMap<String, u64>,
    /// Records per locality, then per service code.
    pub service_codes_by_locality: BTreeMap<String, BTreeMap<String, u64>>,
    /// Records per locality, then per (folded) service type.
    pub service_types_by_locality: BTreeMap<String, BTreeMap<String, u64>>,
    /// Sum of units involved over records that recorded it.
    pub total_units_involved: i64,
    /// Units involved per locality.
    pub units_involved_by_locality: BTreeMap<String, i64>,
}

/// Attribute tallies of all records of one calendar month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBreakdown {
    /// Calendar month (1-12).
    pub month: u32,
    pub month_name: String,
    pub total: u64,
    pub service_codes: BTreeMap<String, u64>,
    pub localities: BTreeMap<String, u64>,
    pub service_types: BTreeMap<String, u64>,
    pub vehicles: BTreeMap<String, u64>,
    pub personnel: BTreeMap<String, u64>,
    pub transfers: BTreeMap<String, u64>,
    pub years: BTreeMap<String, u64>,
    pub time_bands: BTreeMap<String, u64>,
}

/// Per-month attribute breakdown of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBreakdown {
    /// Months present in the data, ascending.
    pub months: Vec<MonthBreakdown>,
    /// Records left out because their date is unknown.
    pub undated_records: u64,
}
