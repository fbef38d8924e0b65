//! Per-month attribute breakdown and month-over-month trends.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use fire_stats_analytics_models::{
    CategoryTrends, MonthBreakdown, MonthlyBreakdown, Trend, TrendDirection, YearlyStatistic,
    month_name,
};
use fire_stats_service_models::{Personnel, ServiceRecord};
use regex::Regex;

use crate::UNSPECIFIED_LABEL;

/// Clock times (e.g. `4:13:00 a. m.`) that leak into vehicle cells.
static CLOCK_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d{1,2}:\d{2}:\d{2}\s*(a|p)\.?\s*m\.?").expect("valid regex")
});

const REFUSED_TRANSFER_PHRASE: &str = "no deseando ser trasladado";

// ── Keys ─────────────────────────────────────────────────────────────

fn text_key(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        UNSPECIFIED_LABEL.to_string()
    } else {
        value.to_string()
    }
}

fn personnel_key(personnel: &Personnel) -> String {
    match personnel {
        Personnel::Count(n) => format!("{n} personas"),
        Personnel::Description(s) => text_key(s),
    }
}

/// Transfer flag, inferred from the description when the column is blank.
fn transfer_key(record: &ServiceRecord) -> &'static str {
    match record.transfer_performed {
        Some(true) => "Sí",
        Some(false) => "No",
        None => {
            let description = record.description.to_lowercase();
            if description.contains(REFUSED_TRANSFER_PHRASE) {
                "No (rechazado)"
            } else if description.contains("traslado") || description.contains("trasladado") {
                "Sí (inferido)"
            } else {
                UNSPECIFIED_LABEL
            }
        }
    }
}

/// Time-of-day band of a call time such as `"4:13"`.
fn time_band(call_time: &str) -> &'static str {
    let hour = call_time
        .split(':')
        .next()
        .and_then(|h| h.trim().parse::<u32>().ok());
    match hour {
        Some(0..=5) => "Madrugada (0-6h)",
        Some(6..=11) => "Mañana (6-12h)",
        Some(12..=17) => "Tarde (12-18h)",
        Some(18..=23) => "Noche (18-24h)",
        _ => UNSPECIFIED_LABEL,
    }
}

fn bump(tally: &mut BTreeMap<String, u64>, key: impl Into<String>) {
    *tally.entry(key.into()).or_default() += 1;
}

// ── Breakdown ────────────────────────────────────────────────────────

fn add_record(month: &mut MonthBreakdown, record: &ServiceRecord) {
    month.total += 1;
    bump(&mut month.service_codes, text_key(&record.service_code));
    bump(&mut month.localities, text_key(&record.locality));
    bump(&mut month.service_types, text_key(&record.service_type));
    bump(&mut month.personnel, personnel_key(&record.personnel_involved));
    bump(&mut month.transfers, transfer_key(record));
    bump(
        &mut month.years,
        record
            .year()
            .map_or_else(|| UNSPECIFIED_LABEL.to_string(), |y| y.to_string()),
    );
    bump(&mut month.time_bands, time_band(&record.call_time));

    if record.involved_vehicles.is_empty() {
        bump(&mut month.vehicles, UNSPECIFIED_LABEL);
    }
    for vehicle in &record.involved_vehicles {
        let label = CLOCK_TIME_RE.replace_all(vehicle, "");
        let label = label.trim();
        if !label.is_empty() {
            bump(&mut month.vehicles, label);
        }
    }
}

/// Tallies record attributes per calendar month, across years.
///
/// Records with an unknown date are only counted in
/// [`MonthlyBreakdown::undated_records`].
#[must_use]
pub fn monthly_breakdown(records: &[ServiceRecord]) -> MonthlyBreakdown {
    let mut months: BTreeMap<u32, MonthBreakdown> = BTreeMap::new();
    let mut undated_records = 0;

    for record in records {
        let Some(month) = record.month() else {
            undated_records += 1;
            continue;
        };
        let entry = months.entry(month).or_insert_with(|| MonthBreakdown {
            month,
            month_name: month_name(month).unwrap_or_default().to_string(),
            ..MonthBreakdown::default()
        });
        add_record(entry, record);
    }

    MonthlyBreakdown {
        months: months.into_values().collect(),
        undated_records,
    }
}

// ── Trends ───────────────────────────────────────────────────────────

/// Compares a count between an earlier and a later month.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
pub fn month_over_month_trend(previous: u64, current: u64) -> Trend {
    let change = current as i64 - previous as i64;
    let percent_change = if previous > 0 {
        (change as f64 / previous as f64) * 100.0
    } else if current > 0 {
        100.0
    } else {
        0.0
    };
    let direction = match change {
        c if c > 0 => TrendDirection::Up,
        c if c < 0 => TrendDirection::Down,
        _ => TrendDirection::Stable,
    };

    Trend {
        previous,
        current,
        change,
        percent_change,
        direction,
    }
}

/// Trends of each category between the last two months of the year that
/// had records. `None` when fewer than two months had records or a month
/// is outside 1-12.
#[must_use]
pub fn category_trends(statistic: &YearlyStatistic) -> Option<CategoryTrends> {
    let [.., previous_month, current_month] = statistic.months_with_data.as_slice() else {
        return None;
    };
    let (previous_month, current_month) = (*previous_month, *current_month);
    let trend = |values: &[u64; 12]| {
        let count = |month: u32| {
            month
                .checked_sub(1)
                .and_then(|i| values.get(usize::try_from(i).ok()?))
                .copied()
        };
        Some(month_over_month_trend(
            count(previous_month)?,
            count(current_month)?,
        ))
    };

    Some(CategoryTrends {
        year: statistic.year,
        previous_month,
        current_month,
        fires: trend(&statistic.fires.monthly_values)?,
        accidents: trend(&statistic.accidents.monthly_values)?,
        rescues: match &statistic.rescues {
            Some(r) => Some(trend(&r.monthly_values)?),
            None => None,
        },
    })
}
