//! Raw cell coercion.
//!
//! Pure functions turning a [`RawCell`] into a typed value. None of them
//! panic; a cell that cannot be converted yields the field's absent value
//! (`None`, [`CallDate::Unspecified`], an empty string) and it is up to the
//! caller to decide whether that deserves a diagnostic.

use std::sync::LazyLock;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use fire_stats_service_models::{CallDate, Personnel, RawCell};
use regex::Regex;
use serde::Deserialize;

/// `D/M/YY` or `D/M/YYYY`, optionally followed by `H:MM` or `H:MM:SS`.
static SLASH_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,2})/([0-9]{1,2})/([0-9]{4}|[0-9]{2})(?:\s+([0-9]{1,2}):([0-9]{2})(?::([0-9]{2}))?)?$")
        .expect("valid regex")
});

/// Everything that is not part of a number.
static NON_NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.,]").expect("valid regex"));

/// Largest two-digit year mapped into the 2000s.
const TWO_DIGIT_YEAR_PIVOT: i32 = 30;

/// Highest spreadsheet serial accepted as a date (9999-12-31).
const MAX_SERIAL_DATE: f64 = 2_958_465.0;

/// Lowest serial accepted when it arrives as text (1927-05-18). Smaller
/// numbers typed in a date cell are years or day numbers, not dates.
const MIN_TEXT_SERIAL_DATE: f64 = 10_000.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Locale-specific token lists used while coercing cells.
///
/// The default is the Spanish (Argentina) vocabulary of the brigade's
/// spreadsheets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoercionLocale {
    /// Lowercase tokens read as `true`.
    pub affirmative: Vec<String>,
    /// Lowercase tokens read as `false`.
    pub negative: Vec<String>,
    /// Whole words marking a personnel cell as a list of names.
    pub personnel_markers: Vec<String>,
}

impl Default for CoercionLocale {
    fn default() -> Self {
        let owned = |tokens: &[&str]| tokens.iter().map(|t| (*t).to_string()).collect();
        Self {
            affirmative: owned(&["sí", "si", "yes", "true", "1", "verdadero"]),
            negative: owned(&["no", "false", "0", "falso"]),
            personnel_markers: owned(&["y", "bombero"]),
        }
    }
}

/// Stringifies and trims a cell. Blank cells become `""`.
///
/// Integral numbers are printed without a fractional part.
#[must_use]
pub fn to_text(cell: &RawCell) -> String {
    match cell {
        RawCell::Text(s) => s.trim().to_string(),
        RawCell::Number(n) => n.to_string(),
        RawCell::Blank => String::new(),
    }
}

/// Reads a number, accepting a comma as decimal separator.
///
/// Blank and unparseable cells are `None`, never zero.
#[must_use]
pub fn to_number(cell: &RawCell) -> Option<f64> {
    match cell {
        RawCell::Number(n) => n.is_finite().then_some(*n),
        RawCell::Text(s) => parse_decimal(s),
        RawCell::Blank => None,
    }
}

fn parse_decimal(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replacen(',', ".", 1)
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Reads an integral number. Non-integral values are `None`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_integer(cell: &RawCell) -> Option<i64> {
    let n = to_number(cell)?;
    if n.fract() != 0.0 || n.abs() > 9.0e15 {
        return None;
    }
    Some(n as i64)
}

/// Reads a yes/no cell using the locale's token lists (case-insensitive).
#[must_use]
pub fn to_boolean(cell: &RawCell, locale: &CoercionLocale) -> Option<bool> {
    let token = to_text(cell).to_lowercase();
    if token.is_empty() {
        return None;
    }
    if locale.affirmative.iter().any(|t| *t == token) {
        return Some(true);
    }
    if locale.negative.iter().any(|t| *t == token) {
        return Some(false);
    }
    None
}

/// Reads the date a service was requested.
///
/// Accepts spreadsheet serial numbers (also as numeric text from
/// [`MIN_TEXT_SERIAL_DATE`] on), `D/M/YY` and
/// `D/M/YYYY` with an optional time, and ISO `YYYY-MM-DD[THH:MM:SS]`.
/// Two-digit years up to 30 land in the 2000s, the rest in the 1900s.
#[must_use]
pub fn to_date(cell: &RawCell) -> CallDate {
    let parsed = match cell {
        RawCell::Number(n) => from_serial(*n),
        RawCell::Text(s) => parse_date_text(s.trim()),
        RawCell::Blank => None,
    };
    parsed.map_or(CallDate::Unspecified, CallDate::Known)
}

fn parse_date_text(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Some(serial) = parse_decimal(s) {
        if serial < MIN_TEXT_SERIAL_DATE {
            return None;
        }
        return from_serial(serial);
    }
    if let Some(caps) = SLASH_DATE_RE.captures(s) {
        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        let day = number(1)?;
        let month = number(2)?;
        let year_text = caps.get(3)?.as_str();
        let mut year = year_text.parse::<i32>().ok()?;
        if year_text.len() == 2 {
            year += if year <= TWO_DIGIT_YEAR_PIVOT { 2000 } else { 1900 };
        }
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = match number(4) {
            Some(hour) => NaiveTime::from_hms_opt(hour, number(5)?, number(6).unwrap_or(0))?,
            None => NaiveTime::MIN,
        };
        return Some(date.and_time(time));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Converts a spreadsheet serial date (days since 1899-12-30, fraction is
/// the time of day) into a date-time rounded to the second.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn from_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL_DATE).contains(&serial) {
        return None;
    }
    let days = serial.floor();
    let seconds = ((serial - days) * SECONDS_PER_DAY).round() as i64;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_days(Days::new(days as u64))?;
    date.and_time(NaiveTime::MIN)
        .checked_add_signed(TimeDelta::try_seconds(seconds)?)
}

/// Collects the vehicles of a row: trimmed, blanks dropped, exact
/// duplicates removed, first-seen order kept.
#[must_use]
pub fn to_vehicle_list<'a>(cells: impl IntoIterator<Item = &'a RawCell>) -> Vec<String> {
    let mut vehicles: Vec<String> = Vec::new();
    for cell in cells {
        let vehicle = to_text(cell);
        if !vehicle.is_empty() && !vehicles.contains(&vehicle) {
            vehicles.push(vehicle);
        }
    }
    vehicles
}

/// Reads the personnel cell, which holds either a head count or names.
///
/// Blank is a count of zero. Only whole, non-negative numbers are counts.
/// Text with a comma or a whole-word marker is kept verbatim; otherwise the
/// digits are extracted, falling back to the raw text.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_personnel(cell: &RawCell, locale: &CoercionLocale) -> Personnel {
    let as_count = |n: f64| {
        (n.fract() == 0.0 && n >= 0.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
    };

    let text = match cell {
        RawCell::Blank => return Personnel::Count(0),
        RawCell::Number(n) => {
            return as_count(*n).map_or_else(|| Personnel::Description(n.to_string()), Personnel::Count);
        }
        RawCell::Text(s) => s.trim(),
    };
    if text.is_empty() {
        return Personnel::Count(0);
    }
    if let Some(count) = parse_decimal(text).and_then(as_count) {
        return Personnel::Count(count);
    }
    if text.contains(',') || has_marker_word(text, &locale.personnel_markers) {
        return Personnel::Description(text.to_string());
    }
    let digits = NON_NUMERIC_RE.replace_all(text, "");
    parse_decimal(&digits)
        .and_then(as_count)
        .map_or_else(|| Personnel::Description(text.to_string()), Personnel::Count)
}

fn has_marker_word(text: &str, markers: &[String]) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| {
            let word = word.to_lowercase();
            markers.iter().any(|m| *m == word)
        })
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    fn known(cell: &RawCell) -> NaiveDateTime {
        to_date(cell).date_time().unwrap()
    }

    // ── Text and numbers ──────────────────────────────────────────

    #[test]
    fn text_is_trimmed_and_numbers_drop_trailing_zero() {
        assert_eq!(to_text(&text("  MOVIL 96 ")), "MOVIL 96");
        assert_eq!(to_text(&RawCell::Number(12.0)), "12");
        assert_eq!(to_text(&RawCell::Number(3.5)), "3.5");
        assert_eq!(to_text(&RawCell::Blank), "");
    }

    #[test]
    fn number_accepts_decimal_comma() {
        assert_eq!(to_number(&text("3,5")), Some(3.5));
        assert_eq!(to_number(&text(" 12 ")), Some(12.0));
        assert_eq!(to_number(&RawCell::Number(7.0)), Some(7.0));
    }

    #[test]
    fn number_is_absent_not_zero() {
        assert_eq!(to_number(&RawCell::Blank), None);
        assert_eq!(to_number(&text("")), None);
        assert_eq!(to_number(&text("dos")), None);
    }

    #[test]
    fn integer_rejects_fractions() {
        assert_eq!(to_integer(&text("3")), Some(3));
        assert_eq!(to_integer(&text("3,5")), None);
        assert_eq!(to_integer(&RawCell::Blank), None);
    }

    // ── Booleans ──────────────────────────────────────────────────

    #[test]
    fn boolean_tokens_are_case_insensitive() {
        let locale = CoercionLocale::default();
        assert_eq!(to_boolean(&text("SÍ"), &locale), Some(true));
        assert_eq!(to_boolean(&text("si"), &locale), Some(true));
        assert_eq!(to_boolean(&text("Verdadero"), &locale), Some(true));
        assert_eq!(to_boolean(&text("No"), &locale), Some(false));
        assert_eq!(to_boolean(&RawCell::Number(1.0), &locale), Some(true));
        assert_eq!(to_boolean(&RawCell::Number(0.0), &locale), Some(false));
    }

    #[test]
    fn unknown_boolean_is_absent() {
        let locale = CoercionLocale::default();
        assert_eq!(to_boolean(&text("tal vez"), &locale), None);
        assert_eq!(to_boolean(&RawCell::Blank, &locale), None);
    }

    // ── Dates ─────────────────────────────────────────────────────

    #[test]
    fn two_digit_years_pivot_at_thirty() {
        assert_eq!(known(&text("1/1/24")).year(), 2024);
        assert_eq!(known(&text("15/6/30")).year(), 2030);
        assert_eq!(known(&text("15/6/31")).year(), 1931);
        assert_eq!(known(&text("15/6/99")).year(), 1999);
    }

    #[test]
    fn slash_date_reads_plain_calendar_month() {
        let dt = known(&text("9/3/2024"));
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 9));
    }

    #[test]
    fn slash_date_with_time() {
        let dt = known(&text("9/3/2024 14:05"));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (14, 5, 0));
        let dt = known(&text("9/3/2024 4:13:27"));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (4, 13, 27));
    }

    #[test]
    fn serial_dates_use_spreadsheet_epoch() {
        let dt = known(&RawCell::Number(45_292.0));
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let dt = known(&RawCell::Number(45_292.5));
        assert_eq!((dt.hour(), dt.minute()), (12, 0));

        let dt = known(&text("45292"));
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn small_numeric_text_is_not_a_serial() {
        assert_eq!(to_date(&text("2024")), CallDate::Unspecified);
        assert_eq!(to_date(&text("15")), CallDate::Unspecified);
        assert_eq!(to_date(&text("9999,5")), CallDate::Unspecified);
        assert_eq!(
            known(&text("10000")).date(),
            NaiveDate::from_ymd_opt(1927, 5, 18).unwrap()
        );
    }

    #[test]
    fn iso_dates_are_accepted() {
        let dt = known(&text("2023-11-02"));
        assert_eq!((dt.year(), dt.month(), dt.day()), (2023, 11, 2));
    }

    #[test]
    fn blank_or_garbage_date_is_unspecified() {
        assert_eq!(to_date(&RawCell::Blank), CallDate::Unspecified);
        assert_eq!(to_date(&text("   ")), CallDate::Unspecified);
        assert_eq!(to_date(&text("ayer a la tarde")), CallDate::Unspecified);
        assert_eq!(to_date(&text("31/2/2024")), CallDate::Unspecified);
        assert_eq!(to_date(&RawCell::Number(-3.0)), CallDate::Unspecified);
    }

    // ── Vehicles ──────────────────────────────────────────────────

    #[test]
    fn vehicle_list_drops_blanks_and_duplicates() {
        let cells = vec![
            text(" MOVIL 96"),
            RawCell::Blank,
            text("MOVIL 96 "),
            text("MOVIL 12"),
            text(""),
        ];
        assert_eq!(to_vehicle_list(&cells), vec!["MOVIL 96", "MOVIL 12"]);
    }

    #[test]
    fn vehicle_list_keeps_near_duplicates() {
        let cells = vec![text("Movil 96"), text("MOVIL 96")];
        assert_eq!(to_vehicle_list(&cells), vec!["Movil 96", "MOVIL 96"]);
    }

    // ── Personnel ─────────────────────────────────────────────────

    #[test]
    fn personnel_counts() {
        let locale = CoercionLocale::default();
        assert_eq!(to_personnel(&RawCell::Blank, &locale), Personnel::Count(0));
        assert_eq!(to_personnel(&RawCell::Number(4.0), &locale), Personnel::Count(4));
        assert_eq!(to_personnel(&text("3"), &locale), Personnel::Count(3));
        assert_eq!(to_personnel(&text("5 personas"), &locale), Personnel::Count(5));
    }

    #[test]
    fn personnel_names_are_kept_verbatim() {
        let locale = CoercionLocale::default();
        assert_eq!(
            to_personnel(&text("Gomez, Perez"), &locale),
            Personnel::Description("Gomez, Perez".to_string())
        );
        assert_eq!(
            to_personnel(&text("Gomez y Perez"), &locale),
            Personnel::Description("Gomez y Perez".to_string())
        );
        assert_eq!(
            to_personnel(&text("Bombero 2"), &locale),
            Personnel::Description("Bombero 2".to_string())
        );
    }

    #[test]
    fn fractional_personnel_is_not_rounded() {
        let locale = CoercionLocale::default();
        assert_eq!(
            to_personnel(&text("3,5"), &locale),
            Personnel::Description("3,5".to_string())
        );
        assert_eq!(
            to_personnel(&text("2.5"), &locale),
            Personnel::Description("2.5".to_string())
        );
        assert_eq!(
            to_personnel(&RawCell::Number(2.5), &locale),
            Personnel::Description("2.5".to_string())
        );
    }

    #[test]
    fn personnel_without_digits_falls_back_to_text() {
        let locale = CoercionLocale::default();
        assert_eq!(
            to_personnel(&text("guardia completa"), &locale),
            Personnel::Description("guardia completa".to_string())
        );
    }
}
