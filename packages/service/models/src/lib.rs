#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Service record types shared across the fire-stats workspace.
//!
//! Every row of a brigade's service log, whether it arrives as a positional
//! spreadsheet row or as a header-keyed object, is normalized into a
//! [`ServiceRecord`]. Raw input is modelled as a closed [`RawCell`] variant
//! at the ingestion boundary so downstream coercion never has to rediscover
//! the runtime type of a cell.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Label used for a call date that is missing or could not be parsed.
pub const UNSPECIFIED_DATE_LABEL: &str = "No especificado";

/// Maximum length of a plausible locality name. Longer cells are treated as
/// garbage (several fields collapsed into one cell) and emptied.
pub const MAX_LOCALITY_LEN: usize = 86;

/// A single raw spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    /// A text cell (not yet trimmed).
    Text(String),
    /// A numeric cell (spreadsheet numbers, including serial dates).
    Number(f64),
    /// An empty or missing cell.
    Blank,
}

/// Error returned when a JSON value cannot be represented as a [`RawCell`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedCellError {
    /// JSON type name of the offending value (`"array"` or `"object"`).
    pub kind: &'static str,
}

impl std::fmt::Display for UnsupportedCellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unsupported cell value of type {}", self.kind)
    }
}

impl std::error::Error for UnsupportedCellError {}

impl RawCell {
    /// Converts a decoded JSON value into a cell.
    ///
    /// Strings become [`RawCell::Text`], numbers [`RawCell::Number`], `null`
    /// becomes [`RawCell::Blank`] and booleans are kept as their text form.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedCellError`] for arrays and objects, which no
    /// spreadsheet decoder produces for a single cell.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, UnsupportedCellError> {
        match value {
            serde_json::Value::Null => Ok(Self::Blank),
            serde_json::Value::Bool(b) => Ok(Self::Text(b.to_string())),
            serde_json::Value::Number(n) => Ok(n.as_f64().map_or(Self::Blank, Self::Number)),
            serde_json::Value::String(s) => Ok(Self::Text(s.clone())),
            serde_json::Value::Array(_) => Err(UnsupportedCellError { kind: "array" }),
            serde_json::Value::Object(_) => Err(UnsupportedCellError { kind: "object" }),
        }
    }

    /// Returns `true` for blank cells and text cells holding only whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Blank => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// The date a service was requested.
///
/// [`CallDate::Unspecified`] is the single canonical "absent date" value:
/// a missing or unparseable cell never silently becomes "now" or the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallDate {
    /// A real calendar date (with time-of-day when the source had one).
    Known(NaiveDateTime),
    /// The source cell was blank or unparseable.
    Unspecified,
}

impl CallDate {
    /// Returns the date-time if known.
    #[must_use]
    pub const fn date_time(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Known(dt) => Some(*dt),
            Self::Unspecified => None,
        }
    }

    /// Returns `true` if this is a real date.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Calendar month (1-12) of a known date.
    #[must_use]
    pub fn month(&self) -> Option<u32> {
        self.date_time().map(|dt| dt.month())
    }

    /// Calendar year of a known date.
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        self.date_time().map(|dt| dt.year())
    }
}

impl std::fmt::Display for CallDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Known(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Self::Unspecified => f.write_str(UNSPECIFIED_DATE_LABEL),
        }
    }
}

impl Serialize for CallDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Personnel who attended a service.
///
/// Sources either record a head count or list the firefighters by name, so
/// both shapes are valid data rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Personnel {
    /// Number of people.
    Count(u32),
    /// Free text kept verbatim (usually a list of names).
    Description(String),
}

/// Incident category assigned by the classifier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceCategory {
    /// Structural, forest, vehicle and other fires
    Fire,
    /// Traffic and aviation accidents
    Accident,
    /// Rescues of people or animals and ambulance service
    Rescue,
}

impl ServiceCategory {
    /// Returns all variants of this enum, in classification precedence order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Fire, Self::Accident, Self::Rescue]
    }
}

/// Fields of a [`ServiceRecord`], used to attribute coercion diagnostics.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordField {
    Timestamp,
    CallTime,
    RequestedAt,
    PartNumber,
    ServiceCode,
    Address,
    Locality,
    ServiceType,
    Description,
    InvolvedVehicles,
    PersonnelInvolved,
    ExtraData,
    UnitsInvolved,
    TransferPerformed,
    AffectedSurface,
    CallSchedule,
}

/// One normalized service (incident) record.
///
/// Records are built once by the normalizer and only read afterwards.
/// `month` and `year` are derived from [`ServiceRecord::requested_at`], so
/// they are present exactly when the call date is known.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRecord {
    /// Zero-based position of the source row, for error reporting.
    pub row_index: usize,
    /// Identifier generated at normalization time.
    pub id: Uuid,
    /// Spreadsheet submission timestamp, as text.
    pub timestamp: String,
    /// Time of the call, as text (e.g. `"4:13"`).
    pub call_time: String,
    /// Date the service was requested.
    pub requested_at: CallDate,
    /// Incident report ("parte") number.
    pub part_number: String,
    /// Terse service code (e.g. `"2H"`).
    pub service_code: String,
    /// Free-text street address.
    pub address: String,
    /// Locality name, empty when missing or implausibly long.
    pub locality: String,
    /// Human-readable service type (e.g. `"Incendios-vivienda"`).
    pub service_type: String,
    /// Narrative description.
    pub description: String,
    /// Vehicles dispatched, deduplicated in first-seen order.
    pub involved_vehicles: Vec<String>,
    /// Personnel who attended.
    pub personnel_involved: Personnel,
    /// Additional free-text data column.
    pub extra_data: String,
    /// Number of units involved, if recorded.
    pub units_involved: Option<i64>,
    /// Whether a patient transfer was performed, if recorded.
    pub transfer_performed: Option<bool>,
    /// Affected surface description.
    pub affected_surface: String,
    /// Call schedule column, as text.
    pub call_schedule: String,
}

impl ServiceRecord {
    /// Calendar month (1-12) of the call, if the date is known.
    #[must_use]
    pub fn month(&self) -> Option<u32> {
        self.requested_at.month()
    }

    /// Calendar year of the call, if the date is known.
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        self.requested_at.year()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceRecordJson<'a> {
    row_index: usize,
    id: &'a Uuid,
    timestamp: &'a str,
    call_time: &'a str,
    requested_at: &'a CallDate,
    month: Option<u32>,
    year: Option<i32>,
    part_number: &'a str,
    service_code: &'a str,
    address: &'a str,
    locality: &'a str,
    service_type: &'a str,
    description: &'a str,
    involved_vehicles: &'a [String],
    personnel_involved: &'a Personnel,
    extra_data: &'a str,
    units_involved: Option<i64>,
    transfer_performed: Option<bool>,
    affected_surface: &'a str,
    call_schedule: &'a str,
}

impl Serialize for ServiceRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ServiceRecordJson {
            row_index: self.row_index,
            id: &self.id,
            timestamp: &self.timestamp,
            call_time: &self.call_time,
            requested_at: &self.requested_at,
            month: self.month(),
            year: self.year(),
            part_number: &self.part_number,
            service_code: &self.service_code,
            address: &self.address,
            locality: &self.locality,
            service_type: &self.service_type,
            description: &self.description,
            involved_vehicles: &self.involved_vehicles,
            personnel_involved: &self.personnel_involved,
            extra_data: &self.extra_data,
            units_involved: self.units_involved,
            transfer_performed: self.transfer_performed,
            affected_surface: &self.affected_surface,
            call_schedule: &self.call_schedule,
        }
        .serialize(serializer)
    }
}

/// Severity of a [`RowDiagnostic`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticSeverity {
    /// A field fell back to its absent value; the row was still emitted.
    Warning,
    /// The row (or record) was left out of the output.
    Error,
}

/// A problem found while normalizing or aggregating one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDiagnostic {
    /// Zero-based source row.
    pub row_index: usize,
    /// How serious the problem is.
    pub severity: DiagnosticSeverity,
    /// The field involved, if the problem is field-level.
    pub field: Option<RecordField>,
    /// Human-readable description.
    pub message: String,
    /// Raw source content, when useful for display.
    pub raw: Option<String>,
}

impl RowDiagnostic {
    /// Creates a field-level warning.
    #[must_use]
    pub fn field_warning(row_index: usize, field: RecordField, message: impl Into<String>) -> Self {
        Self {
            row_index,
            severity: DiagnosticSeverity::Warning,
            field: Some(field),
            message: message.into(),
            raw: None,
        }
    }

    /// Creates a row-level error for a row that was left out.
    #[must_use]
    pub fn row_error(
        row_index: usize,
        message: impl Into<String>,
        raw: Option<String>,
    ) -> Self {
        Self {
            row_index,
            severity: DiagnosticSeverity::Error,
            field: None,
            message: message.into(),
            raw,
        }
    }
}
