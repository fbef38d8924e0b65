#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalization of raw service-log rows into [`ServiceRecord`]s.
//!
//! Two input shapes are supported: positional rows read through a
//! [`ColumnMapping`] and header-keyed objects read through a
//! [`HeaderMapping`]. A bad field never drops a row; it takes its absent
//! value and leaves a warning in the [`NormalizationReport`]. Rows that are
//! structurally broken are skipped with an error diagnostic and the batch
//! carries on.

pub mod coercion;
pub mod mapping;

use fire_stats_service_models::{
    CallDate, DiagnosticSeverity, MAX_LOCALITY_LEN, RawCell, RecordField, RowDiagnostic,
    ServiceRecord, UnsupportedCellError,
};
use serde::Serialize;
use uuid::Uuid;

pub use coercion::CoercionLocale;
pub use mapping::{ColumnMapping, HeaderMapping, KeyedRow, PositionalRow, RowSource};

/// Errors that make a single row unusable.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// A keyed row was not an object.
    #[error("Row {row_index} is not an object")]
    NotAnObject {
        /// Zero-based row position.
        row_index: usize,
    },

    /// A cell held a nested array or object.
    #[error("Row {row_index}, column {column:?}: {source}")]
    UnsupportedCell {
        /// Zero-based row position.
        row_index: usize,
        /// Header of the offending cell.
        column: String,
        /// Underlying conversion failure.
        #[source]
        source: UnsupportedCellError,
    },
}

/// Settings shared by every normalization entry point.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Token lists for booleans and personnel.
    pub locale: CoercionLocale,
    /// Layout of positional rows.
    pub columns: ColumnMapping,
    /// Headers of keyed rows.
    pub headers: HeaderMapping,
}

/// Result of normalizing one batch of rows.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationReport {
    /// Records in source order.
    pub records: Vec<ServiceRecord>,
    /// Field warnings and skipped-row errors, in source order.
    pub diagnostics: Vec<RowDiagnostic>,
}

impl NormalizationReport {
    /// Diagnostics of rows that were left out.
    pub fn skipped_rows(&self) -> impl Iterator<Item = &RowDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
    }

    /// Field-level warnings of rows that were kept.
    pub fn warnings(&self) -> impl Iterator<Item = &RowDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
    }

    /// `true` when some rows were imported and some were skipped.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.has_valid_rows() && self.skipped_rows().next().is_some()
    }

    /// `true` when at least one record was produced.
    #[must_use]
    pub fn has_valid_rows(&self) -> bool {
        !self.records.is_empty()
    }

    fn push_skipped(&mut self, err: &NormalizeError, row_index: usize, raw: String) {
        log::debug!("Skipping row {row_index}: {err}");
        self.diagnostics
            .push(RowDiagnostic::row_error(row_index, err.to_string(), Some(raw)));
    }

    fn log_summary(&self, shape: &str) {
        log::info!(
            "Normalized {} {shape} row(s): {} skipped, {} field warning(s)",
            self.records.len(),
            self.skipped_rows().count(),
            self.warnings().count(),
        );
    }
}

/// Normalizes positional rows using [`NormalizeOptions::columns`].
#[must_use]
pub fn normalize_rows(rows: &[Vec<RawCell>], options: &NormalizeOptions) -> NormalizationReport {
    let mut report = NormalizationReport::default();
    for (index, cells) in rows.iter().enumerate() {
        let row = PositionalRow::new(index, cells, &options.columns);
        let record = build_record(&row, &options.locale, &mut report.diagnostics);
        report.records.push(record);
    }
    report.log_summary("positional");
    report
}

/// Normalizes header-keyed JSON objects using [`NormalizeOptions::headers`].
///
/// Entries that are not objects, or that hold nested arrays/objects, are
/// skipped with an error diagnostic carrying the raw JSON.
#[must_use]
pub fn normalize_objects(
    objects: &[serde_json::Value],
    options: &NormalizeOptions,
) -> NormalizationReport {
    let mut report = NormalizationReport::default();
    for (index, value) in objects.iter().enumerate() {
        match KeyedRow::from_json(index, value, &options.headers) {
            Ok(row) => {
                let record = build_record(&row, &options.locale, &mut report.diagnostics);
                report.records.push(record);
            }
            Err(e) => report.push_skipped(&e, index, value.to_string()),
        }
    }
    report.log_summary("keyed");
    report
}

/// Normalizes a header row plus positional rows as keyed rows, so columns
/// are found by name rather than by position.
#[must_use]
pub fn normalize_table(
    headers: &[String],
    rows: &[Vec<RawCell>],
    options: &NormalizeOptions,
) -> NormalizationReport {
    let mut report = NormalizationReport::default();
    for (index, cells) in rows.iter().enumerate() {
        let entries = headers
            .iter()
            .cloned()
            .zip(cells.iter().cloned())
            .collect::<Vec<_>>();
        let row = KeyedRow::from_pairs(index, entries, &options.headers);
        let record = build_record(&row, &options.locale, &mut report.diagnostics);
        report.records.push(record);
    }
    report.log_summary("table");
    report
}

/// Builds one record from any [`RowSource`].
///
/// Fields that cannot be coerced take their absent value and push a
/// warning onto `diagnostics`.
pub fn build_record(
    row: &impl RowSource,
    locale: &CoercionLocale,
    diagnostics: &mut Vec<RowDiagnostic>,
) -> ServiceRecord {
    use coercion::{to_boolean, to_date, to_integer, to_personnel, to_text, to_vehicle_list};

    let row_index = row.row_index();
    let text = |field| to_text(row.cell(field));
    let mut warn = |field: RecordField, cell: &RawCell, what: &str| {
        diagnostics.push(RowDiagnostic {
            raw: Some(to_text(cell)),
            ..RowDiagnostic::field_warning(row_index, field, format!("Unreadable {what}"))
        });
    };

    let date_cell = row.cell(RecordField::RequestedAt);
    let requested_at = to_date(date_cell);
    if requested_at == CallDate::Unspecified && !date_cell.is_blank() {
        warn(RecordField::RequestedAt, date_cell, "date");
    }

    let mut locality = text(RecordField::Locality);
    if locality.chars().count() > MAX_LOCALITY_LEN {
        warn(
            RecordField::Locality,
            row.cell(RecordField::Locality),
            "locality (too long)",
        );
        locality.clear();
    }

    let units_cell = row.cell(RecordField::UnitsInvolved);
    let units_involved = to_integer(units_cell);
    if units_involved.is_none() && !units_cell.is_blank() {
        warn(RecordField::UnitsInvolved, units_cell, "unit count");
    }

    let transfer_cell = row.cell(RecordField::TransferPerformed);
    let transfer_performed = to_boolean(transfer_cell, locale);
    if transfer_performed.is_none() && !transfer_cell.is_blank() {
        warn(RecordField::TransferPerformed, transfer_cell, "transfer flag");
    }

    ServiceRecord {
        row_index,
        id: Uuid::new_v4(),
        timestamp: text(RecordField::Timestamp),
        call_time: text(RecordField::CallTime),
        requested_at,
        part_number: text(RecordField::PartNumber),
        service_code: text(RecordField::ServiceCode),
        address: text(RecordField::Address),
        locality,
        service_type: text(RecordField::ServiceType),
        description: text(RecordField::Description),
        involved_vehicles: to_vehicle_list(row.cells(RecordField::InvolvedVehicles)),
        personnel_involved: to_personnel(row.cell(RecordField::PersonnelInvolved), locale),
        extra_data: text(RecordField::ExtraData),
        units_involved,
        transfer_performed,
        affected_surface: text(RecordField::AffectedSurface),
        call_schedule: text(RecordField::CallSchedule),
    }
}
