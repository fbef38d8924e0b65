//! Where each record field lives in a raw row.
//!
//! Positional rows are read through a [`ColumnMapping`] and header-keyed
//! rows through a [`HeaderMapping`]. Both are exposed to the record builder
//! through the [`RowSource`] trait so the two input shapes share one
//! construction routine.

use fire_stats_service_models::{RawCell, RecordField};

use crate::NormalizeError;

static BLANK: RawCell = RawCell::Blank;

/// Column indices of each field in a positional row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Field to column indices. Multi-column fields list every column.
    pub columns: &'static [(RecordField, &'static [usize])],
}

impl ColumnMapping {
    /// Layout of the brigade's service spreadsheet.
    pub const DEFAULT: Self = Self {
        columns: &[
            (RecordField::Timestamp, &[0]),
            (RecordField::CallTime, &[1]),
            (RecordField::RequestedAt, &[2]),
            (RecordField::PartNumber, &[3]),
            (RecordField::ServiceCode, &[4]),
            (RecordField::Address, &[5]),
            (RecordField::Locality, &[6]),
            (RecordField::ServiceType, &[7]),
            (RecordField::Description, &[8]),
            (RecordField::InvolvedVehicles, &[9, 10, 11, 12]),
            (RecordField::PersonnelInvolved, &[13]),
            (RecordField::ExtraData, &[14]),
            (RecordField::UnitsInvolved, &[15]),
            (RecordField::TransferPerformed, &[16]),
            (RecordField::AffectedSurface, &[17]),
            (RecordField::CallSchedule, &[18]),
        ],
    };

    /// Column indices mapped to `field`, empty if unmapped.
    #[must_use]
    pub fn indices(&self, field: RecordField) -> &'static [usize] {
        self.columns
            .iter()
            .find(|(f, _)| *f == field)
            .map(|&(_, indices)| indices)
            .unwrap_or_default()
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Header names of each field in a keyed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMapping {
    /// Field to header names. Multi-column fields list every header.
    pub headers: &'static [(RecordField, &'static [&'static str])],
}

impl HeaderMapping {
    /// Headers of the brigade's service form export. Note the trailing space
    /// in `"Descripción "`, which is how the form names the column.
    pub const DEFAULT: Self = Self {
        headers: &[
            (RecordField::Timestamp, &["Marca temporal"]),
            (RecordField::CallTime, &["HORA DEL LLAMADO"]),
            (RecordField::RequestedAt, &["fecha del pedido"]),
            (RecordField::PartNumber, &["N° De Parte"]),
            (RecordField::ServiceCode, &["Código de Servicio"]),
            (RecordField::Address, &["Ubicación/ Dirección"]),
            (RecordField::Locality, &["Localidad"]),
            (RecordField::ServiceType, &["Tipo de Servicio"]),
            (RecordField::Description, &["Descripción "]),
            (
                RecordField::InvolvedVehicles,
                &["Móvil", "Móvil interviniente", "Movil interveniente"],
            ),
            (RecordField::PersonnelInvolved, &["Personal Interviniente"]),
            (RecordField::ExtraData, &["datos"]),
            (
                RecordField::UnitsInvolved,
                &["CANTIDAD DE UNIDAD INTERVENIENTES"],
            ),
            (RecordField::TransferPerformed, &["SE REALIZO EL TRASLADO"]),
            (RecordField::AffectedSurface, &["superficie afectada"]),
            (RecordField::CallSchedule, &["Horario del llamado"]),
        ],
    };

    /// Header names mapped to `field`, empty if unmapped.
    #[must_use]
    pub fn names(&self, field: RecordField) -> &'static [&'static str] {
        self.headers
            .iter()
            .find(|(f, _)| *f == field)
            .map(|&(_, names)| names)
            .unwrap_or_default()
    }
}

impl Default for HeaderMapping {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A raw row that can hand out the cells of each record field.
pub trait RowSource {
    /// Zero-based position of the row in its batch.
    fn row_index(&self) -> usize;

    /// All cells mapped to `field`, in mapping order. Missing columns are
    /// returned as blanks.
    fn cells(&self, field: RecordField) -> Vec<&RawCell>;

    /// The first cell mapped to `field`, blank when there is none.
    fn cell(&self, field: RecordField) -> &RawCell {
        self.cells(field).into_iter().next().unwrap_or(&BLANK)
    }
}

/// A positional row read through a [`ColumnMapping`]. Short rows behave as
/// if padded with blanks.
#[derive(Debug, Clone, Copy)]
pub struct PositionalRow<'a> {
    index: usize,
    cells: &'a [RawCell],
    mapping: &'a ColumnMapping,
}

impl<'a> PositionalRow<'a> {
    #[must_use]
    pub const fn new(index: usize, cells: &'a [RawCell], mapping: &'a ColumnMapping) -> Self {
        Self {
            index,
            cells,
            mapping,
        }
    }
}

impl RowSource for PositionalRow<'_> {
    fn row_index(&self) -> usize {
        self.index
    }

    fn cells(&self, field: RecordField) -> Vec<&RawCell> {
        self.mapping
            .indices(field)
            .iter()
            .map(|&i| self.cells.get(i).unwrap_or(&BLANK))
            .collect()
    }
}

/// A header-keyed row read through a [`HeaderMapping`].
///
/// Header lookup is exact first, then trimmed and case-insensitive, so
/// exports that lost the trailing space of a header still line up.
#[derive(Debug, Clone)]
pub struct KeyedRow<'a> {
    index: usize,
    entries: Vec<(String, RawCell)>,
    mapping: &'a HeaderMapping,
}

impl<'a> KeyedRow<'a> {
    /// Builds a row from header/cell pairs.
    #[must_use]
    pub const fn from_pairs(
        index: usize,
        entries: Vec<(String, RawCell)>,
        mapping: &'a HeaderMapping,
    ) -> Self {
        Self {
            index,
            entries,
            mapping,
        }
    }

    /// Builds a row from a decoded JSON object.
    ///
    /// # Errors
    ///
    /// * [`NormalizeError::NotAnObject`] if `value` is not an object
    /// * [`NormalizeError::UnsupportedCell`] if any value is an array or object
    pub fn from_json(
        index: usize,
        value: &serde_json::Value,
        mapping: &'a HeaderMapping,
    ) -> Result<Self, NormalizeError> {
        let object = value
            .as_object()
            .ok_or(NormalizeError::NotAnObject { row_index: index })?;

        let mut entries = Vec::with_capacity(object.len());
        for (header, cell) in object {
            let cell = RawCell::from_json(cell).map_err(|source| NormalizeError::UnsupportedCell {
                row_index: index,
                column: header.clone(),
                source,
            })?;
            entries.push((header.clone(), cell));
        }

        Ok(Self::from_pairs(index, entries, mapping))
    }

    fn lookup(&self, header: &str) -> Option<&RawCell> {
        if let Some((_, cell)) = self.entries.iter().find(|(h, _)| h == header) {
            return Some(cell);
        }
        let wanted = header.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(h, _)| h.trim().to_lowercase() == wanted)
            .map(|(_, cell)| cell)
    }
}

impl RowSource for KeyedRow<'_> {
    fn row_index(&self) -> usize {
        self.index
    }

    fn cells(&self, field: RecordField) -> Vec<&RawCell> {
        self.mapping
            .names(field)
            .iter()
            .map(|name| self.lookup(name).unwrap_or(&BLANK))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_positional_rows_read_as_blank() {
        let cells = vec![RawCell::from("ts"), RawCell::from("4:13")];
        let row = PositionalRow::new(0, &cells, &ColumnMapping::DEFAULT);
        assert_eq!(row.cell(RecordField::CallTime), &RawCell::from("4:13"));
        assert_eq!(row.cell(RecordField::CallSchedule), &RawCell::Blank);
        assert_eq!(row.cells(RecordField::InvolvedVehicles).len(), 4);
    }

    #[test]
    fn keyed_lookup_falls_back_to_trimmed_case_insensitive() {
        let value = serde_json::json!({
            "Descripción": "Humo en vivienda",
            "localidad": "VILLA DOLORES",
        });
        let row = KeyedRow::from_json(2, &value, &HeaderMapping::DEFAULT).unwrap();
        assert_eq!(
            row.cell(RecordField::Description),
            &RawCell::from("Humo en vivienda")
        );
        assert_eq!(
            row.cell(RecordField::Locality),
            &RawCell::from("VILLA DOLORES")
        );
        assert_eq!(row.cell(RecordField::ServiceCode), &RawCell::Blank);
    }

    #[test]
    fn keyed_lookup_prefers_exact_header() {
        let value = serde_json::json!({
            "datos": "exact",
            "DATOS": "other",
        });
        let row = KeyedRow::from_json(0, &value, &HeaderMapping::DEFAULT).unwrap();
        assert_eq!(row.cell(RecordField::ExtraData), &RawCell::from("exact"));
    }

    #[test]
    fn non_object_rows_are_rejected() {
        let err = KeyedRow::from_json(5, &serde_json::json!([1, 2]), &HeaderMapping::DEFAULT)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::NotAnObject { row_index: 5 }));
    }

    #[test]
    fn nested_cells_are_rejected() {
        let value = serde_json::json!({ "Localidad": { "nombre": "X" } });
        let err = KeyedRow::from_json(1, &value, &HeaderMapping::DEFAULT).unwrap_err();
        assert!(matches!(err, NormalizeError::UnsupportedCell { row_index: 1, .. }));
    }

    #[test]
    fn every_field_is_mapped() {
        for field in [
            RecordField::Timestamp,
            RecordField::RequestedAt,
            RecordField::InvolvedVehicles,
            RecordField::CallSchedule,
        ] {
            assert!(!ColumnMapping::DEFAULT.indices(field).is_empty());
            assert!(!HeaderMapping::DEFAULT.names(field).is_empty());
        }
    }
}
