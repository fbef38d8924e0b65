//! CSV decoding into the object-shaped rows the normalizer accepts.

use std::io::Read;
use std::path::Path;

use fire_stats_classify::TaxonomyError;
use fire_stats_normalize::{NormalizationReport, NormalizeOptions, normalize_objects};

/// Errors that stop a command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Input file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file is not valid CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Output could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Requested taxonomy is unknown or malformed.
    #[error("Taxonomy error: {0}")]
    Taxonomy(#[from] TaxonomyError),

    /// Input had no usable content.
    #[error("Invalid input: {0}")]
    Input(String),
}

/// Decodes CSV into one JSON object per data row, keyed by the trimmed
/// header row. Short rows yield blank cells; extra cells are ignored.
///
/// # Errors
///
/// * If the CSV is malformed
/// * If there is no header row
pub fn read_csv_objects(
    reader: impl Read,
    delimiter: u8,
) -> Result<Vec<serde_json::Value>, CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(CliError::Input("CSV file contains no header row".to_owned()));
    }

    let mut objects = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut map = serde_json::Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).unwrap_or("").trim();
            let value = if value.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::Value::String(value.to_owned())
            };
            map.insert(header.clone(), value);
        }
        objects.push(serde_json::Value::Object(map));
    }

    log::debug!("Decoded {} CSV row(s)", objects.len());
    Ok(objects)
}

/// Reads and normalizes a CSV file.
///
/// # Errors
///
/// * If the file cannot be opened or decoded
pub fn load_records(path: &Path, delimiter: u8) -> Result<NormalizationReport, CliError> {
    let file = std::fs::File::open(path)?;
    let objects = read_csv_objects(file, delimiter)?;
    let report = normalize_objects(&objects, &NormalizeOptions::default());

    if !report.has_valid_rows() && !objects.is_empty() {
        log::warn!("No row of {} could be normalized", path.display());
    } else if report.is_partial() {
        log::warn!(
            "{} row(s) of {} were skipped",
            report.skipped_rows().count(),
            path.display()
        );
    }

    Ok(report)
}

/// Parses a single-byte delimiter argument such as `,`, `;` or `\t`.
///
/// # Errors
///
/// * If the delimiter is not exactly one ASCII character
pub fn parse_delimiter(raw: &str) -> Result<u8, String> {
    match raw {
        "\\t" | "tab" => Ok(b'\t'),
        _ => match raw.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!("delimiter must be one ASCII character, got {raw:?}")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_rows_keyed_by_trimmed_headers() {
        let csv = " Fecha , Dirección ,Tipo de servicio\n1/2/2024, Mitre 10 ,Incendios-vivienda\n";
        let objects = read_csv_objects(csv.as_bytes(), b',').unwrap();

        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0]["Fecha"], serde_json::json!("1/2/2024"));
        assert_eq!(objects[0]["Dirección"], serde_json::json!("Mitre 10"));
    }

    #[test]
    fn short_rows_get_blank_cells_and_blank_rows_are_dropped() {
        let csv = "a;b;c\n1;2\n;;\n4;5;6;7\n";
        let objects = read_csv_objects(csv.as_bytes(), b';').unwrap();

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0]["c"], serde_json::Value::Null);
        assert_eq!(objects[1]["c"], serde_json::json!("6"));
        assert_eq!(objects[1].as_object().map(serde_json::Map::len), Some(3));
    }

    #[test]
    fn missing_header_row_is_an_error() {
        assert!(matches!(
            read_csv_objects("".as_bytes(), b','),
            Err(CliError::Input(_))
        ));
    }

    #[test]
    fn decoded_rows_normalize() {
        let csv = "fecha del pedido,Ubicación/ Dirección,Tipo de Servicio,Descripción ,\
                   CANTIDAD DE UNIDAD INTERVENIENTES\n\
                   15/3/2024,San Martín 123,Incendios-vivienda,Humo,2\n";
        let objects = read_csv_objects(csv.as_bytes(), b',').unwrap();
        let report = normalize_objects(&objects, &NormalizeOptions::default());

        assert_eq!(report.records.len(), 1);
        let record = &report.records[0];
        assert_eq!(record.year(), Some(2024));
        assert_eq!(record.month(), Some(3));
        assert_eq!(record.address, "San Martín 123");
        assert_eq!(record.description, "Humo");
        assert_eq!(record.units_involved, Some(2));
    }

    #[test]
    fn delimiters() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
