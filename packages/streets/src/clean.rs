//! Street address cleaning.
//!
//! Incident addresses are typed by hand and come in many shapes:
//! - With house numbers: `"San Martín 123"`, `"Belgrano N° 450"`
//! - With references: `"Ruta 20 ref: frente a la estación"`
//! - With qualifiers: `"Sarmiento altura del puente"`
//! - Intersections: `"Sarmiento y Belgrano"`, `"San Martín - Mitre"`,
//!   `"San Martin esquina Belgrano"`
//!
//! This module reduces them to canonical upper-case street keys.

use std::sync::LazyLock;

use regex::Regex;

/// House-number markers followed by digits (`N° 123`, `Nº123`, `No. 5`,
/// `No 5`).
static HOUSE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bN(?:[°º]|o\.?)\s*\d+").expect("valid regex"));

/// Standalone digit tokens. Digits glued to letters (`RN9`) are not
/// standalone.
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+\b").expect("valid regex"));

/// Reference annotations and everything after them.
static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bref\b:?.*$").expect("valid regex"));

/// Descriptive qualifiers and everything after them.
static QUALIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:detr[aá]s|frente|esquina|altura|entre)\b.*$").expect("valid regex")
});

/// Stray punctuation and dashes at the end.
static TRAILING_PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,;\-–]+$").expect("valid regex"));

/// Separators between the streets of an intersection.
static INTERSECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:y|esquina)\s+|\s+[-–]\s+").expect("valid regex"));

/// Canonical conjunction joining the streets of an intersection key.
pub const INTERSECTION_JOINER: &str = " Y ";

/// Result of cleaning one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanedAddress {
    /// A single street key.
    Street(String),
    /// Two or more streets.
    Intersection {
        /// Component streets joined with [`INTERSECTION_JOINER`].
        key: String,
        /// Component street keys, in address order.
        streets: Vec<String>,
    },
    /// Nothing usable was left.
    Empty,
}

/// Cleans one street name: drops house numbers, references and qualifiers,
/// trailing punctuation and redundant whitespace. Case is preserved.
#[must_use]
pub fn clean_street(raw: &str) -> String {
    let street = HOUSE_NUMBER_RE.replace_all(raw, "");
    let street = DIGITS_RE.replace_all(&street, "");
    let street = REFERENCE_RE.replace(&street, "");
    let street = QUALIFIER_RE.replace(&street, "");
    let street = TRAILING_PUNCTUATION_RE.replace(&street, "");

    street.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns `true` if `name` is an intersection key.
#[must_use]
pub fn is_intersection_key(name: &str) -> bool {
    name.contains(INTERSECTION_JOINER)
}

/// Component streets of an intersection key (the key itself for a single
/// street).
#[must_use]
pub fn intersection_streets(key: &str) -> Vec<&str> {
    key.split(INTERSECTION_JOINER).collect()
}

/// Cleans an address into a single street or an intersection.
///
/// Each part of an intersection is cleaned on its own and blank parts are
/// dropped; when fewer than two parts survive the address is a single
/// street. All keys are upper-cased.
#[must_use]
pub fn classify_address(raw: &str) -> CleanedAddress {
    let raw = raw.trim();
    if raw.is_empty() {
        return CleanedAddress::Empty;
    }

    let mut streets: Vec<String> = INTERSECTION_RE
        .split(raw)
        .map(clean_street)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_uppercase())
        .collect();

    match streets.len() {
        0 => CleanedAddress::Empty,
        1 => CleanedAddress::Street(streets.remove(0)),
        _ => CleanedAddress::Intersection {
            key: streets.join(INTERSECTION_JOINER),
            streets,
        },
    }
}
