//! Character trigram similarity between street names.

use std::collections::HashSet;

fn trigrams(chars: &[char]) -> HashSet<&[char]> {
    chars.windows(3).collect()
}

/// Jaccard similarity of the two names' character trigram sets, ignoring
/// case.
///
/// Identical names score `1.0`. Different names where either one is shorter
/// than three characters score `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    if a == b {
        return 1.0;
    }
    if a.len() < 3 || b.len() < 3 {
        return 0.0;
    }

    let a = trigrams(&a);
    let b = trigrams(&b);
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_names_ignoring_case() {
        assert!((trigram_similarity("Mitre", "MITRE") - 1.0).abs() < f64::EPSILON);
        assert!((trigram_similarity("", "") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn short_names_never_match_others() {
        assert!(trigram_similarity("AB", "ABC").abs() < f64::EPSILON);
        assert!(trigram_similarity("", "Mitre").abs() < f64::EPSILON);
    }

    #[test]
    fn disjoint_names() {
        assert!(trigram_similarity("Mitre", "Belgrano").abs() < f64::EPSILON);
    }

    #[test]
    fn prefixed_street_name() {
        // 8 shared trigrams out of 12 distinct.
        let score = trigram_similarity("SAN MARTÍN", "AV. SAN MARTÍN");
        assert!((score - 8.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn is_symmetric() {
        let ab = trigram_similarity("Sarmiento", "Sarmiento Norte");
        let ba = trigram_similarity("Sarmiento Norte", "Sarmiento");
        assert!((ab - ba).abs() < f64::EPSILON);
        assert!(ab > 0.5);
    }
}
