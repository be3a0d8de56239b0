//! Canonicalisation of raw cell and field values into identifiers.
//!
//! Both normalizers are total: malformed input yields `None`, never an error.

use std::sync::LazyLock;

use regex::Regex;

use crate::stays::recon::model::{Identifier, ReserveCode};

static HEX_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9a-fA-F]{24}\b").expect("valid hex id pattern"));

static RESERVE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{3,12}$").expect("valid reserve code pattern"));

/// Minimum length for a value without an embedded hex id to be kept as-is.
const LOOSE_MIN_LEN: usize = 8;

/// Returns the trimmed value, or `None` for blanks and null-like markers.
fn meaningful(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if ["nan", "none", "null"]
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
    {
        return None;
    }
    Some(trimmed)
}

/// Normalizes a long-form identifier.
///
/// An embedded word-bounded 24-hex substring wins and is lower-cased.
/// Otherwise the trimmed value is kept when it has at least eight characters.
pub fn normalize_id(raw: &str) -> Option<Identifier> {
    let value = meaningful(raw)?;
    if let Some(found) = HEX_ID.find(value) {
        return Some(Identifier::new_unchecked(found.as_str().to_ascii_lowercase()));
    }
    if value.chars().count() >= LOOSE_MIN_LEN {
        return Some(Identifier::new_unchecked(value.to_string()));
    }
    None
}

/// Normalizes a long-form identifier, keeping only the strict hex shape.
pub fn normalize_strict_id(raw: &str) -> Option<Identifier> {
    normalize_id(raw).filter(Identifier::is_strict)
}

/// Normalizes a short reservation code (`[A-Z0-9]{3,12}` after upper-casing).
pub fn normalize_reserve_code(raw: &str) -> Option<ReserveCode> {
    let value = meaningful(raw)?.to_uppercase();
    RESERVE_CODE
        .is_match(&value)
        .then(|| ReserveCode::new_unchecked(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "64a1f0c2e4b0a1b2c3d4e5f6";

    #[test]
    fn embedded_hex_is_extracted_and_lowercased() {
        let upper = HEX.to_uppercase();
        for raw in [
            format!("Reserva {upper} (Airbnb)"),
            format!("  {HEX}  "),
            format!("ID:{upper}"),
            format!("https://host/{HEX}/view"),
        ] {
            let id = normalize_id(&raw).expect("identifier found");
            assert_eq!(id.as_str(), HEX, "input {raw:?}");
            assert!(id.is_strict());
        }
    }

    #[test]
    fn hex_inside_a_longer_word_is_not_matched() {
        let raw = format!("x{HEX}");
        let id = normalize_id(&raw).expect("loose fallback");
        assert_eq!(id.as_str(), raw);
        assert!(!id.is_strict());
        assert_eq!(normalize_strict_id(&raw), None);
    }

    #[test]
    fn null_markers_and_blanks_yield_nothing() {
        for raw in ["", "   ", "\t", "nan", "NaN", "None", "NONE", "null", " Null "] {
            assert_eq!(normalize_id(raw), None, "input {raw:?}");
            assert_eq!(normalize_reserve_code(raw), None, "input {raw:?}");
        }
    }

    #[test]
    fn loose_fallback_requires_eight_characters() {
        assert_eq!(normalize_id("ABC-1234").map(|id| id.to_string()), Some("ABC-1234".into()));
        assert_eq!(normalize_id("ABC-123"), None);
    }

    #[test]
    fn reserve_codes_are_uppercased_and_bounded() {
        assert_eq!(normalize_reserve_code(" eu26j ").map(|c| c.to_string()), Some("EU26J".into()));
        assert_eq!(normalize_reserve_code("AB"), None);
        assert_eq!(normalize_reserve_code("ABCDEFGHIJKLM"), None);
        assert_eq!(normalize_reserve_code("EU-26J"), None);
        assert!(normalize_reserve_code("ABCDEFGHIJKL").is_some());
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            format!("Stay {}", HEX.to_uppercase()),
            "some-external-ref".to_string(),
            "  loose value 42 ".to_string(),
        ];
        for raw in &inputs {
            let once = normalize_id(raw).expect("normalizes");
            let twice = normalize_id(once.as_str()).expect("still normalizes");
            assert_eq!(once, twice);
        }
        for raw in ["dq52j", "ZZZ999", " 12345 "] {
            let once = normalize_reserve_code(raw).expect("normalizes");
            assert_eq!(normalize_reserve_code(once.as_str()), Some(once));
        }
    }
}
