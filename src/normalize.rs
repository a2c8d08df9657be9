//! Field normalization
//!
//! Every function here is total: any input, including empty strings and
//! numbers that went through a spreadsheet and came back as text, maps to a
//! canonical value. Grouping and equality in the rest of the crate only ever
//! compare these canonical forms.

use chrono::NaiveDate;

/// Largest quantity a single line can carry; bigger cells are clamped to it
pub const MAX_LINE_QUANTITY: u64 = 1_000_000_000;

const YEAR_FIRST_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Two-digit years before four-digit ones so that `10/01/24` is not read as
/// the year 24.
const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%d-%m-%y",
    "%d-%m-%Y",
];

/// Canonical SKU token: uppercase, slashes become spaces, whitespace collapsed.
///
/// `"white/black"`, `"WHITE\\BLACK"` and `" White / Black "` all become
/// `"WHITE BLACK"`.
pub fn normalize_sku(raw: &str) -> String {
    raw.to_uppercase()
        .replace(['/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical phone: digits only, with a single leading zero stripped.
///
/// Spreadsheets drop the leading zero of numeric cells, so `"050-123-4567"`
/// and `501234567.0` must land on the same key. Stripping (rather than adding)
/// the zero keeps partial search terms usable as substrings.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = strip_decimal_artifact(raw)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    match digits.strip_prefix('0') {
        Some(rest) => rest.to_string(),
        None => digits,
    }
}

/// Quantity as a non-negative integer.
///
/// Fractions truncate toward zero (`"12.7"` is 12), commas are treated as
/// thousands separators, and anything non-numeric, negative or non-finite is 0.
/// Values above `MAX_LINE_QUANTITY` are clamped to it, so sums over any
/// realistic batch stay far from `u64::MAX`.
pub fn normalize_quantity(raw: &str) -> u64 {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => {
            (value.trunc() as u64).min(MAX_LINE_QUANTITY)
        }
        _ => 0,
    }
}

/// Calendar date from a day-first string; any time-of-day part is discarded.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split([' ', 'T']).next()?;
    if date_part.is_empty() {
        return None;
    }

    let year_first = date_part.chars().take_while(char::is_ascii_digit).count() == 4;
    let formats = if year_first {
        YEAR_FIRST_FORMATS
    } else {
        DAY_FIRST_FORMATS
    };

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Order numbers, shipping numbers: trimmed, `.0` artifact removed, otherwise kept.
pub fn normalize_order_identifier(raw: &str) -> String {
    strip_decimal_artifact(raw).to_string()
}

fn strip_decimal_artifact(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_suffix(".0").unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_sku_spellings_merge() {
        let a = normalize_sku("white/black");
        let b = normalize_sku("WHITE\\BLACK");
        let c = normalize_sku(" White / Black ");
        assert_eq!(a, "WHITE BLACK");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_sku_empty() {
        assert_eq!(normalize_sku(""), "");
        assert_eq!(normalize_sku("  / \\ "), "");
    }

    #[test]
    fn test_phone_punctuation_and_artifacts() {
        assert_eq!(normalize_phone("050-123-4567"), "501234567");
        assert_eq!(normalize_phone("501234567.0"), "501234567");
        assert_eq!(normalize_phone("(050) 123 4567"), "501234567");
    }

    #[test]
    fn test_phone_leading_zero_forms_are_equivalent() {
        assert_eq!(normalize_phone("0501234567"), normalize_phone("501234567"));
        assert_eq!(normalize_phone("0501234567.0"), normalize_phone("501234567.0"));
    }

    #[test]
    fn test_phone_only_one_zero_is_stripped() {
        assert_eq!(normalize_phone("00972501234567"), "0972501234567");
    }

    #[test]
    fn test_phone_unusable() {
        assert_eq!(normalize_phone(""), "");
        assert_eq!(normalize_phone("n/a"), "");
        assert_eq!(normalize_phone("0"), "");
    }

    #[test]
    fn test_quantity_coercion() {
        assert_eq!(normalize_quantity("abc"), 0);
        assert_eq!(normalize_quantity("12.7"), 12);
        assert_eq!(normalize_quantity(" 3 "), 3);
        assert_eq!(normalize_quantity("1,200"), 1200);
        assert_eq!(normalize_quantity("-4"), 0);
        assert_eq!(normalize_quantity(""), 0);
        assert_eq!(normalize_quantity("NaN"), 0);
        assert_eq!(normalize_quantity("inf"), 0);
    }

    #[test]
    fn test_quantity_clamped_to_line_maximum() {
        assert_eq!(normalize_quantity("1e30"), MAX_LINE_QUANTITY);
        assert_eq!(normalize_quantity("99999999999999999999"), MAX_LINE_QUANTITY);
        assert_eq!(normalize_quantity("1000000000"), MAX_LINE_QUANTITY);
        assert_eq!(normalize_quantity("999999999"), 999_999_999);
    }

    #[test]
    fn test_quantity_never_panics_on_noise() {
        const ALPHABET: &[u8] = b"0123456789.-,eE+ abc";
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        for _ in 0..2000 {
            let len = rng.gen_range(0..12);
            let raw: String = (0..len)
                .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
                .collect();
            let qty = normalize_quantity(&raw);
            assert!(qty <= MAX_LINE_QUANTITY);
            if !raw.chars().any(|c| c.is_ascii_digit()) {
                assert_eq!(qty, 0, "non-numeric {:?} produced {}", raw, qty);
            }
            if raw.trim_start().starts_with('-') {
                assert_eq!(qty, 0, "negative {:?} produced {}", raw, qty);
            }
        }
    }

    #[test]
    fn test_date_day_first() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(normalize_date("10/01/2024"), Some(expected));
        assert_eq!(normalize_date("10/01/24"), Some(expected));
        assert_eq!(normalize_date("10.01.2024"), Some(expected));
        assert_eq!(normalize_date("10-01-2024"), Some(expected));
        assert_eq!(normalize_date("2024-01-10"), Some(expected));
    }

    #[test]
    fn test_date_discards_time() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(normalize_date("05/03/2024 14:30"), Some(expected));
        assert_eq!(normalize_date("2024-03-05T23:59:59Z"), Some(expected));
        assert_eq!(normalize_date("2024-03-05 08:00:00"), Some(expected));
    }

    #[test]
    fn test_date_unparseable() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("yesterday"), None);
        assert_eq!(normalize_date("31/02/2024"), None);
        assert_eq!(normalize_date("T"), None);
    }

    #[test]
    fn test_order_identifier() {
        assert_eq!(normalize_order_identifier("10045.0"), "10045");
        assert_eq!(normalize_order_identifier(" AB-12 "), "AB-12");
        assert_eq!(normalize_order_identifier("   "), "");
    }
}
