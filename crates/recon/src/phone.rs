//! UK phone number normalization: digits only, leading `0`.

use serde::Serialize;

/// Normalize a phone number to UK national format.
///
/// Non-digits are stripped. A `44` country prefix becomes `0`; anything not
/// already starting with `0` gets one prepended. Blank input, or input with
/// no digits at all, is returned unchanged.
pub fn normalize_phone(raw: &str) -> String {
    if raw.trim().is_empty() {
        return raw.to_string();
    }

    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return raw.to_string();
    }

    if digits.starts_with('0') {
        digits
    } else if let Some(rest) = digits.strip_prefix("44") {
        format!("0{rest}")
    } else {
        format!("0{digits}")
    }
}

/// Counts of raw phone formats, for before/after reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhonePatterns {
    pub starts_with_0: usize,
    pub starts_with_44: usize,
    pub starts_with_plus_44: usize,
    pub starts_with_7: usize,
    pub empty: usize,
    pub other: usize,
}

impl PhonePatterns {
    pub fn analyze<'a>(phones: impl IntoIterator<Item = &'a str>) -> Self {
        let mut p = Self::default();
        for phone in phones {
            let phone = phone.trim();
            if phone.is_empty() {
                p.empty += 1;
            } else if phone.starts_with('0') {
                p.starts_with_0 += 1;
            } else if phone.starts_with("44") {
                p.starts_with_44 += 1;
            } else if phone.starts_with("+44") {
                p.starts_with_plus_44 += 1;
            } else if phone.starts_with('7') {
                p.starts_with_7 += 1;
            } else {
                p.other += 1;
            }
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_national() {
        assert_eq!(normalize_phone("0113 496 0000"), "01134960000");
        assert_eq!(normalize_phone("07700-900123"), "07700900123");
    }

    #[test]
    fn country_code_replaced() {
        assert_eq!(normalize_phone("+44 113 496 0000"), "01134960000");
        assert_eq!(normalize_phone("441134960000"), "01134960000");
        assert_eq!(normalize_phone("(+44) 7700 900123"), "07700900123");
    }

    #[test]
    fn missing_leading_zero_added() {
        assert_eq!(normalize_phone("7700900123"), "07700900123");
        assert_eq!(normalize_phone("1134960000"), "01134960000");
    }

    #[test]
    fn blank_and_digitless_untouched() {
        assert_eq!(normalize_phone(""), "");
        assert_eq!(normalize_phone("   "), "   ");
        assert_eq!(normalize_phone("n/a"), "n/a");
    }

    #[test]
    fn idempotent() {
        for raw in ["+44 20 7946 0000", "7700900123", "020 7946 0000"] {
            let once = normalize_phone(raw);
            assert_eq!(normalize_phone(&once), once);
        }
    }

    #[test]
    fn pattern_analysis() {
        let p = PhonePatterns::analyze(["0113", "44113", "+44113", "7700", "", "  ", "(0)"]);
        assert_eq!(p.starts_with_0, 1);
        assert_eq!(p.starts_with_44, 1);
        assert_eq!(p.starts_with_plus_44, 1);
        assert_eq!(p.starts_with_7, 1);
        assert_eq!(p.empty, 2);
        assert_eq!(p.other, 1);
    }
}
