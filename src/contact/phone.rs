use regex::Regex;
use std::sync::OnceLock;

/// `01` + carrier digit, a 3–4 digit middle block and a 4 digit tail, with
/// optional dashes between blocks.
pub const KOREAN_MOBILE_PATTERN: &str = r"^01[016789]-?\d{3,4}-?\d{4}$";

fn pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(KOREAN_MOBILE_PATTERN).ok())
        .as_ref()
}

pub fn is_korean_mobile(phone: &str) -> bool {
    pattern().map_or(false, |re| re.is_match(phone))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_canonical_forms() {
        for phone in [
            "010-1234-5678",
            "01012345678",
            "011-123-4567",
            "016-1234-5678",
            "017-123-4567",
            "018-8765-4321",
            "019-123-4567",
            "0101234567",
        ] {
            assert!(is_korean_mobile(phone), "{} should be accepted", phone);
        }
    }

    #[test]
    fn test_rejects_invalid_forms() {
        for phone in [
            "012-3456-7890",
            "123-4567-8901",
            "abcdefghijk",
            "010-12-345678",
            "010-12345-678",
            "010-12345-6789",
            "019-123-456",
            "010--1234-5678",
            "010-1234-56789",
            "0171234567890",
            "018-12-3456",
            "010-123_4567",
            "010 1234 5678",
            "",
        ] {
            assert!(!is_korean_mobile(phone), "{} should be rejected", phone);
        }
    }
}
