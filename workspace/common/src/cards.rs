//! Card number masking and expiry parsing.
//!
//! Raw card numbers are persisted but must never leave the API unmasked.
//! All read paths go through [`mask_number`].

/// Returns the last four digits of a card number (or the whole string if
/// it is shorter than four characters).
pub fn last_four(card_number: &str) -> &str {
    let len = card_number.len();
    &card_number[len.saturating_sub(4)..]
}

/// Masks a card number for display, exposing only the last four digits.
pub fn mask_number(card_number: &str) -> String {
    format!("\u{2022}\u{2022}\u{2022}\u{2022} \u{2022}\u{2022}\u{2022}\u{2022} \u{2022}\u{2022}\u{2022}\u{2022} {}", last_four(card_number))
}

/// Parses an `MM/YY` expiry string into a `("MM", "20YY")` pair.
///
/// Both components must be exactly two digits. Returns `None` on any
/// malformed input; the caller decides how to report it.
pub fn parse_expiry(expiry_date: &str) -> Option<(String, String)> {
    let (month, year) = expiry_date.split_once('/')?;
    if month.len() != 2 || year.len() != 2 {
        return None;
    }
    if !month.chars().all(|c| c.is_ascii_digit()) || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((month.to_string(), format!("20{year}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_all_but_last_four() {
        let masked = mask_number("4111111111111111");
        assert!(masked.ends_with("1111"));
        assert!(!masked.contains("4111111111111111"));
        assert_eq!(last_four("4111111111111111"), "1111");
    }

    #[test]
    fn short_numbers_are_not_padded() {
        assert_eq!(last_four("123"), "123");
    }

    #[test]
    fn parses_valid_expiry() {
        assert_eq!(
            parse_expiry("04/27"),
            Some(("04".to_string(), "2027".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_expiry() {
        assert_eq!(parse_expiry("4/27"), None);
        assert_eq!(parse_expiry("04-27"), None);
        assert_eq!(parse_expiry("04/2027"), None);
        assert_eq!(parse_expiry("ab/cd"), None);
        assert_eq!(parse_expiry(""), None);
    }
}
