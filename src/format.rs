//! Amount formatting for valuation display
//!
//! Valuations arrive as unsigned integers in minor currency units and are shown
//! with en-US thousands grouping (`1234567` -> `1,234,567`).

use alloy::primitives::U256;

/// Output for input with no leading numeric prefix
pub const NOT_A_NUMBER: &str = "NaN";

/// Parse the leading integer of `raw` and render it with `,` thousands grouping.
///
/// Leading whitespace and a single sign are accepted and parsing stops at the
/// first non-digit, so `"42abc"` formats as `"42"`. Input without any digits
/// yields [`NOT_A_NUMBER`].
pub fn format_amount(raw: &str) -> String {
    let trimmed = raw.trim_start();

    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digit_len = unsigned
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digit_len == 0 {
        return NOT_A_NUMBER.to_string();
    }

    let digits = unsigned[..digit_len].trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };

    let grouped = group_thousands(digits);
    if negative && digits != "0" {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Format an on-chain integer amount
pub fn format_value(value: U256) -> String {
    group_thousands(&value.to_string())
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let lead = digits.len() % 3;

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_millions() {
        assert_eq!(format_amount("1234567"), "1,234,567");
        assert_eq!(format_amount("500000"), "500,000");
    }

    #[test]
    fn test_short_values_are_not_grouped() {
        assert_eq!(format_amount("0"), "0");
        assert_eq!(format_amount("7"), "7");
        assert_eq!(format_amount("999"), "999");
        assert_eq!(format_amount("1000"), "1,000");
    }

    #[test]
    fn test_non_numeric_is_nan() {
        assert_eq!(format_amount(""), "NaN");
        assert_eq!(format_amount("abc"), "NaN");
        assert_eq!(format_amount("-"), "NaN");
    }

    #[test]
    fn test_leading_prefix_parse() {
        assert_eq!(format_amount("  42abc"), "42");
        assert_eq!(format_amount("0001234"), "1,234");
        assert_eq!(format_amount("-98765"), "-98,765");
        assert_eq!(format_amount("+12"), "12");
        assert_eq!(format_amount("1234.99"), "1,234");
    }

    #[test]
    fn test_format_value_handles_wide_integers() {
        assert_eq!(format_value(U256::from(1_234_567u64)), "1,234,567");
        assert_eq!(
            format_value(U256::from(10u64).pow(U256::from(20u64))),
            "100,000,000,000,000,000,000"
        );
        assert_eq!(format_value(U256::ZERO), "0");
    }
}
