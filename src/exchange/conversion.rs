//! Amount handling and result formatting

use rust_decimal::{Decimal, RoundingStrategy};

/// Shown in place of a result whenever a fetch fails, whatever the cause
pub const FETCH_ERROR_MESSAGE: &str = "Error! Could not retrieve data.";

/// Shown before the first fetch settles
pub const PENDING_MESSAGE: &str = "Getting Exchange Rate.....";

/// Constrain free text to something number-like: ASCII digits and at most
/// one decimal point. Everything else is dropped.
pub fn sanitize_amount(input: &str) -> String {
    let mut seen_dot = false;
    input
        .chars()
        .filter(|&c| match c {
            '0'..='9' => true,
            '.' if !seen_dot => {
                seen_dot = true;
                true
            }
            _ => false,
        })
        .collect()
}

/// Whether `c` may be appended to an amount that currently reads `current`
pub fn accepts_char(current: &str, c: char) -> bool {
    c.is_ascii_digit() || (c == '.' && !current.contains('.'))
}

/// Coerce amount text to a number. Text without a parseable value counts as zero.
pub fn parse_amount(amount: &str) -> f64 {
    amount.trim().parse::<f64>().unwrap_or(0.0)
}

/// Amount as displayed in the result line
fn display_amount(amount: &str) -> &str {
    if amount.chars().any(|c| c.is_ascii_digit()) {
        amount
    } else {
        "0"
    }
}

/// `amount * rate`, rounded to two decimals with exact halves rounded away
/// from zero. The product is converted at its exact binary value, so 1.125
/// becomes 1.13 while 1.005 (stored just below the half) becomes 1.00.
pub fn convert(amount: &str, rate: f64) -> String {
    let total = parse_amount(amount) * rate;
    match Decimal::from_f64_retain(total) {
        Some(value) => {
            let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(2);
            rounded.to_string()
        }
        // Out of Decimal range (or not finite)
        None => format!("{:.2}", total),
    }
}

/// "10 USD = 12.50 KES"
pub fn format_conversion(amount: &str, from: &str, rate: f64, to: &str) -> String {
    format!(
        "{} {} = {} {}",
        display_amount(amount),
        from,
        convert(amount, rate),
        to
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_conversion() {
        assert_eq!(format_conversion("10", "USD", 1.25, "KES"), "10 USD = 12.50 KES");
        assert_eq!(format_conversion("1", "USD", 129.3456, "KES"), "1 USD = 129.35 KES");
        assert_eq!(format_conversion("2.5", "EUR", 1.0, "EUR"), "2.5 EUR = 2.50 EUR");
    }

    #[test]
    fn test_exact_halves_round_up() {
        assert_eq!(convert("1", 1.125), "1.13");
        assert_eq!(convert("1", 0.375), "0.38");
        assert_eq!(convert("2", 0.0625), "0.13");
        assert_eq!(format_conversion("1", "USD", 1.125, "KES"), "1 USD = 1.13 KES");
    }

    #[test]
    fn test_values_just_below_half_round_down() {
        // 1.005 and 1.045 are stored slightly below the half
        assert_eq!(convert("1", 1.005), "1.00");
        assert_eq!(convert("1", 1.045), "1.04");
        assert_eq!(convert("1", 0.0), "0.00");
    }

    #[test]
    fn test_huge_totals_still_format() {
        assert_eq!(convert("1", 1e30), format!("{:.2}", 1e30));
    }

    #[test]
    fn test_empty_amount_counts_as_zero() {
        assert_eq!(format_conversion("", "USD", 1.25, "KES"), "0 USD = 0.00 KES");
        assert_eq!(format_conversion(".", "USD", 1.25, "KES"), "0 USD = 0.00 KES");
        assert_eq!(parse_amount("1."), 1.0);
        assert_eq!(parse_amount(".5"), 0.5);
    }

    #[test]
    fn test_sanitize_amount() {
        assert_eq!(sanitize_amount("12a3"), "123");
        assert_eq!(sanitize_amount("1.2.3"), "1.23");
        assert_eq!(sanitize_amount("-5,00"), "500");
        assert_eq!(sanitize_amount(""), "");
    }

    #[test]
    fn test_accepts_char() {
        assert!(accepts_char("", '7'));
        assert!(accepts_char("12", '.'));
        assert!(!accepts_char("1.2", '.'));
        assert!(!accepts_char("12", 'e'));
    }
}
