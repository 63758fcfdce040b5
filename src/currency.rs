//! Static currency tables and amount formatting.

use rust_decimal::{Decimal, RoundingStrategy};

/// `(code, symbol, minor units)`. Codes missing here use the code itself as
/// symbol and two minor units.
const CURRENCIES: &[(&str, &str, u32)] = &[
    ("EUR", "€", 2),
    ("GBP", "£", 2),
    ("USD", "$", 2),
    ("CHF", "CHF", 2),
    ("AUD", "A$", 2),
    ("CAD", "C$", 2),
    ("SGD", "S$", 2),
    ("HKD", "HK$", 2),
    ("JPY", "¥", 0),
    ("CNY", "¥", 2),
];

const DEFAULT_DECIMALS: u32 = 2;

fn lookup(code: &str) -> Option<&'static (&'static str, &'static str, u32)> {
    CURRENCIES.iter().find(|(c, _, _)| c.eq_ignore_ascii_case(code))
}

/// Display symbol; unknown codes fall back to the code string.
pub fn symbol(code: &str) -> String {
    lookup(code).map_or_else(|| code.to_string(), |(_, s, _)| (*s).to_string())
}

/// Minor units for a currency code.
pub fn decimals(code: &str) -> u32 {
    lookup(code).map_or(DEFAULT_DECIMALS, |(_, _, d)| *d)
}

/// Format an amount with thousands separators and the currency's precision,
/// e.g. `-€1,234.50`.
pub fn format_amount(amount: Decimal, code: &str) -> String {
    let dp = decimals(code);
    let rounded = amount
        .abs()
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.*}", dp as usize, rounded);
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    let sign = if amount.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}{}{grouped}", symbol(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn known_and_unknown_symbols() {
        assert_eq!(symbol("EUR"), "€");
        assert_eq!(symbol("JPY"), "¥");
        assert_eq!(symbol("CNY"), "¥");
        assert_eq!(symbol("XAU"), "XAU");
    }

    #[test]
    fn yen_has_no_minor_units() {
        assert_eq!(decimals("JPY"), 0);
        assert_eq!(decimals("USD"), 2);
        assert_eq!(decimals("XAU"), 2);
    }

    #[test]
    fn formats_with_grouping_and_sign() {
        assert_eq!(format_amount(dec!(1234.5), "EUR"), "€1,234.50");
        assert_eq!(format_amount(dec!(-1234567.891), "USD"), "-$1,234,567.89");
        assert_eq!(format_amount(dec!(1500.4), "JPY"), "¥1,500");
        assert_eq!(format_amount(dec!(12), "XAU"), "XAU12.00");
        assert_eq!(format_amount(dec!(-0.001), "EUR"), "€0.00");
    }
}
