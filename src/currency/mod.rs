//! Conversion between user-entered decimal amounts and stored minor units,
//! plus display formatting.

const MINOR_UNITS: i64 = 100;

/// Normalizes a user amount to non-negative cents.
///
/// The sign is dropped, the value is rounded half away from zero to two
/// decimals, and anything non-finite or too large for `i64` yields `None`.
pub fn amount_to_cents(amount: f64) -> Option<i64> {
    if !amount.is_finite() {
        return None;
    }
    let cents = (amount.abs() * MINOR_UNITS as f64).round();
    if cents >= i64::MAX as f64 {
        return None;
    }
    Some(cents as i64)
}

pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / MINOR_UNITS as f64
}

/// Parses a typed amount such as `"1,200.50"` or `"₹ 450"`.
///
/// Only finite numbers are accepted; the reconciler re-checks anyway.
pub fn parse_amount(input: &str) -> Option<f64> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Renders cents with a currency symbol, thousands separators and two decimals.
pub fn format_money(cents: i64, symbol: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let magnitude = cents.unsigned_abs();
    let whole = magnitude / MINOR_UNITS as u64;
    let fraction = magnitude % MINOR_UNITS as u64;
    format!("{sign}{symbol}{}.{fraction:02}", group_thousands(whole))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
