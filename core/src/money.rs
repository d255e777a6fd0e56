//! Money helpers: rounding discipline, input coercion and display.
//!
//! RULE: every derived amount passes through `round2` at the point
//! where it is derived, not only at the end. Later figures are assembled
//! from already-rounded components so a report reproduces them exactly.

use crate::types::Money;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer};

/// Round to cents, half away from zero.
pub fn round2(value: Decimal) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Largest accepted monetary input (one quadrillion). Every derived
/// figure is a bounded sum of products of such amounts with rates in
/// [0, 1], so settlement arithmetic cannot overflow `Decimal`.
pub const MAX_AMOUNT: Money = dec!(1000000000000000);

/// Clamp to [0, MAX_AMOUNT] and round. Used on every raw monetary input.
pub fn sanitize(value: Decimal) -> Money {
    round2(value.clamp(Decimal::ZERO, MAX_AMOUNT))
}

/// Coerce free-form text into a non-negative amount.
///
/// Accepts `1234.56`, `1,234.56`, `1.234,56` and `R$ 1.234,56`.
/// Exponent form (`1e6`) is read as such. Anything unparsable, or
/// negative, becomes zero; oversized amounts clamp to `MAX_AMOUNT`.
pub fn coerce(raw: &str) -> Money {
    let trimmed = raw.trim();
    if trimmed.contains(|c: char| c == 'e' || c == 'E') {
        if let Ok(value) = Decimal::from_scientific(trimmed) {
            return sanitize(value);
        }
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // Comma is the decimal separator: "1.234,56"
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), None) => cleaned.replace(',', "."),
        // Dot is the decimal separator: "1,234.56"
        _ => cleaned.replace(',', ""),
    };

    match Decimal::from_str(&normalized) {
        Ok(value) => sanitize(value),
        // Well-formed, but beyond Decimal's range.
        Err(_) if normalized.parse::<f64>().map_or(false, |f| f > 0.0) => MAX_AMOUNT,
        Err(_) => {
            if !raw.trim().is_empty() {
                log::debug!("money: could not parse {raw:?}, coerced to 0");
            }
            Decimal::ZERO
        }
    }
}

/// Lenient serde adapter for monetary input fields.
/// Numbers, numeric strings, `null` and garbage all deserialize; the
/// latter two as zero. Negative values are clamped to zero.
pub fn lenient<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(from_json(&value))
}

fn from_json(value: &serde_json::Value) -> Money {
    match value {
        serde_json::Value::Number(n) => from_number(n),
        serde_json::Value::String(s) => coerce(s),
        _ => Decimal::ZERO,
    }
}

/// Integers and floats both go through their textual form so a JSON 0.1
/// stays 0.1 rather than its binary expansion. Large floats print in
/// exponent form (`1e21`).
fn from_number(n: &serde_json::Number) -> Money {
    let text = n.to_string();
    match Decimal::from_str_exact(&text).or_else(|_| Decimal::from_scientific(&text)) {
        Ok(value) => sanitize(value),
        // Beyond Decimal's range: clamp like any other oversized amount.
        Err(_) => match n.as_f64() {
            Some(f) if f > 0.0 => MAX_AMOUNT,
            _ => Decimal::ZERO,
        },
    }
}

/// Format as Brazilian reais, e.g. `R$ 1.234,56` or `-R$ 12,00`.
pub fn format_brl(value: Money) -> String {
    let rounded = round2(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();

    let cents = (abs * Decimal::ONE_HUNDRED).trunc();
    let whole = (cents / Decimal::ONE_HUNDRED).trunc();
    let frac = cents - whole * Decimal::ONE_HUNDRED;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {grouped},{:02}", frac.to_u32().unwrap_or(0))
}

/// Format a fraction as a percentage with the given precision, e.g. `2.5%`.
pub fn format_pct(rate: Decimal, dp: u32) -> String {
    let pct = (rate * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{pct:.prec$}%", prec = dp as usize)
}
