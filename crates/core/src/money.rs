//! Money parsing and pt-BR number formatting.
//!
//! Amounts are [`Decimal`] end to end so that sums never drift; rounding to
//! two places happens only when a value is rendered for display.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

/// Currency prefix used by every formatted amount.
pub const CURRENCY_SYMBOL: &str = "R$";

/// Digits shown after the decimal separator for amounts and percentages.
pub const DISPLAY_DECIMALS: u32 = 2;

/// Fallback rendered when a percentage has no meaningful denominator.
pub const ZERO_PERCENT: &str = "0%";

// ---------------------------------------------------------------------------
// Locale formatter
// ---------------------------------------------------------------------------

/// Separator pair used to render numbers for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLocale {
    pub grouping: char,
    pub decimal: char,
}

/// Brazilian Portuguese: `1.234.567,89`.
pub const PT_BR: NumberLocale = NumberLocale {
    grouping: '.',
    decimal: ',',
};

impl NumberLocale {
    /// Render `value` with exactly `decimals` fractional digits, grouping the
    /// integer part in threes.
    ///
    /// Midpoints round away from zero. A value that rounds to zero never
    /// carries a minus sign.
    pub fn format(&self, value: Decimal, decimals: u32) -> String {
        let rounded =
            value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let plain = format!("{:.*}", decimals as usize, rounded.abs());

        let (int_part, frac_part) = match plain.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (plain.as_str(), None),
        };

        let mut out = String::with_capacity(plain.len() + plain.len() / 3 + 1);
        if negative {
            out.push('-');
        }
        let digits: Vec<char> = int_part.chars().collect();
        for (i, c) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(self.grouping);
            }
            out.push(*c);
        }
        if let Some(frac) = frac_part {
            out.push(self.decimal);
            out.push_str(frac);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// Format an amount as Brazilian currency, e.g. `R$ 1.234,56`.
///
/// # Examples
///
/// ```
/// use finboard_core::money::format_currency;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_currency(Decimal::new(123456, 2)), "R$ 1.234,56");
/// assert_eq!(format_currency(Decimal::ZERO), "R$ 0,00");
/// ```
pub fn format_currency(amount: Decimal) -> String {
    format!("{CURRENCY_SYMBOL} {}", PT_BR.format(amount, DISPLAY_DECIMALS))
}

/// Share of `part` in `whole` as a pt-BR percentage, e.g. `19,09%`.
///
/// A zero (or unusably small) `whole` yields [`ZERO_PERCENT`] instead of
/// dividing.
pub fn compute_percentage(part: Decimal, whole: Decimal) -> String {
    if whole.is_zero() {
        return ZERO_PERCENT.to_string();
    }
    match part
        .checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    {
        Some(pct) => format!("{}%", PT_BR.format(pct, DISPLAY_DECIMALS)),
        None => ZERO_PERCENT.to_string(),
    }
}

// ---------------------------------------------------------------------------
// JSON conversion
// ---------------------------------------------------------------------------

/// Read a money amount from a JSON cell. Numbers and numeric strings are
/// accepted; anything else is `None`.
pub fn parse_money(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal_text(&n.to_string()),
        Value::String(s) => parse_decimal_text(s.trim()),
        _ => None,
    }
}

fn parse_decimal_text(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    text.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

/// Encode an amount as a JSON number. Whole amounts become integers, the
/// rest go through `f64`, which is exact enough for two-decimal currency.
pub fn money_to_json(amount: Decimal) -> Value {
    if amount.fract().is_zero() {
        if let Some(i) = amount.to_i64() {
            return Value::from(i);
        }
    }
    amount
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
