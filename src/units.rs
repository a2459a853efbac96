//! Conversions between on-chain integer amounts and decimal strings.

use crate::{Error, Result};
use alloy::primitives::utils::parse_units;
use alloy::primitives::U256;

/// Format `value` with `decimals` places, trimming trailing zeros.
pub fn format_units(value: U256, decimals: u8) -> String {
    if value.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10).pow(U256::from(decimals));
    let whole = value / divisor;
    let remainder = value % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let remainder_str = format!("{:0>width$}", remainder, width = decimals as usize);
    let trimmed = remainder_str.trim_end_matches('0');
    format!("{}.{}", whole, trimmed)
}

/// Parse a non-negative decimal string such as `"1.5"` into base units.
pub fn parse_amount(text: &str, decimals: u8) -> Result<U256> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('-') {
        return Err(Error::InvalidArgument(format!(
            "amount must be a non-negative decimal, got '{}'",
            text
        )));
    }

    parse_units(text, decimals)
        .map(|parsed| parsed.get_absolute())
        .map_err(|e| Error::InvalidArgument(format!("invalid amount '{}': {}", text, e)))
}

/// Parse a JSON number amount, dropping digits beyond `decimals`.
pub fn parse_amount_f64(amount: f64, decimals: u8) -> Result<U256> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidArgument(format!(
            "amount must be a non-negative number, got {}",
            amount
        )));
    }

    // shortest round-trip rendering, never exponent notation
    let rendered = amount.to_string();
    let rendered = match rendered.split_once('.') {
        Some((whole, frac)) if frac.len() > decimals as usize => {
            format!("{}.{}", whole, &frac[..decimals as usize])
        }
        _ => rendered,
    };
    parse_amount(rendered.trim_end_matches('.'), decimals)
}

/// Lossy conversion for display math (prices, ratios).
pub fn to_f64(value: U256, decimals: u8) -> f64 {
    format_units(value, decimals).parse().unwrap_or(f64::MAX)
}
