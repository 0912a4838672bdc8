//! Small helpers: input normalisation and money formatting.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::error::{LedgerError, Result};

/// Placeholder written for values that are only known after a close.
pub const SENTINEL: &str = "-";

pub fn sanitize_symbol(sym: &str) -> String {
    sym.trim().to_uppercase()
}

/// Parse a strictly positive decimal from free text.
pub fn parse_positive_decimal(field: &'static str, text: &str) -> Result<Decimal> {
    let t = text.trim();
    if t.is_empty() {
        return Err(LedgerError::validation(field, "value is required"));
    }
    let v = Decimal::from_str(t)
        .map_err(|_| LedgerError::validation(field, format!("'{t}' is not a number")))?;
    if v <= Decimal::ZERO {
        return Err(LedgerError::validation(field, format!("{t} must be greater than 0")));
    }
    Ok(v)
}

/// Parse a strictly positive whole number (shares, contracts).
pub fn parse_positive_int(field: &'static str, text: &str) -> Result<u32> {
    let t = text.trim();
    let v: u32 = t
        .parse()
        .map_err(|_| LedgerError::validation(field, format!("'{t}' is not a whole number")))?;
    if v == 0 {
        return Err(LedgerError::validation(field, "must be greater than 0"));
    }
    Ok(v)
}

pub fn require_text(field: &'static str, text: &str) -> Result<String> {
    let t = free_text(field, text)?;
    if t.is_empty() {
        return Err(LedgerError::validation(field, "value is required"));
    }
    Ok(t)
}

/// Trimmed free text. The bare sentinel is refused, it would read back as unset.
pub fn free_text(field: &'static str, text: &str) -> Result<String> {
    let t = text.trim();
    if t == SENTINEL {
        return Err(LedgerError::validation(field, format!("'{SENTINEL}' is reserved")));
    }
    Ok(t.to_string())
}

/// Arithmetic result, or a validation error when it leaves the decimal range.
pub fn checked(field: &'static str, v: Option<Decimal>) -> Result<Decimal> {
    v.ok_or_else(|| LedgerError::validation(field, "value too large"))
}

pub fn round_money(v: Decimal) -> Decimal {
    v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Two-decimal rendering used both on screen and in the save file.
pub fn fmt_money(v: Decimal) -> String {
    let mut r = round_money(v);
    if r.is_zero() {
        r.set_sign_positive(true);
    }
    r.rescale(2);
    r.to_string()
}

pub fn fmt_opt_money(v: Option<Decimal>) -> String {
    v.map(fmt_money).unwrap_or_else(|| SENTINEL.to_string())
}

/// Entered prices keep every digit the user typed, padded to at least two decimals.
pub fn fmt_price(v: Decimal) -> String {
    let mut r = v;
    r.rescale(v.scale().max(2));
    r.to_string()
}

pub fn fmt_opt_price(v: Option<Decimal>) -> String {
    v.map(fmt_price).unwrap_or_else(|| SENTINEL.to_string())
}

/// Parse a cell that may hold the sentinel. Anything non-numeric reads as unset.
pub fn parse_opt_cell(cell: &str) -> Option<Decimal> {
    let t = cell.trim();
    if t == SENTINEL {
        return None;
    }
    Decimal::from_str(t).ok()
}
