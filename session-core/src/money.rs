//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary arithmetic goes through `Decimal` internally, then back to
//! `f64` for storage and serialization. Values are rounded to the smallest
//! currency unit (2 decimal places, half-up).

use rust_decimal::prelude::*;
use shared::models::CartEntry;
use shared::{AppError, AppResult};

/// Rounding precision for monetary values
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per menu item
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per cart line
const MAX_QUANTITY: i32 = 9999;

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Round a monetary value to the smallest currency unit
pub fn round_money(value: f64) -> f64 {
    to_decimal(value)
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(value)
}

/// price × quantity for a single line, rounded
pub fn line_total(price: f64, quantity: i32) -> f64 {
    (to_decimal(price) * Decimal::from(quantity))
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Σ(price×quantity) over cart entries, rounded
pub fn order_total<'a>(entries: impl IntoIterator<Item = &'a CartEntry>) -> f64 {
    let sum: Decimal = entries
        .into_iter()
        .map(|e| to_decimal(e.price) * Decimal::from(e.quantity))
        .sum();
    sum.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Sum a list of already-rounded monetary values, re-rounded
pub fn sum_totals(values: impl IntoIterator<Item = f64>) -> f64 {
    let sum: Decimal = values.into_iter().map(to_decimal).sum();
    sum.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Validate a catalog price: finite, positive, bounded
pub fn validate_price(price: f64) -> AppResult<()> {
    if !price.is_finite() {
        return Err(AppError::validation(format!(
            "price must be a finite number, got {}",
            price
        )));
    }
    if price <= 0.0 {
        return Err(AppError::validation(format!(
            "price must be positive, got {}",
            price
        )));
    }
    if price > MAX_PRICE {
        return Err(AppError::validation(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, price
        )));
    }
    Ok(())
}

/// Validate a cart quantity: positive, bounded
pub fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::validation(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}
