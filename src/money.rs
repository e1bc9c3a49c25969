//! Fixed-point currency helpers.
//!
//! Amounts are persisted as `i64` hundredths. Anything that needs fractional
//! arithmetic goes through `Decimal` and is rounded back to two places,
//! midpoint away from zero.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

const DECIMAL_PLACES: u32 = 2;

pub fn to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

/// Round to cents. `None` when the value does not fit in `i64` cents.
pub fn from_decimal(amount: Decimal) -> Option<i64> {
    let rounded = amount.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    (rounded * Decimal::ONE_HUNDRED).to_i64()
}

/// Parse a decimal string such as `"2.50"` into cents.
pub fn parse(text: &str) -> Option<i64> {
    Decimal::from_str(text.trim()).ok().and_then(from_decimal)
}

/// Render cents with exactly two decimals, e.g. `250` -> `"2.50"`.
pub fn format(cents: i64) -> String {
    to_decimal(cents).to_string()
}
