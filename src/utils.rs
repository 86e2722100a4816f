use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use rust_decimal::prelude::*;
use std::str::FromStr;

/// Monetary outputs carry cents, nothing finer.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Converts an `f64` to a `Decimal` through its shortest round-trip representation,
/// so `10.005` becomes exactly `10.005` rather than `10.00499999...`.
///
/// `None` for non-finite values and magnitudes beyond `Decimal::MAX`.
pub fn try_to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
}

/// Lossy form of [`try_to_decimal`] for values already validated at ingestion.
/// Anything unrepresentable converts to zero.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    try_to_decimal(value).unwrap_or_default()
}

/// Rounds to cents (half away from zero) and converts back to `f64`.
#[inline]
pub fn round_money(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

#[inline]
pub fn round_money_f64(value: f64) -> f64 {
    round_money(to_decimal(value))
}

/// Ratio guarded against a zero denominator.
pub fn safe_ratio(numerator: Decimal, denominator: u64) -> Decimal {
    if denominator == 0 {
        Decimal::ZERO
    } else {
        numerator / Decimal::from(denominator)
    }
}

pub fn add_money(total: Decimal, amount: Decimal, what: &str) -> Result<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| AnalyticsError::overflow(what))
}

pub fn add_units(total: u64, quantity: u64, what: &str) -> Result<u64> {
    total
        .checked_add(quantity)
        .ok_or_else(|| AnalyticsError::overflow(what))
}

/// `quantity * unit_price`, failing instead of panicking past `Decimal::MAX`.
pub fn line_value(quantity: u64, unit_price: Decimal, what: &str) -> Result<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .ok_or_else(|| AnalyticsError::overflow(what))
}

pub fn utc_day(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.date_naive()
}

/// Earliest accepted sale timestamp for a window of `days` ending at `now`.
pub fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// The `days` consecutive calendar dates ending on `end`, ascending.
pub fn days_ending_on(end: NaiveDate, days: u32) -> Vec<NaiveDate> {
    if days == 0 {
        return Vec::new();
    }

    let start = end
        .checked_sub_days(Days::new(u64::from(days - 1)))
        .unwrap_or(NaiveDate::MIN);

    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Short chart label, e.g. `Oct 5`.
pub fn day_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}
