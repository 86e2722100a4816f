//! Request filter resolution.
//!
//! Turns loosely typed request parameters (`days`, `location`) into a
//! [`SalesPredicate`] that decides which sale events belong to the current window.
//! Bad input never fails: an unusable `days` falls back to the configured default and
//! an empty or `"all"` location means "every location".

use crate::config::AnalyticsConfig;
use crate::schema::SaleEvent;
use crate::utils::window_start;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Location value meaning "no location filter".
pub const ALL_LOCATIONS: &str = "all";

/// Raw request parameters as received from the query layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsQuery {
    #[serde(default, deserialize_with = "lenient_string")]
    pub days: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
}

impl AnalyticsQuery {
    pub fn new(days: Option<&str>, location: Option<&str>) -> Self {
        Self {
            days: days.map(str::to_string),
            location: location.map(str::to_string),
        }
    }
}

// Query layers hand over `days` as either a string or a number.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Canonical form of the request filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesFilter {
    pub days: u32,
    pub location: Option<String>,
}

impl SalesFilter {
    pub fn resolve(query: &AnalyticsQuery, config: &AnalyticsConfig) -> Self {
        Self {
            days: parse_days(query.days.as_deref(), config.default_days, config.max_days),
            location: normalize_location(query.location.as_deref()),
        }
    }

    pub fn predicate(&self, now: DateTime<Utc>) -> SalesPredicate {
        SalesPredicate {
            since: window_start(now, self.days),
            location: self.location.clone(),
        }
    }
}

/// `accept(sale)` holds iff the sale is no older than `since` and, when a location is
/// set, was made at that location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesPredicate {
    pub since: DateTime<Utc>,
    pub location: Option<String>,
}

impl SalesPredicate {
    pub fn accept(&self, sale: &SaleEvent) -> bool {
        if sale.sale_date < self.since {
            return false;
        }
        match &self.location {
            Some(location) => sale.location_id == *location,
            None => true,
        }
    }

    pub fn apply<'a>(&self, sales: &'a [SaleEvent]) -> Vec<&'a SaleEvent> {
        sales.iter().filter(|sale| self.accept(sale)).collect()
    }
}

/// Reads the leading integer of `raw` the way a lenient query parser would: `"14"` and
/// `"14days"` both give 14. Missing, non-numeric, zero or negative input gives
/// `default`; anything above `max` is clamped.
pub fn parse_days(raw: Option<&str>, default: u32, max: u32) -> u32 {
    let Some(raw) = raw else {
        return default;
    };

    let trimmed = raw.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: &str = {
        let end = unsigned
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(unsigned.len());
        &unsigned[..end]
    };

    if digits.is_empty() || negative {
        return default;
    }

    // Saturate on overflow; the clamp below takes care of the rest.
    let parsed = digits.parse::<u64>().unwrap_or(u64::MAX);
    if parsed == 0 {
        return default;
    }

    parsed.min(u64::from(max)) as u32
}

pub fn normalize_location(raw: Option<&str>) -> Option<String> {
    match raw.map(str::trim) {
        None | Some("") | Some(ALL_LOCATIONS) => None,
        Some(location) => Some(location.to_string()),
    }
}
