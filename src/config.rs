use crate::error::{AnalyticsError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_DAYS: u32 = 30;
pub const DEFAULT_MAX_DAYS: u32 = 3650;
pub const DEFAULT_TOP_PRODUCTS_LIMIT: usize = 5;
pub const UNKNOWN_LABEL: &str = "Unknown";
pub const UNKNOWN_LOCATION_LABEL: &str = "Unknown Location";

/// Tunables for a single analytics computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyticsConfig {
    #[schemars(description = "Window length used when the request carries no usable `days` value.")]
    pub default_days: u32,

    #[schemars(description = "Upper bound applied to requested windows.")]
    pub max_days: u32,

    #[schemars(description = "How many entries the top-products rankings keep.")]
    pub top_products_limit: usize,

    #[schemars(description = "Placeholder for a missing product name or category.")]
    pub unknown_label: String,

    #[schemars(description = "Placeholder for a missing location name.")]
    pub unknown_location_label: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_days: DEFAULT_DAYS,
            max_days: DEFAULT_MAX_DAYS,
            top_products_limit: DEFAULT_TOP_PRODUCTS_LIMIT,
            unknown_label: UNKNOWN_LABEL.to_string(),
            unknown_location_label: UNKNOWN_LOCATION_LABEL.to_string(),
        }
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_days == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "defaultDays must be at least 1".to_string(),
            ));
        }
        if self.max_days < self.default_days {
            return Err(AnalyticsError::InvalidConfig(format!(
                "maxDays ({}) is smaller than defaultDays ({})",
                self.max_days, self.default_days
            )));
        }
        if self.top_products_limit == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "topProductsLimit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalyticsConfig)
    }
}
