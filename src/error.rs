use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Failed to fetch {rows} rows: {reason}")]
    RowFetch { rows: String, reason: String },

    #[error("Invalid {kind} row '{id}': {details}")]
    InvalidRow {
        kind: String,
        id: String,
        details: String,
    },

    #[error("Duplicate inventory record for product {product_id} at location {location_id}")]
    DuplicateInventoryRecord {
        product_id: String,
        location_id: String,
    },

    #[error("Arithmetic overflow while totalling {0}")]
    Overflow(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AnalyticsError {
    pub fn row_fetch(rows: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::RowFetch {
            rows: rows.into(),
            reason: reason.to_string(),
        }
    }

    pub fn overflow(what: impl Into<String>) -> Self {
        Self::Overflow(what.into())
    }

    pub fn invalid_row(
        kind: impl Into<String>,
        id: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::InvalidRow {
            kind: kind.into(),
            id: id.into(),
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
