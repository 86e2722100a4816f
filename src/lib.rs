//! # Merchandising Analytics
//!
//! A library for turning raw retail rows (products, locations, inventory snapshots and
//! individual sale events) into the summary views a merchandising dashboard shows.
//!
//! ## Core Concepts
//!
//! - **Filter window**: `days` back from "now", optionally narrowed to one location
//! - **Valuation**: current stock value and reorder alerts, independent of the window
//! - **Rollups**: sales grouped by product, category, location and UTC calendar day
//! - **Dense series**: one daily point per day of the window, zero days included
//! - **Cent rounding**: monetary outputs are rounded half away from zero, once, at the end
//!
//! ## Example
//!
//! ```rust,ignore
//! use merchandising_analytics::*;
//! use chrono::Utc;
//!
//! let rows = RowSet::from_json_str(&std::fs::read_to_string("rows.json")?)?;
//! let processor = AnalyticsProcessor::new(AnalyticsConfig::default())?;
//!
//! let query = AnalyticsQuery::new(Some("7"), Some("all"));
//! let report = processor.process(&rows, &query, Utc::now())?;
//!
//! println!("{}", report.to_json()?);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod filters;
pub mod ingestion;
pub mod ranking;
pub mod schema;
pub mod source;
pub mod utils;
pub mod valuation;

pub use config::AnalyticsConfig;
pub use engine::{Catalog, RollupEngine, SalesRollup};
pub use error::{AnalyticsError, Result};
pub use filters::{AnalyticsQuery, SalesFilter, SalesPredicate};
pub use ingestion::*;
pub use ranking::*;
pub use schema::*;
pub use source::{JsonFileSource, RowSet, RowSource};
pub use utils::round_money_f64;
pub use valuation::{
    calculate_valuation, InventoryFilter, InventoryReport, InventorySummary, StockLevel,
    StockStatus, Valuation, ValuationCalculator,
};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use utils::{days_ending_on, round_money, utc_day};

/// Builds the full report from rows that are already in memory. Pure: no logging, no
/// I/O, and `sales` may contain rows outside the window (they are filtered here).
/// The only failure is a total that overflows.
pub fn compute_report(
    rows: &RowSet,
    filter: &SalesFilter,
    now: DateTime<Utc>,
    config: &AnalyticsConfig,
) -> Result<AnalyticsReport> {
    let predicate = filter.predicate(now);
    let accepted = predicate.apply(&rows.sales);

    let valuation = calculate_valuation(&rows.products, &rows.inventory)?;

    let catalog = Catalog::new(&rows.products, &rows.locations);
    let days = days_ending_on(utc_day(now), filter.days);
    let rollup = RollupEngine::new(config).rollup(accepted, &catalog, &days)?;

    Ok(AnalyticsReport {
        overview: OverviewSummary {
            total_products: valuation.total_active_products,
            inventory_value: round_money(valuation.inventory_value),
            low_stock_items: valuation.low_stock_count,
            out_of_stock_items: valuation.out_of_stock_count,
            total_sales: round_money(rollup.total_sales),
            total_units: rollup.total_units,
            total_transactions: rollup.transactions,
            avg_order_value: round_money(rollup.avg_order_value()),
        },
        top_products: top_products_by_revenue(&rollup.by_product, config.top_products_limit),
        top_products_by_units: top_products_by_units(
            &rollup.by_product,
            config.top_products_limit,
        ),
        top_categories: rank_categories(&rollup.by_category),
        sales_series: daily_series(&rollup.by_day),
        location_series: location_series(&rollup.by_location),
    })
}

pub struct AnalyticsProcessor {
    config: AnalyticsConfig,
}

impl AnalyticsProcessor {
    pub fn new(config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Fetches every row set from `source` and computes the report. A fetch failure
    /// aborts the computation.
    pub fn process<S: RowSource + ?Sized>(
        &self,
        source: &S,
        query: &AnalyticsQuery,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsReport> {
        let filter = SalesFilter::resolve(query, &self.config);

        info!(
            "Computing analytics for a {} day window (location: {})",
            filter.days,
            filter.location.as_deref().unwrap_or("all")
        );

        let rows = source.snapshot(&filter.predicate(now)).inspect_err(|e| {
            warn!("Analytics computation aborted: {}", e);
        })?;

        debug!(
            "Fetched {} products, {} locations, {} inventory rows and {} sales",
            rows.products.len(),
            rows.locations.len(),
            rows.inventory.len(),
            rows.sales.len()
        );

        let report = compute_report(&rows, &filter, now, &self.config).inspect_err(|e| {
            warn!("Analytics computation aborted: {}", e);
        })?;

        debug!(
            "Report covers {} transactions across {} products",
            report.overview.total_transactions,
            report.top_products.len()
        );

        Ok(report)
    }

    /// Stock listing with status classification, narrowed by search text and location.
    pub fn inventory_report<S: RowSource + ?Sized>(
        &self,
        source: &S,
        search: Option<&str>,
        location: Option<&str>,
    ) -> Result<InventoryReport> {
        let filter = InventoryFilter::new(search, location);

        let inventory = source.inventory()?;
        let products = source.products()?;
        let locations = source.locations()?;

        let report = InventoryReport::build(&inventory, &products, &locations, &filter)?;

        info!(
            "Inventory listing has {} rows ({} low, {} out of stock)",
            report.items.len(),
            report.summary.low_stock_items,
            report.summary.out_of_stock_items
        );

        Ok(report)
    }
}

/// Computes a report with the default configuration.
pub fn process_analytics<S: RowSource + ?Sized>(
    source: &S,
    query: &AnalyticsQuery,
    now: DateTime<Utc>,
) -> Result<AnalyticsReport> {
    AnalyticsProcessor::new(AnalyticsConfig::default())?.process(source, query, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    struct FailingSource;

    impl RowSource for FailingSource {
        fn products(&self) -> Result<Vec<Product>> {
            Ok(Vec::new())
        }

        fn locations(&self) -> Result<Vec<Location>> {
            Ok(Vec::new())
        }

        fn inventory(&self) -> Result<Vec<InventoryRecord>> {
            Ok(Vec::new())
        }

        fn sales(&self, _predicate: &SalesPredicate) -> Result<Vec<SaleEvent>> {
            Err(AnalyticsError::row_fetch("sale", "connection refused"))
        }
    }

    fn sale(id: &str, total: f64, sale_date: DateTime<Utc>) -> SaleEvent {
        SaleEvent {
            id: id.to_string(),
            product_id: "p1".to_string(),
            location_id: "l1".to_string(),
            quantity: 1,
            unit_price: total,
            total_amount: total,
            sale_date,
        }
    }

    #[test]
    fn test_fetch_failure_is_not_zero_activity() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        let result = process_analytics(&FailingSource, &AnalyticsQuery::default(), now);
        assert!(matches!(result, Err(AnalyticsError::RowFetch { .. })));
    }

    #[test]
    fn test_empty_rows_give_zero_report() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        let report =
            process_analytics(&RowSet::default(), &AnalyticsQuery::default(), now).unwrap();

        assert_eq!(report.overview, OverviewSummary::default());
        assert_eq!(report.sales_series.len(), 30);
        assert!(report.sales_series.iter().all(|p| p.sales_amount == 0.0));
        assert!(report.top_products.is_empty());
        assert!(report.location_series.is_empty());
    }

    #[test]
    fn test_two_day_scenario() {
        let d0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let d1 = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 18, 0, 0).unwrap();

        let rows = RowSet {
            sales: vec![sale("a", 100.0, d0), sale("b", 50.0, d0), sale("c", 25.0, d1)],
            ..RowSet::default()
        };

        let report = process_analytics(&rows, &AnalyticsQuery::new(Some("2"), None), now).unwrap();

        assert_eq!(report.overview.total_sales, 175.0);
        assert_eq!(report.sales_series.len(), 2);
        assert_eq!(
            report.sales_series[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(report.sales_series[0].sales_amount, 150.0);
        assert_eq!(report.sales_series[1].sales_amount, 25.0);
    }

    #[test]
    fn test_processor_rejects_invalid_config() {
        let config = AnalyticsConfig {
            top_products_limit: 0,
            ..AnalyticsConfig::default()
        };
        assert!(AnalyticsProcessor::new(config).is_err());
    }

    struct SnapshotOnlySource(RowSet);

    impl RowSource for SnapshotOnlySource {
        fn products(&self) -> Result<Vec<Product>> {
            Err(AnalyticsError::row_fetch("product", "read separately"))
        }

        fn locations(&self) -> Result<Vec<Location>> {
            Err(AnalyticsError::row_fetch("location", "read separately"))
        }

        fn inventory(&self) -> Result<Vec<InventoryRecord>> {
            Err(AnalyticsError::row_fetch("inventory", "read separately"))
        }

        fn sales(&self, _predicate: &SalesPredicate) -> Result<Vec<SaleEvent>> {
            Err(AnalyticsError::row_fetch("sale", "read separately"))
        }

        fn snapshot(&self, predicate: &SalesPredicate) -> Result<RowSet> {
            let mut rows = self.0.clone();
            rows.sales.retain(|sale| predicate.accept(sale));
            Ok(rows)
        }
    }

    #[test]
    fn test_process_reads_one_snapshot() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 18, 0, 0).unwrap();
        let source = SnapshotOnlySource(RowSet {
            sales: vec![sale("a", 12.5, now)],
            ..RowSet::default()
        });

        let report = process_analytics(&source, &AnalyticsQuery::default(), now).unwrap();
        assert_eq!(report.overview.total_sales, 12.5);
    }

    #[test]
    fn test_overflowing_stock_value_is_an_error() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 18, 0, 0).unwrap();
        let rows = RowSet {
            products: vec![Product {
                id: "bulk".to_string(),
                name: "Bulk".to_string(),
                category: "Raw".to_string(),
                sku: None,
                price: 1e10,
                status: ProductStatus::Active,
            }],
            inventory: vec![InventoryRecord {
                product_id: "bulk".to_string(),
                location_id: "l1".to_string(),
                quantity: u64::MAX,
                reorder_point: 0,
            }],
            ..RowSet::default()
        };

        let result = process_analytics(&rows, &AnalyticsQuery::default(), now);
        assert!(matches!(result, Err(AnalyticsError::Overflow(_))));
    }
}
