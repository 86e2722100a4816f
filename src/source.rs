use crate::error::{AnalyticsError, Result};
use crate::filters::SalesPredicate;
use crate::ingestion::{
    ingest_inventory, ingest_locations, ingest_products, ingest_sales, RawRowSet,
};
use crate::schema::{InventoryRecord, Location, Product, SaleEvent};
use std::path::PathBuf;

/// The row-fetch collaborator.
///
/// Implementations may push the sales predicate down into their query; the
/// processor re-applies it either way. Any failure to produce rows must come back as
/// an error, never as an empty set, so that "no activity" and "fetch failed" stay
/// distinguishable.
pub trait RowSource {
    fn products(&self) -> Result<Vec<Product>>;
    fn locations(&self) -> Result<Vec<Location>>;
    fn inventory(&self) -> Result<Vec<InventoryRecord>>;
    fn sales(&self, predicate: &SalesPredicate) -> Result<Vec<SaleEvent>>;

    /// Every row set a report needs. Sources that can read them together (one file,
    /// one transaction) should override this so the report sees a single snapshot.
    fn snapshot(&self, predicate: &SalesPredicate) -> Result<RowSet> {
        Ok(RowSet {
            products: self.products()?,
            locations: self.locations()?,
            inventory: self.inventory()?,
            sales: self.sales(predicate)?,
        })
    }
}

/// Rows already materialized in memory.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    pub products: Vec<Product>,
    pub locations: Vec<Location>,
    pub inventory: Vec<InventoryRecord>,
    pub sales: Vec<SaleEvent>,
}

impl RowSet {
    pub fn from_raw(raw: &RawRowSet) -> Result<Self> {
        Ok(Self {
            products: ingest_products(&raw.products)?,
            locations: ingest_locations(&raw.locations)?,
            inventory: ingest_inventory(&raw.inventory)?,
            sales: ingest_sales(&raw.sales)?,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_raw(&RawRowSet::from_json_str(json)?)
    }
}

impl RowSource for RowSet {
    fn products(&self) -> Result<Vec<Product>> {
        Ok(self.products.clone())
    }

    fn locations(&self) -> Result<Vec<Location>> {
        Ok(self.locations.clone())
    }

    fn inventory(&self) -> Result<Vec<InventoryRecord>> {
        Ok(self.inventory.clone())
    }

    fn sales(&self, predicate: &SalesPredicate) -> Result<Vec<SaleEvent>> {
        Ok(predicate.apply(&self.sales).into_iter().cloned().collect())
    }
}

/// Reads a [`RawRowSet`] JSON export from disk. A snapshot reads the file once; the
/// per-row-set fetches each read it again.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self, rows: &str) -> Result<RowSet> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| self.fetch_error(rows, e))?;
        let raw = RawRowSet::from_json_str(&raw).map_err(|e| self.fetch_error(rows, e))?;
        RowSet::from_raw(&raw)
    }

    fn fetch_error(&self, rows: &str, reason: impl std::fmt::Display) -> AnalyticsError {
        AnalyticsError::row_fetch(rows, format!("{}: {}", self.path.display(), reason))
    }
}

impl RowSource for JsonFileSource {
    fn products(&self) -> Result<Vec<Product>> {
        Ok(self.load("product")?.products)
    }

    fn locations(&self) -> Result<Vec<Location>> {
        Ok(self.load("location")?.locations)
    }

    fn inventory(&self) -> Result<Vec<InventoryRecord>> {
        Ok(self.load("inventory")?.inventory)
    }

    fn sales(&self, predicate: &SalesPredicate) -> Result<Vec<SaleEvent>> {
        self.load("sale")?.sales(predicate)
    }

    fn snapshot(&self, predicate: &SalesPredicate) -> Result<RowSet> {
        let mut rows = self.load("snapshot")?;
        rows.sales.retain(|sale| predicate.accept(sale));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_row_set_pushes_down_predicate() {
        let rows = RowSet::from_json_str(
            r#"{
                "sales": [
                    { "id": "old", "product_id": "p", "location_id": "l", "quantity": 1,
                      "unit_price": 1, "total_amount": 1, "sale_date": "2024-01-01T00:00:00Z" },
                    { "id": "new", "product_id": "p", "location_id": "l", "quantity": 1,
                      "unit_price": 1, "total_amount": 1, "sale_date": "2024-02-01T00:00:00Z" }
                ]
            }"#,
        )
        .unwrap();

        let predicate = SalesPredicate {
            since: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            location: None,
        };
        let sales = rows.sales(&predicate).unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].id, "new");
    }

    #[test]
    fn test_file_snapshot_reads_every_row_set_at_once() {
        let path = std::env::temp_dir().join(format!(
            "merchandising-analytics-snapshot-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{
                "products": [
                    { "id": "p", "name": "Tee", "category": "Apparel", "price": 10, "status": "active" }
                ],
                "locations": [ { "id": "l", "name": "Main", "type": "store" } ],
                "inventory": [ { "product_id": "p", "location_id": "l", "quantity": 4, "reorder_point": 1 } ],
                "sales": [
                    { "id": "old", "product_id": "p", "location_id": "l", "quantity": 1,
                      "unit_price": 10, "total_amount": 10, "sale_date": "2024-01-01T00:00:00Z" },
                    { "id": "new", "product_id": "p", "location_id": "l", "quantity": 1,
                      "unit_price": 10, "total_amount": 10, "sale_date": "2024-02-01T00:00:00Z" }
                ]
            }"#,
        )
        .unwrap();

        let source = JsonFileSource::new(&path);
        let predicate = SalesPredicate {
            since: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            location: None,
        };
        let rows = source.snapshot(&predicate).unwrap();

        // Everything came from the single read above.
        std::fs::remove_file(&path).unwrap();

        assert_eq!(rows.products.len(), 1);
        assert_eq!(rows.locations.len(), 1);
        assert_eq!(rows.inventory.len(), 1);
        assert_eq!(rows.sales.len(), 1);
        assert_eq!(rows.sales[0].id, "new");
        assert!(matches!(
            source.snapshot(&predicate),
            Err(AnalyticsError::RowFetch { ref rows, .. }) if rows == "snapshot"
        ));
    }

    #[test]
    fn test_missing_file_is_fetch_error() {
        let source = JsonFileSource::new("/definitely/not/here/rows.json");
        let err = source.products().unwrap_err();
        assert!(matches!(err, AnalyticsError::RowFetch { ref rows, .. } if rows == "product"));
    }
}
