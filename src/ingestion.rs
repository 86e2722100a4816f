//! The data-ingestion boundary.
//!
//! Row-fetch collaborators hand over rows as they come out of the store: numeric
//! columns may arrive as JSON numbers or as numeric strings (e.g. `NUMERIC` columns
//! serialized as `"19.99"`), timestamps as text. Everything is parsed and validated
//! here, once, so the aggregation code only ever sees typed values.

use crate::error::{AnalyticsError, Result};
use crate::schema::{
    InventoryRecord, Location, LocationType, Product, ProductStatus, SaleEvent,
};
use crate::utils::try_to_decimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProduct {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLocation {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub location_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInventoryRecord {
    #[serde(default, alias = "productId")]
    pub product_id: Value,
    #[serde(default, alias = "locationId")]
    pub location_id: Value,
    #[serde(default)]
    pub quantity: Value,
    #[serde(default, alias = "reorderPoint")]
    pub reorder_point: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSale {
    #[serde(default)]
    pub id: Value,
    #[serde(default, alias = "productId")]
    pub product_id: Value,
    #[serde(default, alias = "locationId")]
    pub location_id: Value,
    #[serde(default)]
    pub quantity: Value,
    #[serde(default, alias = "unitPrice")]
    pub unit_price: Value,
    #[serde(default, alias = "totalAmount")]
    pub total_amount: Value,
    #[serde(default, alias = "saleDate")]
    pub sale_date: Value,
}

/// The four row sets as a single JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRowSet {
    #[serde(default)]
    pub products: Vec<RawProduct>,
    #[serde(default)]
    pub locations: Vec<RawLocation>,
    #[serde(default)]
    pub inventory: Vec<RawInventoryRecord>,
    #[serde(default)]
    pub sales: Vec<RawSale>,
}

impl RawRowSet {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Field parsers
// ============================================================================

fn parse_id(value: &Value, kind: &str, field: &str) -> Result<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(AnalyticsError::invalid_row(
            kind,
            "?",
            format!("{} is missing or not an identifier", field),
        )),
    }
}

/// Finite, non-negative decimal from a number or numeric string. Values too large to
/// carry as a `Decimal` are rejected here so they can never drop out of a total.
fn parse_amount(value: &Value, kind: &str, id: &str, field: &str) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if !v.is_finite() || v < 0.0 => Err(AnalyticsError::invalid_row(
            kind,
            id,
            format!("{} must be a non-negative finite number, got {}", field, v),
        )),
        Some(v) if try_to_decimal(v).is_none() => Err(AnalyticsError::invalid_row(
            kind,
            id,
            format!("{} is out of the supported monetary range: {}", field, v),
        )),
        Some(v) => Ok(v),
        None => Err(AnalyticsError::invalid_row(
            kind,
            id,
            format!("{} is not numeric: {}", field, value),
        )),
    }
}

/// Non-negative whole number from a number or numeric string.
fn parse_count(value: &Value, kind: &str, id: &str, field: &str) -> Result<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .filter(|f| *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| {
        AnalyticsError::invalid_row(
            kind,
            id,
            format!("{} must be a non-negative whole number, got {}", field, value),
        )
    })
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]` (taken as UTC) and bare dates
/// (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_sale_date(value: &Value, id: &str) -> Result<DateTime<Utc>> {
    value.as_str().and_then(parse_timestamp).ok_or_else(|| {
        AnalyticsError::invalid_row(
            "sale",
            id,
            format!("sale_date is not a timestamp: {}", value),
        )
    })
}

fn parse_product_status(raw: Option<&str>, id: &str) -> Result<ProductStatus> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("active") => Ok(ProductStatus::Active),
        Some("inactive") => Ok(ProductStatus::Inactive),
        Some("discontinued") => Ok(ProductStatus::Discontinued),
        other => Err(AnalyticsError::invalid_row(
            "product",
            id,
            format!("unknown status {:?}", other),
        )),
    }
}

fn parse_location_type(raw: Option<&str>, id: &str) -> Result<LocationType> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("warehouse") => Ok(LocationType::Warehouse),
        Some("store") => Ok(LocationType::Store),
        Some("online") => Ok(LocationType::Online),
        other => Err(AnalyticsError::invalid_row(
            "location",
            id,
            format!("unknown location type {:?}", other),
        )),
    }
}

// ============================================================================
// Row conversion
// ============================================================================

pub fn ingest_products(rows: &[RawProduct]) -> Result<Vec<Product>> {
    let products = rows
        .iter()
        .map(|row| -> Result<Product> {
            let id = parse_id(&row.id, "product", "id")?;
            Ok(Product {
                price: parse_amount(&row.price, "product", &id, "price")?,
                status: parse_product_status(row.status.as_deref(), &id)?,
                name: row.name.clone().unwrap_or_default(),
                category: row.category.clone().unwrap_or_default(),
                sku: row.sku.clone(),
                id,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Ingested {} product rows", products.len());
    Ok(products)
}

pub fn ingest_locations(rows: &[RawLocation]) -> Result<Vec<Location>> {
    let locations = rows
        .iter()
        .map(|row| -> Result<Location> {
            let id = parse_id(&row.id, "location", "id")?;
            Ok(Location {
                location_type: parse_location_type(row.location_type.as_deref(), &id)?,
                name: row.name.clone().unwrap_or_default(),
                id,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Ingested {} location rows", locations.len());
    Ok(locations)
}

/// Also enforces one record per (product, location) pair.
pub fn ingest_inventory(rows: &[RawInventoryRecord]) -> Result<Vec<InventoryRecord>> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let product_id = parse_id(&row.product_id, "inventory", "product_id")?;
        let location_id = parse_id(&row.location_id, "inventory", "location_id")?;
        let key = format!("{}@{}", product_id, location_id);

        let record = InventoryRecord {
            quantity: parse_count(&row.quantity, "inventory", &key, "quantity")?,
            reorder_point: parse_count(&row.reorder_point, "inventory", &key, "reorder_point")?,
            product_id,
            location_id,
        };

        if !seen.insert((record.product_id.clone(), record.location_id.clone())) {
            return Err(AnalyticsError::DuplicateInventoryRecord {
                product_id: record.product_id,
                location_id: record.location_id,
            });
        }
        records.push(record);
    }

    debug!("Ingested {} inventory rows", records.len());
    Ok(records)
}

pub fn ingest_sales(rows: &[RawSale]) -> Result<Vec<SaleEvent>> {
    let sales = rows
        .iter()
        .map(|row| -> Result<SaleEvent> {
            let id = parse_id(&row.id, "sale", "id")?;
            let quantity = parse_count(&row.quantity, "sale", &id, "quantity")?;
            if quantity == 0 {
                return Err(AnalyticsError::invalid_row(
                    "sale",
                    &id,
                    "quantity must be greater than zero",
                ));
            }

            Ok(SaleEvent {
                product_id: parse_id(&row.product_id, "sale", "product_id")?,
                location_id: parse_id(&row.location_id, "sale", "location_id")?,
                quantity,
                unit_price: parse_amount(&row.unit_price, "sale", &id, "unit_price")?,
                total_amount: parse_amount(&row.total_amount, "sale", &id, "total_amount")?,
                sale_date: parse_sale_date(&row.sale_date, &id)?,
                id,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Ingested {} sale rows", sales.len());
    Ok(sales)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_numeric_strings_are_parsed() {
        let rows: Vec<RawSale> = serde_json::from_value(json!([
            {
                "id": "s1",
                "product_id": "p1",
                "location_id": "l1",
                "quantity": "3",
                "unit_price": "9.99",
                "total_amount": "29.97",
                "sale_date": "2024-03-01T10:15:00Z"
            },
            {
                "id": 2,
                "productId": "p1",
                "locationId": "l1",
                "quantity": 1,
                "unitPrice": 5,
                "totalAmount": 5.0,
                "saleDate": "2024-03-01 23:00:00.123"
            }
        ]))
        .unwrap();

        let sales = ingest_sales(&rows).unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].quantity, 3);
        assert_eq!(sales[0].total_amount, 29.97);
        assert_eq!(sales[1].id, "2");
        assert_eq!(sales[1].unit_price, 5.0);
        assert_eq!(
            sales[0].sale_date,
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_non_numeric_amount_is_rejected() {
        let rows: Vec<RawSale> = serde_json::from_value(json!([{
            "id": "s1",
            "product_id": "p1",
            "location_id": "l1",
            "quantity": 1,
            "unit_price": "abc",
            "total_amount": "abc",
            "sale_date": "2024-03-01"
        }]))
        .unwrap();

        let err = ingest_sales(&rows).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidRow { ref id, .. } if id == "s1"));
    }

    #[test]
    fn test_amount_beyond_decimal_range_is_rejected() {
        let rows: Vec<RawSale> = serde_json::from_value(json!([{
            "id": "huge",
            "product_id": "p1",
            "location_id": "l1",
            "quantity": 1,
            "unit_price": 1,
            "total_amount": 1e30,
            "sale_date": "2024-03-01"
        }]))
        .unwrap();

        let err = ingest_sales(&rows).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::InvalidRow { ref id, ref details, .. }
                if id == "huge" && details.contains("total_amount")
        ));
    }

    #[test]
    fn test_zero_quantity_sale_is_rejected() {
        let rows: Vec<RawSale> = serde_json::from_value(json!([{
            "id": "s1",
            "product_id": "p1",
            "location_id": "l1",
            "quantity": 0,
            "unit_price": 1,
            "total_amount": 0,
            "sale_date": "2024-03-01"
        }]))
        .unwrap();

        assert!(ingest_sales(&rows).is_err());
    }

    #[test]
    fn test_negative_inventory_is_rejected() {
        let rows = vec![RawInventoryRecord {
            product_id: json!("p1"),
            location_id: json!("l1"),
            quantity: json!(-2),
            reorder_point: json!(5),
        }];
        assert!(ingest_inventory(&rows).is_err());
    }

    #[test]
    fn test_duplicate_inventory_pair_is_rejected() {
        let row = RawInventoryRecord {
            product_id: json!("p1"),
            location_id: json!("l1"),
            quantity: json!(2),
            reorder_point: json!("5"),
        };
        let err = ingest_inventory(&[row.clone(), row]).unwrap_err();
        assert!(matches!(err, AnalyticsError::DuplicateInventoryRecord { .. }));
    }

    #[test]
    fn test_products_and_locations() {
        let raw = RawRowSet::from_json_str(
            r#"{
                "products": [
                    { "id": "p1", "name": "Tee", "category": "Apparel", "sku": "TEE-1", "price": "19.99", "status": "Active" }
                ],
                "locations": [
                    { "id": "l1", "name": "Depot", "type": "warehouse" }
                ]
            }"#,
        )
        .unwrap();

        let products = ingest_products(&raw.products).unwrap();
        assert_eq!(products[0].price, 19.99);
        assert_eq!(products[0].status, ProductStatus::Active);

        let locations = ingest_locations(&raw.locations).unwrap();
        assert_eq!(locations[0].location_type, LocationType::Warehouse);
        assert!(raw.sales.is_empty());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let rows = vec![RawProduct {
            id: json!("p1"),
            price: json!(1),
            status: Some("archived".to_string()),
            ..RawProduct::default()
        }];
        assert!(ingest_products(&rows).is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T02:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
