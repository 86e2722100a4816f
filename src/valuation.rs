use crate::error::Result;
use crate::filters::normalize_location;
use crate::schema::{InventoryRecord, Location, LocationType, Product};
use crate::utils::{add_money, add_units, line_value, round_money, to_decimal};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn classify(quantity: u64, reorder_point: u64) -> Self {
        if quantity == 0 {
            StockStatus::OutOfStock
        } else if quantity <= reorder_point {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

/// Point-in-time stock figures. Independent of any sales window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Valuation {
    /// Unrounded; rounding happens when the report is assembled.
    pub inventory_value: Decimal,
    pub low_stock_count: u64,
    pub out_of_stock_count: u64,
    pub total_active_products: u64,
    pub total_units_on_hand: u64,
}

pub struct ValuationCalculator<'a> {
    products: &'a [Product],
    prices: HashMap<&'a str, Decimal>,
}

impl<'a> ValuationCalculator<'a> {
    pub fn new(products: &'a [Product]) -> Self {
        let prices = products
            .iter()
            .map(|p| (p.id.as_str(), to_decimal(p.price)))
            .collect();
        Self { products, prices }
    }

    /// Fails with [`AnalyticsError::Overflow`](crate::error::AnalyticsError::Overflow)
    /// when the stock value or unit count cannot be represented.
    pub fn calculate(&self, inventory: &[InventoryRecord]) -> Result<Valuation> {
        let mut valuation = Valuation {
            total_active_products: self.products.iter().filter(|p| p.is_active()).count() as u64,
            ..Valuation::default()
        };

        for record in inventory {
            // Rows without a product still count for stock levels, just not for value.
            if let Some(price) = self.prices.get(record.product_id.as_str()) {
                let value = line_value(record.quantity, *price, "inventory value")?;
                valuation.inventory_value =
                    add_money(valuation.inventory_value, value, "inventory value")?;
            }

            valuation.total_units_on_hand =
                add_units(valuation.total_units_on_hand, record.quantity, "units on hand")?;

            match StockStatus::classify(record.quantity, record.reorder_point) {
                StockStatus::LowStock => valuation.low_stock_count += 1,
                StockStatus::OutOfStock => valuation.out_of_stock_count += 1,
                StockStatus::InStock => {}
            }
        }

        Ok(valuation)
    }
}

pub fn calculate_valuation(
    products: &[Product],
    inventory: &[InventoryRecord],
) -> Result<Valuation> {
    ValuationCalculator::new(products).calculate(inventory)
}

// ============================================================================
// Stock listing
// ============================================================================

/// Narrows a stock listing by free-text search and location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryFilter {
    /// Lower-cased needle matched against product name and SKU.
    pub search: Option<String>,
    pub location: Option<String>,
}

impl InventoryFilter {
    pub fn new(search: Option<&str>, location: Option<&str>) -> Self {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        Self {
            search,
            location: normalize_location(location),
        }
    }

    fn matches(&self, record: &InventoryRecord, product: &Product) -> bool {
        if let Some(location) = &self.location {
            if record.location_id != *location {
                return false;
            }
        }

        match &self.search {
            Some(needle) => {
                product.name.to_lowercase().contains(needle)
                    || product
                        .sku
                        .as_deref()
                        .is_some_and(|sku| sku.to_lowercase().contains(needle))
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub product_id: String,
    pub product_name: String,
    pub sku: Option<String>,
    pub category: String,
    pub location_id: String,
    pub location_name: String,
    pub location_type: LocationType,
    pub quantity: u64,
    pub reorder_point: u64,
    pub unit_price: f64,
    pub stock_value: f64,
    pub status: StockStatus,
}

/// Joins inventory with its product and location. Rows whose product or location is
/// missing are dropped, as a listing has nothing to show for them.
pub fn stock_levels(
    inventory: &[InventoryRecord],
    products: &[Product],
    locations: &[Location],
    filter: &InventoryFilter,
) -> Result<Vec<StockLevel>> {
    let products: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();
    let locations: HashMap<&str, &Location> =
        locations.iter().map(|l| (l.id.as_str(), l)).collect();

    let mut levels = Vec::new();
    for record in inventory {
        let (Some(product), Some(location)) = (
            products.get(record.product_id.as_str()),
            locations.get(record.location_id.as_str()),
        ) else {
            continue;
        };
        if !filter.matches(record, product) {
            continue;
        }

        let value = line_value(record.quantity, to_decimal(product.price), "stock value")?;
        levels.push(StockLevel {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            sku: product.sku.clone(),
            category: product.category.clone(),
            location_id: location.id.clone(),
            location_name: location.name.clone(),
            location_type: location.location_type,
            quantity: record.quantity,
            reorder_point: record.reorder_point,
            unit_price: product.price,
            stock_value: round_money(value),
            status: StockStatus::classify(record.quantity, record.reorder_point),
        });
    }

    Ok(levels)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub total_items: u64,
    pub low_stock_items: u64,
    pub out_of_stock_items: u64,
    pub inventory_value: f64,
}

impl InventorySummary {
    pub fn from_levels(levels: &[StockLevel]) -> Result<Self> {
        let mut value = Decimal::ZERO;
        let mut summary = Self::default();

        for level in levels {
            summary.total_items = add_units(summary.total_items, level.quantity, "listed units")?;
            let line = line_value(level.quantity, to_decimal(level.unit_price), "stock value")?;
            value = add_money(value, line, "stock value")?;
            match level.status {
                StockStatus::LowStock => summary.low_stock_items += 1,
                StockStatus::OutOfStock => summary.out_of_stock_items += 1,
                StockStatus::InStock => {}
            }
        }

        summary.inventory_value = round_money(value);
        Ok(summary)
    }
}

/// A filtered stock listing together with its totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub items: Vec<StockLevel>,
    pub summary: InventorySummary,
}

impl InventoryReport {
    pub fn build(
        inventory: &[InventoryRecord],
        products: &[Product],
        locations: &[Location],
        filter: &InventoryFilter,
    ) -> Result<Self> {
        let items = stock_levels(inventory, products, locations, filter)?;
        let summary = InventorySummary::from_levels(&items)?;
        Ok(Self { items, summary })
    }
}
