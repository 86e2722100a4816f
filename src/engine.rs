use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::schema::{Location, Product, SaleEvent};
use crate::utils::{add_money, add_units, safe_ratio, to_decimal, utc_day};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Product and location lookups used to enrich sale events.
pub struct Catalog<'a> {
    products: HashMap<&'a str, &'a Product>,
    locations: HashMap<&'a str, &'a Location>,
}

/// A sale joined with the names it is reported under. Missing or empty names have
/// already been replaced with placeholders.
#[derive(Debug, Clone)]
pub struct EnrichedSale<'a> {
    pub sale: &'a SaleEvent,
    pub product_name: &'a str,
    pub category: &'a str,
    pub location_name: &'a str,
}

impl<'a> Catalog<'a> {
    pub fn new(products: &'a [Product], locations: &'a [Location]) -> Self {
        Self {
            products: products.iter().map(|p| (p.id.as_str(), p)).collect(),
            locations: locations.iter().map(|l| (l.id.as_str(), l)).collect(),
        }
    }

    pub fn enrich(
        &self,
        sale: &'a SaleEvent,
        config: &'a AnalyticsConfig,
    ) -> EnrichedSale<'a> {
        let product = self.products.get(sale.product_id.as_str()).copied();
        let location = self.locations.get(sale.location_id.as_str()).copied();

        EnrichedSale {
            sale,
            product_name: non_empty_or(
                product.map(|p| p.name.as_str()),
                &config.unknown_label,
            ),
            category: non_empty_or(
                product.map(|p| p.category.as_str()),
                &config.unknown_label,
            ),
            location_name: non_empty_or(
                location.map(|l| l.name.as_str()),
                &config.unknown_location_label,
            ),
        }
    }
}

fn non_empty_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => fallback,
    }
}

// ============================================================================
// Accumulators
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ProductAccumulator {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub total_quantity: u64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAccumulator {
    pub category: String,
    pub total_quantity: u64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationAccumulator {
    pub location_id: String,
    pub location_name: String,
    pub sales_amount: Decimal,
}

/// String-keyed accumulators that remember first-seen order.
#[derive(Debug, Clone)]
struct Grouped<V> {
    index: HashMap<String, usize>,
    entries: Vec<V>,
}

impl<V> Default for Grouped<V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<V> Grouped<V> {
    fn entry(&mut self, key: &str, init: impl FnOnce() -> V) -> &mut V {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.entries.push(init());
                self.index.insert(key.to_string(), idx);
                idx
            }
        };
        &mut self.entries[idx]
    }

    fn into_entries(self) -> Vec<V> {
        self.entries
    }
}

/// Raw sums over the accepted sales. Nothing here is rounded; every `Vec` is in
/// first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesRollup {
    pub total_sales: Decimal,
    pub total_units: u64,
    pub transactions: u64,
    pub by_product: Vec<ProductAccumulator>,
    pub by_category: Vec<CategoryAccumulator>,
    pub by_location: Vec<LocationAccumulator>,
    /// One bucket per day of the window, zero-filled.
    pub by_day: BTreeMap<NaiveDate, Decimal>,
}

impl SalesRollup {
    /// Revenue per unit sold, zero when nothing was sold.
    pub fn avg_order_value(&self) -> Decimal {
        safe_ratio(self.total_sales, self.total_units)
    }
}

// ============================================================================
// Engine
// ============================================================================

pub struct RollupEngine<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> RollupEngine<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Single pass over `sales`, which must already be filtered to the window.
    ///
    /// `days` fixes the daily buckets. A sale whose UTC day has no bucket still counts
    /// toward every other total. Sums that would pass `Decimal::MAX` (or `u64::MAX`
    /// units) abort the rollup with an overflow error.
    pub fn rollup<'s, I>(
        &self,
        sales: I,
        catalog: &Catalog<'s>,
        days: &[NaiveDate],
    ) -> Result<SalesRollup>
    where
        I: IntoIterator<Item = &'s SaleEvent>,
        'a: 's,
    {
        let mut by_product: Grouped<ProductAccumulator> = Grouped::default();
        let mut by_category: Grouped<CategoryAccumulator> = Grouped::default();
        let mut by_location: Grouped<LocationAccumulator> = Grouped::default();
        let mut by_day: BTreeMap<NaiveDate, Decimal> =
            days.iter().map(|d| (*d, Decimal::ZERO)).collect();

        let mut total_sales = Decimal::ZERO;
        let mut total_units = 0u64;
        let mut transactions = 0u64;

        for sale in sales {
            let enriched = catalog.enrich(sale, self.config);
            let amount = to_decimal(sale.total_amount);
            let quantity = sale.quantity;

            total_sales = add_money(total_sales, amount, "total sales")?;
            total_units = add_units(total_units, quantity, "total units")?;
            transactions += 1;

            let product = by_product.entry(&sale.product_id, || ProductAccumulator {
                product_id: sale.product_id.clone(),
                name: enriched.product_name.to_string(),
                category: enriched.category.to_string(),
                total_quantity: 0,
                total_revenue: Decimal::ZERO,
            });
            product.total_quantity = add_units(product.total_quantity, quantity, "product units")?;
            product.total_revenue = add_money(product.total_revenue, amount, "product revenue")?;

            let category = by_category.entry(enriched.category, || CategoryAccumulator {
                category: enriched.category.to_string(),
                total_quantity: 0,
                total_revenue: Decimal::ZERO,
            });
            category.total_quantity =
                add_units(category.total_quantity, quantity, "category units")?;
            category.total_revenue =
                add_money(category.total_revenue, amount, "category revenue")?;

            let location = by_location.entry(&sale.location_id, || LocationAccumulator {
                location_id: sale.location_id.clone(),
                location_name: enriched.location_name.to_string(),
                sales_amount: Decimal::ZERO,
            });
            location.sales_amount = add_money(location.sales_amount, amount, "location sales")?;

            if let Some(bucket) = by_day.get_mut(&utc_day(sale.sale_date)) {
                *bucket = add_money(*bucket, amount, "daily sales")?;
            }
        }

        Ok(SalesRollup {
            total_sales,
            total_units,
            transactions,
            by_product: by_product.into_entries(),
            by_category: by_category.into_entries(),
            by_location: by_location.into_entries(),
            by_day,
        })
    }
}
