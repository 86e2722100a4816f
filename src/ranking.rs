//! Ordering of rollups into dashboard lists.
//!
//! Sorting happens on the exact decimal sums and every sort is stable, so entries
//! with equal totals keep the order in which they first appeared in the sales.
//! Monetary fields are rounded to cents on the way out.

use crate::engine::{CategoryAccumulator, LocationAccumulator, ProductAccumulator};
use crate::schema::{CategoryRollup, DailyPoint, LocationPoint, ProductRollup};
use crate::utils::{day_label, round_money};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

impl From<&ProductAccumulator> for ProductRollup {
    fn from(acc: &ProductAccumulator) -> Self {
        Self {
            product_id: acc.product_id.clone(),
            name: acc.name.clone(),
            category: acc.category.clone(),
            total_quantity: acc.total_quantity,
            total_revenue: round_money(acc.total_revenue),
        }
    }
}

impl From<&CategoryAccumulator> for CategoryRollup {
    fn from(acc: &CategoryAccumulator) -> Self {
        Self {
            category: acc.category.clone(),
            total_revenue: round_money(acc.total_revenue),
            total_quantity: acc.total_quantity,
        }
    }
}

impl From<&LocationAccumulator> for LocationPoint {
    fn from(acc: &LocationAccumulator) -> Self {
        Self {
            location_id: acc.location_id.clone(),
            location_name: acc.location_name.clone(),
            sales_amount: round_money(acc.sales_amount),
        }
    }
}

pub fn top_products_by_revenue(
    products: &[ProductAccumulator],
    limit: usize,
) -> Vec<ProductRollup> {
    let mut ranked: Vec<&ProductAccumulator> = products.iter().collect();
    ranked.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    ranked.into_iter().take(limit).map(ProductRollup::from).collect()
}

pub fn top_products_by_units(products: &[ProductAccumulator], limit: usize) -> Vec<ProductRollup> {
    let mut ranked: Vec<&ProductAccumulator> = products.iter().collect();
    ranked.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    ranked.into_iter().take(limit).map(ProductRollup::from).collect()
}

/// Every category, highest revenue first.
pub fn rank_categories(categories: &[CategoryAccumulator]) -> Vec<CategoryRollup> {
    let mut ranked: Vec<&CategoryAccumulator> = categories.iter().collect();
    ranked.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    ranked.into_iter().map(CategoryRollup::from).collect()
}

pub fn daily_series(by_day: &BTreeMap<NaiveDate, Decimal>) -> Vec<DailyPoint> {
    by_day
        .iter()
        .map(|(date, amount)| DailyPoint {
            date: *date,
            label: day_label(*date),
            sales_amount: round_money(*amount),
        })
        .collect()
}

pub fn location_series(locations: &[LocationAccumulator]) -> Vec<LocationPoint> {
    let mut ranked: Vec<&LocationAccumulator> = locations.iter().collect();
    ranked.sort_by(|a, b| b.sales_amount.cmp(&a.sales_amount));
    ranked.into_iter().map(LocationPoint::from).collect()
}
