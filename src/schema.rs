use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[schemars(description = "Currently sold; counted in the total-products KPI")]
    Active,

    #[schemars(description = "Temporarily not sold")]
    Inactive,

    #[schemars(description = "Permanently withdrawn from the catalog")]
    Discontinued,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Warehouse,
    Store,
    Online,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: f64,
    pub status: ProductStatus,
}

impl Product {
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
}

/// Stock on hand for one product at one location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub product_id: String,
    pub location_id: String,
    pub quantity: u64,
    pub reorder_point: u64,
}

/// A single sale line. `total_amount` is trusted to equal `quantity * unit_price`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleEvent {
    pub id: String,
    pub product_id: String,
    pub location_id: String,
    pub quantity: u64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub sale_date: DateTime<Utc>,
}

// ============================================================================
// Output structures
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewSummary {
    #[schemars(description = "Number of products with status `active`")]
    pub total_products: u64,

    #[schemars(description = "Sum of quantity x price over current inventory")]
    pub inventory_value: f64,

    #[schemars(description = "Inventory rows with 0 < quantity <= reorder point")]
    pub low_stock_items: u64,

    #[schemars(description = "Inventory rows with quantity 0")]
    pub out_of_stock_items: u64,

    #[schemars(description = "Revenue of accepted sales in the window")]
    pub total_sales: f64,

    pub total_units: u64,

    #[schemars(description = "Number of accepted sale events in the window")]
    pub total_transactions: u64,

    #[schemars(
        description = "Revenue per unit sold (total sales / total units), 0 when no units were sold. Despite the name this is not revenue per transaction."
    )]
    pub avg_order_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRollup {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub total_quantity: u64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRollup {
    pub category: String,
    pub total_revenue: f64,
    pub total_quantity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: NaiveDate,
    #[schemars(description = "Short display label such as `Oct 5`")]
    pub label: String,
    pub sales_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationPoint {
    pub location_id: String,
    pub location_name: String,
    pub sales_amount: f64,
}

/// Everything a dashboard needs for one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub overview: OverviewSummary,

    #[schemars(description = "Best products by revenue, at most the configured limit")]
    pub top_products: Vec<ProductRollup>,

    #[schemars(description = "Best products by units sold, at most the configured limit")]
    pub top_products_by_units: Vec<ProductRollup>,

    #[schemars(description = "All categories by revenue, descending")]
    pub top_categories: Vec<CategoryRollup>,

    #[schemars(description = "One entry per UTC day in the window, ascending, including zero days")]
    pub sales_series: Vec<DailyPoint>,

    #[schemars(description = "Sales per location, descending")]
    pub location_series: Vec<LocationPoint>,
}

impl AnalyticsReport {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalyticsReport)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
