//! Daily aggregates over a store's orders.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bazaarops_core::ProductId;
use bazaarops_inventory::StockLevel;

use crate::order::OrderRecord;

/// Number of products listed as "top products" in summaries and reports.
pub const TOP_PRODUCTS: usize = 5;

/// The day's headline numbers for one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub revenue: f64,
    pub order_count: usize,
    pub top_products: Vec<String>,
    pub low_stock: Vec<String>,
}

impl DailyMetrics {
    /// Aggregate `orders` (already restricted to `date`) and the current stock.
    ///
    /// Cancelled orders are ignored.
    pub fn compute(date: NaiveDate, orders: &[OrderRecord], stock: &[StockLevel]) -> Self {
        let counted: Vec<&OrderRecord> = orders
            .iter()
            .filter(|o| o.status != crate::OrderStatus::Cancelled)
            .collect();

        let revenue = counted.iter().map(|o| o.total_amount).sum();
        let top = top_products(counted.iter().copied(), TOP_PRODUCTS);

        let mut low_stock: Vec<String> = stock
            .iter()
            .filter(|s| s.is_low())
            .map(|s| s.product_name.clone())
            .collect();
        low_stock.sort();

        Self {
            date,
            revenue,
            order_count: counted.len(),
            top_products: top,
            low_stock,
        }
    }
}

/// Units and revenue sold for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: f64,
    pub revenue: f64,
}

/// Per-product totals across `orders`, best sellers (by quantity) first.
///
/// Ties are broken by product name so the ordering is stable.
pub fn product_sales<'a>(orders: impl IntoIterator<Item = &'a OrderRecord>) -> Vec<ProductSales> {
    let mut by_product: HashMap<ProductId, ProductSales> = HashMap::new();

    for line in orders.into_iter().flat_map(|o| o.lines.iter()) {
        let entry = by_product
            .entry(line.product_id.clone())
            .or_insert_with(|| ProductSales {
                product_id: line.product_id.clone(),
                product_name: line.product_name.clone(),
                quantity: 0.0,
                revenue: 0.0,
            });
        entry.quantity += line.quantity;
        entry.revenue += line.line_total();
    }

    let mut sales: Vec<ProductSales> = by_product.into_values().collect();
    sales.sort_by(|a, b| {
        b.quantity
            .total_cmp(&a.quantity)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    sales
}

/// Names of the `n` best-selling products.
pub fn top_products<'a>(orders: impl IntoIterator<Item = &'a OrderRecord>, n: usize) -> Vec<String> {
    product_sales(orders)
        .into_iter()
        .take(n)
        .map(|s| s.product_name)
        .collect()
}

/// Quantity and revenue per category (`"Uncategorized"` when a line has none).
pub fn category_sales<'a>(
    orders: impl IntoIterator<Item = &'a OrderRecord>,
) -> BTreeMap<String, (f64, f64)> {
    let mut out: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for line in orders.into_iter().flat_map(|o| o.lines.iter()) {
        let key = line
            .category
            .clone()
            .unwrap_or_else(|| "Uncategorized".to_string());
        let entry = out.entry(key).or_insert((0.0, 0.0));
        entry.0 += line.quantity;
        entry.1 += line.line_total();
    }
    out
}
