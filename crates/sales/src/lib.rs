//! Sales domain module.
//!
//! Customer orders as read back from the shared store, and the daily
//! aggregates the reports are built from (no IO, no HTTP, no storage).

pub mod metrics;
pub mod order;

pub use metrics::{DailyMetrics, ProductSales, TOP_PRODUCTS, category_sales, product_sales, top_products};
pub use order::{OrderLine, OrderRecord, OrderStatus};
