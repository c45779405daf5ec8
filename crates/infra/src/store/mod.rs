//! The shared retail database, as seen by agents and routines.

mod in_memory;
mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaarops_core::{OrderId, ProductId, StoreId};
use bazaarops_inventory::StockLevel;
use bazaarops_parties::StoreProfile;
use bazaarops_sales::{DailyMetrics, OrderRecord, OrderStatus};

pub use in_memory::InMemoryRetailStore;
pub use supabase::{SupabaseConfig, SupabaseStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("store request failed: {0}")]
    Transport(String),

    #[error("unexpected store response: {0}")]
    Decode(String),

    #[error("store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A stored AI summary for one store and day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub store_id: StoreId,
    pub date: NaiveDate,
    pub summary: String,
    pub metrics: DailyMetrics,
    pub created_at: DateTime<Utc>,
}

/// Read/write access to stores, orders, inventory and summaries.
///
/// Every call is a separate round trip; nothing here is transactional.
#[async_trait]
pub trait RetailStore: Send + Sync + 'static {
    async fn get_stores(&self) -> StoreResult<Vec<StoreProfile>>;

    async fn get_store(&self, store_id: &StoreId) -> StoreResult<Option<StoreProfile>>;

    async fn get_order(&self, order_id: &OrderId) -> StoreResult<Option<OrderRecord>>;

    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatus) -> StoreResult<()>;

    /// Current quantity, or `None` when the store has no inventory row for
    /// the product.
    async fn get_inventory(&self, store_id: &StoreId, product_id: &ProductId) -> StoreResult<Option<f64>>;

    async fn set_inventory(&self, store_id: &StoreId, product_id: &ProductId, quantity: f64) -> StoreResult<()>;

    async fn insert_summary(&self, record: SummaryRecord) -> StoreResult<()>;

    /// Headline numbers for `date` (orders placed that day plus current stock).
    async fn get_daily_metrics(&self, store_id: &StoreId, date: NaiveDate) -> StoreResult<DailyMetrics>;

    async fn list_inventory(&self, store_id: &StoreId) -> StoreResult<Vec<StockLevel>>;

    /// Orders created at or after `since`, lines included.
    async fn orders_since(&self, store_id: &StoreId, since: DateTime<Utc>) -> StoreResult<Vec<OrderRecord>>;

    /// Orders still owed (`pending` or `credit`).
    async fn open_credit_orders(&self, store_id: &StoreId) -> StoreResult<Vec<OrderRecord>>;
}

#[async_trait]
impl<S> RetailStore for Arc<S>
where
    S: RetailStore + ?Sized,
{
    async fn get_stores(&self) -> StoreResult<Vec<StoreProfile>> {
        (**self).get_stores().await
    }

    async fn get_store(&self, store_id: &StoreId) -> StoreResult<Option<StoreProfile>> {
        (**self).get_store(store_id).await
    }

    async fn get_order(&self, order_id: &OrderId) -> StoreResult<Option<OrderRecord>> {
        (**self).get_order(order_id).await
    }

    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatus) -> StoreResult<()> {
        (**self).update_order_status(order_id, status).await
    }

    async fn get_inventory(&self, store_id: &StoreId, product_id: &ProductId) -> StoreResult<Option<f64>> {
        (**self).get_inventory(store_id, product_id).await
    }

    async fn set_inventory(&self, store_id: &StoreId, product_id: &ProductId, quantity: f64) -> StoreResult<()> {
        (**self).set_inventory(store_id, product_id, quantity).await
    }

    async fn insert_summary(&self, record: SummaryRecord) -> StoreResult<()> {
        (**self).insert_summary(record).await
    }

    async fn get_daily_metrics(&self, store_id: &StoreId, date: NaiveDate) -> StoreResult<DailyMetrics> {
        (**self).get_daily_metrics(store_id, date).await
    }

    async fn list_inventory(&self, store_id: &StoreId) -> StoreResult<Vec<StockLevel>> {
        (**self).list_inventory(store_id).await
    }

    async fn orders_since(&self, store_id: &StoreId, since: DateTime<Utc>) -> StoreResult<Vec<OrderRecord>> {
        (**self).orders_since(store_id, since).await
    }

    async fn open_credit_orders(&self, store_id: &StoreId) -> StoreResult<Vec<OrderRecord>> {
        (**self).open_credit_orders(store_id).await
    }
}
