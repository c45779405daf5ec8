use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use bazaarops_core::{OrderId, ProductId, StoreId};
use bazaarops_inventory::StockLevel;
use bazaarops_parties::StoreProfile;
use bazaarops_sales::{DailyMetrics, OrderRecord, OrderStatus};

use super::{RetailStore, StoreError, StoreResult, SummaryRecord};

#[derive(Debug, Default)]
struct Tables {
    stores: Vec<StoreProfile>,
    orders: Vec<OrderRecord>,
    stock: HashMap<(StoreId, ProductId), StockLevel>,
    summaries: Vec<SummaryRecord>,
}

/// In-memory retail store for tests/dev.
///
/// `set_unavailable(true)` makes every call fail with a transport error.
#[derive(Debug, Default)]
pub struct InMemoryRetailStore {
    inner: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryRetailStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(self, store: StoreProfile) -> Self {
        self.write().stores.push(store);
        self
    }

    pub fn with_order(self, order: OrderRecord) -> Self {
        self.write().orders.push(order);
        self
    }

    pub fn with_stock(self, level: StockLevel) -> Self {
        self.write()
            .stock
            .insert((level.store_id.clone(), level.product_id.clone()), level);
        self
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn quantity(&self, store_id: &StoreId, product_id: &ProductId) -> Option<f64> {
        self.read()
            .stock
            .get(&(store_id.clone(), product_id.clone()))
            .map(|s| s.quantity)
    }

    pub fn order_status(&self, order_id: &OrderId) -> Option<OrderStatus> {
        self.read()
            .orders
            .iter()
            .find(|o| &o.id == order_id)
            .map(|o| o.status)
    }

    pub fn summaries(&self) -> Vec<SummaryRecord> {
        self.read().summaries.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Transport("in-memory store marked unavailable".into()))
        } else {
            Ok(())
        }
    }

    fn store_orders<'a>(tables: &'a Tables, store_id: &'a StoreId) -> impl Iterator<Item = &'a OrderRecord> {
        tables.orders.iter().filter(move |o| &o.store_id == store_id)
    }

    fn store_stock(tables: &Tables, store_id: &StoreId) -> Vec<StockLevel> {
        let mut levels: Vec<StockLevel> = tables
            .stock
            .values()
            .filter(|s| &s.store_id == store_id)
            .cloned()
            .collect();
        levels.sort_by(|a, b| a.product_name.cmp(&b.product_name));
        levels
    }
}

#[async_trait]
impl RetailStore for InMemoryRetailStore {
    async fn get_stores(&self) -> StoreResult<Vec<StoreProfile>> {
        self.check()?;
        Ok(self.read().stores.clone())
    }

    async fn get_store(&self, store_id: &StoreId) -> StoreResult<Option<StoreProfile>> {
        self.check()?;
        Ok(self.read().stores.iter().find(|s| &s.id == store_id).cloned())
    }

    async fn get_order(&self, order_id: &OrderId) -> StoreResult<Option<OrderRecord>> {
        self.check()?;
        Ok(self.read().orders.iter().find(|o| &o.id == order_id).cloned())
    }

    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatus) -> StoreResult<()> {
        self.check()?;
        let mut tables = self.write();
        match tables.orders.iter_mut().find(|o| &o.id == order_id) {
            Some(order) => {
                order.status = status;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("order {order_id}"))),
        }
    }

    async fn get_inventory(&self, store_id: &StoreId, product_id: &ProductId) -> StoreResult<Option<f64>> {
        self.check()?;
        Ok(self.quantity(store_id, product_id))
    }

    async fn set_inventory(&self, store_id: &StoreId, product_id: &ProductId, quantity: f64) -> StoreResult<()> {
        self.check()?;
        let mut tables = self.write();
        match tables.stock.get_mut(&(store_id.clone(), product_id.clone())) {
            Some(level) => {
                level.quantity = quantity;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("inventory {store_id}/{product_id}"))),
        }
    }

    async fn insert_summary(&self, record: SummaryRecord) -> StoreResult<()> {
        self.check()?;
        self.write().summaries.push(record);
        Ok(())
    }

    async fn get_daily_metrics(&self, store_id: &StoreId, date: NaiveDate) -> StoreResult<DailyMetrics> {
        self.check()?;
        let tables = self.read();
        let orders: Vec<OrderRecord> = Self::store_orders(&tables, store_id)
            .filter(|o| o.created_at.date_naive() == date)
            .cloned()
            .collect();
        let stock = Self::store_stock(&tables, store_id);
        Ok(DailyMetrics::compute(date, &orders, &stock))
    }

    async fn list_inventory(&self, store_id: &StoreId) -> StoreResult<Vec<StockLevel>> {
        self.check()?;
        Ok(Self::store_stock(&self.read(), store_id))
    }

    async fn orders_since(&self, store_id: &StoreId, since: DateTime<Utc>) -> StoreResult<Vec<OrderRecord>> {
        self.check()?;
        let tables = self.read();
        Ok(Self::store_orders(&tables, store_id)
            .filter(|o| o.created_at >= since)
            .cloned()
            .collect())
    }

    async fn open_credit_orders(&self, store_id: &StoreId) -> StoreResult<Vec<OrderRecord>> {
        self.check()?;
        let tables = self.read();
        Ok(Self::store_orders(&tables, store_id)
            .filter(|o| o.status.is_outstanding())
            .cloned()
            .collect())
    }
}
