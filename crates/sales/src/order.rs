use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaarops_core::{OrderId, ProductId, StoreId};
use bazaarops_parties::Customer;

/// Order status lifecycle as stored in the shared database.
///
/// Other services write this column too; spellings not listed here decode as
/// `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    /// Delivered and closed by the owner.
    Completed,
    /// Goods handed over on the customer's tab.
    Credit,
    Paid,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::Credit => "credit",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Unknown => "unknown",
        }
    }

    /// Money is still owed on orders in these states.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Credit)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order line: product, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
}

impl OrderLine {
    pub fn line_total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// A customer order as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub store_id: StoreId,
    #[serde(default)]
    pub customer: Option<Customer>,
    pub status: OrderStatus,
    pub total_amount: f64,
    #[serde(default)]
    pub profit_amount: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
}

impl OrderRecord {
    pub fn new(
        id: OrderId,
        store_id: StoreId,
        status: OrderStatus,
        total_amount: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            store_id,
            customer: None,
            status,
            total_amount,
            profit_amount: 0.0,
            created_at,
            lines: Vec::new(),
        }
    }

    pub fn with_customer(mut self, customer: Customer) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn with_profit(mut self, profit_amount: f64) -> Self {
        self.profit_amount = profit_amount;
        self
    }

    pub fn with_line(mut self, line: OrderLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Whole days between placing the order and `now` (never negative).
    pub fn days_pending(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }
}
