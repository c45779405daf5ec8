//! Daily performance snapshots: the short AI summary stored per store, and
//! the end-of-day report sent to the owner.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

use bazaarops_core::StoreId;
use bazaarops_parties::StoreProfile;
use bazaarops_sales::{DailyMetrics, OrderRecord, TOP_PRODUCTS, category_sales, product_sales};

use crate::job::Analysis;
use crate::money::{round_to, rupees};

/// Input for the stored daily summary (`generate_daily_summary`).
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummaryInput {
    pub store_id: StoreId,
    pub metrics: DailyMetrics,
}

impl DailySummaryInput {
    pub fn new(store_id: StoreId, metrics: DailyMetrics) -> Self {
        Self { store_id, metrics }
    }
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    }
}

impl Analysis for DailySummaryInput {
    fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    fn kind(&self) -> &'static str {
        "daily_summary"
    }

    fn prompt(&self) -> String {
        let m = &self.metrics;
        format!(
            "You are a business analyst for a kirana store.\n\n\
             Today's Performance:\n\
             - Revenue: ₹{revenue}\n\
             - Orders: {orders}\n\
             - Top Products: {top}\n\
             - Low Stock: {low}\n\n\
             Generate a brief summary in Hinglish (Hindi-English mix) in 4-5 sentences that:\n\
             1. Highlights key wins\n\
             2. Points out concerns\n\
             3. Gives 2-3 actionable tips\n\n\
             Keep it friendly and practical. Maximum 150 words.",
            revenue = round_to(m.revenue, 2),
            orders = m.order_count,
            top = join_or_none(&m.top_products),
            low = join_or_none(&m.low_stock),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub quantity: f64,
    pub revenue: f64,
}

/// End-of-day report for one store.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport {
    pub store_id: StoreId,
    pub store_name: String,
    pub date: NaiveDate,
    pub total_orders: usize,
    pub total_revenue: f64,
    pub total_profit: f64,
    /// Percent, one decimal; `0.0` without revenue.
    pub profit_margin: f64,
    pub categories: BTreeMap<String, CategoryTotals>,
    /// Best sellers by quantity, at most [`TOP_PRODUCTS`].
    pub top_products: Vec<(String, f64)>,
}

impl DailyReport {
    /// Build from the store's orders for `date` (lines included).
    pub fn build(store: &StoreProfile, date: NaiveDate, orders: &[OrderRecord]) -> Self {
        let total_revenue: f64 = orders.iter().map(|o| o.total_amount).sum();
        let total_profit: f64 = orders.iter().map(|o| o.profit_amount).sum();
        let profit_margin = if total_revenue > 0.0 {
            round_to(total_profit / total_revenue * 100.0, 1)
        } else {
            0.0
        };

        let categories = category_sales(orders)
            .into_iter()
            .map(|(name, (quantity, revenue))| (name, CategoryTotals { quantity, revenue }))
            .collect();

        let top_products = product_sales(orders)
            .into_iter()
            .take(TOP_PRODUCTS)
            .map(|s| (s.product_name, s.quantity))
            .collect();

        Self {
            store_id: store.id.clone(),
            store_name: store.display_name().to_string(),
            date,
            total_orders: orders.len(),
            total_revenue,
            total_profit,
            profit_margin,
            categories,
            top_products,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_orders == 0
    }

    fn heading(date: NaiveDate) -> String {
        format!("📊 *Daily Report - {}*", date.format("%d %B %Y"))
    }

    /// Sent instead of a report when the store had no orders.
    pub fn no_orders_message(date: NaiveDate) -> String {
        format!(
            "{}\n\nNo orders today.\n\n💡 *AI Suggestion:* Consider promoting your products or reaching out to regular customers!",
            Self::heading(date)
        )
    }

    /// Quick stats followed by the summarizer's insights.
    pub fn message(&self, insights: &str) -> String {
        format!(
            "{}\n\n📈 *Quick Stats:*\n\
             • Orders: {}\n\
             • Revenue: {}\n\
             • Profit: {}\n\
             • Margin: {}%\n\n\
             {}",
            Self::heading(self.date),
            self.total_orders,
            rupees(self.total_revenue),
            rupees(self.total_profit),
            self.profit_margin,
            insights.trim(),
        )
    }
}

impl Analysis for DailyReport {
    fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    fn kind(&self) -> &'static str {
        "daily_report"
    }

    fn prompt(&self) -> String {
        let top: serde_json::Map<String, serde_json::Value> = self
            .top_products
            .iter()
            .map(|(name, qty)| (name.clone(), json!(qty)))
            .collect();

        let data = json!({
            "store_name": self.store_name,
            "date": self.date.format("%d %B %Y").to_string(),
            "total_orders": self.total_orders,
            "total_revenue": round_to(self.total_revenue, 2),
            "total_profit": round_to(self.total_profit, 2),
            "profit_margin": self.profit_margin,
            "category_sales": self.categories,
            "top_products": top,
        });
        let data = serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string());

        format!(
            "You are a business analyst for a retail store. Analyze today's performance and provide insights.\n\n\
             Daily Performance Data:\n{data}\n\n\
             Provide:\n\
             1. Performance summary (good/average/needs improvement)\n\
             2. Key highlights and achievements\n\
             3. Top performing categories and products\n\
             4. Profit margin analysis\n\
             5. Actionable recommendations for tomorrow\n\
             6. Any concerning trends\n\n\
             Format as a clear, motivating Telegram message with emojis. Keep it concise but insightful."
        )
    }
}
