use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaarops_core::StoreId;
use bazaarops_parties::StoreProfile;
use bazaarops_sales::OrderRecord;

use crate::job::Analysis;
use crate::money::rupees;

/// An unpaid order as presented to the summarizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditAccount {
    pub customer_name: String,
    pub customer_phone: String,
    pub amount_due: f64,
    pub days_pending: i64,
    pub order_date: String,
}

/// Outstanding credit for one store.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditReview {
    pub store_id: StoreId,
    pub store_name: String,
    pub accounts: Vec<CreditAccount>,
}

impl CreditReview {
    /// Orders that are not outstanding (see `OrderStatus::is_outstanding`)
    /// are ignored.
    pub fn build(store: &StoreProfile, open_orders: &[OrderRecord], now: DateTime<Utc>) -> Self {
        let accounts = open_orders
            .iter()
            .filter(|o| o.status.is_outstanding())
            .map(|o| {
                let (name, phone) = match &o.customer {
                    Some(c) => (c.display_name(), c.display_phone()),
                    None => ("Unknown", "N/A"),
                };
                CreditAccount {
                    customer_name: name.to_string(),
                    customer_phone: phone.to_string(),
                    amount_due: o.total_amount,
                    days_pending: o.days_pending(now),
                    order_date: o.created_at.format("%Y-%m-%d").to_string(),
                }
            })
            .collect();

        Self {
            store_id: store.id.clone(),
            store_name: store.display_name().to_string(),
            accounts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn total_outstanding(&self) -> f64 {
        self.accounts.iter().map(|a| a.amount_due).sum()
    }

    pub fn message(insights: &str) -> String {
        format!("💳 *AI Credit Analysis*\n\n{}", insights.trim())
    }
}

impl Analysis for CreditReview {
    fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    fn kind(&self) -> &'static str {
        "credit_analysis"
    }

    fn prompt(&self) -> String {
        let data = serde_json::to_string_pretty(&self.accounts).unwrap_or_else(|_| "[]".to_string());
        format!(
            "You are a financial advisor helping a small retail store manage credit accounts.\n\n\
             Store: {}\n\
             Total Outstanding: {}\n\n\
             Credit Accounts:\n{data}\n\n\
             Provide:\n\
             1. Risk assessment for each account (High/Medium/Low risk)\n\
             2. Personalized collection strategies for each customer\n\
             3. Priority order for follow-ups\n\
             4. Suggested communication approach (friendly reminder vs firm notice)\n\
             5. Payment plan recommendations if needed\n\n\
             Format as a clear, actionable Telegram message with emojis.\n\
             Be professional but empathetic - these are small business relationships.",
            self.store_name,
            rupees(self.total_outstanding()),
        )
    }
}
