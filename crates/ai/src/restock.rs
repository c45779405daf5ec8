//! Inventory review: sales velocity per product and supplier alerts for
//! critical stock.

use std::collections::HashMap;

use serde::Serialize;

use bazaarops_core::{ProductId, StoreId};
use bazaarops_inventory::StockLevel;
use bazaarops_parties::StoreProfile;
use bazaarops_sales::OrderRecord;

use crate::job::Analysis;
use crate::money::round_to;

/// Length of the sales window the velocity is computed over.
pub const SALES_WINDOW_DAYS: i64 = 30;

/// One product as presented to the summarizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryInsight {
    #[serde(skip)]
    pub product_id: ProductId,
    pub product: String,
    pub current_stock: f64,
    pub reorder_threshold: f64,
    #[serde(rename = "total_sold_30days")]
    pub total_sold: f64,
    pub avg_daily_sales: f64,
    pub supplier: Option<String>,
    pub cost_price: f64,
    pub unit: String,
    #[serde(skip)]
    pub supplier_whatsapp: Option<String>,
    #[serde(skip)]
    pub suggested_reorder: f64,
}

impl InventoryInsight {
    pub fn is_critical(&self) -> bool {
        self.current_stock <= self.reorder_threshold
    }
}

/// A critical product with a supplier to contact.
#[derive(Debug, Clone, PartialEq)]
pub struct RestockAlert {
    pub product: String,
    pub current_stock: f64,
    pub unit: String,
    pub reorder_quantity: f64,
    pub whatsapp_url: String,
}

impl RestockAlert {
    fn from_insight(item: &InventoryInsight) -> Option<Self> {
        let whatsapp = item
            .supplier_whatsapp
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())?;

        let reorder_quantity = item.suggested_reorder;

        let text = format!(
            "Hi, urgent reorder needed for {}. Please send {:.0} {}.",
            item.product, reorder_quantity, item.unit
        );
        let whatsapp_url = format!("https://wa.me/{whatsapp}?text={}", urlencoding::encode(&text));

        Some(Self {
            product: item.product.clone(),
            current_stock: item.current_stock,
            unit: item.unit.clone(),
            reorder_quantity,
            whatsapp_url,
        })
    }

    /// Markdown message for the owner, ending in the supplier link.
    pub fn message(&self) -> String {
        format!(
            "⚠️ *Critical: {}*\nStock: {:.0} {}\nSuggested reorder: {:.0} {}\n\n[📱 Contact Supplier]({})",
            self.product,
            self.current_stock,
            self.unit,
            self.reorder_quantity,
            self.unit,
            self.whatsapp_url
        )
    }
}

/// Stock list plus 30-day velocity for one store.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryReview {
    pub store_id: StoreId,
    pub store_name: String,
    pub items: Vec<InventoryInsight>,
}

impl InventoryReview {
    /// `recent_orders` are the store's orders over the last
    /// [`SALES_WINDOW_DAYS`] days, lines included.
    pub fn build(store: &StoreProfile, stock: &[StockLevel], recent_orders: &[OrderRecord]) -> Self {
        let mut sold: HashMap<&ProductId, f64> = HashMap::new();
        for line in recent_orders.iter().flat_map(|o| o.lines.iter()) {
            *sold.entry(&line.product_id).or_insert(0.0) += line.quantity;
        }

        let items = stock
            .iter()
            .map(|s| {
                let total_sold = sold.get(&s.product_id).copied().unwrap_or(0.0);
                InventoryInsight {
                    product_id: s.product_id.clone(),
                    product: s.product_name.clone(),
                    current_stock: s.quantity,
                    reorder_threshold: s.reorder_threshold,
                    total_sold,
                    avg_daily_sales: round_to(total_sold / SALES_WINDOW_DAYS as f64, 2),
                    supplier: s.supplier_name.clone(),
                    cost_price: s.cost_price,
                    unit: s.unit.clone(),
                    supplier_whatsapp: s.supplier_whatsapp.clone(),
                    suggested_reorder: s.suggested_reorder(),
                }
            })
            .collect();

        Self {
            store_id: store.id.clone(),
            store_name: store.display_name().to_string(),
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// One alert per critical product that has a supplier number.
    pub fn critical_alerts(&self) -> Vec<RestockAlert> {
        self.items
            .iter()
            .filter(|i| i.is_critical())
            .filter_map(RestockAlert::from_insight)
            .collect()
    }

    pub fn message(insights: &str) -> String {
        format!("🤖 *AI Inventory Analysis*\n\n{}", insights.trim())
    }
}

impl Analysis for InventoryReview {
    fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    fn kind(&self) -> &'static str {
        "inventory_analysis"
    }

    fn prompt(&self) -> String {
        let data = serde_json::to_string_pretty(&self.items).unwrap_or_else(|_| "[]".to_string());
        format!(
            "You are an intelligent inventory management assistant for a retail store.\n\n\
             Store: {}\n\n\
             Current Inventory Status:\n{data}\n\n\
             Analyze this inventory data and provide:\n\
             1. Which products need immediate restocking (critical)\n\
             2. Which products should be restocked soon (warning)\n\
             3. Sales velocity insights (fast/slow moving items)\n\
             4. Cost-effective restocking recommendations\n\
             5. Any patterns or trends you notice\n\n\
             Format your response as a clear, actionable Telegram message with emojis.\n\
             Keep it concise but insightful. Focus on actionable recommendations.",
            self.store_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaarops_core::OrderId;
    use bazaarops_sales::{OrderLine, OrderStatus};
    use chrono::Utc;

    fn sid() -> StoreId {
        StoreId::new("s1").unwrap()
    }

    fn pid(p: &str) -> ProductId {
        ProductId::new(p).unwrap()
    }

    fn sale(product: &str, qty: f64) -> OrderRecord {
        OrderRecord::new(OrderId::new("o").unwrap(), sid(), OrderStatus::Paid, 0.0, Utc::now()).with_line(
            OrderLine {
                product_id: pid(product),
                product_name: product.to_string(),
                category: None,
                quantity: qty,
                unit_price: 1.0,
            },
        )
    }

    fn review() -> InventoryReview {
        let store = StoreProfile::new(sid(), "Sharma Kirana");
        let stock = vec![
            StockLevel::new(sid(), pid("rice"), "Basmati Rice", 4.0)
                .with_unit("kg")
                .with_supplier("Gupta Traders", Some("919800000000".into())),
            StockLevel::new(sid(), pid("dal"), "Toor Dal", 10.0),
            StockLevel::new(sid(), pid("oil"), "Mustard Oil", 50.0)
                .with_supplier("Oil Co", Some("911111111111".into())),
        ];
        let orders = vec![sale("rice", 45.0), sale("rice", 15.0), sale("dal", 3.0)];
        InventoryReview::build(&store, &stock, &orders)
    }

    #[test]
    fn velocity_over_thirty_days() {
        let r = review();
        assert_eq!(r.items[0].total_sold, 60.0);
        assert_eq!(r.items[0].avg_daily_sales, 2.0);
        assert_eq!(r.items[1].avg_daily_sales, 0.1);
        assert_eq!(r.items[2].total_sold, 0.0);
    }

    #[test]
    fn alerts_only_for_critical_items_with_supplier_number() {
        let alerts = review().critical_alerts();

        // Toor Dal is critical (10 <= 10) but has no supplier number.
        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.product, "Basmati Rice");
        assert_eq!(alert.reorder_quantity, 20.0);
        assert_eq!(
            alert.whatsapp_url,
            "https://wa.me/919800000000?text=Hi%2C%20urgent%20reorder%20needed%20for%20Basmati%20Rice.%20Please%20send%2020%20kg."
        );
        assert!(alert.message().contains("Stock: 4 kg"));
        assert!(alert.message().contains("Suggested reorder: 20 kg"));
    }

    #[test]
    fn prompt_hides_internal_fields() {
        let prompt = review().prompt();
        assert!(prompt.contains("Store: Sharma Kirana"));
        assert!(prompt.contains("\"total_sold_30days\": 60.0"));
        assert!(!prompt.contains("919800000000"));
    }
}
