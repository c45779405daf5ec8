use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::{error, info, warn};

use bazaarops_events::{Event, EventBus, EventHandler, HandlerResult, InventoryUpdated, OrderCreated};
use bazaarops_inventory::after_sale;
use bazaarops_sales::OrderStatus;

use super::AgentError;
use crate::store::RetailStore;

/// Applies a new order: decrements stock per line, confirms the order and
/// announces `inventory_updated`.
///
/// Each line is a separate read-modify-write; the first failing line stops
/// the rest and leaves the order unconfirmed. Concurrent orders for the same
/// product can lose an update.
pub struct OrderAgent {
    store: Arc<dyn RetailStore>,
    bus: Weak<EventBus>,
}

impl OrderAgent {
    pub fn new(store: Arc<dyn RetailStore>, bus: Weak<EventBus>) -> Self {
        Self { store, bus }
    }

    async fn process(&self, event: &Event) -> Result<(), AgentError> {
        let order = OrderCreated::from_event(event)?;
        let store_id = event.store_id();

        for item in &order.items {
            let Some(current) = self.store.get_inventory(store_id, &item.product_id).await? else {
                warn!(
                    store = %store_id,
                    order = %order.order_id,
                    product = %item.product_id,
                    "no inventory row for product; line skipped"
                );
                continue;
            };

            let updated = after_sale(current, item.quantity);
            self.store
                .set_inventory(store_id, &item.product_id, updated)
                .await?;
            info!(
                store = %store_id,
                product = %item.product_id,
                from = current,
                to = updated,
                "stock updated"
            );
        }

        self.store
            .update_order_status(&order.order_id, OrderStatus::Confirmed)
            .await?;
        info!(store = %store_id, order = %order.order_id, "order confirmed");

        if let Some(bus) = self.bus.upgrade() {
            let follow_up = Event::inventory_updated(
                store_id.clone(),
                InventoryUpdated {
                    order_id: Some(order.order_id),
                },
            )?;
            bus.publish(follow_up).await;
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler for OrderAgent {
    fn name(&self) -> &str {
        "order_agent"
    }

    async fn handle(&self, event: &Event) -> HandlerResult {
        if let Err(err) = self.process(event).await {
            let order = event
                .payload()
                .get("order_id")
                .and_then(JsonValue::as_str)
                .unwrap_or("-");
            error!(
                store = %event.store_id(),
                order,
                event_id = %event.event_id(),
                error = %err,
                "order agent failed"
            );
            return Err(err.into());
        }
        Ok(())
    }
}
