//! Typed payload contracts for the known event types.
//!
//! | type | required | optional (default) |
//! |------|----------|--------------------|
//! | `order_created` | `order_id` | `items` (`[]`), per item `quantity` (`0`) |
//! | `inventory_updated` | – | `order_id` |
//! | `generate_daily_summary` | – | `date` as `YYYY-MM-DD` (today) |
//!
//! Decoding never panics: a handler calls `from_event` at entry and gets an
//! [`EventError`] naming the offending key.

use chrono::NaiveDate;
use serde_json::{Map, Value as JsonValue, json};

use bazaarops_core::{OrderId, ProductId};

use crate::event::{Event, EventError};
use crate::kinds::EventKind;

/// One line of an `order_created` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub product_id: ProductId,
    /// Loose goods are sold by weight, so quantities are fractional.
    pub quantity: f64,
}

/// Payload of `order_created`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub items: Vec<OrderItem>,
}

/// Payload of `inventory_updated`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InventoryUpdated {
    pub order_id: Option<OrderId>,
}

/// Payload of `generate_daily_summary`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerateDailySummary {
    /// Business day to summarize; `None` means "today" in the store's clock.
    pub date: Option<NaiveDate>,
}

impl OrderCreated {
    pub fn from_event(event: &Event) -> Result<Self, EventError> {
        let payload = event.payload();
        let order_id = required_id::<OrderId>(event, payload, "order_id")?;

        let items = match payload.get("items") {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(raw)) => raw
                .iter()
                .enumerate()
                .map(|(idx, raw)| decode_item(event, idx, raw))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(invalid(event, "items", "expected an array")),
        };

        Ok(Self { order_id, items })
    }

    pub fn into_payload(self) -> Map<String, JsonValue> {
        let items: Vec<JsonValue> = self
            .items
            .into_iter()
            .map(|i| json!({ "product_id": i.product_id, "quantity": i.quantity }))
            .collect();
        to_map(json!({ "order_id": self.order_id, "items": items }))
    }
}

impl InventoryUpdated {
    pub fn from_event(event: &Event) -> Result<Self, EventError> {
        let order_id = optional_id::<OrderId>(event, event.payload(), "order_id")?;
        Ok(Self { order_id })
    }

    pub fn into_payload(self) -> Map<String, JsonValue> {
        match self.order_id {
            Some(id) => to_map(json!({ "order_id": id })),
            None => Map::new(),
        }
    }
}

impl GenerateDailySummary {
    pub fn from_event(event: &Event) -> Result<Self, EventError> {
        let date = match event.payload().get("date") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) => Some(
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|e| invalid(event, "date", &e.to_string()))?,
            ),
            Some(_) => return Err(invalid(event, "date", "expected a YYYY-MM-DD string")),
        };
        Ok(Self { date })
    }

    pub fn into_payload(self) -> Map<String, JsonValue> {
        match self.date {
            Some(d) => to_map(json!({ "date": d.format("%Y-%m-%d").to_string() })),
            None => Map::new(),
        }
    }
}

fn decode_item(event: &Event, idx: usize, raw: &JsonValue) -> Result<OrderItem, EventError> {
    let key = format!("items[{idx}]");
    let obj = raw
        .as_object()
        .ok_or_else(|| invalid(event, &key, "expected an object"))?;

    let product_id = match obj.get("product_id") {
        Some(JsonValue::String(s)) => {
            ProductId::new(s.as_str()).map_err(|e| invalid(event, &key, &e.to_string()))?
        }
        Some(_) => return Err(invalid(event, &key, "product_id must be a string")),
        None => {
            return Err(EventError::MissingKey {
                event_type: event.event_type().to_string(),
                key: format!("{key}.product_id"),
            });
        }
    };

    let quantity = match obj.get("quantity") {
        None | Some(JsonValue::Null) => 0.0,
        Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(0.0),
        // Form posts and query strings deliver numbers as text.
        Some(JsonValue::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(event, &key, "quantity is not a number"))?,
        Some(_) => return Err(invalid(event, &key, "quantity is not a number")),
    };

    if !quantity.is_finite() {
        return Err(invalid(event, &key, "quantity must be finite"));
    }

    Ok(OrderItem {
        product_id,
        quantity,
    })
}

fn required_id<T>(event: &Event, payload: &Map<String, JsonValue>, key: &str) -> Result<T, EventError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    optional_id(event, payload, key)?.ok_or_else(|| EventError::MissingKey {
        event_type: event.event_type().to_string(),
        key: key.to_string(),
    })
}

fn optional_id<T>(
    event: &Event,
    payload: &Map<String, JsonValue>,
    key: &str,
) -> Result<Option<T>, EventError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    match payload.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => s
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(event, key, &e.to_string())),
        Some(_) => Err(invalid(event, key, "expected a string")),
    }
}

fn invalid(event: &Event, key: &str, reason: &str) -> EventError {
    EventError::InvalidKey {
        event_type: event.event_type().to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn to_map(value: JsonValue) -> Map<String, JsonValue> {
    match value {
        JsonValue::Object(map) => map,
        _ => Map::new(),
    }
}

/// Convenience constructors for the events the platform itself emits.
impl Event {
    pub fn order_created(
        store_id: bazaarops_core::StoreId,
        payload: OrderCreated,
    ) -> Result<Self, EventError> {
        Event::new(EventKind::ORDER_CREATED, store_id, payload.into_payload())
    }

    pub fn inventory_updated(
        store_id: bazaarops_core::StoreId,
        payload: InventoryUpdated,
    ) -> Result<Self, EventError> {
        Event::new(EventKind::INVENTORY_UPDATED, store_id, payload.into_payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(payload: JsonValue) -> Event {
        Event::from_parts(EventKind::ORDER_CREATED, "s1", payload).unwrap()
    }

    #[test]
    fn order_created_decodes_items() {
        let e = ev(json!({
            "order_id": "o1",
            "items": [
                { "product_id": "p1", "quantity": 2 },
                { "product_id": "p2", "quantity": "0.5" }
            ]
        }));
        let p = OrderCreated::from_event(&e).unwrap();
        assert_eq!(p.order_id.as_str(), "o1");
        assert_eq!(p.items.len(), 2);
        assert_eq!(p.items[0].quantity, 2.0);
        assert_eq!(p.items[1].quantity, 0.5);
    }

    #[test]
    fn order_created_defaults_missing_optional_keys() {
        let p = OrderCreated::from_event(&ev(json!({ "order_id": "o1" }))).unwrap();
        assert!(p.items.is_empty());

        let p = OrderCreated::from_event(&ev(json!({
            "order_id": "o1",
            "items": [{ "product_id": "p1" }]
        })))
        .unwrap();
        assert_eq!(p.items[0].quantity, 0.0);
    }

    #[test]
    fn order_created_reports_missing_required_keys() {
        let err = OrderCreated::from_event(&ev(json!({ "items": [] }))).unwrap_err();
        assert!(matches!(err, EventError::MissingKey { ref key, .. } if key == "order_id"));

        let err = OrderCreated::from_event(&ev(json!({
            "order_id": "o1",
            "items": [{ "quantity": 1 }]
        })))
        .unwrap_err();
        assert!(matches!(err, EventError::MissingKey { ref key, .. } if key == "items[0].product_id"));
    }

    #[test]
    fn order_created_rejects_wrong_shapes() {
        let err = OrderCreated::from_event(&ev(json!({ "order_id": "o1", "items": "p1" })))
            .unwrap_err();
        assert!(matches!(err, EventError::InvalidKey { .. }));

        let err = OrderCreated::from_event(&ev(json!({
            "order_id": "o1",
            "items": [{ "product_id": "p1", "quantity": "lots" }]
        })))
        .unwrap_err();
        assert!(matches!(err, EventError::InvalidKey { .. }));
    }

    #[test]
    fn order_created_payload_decodes_back() {
        let payload = OrderCreated {
            order_id: OrderId::new("o9").unwrap(),
            items: vec![OrderItem {
                product_id: ProductId::new("p1").unwrap(),
                quantity: 3.0,
            }],
        };
        let e = Event::order_created(bazaarops_core::StoreId::new("s1").unwrap(), payload.clone())
            .unwrap();
        assert_eq!(OrderCreated::from_event(&e).unwrap(), payload);
    }

    #[test]
    fn summary_date_is_optional() {
        let e = Event::from_parts(EventKind::GENERATE_DAILY_SUMMARY, "s1", json!({})).unwrap();
        assert_eq!(GenerateDailySummary::from_event(&e).unwrap().date, None);

        let e = Event::from_parts(
            EventKind::GENERATE_DAILY_SUMMARY,
            "s1",
            json!({ "date": "2024-03-01" }),
        )
        .unwrap();
        assert_eq!(
            GenerateDailySummary::from_event(&e).unwrap().date,
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );

        let e = Event::from_parts(
            EventKind::GENERATE_DAILY_SUMMARY,
            "s1",
            json!({ "date": "yesterday" }),
        )
        .unwrap();
        assert!(GenerateDailySummary::from_event(&e).is_err());
    }

    #[test]
    fn inventory_updated_order_id_is_optional() {
        let e = Event::from_parts(EventKind::INVENTORY_UPDATED, "s1", json!({})).unwrap();
        assert_eq!(InventoryUpdated::from_event(&e).unwrap(), InventoryUpdated::default());
    }
}
