use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;

use bazaarops_ai::InMemorySummarizer;
use bazaarops_core::{OrderId, ProductId, StoreId};
use bazaarops_events::{Event, EventBus, EventKind, InventoryUpdated, handler_fn, trigger_event};
use bazaarops_inventory::StockLevel;
use bazaarops_sales::{OrderRecord, OrderStatus};

use super::*;
use crate::scheduler::ManualClock;
use crate::store::InMemoryRetailStore;

fn sid() -> StoreId {
    StoreId::new("s1").unwrap()
}

fn pid(p: &str) -> ProductId {
    ProductId::new(p).unwrap()
}

fn oid(o: &str) -> OrderId {
    OrderId::new(o).unwrap()
}

/// Collects formatted log lines for the current thread.
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        (capture, tracing::subscriber::set_default(subscriber))
    }

    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn seeded_store() -> Arc<InMemoryRetailStore> {
    let placed = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
    Arc::new(
        InMemoryRetailStore::new()
            .with_stock(StockLevel::new(sid(), pid("p1"), "Atta", 10.0))
            .with_stock(StockLevel::new(sid(), pid("p2"), "Rice", 5.0))
            .with_order(OrderRecord::new(oid("o1"), sid(), OrderStatus::Pending, 120.0, placed)),
    )
}

fn deps(store: Arc<InMemoryRetailStore>, summarizer: Arc<InMemorySummarizer>) -> AgentDeps {
    AgentDeps {
        store,
        summarizer,
        clock: Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2026, 6, 1)
                .unwrap()
                .and_hms_opt(21, 0, 0)
                .unwrap(),
        )),
    }
}

fn order_event(payload: serde_json::Value) -> Event {
    Event::from_parts(EventKind::ORDER_CREATED, "s1", payload).unwrap()
}

#[tokio::test]
async fn order_agent_runs_before_later_subscribers() {
    let store = seeded_store();
    let bus = Arc::new(EventBus::new());
    register_agents(&bus, &deps(store.clone(), Arc::new(InMemorySummarizer::replying("ok"))));

    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = seen.clone();
        let store = store.clone();
        bus.subscribe(
            EventKind::ORDER_CREATED,
            handler_fn("h2", move |_event: Event| {
                let seen = seen.clone();
                let store = store.clone();
                async move {
                    seen.lock().unwrap().push(store.quantity(&sid(), &pid("p1")));
                    Ok(())
                }
            }),
        );
    }

    let report = bus
        .publish(order_event(json!({
            "order_id": "o1",
            "items": [{"product_id": "p1", "quantity": 2}]
        })))
        .await;

    assert!(report.is_clean());
    assert_eq!(report.handlers_invoked, 2);
    assert_eq!(store.quantity(&sid(), &pid("p1")), Some(8.0));
    assert_eq!(*seen.lock().unwrap(), vec![Some(8.0)]);
    assert_eq!(store.order_status(&oid("o1")), Some(OrderStatus::Confirmed));
}

#[tokio::test]
async fn same_order_published_twice_decrements_twice() {
    let store = seeded_store();
    let bus = Arc::new(EventBus::new());
    register_agents(&bus, &deps(store.clone(), Arc::new(InMemorySummarizer::replying("ok"))));

    let payload = json!({"order_id": "o1", "items": [{"product_id": "p1", "quantity": 2}]});
    bus.publish(order_event(payload.clone())).await;
    bus.publish(order_event(payload)).await;

    assert_eq!(store.quantity(&sid(), &pid("p1")), Some(6.0));
}

#[tokio::test]
async fn stock_may_go_negative_and_unknown_products_are_skipped() {
    let store = seeded_store();
    let bus = Arc::new(EventBus::new());
    register_agents(&bus, &deps(store.clone(), Arc::new(InMemorySummarizer::replying("ok"))));

    let report = bus
        .publish(order_event(json!({
            "order_id": "o1",
            "items": [
                {"product_id": "ghost", "quantity": 1},
                {"product_id": "p2", "quantity": "7.5"}
            ]
        })))
        .await;

    assert!(report.is_clean());
    assert_eq!(store.quantity(&sid(), &pid("p2")), Some(-2.5));
    assert_eq!(store.quantity(&sid(), &pid("ghost")), None);
    assert_eq!(store.order_status(&oid("o1")), Some(OrderStatus::Confirmed));
}

#[tokio::test]
async fn order_agent_announces_inventory_update() {
    let store = seeded_store();
    let bus = Arc::new(EventBus::new());
    register_agents(&bus, &deps(store, Arc::new(InMemorySummarizer::replying("ok"))));

    let updates = Arc::new(Mutex::new(Vec::new()));
    {
        let updates = updates.clone();
        bus.subscribe(
            EventKind::INVENTORY_UPDATED,
            handler_fn("watch", move |event: Event| {
                let updates = updates.clone();
                async move {
                    let payload = InventoryUpdated::from_event(&event)?;
                    updates.lock().unwrap().push(payload.order_id);
                    Ok(())
                }
            }),
        );
    }

    bus.publish(order_event(json!({"order_id": "o1", "items": []}))).await;

    assert_eq!(*updates.lock().unwrap(), vec![Some(oid("o1"))]);
}

#[tokio::test]
async fn malformed_order_is_reported_and_changes_nothing() {
    let store = seeded_store();
    let bus = Arc::new(EventBus::new());
    register_agents(&bus, &deps(store.clone(), Arc::new(InMemorySummarizer::replying("ok"))));

    let report = bus
        .publish(order_event(json!({"items": [{"product_id": "p1", "quantity": 2}]})))
        .await;

    assert_eq!(report.handlers_failed, 1);
    assert_eq!(store.quantity(&sid(), &pid("p1")), Some(10.0));
    assert_eq!(store.order_status(&oid("o1")), Some(OrderStatus::Pending));
}

#[tokio::test]
async fn store_outage_fails_the_handler_not_the_publish() {
    let store = seeded_store();
    let bus = Arc::new(EventBus::new());
    register_agents(&bus, &deps(store.clone(), Arc::new(InMemorySummarizer::replying("ok"))));
    store.set_unavailable(true);

    let report = trigger_event(
        &bus,
        EventKind::ORDER_CREATED,
        "s1",
        json!({"order_id": "o1", "items": [{"product_id": "p1", "quantity": 1}]}),
    )
    .await
    .unwrap();

    assert_eq!(report.handlers_invoked, 1);
    assert_eq!(report.handlers_failed, 1);
}

#[tokio::test]
async fn summary_agent_inserts_a_record_per_request() {
    let store = seeded_store();
    let summarizer = Arc::new(InMemorySummarizer::replying("Aaj bikri achhi rahi."));
    let bus = Arc::new(EventBus::new());
    register_agents(&bus, &deps(store.clone(), summarizer.clone()));

    bus.publish(Event::from_parts(EventKind::GENERATE_DAILY_SUMMARY, "s1", json!({})).unwrap())
        .await;
    bus.publish(
        Event::from_parts(EventKind::GENERATE_DAILY_SUMMARY, "s1", json!({"date": "2026-05-31"})).unwrap(),
    )
    .await;

    let summaries = store.summaries();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].date, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
    assert_eq!(summaries[0].summary, "Aaj bikri achhi rahi.");
    assert_eq!(summaries[0].metrics.order_count, 1);
    assert_eq!(summaries[0].metrics.low_stock, vec!["Rice".to_string()]);
    assert_eq!(summaries[1].date, NaiveDate::from_ymd_opt(2026, 5, 31).unwrap());
    assert_eq!(summaries[1].metrics.order_count, 0);

    assert!(summarizer.prompts()[0].contains("- Revenue: ₹120"));
}

#[tokio::test]
async fn summarizer_failure_stores_nothing() {
    let store = seeded_store();
    let summarizer = Arc::new(InMemorySummarizer::failing(bazaarops_ai::AiError::Timeout));
    let bus = Arc::new(EventBus::new());
    register_agents(&bus, &deps(store.clone(), summarizer));

    let report = bus
        .publish(Event::from_parts(EventKind::GENERATE_DAILY_SUMMARY, "s1", json!(null)).unwrap())
        .await;

    assert_eq!(report.handlers_failed, 1);
    assert!(store.summaries().is_empty());
}

#[tokio::test]
async fn order_agent_logs_its_own_failure() {
    let (logs, _guard) = LogCapture::install();
    let store = seeded_store();
    let bus = Arc::new(EventBus::new());
    register_agents(&bus, &deps(store.clone(), Arc::new(InMemorySummarizer::replying("ok"))));
    store.set_unavailable(true);

    bus.publish(order_event(json!({"order_id": "o1", "items": [{"product_id": "p1", "quantity": 1}]})))
        .await;

    let lines = logs.lines();
    let agent_line = lines
        .iter()
        .find(|l| l.contains("order agent failed"))
        .expect("agent-level error line");
    assert!(agent_line.contains("ERROR"));
    assert!(agent_line.contains("s1"));
    assert!(agent_line.contains("o1"));
}

#[tokio::test]
async fn summary_agent_logs_its_own_failure() {
    let (logs, _guard) = LogCapture::install();
    let store = seeded_store();
    let bus = Arc::new(EventBus::new());
    register_agents(
        &bus,
        &deps(store.clone(), Arc::new(InMemorySummarizer::failing(bazaarops_ai::AiError::Timeout))),
    );

    bus.publish(Event::from_parts(EventKind::GENERATE_DAILY_SUMMARY, "s1", json!({})).unwrap())
        .await;

    let lines = logs.lines();
    assert!(
        lines
            .iter()
            .any(|l| l.contains("ERROR") && l.contains("summary agent failed") && l.contains("timed out"))
    );
}
