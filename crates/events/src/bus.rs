//! In-process publish/subscribe router.
//!
//! The bus maps an event type to the ordered list of handlers subscribed to it.
//!
//! ## Dispatch semantics
//!
//! - **Sequential, in subscription order**: `publish` awaits each handler before
//!   starting the next, so handlers with side-effect ordering dependencies
//!   (decrement stock, then confirm the order) behave deterministically.
//! - **Failure isolation**: an `Err` or a panic from one handler is logged and
//!   counted; the remaining handlers still run and `publish` itself never fails.
//! - **No retry, no persistence**: a failed handler's effects are simply not
//!   applied. Events with zero subscribers are a silent no-op.
//! - **Re-entrant publish is depth-first**: a handler that publishes through a
//!   shared bus sees the nested event fully dispatched before its own `publish`
//!   call returns, and therefore before the outer dispatch moves on.
//! - **Snapshot per publish**: the handler list is copied when `publish` starts;
//!   subscribe/unsubscribe during a dispatch affects the next publish only.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use futures_util::FutureExt;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use crate::event::{Event, EventError};
use crate::handler::EventHandler;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl core::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// What happened during one `publish` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub event_type: String,
    pub handlers_invoked: usize,
    pub handlers_failed: usize,
}

impl PublishReport {
    /// True when every invoked handler returned `Ok`.
    pub fn is_clean(&self) -> bool {
        self.handlers_failed == 0
    }
}

#[derive(Clone)]
struct Registration {
    id: SubscriptionId,
    handler: Arc<dyn EventHandler>,
}

/// Explicitly constructed event bus.
///
/// Create one at process start and share it (`Arc<EventBus>`) with the
/// components that publish or subscribe. Tests build as many independent
/// instances as they like.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<String, Vec<Registration>>>,
    next_id: AtomicU64,
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let subs = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
        let counts: HashMap<&str, usize> = subs.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("EventBus").field("subscribers", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event_type`.
    ///
    /// No uniqueness check: registering the same handler twice makes it run
    /// twice per event.
    pub fn subscribe<H>(&self, event_type: impl Into<String>, handler: H) -> SubscriptionId
    where
        H: EventHandler,
    {
        self.subscribe_shared(event_type, Arc::new(handler))
    }

    /// Register an already shared handler.
    pub fn subscribe_shared(
        &self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> SubscriptionId {
        let event_type = event_type.into();
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        debug!(event_type = %event_type, handler = handler.name(), subscription = %id, "subscribed");

        // A poisoned lock only means a previous writer panicked mid-push; the
        // map itself is still usable.
        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subs.entry(event_type)
            .or_default()
            .push(Registration { id, handler });

        id
    }

    /// Remove one registration. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());

        let mut removed = false;
        for regs in subs.values_mut() {
            if let Some(pos) = regs.iter().position(|r| r.id == id) {
                regs.remove(pos);
                removed = true;
                break;
            }
        }
        subs.retain(|_, regs| !regs.is_empty());

        removed
    }

    /// Number of handlers currently registered for `event_type`.
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        let subs = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
        subs.get(event_type).map_or(0, Vec::len)
    }

    /// Dispatch `event` to its handlers, one after another.
    ///
    /// Never fails; see the module docs for the exact semantics.
    pub async fn publish(&self, event: Event) -> PublishReport {
        let handlers = self.snapshot(event.event_type());
        let mut report = PublishReport {
            event_type: event.event_type().to_string(),
            handlers_invoked: 0,
            handlers_failed: 0,
        };

        if handlers.is_empty() {
            debug!(
                event_type = event.event_type(),
                store = %event.store_id(),
                "no subscribers for event"
            );
            return report;
        }

        info!(
            event_id = %event.event_id(),
            event_type = event.event_type(),
            store = %event.store_id(),
            handlers = handlers.len(),
            "publishing event"
        );

        for reg in handlers {
            report.handlers_invoked += 1;

            let outcome = AssertUnwindSafe(reg.handler.handle(&event))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    report.handlers_failed += 1;
                    warn!(
                        event_id = %event.event_id(),
                        event_type = event.event_type(),
                        store = %event.store_id(),
                        handler = reg.handler.name(),
                        error = %format!("{e:#}"),
                        "event handler failed"
                    );
                }
                Err(panic) => {
                    report.handlers_failed += 1;
                    error!(
                        event_id = %event.event_id(),
                        event_type = event.event_type(),
                        store = %event.store_id(),
                        handler = reg.handler.name(),
                        panic = panic_message(panic.as_ref()),
                        "event handler panicked"
                    );
                }
            }
        }

        report
    }

    fn snapshot(&self, event_type: &str) -> Vec<Registration> {
        let subs = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
        subs.get(event_type).cloned().unwrap_or_default()
    }
}

/// Build an event from loose parts and publish it.
///
/// This is the manual/admin entry point: the HTTP trigger endpoint and the
/// scheduled `daily_summary` job go through the same pipeline as organic events.
pub async fn trigger_event(
    bus: &EventBus,
    event_type: &str,
    store_id: &str,
    payload: JsonValue,
) -> Result<PublishReport, EventError> {
    let event = Event::from_parts(event_type, store_id, payload)?;
    Ok(bus.publish(event).await)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use serde_json::json;

    use super::*;
    use crate::handler::{HandlerResult, handler_fn};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, label: &'static str) -> impl EventHandler {
        let log = log.clone();
        handler_fn(label, move |event: Event| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(format!("{label}:{}", event.event_type()));
                Ok(())
            }
        })
    }

    struct Panics;

    #[async_trait::async_trait]
    impl EventHandler for Panics {
        async fn handle(&self, _event: &Event) -> HandlerResult {
            panic!("payload was not what I expected");
        }
    }

    fn event(kind: &str) -> Event {
        Event::from_parts(kind, "s1", json!({})).unwrap()
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new();
        let report = bus.publish(event("nobody_listens")).await;

        assert_eq!(report.handlers_invoked, 0);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn handlers_run_once_each_in_registration_order() {
        let bus = EventBus::new();
        let log: Log = Arc::default();
        bus.subscribe("order_created", recorder(&log, "h1"));
        bus.subscribe("order_created", recorder(&log, "h2"));
        bus.subscribe("order_created", recorder(&log, "h3"));
        bus.subscribe("other", recorder(&log, "x"));

        let report = bus.publish(event("order_created")).await;

        assert_eq!(report.handlers_invoked, 3);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["h1:order_created", "h2:order_created", "h3:order_created"]
        );
    }

    #[tokio::test]
    async fn duplicate_registrations_run_twice() {
        let bus = EventBus::new();
        let log: Log = Arc::default();
        let shared: Arc<dyn EventHandler> = Arc::new(recorder(&log, "dup"));
        bus.subscribe_shared("order_created", shared.clone());
        bus.subscribe_shared("order_created", shared);

        bus.publish(event("order_created")).await;

        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failing_handler_does_not_stop_the_next() {
        let bus = EventBus::new();
        let log: Log = Arc::default();
        bus.subscribe(
            "order_created",
            handler_fn("broken", |_event: Event| async { Err(anyhow!("store unreachable")) }),
        );
        bus.subscribe("order_created", recorder(&log, "after"));

        let report = bus.publish(event("order_created")).await;

        assert_eq!(report.handlers_invoked, 2);
        assert_eq!(report.handlers_failed, 1);
        assert_eq!(*log.lock().unwrap(), vec!["after:order_created"]);
    }

    #[tokio::test]
    async fn panicking_handler_is_contained() {
        let bus = EventBus::new();
        let log: Log = Arc::default();
        bus.subscribe("order_created", Panics);
        bus.subscribe("order_created", recorder(&log, "after"));

        let report = bus.publish(event("order_created")).await;

        assert_eq!(report.handlers_failed, 1);
        assert_eq!(*log.lock().unwrap(), vec!["after:order_created"]);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let log: Log = Arc::default();
        let first = bus.subscribe("order_created", recorder(&log, "h1"));
        bus.subscribe("order_created", recorder(&log, "h2"));

        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        assert_eq!(bus.subscriber_count("order_created"), 1);

        bus.publish(event("order_created")).await;
        assert_eq!(*log.lock().unwrap(), vec!["h2:order_created"]);
    }

    #[tokio::test]
    async fn nested_publish_completes_before_outer_continues() {
        let bus = Arc::new(EventBus::new());
        let log: Log = Arc::default();

        let inner_bus = bus.clone();
        let inner_log = log.clone();
        bus.subscribe(
            "order_created",
            handler_fn("republisher", move |event: Event| {
                let bus = inner_bus.clone();
                let log = inner_log.clone();
                async move {
                    log.lock().unwrap().push("outer-1:start".to_string());
                    let follow_up =
                        Event::from_parts("inventory_updated", event.store_id().as_str(), json!({}))?;
                    bus.publish(follow_up).await;
                    log.lock().unwrap().push("outer-1:end".to_string());
                    Ok(())
                }
            }),
        );
        bus.subscribe("order_created", recorder(&log, "outer-2"));
        bus.subscribe("inventory_updated", recorder(&log, "inner"));

        bus.publish(event("order_created")).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "outer-1:start",
                "inner:inventory_updated",
                "outer-1:end",
                "outer-2:order_created",
            ]
        );
    }

    #[tokio::test]
    async fn trigger_event_rejects_blank_store() {
        let bus = EventBus::new();
        let err = trigger_event(&bus, "order_created", " ", json!({})).await.unwrap_err();
        assert_eq!(err, EventError::EmptyStoreId);
    }
}
