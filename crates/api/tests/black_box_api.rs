use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::StatusCode;
use serde_json::{Value as JsonValue, json};

use bazaarops_ai::InMemorySummarizer;
use bazaarops_api::app::{ServiceInfo, build_app, scheduler_app};
use bazaarops_core::{OrderId, ProductId, StoreId};
use bazaarops_events::EventBus;
use bazaarops_infra::scheduler::{ManualClock, ScheduledJob, SchedulerSettings};
use bazaarops_infra::{
    AgentDeps, AgentError, DailyScheduler, InMemoryRetailStore, RoutineOutcome, StoreRoutine,
    register_agents,
};
use bazaarops_inventory::StockLevel;
use bazaarops_parties::StoreProfile;
use bazaarops_sales::{OrderRecord, OrderStatus};

struct TestServer {
    base_url: String,
    store: Arc<InMemoryRetailStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let placed = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
        let store = ["o1", "o2", "o3"].into_iter().fold(
            InMemoryRetailStore::new().with_stock(StockLevel::new(sid(), pid("p1"), "Atta", 10.0)),
            |store, id| {
                store.with_order(OrderRecord::new(
                    OrderId::new(id).unwrap(),
                    sid(),
                    OrderStatus::Pending,
                    100.0,
                    placed,
                ))
            },
        );
        let store = Arc::new(store);
        let bus = Arc::new(EventBus::new());
        register_agents(
            &bus,
            &AgentDeps {
                store: store.clone(),
                summarizer: Arc::new(InMemorySummarizer::replying("Aaj ka din accha raha.")),
                clock: Arc::new(ManualClock::new(
                    NaiveDate::from_ymd_opt(2026, 6, 1)
                        .unwrap()
                        .and_hms_opt(21, 0, 0)
                        .unwrap(),
                )),
            },
        );

        // Same router as prod, bound to an ephemeral port.
        let app = build_app(
            bus,
            ServiceInfo::new("agent-service").with_agents(["order_agent", "summary_agent"]),
        );
        Self::serve(app, store).await
    }

    async fn serve(app: axum::Router, store: Arc<InMemoryRetailStore>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Dispatch is fire-and-forget, so poll until the handler has run.
    async fn quantity_eventually(&self, expected: f64) {
        for _ in 0..100 {
            if self.store.quantity(&sid(), &pid("p1")) == Some(expected) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "stock did not reach {expected}, got {:?}",
            self.store.quantity(&sid(), &pid("p1"))
        );
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn sid() -> StoreId {
    StoreId::new("s1").unwrap()
}

fn pid(p: &str) -> ProductId {
    ProductId::new(p).unwrap()
}

#[tokio::test]
async fn root_and_health_respond() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["service"], "agent-service");
    assert_eq!(body["status"], "running");
    assert_eq!(body["agents"], json!(["order_agent", "summary_agent"]));
    assert!(body.get("jobs").is_none());

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn post_with_json_body_triggers_the_order_agent() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/events/trigger"))
        .json(&json!({
            "event_type": "order_created",
            "store_id": "s1",
            "payload": { "order_id": "o1", "items": [{ "product_id": "p1", "quantity": 2 }] }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "success": true, "event_type": "order_created", "message": "Event triggered" })
    );
    srv.quantity_eventually(8.0).await;
    for _ in 0..100 {
        if srv.store.order_status(&OrderId::new("o1").unwrap()) == Some(OrderStatus::Confirmed) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("order o1 was not confirmed");
}

#[tokio::test]
async fn post_with_query_takes_the_body_as_payload() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/events/trigger?event_type=order_created&store_id=s1"))
        .json(&json!({ "order_id": "o2", "items": [{ "product_id": "p1", "quantity": 3 }] }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    srv.quantity_eventually(7.0).await;
}

#[tokio::test]
async fn get_trigger_parses_the_payload_parameter() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/api/events/trigger"))
        .query(&[
            ("event_type", "order_created"),
            ("store_id", "s1"),
            ("payload", r#"{"order_id":"o3","items":[{"product_id":"p1","quantity":1.5}]}"#),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    srv.quantity_eventually(8.5).await;
}

#[tokio::test]
async fn get_trigger_with_invalid_payload_uses_empty_object() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/api/events/trigger"))
        .query(&[
            ("event_type", "generate_daily_summary"),
            ("store_id", "s1"),
            ("payload", "{not json"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["event_type"], "generate_daily_summary");

    for _ in 0..100 {
        if !srv.store.summaries().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let summaries = srv.store.summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].date, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
}

#[tokio::test]
async fn unknown_event_type_is_accepted_and_ignored() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/api/events/trigger?event_type=customer_waved&store_id=s1"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(srv.store.quantity(&sid(), &pid("p1")), Some(10.0));
}

#[tokio::test]
async fn blank_event_type_or_store_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/events/trigger"))
        .json(&json!({ "event_type": "  ", "store_id": "s1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = client
        .get(srv.url("/api/events/trigger?event_type=order_created"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/api/events/trigger"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_post_bodies_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/events/trigger"))
        .header("content-type", "application/json")
        .body("{oops")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");

    let res = client
        .post(srv.url("/api/events/trigger?event_type=order_created&store_id=s1"))
        .json(&json!(["not", "an", "object"]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_payload");
}

#[tokio::test]
async fn scheduler_app_lists_jobs() {
    let (app, store) = scheduler_fixture();
    let srv = TestServer::serve(app, store).await;
    let client = reqwest::Client::new();

    let body: JsonValue = client
        .get(srv.url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["service"], "scheduler");
    assert_eq!(body["jobs"], json!(["21:00 daily_report"]));
    assert!(body.get("agents").is_none());

    let res = client.get(srv.url("/api/events/trigger")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

/// Completes for every store it is given.
struct AlwaysCompletes;

#[async_trait]
impl StoreRoutine for AlwaysCompletes {
    fn name(&self) -> &str {
        "daily_report"
    }

    async fn run(&self, _store: &StoreProfile) -> Result<RoutineOutcome, AgentError> {
        Ok(RoutineOutcome::Completed)
    }
}

fn scheduler_fixture() -> (axum::Router, Arc<InMemoryRetailStore>) {
    let store = Arc::new(
        InMemoryRetailStore::new()
            .with_store(StoreProfile::new(sid(), "Sharma Kirana").with_channel("111"))
            .with_store(StoreProfile::new(StoreId::new("s2").unwrap(), "Gupta General")),
    );
    let clock = Arc::new(ManualClock::new(
        NaiveDate::from_ymd_opt(2026, 6, 1)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap(),
    ));
    let job = ScheduledJob::new("21:00".parse().unwrap(), Arc::new(AlwaysCompletes))
        .with_store_delay(Duration::ZERO);
    let scheduler = DailyScheduler::new(store.clone(), clock, SchedulerSettings::default()).with_job(job);
    let app = scheduler_app(
        ServiceInfo::new("scheduler").with_jobs(["21:00 daily_report"]),
        Arc::new(scheduler),
    );
    (app, store)
}

#[tokio::test]
async fn manual_job_run_returns_the_report() {
    let (app, store) = scheduler_fixture();
    let srv = TestServer::serve(app, store).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/jobs/daily_report/run"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["job"], "daily_report");
    assert_eq!(body["trigger"], "2026-06-01 15:30:00");
    assert_eq!(body["completed"], json!(["s1"]));
    assert_eq!(body["skipped_without_channel"], json!(["s2"]));
    assert_eq!(body["failed"], json!([]));
}

#[tokio::test]
async fn manual_run_of_unknown_job_is_not_found() {
    let (app, store) = scheduler_fixture();
    let srv = TestServer::serve(app, store).await;

    let res = reqwest::Client::new()
        .post(srv.url("/jobs/weekly_report/run"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body["error"], "unknown_job");
}
