use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use bazaarops_infra::scheduler::JobRunReport;

// -------------------------
// Request DTOs
// -------------------------

/// Query string accepted by both trigger routes.
#[derive(Debug, Default, Deserialize)]
pub struct TriggerQuery {
    pub event_type: Option<String>,
    pub store_id: Option<String>,
    /// JSON text; GET only.
    pub payload: Option<String>,
}

/// JSON body form of `POST /api/events/trigger`.
#[derive(Debug, Default, Deserialize)]
pub struct TriggerBody {
    pub event_type: Option<String>,
    pub store_id: Option<String>,
    pub payload: Option<JsonValue>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub success: bool,
    pub event_type: String,
    pub message: &'static str,
}

impl TriggerResponse {
    pub fn accepted(event_type: String) -> Self {
        Self {
            success: true,
            event_type,
            message: "Event triggered",
        }
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<String>,
}

impl ServiceInfo {
    pub fn new(service: &'static str) -> Self {
        Self {
            service,
            status: "running",
            agents: Vec::new(),
            jobs: Vec::new(),
        }
    }

    pub fn with_agents<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.agents = agents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_jobs<I, S>(mut self, jobs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.jobs = jobs.into_iter().map(Into::into).collect();
        self
    }
}

/// Body of `POST /jobs/{name}/run`.
#[derive(Debug, Serialize)]
pub struct JobRunResponse {
    pub job: String,
    pub trigger: String,
    pub completed: Vec<String>,
    pub not_completed: Vec<StoreReason>,
    pub failed: Vec<StoreReason>,
    pub skipped_without_channel: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StoreReason {
    pub store_id: String,
    pub reason: String,
}

impl From<JobRunReport> for JobRunResponse {
    fn from(report: JobRunReport) -> Self {
        Self {
            job: report.job,
            trigger: report.trigger.to_string(),
            completed: report.completed.into_iter().map(String::from).collect(),
            not_completed: report
                .not_completed
                .into_iter()
                .map(|(store_id, reason)| StoreReason {
                    store_id: store_id.into(),
                    reason,
                })
                .collect(),
            failed: report
                .failed
                .into_iter()
                .map(|f| StoreReason {
                    store_id: f.store_id.into(),
                    reason: f.kind.to_string(),
                })
                .collect(),
            skipped_without_channel: report
                .skipped_without_channel
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
