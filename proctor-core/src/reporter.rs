//! Event reporter — best-effort delivery of integrity telemetry.
//!
//! Every event is forwarded to the backend collector keyed by the attempt
//! id. Delivery is fire-and-forget: the call never blocks a timer tick or a
//! UI update, and a transport failure is logged and dropped. Telemetry loss
//! is an accepted tradeoff against ever disrupting the candidate's attempt.

use crate::config::ReporterConfig;
use crate::event::IntegrityEvent;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// An asynchronous, best-effort sink for integrity events.
///
/// Implementations must not block and must not surface transport errors to
/// the caller.
pub trait EventSink: Send + Sync {
    fn report(&self, attempt_id: &str, event: &IntegrityEvent);
}

// ── HTTP collector sink ─────────────────────────────────────────────────────

/// POSTs each event to `{collector_url}/attempts/{attempt_id}/events` on a
/// spawned task. No retry, no backoff, no batching.
pub struct HttpEventSink {
    client: reqwest::Client,
    collector_url: String,
    request_timeout: Duration,
    user_agent: String,
}

impl HttpEventSink {
    pub fn new(config: &ReporterConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            collector_url: config.collector_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            user_agent: config.user_agent.clone(),
        }
    }

    fn endpoint(&self, attempt_id: &str) -> String {
        format!("{}/attempts/{}/events", self.collector_url, attempt_id)
    }

    fn payload(&self, event: &IntegrityEvent) -> serde_json::Value {
        let mut details = event.details.clone();
        details.insert("timestamp".into(), event.timestamp_ms.to_string());
        details.insert("user_agent".into(), self.user_agent.clone());
        serde_json::json!({
            "event_type": event.kind.wire_name(),
            "details": details,
        })
    }
}

impl EventSink for HttpEventSink {
    fn report(&self, attempt_id: &str, event: &IntegrityEvent) {
        let url = self.endpoint(attempt_id);
        let payload = self.payload(event);
        let client = self.client.clone();
        let timeout = self.request_timeout;

        // Without a runtime there is nowhere to deliver from; drop the event
        // rather than fail the caller.
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(url = %url, "No async runtime available, integrity event dropped");
                return;
            }
        };

        handle.spawn(async move {
            match client.post(&url).json(&payload).timeout(timeout).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!(url = %url, "Integrity event delivered");
                }
                Ok(resp) => warn!(status = %resp.status(), url = %url, "Collector response not OK"),
                Err(e) => warn!(error = %e, url = %url, "Integrity event delivery failed"),
            }
        });
    }
}

// ── Test / inert sinks ──────────────────────────────────────────────────────

/// Records every reported event in memory. Test support.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<(String, IntegrityEvent)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(String, IntegrityEvent)> {
        self.records.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.records.lock().len()
    }
}

impl EventSink for MemorySink {
    fn report(&self, attempt_id: &str, event: &IntegrityEvent) {
        self.records
            .lock()
            .push((attempt_id.to_string(), event.clone()));
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn report(&self, _attempt_id: &str, _event: &IntegrityEvent) {}
}
