//! Attempt supervisor — wires the countdown engine, integrity monitor, and
//! reporter together for one attempt at a time.
//!
//! The supervisor owns the 1 Hz ticker task that drives the engine and the
//! attempt lifecycle: expiry or an explicit end stops the ticker and
//! disarms the monitor.

use parking_lot::RwLock;
use proctor_core::{Clock, EventSink, ProctorConfig, ProctorError, ProctorResult};
use proctor_session::{
    format_clock, CountdownEngine, IntegrityMonitor, MonitorReport, SeverityBand, SignalSource,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Point-in-time view of the supervised attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptStatus {
    pub attempt_id: Option<String>,
    pub running: bool,
    pub remaining_seconds: u32,
    pub band: SeverityBand,
    pub display: String,
    pub expired: bool,
    pub monitor: MonitorReport,
}

pub struct AttemptSupervisor {
    engine: Arc<CountdownEngine>,
    monitor: Arc<IntegrityMonitor>,
    running: Arc<AtomicBool>,
    attempt_id: RwLock<Option<String>>,
}

impl AttemptSupervisor {
    pub fn new(config: &ProctorConfig, clock: Arc<dyn Clock>, sink: Arc<dyn EventSink>) -> Self {
        let engine = Arc::new(CountdownEngine::new(config.timer.clone()));
        let monitor = Arc::new(IntegrityMonitor::new(
            config.monitor.clone(),
            clock,
            sink,
        ));
        let running = Arc::new(AtomicBool::new(false));

        // Expiry ends the attempt: the ticker loop observes the flag and the
        // monitor is disarmed along with it.
        let expiry_running = running.clone();
        let expiry_monitor = monitor.clone();
        engine.on_expired(Arc::new(move || {
            expiry_running.store(false, Ordering::Relaxed);
            expiry_monitor.disable();
        }));

        Self {
            engine,
            monitor,
            running,
            attempt_id: RwLock::new(None),
        }
    }

    /// Register a host signal source with the integrity monitor.
    pub fn attach(&self, source: Arc<dyn SignalSource>) {
        self.monitor.attach(source);
    }

    /// Start proctoring one attempt: arm the monitor, start the countdown,
    /// and spawn the 1 Hz ticker. Must be called from within a tokio
    /// runtime.
    pub fn begin_attempt(&self, attempt_id: &str, duration_secs: u32) -> ProctorResult<()> {
        if self.running.swap(true, Ordering::Relaxed) {
            return Err(ProctorError::AttemptActive(
                self.attempt_id
                    .read()
                    .clone()
                    .unwrap_or_else(|| "unknown".into()),
            ));
        }
        *self.attempt_id.write() = Some(attempt_id.to_string());

        info!(attempt_id, duration_secs, "Attempt started");
        self.monitor.enable(attempt_id);
        self.engine.start(duration_secs);

        // A zero-length attempt expired inside start; nothing to drive.
        if self.engine.is_running() {
            let engine = self.engine.clone();
            let running = self.running.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_secs(1));
                // The first interval tick completes immediately; consume it
                // so the countdown only decrements on elapsed seconds.
                ticker.tick().await;
                while running.load(Ordering::Relaxed) && engine.is_running() {
                    ticker.tick().await;
                    engine.tick();
                }
            });
        } else {
            self.running.store(false, Ordering::Relaxed);
        }
        Ok(())
    }

    /// End the attempt (submission, abandonment, or operator action): stop
    /// the ticker and the engine, disarm the monitor. Idempotent.
    pub fn end_attempt(&self) {
        let was_running = self.running.swap(false, Ordering::Relaxed);
        self.engine.stop();
        self.monitor.disable();
        if was_running {
            info!(
                remaining = self.engine.remaining_seconds(),
                "Attempt ended"
            );
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> AttemptStatus {
        let remaining = self.engine.remaining_seconds();
        AttemptStatus {
            attempt_id: self.attempt_id.read().clone(),
            running: self.is_running(),
            remaining_seconds: remaining,
            band: self.engine.severity_band(remaining),
            display: format_clock(remaining),
            expired: self.engine.is_expired(),
            monitor: self.monitor.report(),
        }
    }

    /// The countdown engine, for callback registration.
    pub fn engine(&self) -> &Arc<CountdownEngine> {
        &self.engine
    }

    /// The integrity monitor, for callback registration.
    pub fn monitor(&self) -> &Arc<IntegrityMonitor> {
        &self.monitor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::{ManualClock, MemorySink};

    fn supervisor() -> AttemptSupervisor {
        let config = ProctorConfig::default();
        AttemptSupervisor::new(
            &config,
            Arc::new(ManualClock::new(1_000_000)),
            Arc::new(MemorySink::new()),
        )
    }

    #[tokio::test]
    async fn test_double_begin_is_rejected() {
        let sup = supervisor();
        sup.begin_attempt("att-1", 600).unwrap();
        let err = sup.begin_attempt("att-2", 600).unwrap_err();
        assert!(matches!(err, ProctorError::AttemptActive(id) if id == "att-1"));
        sup.end_attempt();
    }

    #[tokio::test]
    async fn test_end_attempt_disarms_everything() {
        let sup = supervisor();
        sup.begin_attempt("att-1", 600).unwrap();
        assert!(sup.is_running());
        assert!(sup.monitor().is_enabled());

        sup.end_attempt();
        sup.end_attempt(); // idempotent
        assert!(!sup.is_running());
        assert!(!sup.monitor().is_enabled());
        assert!(!sup.engine().is_running());
    }

    #[tokio::test]
    async fn test_zero_duration_attempt_expires_immediately() {
        let sup = supervisor();
        sup.begin_attempt("att-1", 0).unwrap();
        assert!(!sup.is_running());
        let status = sup.status();
        assert!(status.expired);
        assert_eq!(status.remaining_seconds, 0);
        assert!(!sup.monitor().is_enabled());

        // The slot is free for the next attempt.
        sup.begin_attempt("att-2", 600).unwrap();
        sup.end_attempt();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_drives_countdown_to_expiry() {
        let sup = supervisor();
        sup.begin_attempt("att-1", 3).unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;

        let status = sup.status();
        assert!(status.expired);
        assert!(!status.running);
        assert_eq!(status.remaining_seconds, 0);
        assert_eq!(status.display, "00:00");
        assert!(!sup.monitor().is_enabled());
    }
}
