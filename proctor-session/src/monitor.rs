//! Integrity Monitor — four-channel behavior watcher with threshold
//! escalation.
//!
//! Consumes normalized host signals (visibility, full-screen, clipboard,
//! pointer), applies per-channel debouncing and windowing, maintains
//! occurrence counters scoped to the attempt, and escalates to
//! `suspicious_behavior` when a counter first crosses its configured limit.
//! Every emitted event goes to the reporter keyed by the attempt id.
//!
//! The monitor is fully inert unless it has been enabled with an attempt id:
//! no subscriptions, no counting, no reporting. Disabling detaches every
//! host subscription synchronously, so a disabled monitor produces zero
//! further events.

use crate::signal::{ClipboardOp, HostSignal, SignalSource};
use crate::types::{Advisory, AdvisoryFn, AttemptContext, NotifyFn, SuspicionFn, SuspicionKind};
use parking_lot::{Mutex, RwLock};
use proctor_core::{Clock, EventSink, IntegrityEvent, IntegrityEventKind, MonitorConfig};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Occurrence counters owned by the monitor. Never decremented; reset only
/// across enable cycles (attempt lifetime, not page lifetime).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorCounters {
    pub tab_switch_count: u32,
    pub full_screen_exit_count: u32,
    /// Detected bursts, not raw clicks; the rolling per-window click count
    /// is ephemeral state.
    pub click_burst_count: u32,
    /// Timestamp of the last counted hidden transition; the debounce gap is
    /// measured against this.
    pub last_visibility_change_ms: i64,
}

/// The single authoritative monitor state: counters plus per-attempt guards
/// and window state, mutated only inside the signal handlers.
#[derive(Debug, Clone, Default)]
struct MonitorState {
    counters: MonitorCounters,
    page_hidden: bool,
    tab_advisory_shown: bool,
    tab_escalated: bool,
    fullscreen_escalated: bool,
    window_clicks: u32,
    last_click_ms: i64,
}

/// Point-in-time summary for status surfaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorReport {
    pub attempt_id: Option<String>,
    pub enabled: bool,
    pub tab_switch_count: u32,
    pub full_screen_exit_count: u32,
    pub click_burst_count: u32,
    pub events_reported: u64,
    pub escalations: u64,
}

pub struct IntegrityMonitor {
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    context: RwLock<AttemptContext>,
    state: RwLock<MonitorState>,
    /// Sources registered via `attach`; kept across enable cycles.
    sources: Mutex<Vec<Arc<dyn SignalSource>>>,
    /// Live subscriptions; populated on enable, drained on disable.
    subscriptions: Mutex<Vec<(Arc<dyn SignalSource>, u64)>>,
    events_reported: AtomicU64,
    escalations: AtomicU64,
    on_tab_switch: RwLock<Vec<NotifyFn>>,
    on_full_screen_exit: RwLock<Vec<NotifyFn>>,
    on_suspicious: RwLock<Vec<SuspicionFn>>,
    on_advisory: RwLock<Vec<AdvisoryFn>>,
}

impl IntegrityMonitor {
    pub fn new(config: MonitorConfig, clock: Arc<dyn Clock>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            clock,
            sink,
            context: RwLock::new(AttemptContext::default()),
            state: RwLock::new(MonitorState::default()),
            sources: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            events_reported: AtomicU64::new(0),
            escalations: AtomicU64::new(0),
            on_tab_switch: RwLock::new(Vec::new()),
            on_full_screen_exit: RwLock::new(Vec::new()),
            on_suspicious: RwLock::new(Vec::new()),
            on_advisory: RwLock::new(Vec::new()),
        }
    }

    // ── Callback registration ────────────────────────────────────────────

    pub fn on_tab_switch(&self, f: NotifyFn) {
        self.on_tab_switch.write().push(f);
    }

    pub fn on_full_screen_exit(&self, f: NotifyFn) {
        self.on_full_screen_exit.write().push(f);
    }

    pub fn on_suspicious(&self, f: SuspicionFn) {
        self.on_suspicious.write().push(f);
    }

    pub fn on_advisory(&self, f: AdvisoryFn) {
        self.on_advisory.write().push(f);
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Register a host signal source. Subscribed immediately if the monitor
    /// is already enabled, otherwise on the next enable.
    pub fn attach(self: &Arc<Self>, source: Arc<dyn SignalSource>) {
        self.sources.lock().push(source.clone());
        if self.context.read().is_active() {
            self.subscribe_to(&source);
        }
    }

    /// Arm monitoring for an attempt. Counters, guards, and window state are
    /// reset; all attached sources are subscribed. Calling again with the
    /// same attempt id is a no-op.
    pub fn enable(self: &Arc<Self>, attempt_id: &str) {
        {
            let mut ctx = self.context.write();
            if ctx.enabled && ctx.attempt_id.as_deref() == Some(attempt_id) {
                return;
            }
            *ctx = AttemptContext {
                attempt_id: Some(attempt_id.to_string()),
                enabled: true,
            };
        }
        *self.state.write() = MonitorState::default();

        // Drop stale subscriptions from a previous attempt before
        // re-subscribing, so toggling never stacks listeners.
        self.unsubscribe_all();
        let sources: Vec<_> = self.sources.lock().clone();
        for source in &sources {
            self.subscribe_to(source);
        }
        info!(attempt_id, "Integrity monitor enabled");
    }

    /// Disarm monitoring. Detaches every host subscription synchronously and
    /// clears pending window state; no further events are produced, counted,
    /// or reported. Idempotent.
    pub fn disable(&self) {
        {
            let mut ctx = self.context.write();
            if !ctx.enabled && ctx.attempt_id.is_none() {
                return;
            }
            *ctx = AttemptContext::default();
        }
        self.unsubscribe_all();
        {
            let mut state = self.state.write();
            state.window_clicks = 0;
            state.last_click_ms = 0;
        }
        info!("Integrity monitor disabled");
    }

    fn subscribe_to(self: &Arc<Self>, source: &Arc<dyn SignalSource>) {
        // The handler holds the monitor weakly; a dropped monitor must not
        // be kept alive by its own host subscriptions.
        let weak = Arc::downgrade(self);
        let id = source.subscribe(Arc::new(move |signal| {
            if let Some(monitor) = weak.upgrade() {
                monitor.handle(signal);
            }
        }));
        self.subscriptions.lock().push((source.clone(), id));
    }

    fn unsubscribe_all(&self) {
        let mut subs = self.subscriptions.lock();
        for (source, id) in subs.drain(..) {
            source.unsubscribe(id);
        }
    }

    // ── Signal handling ──────────────────────────────────────────────────

    /// Route a normalized host signal to its channel.
    pub fn handle(&self, signal: &HostSignal) {
        match *signal {
            HostSignal::VisibilityChanged { hidden } => self.on_visibility_change(hidden),
            HostSignal::FullScreenChanged { active } => self.on_full_screen_change(active),
            HostSignal::Clipboard { op, length } => self.on_clipboard(op, length),
            HostSignal::PointerClick => self.on_click(),
        }
    }

    /// Visibility channel: only Visible → Hidden transitions count, and a
    /// transition inside the debounce window of the previous counted one is
    /// ignored entirely (not counted, not reported).
    pub fn on_visibility_change(&self, hidden: bool) {
        let Some(attempt_id) = self.active_attempt() else {
            return;
        };
        let now = self.clock.now_ms();

        let count;
        let show_advisory;
        let escalate;
        {
            let mut state = self.state.write();
            if !hidden {
                state.page_hidden = false;
                return;
            }
            if state.page_hidden {
                return; // not a transition
            }
            state.page_hidden = true;

            let last = state.counters.last_visibility_change_ms;
            if last != 0 && now - last < self.config.visibility_debounce_ms {
                debug!(gap_ms = now - last, "Visibility change debounced");
                return;
            }
            state.counters.last_visibility_change_ms = now;
            state.counters.tab_switch_count += 1;
            count = state.counters.tab_switch_count;

            show_advisory = count == self.config.tab_advisory_count && !state.tab_advisory_shown;
            if show_advisory {
                state.tab_advisory_shown = true;
            }
            escalate = count == self.config.tab_escalation_count && !state.tab_escalated;
            if escalate {
                state.tab_escalated = true;
            }
        }

        debug!(count, "Tab switch recorded");
        self.emit(
            &attempt_id,
            IntegrityEvent::new(IntegrityEventKind::TabSwitch, now)
                .with_detail("count", count)
                .with_detail("hidden", "true"),
        );
        for cb in self.on_tab_switch.read().iter() {
            cb();
        }
        if show_advisory {
            self.advise(Advisory::TabSwitchMonitored);
        }
        if escalate {
            self.escalate(&attempt_id, SuspicionKind::ExcessiveTabSwitching, now, None);
        }
    }

    /// Full-screen channel: every exit counts and re-shows the stay-in-
    /// full-screen advisory; escalation once the exit count crosses its
    /// limit.
    pub fn on_full_screen_change(&self, active: bool) {
        let Some(attempt_id) = self.active_attempt() else {
            return;
        };
        if active {
            return;
        }
        let now = self.clock.now_ms();

        let count;
        let escalate;
        {
            let mut state = self.state.write();
            state.counters.full_screen_exit_count += 1;
            count = state.counters.full_screen_exit_count;
            escalate =
                count == self.config.fullscreen_escalation_count && !state.fullscreen_escalated;
            if escalate {
                state.fullscreen_escalated = true;
            }
        }

        debug!(count, "Full-screen exit recorded");
        self.emit(
            &attempt_id,
            IntegrityEvent::new(IntegrityEventKind::FullScreenExit, now)
                .with_detail("count", count),
        );
        self.advise(Advisory::StayInFullscreen);
        for cb in self.on_full_screen_exit.read().iter() {
            cb();
        }
        if escalate {
            self.escalate(
                &attempt_id,
                SuspicionKind::ExcessiveFullscreenExit,
                now,
                None,
            );
        }
    }

    /// Clipboard channel: purely observational. Never blocks the action,
    /// never escalates.
    pub fn on_clipboard(&self, op: ClipboardOp, length: usize) {
        let Some(attempt_id) = self.active_attempt() else {
            return;
        };
        let now = self.clock.now_ms();
        debug!(op = op.wire_name(), length, "Clipboard use recorded");
        self.emit(
            &attempt_id,
            IntegrityEvent::new(IntegrityEventKind::CopyPaste, now)
                .with_detail("type", op.wire_name())
                .with_detail("length", length),
        );
    }

    /// Click-burst channel: rolling count reset by an inactivity gap; a full
    /// burst inside one window escalates and resets the window count.
    pub fn on_click(&self) {
        let Some(attempt_id) = self.active_attempt() else {
            return;
        };
        let now = self.clock.now_ms();

        let burst_count;
        {
            let mut state = self.state.write();
            if state.last_click_ms != 0 && now - state.last_click_ms > self.config.click_window_ms {
                state.window_clicks = 0;
            }
            state.window_clicks += 1;
            state.last_click_ms = now;

            if state.window_clicks < self.config.click_burst_threshold {
                return;
            }
            burst_count = state.window_clicks;
            state.window_clicks = 0;
            state.counters.click_burst_count += 1;
        }

        self.escalate(
            &attempt_id,
            SuspicionKind::RapidClicking,
            now,
            Some(burst_count),
        );
    }

    // ── Effects ──────────────────────────────────────────────────────────

    fn escalate(&self, attempt_id: &str, kind: SuspicionKind, now: i64, count: Option<u32>) {
        warn!(kind = kind.wire_name(), "Suspicious behavior detected");
        self.escalations.fetch_add(1, Ordering::Relaxed);

        let mut event = IntegrityEvent::new(IntegrityEventKind::SuspiciousBehavior, now)
            .with_detail("type", kind.wire_name());
        if let Some(count) = count {
            event = event.with_detail("count", count);
        }
        self.emit(attempt_id, event);

        for cb in self.on_suspicious.read().iter() {
            cb(kind);
        }
    }

    fn emit(&self, attempt_id: &str, event: IntegrityEvent) {
        self.events_reported.fetch_add(1, Ordering::Relaxed);
        self.sink.report(attempt_id, &event);
    }

    fn advise(&self, advisory: Advisory) {
        info!(message = advisory.message(), "Advisory raised");
        for cb in self.on_advisory.read().iter() {
            cb(advisory);
        }
    }

    // ── Observation ──────────────────────────────────────────────────────

    fn active_attempt(&self) -> Option<String> {
        let ctx = self.context.read();
        if ctx.enabled {
            ctx.attempt_id.clone()
        } else {
            None
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.context.read().enabled
    }

    pub fn counters(&self) -> MonitorCounters {
        self.state.read().counters.clone()
    }

    pub fn events_reported(&self) -> u64 {
        self.events_reported.load(Ordering::Relaxed)
    }

    pub fn escalations(&self) -> u64 {
        self.escalations.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> MonitorReport {
        let ctx = self.context.read().clone();
        let counters = self.counters();
        MonitorReport {
            attempt_id: ctx.attempt_id,
            enabled: ctx.enabled,
            tab_switch_count: counters.tab_switch_count,
            full_screen_exit_count: counters.full_screen_exit_count,
            click_burst_count: counters.click_burst_count,
            events_reported: self.events_reported(),
            escalations: self.escalations(),
        }
    }
}
