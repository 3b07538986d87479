//! Countdown Engine — attempt timer with one-time warnings and expiry.
//!
//! Owns the remaining-time state, consumes one `tick()` per elapsed second
//! from whatever drives it (the runtime's 1 Hz ticker in production, a bare
//! loop in tests), classifies the remaining time into a severity band, and
//! fires each warning threshold and the expiry signal exactly once per
//! attempt.
//!
//! All timer state lives in a single `TimerState` behind one lock and is
//! mutated only inside `tick()`; callbacks observe state, they never own a
//! copy of it.

use crate::types::{NotifyFn, SeverityBand, TickFn, WarningFn};
use parking_lot::RwLock;
use proctor_core::TimerConfig;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info};

/// The authoritative timer state.
#[derive(Debug, Clone, Default)]
pub struct TimerState {
    pub remaining_seconds: u32,
    /// Minute marks already notified; guards each warning to at most once.
    pub warnings_fired: HashSet<u32>,
    /// Terminal: once true, stays true until the next `start`.
    pub expired: bool,
}

pub struct CountdownEngine {
    config: TimerConfig,
    state: RwLock<TimerState>,
    running: AtomicBool,
    ticks_processed: AtomicU64,
    on_tick: RwLock<Vec<TickFn>>,
    on_warning: RwLock<Vec<WarningFn>>,
    on_expired: RwLock<Vec<NotifyFn>>,
}

impl CountdownEngine {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(TimerState::default()),
            running: AtomicBool::new(false),
            ticks_processed: AtomicU64::new(0),
            on_tick: RwLock::new(Vec::new()),
            on_warning: RwLock::new(Vec::new()),
            on_expired: RwLock::new(Vec::new()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(TimerConfig::default())
    }

    // ── Callback registration ────────────────────────────────────────────

    pub fn on_tick(&self, f: TickFn) {
        self.on_tick.write().push(f);
    }

    pub fn on_warning(&self, f: WarningFn) {
        self.on_warning.write().push(f);
    }

    pub fn on_expired(&self, f: NotifyFn) {
        self.on_expired.write().push(f);
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Start (or restart) the countdown. Running state, fired warnings, and
    /// the expired flag are all reset; the engine keeps no cross-duration
    /// warning memory.
    pub fn start(&self, initial_seconds: u32) {
        {
            let mut state = self.state.write();
            *state = TimerState {
                remaining_seconds: initial_seconds,
                warnings_fired: HashSet::new(),
                expired: false,
            };
        }
        info!(initial_seconds, "Countdown started");

        if initial_seconds == 0 {
            // A zero-length attempt is expired on arrival.
            self.state.write().expired = true;
            self.running.store(false, Ordering::Relaxed);
            self.fire_expired();
        } else {
            self.running.store(true, Ordering::Relaxed);
        }
    }

    /// Halt tick processing without firing anything. Remaining time is left
    /// as-is for a later status read.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Consume one elapsed second. No-op once expired or stopped.
    pub fn tick(&self) {
        if !self.running.load(Ordering::Relaxed) {
            return;
        }

        let remaining;
        let mut warning: Option<u32> = None;
        let mut expired_now = false;
        {
            let mut state = self.state.write();
            if state.expired {
                return;
            }
            state.remaining_seconds = state.remaining_seconds.saturating_sub(1);
            remaining = state.remaining_seconds;

            // Exact post-decrement match: a timer started below a threshold
            // never retroactively fires it.
            for &minutes in &self.config.warning_minutes {
                if remaining == minutes * 60 && state.warnings_fired.insert(minutes) {
                    warning = Some(minutes);
                }
            }

            if remaining == 0 {
                state.expired = true;
                expired_now = true;
            }
        }
        self.ticks_processed.fetch_add(1, Ordering::Relaxed);

        let band = self.severity_band(remaining);
        for cb in self.on_tick.read().iter() {
            cb(remaining, band);
        }

        if let Some(minutes) = warning {
            debug!(minutes, "Time warning threshold reached");
            for cb in self.on_warning.read().iter() {
                cb(minutes);
            }
        }

        if expired_now {
            self.running.store(false, Ordering::Relaxed);
            self.fire_expired();
        }
    }

    fn fire_expired(&self) {
        info!("Countdown expired");
        for cb in self.on_expired.read().iter() {
            cb();
        }
    }

    // ── Observation ──────────────────────────────────────────────────────

    /// Classify remaining seconds for presentation. 601 s is safe, 600 s and
    /// 300 s are caution, 299 s is critical.
    pub fn severity_band(&self, remaining_seconds: u32) -> SeverityBand {
        if remaining_seconds > self.config.safe_floor_secs {
            SeverityBand::Safe
        } else if remaining_seconds >= self.config.caution_floor_secs {
            SeverityBand::Caution
        } else {
            SeverityBand::Critical
        }
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.state.read().remaining_seconds
    }

    pub fn is_expired(&self) -> bool {
        self.state.read().expired
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn ticks_processed(&self) -> u64 {
        self.ticks_processed.load(Ordering::Relaxed)
    }
}

// ── Formatters ──────────────────────────────────────────────────────────────

/// Render remaining seconds as `MM:SS`, zero-padded, minutes unbounded.
pub fn format_clock(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Verbose phrase for assistive technology: singular units, zero-valued
/// units omitted.
pub fn format_spoken(total_seconds: u32) -> String {
    fn unit(n: u32, name: &str) -> String {
        if n == 1 {
            format!("1 {}", name)
        } else {
            format!("{} {}s", n, name)
        }
    }

    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    match (minutes, seconds) {
        (0, 0) => "0 seconds remaining".to_string(),
        (0, s) => format!("{} remaining", unit(s, "second")),
        (m, 0) => format!("{} remaining", unit(m, "minute")),
        (m, s) => format!("{} {} remaining", unit(m, "minute"), unit(s, "second")),
    }
}
