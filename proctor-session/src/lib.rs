//! # Proctor Session — attempt-scoped proctoring engines
//!
//! The two engines that run for the lifetime of one assessment attempt:
//!
//! - **Countdown Engine** — remaining-time state, severity bands, one-time
//!   warnings, one-shot expiry, plus the `MM:SS` and spoken formatters
//! - **Integrity Monitor** — visibility, full-screen, clipboard, and
//!   click-burst channels with debouncing and threshold escalation
//! - **Signal sources** — the injectable adapter seam host environments
//!   emit normalized events through

pub mod countdown;
pub mod monitor;
pub mod signal;
pub mod types;

pub use countdown::{format_clock, format_spoken, CountdownEngine, TimerState};
pub use monitor::{IntegrityMonitor, MonitorCounters, MonitorReport};
pub use signal::{ChannelSignalSource, ClipboardOp, HostSignal, SignalHandler, SignalSource};
pub use types::{
    Advisory, AdvisoryFn, AttemptContext, NotifyFn, SeverityBand, SuspicionFn, SuspicionKind,
    TickFn, WarningFn,
};
