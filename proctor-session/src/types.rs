//! Attempt session — shared types.
//!
//! Data structures and callback signatures shared by the countdown engine
//! and the integrity monitor.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The coupling to the assessment-attempt UI: which attempt (if any) is
/// being proctored, and whether monitoring is armed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttemptContext {
    pub attempt_id: Option<String>,
    pub enabled: bool,
}

impl AttemptContext {
    /// True only when an attempt id is present and monitoring is armed.
    /// Everything downstream is inert otherwise.
    pub fn is_active(&self) -> bool {
        self.enabled && self.attempt_id.is_some()
    }
}

/// Presentation classification of the remaining time. Drives display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    Safe,
    Caution,
    Critical,
}

/// A classified accumulation of raw events that crossed an escalation
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspicionKind {
    ExcessiveTabSwitching,
    ExcessiveFullscreenExit,
    RapidClicking,
}

impl SuspicionKind {
    pub fn wire_name(&self) -> &'static str {
        match self {
            SuspicionKind::ExcessiveTabSwitching => "excessive_tab_switching",
            SuspicionKind::ExcessiveFullscreenExit => "excessive_fullscreen_exit",
            SuspicionKind::RapidClicking => "rapid_clicking",
        }
    }
}

/// Transient one-line notices surfaced to the candidate. Rendering is the
/// host UI's concern; the monitor only signals which notice to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    TabSwitchMonitored,
    StayInFullscreen,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Advisory::TabSwitchMonitored => {
                "Tab switching is being monitored during this assessment"
            }
            Advisory::StayInFullscreen => {
                "Please stay in full-screen mode until you submit your assessment"
            }
        }
    }
}

// ── Callback signatures ─────────────────────────────────────────────────────

/// Per-second display callback: remaining seconds and severity band.
pub type TickFn = Arc<dyn Fn(u32, SeverityBand) + Send + Sync>;
/// One-time warning callback: minutes left (5 or 1 by default).
pub type WarningFn = Arc<dyn Fn(u32) + Send + Sync>;
/// Parameterless notification (expiry, tab switch, full-screen exit).
pub type NotifyFn = Arc<dyn Fn() + Send + Sync>;
/// Escalation callback.
pub type SuspicionFn = Arc<dyn Fn(SuspicionKind) + Send + Sync>;
/// Advisory callback.
pub type AdvisoryFn = Arc<dyn Fn(Advisory) + Send + Sync>;
