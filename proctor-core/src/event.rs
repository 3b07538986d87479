//! Integrity event model.
//!
//! An `IntegrityEvent` is the normalized record of one noteworthy candidate
//! action during an attempt: produced by the monitor (or its escalation
//! logic), immutable once built, consumed exactly once by the reporter.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The four event categories the collector understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityEventKind {
    TabSwitch,
    FullScreenExit,
    CopyPaste,
    SuspiciousBehavior,
}

impl IntegrityEventKind {
    /// Wire name used in collector payloads.
    pub fn wire_name(&self) -> &'static str {
        match self {
            IntegrityEventKind::TabSwitch => "tab_switch",
            IntegrityEventKind::FullScreenExit => "full_screen_exit",
            IntegrityEventKind::CopyPaste => "copy_paste",
            IntegrityEventKind::SuspiciousBehavior => "suspicious_behavior",
        }
    }
}

/// A normalized integrity observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityEvent {
    pub kind: IntegrityEventKind,
    /// Unix timestamp (millis) at which the observation was made.
    pub timestamp_ms: i64,
    /// Structured detail payload (string-keyed, collector-compatible).
    pub details: HashMap<String, String>,
}

impl IntegrityEvent {
    pub fn new(kind: IntegrityEventKind, timestamp_ms: i64) -> Self {
        Self {
            kind,
            timestamp_ms,
            details: HashMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl ToString) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(IntegrityEventKind::TabSwitch.wire_name(), "tab_switch");
        assert_eq!(
            IntegrityEventKind::FullScreenExit.wire_name(),
            "full_screen_exit"
        );
        assert_eq!(IntegrityEventKind::CopyPaste.wire_name(), "copy_paste");
        assert_eq!(
            IntegrityEventKind::SuspiciousBehavior.wire_name(),
            "suspicious_behavior"
        );
    }

    #[test]
    fn test_detail_builder() {
        let event = IntegrityEvent::new(IntegrityEventKind::TabSwitch, 1_700_000_000_000)
            .with_detail("count", 3)
            .with_detail("hidden", "true");
        assert_eq!(event.details.get("count").map(String::as_str), Some("3"));
        assert_eq!(event.details.get("hidden").map(String::as_str), Some("true"));
        assert_eq!(event.timestamp_ms, 1_700_000_000_000);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&IntegrityEventKind::SuspiciousBehavior).unwrap();
        assert_eq!(json, "\"suspicious_behavior\"");
    }
}
