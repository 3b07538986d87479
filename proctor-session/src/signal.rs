//! Host signal sources — the adapter seam between the host environment and
//! the integrity monitor.
//!
//! A host (browser shell, native proctoring shell, test harness) normalizes
//! its raw events into `HostSignal` values and emits them through a
//! `SignalSource`. The monitor subscribes per source and detaches on
//! disable, so synthetic event streams drive it exactly like real hosts.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardOp {
    Copy,
    Paste,
}

impl ClipboardOp {
    pub fn wire_name(&self) -> &'static str {
        match self {
            ClipboardOp::Copy => "copy",
            ClipboardOp::Paste => "paste",
        }
    }
}

/// A normalized host event on one of the four monitored channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostSignal {
    /// Tab/window visibility changed; `hidden` is the new state.
    VisibilityChanged { hidden: bool },
    /// Full-screen mode changed; `active` is the new state.
    FullScreenChanged { active: bool },
    /// Clipboard copy or paste; `length` is the transferred text size
    /// (0 when the host cannot read it).
    Clipboard { op: ClipboardOp, length: usize },
    /// A pointer click anywhere in the assessment surface.
    PointerClick,
}

pub type SignalHandler = Arc<dyn Fn(&HostSignal) + Send + Sync>;

/// A subscribable stream of host signals.
pub trait SignalSource: Send + Sync {
    /// Register a handler. Returns a subscription id for later detach.
    fn subscribe(&self, handler: SignalHandler) -> u64;
    /// Remove a subscription by id.
    fn unsubscribe(&self, id: u64) -> bool;
}

/// In-memory signal source: hosts push signals in, subscribers fan out.
pub struct ChannelSignalSource {
    subscribers: RwLock<Vec<(u64, SignalHandler)>>,
    next_id: AtomicU64,
    total_emitted: AtomicU64,
}

impl ChannelSignalSource {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            total_emitted: AtomicU64::new(0),
        }
    }

    /// Deliver a signal to every current subscriber.
    pub fn emit(&self, signal: HostSignal) {
        self.total_emitted.fetch_add(1, Ordering::Relaxed);
        for (_, handler) in self.subscribers.read().iter() {
            handler(&signal);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn total_emitted(&self) -> u64 {
        self.total_emitted.load(Ordering::Relaxed)
    }
}

impl Default for ChannelSignalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSource for ChannelSignalSource {
    fn subscribe(&self, handler: SignalHandler) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().push((id, handler));
        id
    }

    fn unsubscribe(&self, id: u64) -> bool {
        let mut subs = self.subscribers.write();
        let before = subs.len();
        subs.retain(|(sub_id, _)| *sub_id != id);
        subs.len() < before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64 as Counter;

    #[test]
    fn test_subscribe_emit_unsubscribe() {
        let source = ChannelSignalSource::new();
        let seen = Arc::new(Counter::new(0));
        let s = seen.clone();
        let id = source.subscribe(Arc::new(move |_| {
            s.fetch_add(1, Ordering::Relaxed);
        }));

        source.emit(HostSignal::PointerClick);
        source.emit(HostSignal::VisibilityChanged { hidden: true });
        assert_eq!(seen.load(Ordering::Relaxed), 2);
        assert_eq!(source.subscriber_count(), 1);

        assert!(source.unsubscribe(id));
        assert!(!source.unsubscribe(id));
        source.emit(HostSignal::PointerClick);
        assert_eq!(seen.load(Ordering::Relaxed), 2);
        assert_eq!(source.subscriber_count(), 0);
        assert_eq!(source.total_emitted(), 3);
    }

    #[test]
    fn test_fan_out_to_multiple_subscribers() {
        let source = ChannelSignalSource::new();
        let a = Arc::new(Counter::new(0));
        let b = Arc::new(Counter::new(0));
        let ac = a.clone();
        let bc = b.clone();
        source.subscribe(Arc::new(move |_| {
            ac.fetch_add(1, Ordering::Relaxed);
        }));
        source.subscribe(Arc::new(move |_| {
            bc.fetch_add(1, Ordering::Relaxed);
        }));

        source.emit(HostSignal::Clipboard {
            op: ClipboardOp::Copy,
            length: 12,
        });
        assert_eq!(a.load(Ordering::Relaxed), 1);
        assert_eq!(b.load(Ordering::Relaxed), 1);
    }
}
