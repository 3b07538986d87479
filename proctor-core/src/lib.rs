//! # Proctor Core — shared foundation for the assessment proctoring suite
//!
//! Everything the attempt-scoped engines have in common:
//!
//! - **Clock** — injectable millisecond time source (system / manual)
//! - **Config** — typed thresholds and endpoints with TOML load/save
//! - **Events** — the normalized `IntegrityEvent` record
//! - **Reporter** — fire-and-forget delivery to the backend collector
//! - **Errors** — the `ProctorError` taxonomy

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod reporter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{MonitorConfig, ProctorConfig, ReporterConfig, TimerConfig};
pub use error::{ProctorError, ProctorResult};
pub use event::{IntegrityEvent, IntegrityEventKind};
pub use reporter::{EventSink, HttpEventSink, MemorySink, NullSink};
