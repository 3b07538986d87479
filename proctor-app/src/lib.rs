//! Proctor runtime crate: the attempt supervisor and the `proctor` binary.

pub mod supervisor;

pub use supervisor::{AttemptStatus, AttemptSupervisor};
