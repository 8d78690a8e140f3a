//! Pulse Engine
//!
//! The write side of the issue & inbox engine: feeds detector candidates
//! through the dedupe gate, applies user actions under the lifecycle
//! state machine, recomputes engagement health, and runs the background
//! maintenance sweep (snooze expiry, reminder clearing, rescoring, and
//! auto-resolution under the `auto` governance mode).
//!
//! Every entry point takes its policy ([`EngineConfig`]) and clock as
//! explicit inputs; nothing reads ambient state.

#![warn(missing_docs)]

pub mod actions;
pub mod config;
mod error;
pub mod gate;
mod metrics;
pub mod scoring;
pub mod sweep;
pub mod view;
pub mod worker;

pub use config::EngineConfig;
pub use error::EngineError;
pub use gate::GateReport;
pub use metrics::SweepMetrics;
pub use sweep::Sweeper;
pub use worker::SweepWorker;
