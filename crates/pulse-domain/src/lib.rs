//! Pulse Domain Layer
//!
//! This crate contains the core business logic and domain model for Pulse,
//! the issue & inbox engine. It defines the fundamental concepts, value
//! objects, and trait interfaces that all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Inbox Record**: the mutable, user-facing instance of one underlying issue
//! - **Underlying Issue Key**: deterministic identity of a real-world problem,
//!   independent of how many times it is detected
//! - **Evidence**: an immutable fact supporting an issue, tracked per source system
//! - **Lifecycle States**: proposed → addressing → regression_watch, with snooze
//!   and an orthogonal suppression flag
//! - **Engagement Health**: 0–100 derived score per governed entity
//!
//! ## Architecture
//!
//! - Pure business logic only; no I/O
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod entity;
pub mod evidence;
pub mod health;
pub mod identity;
pub mod issue;
pub mod key;
pub mod policy;
pub mod query;
pub mod source;
pub mod traits;

// Re-exports for convenience
pub use entity::{Entity, Invoice, Thread, WorkItem};
pub use evidence::Evidence;
pub use health::{compute_health, HealthAssessment, PenaltyCurve};
pub use identity::SourceIdentity;
pub use issue::{available_actions, InboxRecord, IssueAction, IssueState, RecordId, SnoozeKind};
pub use key::IssueKey;
pub use policy::GovernanceMode;
pub use source::SourceSystem;
