//! Pulse Detector Set
//!
//! Independent rule evaluators over normalized entity state. Each
//! detector is a pure, idempotent function from a snapshot to zero or
//! more candidate issues: running the same detector twice against
//! unchanged input proposes the same candidates, and the dedupe gate
//! folds repeats into the existing inbox record.
//!
//! Detectors never perform I/O and never block on one another; they may
//! run concurrently or interleaved across scheduled passes.

#![warn(missing_docs)]

mod detector;
mod error;
mod invoice;
mod mail;
mod snapshot;
mod task;

pub use detector::{validate_candidate, Detector};
pub use error::DetectError;
pub use invoice::{overdue_invoice_key, OverdueInvoiceDetector, OVERDUE_INVOICE};
pub use mail::{unanswered_thread_key, UnansweredThreadDetector, UNANSWERED_THREAD};
pub use snapshot::EntitySnapshot;
pub use task::{overdue_work_item_key, OverdueWorkItemDetector, OVERDUE_WORK_ITEM};

/// A heap-allocated set of detectors shareable across worker tasks
pub type DetectorSet = Vec<Box<dyn Detector + Send + Sync>>;

/// The default detector set
pub fn default_detectors(unanswered_threshold_days: u32) -> DetectorSet {
    vec![
        Box::new(OverdueInvoiceDetector),
        Box::new(OverdueWorkItemDetector),
        Box::new(UnansweredThreadDetector::new(unanswered_threshold_days)),
    ]
}
