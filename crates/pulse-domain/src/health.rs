//! Engagement health scoring
//!
//! Implements the deterministic 0-100 health computation for a governed
//! entity from its linked open work items. The penalty curve is a
//! configurable policy value, not a hardcoded formula.

use serde::{Deserialize, Serialize};

/// Gating reason when an entity has nothing to be unhealthy about
pub const NO_LINKED_OPEN_TASKS: &str = "no linked open tasks";

/// Default slope for the linear penalty curve
pub const DEFAULT_LINEAR_SLOPE: f64 = 0.6;

/// Penalty policy mapping overdue percentage to a score penalty
///
/// Both variants are monotonically non-decreasing in the overdue
/// percentage; the computed score is clamped to 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PenaltyCurve {
    /// `penalty = round(overdue_pct * slope)`
    Linear {
        /// Penalty per overdue percentage point
        slope: f64,
    },

    /// Highest tier whose threshold the overdue percentage meets
    Stepped {
        /// Penalty tiers; evaluated by threshold, order-independent
        tiers: Vec<PenaltyTier>,
    },
}

/// One tier of a stepped penalty curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyTier {
    /// Minimum overdue percentage for this tier to apply
    pub min_overdue_pct: u8,

    /// Penalty applied at this tier
    pub penalty: u8,
}

impl Default for PenaltyCurve {
    fn default() -> Self {
        PenaltyCurve::Linear {
            slope: DEFAULT_LINEAR_SLOPE,
        }
    }
}

impl PenaltyCurve {
    /// Penalty for the given overdue percentage
    pub fn penalty(&self, overdue_pct: u8) -> u8 {
        match self {
            PenaltyCurve::Linear { slope } => {
                let raw = (f64::from(overdue_pct) * slope).round();
                raw.clamp(0.0, 100.0) as u8
            }
            PenaltyCurve::Stepped { tiers } => tiers
                .iter()
                .filter(|tier| overdue_pct >= tier.min_overdue_pct)
                .map(|tier| tier.penalty)
                .max()
                .unwrap_or(0),
        }
    }
}

/// Result of a health recompute for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    /// Engagement health score, 0-100
    pub score: u8,

    /// Human-readable gating label
    pub reason: String,

    /// Linked open work items counted
    pub linked_open_tasks: usize,

    /// Overdue subset of the counted items
    pub overdue_open_tasks: usize,
}

/// Compute the engagement health score from pre-filtered counts
///
/// Callers exclude suppressed and problem-snoozed issues from both counts
/// before calling - their penalty is suspended, not merely hidden. The
/// zero-task case is an explicit early branch, not a side effect of a
/// division that happens to not execute.
pub fn compute_health(
    linked_open_tasks: usize,
    overdue_open_tasks: usize,
    curve: &PenaltyCurve,
) -> HealthAssessment {
    if linked_open_tasks == 0 {
        return HealthAssessment {
            score: 100,
            reason: NO_LINKED_OPEN_TASKS.to_string(),
            linked_open_tasks: 0,
            overdue_open_tasks: 0,
        };
    }

    let overdue_pct =
        ((overdue_open_tasks as f64 / linked_open_tasks as f64) * 100.0).round() as u8;
    let score = 100u8.saturating_sub(curve.penalty(overdue_pct));

    HealthAssessment {
        score,
        reason: format!(
            "{} of {} linked open tasks overdue ({}%)",
            overdue_open_tasks, linked_open_tasks, overdue_pct
        ),
        linked_open_tasks,
        overdue_open_tasks,
    }
}
