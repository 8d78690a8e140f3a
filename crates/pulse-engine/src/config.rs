//! Engine configuration
//!
//! Governance mode, penalty policy, and organization timezone are
//! explicit configuration values threaded into each gate, action, and
//! worker call - never ambient state.

use pulse_domain::{GovernanceMode, PenaltyCurve};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the engine
///
/// # Examples
///
/// ```
/// use pulse_engine::EngineConfig;
/// use pulse_domain::GovernanceMode;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.mode, GovernanceMode::Propose);
///
/// let config = EngineConfig::observer();
/// assert_eq!(config.mode, GovernanceMode::Observe);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Governance mode for gate and worker write behavior
    #[serde(default)]
    pub mode: GovernanceMode,

    /// Penalty policy for health scoring
    #[serde(default)]
    pub penalty_curve: PenaltyCurve,

    /// Organization UTC offset in minutes; snooze and lookback day
    /// boundaries are local to this offset
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Days an inbound thread may wait before it is flagged
    #[serde(default = "default_unanswered_threshold_days")]
    pub unanswered_threshold_days: u32,

    /// How often the maintenance sweep runs (in minutes)
    #[serde(default = "default_sweep_interval_minutes")]
    pub sweep_interval_minutes: u64,

    /// Lookback window for the recently-actioned view (in local days)
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: u32,

    /// Dry-run mode: log what the sweep would change without writing
    #[serde(default)]
    pub dry_run: bool,
}

fn default_unanswered_threshold_days() -> u32 {
    3
}

fn default_sweep_interval_minutes() -> u64 {
    15
}

fn default_recent_window_days() -> u32 {
    7
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: GovernanceMode::Propose,
            penalty_curve: PenaltyCurve::default(),
            utc_offset_minutes: 0,
            unanswered_threshold_days: default_unanswered_threshold_days(),
            sweep_interval_minutes: default_sweep_interval_minutes(),
            recent_window_days: default_recent_window_days(),
            dry_run: false,
        }
    }
}

impl EngineConfig {
    /// Observe-only configuration: detectors evaluate, nothing is written
    pub fn observer() -> Self {
        Self {
            mode: GovernanceMode::Observe,
            ..Default::default()
        }
    }

    /// Autopilot configuration: write-through plus worker auto-resolution
    pub fn autopilot() -> Self {
        Self {
            mode: GovernanceMode::Auto,
            ..Default::default()
        }
    }

    /// Get the sweep interval as a Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes * 60)
    }
}
