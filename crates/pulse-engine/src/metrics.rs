//! Metrics collection for maintenance sweeps

/// Metrics collected across sweep cycles
#[derive(Debug, Clone, Default)]
pub struct SweepMetrics {
    /// New inbox records created by detector passes
    pub candidates_created: usize,

    /// Candidates merged into existing records
    pub candidates_merged: usize,

    /// Candidates refused by evidence validation
    pub candidates_rejected: usize,

    /// Candidates refused by identity conflict
    pub identity_conflicts: usize,

    /// Problem snoozes woken on expiry
    pub snoozes_woken: usize,

    /// Reminder horizons cleared
    pub reminders_cleared: usize,

    /// Records auto-resolved under the `auto` governance mode
    pub auto_resolved: usize,

    /// Entities rescored
    pub entities_rescored: usize,

    /// Total sweep iterations completed
    pub sweep_count: usize,

    /// Total runtime in seconds
    pub total_runtime_secs: u64,
}

impl SweepMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sweep cycle completion
    pub fn record_sweep(&mut self) {
        self.sweep_count += 1;
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let lines = vec![
            "Sweep Metrics Summary".to_string(),
            "=====================".to_string(),
            format!("Sweep cycles: {}", self.sweep_count),
            format!("Total runtime: {}s", self.total_runtime_secs),
            String::new(),
            format!("Candidates created: {}", self.candidates_created),
            format!("Candidates merged: {}", self.candidates_merged),
            format!("Candidates rejected: {}", self.candidates_rejected),
            format!("Identity conflicts: {}", self.identity_conflicts),
            String::new(),
            format!("Snoozes woken: {}", self.snoozes_woken),
            format!("Reminders cleared: {}", self.reminders_cleared),
            format!("Auto-resolved: {}", self.auto_resolved),
            format!("Entities rescored: {}", self.entities_rescored),
        ];
        lines.join("\n")
    }
}
