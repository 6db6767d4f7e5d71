use std::collections::HashMap;
use tracing::{info, warn};

/// Outcome tallies for one batch phase. Individual items log as they
/// complete; this produces the one-line summary (and error breakdown) once
/// the phase barrier is reached.
pub struct ProgressTracker {
    total: usize,
    resolved: usize,
    failed: usize,
    start_time: std::time::Instant,
    error_counts: HashMap<String, usize>, // failures by category
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            resolved: 0,
            failed: 0,
            start_time: std::time::Instant::now(),
            error_counts: HashMap::new(),
        }
    }

    pub fn record_resolved(&mut self) {
        self.resolved += 1;
    }

    pub fn record_failed(&mut self, error_category: &str) {
        self.failed += 1;
        *self
            .error_counts
            .entry(error_category.to_string())
            .or_insert(0) += 1;
    }

    pub fn resolved(&self) -> usize {
        self.resolved
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Log the phase summary. WARN when anything failed, INFO otherwise.
    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed();
        let rate = if elapsed.as_secs_f64() > 0.0 {
            self.total as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        if self.failed > 0 {
            warn!(
                "{} completed: {}/{} ok in {:.1}s ({:.1} items/sec) | Failed: {}",
                operation_name,
                self.resolved,
                self.total,
                elapsed.as_secs_f64(),
                rate,
                self.failed
            );

            let mut error_entries: Vec<_> = self.error_counts.iter().collect();
            error_entries.sort_by(|a, b| b.1.cmp(a.1));

            let error_summary: Vec<String> = error_entries
                .iter()
                .map(|(category, count)| format!("{}: {}", category, count))
                .collect();

            info!("Error breakdown: {}", error_summary.join(", "));
        } else {
            info!(
                "{} completed: {}/{} ok in {:.1}s ({:.1} items/sec)",
                operation_name,
                self.resolved,
                self.total,
                elapsed.as_secs_f64(),
                rate
            );
        }
    }
}
