use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

/// Periodic progress logging and a final summary for the lookup phase
pub struct ProgressTracker {
    total: usize,
    resolved: usize,
    cached: usize,
    fallback: usize,
    unresolved: usize,
    start_time: Instant,
    progress_interval: usize,
    last_progress_log: usize,
    reason_counts: HashMap<String, usize>,
}

impl ProgressTracker {
    /// `progress_interval`: log every N movies
    pub fn new(total: usize, progress_interval: usize) -> Self {
        if total > 10 {
            info!("Resolving IMDb ids: {} movies to look up", total);
        }
        Self {
            total,
            resolved: 0,
            cached: 0,
            fallback: 0,
            unresolved: 0,
            start_time: Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            reason_counts: HashMap::new(),
        }
    }

    pub fn record_resolved(&mut self, fallback: bool) {
        self.resolved += 1;
        if fallback {
            self.fallback += 1;
        }
    }

    pub fn record_cached(&mut self) {
        self.resolved += 1;
        self.cached += 1;
    }

    /// `category` groups failures in the summary (e.g. "not_found", "ambiguous")
    pub fn record_unresolved(&mut self, category: &str) {
        self.unresolved += 1;
        *self.reason_counts.entry(category.to_string()).or_insert(0) += 1;
    }

    /// Call after each movie with its 1-based position
    pub fn log_progress(&mut self, current: usize) {
        if current - self.last_progress_log < self.progress_interval && current != self.total {
            return;
        }
        let elapsed = self.start_time.elapsed().as_secs_f64();
        // Near-instant (cache-only) runs get no mid-run lines
        if elapsed < 0.5 && current < self.total {
            return;
        }
        let rate = if elapsed > 0.0 { current as f64 / elapsed } else { 0.0 };
        info!(
            "Progress: {}/{} ({:.1} movies/sec) | Resolved: {} | Cached: {} | Fallback: {} | Unresolved: {}",
            current, self.total, rate, self.resolved, self.cached, self.fallback, self.unresolved
        );
        self.last_progress_log = current;
    }

    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if self.unresolved == 0 {
            info!(
                "{} completed: {} movies in {:.1}s | Resolved: {} | Cached: {} | Fallback: {}",
                operation_name, self.total, elapsed, self.resolved, self.cached, self.fallback
            );
            return;
        }

        warn!(
            "{} completed: {} movies in {:.1}s | Resolved: {} | Cached: {} | Fallback: {} | Unresolved: {}",
            operation_name, self.total, elapsed, self.resolved, self.cached, self.fallback, self.unresolved
        );
        let mut entries: Vec<_> = self.reason_counts.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let breakdown: Vec<String> = entries
            .iter()
            .map(|(category, count)| format!("{}: {}", category, count))
            .collect();
        info!("Unresolved breakdown: {}", breakdown.join(", "));
    }

    pub fn unresolved(&self) -> usize {
        self.unresolved
    }
}
