// Import metrics module
//
// Lightweight counters for archive imports, shared by the import service and the CLI

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters collected across imports
///
/// Uses atomic operations so one instance can be shared (behind an `Arc`)
/// by every import running in the process.
#[derive(Debug)]
pub struct ImportMetrics {
    /// Archives that made it through extraction
    pub archives_imported: AtomicUsize,

    /// Archives refused before or during extraction
    pub archives_rejected: AtomicUsize,

    /// Files handed to the script parser
    pub files_parsed: AtomicUsize,

    /// Files whose parse was aborted (size or time budget)
    pub parse_failures: AtomicUsize,

    /// Warnings attached to import results
    pub warnings: AtomicU64,

    /// Conflicting keys found while merging
    pub conflicts: AtomicU64,

    /// Cumulative time spent in the script parser, in microseconds
    pub total_parse_time_us: AtomicU64,

    start_time: Instant,
}

impl ImportMetrics {
    pub fn new() -> Self {
        Self {
            archives_imported: AtomicUsize::new(0),
            archives_rejected: AtomicUsize::new(0),
            files_parsed: AtomicUsize::new(0),
            parse_failures: AtomicUsize::new(0),
            warnings: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
            total_parse_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_archive_imported(&self) {
        self.archives_imported.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_archive_rejected(&self) {
        self.archives_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one parser run and how long it took
    pub fn record_file_parsed(&self, duration: Duration) {
        self.files_parsed.fetch_add(1, Ordering::Relaxed);
        self.total_parse_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_warnings(&self, count: usize) {
        self.warnings.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_conflicts(&self, count: usize) {
        self.conflicts.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average parser time per file in milliseconds
    pub fn avg_parse_time_ms(&self) -> f64 {
        let total = self.total_parse_time_us.load(Ordering::Relaxed);
        let count = self.files_parsed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64 / 1000.0
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Import Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Archives: {} imported, {} rejected",
            self.archives_imported.load(Ordering::Relaxed),
            self.archives_rejected.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Files: {} parsed, {} failed (avg parse: {:.3}ms)",
            self.files_parsed.load(Ordering::Relaxed),
            self.parse_failures.load(Ordering::Relaxed),
            self.avg_parse_time_ms()
        );
        tracing::info!(
            "Warnings: {}, conflicts: {}",
            self.warnings.load(Ordering::Relaxed),
            self.conflicts.load(Ordering::Relaxed)
        );
    }
}

impl Default for ImportMetrics {
    fn default() -> Self {
        Self::new()
    }
}
