//! End-of-run statistics.

use certsweep_core::DiscoveredRecord;
use std::path::PathBuf;

/// One failed probe kept as a diagnostic example.
#[derive(Debug, Clone)]
pub struct FailureExample {
    /// Certificate number whose probe failed
    pub cert_no: String,
    /// Failure reason from the classified outcome
    pub reason: String,
}

/// Statistics and artifacts from one sweep run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Subject name that was swept
    pub subject: String,
    /// First certificate number of the range
    pub start: u64,
    /// Last certificate number of the range
    pub end: u64,
    /// Range size (identifiers processed, cached or probed)
    pub total: usize,
    /// Outcomes answered from the cache without a network call
    pub cache_hits: usize,
    /// Outcomes obtained by probing this run
    pub new_queries: usize,
    /// Outcomes whose network call and decoding succeeded
    pub successful_queries: usize,
    /// Outcomes that carried at least one record
    pub with_data: usize,
    /// Records seen across all data-carrying outcomes
    pub records_found: usize,
    /// The records themselves, in emission order
    pub discovered: Vec<DiscoveredRecord>,
    /// First few failures, for diagnostics
    pub failure_examples: Vec<FailureExample>,
    /// Finalized result file, absent when the run was interrupted
    pub result_file: Option<PathBuf>,
    /// Whether the run stopped early on cancellation
    pub interrupted: bool,
}

impl RunReport {
    /// Share of identifiers whose query succeeded, as a percentage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.successful_queries as f64 / self.total as f64 * 100.0
    }
}
