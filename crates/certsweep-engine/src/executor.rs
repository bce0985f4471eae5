//! Batch executor coordinating probes, cache, ledger, and result sink.

use crate::error::{EngineError, Result};
use crate::report::{FailureExample, RunReport};
use certsweep_client::{classify, ProbeClient};
use certsweep_core::{CacheEntry, CacheKey};
use certsweep_store::{CertificateLedger, HistoryCache, ResultSink};
use chrono::Utc;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How many failed probes are kept as diagnostic examples.
const FAILURE_EXAMPLE_LIMIT: usize = 3;

/// Bounded-concurrency sweep over an inclusive certificate-number range.
///
/// The executor is the sole mutator of its cache, ledger, and sink:
/// concurrent probes only produce replies, and every store update happens on
/// the coordinating task, in ascending identifier order within a batch and
/// in ascending batch order across the range.
pub struct BatchExecutor {
    /// Probe client shared by all in-flight lookups
    client: Arc<dyn ProbeClient>,
    /// Durable outcome cache, consulted before every probe
    cache: HistoryCache,
    /// Append-only ledger of discovered certificates
    ledger: CertificateLedger,
    /// Identifiers probed per batch
    batch_size: usize,
    /// Ceiling on simultaneous in-flight probes
    max_in_flight: usize,
    /// Directory per-run result files are written into
    results_dir: PathBuf,
    /// Cooperative cancellation, checked at batch boundaries
    cancel: CancellationToken,
}

impl BatchExecutor {
    /// Create an executor over the given client and stores.
    #[must_use]
    pub fn new(
        client: Arc<dyn ProbeClient>,
        cache: HistoryCache,
        ledger: CertificateLedger,
    ) -> Self {
        Self {
            client,
            cache,
            ledger,
            batch_size: 100,
            max_in_flight: 100,
            results_dir: PathBuf::from("logs"),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the number of identifiers probed per batch.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the ceiling on simultaneous in-flight probes.
    #[must_use]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Set the directory result files are written into.
    #[must_use]
    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    /// Attach a cancellation token.
    ///
    /// Cancellation stops new batches from being issued; the in-flight batch
    /// completes but its results are not flushed, the result artifact keeps
    /// its temp name, and the cache is not saved.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Sweep `[start, end]` inclusive for the given subject name.
    ///
    /// Every identifier produces exactly one outcome: answered from the
    /// cache, or probed, classified, written through to the cache, and
    /// streamed to the result sink. Discovered certificates are appended to
    /// the ledger, deduplicated by certificate number. An individual
    /// identifier's failure never aborts the run.
    ///
    /// # Errors
    /// Returns error if the range is inverted or if cache, ledger, or sink
    /// I/O fails.
    pub async fn run(&mut self, name: &str, start: u64, end: u64) -> Result<RunReport> {
        if start > end {
            return Err(EngineError::InvalidRange { start, end });
        }

        let cert_numbers: Vec<String> = (start..=end).map(|n| n.to_string()).collect();
        let total = cert_numbers.len();

        let already_cached = cert_numbers
            .iter()
            .filter(|cert_no| self.cache.contains(&CacheKey::new(name, cert_no)))
            .count();

        info!(
            subject = %name,
            start,
            end,
            total,
            cached = already_cached,
            pending = total - already_cached,
            "starting sweep"
        );

        let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let mut sink = ResultSink::create(&self.results_dir, name, &timestamp, start, end)?;

        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));

        let mut cache_hits = 0usize;
        let mut new_queries = 0usize;
        let mut successful_queries = 0usize;
        let mut with_data = 0usize;
        let mut records_found = 0usize;
        let mut discovered = Vec::new();
        let mut failure_examples: Vec<FailureExample> = Vec::new();
        let mut interrupted = false;

        let batch_count = total.div_ceil(self.batch_size);

        for (batch_index, batch) in cert_numbers.chunks(self.batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                warn!(
                    batch = batch_index + 1,
                    batches = batch_count,
                    "interrupt requested, stopping before next batch"
                );
                interrupted = true;
                break;
            }

            // Cache lookups happen up front so the probe futures never touch
            // shared state; join_all returns results in request order.
            let jobs: Vec<(String, Option<CacheEntry>)> = batch
                .iter()
                .map(|cert_no| {
                    let cached = self.cache.get(&CacheKey::new(name, cert_no)).cloned();
                    (cert_no.clone(), cached)
                })
                .collect();

            let batch_results = join_all(jobs.into_iter().map(|(cert_no, cached)| {
                let client = Arc::clone(&self.client);
                let semaphore = Arc::clone(&semaphore);
                let name = name.to_string();
                async move {
                    if let Some(entry) = cached {
                        debug!(cert_no = %cert_no, "cache hit");
                        return (entry, true);
                    }

                    let _permit = semaphore
                        .acquire()
                        .await
                        .expect("probe semaphore is never closed");
                    let reply = client.probe(&name, &cert_no).await;
                    let outcome = classify(reply);
                    (CacheEntry::new(name, cert_no, outcome), false)
                }
            }))
            .await;

            for (entry, from_cache) in batch_results {
                sink.append(&entry)?;

                if from_cache {
                    cache_hits += 1;
                } else {
                    new_queries += 1;
                    self.cache.put(entry.clone());
                }

                if entry.response.query_succeeded() {
                    successful_queries += 1;
                }

                if entry.response.has_data() {
                    with_data += 1;
                    for record in entry.response.records() {
                        records_found += 1;
                        self.ledger.append(record)?;
                        discovered.push(record.clone());
                    }
                } else if let Some(reason) = entry.response.failure_reason() {
                    if failure_examples.len() < FAILURE_EXAMPLE_LIMIT {
                        failure_examples.push(FailureExample {
                            cert_no: entry.cert_no.clone(),
                            reason: reason.to_string(),
                        });
                    }
                }
            }

            debug!(
                batch = batch_index + 1,
                batches = batch_count,
                appended = sink.appended(),
                "batch complete"
            );
        }

        let result_file = if interrupted {
            // The temp-named artifact stays behind as the marker of an
            // incomplete run; the cache keeps its pre-run contents on disk.
            None
        } else {
            self.cache.save()?;
            Some(sink.finalize(total)?)
        };

        info!(
            subject = %name,
            cache_hits,
            new_queries,
            successful_queries,
            records_found,
            interrupted,
            "sweep finished"
        );

        Ok(RunReport {
            subject: name.to_string(),
            start,
            end,
            total,
            cache_hits,
            new_queries,
            successful_queries,
            with_data,
            records_found,
            discovered,
            failure_examples,
            result_file,
            interrupted,
        })
    }

    /// The outcome cache, for post-run inspection.
    #[must_use]
    pub fn cache(&self) -> &HistoryCache {
        &self.cache
    }

    /// The certificate ledger, for post-run inspection.
    #[must_use]
    pub fn ledger(&self) -> &CertificateLedger {
        &self.ledger
    }
}
