//! Certsweep Engine - Bulk probing orchestration.
//!
//! This crate provides the batch executor that sweeps an inclusive
//! certificate-number range against the remote lookup service. It
//! coordinates the probe client, outcome cache, certificate ledger, and
//! per-run result sink:
//!
//! - Fixed-size batches, probed concurrently under a global in-flight cap
//! - Cache hits short-circuit without a network call
//! - Results emitted strictly in request order regardless of completion
//!   order; batch boundaries are synchronization points
//! - Every outcome (including failures) is written through to the cache
//!   and streamed to the result sink; discovered certificates are
//!   deduplicated into the ledger
//! - Cooperative cancellation between batches leaves the temp-named result
//!   artifact as the marker of an incomplete run
//!
//! # Example
//!
//! ```rust,ignore
//! use certsweep_engine::BatchExecutor;
//! use std::sync::Arc;
//!
//! let mut executor = BatchExecutor::new(Arc::new(client), cache, ledger)
//!     .with_batch_size(100)
//!     .with_max_in_flight(100);
//!
//! let report = executor.run("张三", 20_210_000, 20_210_099).await?;
//! println!("{} discovered", report.records_found);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod executor;
pub mod report;

// Re-export commonly used types
pub use error::{EngineError, Result};
pub use executor::BatchExecutor;
pub use report::{FailureExample, RunReport};
