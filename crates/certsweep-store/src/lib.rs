//! Certsweep Store - Durable state for the sweep engine.
//!
//! Three file-backed stores with different durability contracts:
//!
//! - [`cache`] - the outcome history, loaded once at startup and saved once
//!   at the end of a full run
//! - [`ledger`] - the append-only record of discovered certificates,
//!   deduplicated across runs
//! - [`sink`] - the per-run streaming result file, flushed per element and
//!   finalized by rename so a crash leaves an unambiguous temp artifact
//!
//! The result sink is the crash-safe artifact; the cache is a best-effort
//! accelerator for future runs.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cache;
pub mod error;
pub mod ledger;
pub mod sink;

// Re-export commonly used types
pub use cache::HistoryCache;
pub use error::{Result, StoreError};
pub use ledger::CertificateLedger;
pub use sink::ResultSink;
