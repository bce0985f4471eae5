//! Certsweep Core - Foundation crate for the certsweep sweep tool.
//!
//! This crate provides the shared types, error handling, and configuration
//! management that all other certsweep crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Configuration error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared domain types (`CacheKey`, `CacheEntry`, `Outcome`,
//!   `DiscoveredRecord`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, EndpointConfig, EngineConfig, OutputConfig, ProbeConfig};
pub use error::{ConfigError, ConfigResult};
pub use types::{CacheEntry, CacheKey, DiscoveredRecord, Outcome, ResultPayload};
