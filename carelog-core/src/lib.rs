//! # carelog-core
//!
//! Core library for carelog - a personal health tracker.
//!
//! This library provides:
//! - Domain types for pain entries, exercise, medication and appointments
//! - A JSON record store with per-record validation
//! - Period analytics and the combined health report
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use carelog_core::analytics::generate_report;
//! use carelog_core::{Config, RecordStore};
//!
//! let config = Config::load().expect("failed to load config");
//! let (store, _) = RecordStore::load_from(&config.store_path()).expect("failed to load store");
//!
//! let report = generate_report(
//!     &store,
//!     config.default_range(),
//!     chrono::Utc::now(),
//!     &config.report_settings(),
//! );
//! println!("{} recommendation(s)", report.recommendations.len());
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use store::{LoadReport, RecordIssue, RecordStore};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod types;
