//! Scout Core - Foundation crate for patent-scout.
//!
//! This crate provides the configuration layer, central error types and the
//! typed record model shared by the browser, scanner and CLI crates.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`record`] - Typed patent records, tables and field sets
//!
//! # Example
//!
//! ```rust
//! use scout_core::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.validate()?;
//! assert_eq!(config.scanning.batch_capacity, 4);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod record;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, FieldSetConfig, OutputConfig, RetryConfig, ScanningConfig,
    SelectorConfig,
};
pub use error::{ConfigError, ConfigResult, Result, ScoutError};
pub use record::{
    Bibliographic, Claims, Classifications, DetailAddress, FieldSet, Fingerprint, PatentRecord,
    Table, TableRow,
};
