//! Error types for discovery and extraction.

use scout_browser::BrowserError;
use scout_core::ScoutError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while discovering or extracting items.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A reveal control never became visible, or a pane never showed content or an error
    #[error("pane {selector} did not settle after {attempts} attempts")]
    PaneTimeout {
        /// Selector that was waited on
        selector: String,
        /// Attempts or polls made
        attempts: u32,
    },

    /// A result entry could not be clicked, even after scrolling it into view
    #[error("could not click result entry {fingerprint}: {reason}")]
    ClickFailed {
        /// Entry label
        fingerprint: String,
        /// Underlying failure
        reason: String,
    },

    /// The detail link was missing after selecting an entry
    #[error("no detail address after selecting {fingerprint}")]
    MissingDetailAddress {
        /// Entry label
        fingerprint: String,
    },

    /// An extraction task exceeded its time budget
    #[error("extraction of {address} timed out after {timeout:?}")]
    TaskTimeout {
        /// Detail view being extracted
        address: String,
        /// Configured limit
        timeout: Duration,
    },

    /// Writing a record failed
    #[error("output sink error: {0}")]
    Sink(String),

    #[error("Browser error: {0}")]
    #[allow(missing_docs)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    #[allow(missing_docs)]
    Core(#[from] ScoutError),
}

/// Result type alias using `ScanError`.
pub type Result<T> = std::result::Result<T, ScanError>;
