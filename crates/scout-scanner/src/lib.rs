//! Scout Scanner - discovery and extraction orchestration.
//!
//! This crate walks an infinitely scrolling result list, deduplicates the
//! entries it has already seen, and runs a bounded number of concurrent
//! detail-view extractions at a time. Each extraction reveals the panes of
//! one detail view, tells loaded content apart from error placeholders, and
//! assembles a typed [`scout_core::PatentRecord`].
//!
//! # Features
//!
//! - Fingerprint deduplication across scroll passes
//! - Batches of concurrent extraction tasks with a per-task timeout
//! - Bounded reveal retries with exponential backoff and reloads
//! - Bounded content-versus-error polling for every pane
//! - Tabular panes chunked into 1-based rows by a declared field set
//!
//! # Example
//!
//! ```rust,ignore
//! use scout_scanner::{DiscoveryLoop, ItemExtractor, JsonLinesSink};
//! use std::sync::Arc;
//!
//! let extractor = ItemExtractor::new(surface.clone(), config.clone(), Arc::new(JsonLinesSink::stdout()))?;
//! let view = surface.open_view(&config.scanning.start_url).await?;
//! let summary = DiscoveryLoop::new(view.as_ref(), &config, Arc::new(extractor))
//!     .run(&cancel)
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod batch;
pub mod error;
pub mod item;
pub mod orchestrator;
pub mod pane;
pub mod sink;
pub mod table;

// Re-export commonly used types
pub use batch::{BatchStats, TaskBatch};
pub use error::{Result, ScanError};
pub use item::{Extract, ItemExtractor};
pub use orchestrator::{DiscoveryLoop, RunSummary, Termination};
pub use pane::{FieldRead, PaneReader, PaneState};
pub use sink::{JsonLinesSink, MemorySink, RecordSink};
pub use table::{chunk_rows, read_table};
