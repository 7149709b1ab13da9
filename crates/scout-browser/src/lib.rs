//! Browser surface for the discovery loop and extractors.
//!
//! Provides the object-safe [`Surface`] / [`BrowserActions`] traits the
//! scanner is written against, and a headless Chromium implementation with
//! per-domain throttling and a randomized launch profile.

pub mod actions;
pub mod engine;
pub mod error;
pub mod fingerprint;

pub use actions::{extract_domain, is_xpath, resolve_url, BrowserActions, ElementHandle, Surface};
pub use engine::{BrowserEngine, BrowserPage};
pub use error::{BrowserError, Result};
pub use fingerprint::LaunchProfile;
