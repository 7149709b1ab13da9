//! Discovery loop over an infinitely scrolling result list.
//!
//! The loop alternates between three phases. *Scanning* queries every entry
//! rendered so far, *Dispatching* selects each entry not seen before and hands
//! its detail address to the [`TaskBatch`], and *Paginating* scrolls to the
//! bottom and waits for the network to settle so more entries render.
//!
//! The seen set is owned by the loop and only mutated here; extraction tasks
//! never touch it.

use crate::batch::{BatchStats, TaskBatch};
use crate::error::{Result, ScanError};
use crate::item::Extract;
use scout_browser::{resolve_url, BrowserActions, ElementHandle};
use scout_core::{AppConfig, DetailAddress, Fingerprint};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Consecutive scanning passes found no result entries
    Exhausted,
    /// Consecutive passes found entries but none were new
    Stale,
    /// The configured item limit was reached
    LimitReached,
    /// The run was cancelled
    Cancelled,
}

/// Totals for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Scanning passes made
    pub passes: u32,
    /// Items handed to the batcher
    pub dispatched: usize,
    /// Entries skipped after a fault. Click failures stay eligible on later
    /// passes; an entry whose detail address could not be resolved does not.
    pub skipped: usize,
    /// Entries given up on after repeated click failures
    pub abandoned: usize,
    /// Extraction task outcomes
    pub tasks: BatchStats,
    /// Why the loop stopped
    pub termination: Termination,
}

enum Phase {
    Scanning,
    Dispatching(Vec<ElementHandle>),
    Paginating,
    Terminal(Termination),
}

/// Drives discovery on the result-list view.
pub struct DiscoveryLoop<'a> {
    view: &'a dyn BrowserActions,
    config: &'a AppConfig,
    batch: TaskBatch,
    seen: HashSet<Fingerprint>,
    click_failures: HashMap<Fingerprint, u32>,
    empty_passes: u32,
    stale_passes: u32,
    passes: u32,
    dispatched: usize,
    skipped: usize,
    abandoned: usize,
}

impl<'a> DiscoveryLoop<'a> {
    /// Create a loop over `view`, dispatching detail addresses to `extractor`.
    #[must_use]
    pub fn new(
        view: &'a dyn BrowserActions,
        config: &'a AppConfig,
        extractor: Arc<dyn Extract>,
    ) -> Self {
        let batch = TaskBatch::new(
            extractor,
            config.scanning.batch_capacity,
            config.scanning.task_timeout(),
        );

        Self {
            view,
            config,
            batch,
            seen: HashSet::new(),
            click_failures: HashMap::new(),
            empty_passes: 0,
            stale_passes: 0,
            passes: 0,
            dispatched: 0,
            skipped: 0,
            abandoned: 0,
        }
    }

    /// Fingerprints selected so far, including abandoned ones.
    #[must_use]
    pub fn seen(&self) -> &HashSet<Fingerprint> {
        &self.seen
    }

    /// Run until the list is exhausted, stale, the item limit is hit, or `cancel` fires.
    ///
    /// Only faults while querying or paginating the result list end the run
    /// with an error; per-item faults are logged and the entry is skipped.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<RunSummary> {
        tracing::info!(
            capacity = self.batch.capacity(),
            "Starting discovery on {}",
            self.config.scanning.start_url
        );

        let mut phase = Phase::Scanning;
        let outcome = loop {
            if cancel.is_cancelled() {
                break Ok(Termination::Cancelled);
            }

            phase = match phase {
                Phase::Scanning => match self.scan().await {
                    Ok(next) => next,
                    Err(e) => break Err(e),
                },
                Phase::Dispatching(items) => self.dispatch_all(items, cancel).await,
                Phase::Paginating => match self.paginate().await {
                    Ok(()) => Phase::Scanning,
                    Err(e) => break Err(e),
                },
                Phase::Terminal(termination) => break Ok(termination),
            };
        };

        match outcome {
            Ok(Termination::Cancelled) => self.batch.abort().await,
            _ => {
                self.batch.drain(cancel).await;
            }
        }
        let termination = outcome?;

        let summary = RunSummary {
            passes: self.passes,
            dispatched: self.dispatched,
            skipped: self.skipped,
            abandoned: self.abandoned,
            tasks: self.batch.stats(),
            termination,
        };
        tracing::info!(
            passes = summary.passes,
            dispatched = summary.dispatched,
            completed = summary.tasks.completed,
            "Discovery finished: {:?}",
            termination
        );
        Ok(summary)
    }

    async fn scan(&mut self) -> Result<Phase> {
        self.passes += 1;
        let items = self
            .view
            .locate_all(&self.config.selectors.result_list)
            .await?;

        if items.is_empty() {
            self.empty_passes += 1;
            if self.empty_passes >= self.config.scanning.empty_passes_to_stop {
                return Ok(Phase::Terminal(Termination::Exhausted));
            }
            tracing::debug!(
                "Scanning pass {} found no entries ({} in a row)",
                self.passes,
                self.empty_passes
            );
            return Ok(Phase::Paginating);
        }

        self.empty_passes = 0;
        tracing::debug!("Scanning pass {} found {} entries", self.passes, items.len());
        Ok(Phase::Dispatching(items))
    }

    async fn dispatch_all(
        &mut self,
        items: Vec<ElementHandle>,
        cancel: &CancellationToken,
    ) -> Phase {
        let seen_before = self.seen.len();

        for item in &items {
            if cancel.is_cancelled() {
                return Phase::Terminal(Termination::Cancelled);
            }
            if self.limit_reached() {
                return Phase::Terminal(Termination::LimitReached);
            }

            if let Err(e) = self.dispatch(item, cancel).await {
                self.skipped += 1;
                tracing::warn!("Skipping result entry {}: {}", item.index, e);
            }
        }

        if self.seen.len() == seen_before {
            self.stale_passes += 1;
            let max_stale = self.config.scanning.max_stale_passes;
            if max_stale > 0 && self.stale_passes >= max_stale {
                return Phase::Terminal(Termination::Stale);
            }
        } else {
            self.stale_passes = 0;
        }

        if self.limit_reached() {
            return Phase::Terminal(Termination::LimitReached);
        }
        Phase::Paginating
    }

    fn limit_reached(&self) -> bool {
        self.config
            .scanning
            .max_items
            .is_some_and(|max| self.dispatched >= max)
    }

    async fn dispatch(
        &mut self,
        item: &ElementHandle,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let fingerprint = Fingerprint::new(self.view.element_text(item).await?)?;
        if self.seen.contains(&fingerprint) {
            return Ok(());
        }

        if let Err(e) = self.select(item, &fingerprint).await {
            self.record_click_failure(fingerprint);
            return Err(e);
        }

        self.seen.insert(fingerprint.clone());
        let address = self.detail_address(&fingerprint).await?;

        tracing::info!("Dispatching {} -> {}", fingerprint, address);
        self.dispatched += 1;
        self.batch.admit(address, cancel).await;
        Ok(())
    }

    /// Click an entry, scrolling it into view and retrying once on timeout.
    async fn select(&self, item: &ElementHandle, fingerprint: &Fingerprint) -> Result<()> {
        let timeout = self.config.scanning.click_timeout();
        let click_failed = |e: scout_browser::BrowserError| ScanError::ClickFailed {
            fingerprint: fingerprint.to_string(),
            reason: e.to_string(),
        };

        match self.view.click_element(item, timeout).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_timeout() => {
                tracing::warn!("Entry {} not clickable, scrolling it into view", fingerprint);
                let top = self.view.element_offset_top(item).await?;
                self.view.scroll_to(top).await?;
                self.view
                    .click_element(item, timeout)
                    .await
                    .map_err(click_failed)
            }
            Err(e) => Err(click_failed(e)),
        }
    }

    fn record_click_failure(&mut self, fingerprint: Fingerprint) {
        let max = self.config.scanning.max_click_failures;
        let failures = self.click_failures.entry(fingerprint.clone()).or_insert(0);
        *failures += 1;

        if max > 0 && *failures >= max {
            tracing::warn!(
                "Abandoning entry {} after {} click failures",
                fingerprint,
                failures
            );
            self.click_failures.remove(&fingerprint);
            self.seen.insert(fingerprint);
            self.abandoned += 1;
        }
    }

    async fn detail_address(&self, fingerprint: &Fingerprint) -> Result<DetailAddress> {
        let href = self
            .view
            .attribute(&self.config.selectors.detail_link, "href")
            .await?
            .filter(|href| !href.trim().is_empty())
            .ok_or_else(|| ScanError::MissingDetailAddress {
                fingerprint: fingerprint.to_string(),
            })?;

        let base = self
            .view
            .current_url()
            .await?
            .unwrap_or_else(|| self.config.scanning.start_url.clone());
        Ok(DetailAddress::new(resolve_url(&base, &href)?))
    }

    async fn paginate(&self) -> Result<()> {
        self.view.scroll_to_bottom().await?;
        self.view.wait_for_idle().await?;
        Ok(())
    }
}
