//! Task batcher: a bounded group of concurrent extraction tasks.
//!
//! Tasks are admitted one at a time. Once the batch holds `capacity` tasks it
//! is awaited as a whole and cleared before the caller may admit another, so
//! at most `capacity` extractions are ever in flight. Waiting on a batch ends
//! early when the run is cancelled: the remaining tasks are aborted.

use crate::error::ScanError;
use crate::item::Extract;
use scout_core::{DetailAddress, PatentRecord};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Outcome counters across every batch drained so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Batches awaited
    pub batches: usize,
    /// Tasks that produced a record
    pub completed: usize,
    /// Tasks that returned an error
    pub failed: usize,
    /// Tasks that exceeded the per-task timeout
    pub timed_out: usize,
    /// Tasks that panicked
    pub panicked: usize,
    /// Tasks aborted by cancellation
    pub cancelled: usize,
}

type TaskOutput = (DetailAddress, Result<PatentRecord, ScanError>);

/// Bounded set of in-flight extraction tasks.
pub struct TaskBatch {
    extractor: Arc<dyn Extract>,
    capacity: usize,
    timeout: Option<Duration>,
    tasks: JoinSet<TaskOutput>,
    stats: BatchStats,
}

impl TaskBatch {
    /// Create an empty batch. A capacity of zero is treated as one.
    #[must_use]
    pub fn new(extractor: Arc<dyn Extract>, capacity: usize, timeout: Option<Duration>) -> Self {
        Self {
            extractor,
            capacity: capacity.max(1),
            timeout,
            tasks: JoinSet::new(),
            stats: BatchStats::default(),
        }
    }

    /// Tasks currently in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when no task is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Maximum tasks per batch.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Start an extraction for `address`; awaits the whole batch if it is now full.
    pub async fn admit(&mut self, address: DetailAddress, cancel: &CancellationToken) {
        let extractor = Arc::clone(&self.extractor);
        let timeout = self.timeout;

        self.tasks.spawn(async move {
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, extractor.extract(address.clone()))
                    .await
                    .unwrap_or_else(|_| {
                        Err(ScanError::TaskTimeout {
                            address: address.to_string(),
                            timeout: limit,
                        })
                    }),
                None => extractor.extract(address.clone()).await,
            };
            (address, result)
        });

        if self.tasks.len() >= self.capacity {
            self.drain(cancel).await;
        }
    }

    /// Await every task in flight and clear the batch. Returns how many finished.
    ///
    /// If `cancel` fires while waiting, the tasks still running are aborted.
    pub async fn drain(&mut self, cancel: &CancellationToken) -> usize {
        let pending = self.tasks.len();
        if pending == 0 {
            return 0;
        }

        tracing::info!("Awaiting batch of {} extraction tasks", pending);
        let mut aborted = false;
        loop {
            let joined = tokio::select! {
                biased;
                () = cancel.cancelled(), if !aborted => {
                    tracing::warn!("Run cancelled, aborting {} extraction tasks", self.tasks.len());
                    self.tasks.abort_all();
                    aborted = true;
                    continue;
                }
                joined = self.tasks.join_next() => joined,
            };
            match joined {
                Some(outcome) => self.record(outcome),
                None => break,
            }
        }

        self.stats.batches += 1;
        pending
    }

    fn record(&mut self, joined: Result<TaskOutput, JoinError>) {
        match joined {
            Ok((_, Ok(_))) => self.stats.completed += 1,
            Ok((address, Err(e @ ScanError::TaskTimeout { .. }))) => {
                tracing::error!("Extraction of {} abandoned: {}", address, e);
                self.stats.timed_out += 1;
            }
            Ok((address, Err(e))) => {
                tracing::error!("Extraction of {} failed: {}", address, e);
                self.stats.failed += 1;
            }
            Err(e) if e.is_cancelled() => self.stats.cancelled += 1,
            Err(e) => {
                tracing::error!("Extraction task panicked: {}", e);
                self.stats.panicked += 1;
            }
        }
    }

    /// Abort every task in flight and wait for them to wind down.
    pub async fn abort(&mut self) {
        let pending = self.tasks.len();
        if pending == 0 {
            return;
        }

        tracing::warn!("Aborting {} extraction tasks", pending);
        self.tasks.abort_all();
        while let Some(joined) = self.tasks.join_next().await {
            self.record(joined);
        }
        self.stats.batches += 1;
    }
}
