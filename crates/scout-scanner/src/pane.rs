//! Content reader for the collapsible panes of a detail view.
//!
//! A pane exists only after its reveal control has been clicked. Once
//! revealed it is either still loading, showing content, or showing the
//! generic error container; reads are only attempted once one of the two
//! final states is visible.

use crate::error::{Result, ScanError};
use scout_browser::BrowserActions;
use scout_core::RetryConfig;

/// Settled state of a revealed pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneState {
    /// The content locator became visible first
    Loaded,
    /// The error container became visible first
    Errored,
}

/// How to turn the matches of a field selector into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRead {
    /// Inner text of the first match
    First,
    /// Inner text of every match joined with the separator
    Joined(&'static str),
}

/// Reads panes of one open view.
pub struct PaneReader<'a> {
    view: &'a dyn BrowserActions,
    retry: &'a RetryConfig,
    error_container: &'a str,
}

impl<'a> PaneReader<'a> {
    /// Create a reader over `view`, detecting failures through `error_container`.
    #[must_use]
    pub fn new(view: &'a dyn BrowserActions, retry: &'a RetryConfig, error_container: &'a str) -> Self {
        Self {
            view,
            retry,
            error_container,
        }
    }

    /// View this reader works on.
    #[must_use]
    pub fn view(&self) -> &'a dyn BrowserActions {
        self.view
    }

    /// Click a reveal control, reloading the view while it is not visible.
    ///
    /// Gives up with [`ScanError::PaneTimeout`] after `reveal_attempts` checks.
    pub async fn reveal(&self, selector: &str) -> Result<()> {
        let attempts = self.retry.reveal_attempts;

        for attempt in 0..attempts {
            if self
                .view
                .is_visible(selector, self.retry.reveal_timeout())
                .await?
            {
                self.view.click(selector).await?;
                return Ok(());
            }

            if attempt + 1 < attempts {
                let delay = self.retry.backoff_delay(attempt);
                tracing::warn!(
                    "Reveal control {} not visible (attempt {}/{}), reloading in {:?}",
                    selector,
                    attempt + 1,
                    attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
                self.view.reload().await?;
            }
        }

        Err(ScanError::PaneTimeout {
            selector: selector.to_string(),
            attempts,
        })
    }

    /// Poll until either `content` or the error container is visible.
    ///
    /// Content is checked first on every poll.
    pub async fn await_outcome(&self, content: &str) -> Result<PaneState> {
        let probe = self.retry.probe_timeout();

        for poll in 1..=self.retry.max_polls {
            if self.view.is_visible(content, probe).await? {
                return Ok(PaneState::Loaded);
            }
            if self.view.is_visible(self.error_container, probe).await? {
                return Ok(PaneState::Errored);
            }

            tracing::debug!(content, poll, "Pane still loading");
            tokio::time::sleep(self.retry.poll_interval()).await;
        }

        Err(ScanError::PaneTimeout {
            selector: content.to_string(),
            attempts: self.retry.max_polls,
        })
    }

    /// Reveal a pane and read every `content` match joined with `joiner`.
    ///
    /// Returns an empty string if the pane reports an error.
    pub async fn read_pane(&self, reveal: &str, content: &str, joiner: &str) -> Result<String> {
        self.reveal(reveal).await?;

        match self.await_outcome(content).await? {
            PaneState::Loaded => Ok(self.view.read_all_text(content).await?.join(joiner)),
            PaneState::Errored => {
                tracing::debug!("Pane behind {} reported an error", reveal);
                Ok(String::new())
            }
        }
    }

    /// Read a field that is present without a reveal click.
    ///
    /// Missing elements read as an empty string.
    pub async fn read_field(&self, selector: &str, read: FieldRead) -> Result<String> {
        let text = match read {
            FieldRead::First => self.view.read_text(selector).await?.unwrap_or_default(),
            FieldRead::Joined(joiner) => self.view.read_all_text(selector).await?.join(joiner),
        };

        if text.is_empty() {
            tracing::debug!("Field {} is empty", selector);
        }
        Ok(text)
    }
}
