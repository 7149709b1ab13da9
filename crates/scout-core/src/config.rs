//! Configuration management for patent-scout.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Defaults target the Espacenet
//! result list and detail-view layout.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/patent-scout/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Discovery loop and batching settings
    pub scanning: ScanningConfig,
    /// Pane polling and reveal retry settings
    pub retry: RetryConfig,
    /// Element addresses on the result list and detail view
    pub selectors: SelectorConfig,
    /// Column names for the tabular panes
    pub fields: FieldSetConfig,
    /// Record output settings
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SCOUT_HEADLESS`: Override browser headless mode (true/false)
    /// - `SCOUT_START_URL`: Override the result-list page
    /// - `SCOUT_BATCH_CAPACITY`: Override the number of concurrent extractions
    /// - `SCOUT_OUTPUT`: Override the JSON-lines output path
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        Ok(config)
    }

    /// Apply `SCOUT_*` environment overrides on top of the current values.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("SCOUT_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("SCOUT_START_URL") {
            if !val.is_empty() {
                tracing::debug!("Override scanning.start_url from env: {}", val);
                self.scanning.start_url = val;
            }
        }

        if let Ok(val) = std::env::var("SCOUT_BATCH_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                self.scanning.batch_capacity = capacity;
                tracing::debug!("Override scanning.batch_capacity from env: {}", capacity);
            }
        }

        if let Ok(val) = std::env::var("SCOUT_OUTPUT") {
            if !val.is_empty() {
                tracing::debug!("Override output.path from env: {}", val);
                self.output.path = Some(PathBuf::from(val));
            }
        }
    }

    /// Save configuration to the default path.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path
            .parent()
            .ok_or_else(|| ConfigError::invalid("config_path", "no parent directory"))?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/patent-scout/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "patent-scout", "patent-scout")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Check the values the discovery loop and extractors rely on.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scanning.start_url.trim().is_empty() {
            return Err(ConfigError::invalid("scanning.start_url", "cannot be empty"));
        }
        if self.scanning.batch_capacity == 0 {
            return Err(ConfigError::invalid(
                "scanning.batch_capacity",
                "must be at least 1",
            ));
        }
        if self.scanning.empty_passes_to_stop == 0 {
            return Err(ConfigError::invalid(
                "scanning.empty_passes_to_stop",
                "must be at least 1",
            ));
        }
        if self.retry.reveal_attempts == 0 {
            return Err(ConfigError::invalid("retry.reveal_attempts", "must be at least 1"));
        }
        if self.retry.max_polls == 0 {
            return Err(ConfigError::invalid("retry.max_polls", "must be at least 1"));
        }

        for (name, selector) in self.selectors.entries() {
            if selector.trim().is_empty() {
                return Err(ConfigError::invalid(
                    &format!("selectors.{name}"),
                    "cannot be empty",
                ));
            }
        }

        for (name, fields) in [
            ("citations", &self.fields.citations),
            ("legal_events", &self.fields.legal_events),
            ("family", &self.fields.family),
        ] {
            if fields.is_empty() {
                return Err(ConfigError::invalid(
                    &format!("fields.{name}"),
                    "needs at least one column",
                ));
            }
        }

        Ok(())
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// Pick a desktop user agent at random on launch
    pub randomize_user_agent: bool,
    /// Minimum delay between opening two views on the same domain
    pub min_view_interval_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
            randomize_user_agent: true,
            min_view_interval_ms: 1000,
        }
    }
}

/// Discovery loop and task batching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// Result-list page the discovery loop starts from
    pub start_url: String,
    /// Maximum number of extraction tasks in flight at once
    pub batch_capacity: usize,
    /// Per-item extraction timeout in seconds (0 = no timeout)
    pub task_timeout_secs: u64,
    /// Timeout for clicking a result-list entry
    pub click_timeout_ms: u64,
    /// Consecutive empty scanning passes before the loop stops
    pub empty_passes_to_stop: u32,
    /// Consecutive passes without a new item before the loop stops (0 = never)
    pub max_stale_passes: u32,
    /// Click failures after which an item is abandoned
    pub max_click_failures: u32,
    /// Stop after dispatching this many items
    pub max_items: Option<usize>,
}

impl ScanningConfig {
    /// Per-item timeout, `None` when disabled.
    #[must_use]
    pub fn task_timeout(&self) -> Option<Duration> {
        (self.task_timeout_secs > 0).then(|| Duration::from_secs(self.task_timeout_secs))
    }

    /// Click timeout as a `Duration`.
    #[must_use]
    pub fn click_timeout(&self) -> Duration {
        Duration::from_millis(self.click_timeout_ms)
    }
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            start_url: "https://worldwide.espacenet.com/patent/search?q=US".to_string(),
            batch_capacity: 4,
            task_timeout_secs: 300,
            click_timeout_ms: 5000,
            empty_passes_to_stop: 2,
            max_stale_passes: 3,
            max_click_failures: 3,
            max_items: None,
        }
    }
}

/// Reveal retry and pane polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// How long a reveal control may take to become visible
    pub reveal_timeout_ms: u64,
    /// Reveal attempts (each failed attempt reloads the view)
    pub reveal_attempts: u32,
    /// Base backoff after a failed reveal
    pub backoff_base_ms: u64,
    /// Upper bound for the reveal backoff
    pub backoff_max_ms: u64,
    /// Delay between two content/error probes
    pub poll_interval_ms: u64,
    /// Visibility timeout of a single probe
    pub probe_timeout_ms: u64,
    /// Probes before a pane is declared timed out
    pub max_polls: u32,
    /// Network is considered idle after this long without new requests
    pub idle_window_ms: u64,
    /// Give up waiting for network idle after this long
    pub idle_timeout_ms: u64,
}

impl RetryConfig {
    /// Reveal visibility timeout.
    #[must_use]
    pub fn reveal_timeout(&self) -> Duration {
        Duration::from_millis(self.reveal_timeout_ms)
    }

    /// Delay between polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Visibility timeout of a single probe.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Exponential backoff after the given (zero-based) failed attempt, capped at
    /// `backoff_max_ms`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay = self.backoff_base_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.backoff_max_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            reveal_timeout_ms: 5000,
            reveal_attempts: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 10_000,
            poll_interval_ms: 500,
            probe_timeout_ms: 500,
            max_polls: 120,
            idle_window_ms: 500,
            idle_timeout_ms: 15_000,
        }
    }
}

/// Element addresses. Values starting with `/` or `(` are XPath, anything else CSS.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One entry of the infinitely scrolling result list
    pub result_list: String,
    /// Link to the currently selected item's detail view
    pub detail_link: String,
    /// Publication number on the detail view
    pub number: String,
    /// Title on the detail view
    pub title: String,
    /// Applicants block
    pub applicants: String,
    /// Inventors block
    pub inventors: String,
    /// Abstract block
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// IPC classifications
    pub ipc: String,
    /// CPC classifications
    pub cpc: String,
    /// Priority numbers
    pub priorities: String,
    /// Application number
    pub application: String,
    /// Publication number(s)
    pub publication: String,
    /// Also published as
    pub published_as: String,
    /// Description tab
    pub description_tab: String,
    /// Original claims tab
    pub claims_original_tab: String,
    /// Claims tree tab
    pub claims_tree_tab: String,
    /// Citations tab
    pub citations_tab: String,
    /// Legal events tab
    pub legal_events_tab: String,
    /// Patent family tab
    pub family_tab: String,
    /// Generic text pane shown after a tab is revealed
    pub content_pane: String,
    /// Generic error container shown instead of a pane
    pub error_container: String,
    /// Generic table cell of a tabular pane
    pub table_cell: String,
}

impl SelectorConfig {
    /// Every selector with its config key.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, &str); 22] {
        [
            ("result_list", &self.result_list),
            ("detail_link", &self.detail_link),
            ("number", &self.number),
            ("title", &self.title),
            ("applicants", &self.applicants),
            ("inventors", &self.inventors),
            ("abstract", &self.abstract_text),
            ("ipc", &self.ipc),
            ("cpc", &self.cpc),
            ("priorities", &self.priorities),
            ("application", &self.application),
            ("publication", &self.publication),
            ("published_as", &self.published_as),
            ("description_tab", &self.description_tab),
            ("claims_original_tab", &self.claims_original_tab),
            ("claims_tree_tab", &self.claims_tree_tab),
            ("citations_tab", &self.citations_tab),
            ("legal_events_tab", &self.legal_events_tab),
            ("family_tab", &self.family_tab),
            ("content_pane", &self.content_pane),
            ("error_container", &self.error_container),
            ("table_cell", &self.table_cell),
        ]
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            result_list: r#"//article[@data-qa="result_resultList"]"#.to_string(),
            detail_link: r#"//a[@data-qa="publicationNumber"]"#.to_string(),
            number: r#"//a[@data-qa="publicationNumber"]/span"#.to_string(),
            title: r#"//span[@data-qa="publicationTitle"]"#.to_string(),
            applicants: "#biblio-applicants-content".to_string(),
            inventors: "#biblio-inventors-content".to_string(),
            abstract_text: "#biblio-abstract-content".to_string(),
            ipc: "#biblio-international-content".to_string(),
            cpc: r#"//div[@id="biblio-cooperative-content"]//div[contains(@class, "text-collapse__wrapper")]"#
                .to_string(),
            priorities: r#"//div[./a[@id="biblio-priority-numbers-content-link"]]"#.to_string(),
            application: "#biblio-application-number-content".to_string(),
            publication: "#biblio-publication-number-content".to_string(),
            published_as: "#biblio-also-published-as-content".to_string(),
            description_tab: r#"//li[@data-qa="descriptionTab_resultDescription"]"#.to_string(),
            claims_original_tab: r#"//li[@data-qa="claimsTab_resultDescription"]"#.to_string(),
            claims_tree_tab: r#"//li[@data-qa="claimsComponent_ClaimsTreeTab_resultDescription"]"#
                .to_string(),
            citations_tab: r#"//li[@data-qa="citationsTab_resultDescription"]"#.to_string(),
            legal_events_tab: r#"//li[@data-qa="legalEventsTab_resultDescription"]"#.to_string(),
            family_tab: r#"//li[@data-qa="patentFamilyTab_resultDescription"]"#.to_string(),
            content_pane: r#"//div[contains(@class, "text-block__content")]"#.to_string(),
            error_container: r#"//div[contains(@class, "error__container")]"#.to_string(),
            table_cell: r#"//td[contains(@class, "table__cell")]"#.to_string(),
        }
    }
}

/// Ordered column names of the tabular panes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSetConfig {
    /// Citations table columns
    pub citations: Vec<String>,
    /// Legal events table columns
    pub legal_events: Vec<String>,
    /// Patent family table columns
    pub family: Vec<String>,
}

fn owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(ToString::to_string).collect()
}

impl Default for FieldSetConfig {
    fn default() -> Self {
        Self {
            citations: owned(&[
                "CitationOrigin",
                "Publication",
                "Title",
                "PriorityDate",
                "PublicationDate",
                "Applicants",
                "InternationalPatentClassification",
                "CPCSort",
            ]),
            legal_events: owned(&[
                "Event indicator",
                "Category",
                "Event description",
                "Countries",
                "Event date",
                "Effective date",
                "Details",
            ]),
            family: owned(&[
                "Publication",
                "Application number",
                "Title",
                "Publication date",
                "Applicants",
            ]),
        }
    }
}

/// Record output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON-lines file records are appended to (stdout when unset)
    pub path: Option<PathBuf>,
}
