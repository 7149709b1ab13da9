use crate::error::{BrowserError, Result};
use std::time::Duration;

/// Opaque reference to the `index`-th element matched by `selector`.
///
/// Handles stay valid as long as the page only appends matches, which is how
/// an infinitely scrolling list grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    /// Selector the element was located with
    pub selector: String,
    /// Position among the selector's matches, in document order
    pub index: usize,
}

impl ElementHandle {
    /// Handle for the `index`-th match of `selector`
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }
}

/// Actions on one open view (tab)
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Handles for every element currently matching a selector
    async fn locate_all(&self, selector: &str) -> Result<Vec<ElementHandle>>;

    /// Wait up to `timeout` for the first match to be rendered and visible
    async fn is_visible(&self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Click the first element matching a selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Click a located element, failing with `BrowserError::Timeout` after `timeout`
    async fn click_element(&self, element: &ElementHandle, timeout: Duration) -> Result<()>;

    /// Inner text of a located element
    async fn element_text(&self, element: &ElementHandle) -> Result<String>;

    /// Vertical page offset of a located element's bounding box
    async fn element_offset_top(&self, element: &ElementHandle) -> Result<f64>;

    /// Inner text of the first match, `None` if nothing matches
    async fn read_text(&self, selector: &str) -> Result<Option<String>>;

    /// Inner text of every match in document order
    async fn read_all_text(&self, selector: &str) -> Result<Vec<String>>;

    /// Attribute of the first match
    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>>;

    /// URL currently shown by the view
    async fn current_url(&self) -> Result<Option<String>>;

    /// Run a script for its side effects
    async fn evaluate(&self, script: &str) -> Result<()>;

    /// Scroll the viewport to a vertical offset
    async fn scroll_to(&self, y: f64) -> Result<()> {
        self.evaluate(&format!("window.scrollTo(0, {y})")).await
    }

    /// Scroll to the bottom of the document
    async fn scroll_to_bottom(&self) -> Result<()> {
        self.evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
    }

    /// Reload the view and wait for the network to go idle
    async fn reload(&self) -> Result<()>;

    /// Wait for the network to go idle
    async fn wait_for_idle(&self) -> Result<()>;

    /// Release the view
    async fn close(&self) -> Result<()>;
}

/// Opens independent views on the remote surface
#[async_trait::async_trait]
pub trait Surface: Send + Sync {
    /// Open a new view at `url` and wait for it to settle
    async fn open_view(&self, url: &str) -> Result<Box<dyn BrowserActions>>;
}

/// Addresses starting with `/` or `(` are XPath, everything else is CSS
pub fn is_xpath(selector: &str) -> bool {
    let s = selector.trim_start();
    s.starts_with('/') || s.starts_with('(')
}

/// Helper to extract domain from URL
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {}", e)))?;

    url.host_str()
        .ok_or_else(|| BrowserError::NavigationError("No host in URL".to_string()))
        .map(|s| s.to_string())
}

/// Resolve a possibly relative `href` against the page it was read from
pub fn resolve_url(base: &str, href: &str) -> Result<String> {
    let base = url::Url::parse(base)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid base URL: {}", e)))?;

    base.join(href)
        .map(|u| u.to_string())
        .map_err(|e| BrowserError::NavigationError(format!("Invalid link {href}: {e}")))
}
