use crate::actions::{extract_domain, is_xpath, BrowserActions, ElementHandle, Surface};
use crate::error::{BrowserError, Result};
use crate::fingerprint::LaunchProfile;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures_util::stream::StreamExt;
use scout_core::{BrowserConfig, RetryConfig};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const VISIBILITY_POLL: Duration = Duration::from_millis(100);
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Spaces out view openings per domain
#[derive(Debug)]
struct Throttle {
    last_access: HashMap<String, Instant>,
    min_delay: Duration,
}

impl Throttle {
    fn new(min_delay_ms: u64) -> Self {
        Self {
            last_access: HashMap::new(),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    /// Book the next free slot for `domain` and return how long to wait for it
    fn reserve(&mut self, domain: &str, now: Instant) -> Duration {
        let slot = match self.last_access.get(domain) {
            Some(last) => (*last + self.min_delay).max(now),
            None => now,
        };
        self.last_access.insert(domain.to_string(), slot);
        slot.saturating_duration_since(now)
    }
}

#[derive(Debug, Clone, Copy)]
struct IdlePolicy {
    window: Duration,
    timeout: Duration,
}

impl IdlePolicy {
    fn from_config(retry: &RetryConfig) -> Self {
        Self {
            window: Duration::from_millis(retry.idle_window_ms),
            timeout: Duration::from_millis(retry.idle_timeout_ms),
        }
    }
}

/// JS expression evaluating to an array of every node matching `selector`
fn js_nodes(selector: &str) -> String {
    let quoted = serde_json::Value::String(selector.to_string()).to_string();
    if is_xpath(selector) {
        format!(
            "(() => {{ const r = document.evaluate({quoted}, document, null, \
             XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
             for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
             return out; }})()"
        )
    } else {
        format!("Array.from(document.querySelectorAll({quoted}))")
    }
}

/// Browser automation engine
pub struct BrowserEngine {
    browser: Browser,
    profile: LaunchProfile,
    throttle: Mutex<Throttle>,
    idle: IdlePolicy,
    navigation_timeout: Duration,
}

impl BrowserEngine {
    /// Launch Chromium with the given settings
    pub async fn launch(config: &BrowserConfig, retry: &RetryConfig) -> Result<Self> {
        let profile = LaunchProfile::from_config(config);

        let mut builder = ChromeConfig::builder()
            .no_sandbox()
            .window_size(profile.viewport_width, profile.viewport_height)
            .request_timeout(Duration::from_secs(config.navigation_timeout_secs));
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(ua) = &profile.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }
        let chrome_config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(chrome_config).await?;

        // Spawn browser handler
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler event error: {}", e);
                }
            }
        });

        tracing::info!(
            headless = config.headless,
            width = profile.viewport_width,
            height = profile.viewport_height,
            "Browser launched"
        );

        Ok(Self {
            browser,
            profile,
            throttle: Mutex::new(Throttle::new(config.min_view_interval_ms)),
            idle: IdlePolicy::from_config(retry),
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        })
    }

    /// Profile the browser was launched with
    pub fn profile(&self) -> &LaunchProfile {
        &self.profile
    }

    /// Open a view and return the concrete page type
    pub async fn open_page(&self, url: &str) -> Result<BrowserPage> {
        let wait = self
            .throttle
            .lock()
            .await
            .reserve(&extract_domain(url)?, Instant::now());
        if !wait.is_zero() {
            tracing::debug!("Throttling view open for {:?}", wait);
            tokio::time::sleep(wait).await;
        }

        let page = tokio::time::timeout(self.navigation_timeout, async {
            let page = self.browser.new_page(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, BrowserError>(page)
        })
        .await
        .map_err(|_| BrowserError::NavigationError(format!("timed out opening {url}")))??;

        let view = BrowserPage {
            page,
            idle: self.idle,
        };
        view.wait_for_idle().await?;
        Ok(view)
    }
}

#[async_trait::async_trait]
impl Surface for BrowserEngine {
    async fn open_view(&self, url: &str) -> Result<Box<dyn BrowserActions>> {
        Ok(Box::new(self.open_page(url).await?))
    }
}

/// One Chromium tab
pub struct BrowserPage {
    page: Page,
    idle: IdlePolicy,
}

impl BrowserPage {
    async fn eval<T: DeserializeOwned>(&self, expression: String) -> Result<T> {
        let result = self.page.evaluate(expression).await?;
        result
            .into_value()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn element(&self, handle: &ElementHandle) -> Result<Element> {
        let mut elements = if is_xpath(&handle.selector) {
            self.page.find_xpaths(handle.selector.as_str()).await?
        } else {
            self.page.find_elements(handle.selector.as_str()).await?
        };

        if handle.index < elements.len() {
            Ok(elements.swap_remove(handle.index))
        } else {
            Err(BrowserError::SelectorNotFound(format!(
                "{} [{}]",
                handle.selector, handle.index
            )))
        }
    }
}

#[async_trait::async_trait]
impl BrowserActions for BrowserPage {
    async fn locate_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let count: usize = self
            .eval(format!("{}.length", js_nodes(selector)))
            .await?;
        Ok((0..count)
            .map(|index| ElementHandle::new(selector, index))
            .collect())
    }

    async fn is_visible(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let probe = format!(
            "(() => {{ const el = {}[0]; if (!el) return false; \
             const r = el.getBoundingClientRect(); const s = window.getComputedStyle(el); \
             return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; }})()",
            js_nodes(selector)
        );

        let deadline = Instant::now() + timeout;
        loop {
            if self.eval::<bool>(probe.clone()).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(VISIBILITY_POLL).await;
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self.element(&ElementHandle::new(selector, 0)).await?;
        element.click().await?;
        Ok(())
    }

    async fn click_element(&self, element: &ElementHandle, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, async {
            let el = self.element(element).await?;
            el.click().await?;
            Ok::<_, BrowserError>(())
        })
        .await
        .map_err(|_| {
            BrowserError::Timeout(format!("click on {} [{}]", element.selector, element.index))
        })?
    }

    async fn element_text(&self, element: &ElementHandle) -> Result<String> {
        let text: Option<String> = self
            .eval(format!(
                "(() => {{ const el = {}[{}]; return el ? el.innerText : null; }})()",
                js_nodes(&element.selector),
                element.index
            ))
            .await?;
        text.ok_or_else(|| {
            BrowserError::SelectorNotFound(format!("{} [{}]", element.selector, element.index))
        })
    }

    async fn element_offset_top(&self, element: &ElementHandle) -> Result<f64> {
        let top: Option<f64> = self
            .eval(format!(
                "(() => {{ const el = {}[{}]; \
                 return el ? el.getBoundingClientRect().top + window.scrollY : null; }})()",
                js_nodes(&element.selector),
                element.index
            ))
            .await?;
        top.ok_or_else(|| {
            BrowserError::SelectorNotFound(format!("{} [{}]", element.selector, element.index))
        })
    }

    async fn read_text(&self, selector: &str) -> Result<Option<String>> {
        self.eval(format!(
            "(() => {{ const el = {}[0]; return el ? el.innerText : null; }})()",
            js_nodes(selector)
        ))
        .await
    }

    async fn read_all_text(&self, selector: &str) -> Result<Vec<String>> {
        self.eval(format!("{}.map(e => e.innerText)", js_nodes(selector)))
            .await
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let quoted = serde_json::Value::String(name.to_string()).to_string();
        self.eval(format!(
            "(() => {{ const el = {}[0]; return el ? el.getAttribute({quoted}) : null; }})()",
            js_nodes(selector)
        ))
        .await
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.page.url().await?)
    }

    async fn evaluate(&self, script: &str) -> Result<()> {
        self.page.evaluate(script).await?;
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        tracing::debug!("Reloading view");
        self.page.reload().await?;
        self.page.wait_for_navigation().await?;
        self.wait_for_idle().await
    }

    async fn wait_for_idle(&self) -> Result<()> {
        // Resource timing entries stop growing once the page is quiet.
        let probe = "document.readyState === 'complete' \
                     ? performance.getEntriesByType('resource').length : -1"
            .to_string();

        let started = Instant::now();
        let mut last: i64 = self.eval(probe.clone()).await?;
        let mut stable_since = Instant::now();

        loop {
            tokio::time::sleep(IDLE_POLL).await;
            let current: i64 = self.eval(probe.clone()).await?;

            if current != last || current < 0 {
                last = current;
                stable_since = Instant::now();
            } else if stable_since.elapsed() >= self.idle.window {
                return Ok(());
            }

            if started.elapsed() >= self.idle.timeout {
                tracing::debug!("Network did not settle within {:?}", self.idle.timeout);
                return Ok(());
            }
        }
    }

    async fn close(&self) -> Result<()> {
        self.page.clone().close().await?;
        Ok(())
    }
}
