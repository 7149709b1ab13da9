//! Scripted in-memory stand-in for a browser view.

#![allow(dead_code)]

use async_trait::async_trait;
use scout_browser::{BrowserActions, BrowserError, ElementHandle, Surface};
use scout_core::AppConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const LIST: &str = "//article[@data-qa=\"result_resultList\"]";

/// Config with every wait shortened for tests.
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.scanning.start_url = "https://scout.test/search?q=US".to_string();
    config.scanning.click_timeout_ms = 10;
    config.scanning.task_timeout_secs = 5;
    config.retry.reveal_timeout_ms = 1;
    config.retry.backoff_base_ms = 1;
    config.retry.backoff_max_ms = 2;
    config.retry.poll_interval_ms = 1;
    config.retry.probe_timeout_ms = 1;
    config.retry.max_polls = 20;
    config
}

/// What clicking a reveal control changes on the page.
#[derive(Default, Clone)]
pub struct Reveal {
    pub visible: Vec<(String, Vec<bool>)>,
    pub texts: Vec<(String, Vec<String>)>,
}

impl Reveal {
    pub fn shows(mut self, selector: &str, answers: &[bool]) -> Self {
        self.visible.push((selector.to_string(), answers.to_vec()));
        self
    }

    pub fn with_text(mut self, selector: &str, texts: &[&str]) -> Self {
        self.texts.push((
            selector.to_string(),
            texts.iter().map(ToString::to_string).collect(),
        ));
        self
    }
}

#[derive(Default)]
pub struct State {
    /// Visibility answers per selector; the last answer repeats.
    pub visibility: HashMap<String, VecDeque<bool>>,
    pub texts: HashMap<String, Vec<String>>,
    pub reveals: HashMap<String, Reveal>,
    pub url: Option<String>,

    /// Result-list snapshots returned by successive scans; empty once used up.
    pub passes: VecDeque<Vec<String>>,
    pub list: Vec<String>,
    pub selected: Option<String>,
    /// Click timeouts to raise per label before a click succeeds
    pub click_timeouts: HashMap<String, u32>,
    /// Labels whose clicks fail with a non-timeout error
    pub click_errors: Vec<String>,
    /// Labels whose detail link has no href once selected
    pub missing_href: Vec<String>,

    pub clicks: Vec<String>,
    pub visibility_checks: Vec<String>,
    pub reloads: usize,
    pub scrolls: Vec<f64>,
    pub bottom_scrolls: usize,
    pub closed: usize,
}

#[derive(Clone, Default)]
pub struct FakeView {
    pub state: Arc<Mutex<State>>,
}

impl FakeView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F: FnOnce(&mut State)>(&self, f: F) -> &Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn visible(&self, selector: &str, answers: &[bool]) -> &Self {
        self.with(|s| {
            s.visibility
                .insert(selector.to_string(), answers.iter().copied().collect());
        })
    }

    pub fn text(&self, selector: &str, texts: &[&str]) -> &Self {
        self.with(|s| {
            s.texts.insert(
                selector.to_string(),
                texts.iter().map(ToString::to_string).collect(),
            );
        })
    }

    pub fn on_click(&self, selector: &str, reveal: Reveal) -> &Self {
        self.with(|s| {
            s.reveals.insert(selector.to_string(), reveal);
        })
    }

    pub fn passes(&self, passes: &[&[&str]]) -> &Self {
        self.with(|s| {
            s.passes = passes
                .iter()
                .map(|p| p.iter().map(ToString::to_string).collect())
                .collect();
        })
    }

    pub fn snapshot<T, F: FnOnce(&State) -> T>(&self, f: F) -> T {
        f(&self.state.lock().unwrap())
    }

    fn label(&self, element: &ElementHandle) -> Result<String, BrowserError> {
        self.snapshot(|s| s.list.get(element.index).cloned())
            .ok_or_else(|| BrowserError::SelectorNotFound(element.selector.clone()))
    }
}

#[async_trait]
impl BrowserActions for FakeView {
    async fn locate_all(&self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        let mut s = self.state.lock().unwrap();
        if selector == LIST {
            s.list = s.passes.pop_front().unwrap_or_default();
            return Ok((0..s.list.len())
                .map(|i| ElementHandle::new(selector, i))
                .collect());
        }
        let count = s.texts.get(selector).map_or(0, Vec::len);
        Ok((0..count).map(|i| ElementHandle::new(selector, i)).collect())
    }

    async fn is_visible(&self, selector: &str, _timeout: Duration) -> Result<bool, BrowserError> {
        let mut s = self.state.lock().unwrap();
        s.visibility_checks.push(selector.to_string());
        let answers = match s.visibility.get_mut(selector) {
            Some(answers) => answers,
            None => return Ok(false),
        };
        let answer = if answers.len() > 1 {
            answers.pop_front().unwrap_or(false)
        } else {
            answers.front().copied().unwrap_or(false)
        };
        Ok(answer)
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let mut s = self.state.lock().unwrap();
        s.clicks.push(selector.to_string());
        if let Some(reveal) = s.reveals.get(selector).cloned() {
            for (sel, answers) in reveal.visible {
                s.visibility.insert(sel, answers.into_iter().collect());
            }
            for (sel, texts) in reveal.texts {
                s.texts.insert(sel, texts);
            }
        }
        Ok(())
    }

    async fn click_element(
        &self,
        element: &ElementHandle,
        _timeout: Duration,
    ) -> Result<(), BrowserError> {
        let label = self.label(element)?;
        let mut s = self.state.lock().unwrap();

        if s.click_errors.contains(&label) {
            return Err(BrowserError::ChromiumError(format!("detached: {label}")));
        }
        if let Some(remaining) = s.click_timeouts.get_mut(&label) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BrowserError::Timeout(format!("click on {label}")));
            }
        }

        s.clicks.push(label.clone());
        s.selected = Some(label);
        Ok(())
    }

    async fn element_text(&self, element: &ElementHandle) -> Result<String, BrowserError> {
        self.label(element)
    }

    async fn element_offset_top(&self, element: &ElementHandle) -> Result<f64, BrowserError> {
        Ok(element.index as f64 * 100.0)
    }

    async fn read_text(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.snapshot(|s| s.texts.get(selector).and_then(|t| t.first().cloned())))
    }

    async fn read_all_text(&self, selector: &str) -> Result<Vec<String>, BrowserError> {
        Ok(self.snapshot(|s| s.texts.get(selector).cloned().unwrap_or_default()))
    }

    async fn attribute(&self, _selector: &str, name: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.snapshot(|s| {
            (name == "href")
                .then(|| s.selected.as_ref())
                .flatten()
                .filter(|l| !s.missing_href.contains(l))
                .map(|l| format!("/detail/{l}"))
        }))
    }

    async fn current_url(&self) -> Result<Option<String>, BrowserError> {
        Ok(self.snapshot(|s| s.url.clone()))
    }

    async fn evaluate(&self, _script: &str) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn scroll_to(&self, y: f64) -> Result<(), BrowserError> {
        self.with(|s| s.scrolls.push(y));
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<(), BrowserError> {
        self.with(|s| s.bottom_scrolls += 1);
        Ok(())
    }

    async fn reload(&self) -> Result<(), BrowserError> {
        self.with(|s| s.reloads += 1);
        Ok(())
    }

    async fn wait_for_idle(&self) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.with(|s| s.closed += 1);
        Ok(())
    }
}

/// Hands out clones of one scripted view and records the addresses opened.
#[derive(Clone, Default)]
pub struct FakeSurface {
    pub view: FakeView,
    pub opened: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Surface for FakeSurface {
    async fn open_view(&self, url: &str) -> Result<Box<dyn BrowserActions>, BrowserError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(Box::new(self.view.clone()))
    }
}
