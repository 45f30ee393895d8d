//! PageDriver - the page-like handle every page object drives.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PageDriver (async trait)                                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────┐   ┌──────────────────────────┐  │
//! │  │  CdpPage                │   │  MockDriver              │  │
//! │  │  (feature = "browser")  │   │  (scripted DOM, tests)   │  │
//! │  │  chromiumoxide + JS     │   │                          │  │
//! │  └─────────────────────────┘   └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Queries take `&self`; actions that change the page take `&mut self`.
//! One driver is shared by borrowing it into each page object in turn.

use crate::locator::Locator;
use crate::result::{StaywalkError, StaywalkResult};
use crate::wait::{self, WaitOptions, WaitState};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// Abstract page handle for browser automation
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Number of elements matching the locator, ignoring its n-th narrowing
    async fn count(&self, locator: &Locator) -> StaywalkResult<usize>;

    /// Whether the addressed element exists and is rendered visible.
    /// A missing element is `false`, not an error.
    async fn is_visible(&self, locator: &Locator) -> StaywalkResult<bool>;

    /// Whether the addressed element exists and is not disabled.
    /// A missing element is `false`, not an error.
    async fn is_enabled(&self, locator: &Locator) -> StaywalkResult<bool>;

    /// Rendered text of the addressed element
    async fn inner_text(&self, locator: &Locator) -> StaywalkResult<String>;

    /// Current value of the addressed input element
    async fn input_value(&self, locator: &Locator) -> StaywalkResult<String>;

    /// Attribute of the addressed element (`None` when the attribute is absent)
    async fn attribute(&self, locator: &Locator, name: &str) -> StaywalkResult<Option<String>>;

    /// Click the addressed element
    async fn click(&mut self, locator: &Locator) -> StaywalkResult<()>;

    /// Replace the value of the addressed input element
    async fn fill(&mut self, locator: &Locator, text: &str) -> StaywalkResult<()>;

    /// Navigate to URL
    async fn navigate(&mut self, url: &str) -> StaywalkResult<()>;

    /// Reload the current page
    async fn reload(&mut self) -> StaywalkResult<()>;

    /// Get current URL
    async fn current_url(&self) -> StaywalkResult<String>;

    /// Capture a PNG screenshot of the page
    async fn screenshot(&self) -> StaywalkResult<Vec<u8>>;

    /// Whether the addressed element exists
    async fn exists(&self, locator: &Locator) -> StaywalkResult<bool> {
        Ok(self.count(locator).await? > locator.index())
    }

    /// Poll until the addressed element reaches `state` or `timeout` passes
    async fn wait_for(
        &self,
        locator: &Locator,
        state: WaitState,
        timeout: Duration,
    ) -> StaywalkResult<()> {
        let options = WaitOptions::new().with_timeout(timeout);
        wait::wait_for_state(self, locator, state, &options)
            .await
            .map(|_| ())
    }
}

// ============================================================================
// Mock driver
// ============================================================================

/// Side effect a mock element applies to the page when clicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEffect {
    /// Add an element under the given locator description
    Show(String, MockElement),
    /// Remove every element under the given locator description
    Hide(String),
    /// Change the current URL
    SetUrl(String),
    /// Replace the whole DOM with the next queued frame
    NextFrame,
}

/// A scripted element in the mock DOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Rendered text
    pub text: String,
    /// Input value
    pub value: String,
    /// Rendered visible
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Attributes
    pub attributes: HashMap<String, String>,
    /// Clicks that fail before one succeeds
    pub failing_clicks: usize,
    /// Effects applied on a successful click
    pub on_click: Vec<MockEffect>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            text: String::new(),
            value: String::new(),
            visible: true,
            enabled: true,
            attributes: HashMap::new(),
            failing_clicks: 0,
            on_click: Vec::new(),
        }
    }
}

impl MockElement {
    /// Visible, enabled element with no text
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible element with text
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the input value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Mark hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Fail the first `n` clicks
    #[must_use]
    pub const fn failing_clicks(mut self, n: usize) -> Self {
        self.failing_clicks = n;
        self
    }

    /// Apply an effect when clicked
    #[must_use]
    pub fn on_click(mut self, effect: MockEffect) -> Self {
        self.on_click.push(effect);
        self
    }
}

/// Elements keyed by the description of the locator that finds them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockDom {
    elements: HashMap<String, Vec<MockElement>>,
}

impl MockDom {
    /// Empty DOM
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element matched by `locator` (its n-th narrowing is ignored)
    #[must_use]
    pub fn with(mut self, locator: &Locator, element: MockElement) -> Self {
        self.add(locator, element);
        self
    }

    /// Append an element matched by `locator` (its n-th narrowing is ignored)
    pub fn add(&mut self, locator: &Locator, element: MockElement) {
        self.elements
            .entry(locator.all().to_string())
            .or_default()
            .push(element);
    }

    fn get(&self, locator: &Locator) -> Option<&MockElement> {
        self.elements
            .get(&locator.all().to_string())
            .and_then(|v| v.get(locator.index()))
    }

    fn get_mut(&mut self, locator: &Locator) -> Option<&mut MockElement> {
        self.elements
            .get_mut(&locator.all().to_string())
            .and_then(|v| v.get_mut(locator.index()))
    }

    fn count(&self, locator: &Locator) -> usize {
        self.elements
            .get(&locator.all().to_string())
            .map_or(0, Vec::len)
    }
}

/// Mock driver for unit testing
#[derive(Debug, Default)]
pub struct MockDriver {
    /// Current URL
    pub current_url: String,
    /// Current DOM
    pub dom: MockDom,
    /// DOMs swapped in by [`MockEffect::NextFrame`]
    pub frames: VecDeque<MockDom>,
    /// DOMs swapped in when navigating to a URL
    pub routes: HashMap<String, MockDom>,
    /// Screenshot bytes
    pub screenshot_data: Vec<u8>,
    /// Action history for verification
    pub call_history: Vec<String>,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.current_url = url.into();
        self
    }

    /// Set the initial DOM
    #[must_use]
    pub fn with_dom(mut self, dom: MockDom) -> Self {
        self.dom = dom;
        self
    }

    /// Queue a DOM for the next [`MockEffect::NextFrame`]
    #[must_use]
    pub fn with_frame(mut self, dom: MockDom) -> Self {
        self.frames.push_back(dom);
        self
    }

    /// Serve `dom` when navigating to `url`
    #[must_use]
    pub fn with_route(mut self, url: impl Into<String>, dom: MockDom) -> Self {
        let _ = self.routes.insert(url.into(), dom);
        self
    }

    /// Bytes returned by [`PageDriver::screenshot`]
    #[must_use]
    pub fn with_screenshot(mut self, png: Vec<u8>) -> Self {
        self.screenshot_data = png;
        self
    }

    /// Add an element to the current DOM
    pub fn add(&mut self, locator: &Locator, element: MockElement) {
        self.dom.add(locator, element);
    }

    /// Get action history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Number of recorded actions starting with `prefix`
    #[must_use]
    pub fn calls(&self, prefix: &str) -> usize {
        self.call_history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Check if an action was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.calls(prefix) > 0
    }

    fn element(&self, locator: &Locator) -> StaywalkResult<&MockElement> {
        self.dom
            .get(locator)
            .ok_or_else(|| StaywalkError::ElementNotFound {
                locator: locator.to_string(),
            })
    }

    fn apply(&mut self, effect: MockEffect) {
        match effect {
            MockEffect::Show(key, element) => {
                self.dom.elements.entry(key).or_default().push(element);
            }
            MockEffect::Hide(key) => {
                let _ = self.dom.elements.remove(&key);
            }
            MockEffect::SetUrl(url) => self.current_url = url,
            MockEffect::NextFrame => {
                if let Some(next) = self.frames.pop_front() {
                    self.dom = next;
                }
            }
        }
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn count(&self, locator: &Locator) -> StaywalkResult<usize> {
        Ok(self.dom.count(locator))
    }

    async fn is_visible(&self, locator: &Locator) -> StaywalkResult<bool> {
        Ok(self.dom.get(locator).is_some_and(|e| e.visible))
    }

    async fn is_enabled(&self, locator: &Locator) -> StaywalkResult<bool> {
        Ok(self.dom.get(locator).is_some_and(|e| e.enabled))
    }

    async fn inner_text(&self, locator: &Locator) -> StaywalkResult<String> {
        Ok(self.element(locator)?.text.clone())
    }

    async fn input_value(&self, locator: &Locator) -> StaywalkResult<String> {
        Ok(self.element(locator)?.value.clone())
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> StaywalkResult<Option<String>> {
        Ok(self.element(locator)?.attributes.get(name).cloned())
    }

    async fn click(&mut self, locator: &Locator) -> StaywalkResult<()> {
        self.call_history.push(format!("click:{locator}"));
        let element = self
            .dom
            .get_mut(locator)
            .ok_or_else(|| StaywalkError::ElementNotFound {
                locator: locator.to_string(),
            })?;
        if !element.visible || !element.enabled {
            return Err(StaywalkError::NotInteractable {
                locator: locator.to_string(),
                reason: "hidden or disabled".to_string(),
            });
        }
        if element.failing_clicks > 0 {
            element.failing_clicks -= 1;
            return Err(StaywalkError::Action {
                locator: locator.to_string(),
                message: "click intercepted".to_string(),
            });
        }
        let effects = element.on_click.clone();
        for effect in effects {
            self.apply(effect);
        }
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, text: &str) -> StaywalkResult<()> {
        self.call_history.push(format!("fill:{locator}={text}"));
        let element = self
            .dom
            .get_mut(locator)
            .ok_or_else(|| StaywalkError::ElementNotFound {
                locator: locator.to_string(),
            })?;
        element.value = text.to_string();
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> StaywalkResult<()> {
        self.call_history.push(format!("navigate:{url}"));
        self.current_url = url.to_string();
        if let Some(dom) = self.routes.get(url) {
            self.dom = dom.clone();
        }
        Ok(())
    }

    async fn reload(&mut self) -> StaywalkResult<()> {
        self.call_history.push("reload".to_string());
        Ok(())
    }

    async fn current_url(&self) -> StaywalkResult<String> {
        Ok(self.current_url.clone())
    }

    async fn screenshot(&self) -> StaywalkResult<Vec<u8>> {
        Ok(self.screenshot_data.clone())
    }
}
