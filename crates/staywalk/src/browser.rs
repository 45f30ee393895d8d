//! Browser control over the Chrome `DevTools` Protocol.
//!
//! With the `browser` feature enabled, [`Browser`] launches Chromium through
//! chromiumoxide and hands out [`CdpPage`]s implementing [`PageDriver`].
//! Locators are resolved by evaluating their JavaScript rendering in the
//! page; clicks are dispatched as real mouse events at the element centre.

/// Default window width
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 2560;
/// Default window height
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 1440;

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::significant_drop_tightening)]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::PageDriver;
    use crate::locator::Locator;
    use crate::result::{StaywalkError, StaywalkResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::layout::Point;
    use chromiumoxide::page::{Page as RawPage, ScreenshotParams};
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use serde::Deserialize;

    /// Browser instance with a live CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: CdpBrowser,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: BrowserConfig) -> StaywalkResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .viewport(Viewport {
                    width: config.viewport_width,
                    height: config.viewport_height,
                    ..Viewport::default()
                });

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| StaywalkError::BrowserLaunch { message })?;

            let (browser, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| StaywalkError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        tracing::debug!(error = %e, "CDP handler stopped");
                        break;
                    }
                }
            });

            tracing::info!(
                headless = config.headless,
                width = config.viewport_width,
                height = config.viewport_height,
                "browser launched"
            );
            Ok(Self {
                config,
                inner: browser,
                handle,
            })
        }

        /// Open a blank page
        ///
        /// # Errors
        ///
        /// Returns error if page cannot be created
        pub async fn new_page(&self) -> StaywalkResult<CdpPage> {
            let page = self
                .inner
                .new_page("about:blank")
                .await
                .map_err(|e| StaywalkError::page(e.to_string()))?;
            Ok(CdpPage { inner: page })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser and stop the handler task
        pub async fn close(mut self) -> StaywalkResult<()> {
            let closed = self.inner.close().await;
            let _ = self.inner.wait().await;
            self.handle.abort();
            closed.map_err(|e| StaywalkError::BrowserLaunch {
                message: e.to_string(),
            })?;
            tracing::debug!("browser closed");
            Ok(())
        }
    }

    /// A page tab driven over CDP
    #[derive(Debug, Clone)]
    pub struct CdpPage {
        inner: RawPage,
    }

    #[derive(Debug, Deserialize)]
    struct Found<T> {
        found: bool,
        value: Option<T>,
    }

    #[derive(Debug, Deserialize)]
    struct Centre {
        x: f64,
        y: f64,
    }

    impl CdpPage {
        /// Evaluate `expr` and decode its JSON-serialized result.
        ///
        /// Results travel as JSON text so `null` and `undefined` survive
        /// the protocol.
        async fn eval<T: DeserializeOwned>(&self, expr: &str) -> StaywalkResult<T> {
            let wrapped = format!("JSON.stringify(({expr}) ?? null)");
            let text: String = self
                .inner
                .evaluate(wrapped)
                .await
                .map_err(|e| StaywalkError::page(e.to_string()))?
                .into_value()?;
            Ok(serde_json::from_str(&text)?)
        }

        /// Evaluate `body` with `el` bound to the addressed element
        async fn with_element<T: DeserializeOwned>(
            &self,
            locator: &Locator,
            body: &str,
        ) -> StaywalkResult<T> {
            let expr = format!(
                "(() => {{ const el = {}; if (!el) return {{ found: false, value: null }}; \
                 return {{ found: true, value: ({body}) }}; }})()",
                locator.to_element_js()
            );
            let found: Found<T> = self.eval(&expr).await?;
            match (found.found, found.value) {
                (true, Some(value)) => Ok(value),
                (true, None) => Err(StaywalkError::Action {
                    locator: locator.to_string(),
                    message: "element returned no value".to_string(),
                }),
                (false, _) => Err(StaywalkError::ElementNotFound {
                    locator: locator.to_string(),
                }),
            }
        }
    }

    #[async_trait]
    impl PageDriver for CdpPage {
        async fn count(&self, locator: &Locator) -> StaywalkResult<usize> {
            self.eval(&format!("{}.length", locator.to_elements_js()))
                .await
        }

        async fn is_visible(&self, locator: &Locator) -> StaywalkResult<bool> {
            let visible = self
                .with_element::<bool>(
                    locator,
                    "(() => { const r = el.getBoundingClientRect(); const s = getComputedStyle(el); \
                     return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; })()",
                )
                .await;
            match visible {
                Err(StaywalkError::ElementNotFound { .. }) => Ok(false),
                other => other,
            }
        }

        async fn is_enabled(&self, locator: &Locator) -> StaywalkResult<bool> {
            let enabled = self
                .with_element::<bool>(
                    locator,
                    "!el.disabled && el.getAttribute('aria-disabled') !== 'true'",
                )
                .await;
            match enabled {
                Err(StaywalkError::ElementNotFound { .. }) => Ok(false),
                other => other,
            }
        }

        async fn inner_text(&self, locator: &Locator) -> StaywalkResult<String> {
            self.with_element(locator, "el.innerText ?? el.textContent ?? ''")
                .await
        }

        async fn input_value(&self, locator: &Locator) -> StaywalkResult<String> {
            self.with_element(locator, "el.value ?? ''").await
        }

        async fn attribute(&self, locator: &Locator, name: &str) -> StaywalkResult<Option<String>> {
            let name = serde_json::Value::String(name.to_string());
            let value: serde_json::Value = self
                .with_element(locator, &format!("[el.getAttribute({name})]"))
                .await?;
            Ok(value
                .get(0)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string))
        }

        async fn click(&mut self, locator: &Locator) -> StaywalkResult<()> {
            let centre: Centre = self
                .with_element(
                    locator,
                    "(() => { el.scrollIntoView({ block: 'center', inline: 'center' }); \
                     const r = el.getBoundingClientRect(); \
                     return { x: r.left + r.width / 2, y: r.top + r.height / 2 }; })()",
                )
                .await?;
            tracing::trace!(%locator, x = centre.x, y = centre.y, "click");
            self.inner
                .click(Point::new(centre.x, centre.y))
                .await
                .map_err(|e| StaywalkError::Action {
                    locator: locator.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn fill(&mut self, locator: &Locator, text: &str) -> StaywalkResult<()> {
            let value = serde_json::Value::String(text.to_string());
            let _: bool = self
                .with_element(
                    locator,
                    &format!(
                        "(() => {{ el.focus(); \
                         const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
                         const setter = Object.getOwnPropertyDescriptor(proto, 'value').set; \
                         setter.call(el, {value}); \
                         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                         el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                         return true; }})()"
                    ),
                )
                .await?;
            Ok(())
        }

        async fn navigate(&mut self, url: &str) -> StaywalkResult<()> {
            tracing::debug!(url, "navigate");
            let _ = self
                .inner
                .goto(url)
                .await
                .map_err(|e| StaywalkError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn reload(&mut self) -> StaywalkResult<()> {
            let _ = self
                .inner
                .reload()
                .await
                .map_err(|e| StaywalkError::page(e.to_string()))?;
            Ok(())
        }

        async fn current_url(&self) -> StaywalkResult<String> {
            Ok(self
                .inner
                .url()
                .await
                .map_err(|e| StaywalkError::page(e.to_string()))?
                .unwrap_or_else(|| "about:blank".to_string()))
        }

        async fn screenshot(&self) -> StaywalkResult<Vec<u8>> {
            let params = ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();
            self.inner
                .screenshot(params)
                .await
                .map_err(|e| StaywalkError::page(format!("screenshot failed: {e}")))
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, CdpPage};
