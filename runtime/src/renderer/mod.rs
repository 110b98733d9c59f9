//! Renderer abstraction for browser-based page automation.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide). Everything
//! above this layer talks to a page only through these traits.

pub mod chromium;

use crate::locate::{ElementHandle, Locator};
use crate::session::cookies::SeedCookie;
use crate::session::profile::DeviceProfile;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How long the resource count must stay flat to count as network-idle.
const NETWORK_QUIET_WINDOW: Duration = Duration::from_millis(500);

/// Poll interval used while waiting for network-idle.
const NETWORK_POLL_INTERVAL: Duration = Duration::from_millis(100);

const NETWORK_PROBE_JS: &str = r#"(() => ({
    ready: document.readyState === 'complete',
    resources: performance.getEntriesByType('resource').length
}))()"#;

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// A cookie currently held by a browser context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieInfo {
    pub name: String,
    pub value: String,
    pub domain: String,
}

/// Everything needed to create one isolated browser context.
#[derive(Debug, Clone)]
pub struct ContextSpec {
    pub profile: DeviceProfile,
    /// Cookies attached before the first navigation.
    pub cookies: Vec<SeedCookie>,
    pub navigation_timeout: Duration,
    pub headless: bool,
    pub chromium_path: Option<PathBuf>,
}

/// A browser engine that can create isolated rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Launch an engine instance and open one page configured by `spec`.
    ///
    /// An error here means the engine could not start.
    async fn open_context(&self, spec: &ContextSpec) -> Result<Box<dyn RenderContext>>;
}

/// A single browser context (engine + context + page).
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Get the document title.
    async fn title(&self) -> Result<String>;
    /// Cookies visible to the context.
    async fn cookies(&self) -> Result<Vec<CookieInfo>>;
    /// Click the element matching a CSS selector.
    async fn click(&self, selector: &str) -> Result<()>;
    /// Type text into the element matching a CSS selector, key by key.
    async fn type_text(&self, selector: &str, text: &str, key_delay: Duration) -> Result<()>;
    /// Capture a full-page PNG screenshot.
    async fn screenshot_png(&self) -> Result<Vec<u8>>;

    /// Pin the first visible element matching `locator` (inside the first
    /// `scope` match, if given) under `handle_id`.
    async fn find_visible(
        &self,
        locator: &Locator,
        scope: Option<&Locator>,
        handle_id: &str,
    ) -> Result<Option<ElementHandle>> {
        let value = self
            .execute_js(&locator.resolve_script(scope, handle_id))
            .await?;
        Ok(value.as_str().map(ElementHandle::new))
    }

    /// Number of visible elements matching `locator`.
    async fn count_visible(&self, locator: &Locator) -> Result<usize> {
        let value = self.execute_js(&locator.count_visible_script()).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    /// Rendered text of the document body.
    async fn page_text(&self) -> Result<String> {
        let value = self
            .execute_js("document.body ? document.body.innerText : ''")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Empty a pinned input.
    async fn clear(&self, handle: &ElementHandle) -> Result<()> {
        self.execute_js(&handle.clear_script()).await?;
        Ok(())
    }

    /// Wait until the document is complete and no new resources load for a
    /// short quiet window. Errors when `timeout` elapses first.
    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();

        loop {
            let probe = self.execute_js(NETWORK_PROBE_JS).await?;
            let ready = probe.get("ready").and_then(|v| v.as_bool()).unwrap_or(false);
            let count = probe.get("resources").and_then(|v| v.as_u64()).unwrap_or(0);

            if last_count != Some(count) || !ready {
                last_count = Some(count);
                quiet_since = Instant::now();
            } else if quiet_since.elapsed() >= NETWORK_QUIET_WINDOW {
                return Ok(());
            }

            if start.elapsed() >= timeout {
                anyhow::bail!("network still busy after {}ms", timeout.as_millis());
            }
            tokio::time::sleep(NETWORK_POLL_INTERVAL).await;
        }
    }

    /// Close this context and release the engine behind it.
    async fn close(self: Box<Self>) -> Result<()>;
}
