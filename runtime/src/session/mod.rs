//! Session management for one exploration run.
//!
//! A session owns exactly one engine + context + page. The explorer holds at
//! most one session at a time and closes it before acquiring another.

pub mod cookies;
pub mod profile;

use crate::config::ExplorerConfig;
use crate::error::{ScoutError, ScoutResult};
use crate::renderer::{ContextSpec, RenderContext, Renderer};
use cookies::{parse_cookie_header, SeedCookie};
use profile::{DeviceKind, DeviceProfile};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// An open browser session.
pub struct Session {
    /// Unique session identifier.
    pub id: String,
    /// The browser context (with cookies and state).
    context: Box<dyn RenderContext>,
    profile: DeviceProfile,
    default_timeout: Duration,
}

impl Session {
    pub fn context(&self) -> &dyn RenderContext {
        self.context.as_ref()
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Navigate with the session's default timeout.
    ///
    /// Failure is a [`ScoutError::Navigation`] for this URL.
    pub async fn goto(&mut self, url: &str) -> ScoutResult<String> {
        let timeout_ms = self.default_timeout.as_millis() as u64;
        let nav = self
            .context
            .navigate(url, timeout_ms)
            .await
            .map_err(|e| ScoutError::navigation(url, e))?;
        Ok(nav.final_url)
    }

    /// Close the session and release the browser behind it.
    pub async fn close(self) {
        let id = self.id;
        if let Err(e) = self.context.close().await {
            warn!(session = %id, "error while closing session: {e:#}");
        } else {
            info!(session = %id, "session closed");
        }
    }
}

/// Opens sessions against a renderer with a fixed configuration.
pub struct SessionManager {
    renderer: Arc<dyn Renderer>,
    headless: bool,
    chromium_path: Option<std::path::PathBuf>,
    navigation_timeout: Duration,
    next_id: AtomicU64,
}

impl SessionManager {
    pub fn new(renderer: Arc<dyn Renderer>, config: &ExplorerConfig) -> Self {
        Self {
            renderer,
            headless: config.headless,
            chromium_path: config.chromium_path.clone(),
            navigation_timeout: config.navigation_timeout(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Open a session for a device class, optionally seeded with cookies.
    ///
    /// `seed` is `(target_url, cookie_header)`. A cookie header that cannot be
    /// parsed is logged and the session opens without cookies.
    pub async fn open(&self, device: DeviceKind, seed: Option<(&str, &str)>) -> ScoutResult<Session> {
        let profile = device.profile();
        info!(device = %device, "initializing {} profile", profile.kind);

        let cookies: Vec<SeedCookie> = match seed {
            Some((target, header)) => match parse_cookie_header(target, header) {
                Ok(cookies) => {
                    info!("seeding context with {} cookies", cookies.len());
                    cookies
                }
                Err(e) => {
                    error!("failed to parse cookie string: {e}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let spec = ContextSpec {
            profile: profile.clone(),
            cookies,
            navigation_timeout: self.navigation_timeout,
            headless: self.headless,
            chromium_path: self.chromium_path.clone(),
        };

        let context = self
            .renderer
            .open_context(&spec)
            .await
            .map_err(|e| ScoutError::Launch(format!("{e:#}")))?;

        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("sess-{n}");
        info!(session = %id, "browser session ready");

        Ok(Session {
            id,
            context,
            profile,
            default_timeout: self.navigation_timeout,
        })
    }

    /// Close `previous`, then open a fresh session seeded with cookies.
    pub async fn reinitialize(
        &self,
        previous: Session,
        target: &str,
        cookie_header: &str,
    ) -> ScoutResult<Session> {
        let device = previous.profile().kind;
        previous.close().await;
        info!("recreating browser context with cookies");
        self.open(device, Some((target, cookie_header))).await
    }
}
