//! Chromium-based renderer using chromiumoxide.
//!
//! Every context is backed by its own browser process so nothing (cookies,
//! storage, cache) leaks from one exploration into the next.

use super::{ContextSpec, CookieInfo, NavigationResult, RenderContext, Renderer};
use crate::session::cookies::SeedCookie;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::js_protocol::runtime::{EventConsoleApiCalled, EventExceptionThrown};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error};
use uuid::Uuid;

/// Find the Chromium binary path.
///
/// An explicitly configured path wins, then `~/.scout/chromium/`, then the
/// usual executable names on `PATH`.
pub fn find_chromium(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".scout/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".scout/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".scout/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".scout/chromium/chrome-linux64/chrome"),
                home.join(".scout/chromium/chrome"),
            ]
        };
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Seed cookies are set before any page has loaded, so each one names its
/// own http(s) origin.
fn cookie_param(cookie: &SeedCookie) -> Result<CookieParam> {
    if !cookie.url.starts_with("http://") && !cookie.url.starts_with("https://") {
        bail!("cookie {} has no http origin: {:?}", cookie.name, cookie.url);
    }
    CookieParam::builder()
        .name(cookie.name.clone())
        .value(cookie.value.clone())
        .url(cookie.url.clone())
        .domain(cookie.domain.clone())
        .path(cookie.path.clone())
        .build()
        .map_err(|e| anyhow::anyhow!("invalid cookie {}: {e}", cookie.name))
}

/// Launches one headless Chromium per context.
#[derive(Debug, Default, Clone)]
pub struct ChromiumRenderer;

impl ChromiumRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open_context(&self, spec: &ContextSpec) -> Result<Box<dyn RenderContext>> {
        let chrome_path = find_chromium(spec.chromium_path.as_deref())
            .context("Chromium not found. Set SCOUT_CHROMIUM_PATH or install Chrome.")?;

        let profile = &spec.profile;
        let viewport = Viewport {
            width: profile.width,
            height: profile.height,
            device_scale_factor: Some(profile.device_scale_factor),
            emulating_mobile: profile.is_mobile,
            is_landscape: false,
            has_touch: profile.has_touch,
        };
        let user_data_dir = std::env::temp_dir().join(format!("scout-{}", Uuid::new_v4().simple()));

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(&user_data_dir)
            .request_timeout(spec.navigation_timeout)
            .window_size(profile.width, profile.height)
            .viewport(viewport)
            .arg(format!("--user-agent={}", profile.user_agent))
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");
        if !spec.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler_task.abort();
                return Err(e).context("failed to create new page");
            }
        };

        let mut ctx = Box::new(ChromiumContext {
            browser,
            page,
            handler_task,
            listeners: Vec::new(),
            user_data_dir,
        });
        if let Err(e) = ctx.prepare(&spec.cookies).await {
            let _ = ctx.close().await;
            return Err(e);
        }
        Ok(ctx)
    }
}

/// Forward console output at debug and uncaught page errors at error.
async fn spawn_page_listeners(page: &Page) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::new();

    match page.event_listener::<EventConsoleApiCalled>().await {
        Ok(mut events) => tasks.push(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let text = event
                    .args
                    .iter()
                    .filter_map(|arg| {
                        arg.value
                            .as_ref()
                            .map(|v| v.to_string())
                            .or_else(|| arg.description.clone())
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                debug!(kind = ?event.r#type, "console: {text}");
            }
        })),
        Err(e) => debug!("console listener unavailable: {e}"),
    }

    match page.event_listener::<EventExceptionThrown>().await {
        Ok(mut events) => tasks.push(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                error!("page error: {}", event.exception_details.text);
            }
        })),
        Err(e) => debug!("exception listener unavailable: {e}"),
    }

    tasks
}

/// A Chromium browser with a single page.
pub struct ChromiumContext {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    listeners: Vec<JoinHandle<()>>,
    user_data_dir: PathBuf,
}

impl ChromiumContext {
    async fn prepare(&mut self, cookies: &[SeedCookie]) -> Result<()> {
        if !cookies.is_empty() {
            let params = cookies.iter().map(cookie_param).collect::<Result<Vec<_>>>()?;
            self.browser
                .set_cookies(params)
                .await
                .context("failed to attach seed cookies")?;
        }
        self.listeners = spawn_page_listeners(&self.page).await;
        Ok(())
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        let result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(_)) => {
                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        // `undefined` has no JSON value.
        Ok(result.into_value().unwrap_or(serde_json::Value::Null))
    }

    async fn get_html(&self) -> Result<String> {
        self.page.content().await.context("failed to get HTML")
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn title(&self) -> Result<String> {
        Ok(self
            .page
            .get_title()
            .await
            .context("failed to get title")?
            .unwrap_or_default())
    }

    async fn cookies(&self) -> Result<Vec<CookieInfo>> {
        let cookies = self.page.get_cookies().await.context("failed to read cookies")?;
        Ok(cookies
            .into_iter()
            .map(|c| CookieInfo {
                name: c.name,
                value: c.value,
                domain: c.domain,
            })
            .collect())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .with_context(|| format!("no element for {selector}"))?
            .click()
            .await
            .with_context(|| format!("click on {selector} failed"))?;
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str, key_delay: Duration) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("no element for {selector}"))?;
        element.focus().await.context("focus failed")?;
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            element
                .type_str(ch.encode_utf8(&mut buf))
                .await
                .context("typing failed")?;
            if !key_delay.is_zero() {
                tokio::time::sleep(key_delay).await;
            }
        }
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page
            .screenshot(params)
            .await
            .context("screenshot failed")
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumContext {
            mut browser,
            page,
            handler_task,
            listeners,
            user_data_dir,
        } = *self;

        for task in &listeners {
            task.abort();
        }
        let _ = page.close().await;
        let closed = browser.close().await;
        let _ = browser.wait().await;
        handler_task.abort();
        let _ = std::fs::remove_dir_all(&user_data_dir);

        closed.context("failed to close browser")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::profile::DeviceKind;

    fn spec(kind: DeviceKind) -> ContextSpec {
        ContextSpec {
            profile: kind.profile(),
            cookies: vec![SeedCookie {
                name: "sid".into(),
                value: "abc".into(),
                domain: "localhost".into(),
                path: "/".into(),
                url: "http://localhost/".into(),
            }],
            navigation_timeout: Duration::from_secs(10),
            headless: true,
            chromium_path: None,
        }
    }

    #[test]
    fn test_missing_configured_path_falls_through() {
        let bogus = PathBuf::from("/definitely/not/here/chrome");
        let found = find_chromium(Some(&bogus));
        assert_ne!(found.as_deref(), Some(bogus.as_path()));
    }

    #[test]
    fn test_cookie_param_carries_domain() {
        let param = cookie_param(&spec(DeviceKind::Desktop).cookies[0]).unwrap();
        assert_eq!(param.name, "sid");
        assert_eq!(param.domain.as_deref(), Some("localhost"));
        assert_eq!(param.url.as_deref(), Some("http://localhost/"));
    }

    #[test]
    fn test_cookie_without_http_origin_is_rejected() {
        let mut cookie = spec(DeviceKind::Desktop).cookies.remove(0);
        cookie.url = "about:blank".into();
        assert!(cookie_param(&cookie).is_err());
        cookie.url = String::new();
        assert!(cookie_param(&cookie).is_err());
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_seed_cookies_reach_first_request() {
        use wiremock::matchers::{header, method};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("cookie", "sid=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>signed in</p>", "text/html"))
            .expect(1..)
            .mount(&server)
            .await;

        let origin = format!("{}/", server.uri());
        let mut spec = spec(DeviceKind::Desktop);
        spec.cookies = crate::session::cookies::parse_cookie_header(&origin, "sid=abc").unwrap();
        spec.cookies[0].domain = "127.0.0.1".into();

        let mut ctx = ChromiumRenderer::new()
            .open_context(&spec)
            .await
            .expect("seed cookies must not fail the launch");
        let nav = ctx.navigate(&origin, 10000).await.expect("navigation failed");
        assert!(nav.final_url.starts_with(&server.uri()));
        let body = ctx.execute_js("document.body.innerText").await.unwrap();
        assert_eq!(body.as_str(), Some("signed in"));

        let cookies = ctx.cookies().await.unwrap();
        assert!(cookies.iter().any(|c| c.name == "sid" && c.value == "abc"));
        ctx.close().await.expect("close failed");
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_navigate_and_execute_js() {
        let renderer = ChromiumRenderer::new();
        let mut ctx = renderer
            .open_context(&spec(DeviceKind::Mobile))
            .await
            .expect("failed to create context");

        let nav = ctx
            .navigate(
                "data:text/html,<h1>Hello</h1><p>World</p><button>Login</button>",
                10000,
            )
            .await
            .expect("navigation failed");
        assert!(nav.load_time_ms < 10000);

        let result = ctx
            .execute_js("document.querySelector('h1').textContent")
            .await
            .expect("JS execution failed");
        assert_eq!(result.as_str().unwrap(), "Hello");

        let width = ctx.execute_js("window.innerWidth").await.unwrap();
        assert_eq!(width.as_u64(), Some(375));

        let html = ctx.get_html().await.expect("get_html failed");
        assert!(html.contains("<h1>Hello</h1>"));

        let login = crate::locate::Locator::text("button", "login");
        assert_eq!(ctx.count_visible(&login).await.unwrap(), 1);

        let png = ctx.screenshot_png().await.expect("screenshot failed");
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        ctx.close().await.expect("close failed");
    }
}
