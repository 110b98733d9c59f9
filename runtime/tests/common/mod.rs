//! Scripted in-memory browser used by the integration tests.
//!
//! A [`FakeSite`] describes what the page looks like before and after the
//! login form is submitted. Visibility is keyed by a locator's display form
//! (`input[name='username']`, `xpath=//input`, `button:has-text('Login')`).

#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use scout_runtime::extract::scripts;
use scout_runtime::locate::{ElementHandle, Locator, HANDLE_ATTR};
use scout_runtime::recognition::{LoginElements, PatternRecognizer};
use scout_runtime::renderer::{
    ContextSpec, CookieInfo, NavigationResult, RenderContext, Renderer,
};
use scout_runtime::session::cookies::SeedCookie;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One page state (before or after submitting).
#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub url: Option<String>,
    pub text: String,
    pub visible: HashSet<String>,
}

impl PageState {
    pub fn with_visible(mut self, keys: &[&str]) -> Self {
        self.visible.extend(keys.iter().map(|k| k.to_string()));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }
}

/// The scripted site served by every context of a [`FakeRenderer`].
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pub title: String,
    pub html: String,
    pub before: PageState,
    pub after: PageState,
    /// Locator keys whose click submits the form.
    pub submit_keys: HashSet<String>,
    pub cookies: Vec<CookieInfo>,
    /// Navigation to URLs containing any of these fails.
    pub unreachable: Vec<String>,
    /// Probe scripts that throw.
    pub failing_scripts: HashSet<String>,
    /// Probe scripts answered with a custom value instead of the default fixture.
    pub script_overrides: HashMap<String, Value>,
}

impl FakeSite {
    pub fn login_page() -> Self {
        Self {
            title: "Acme Portal".into(),
            html: "<html><body><form><input name='username'></form></body></html>".into(),
            ..Default::default()
        }
    }

    pub fn submit_on(mut self, key: &str) -> Self {
        self.submit_keys.insert(key.to_string());
        self
    }

    pub fn fail_script(mut self, script: &str) -> Self {
        self.failing_scripts.insert(script.to_string());
        self
    }
}

/// Everything the fake observed, shared across contexts.
#[derive(Debug, Default)]
pub struct Stats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub find_calls: AtomicUsize,
    pub seeded: Mutex<Vec<Vec<SeedCookie>>>,
    /// `(locator key, text)` for each typed value.
    pub typed: Mutex<Vec<(String, String)>>,
    pub navigations: Mutex<Vec<String>>,
}

impl Stats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.typed.lock().unwrap().clone()
    }
}

pub struct FakeRenderer {
    pub site: FakeSite,
    pub stats: Arc<Stats>,
    pub fail_launch: bool,
}

impl FakeRenderer {
    pub fn new(site: FakeSite) -> Arc<Self> {
        Arc::new(Self {
            site,
            stats: Arc::new(Stats::default()),
            fail_launch: false,
        })
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            site: FakeSite::default(),
            stats: Arc::new(Stats::default()),
            fail_launch: true,
        })
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn open_context(&self, spec: &ContextSpec) -> Result<Box<dyn RenderContext>> {
        if self.fail_launch {
            bail!("chromium binary missing");
        }
        // Contexts start on about:blank, which cannot hold cookies of its own.
        if let Some(cookie) = spec.cookies.iter().find(|c| !c.url.starts_with("http")) {
            bail!("Blank page can not have cookie: {}", cookie.name);
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        self.stats.seeded.lock().unwrap().push(spec.cookies.clone());
        Ok(Box::new(FakeContext {
            site: self.site.clone(),
            stats: Arc::clone(&self.stats),
            seeded: !spec.cookies.is_empty(),
            url: Mutex::new("about:blank".into()),
            submitted: Mutex::new(false),
            handles: Mutex::new(HashMap::new()),
        }))
    }
}

pub struct FakeContext {
    site: FakeSite,
    stats: Arc<Stats>,
    seeded: bool,
    url: Mutex<String>,
    submitted: Mutex<bool>,
    /// handle id -> locator key
    handles: Mutex<HashMap<String, String>>,
}

impl FakeContext {
    fn state(&self) -> &PageState {
        if *self.submitted.lock().unwrap() {
            &self.site.after
        } else {
            &self.site.before
        }
    }

    fn handle_key(&self, selector: &str) -> Option<String> {
        let id = selector
            .strip_prefix(&format!("[{HANDLE_ATTR}=\""))?
            .strip_suffix("\"]")?;
        self.handles.lock().unwrap().get(id).cloned()
    }

    fn fixture(&self, script: &str) -> Value {
        if let Some(value) = self.site.script_overrides.get(script) {
            return value.clone();
        }
        if script == scripts::STRUCTURE_JS {
            json!({"hasHeader": true, "hasForms": true, "formCount": 1, "linkCount": 2, "buttonCount": 1})
        } else if script == scripts::META_JS {
            json!({"description": "Acme customer portal"})
        } else if script == scripts::AREAS_JS {
            json!({
                "viewport": {"width": 1280, "height": 800},
                "candidates": [
                    {"type": "main_content", "tag": "main", "id": "app", "className": "",
                     "text": "Dashboard", "forcedHigh": true, "interactiveCount": 4,
                     "rect": {"top": 0, "left": 0, "width": 1280, "height": 700}},
                    {"type": "functional_module", "tag": "section", "id": "", "className": "card",
                     "text": "Recent orders", "forcedHigh": false, "interactiveCount": 1,
                     "rect": {"top": 700, "left": 0, "width": 50, "height": 20}}
                ]
            })
        } else if script == scripts::forms_js() {
            json!([{
                "id": "profile", "action": "https://portal.app.test/profile", "method": "post",
                "className": "", "buttonText": "Save", "hasPassword": false,
                "fields": [{"type": "email", "tag": "input", "name": "email", "id": "email",
                            "placeholder": "", "label": "", "required": false, "disabled": false}]
            }])
        } else if script == scripts::CONTROLS_JS {
            json!({
                "buttons": [{"text": "Save", "type": "submit", "className": "btn btn-primary",
                             "position": {"top": 10, "left": 20}}],
                "links": [{"text": "Sign out", "href": "https://portal.app.test/logout",
                           "className": "", "isExternal": false, "position": {"top": 0, "left": 0}}]
            })
        } else if script == scripts::CONTENT_JS {
            json!({
                "headings": [{"level": 1, "text": "Dashboard"}],
                "lists": [],
                "paragraphs": ["x".repeat(120)]
            })
        } else if script == scripts::MESSAGES_JS {
            json!([{"className": "alert alert-success", "text": "Saved"}])
        } else if script == scripts::inputs_js() {
            json!([{"type": "email", "tag": "input", "name": "email", "id": "email",
                    "placeholder": "", "label": "", "required": true, "disabled": false,
                    "readOnly": false}])
        } else {
            Value::Null
        }
    }
}

#[async_trait]
impl RenderContext for FakeContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        self.stats.navigations.lock().unwrap().push(url.to_string());
        if self.site.unreachable.iter().any(|u| url.contains(u.as_str())) {
            bail!("net::ERR_NAME_NOT_RESOLVED");
        }
        let submitted = *self.submitted.lock().unwrap();
        let final_url = if submitted {
            self.site.after.url.clone().unwrap_or_else(|| url.to_string())
        } else {
            url.to_string()
        };
        *self.url.lock().unwrap() = final_url.clone();
        Ok(NavigationResult {
            final_url,
            load_time_ms: 1,
        })
    }

    async fn execute_js(&self, script: &str) -> Result<Value> {
        if self.site.failing_scripts.contains(script) {
            bail!("Uncaught TypeError: cannot read properties of null");
        }
        Ok(self.fixture(script))
    }

    async fn get_html(&self) -> Result<String> {
        Ok(self.site.html.clone())
    }

    async fn get_url(&self) -> Result<String> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.site.title.clone())
    }

    async fn cookies(&self) -> Result<Vec<CookieInfo>> {
        if self.seeded {
            Ok(self.site.cookies.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let key = self
            .handle_key(selector)
            .ok_or_else(|| anyhow!("no element for {selector}"))?;
        if self.site.submit_keys.contains(&key) {
            // Submitting reloads the page, dropping every pinned element.
            self.handles.lock().unwrap().clear();
            *self.submitted.lock().unwrap() = true;
            if let Some(url) = &self.site.after.url {
                *self.url.lock().unwrap() = url.clone();
            }
        }
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str, _key_delay: Duration) -> Result<()> {
        let key = self
            .handle_key(selector)
            .ok_or_else(|| anyhow!("no element for {selector}"))?;
        self.stats.typed.lock().unwrap().push((key, text.to_string()));
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn find_visible(
        &self,
        locator: &Locator,
        _scope: Option<&Locator>,
        handle_id: &str,
    ) -> Result<Option<ElementHandle>> {
        self.stats.find_calls.fetch_add(1, Ordering::SeqCst);
        let key = locator.to_string();
        if self.state().visible.contains(&key) {
            self.handles
                .lock()
                .unwrap()
                .insert(handle_id.to_string(), key);
            Ok(Some(ElementHandle::new(handle_id)))
        } else {
            Ok(None)
        }
    }

    async fn count_visible(&self, locator: &Locator) -> Result<usize> {
        Ok(usize::from(self.state().visible.contains(&locator.to_string())))
    }

    async fn page_text(&self) -> Result<String> {
        Ok(self.state().text.clone())
    }

    async fn clear(&self, _handle: &ElementHandle) -> Result<()> {
        Ok(())
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A recognizer that always proposes the same elements.
pub struct FixedRecognizer(pub LoginElements);

#[async_trait]
impl PatternRecognizer for FixedRecognizer {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn recognize(&self, _ctx: &dyn RenderContext) -> LoginElements {
        self.0.clone()
    }
}
