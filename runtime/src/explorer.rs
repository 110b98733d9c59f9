//! Single-page exploration: open a session, log in, extract the page.
//!
//! Each call owns its session from open to close; nothing carries over
//! between calls or between the URLs of a batch.

use crate::auth::outcome::Verdict;
use crate::auth::{AuthStrategy, Authenticator, LoginInputs};
use crate::config::ExplorerConfig;
use crate::error::{ScoutError, ScoutResult};
use crate::extract::types::{PageRecord, ProbeFailure};
use crate::extract::PageExtractor;
use crate::keywords::KeywordMap;
use crate::locate::cascade::CascadeMatcher;
use crate::recognition::{HeuristicRecognizer, OpenAiRecognizer, PatternRecognizer};
use crate::renderer::Renderer;
use crate::session::profile::DeviceKind;
use crate::session::{Session, SessionManager};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// What to explore and how to authenticate.
#[derive(Debug, Clone)]
pub struct ExploreRequest {
    pub url: String,
    pub device: DeviceKind,
    pub login: LoginInputs,
}

impl ExploreRequest {
    pub fn anonymous(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            device: DeviceKind::Desktop,
            login: LoginInputs::default(),
        }
    }

    /// The same request for another URL.
    pub fn for_url(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..self.clone()
        }
    }
}

/// Result of exploring one URL. `record` is `None` when login failed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorationOutcome {
    pub url: String,
    pub device: DeviceKind,
    pub strategy: AuthStrategy,
    pub verdict: Verdict,
    pub record: Option<PageRecord>,
    pub probe_failures: Vec<ProbeFailure>,
    pub diagnostics: Vec<PathBuf>,
    pub elapsed_ms: u64,
}

/// A URL of a batch that produced an error instead of an outcome.
#[derive(Debug, Clone, Serialize)]
pub struct UrlFailure {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<ExplorationOutcome>,
    pub failures: Vec<UrlFailure>,
    /// Set when the browser could not launch and remaining URLs were skipped.
    pub aborted: bool,
}

pub struct Explorer {
    sessions: SessionManager,
    auth: Authenticator,
    extractor: PageExtractor,
    settle: Duration,
    network_idle_timeout: Duration,
}

impl Explorer {
    /// Build an explorer from configuration.
    ///
    /// The recognizer for assisted login is the chat-completions adapter when
    /// an API key is configured, else the table-driven heuristic.
    pub fn new(renderer: Arc<dyn Renderer>, config: &ExplorerConfig) -> ScoutResult<Self> {
        let keywords = KeywordMap::load(config.keywords_file.as_deref())?;
        let recognizer: Arc<dyn PatternRecognizer> = if config.recognition.is_configured() {
            Arc::new(OpenAiRecognizer::new(config.recognition.clone()))
        } else {
            info!("no recognition service configured, assisted login uses built-in tables");
            Arc::new(HeuristicRecognizer::new(CascadeMatcher::new(
                config.assisted_probe_timeout(),
            )))
        };
        Ok(Self::with_parts(renderer, config, keywords, recognizer))
    }

    pub fn with_parts(
        renderer: Arc<dyn Renderer>,
        config: &ExplorerConfig,
        keywords: KeywordMap,
        recognizer: Arc<dyn PatternRecognizer>,
    ) -> Self {
        let keywords = Arc::new(keywords);
        Self {
            sessions: SessionManager::new(renderer, config),
            auth: Authenticator::new(config, Arc::clone(&keywords), recognizer),
            extractor: PageExtractor::new(keywords),
            settle: config.settle(),
            network_idle_timeout: config.network_idle_timeout(),
        }
    }

    /// Explore one URL.
    ///
    /// Login failure is reported in the outcome, not as an error. Errors are
    /// an invalid URL, a browser that cannot launch, or a failed navigation.
    pub async fn explore(&self, request: &ExploreRequest) -> ScoutResult<ExplorationOutcome> {
        let started = Instant::now();
        validate_url(&request.url)?;
        info!(url = %request.url, device = %request.device, "exploring page");

        let mut slot = Some(self.sessions.open(request.device, None).await?);
        let result = self.run(&mut slot, request, started).await;
        if let Some(session) = slot.take() {
            session.close().await;
        }
        result
    }

    async fn run(
        &self,
        slot: &mut Option<Session>,
        request: &ExploreRequest,
        started: Instant,
    ) -> ScoutResult<ExplorationOutcome> {
        let report = self
            .auth
            .login(&self.sessions, slot, &request.url, &request.login)
            .await?;
        let diagnostics = report
            .diagnostics
            .as_ref()
            .map(|d| d.paths().cloned().collect())
            .unwrap_or_default();

        let mut outcome = ExplorationOutcome {
            url: request.url.clone(),
            device: request.device,
            strategy: report.strategy,
            verdict: report.verdict,
            record: None,
            probe_failures: Vec::new(),
            diagnostics,
            elapsed_ms: 0,
        };

        if report.verdict.success {
            let session = slot
                .as_mut()
                .ok_or_else(|| ScoutError::Launch("session lost during login".into()))?;
            session.goto(&request.url).await?;
            if let Err(e) = session
                .context()
                .wait_for_network_idle(self.network_idle_timeout)
                .await
            {
                warn!("network did not settle before extraction: {e:#}");
            }
            tokio::time::sleep(self.settle).await;

            let (record, failures) = self.extractor.extract(session.context(), &request.url).await;
            outcome.record = Some(record);
            outcome.probe_failures = failures;
        } else {
            warn!(url = %request.url, rule = ?report.verdict.rule, "login failed, page not extracted");
        }

        outcome.elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(outcome)
    }

    /// Explore `urls` one at a time, each in a fresh session, using
    /// `template` for device and login settings.
    ///
    /// Per-URL errors are collected; a launch failure stops the batch.
    pub async fn explore_many(&self, urls: &[String], template: &ExploreRequest) -> BatchReport {
        let mut report = BatchReport::default();
        for (i, url) in urls.iter().enumerate() {
            info!(url = %url, "batch item {}/{}", i + 1, urls.len());
            match self.explore(&template.for_url(url.as_str())).await {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    error!(url = %url, "exploration failed: {e}");
                    let fatal = e.is_fatal();
                    report.failures.push(UrlFailure {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                    if fatal {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }
        report
    }
}

/// Accept only absolute http(s) URLs with a host.
pub fn validate_url(raw: &str) -> ScoutResult<url::Url> {
    let parsed = url::Url::parse(raw).map_err(|e| ScoutError::InvalidUrl(format!("{raw}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ScoutError::InvalidUrl(raw.to_string()));
    }
    Ok(parsed)
}
