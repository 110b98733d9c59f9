//! Authentication strategies.
//!
//! The strategy is chosen once per exploration from the supplied inputs:
//! cookies win, then assisted credentials, then plain credentials, and with
//! nothing supplied the page is explored anonymously.

pub mod diagnostics;
pub mod outcome;

use crate::config::ExplorerConfig;
use crate::error::{ScoutError, ScoutResult};
use crate::keywords::KeywordMap;
use crate::locate::cascade::CascadeMatcher;
use crate::locate::{ElementHandle, Locator};
use crate::recognition::{Control, LoginElements, PatternRecognizer};
use crate::renderer::RenderContext;
use crate::session::{Session, SessionManager};
use diagnostics::{DiagnosticArtifacts, DiagnosticsWriter};
use outcome::{gather_signals, LoginFlow, OutcomeClassifier, Rule, Verdict};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Login material supplied by the caller.
#[derive(Clone, Default)]
pub struct LoginInputs {
    pub username: Option<String>,
    pub password: Option<String>,
    pub captcha: Option<String>,
    /// A `name=value; name2=value2` cookie string.
    pub cookies: Option<String>,
    /// Discover the login controls instead of using the built-in tables.
    pub assisted: bool,
}

impl fmt::Debug for LoginInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInputs")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("captcha", &self.captcha)
            .field("cookies", &self.cookies.as_ref().map(|_| "<redacted>"))
            .field("assisted", &self.assisted)
            .finish()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl LoginInputs {
    fn credentials(&self) -> Option<(&str, &str)> {
        Some((present(&self.username)?, present(&self.password)?))
    }

    fn captcha(&self) -> Option<&str> {
        present(&self.captcha)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStrategy {
    NoAuth,
    CredentialLogin,
    CookieLogin,
    AssistedLogin,
}

impl AuthStrategy {
    pub fn select(inputs: &LoginInputs) -> Self {
        if present(&inputs.cookies).is_some() {
            AuthStrategy::CookieLogin
        } else if inputs.credentials().is_some() && inputs.assisted {
            AuthStrategy::AssistedLogin
        } else if inputs.credentials().is_some() {
            AuthStrategy::CredentialLogin
        } else {
            AuthStrategy::NoAuth
        }
    }
}

/// Verdict of one login attempt.
#[derive(Debug, Clone, Serialize)]
pub struct LoginReport {
    pub strategy: AuthStrategy,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<DiagnosticArtifacts>,
}

/// Runs the selected strategy against an explorer's session.
pub struct Authenticator {
    matcher: CascadeMatcher,
    assisted_matcher: CascadeMatcher,
    recognizer: Arc<dyn PatternRecognizer>,
    classifier: OutcomeClassifier,
    diagnostics: DiagnosticsWriter,
    settle: Duration,
    submit_settle: Duration,
    network_idle_timeout: Duration,
    typing_delay: Duration,
}

impl Authenticator {
    pub fn new(
        config: &ExplorerConfig,
        keywords: Arc<KeywordMap>,
        recognizer: Arc<dyn PatternRecognizer>,
    ) -> Self {
        Self {
            matcher: CascadeMatcher::new(config.probe_timeout()),
            assisted_matcher: CascadeMatcher::new(config.assisted_probe_timeout()),
            recognizer,
            classifier: OutcomeClassifier::new(keywords),
            diagnostics: DiagnosticsWriter::new(&config.diagnostics_dir),
            settle: config.settle(),
            submit_settle: config.submit_settle(),
            network_idle_timeout: config.network_idle_timeout(),
            typing_delay: config.typing_delay(),
        }
    }

    /// Log in to `url` with the strategy chosen from `inputs`.
    ///
    /// `slot` holds the explorer's session. The cookie flow closes it and
    /// stores a fresh cookie-seeded one; if that fails the slot stays empty.
    pub async fn login(
        &self,
        manager: &SessionManager,
        slot: &mut Option<Session>,
        url: &str,
        inputs: &LoginInputs,
    ) -> ScoutResult<LoginReport> {
        let strategy = AuthStrategy::select(inputs);
        info!(?strategy, url, "authentication strategy selected");

        let mut diagnostics = None;
        let verdict = match (strategy, inputs.credentials()) {
            (AuthStrategy::CookieLogin, _) => {
                let cookies = inputs.cookies.as_deref().unwrap_or_default();
                let (verdict, artifacts) = self.cookie_login(manager, slot, url, cookies).await?;
                diagnostics = artifacts;
                verdict
            }
            (AuthStrategy::AssistedLogin, Some(creds)) => {
                self.assisted_login(active(slot)?, url, creds, inputs.captcha())
                    .await?
            }
            (AuthStrategy::CredentialLogin, Some(creds)) => {
                self.credential_login(active(slot)?, url, creds, inputs.captcha())
                    .await?
            }
            _ => Verdict::success(Rule::NoAuthRequired),
        };

        Ok(LoginReport {
            strategy,
            verdict,
            diagnostics,
        })
    }

    async fn credential_login(
        &self,
        session: &mut Session,
        url: &str,
        creds: (&str, &str),
        captcha: Option<&str>,
    ) -> ScoutResult<Verdict> {
        info!(username = creds.0, "logging in with credentials");
        self.open_login_page(session, url).await?;
        Ok(self
            .fill_and_submit(session.context(), url, creds, captcha, None, LoginFlow::Credential)
            .await)
    }

    async fn cookie_login(
        &self,
        manager: &SessionManager,
        slot: &mut Option<Session>,
        url: &str,
        cookies: &str,
    ) -> ScoutResult<(Verdict, Option<DiagnosticArtifacts>)> {
        info!("logging in with cookies");
        let previous = slot
            .take()
            .ok_or_else(|| ScoutError::Launch("no session to re-initialize".into()))?;
        let session = slot.insert(manager.reinitialize(previous, url, cookies).await?);
        self.open_login_page(session, url).await?;

        let ctx = session.context();
        let signals = gather_signals(ctx, url, LoginFlow::Cookie).await;
        let verdict = self.classifier.classify(LoginFlow::Cookie, &signals);

        let artifacts = if verdict.wants_diagnostics() {
            match self.diagnostics.capture(ctx).await {
                Ok(artifacts) => Some(artifacts),
                Err(e) => {
                    warn!(dir = %self.diagnostics.dir().display(), "could not write diagnostics: {e}");
                    None
                }
            }
        } else {
            None
        };
        Ok((verdict, artifacts))
    }

    async fn assisted_login(
        &self,
        session: &mut Session,
        url: &str,
        creds: (&str, &str),
        captcha: Option<&str>,
    ) -> ScoutResult<Verdict> {
        info!(
            username = creds.0,
            recognizer = self.recognizer.name(),
            "logging in with discovered login controls"
        );
        self.open_login_page(session, url).await?;

        let elements = self.recognizer.recognize(session.context()).await;
        if elements.lacks_credentials() {
            warn!("no credential fields discovered, falling back to built-in tables");
            return self.credential_login(session, url, creds, captcha).await;
        }
        if elements.submit.is_none() {
            warn!("no submit control discovered");
            return Ok(Verdict::failure(Rule::ControlsNotFound));
        }

        Ok(self
            .fill_and_submit(
                session.context(),
                url,
                creds,
                captcha,
                Some(&elements),
                LoginFlow::Assisted,
            )
            .await)
    }

    async fn open_login_page(&self, session: &mut Session, url: &str) -> ScoutResult<()> {
        session.goto(url).await?;
        tokio::time::sleep(self.settle).await;
        Ok(())
    }

    /// Locate, fill and submit the login form, then classify the result.
    async fn fill_and_submit(
        &self,
        ctx: &dyn RenderContext,
        url: &str,
        (username, password): (&str, &str),
        captcha: Option<&str>,
        discovered: Option<&LoginElements>,
        flow: LoginFlow,
    ) -> Verdict {
        let Some((user_locator, user_field)) = self.resolve(ctx, Control::Username, discovered).await
        else {
            warn!("username field not found");
            return Verdict::failure(Rule::ControlsNotFound);
        };
        let Some((_, password_field)) = self.resolve(ctx, Control::Password, discovered).await else {
            warn!("password field not found");
            return Verdict::failure(Rule::ControlsNotFound);
        };

        if let Err(e) = self.fill(ctx, &user_field, username).await {
            warn!("could not fill username: {e:#}");
            return Verdict::failure(Rule::InteractionFailed);
        }
        if let Err(e) = self.fill(ctx, &password_field, password).await {
            warn!("could not fill password: {e:#}");
            return Verdict::failure(Rule::InteractionFailed);
        }

        if let Some(code) = captcha {
            match self.resolve(ctx, Control::Captcha, discovered).await {
                Some((_, field)) => {
                    if let Err(e) = self.fill(ctx, &field, code).await {
                        warn!("could not fill captcha: {e:#}");
                    }
                }
                None => warn!("captcha supplied but no captcha field found"),
            }
        }

        let Some((_, submit)) = self.resolve(ctx, Control::Submit, discovered).await else {
            warn!("submit control not found");
            return Verdict::failure(Rule::ControlsNotFound);
        };
        if let Err(e) = ctx.click(&submit.selector()).await {
            warn!("could not click submit: {e:#}");
            return Verdict::failure(Rule::InteractionFailed);
        }
        info!("login form submitted");

        if let Err(e) = ctx.wait_for_network_idle(self.network_idle_timeout).await {
            warn!("network did not settle after submit: {e:#}");
        }
        tokio::time::sleep(self.submit_settle).await;

        if flow == LoginFlow::Assisted
            && matches!(ctx.count_visible(&user_locator).await, Ok(n) if n > 0)
        {
            warn!(username = %user_locator, "username field still visible after submit");
            return Verdict::failure(Rule::LoginFormStillVisible);
        }

        let signals = gather_signals(ctx, url, flow).await;
        self.classifier.classify(flow, &signals)
    }

    /// Resolve a login control: an element the recognizer already pinned,
    /// then its discovered locator, then the built-in table for that control.
    async fn resolve(
        &self,
        ctx: &dyn RenderContext,
        control: Control,
        discovered: Option<&LoginElements>,
    ) -> Option<(Locator, ElementHandle)> {
        let scope = discovered.and_then(|e| e.scope.as_ref());
        if let Some(locator) = discovered.and_then(|e| e.locator(control)) {
            if let Some(handle) = discovered.and_then(|e| e.pinned.get(&control)) {
                return Some((locator.clone(), handle.clone()));
            }
            match self.assisted_matcher.probe(ctx, locator, scope).await {
                Ok(handle) => return Some((locator.clone(), handle)),
                Err(e) => warn!(
                    table = control.table(),
                    "discovered locator unusable, trying built-in table: {e}"
                ),
            }
        }
        self.matcher
            .first_visible(ctx, control.table(), &control.candidates(), scope)
            .await
            .hit
            .map(|hit| (hit.locator, hit.handle))
    }

    /// Click, clear, then type key by key.
    async fn fill(&self, ctx: &dyn RenderContext, field: &ElementHandle, text: &str) -> anyhow::Result<()> {
        let selector = field.selector();
        ctx.click(&selector).await?;
        ctx.clear(field).await?;
        ctx.type_text(&selector, text, self.typing_delay).await
    }
}

fn active(slot: &mut Option<Session>) -> ScoutResult<&mut Session> {
    slot.as_mut()
        .ok_or_else(|| ScoutError::Launch("no open session".into()))
}
