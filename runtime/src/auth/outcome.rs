//! Post-submit login outcome classification.
//!
//! [`OutcomeClassifier::classify`] is a pure function over
//! [`OutcomeSignals`]; [`gather_signals`] collects those signals from a live
//! page. Rules are evaluated in order and the first match wins.

use crate::keywords::KeywordMap;
use crate::locate::tables;
use crate::renderer::RenderContext;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Which login flow produced the page being classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginFlow {
    Credential,
    Cookie,
    Assisted,
}

/// The rule that decided a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// No login was requested.
    NoAuthRequired,
    /// A required login control could not be located.
    ControlsNotFound,
    /// Filling or clicking a located control failed.
    InteractionFailed,
    /// The located username field is still visible after submitting.
    LoginFormStillVisible,
    SuccessUrl,
    LoggedOutControl,
    FailureMessage,
    LoginControlsAbsent,
    LoginControlsVisible,
    PersonalContent,
    SessionCookie,
    DefaultOptimistic,
    DefaultConservative,
}

/// Success flag plus the rule that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub success: bool,
    pub rule: Rule,
}

impl Verdict {
    pub fn success(rule: Rule) -> Self {
        Self { success: true, rule }
    }

    pub fn failure(rule: Rule) -> Self {
        Self {
            success: false,
            rule,
        }
    }

    /// Whether this verdict calls for a screenshot and HTML dump.
    pub fn wants_diagnostics(&self) -> bool {
        self.rule == Rule::LoginControlsVisible
    }
}

/// Page state observed after a login attempt.
#[derive(Debug, Clone, Default)]
pub struct OutcomeSignals {
    pub attempted_url: String,
    pub current_url: String,
    /// Rendered text of the page body.
    pub page_text: String,
    /// Visible login controls; only collected for the cookie flow.
    pub login_controls_visible: Option<usize>,
    pub cookie_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OutcomeClassifier {
    keywords: Arc<KeywordMap>,
}

impl OutcomeClassifier {
    pub fn new(keywords: Arc<KeywordMap>) -> Self {
        Self { keywords }
    }

    pub fn classify(&self, flow: LoginFlow, signals: &OutcomeSignals) -> Verdict {
        let verdict = self.decide(flow, signals);
        info!(
            flow = ?flow,
            success = verdict.success,
            rule = ?verdict.rule,
            url = %signals.current_url,
            "login outcome classified"
        );
        verdict
    }

    fn decide(&self, flow: LoginFlow, signals: &OutcomeSignals) -> Verdict {
        let kw = &self.keywords;

        if signals.current_url != signals.attempted_url
            && kw.matches("success_url", &signals.current_url)
        {
            return Verdict::success(Rule::SuccessUrl);
        }
        if kw.matches("logged_out_controls", &signals.page_text) {
            return Verdict::success(Rule::LoggedOutControl);
        }
        if kw.matches("failure_messages", &signals.page_text) {
            return Verdict::failure(Rule::FailureMessage);
        }
        if flow == LoginFlow::Cookie {
            // A count that could not be collected falls through to later rules.
            match signals.login_controls_visible {
                Some(0) => return Verdict::success(Rule::LoginControlsAbsent),
                Some(_) => return Verdict::failure(Rule::LoginControlsVisible),
                None => {}
            }
        }
        if kw.matches("personal", &signals.page_text) {
            return Verdict::success(Rule::PersonalContent);
        }
        if signals
            .cookie_names
            .iter()
            .any(|name| kw.matches("session_cookies", name))
        {
            return Verdict::success(Rule::SessionCookie);
        }
        match flow {
            LoginFlow::Credential | LoginFlow::Assisted => {
                Verdict::success(Rule::DefaultOptimistic)
            }
            LoginFlow::Cookie => Verdict::failure(Rule::DefaultConservative),
        }
    }
}

/// Collect classification signals from the current page.
///
/// Signals that cannot be read are logged and left empty.
pub async fn gather_signals(
    ctx: &dyn RenderContext,
    attempted_url: &str,
    flow: LoginFlow,
) -> OutcomeSignals {
    let current_url = ctx.get_url().await.unwrap_or_else(|e| {
        warn!("could not read current URL: {e:#}");
        String::new()
    });
    let page_text = ctx.page_text().await.unwrap_or_else(|e| {
        warn!("could not read page text: {e:#}");
        String::new()
    });
    let cookie_names = match ctx.cookies().await {
        Ok(cookies) => cookies.into_iter().map(|c| c.name).collect(),
        Err(e) => {
            warn!("could not read cookies: {e:#}");
            Vec::new()
        }
    };

    let login_controls_visible = if flow == LoginFlow::Cookie {
        count_login_controls(ctx).await
    } else {
        None
    };

    OutcomeSignals {
        attempted_url: attempted_url.to_string(),
        current_url,
        page_text,
        login_controls_visible,
        cookie_names,
    }
}

async fn count_login_controls(ctx: &dyn RenderContext) -> Option<usize> {
    let mut total = 0;
    for locator in tables::login_buttons() {
        match ctx.count_visible(&locator).await {
            Ok(n) => total += n,
            Err(e) => {
                warn!(%locator, "could not count login controls: {e:#}");
                return None;
            }
        }
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> OutcomeClassifier {
        OutcomeClassifier::new(Arc::new(KeywordMap::builtin()))
    }

    fn signals(current: &str, text: &str) -> OutcomeSignals {
        OutcomeSignals {
            attempted_url: "https://app.test/login".into(),
            current_url: current.into(),
            page_text: text.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_redirect_to_dashboard_wins_over_failure_text() {
        let s = signals("https://app.test/dashboard", "wrong password");
        assert_eq!(
            classifier().classify(LoginFlow::Credential, &s),
            Verdict::success(Rule::SuccessUrl)
        );
    }

    #[test]
    fn test_same_url_with_keyword_does_not_count_as_redirect() {
        let mut s = signals("https://app.test/user/login", "Login failed, try again");
        s.attempted_url = s.current_url.clone();
        assert_eq!(
            classifier().classify(LoginFlow::Credential, &s),
            Verdict::failure(Rule::FailureMessage)
        );
    }

    #[test]
    fn test_logout_control_beats_failure_message() {
        let s = signals("https://app.test/login", "Sign out | Wrong password banner");
        assert_eq!(
            classifier().classify(LoginFlow::Credential, &s).rule,
            Rule::LoggedOutControl
        );
    }

    #[test]
    fn test_localized_failure_message() {
        let s = signals("https://app.test/login", "提示：密码错误");
        assert!(!classifier().classify(LoginFlow::Assisted, &s).success);
    }

    #[test]
    fn test_cookie_rule_only_applies_to_cookie_flow() {
        let mut s = signals("https://app.test/login", "");
        s.login_controls_visible = Some(1);
        let verdict = classifier().classify(LoginFlow::Cookie, &s);
        assert_eq!(verdict, Verdict::failure(Rule::LoginControlsVisible));
        assert!(verdict.wants_diagnostics());

        assert_eq!(
            classifier().classify(LoginFlow::Credential, &s),
            Verdict::success(Rule::DefaultOptimistic)
        );
    }

    #[test]
    fn test_cookie_flow_no_controls_is_success() {
        let mut s = signals("https://app.test/login", "");
        s.login_controls_visible = Some(0);
        s.cookie_names = vec!["auth_token".into()];
        let verdict = classifier().classify(LoginFlow::Cookie, &s);
        assert_eq!(verdict, Verdict::success(Rule::LoginControlsAbsent));
        assert!(!verdict.wants_diagnostics());
    }

    #[test]
    fn test_personal_and_cookie_rules() {
        let s = signals("https://app.test/login", "Welcome to my profile page");
        assert_eq!(
            classifier().classify(LoginFlow::Credential, &s).rule,
            Rule::PersonalContent
        );

        let mut s = signals("https://app.test/login", "nothing here");
        s.cookie_names = vec!["_ga".into(), "JSESSIONID".into()];
        assert_eq!(
            classifier().classify(LoginFlow::Cookie, &s),
            Verdict::success(Rule::SessionCookie)
        );
    }

    #[test]
    fn test_defaults_are_asymmetric() {
        let s = signals("https://app.test/login", "nothing here");
        assert_eq!(
            classifier().classify(LoginFlow::Credential, &s),
            Verdict::success(Rule::DefaultOptimistic)
        );
        assert_eq!(
            classifier().classify(LoginFlow::Assisted, &s),
            Verdict::success(Rule::DefaultOptimistic)
        );
        assert_eq!(
            classifier().classify(LoginFlow::Cookie, &s),
            Verdict::failure(Rule::DefaultConservative)
        );
    }
}
