//! Login-element discovery for assisted login.
//!
//! A [`PatternRecognizer`] looks at the current page and proposes locators
//! for the username, password, captcha and submit controls. Recognizers
//! never fail: any problem yields [`LoginElements::default()`] (all empty)
//! and the caller falls back to the built-in cascade tables.

pub mod heuristic;
pub mod openai;

use crate::error::ScoutError;
use crate::locate::{tables, ElementHandle, Locator, LocatorKind};
use crate::renderer::RenderContext;
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{info, warn};

pub use heuristic::HeuristicRecognizer;
pub use openai::OpenAiRecognizer;

/// Maximum markup length (in characters) sent to an external service.
pub const MARKUP_CAP: usize = 200_000;

/// Longest locator accepted from an external service.
const MAX_LOCATOR_LEN: usize = 512;

/// Response keys of the recognition contract.
const KEY_USERNAME: &str = "username_xpath";
const KEY_PASSWORD: &str = "password_xpath";
const KEY_CAPTCHA: &str = "captcha_xpath";
const KEY_SUBMIT: &str = "login_button_xpath";

/// One of the login controls a recognizer looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Username,
    Password,
    Captcha,
    Submit,
}

impl Control {
    pub const ALL: [Control; 4] = [
        Control::Username,
        Control::Password,
        Control::Captcha,
        Control::Submit,
    ];

    /// Name of the control's candidate table, as used in logs.
    pub fn table(self) -> &'static str {
        match self {
            Control::Username => "username",
            Control::Password => "password",
            Control::Captcha => "captcha",
            Control::Submit => "submit",
        }
    }

    /// The built-in candidate table for this control.
    pub fn candidates(self) -> Vec<Locator> {
        match self {
            Control::Username => tables::username(),
            Control::Password => tables::password(),
            Control::Captcha => tables::captcha(),
            Control::Submit => tables::submit(),
        }
    }
}

/// Locators for the login controls of a page. `None` means "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginElements {
    pub username: Option<Locator>,
    pub password: Option<Locator>,
    pub captcha: Option<Locator>,
    pub submit: Option<Locator>,
    /// Container the locators were resolved in, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Locator>,
    /// Elements already resolved on the live page while recognizing.
    #[serde(skip)]
    pub pinned: HashMap<Control, ElementHandle>,
}

impl LoginElements {
    pub fn locator(&self, control: Control) -> Option<&Locator> {
        match control {
            Control::Username => self.username.as_ref(),
            Control::Password => self.password.as_ref(),
            Control::Captcha => self.captcha.as_ref(),
            Control::Submit => self.submit.as_ref(),
        }
    }

    fn slot_mut(&mut self, control: Control) -> &mut Option<Locator> {
        match control {
            Control::Username => &mut self.username,
            Control::Password => &mut self.password,
            Control::Captcha => &mut self.captcha,
            Control::Submit => &mut self.submit,
        }
    }

    /// Record a control found on the live page along with its pinned element.
    pub fn pin(&mut self, control: Control, locator: Locator, handle: ElementHandle) {
        *self.slot_mut(control) = Some(locator);
        self.pinned.insert(control, handle);
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.captcha.is_none()
            && self.submit.is_none()
    }

    /// Neither of the two credential fields was found.
    pub fn lacks_credentials(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }

    fn log_summary(&self, source: &str) {
        let show = |l: &Option<Locator>| l.as_ref().map_or("not found".to_string(), |l| l.to_string());
        info!(
            source,
            username = %show(&self.username),
            password = %show(&self.password),
            captcha = %show(&self.captcha),
            submit = %show(&self.submit),
            "login elements identified"
        );
    }
}

/// Something that can propose login-element locators for a live page.
#[async_trait]
pub trait PatternRecognizer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Inspect the page; never fails, returns all-empty on any problem.
    async fn recognize(&self, ctx: &dyn RenderContext) -> LoginElements;
}

/// Cap markup at [`MARKUP_CAP`] characters. Returns whether it was cut.
pub fn truncate_markup(markup: &str) -> (Cow<'_, str>, bool) {
    match markup.char_indices().nth(MARKUP_CAP) {
        Some((byte_idx, _)) => {
            warn!(
                original_chars = markup.chars().count(),
                kept_chars = MARKUP_CAP,
                "page markup truncated before recognition"
            );
            (Cow::Borrowed(&markup[..byte_idx]), true)
        }
        None => (Cow::Borrowed(markup), false),
    }
}

fn json_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("JSON block pattern is valid"))
}

/// Validate one locator string proposed by an external service.
pub fn validate_locator(raw: &str) -> Option<Locator> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.len() > MAX_LOCATOR_LEN || raw.chars().any(char::is_control) {
        warn!("discarding implausible locator ({} bytes)", raw.len());
        return None;
    }
    let locator = Locator::parse(raw)?;
    if locator.kind == LocatorKind::Css && scraper::Selector::parse(&locator.expression).is_err() {
        warn!(locator = %raw, "discarding locator that is not valid CSS");
        return None;
    }
    Some(locator)
}

/// Parse a free-text service reply into validated login elements.
///
/// The first `{...}` block is taken as the JSON object. Missing keys and
/// non-string values count as "not found".
pub fn parse_login_elements(reply: &str) -> Result<LoginElements, ScoutError> {
    let block = json_block()
        .find(reply)
        .ok_or_else(|| ScoutError::ExternalService("no JSON object in reply".into()))?;
    let value: serde_json::Value = serde_json::from_str(block.as_str())
        .map_err(|e| ScoutError::ExternalService(format!("malformed JSON in reply: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| ScoutError::ExternalService("reply JSON is not an object".into()))?;

    let field = |key: &str| {
        object
            .get(key)
            .and_then(|v| v.as_str())
            .and_then(validate_locator)
    };

    Ok(LoginElements {
        username: field(KEY_USERNAME),
        password: field(KEY_PASSWORD),
        captcha: field(KEY_CAPTCHA),
        submit: field(KEY_SUBMIT),
        ..LoginElements::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_exactly_at_cap() {
        let long = "a".repeat(MARKUP_CAP + 1234);
        let (cut, truncated) = truncate_markup(&long);
        assert!(truncated);
        assert_eq!(cut.chars().count(), MARKUP_CAP);

        let short = "<html></html>";
        let (same, truncated) = truncate_markup(short);
        assert!(!truncated);
        assert_eq!(same, short);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "登".repeat(MARKUP_CAP + 1);
        let (cut, truncated) = truncate_markup(&long);
        assert!(truncated);
        assert_eq!(cut.chars().count(), MARKUP_CAP);
    }

    #[test]
    fn test_parse_reply_with_prose_around_json() {
        let reply = r##"Sure! Here you go:
```json
{
  "username_xpath": "//input[@placeholder='用户名']",
  "password_xpath": "#password",
  "captcha_xpath": "",
  "login_button_xpath": "//button[@type='submit']"
}
```"##;
        let elements = parse_login_elements(reply).unwrap();
        assert_eq!(elements.username, Some(Locator::xpath("//input[@placeholder='用户名']")));
        assert_eq!(elements.password, Some(Locator::css("#password")));
        assert_eq!(elements.captcha, None);
        assert!(elements.submit.is_some());
    }

    #[test]
    fn test_missing_and_non_string_fields_default_to_empty() {
        let elements =
            parse_login_elements(r#"{"username_xpath": 42, "password_xpath": "input[type=password]"}"#)
                .unwrap();
        assert_eq!(elements.username, None);
        assert!(elements.password.is_some());
        assert_eq!(elements.submit, None);
    }

    #[test]
    fn test_unparseable_replies_are_service_errors() {
        assert!(matches!(
            parse_login_elements("I could not find anything"),
            Err(ScoutError::ExternalService(_))
        ));
        assert!(matches!(
            parse_login_elements("{not json at all}"),
            Err(ScoutError::ExternalService(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_locators() {
        assert_eq!(validate_locator("   "), None);
        assert_eq!(validate_locator("input[[["), None);
        assert_eq!(validate_locator(&"x".repeat(600)), None);
        assert_eq!(validate_locator("input\u{7}"), None);
        assert!(validate_locator("button:has-text('Login')").is_some());
    }

    #[test]
    fn test_lacks_credentials() {
        let mut elements = LoginElements::default();
        assert!(elements.lacks_credentials() && elements.is_empty());
        elements.password = Some(Locator::css("#pw"));
        assert!(!elements.lacks_credentials());
    }

    #[test]
    fn test_pin_fills_locator_and_handle() {
        let mut elements = LoginElements::default();
        elements.pin(Control::Submit, Locator::css("#go"), ElementHandle::new("h-1"));
        assert_eq!(elements.locator(Control::Submit), Some(&Locator::css("#go")));
        assert_eq!(elements.pinned.get(&Control::Submit), Some(&ElementHandle::new("h-1")));
        assert_eq!(elements.locator(Control::Username), None);
        assert!(serde_json::to_value(&elements).unwrap().get("pinned").is_none());
    }
}
