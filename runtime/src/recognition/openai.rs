//! Recognizer backed by an OpenAI-compatible chat-completions endpoint.

use super::{parse_login_elements, truncate_markup, LoginElements, PatternRecognizer};
use crate::config::RecognitionConfig;
use crate::error::ScoutError;
use crate::renderer::RenderContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_TOKENS: u32 = 1000;

const SYSTEM_PROMPT: &str = "You are a professional UI test automation engineer \
who analyzes HTML to find login form elements.";

const INSTRUCTION: &str = r#"Find the XPath of the login username input, the password input, the captcha input and the login button in the HTML below. If an XPath matches several elements, make it precise enough to select the right one. Output only a JSON object; leave a field as an empty string when the element does not exist. Use exactly this shape:
{
  "username_xpath": "//input[@placeholder='Username']",
  "password_xpath": "//input[@placeholder='Password']",
  "captcha_xpath": "//input[@placeholder='Captcha']",
  "login_button_xpath": "//button[@type='submit']"
}

Page HTML:
"#;

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Asks a chat-completions model for the login-control locators.
pub struct OpenAiRecognizer {
    client: reqwest::Client,
    config: RecognitionConfig,
}

impl OpenAiRecognizer {
    pub fn new(config: RecognitionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Recognize login controls in raw page markup.
    ///
    /// Never fails; any problem is logged and yields all-empty elements.
    pub async fn recognize_markup(&self, markup: &str) -> LoginElements {
        match self.request(markup).await {
            Ok(elements) => {
                elements.log_summary(self.name());
                elements
            }
            Err(e) => {
                warn!("pattern recognition unavailable, falling back: {e}");
                LoginElements::default()
            }
        }
    }

    async fn request(&self, markup: &str) -> Result<LoginElements, ScoutError> {
        if !self.config.is_configured() {
            return Err(ScoutError::ExternalService("no API key configured".into()));
        }

        let (markup, _) = truncate_markup(markup);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: format!("{INSTRUCTION}{markup}"),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: MAX_TOKENS,
        };

        info!(model = %self.config.model, endpoint = %self.endpoint(), "requesting login element recognition");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScoutError::ExternalService(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::ExternalService(format!("service answered HTTP {status}")));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScoutError::ExternalService(format!("unexpected response body: {e}")))?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ScoutError::ExternalService("response has no choices".into()))?;

        parse_login_elements(&content)
    }
}

#[async_trait]
impl PatternRecognizer for OpenAiRecognizer {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn recognize(&self, ctx: &dyn RenderContext) -> LoginElements {
        match ctx.get_html().await {
            Ok(html) => self.recognize_markup(&html).await,
            Err(e) => {
                warn!("could not read page markup for recognition: {e:#}");
                LoginElements::default()
            }
        }
    }
}
