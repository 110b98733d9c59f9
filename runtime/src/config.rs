//! Runtime configuration, read from the environment (and an optional `.env`).
//!
//! Every knob has a default, so `ExplorerConfig::default()` is a usable
//! configuration for a headless local Chromium.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

const DEFAULT_MODEL: &str = "deepseek-chat";
const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// Settings for the external pattern-recognition service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.7,
        }
    }
}

impl RecognitionConfig {
    /// The service is usable only with a non-empty key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Top-level explorer configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub headless: bool,
    pub chromium_path: Option<PathBuf>,
    /// Global per-context navigation timeout.
    pub navigation_timeout_ms: u64,
    /// Per-candidate timeout of the cascade matcher.
    pub probe_timeout_ms: u64,
    /// Per-locator timeout when filling recognizer-discovered locators.
    pub assisted_probe_timeout_ms: u64,
    pub network_idle_timeout_ms: u64,
    pub settle_ms: u64,
    pub submit_settle_ms: u64,
    pub typing_delay_ms: u64,
    pub diagnostics_dir: PathBuf,
    pub keywords_file: Option<PathBuf>,
    pub recognition: RecognitionConfig,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            navigation_timeout_ms: 30_000,
            probe_timeout_ms: 2_000,
            assisted_probe_timeout_ms: 5_000,
            network_idle_timeout_ms: 10_000,
            settle_ms: 2_000,
            submit_settle_ms: 3_000,
            typing_delay_ms: 100,
            diagnostics_dir: PathBuf::from("."),
            keywords_file: None,
            recognition: RecognitionConfig::default(),
        }
    }
}

impl ExplorerConfig {
    /// Build a configuration from `SCOUT_*` / `OPENAI_*` variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let rec_defaults = RecognitionConfig::default();

        Self {
            headless: parse_or(&lookup, "SCOUT_HEADLESS", defaults.headless),
            chromium_path: lookup("SCOUT_CHROMIUM_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            navigation_timeout_ms: parse_or(
                &lookup,
                "SCOUT_TIMEOUT_MS",
                defaults.navigation_timeout_ms,
            ),
            probe_timeout_ms: parse_or(&lookup, "SCOUT_PROBE_TIMEOUT_MS", defaults.probe_timeout_ms),
            assisted_probe_timeout_ms: parse_or(
                &lookup,
                "SCOUT_ASSISTED_PROBE_TIMEOUT_MS",
                defaults.assisted_probe_timeout_ms,
            ),
            network_idle_timeout_ms: parse_or(
                &lookup,
                "SCOUT_NETWORK_IDLE_TIMEOUT_MS",
                defaults.network_idle_timeout_ms,
            ),
            settle_ms: parse_or(&lookup, "SCOUT_SETTLE_MS", defaults.settle_ms),
            submit_settle_ms: parse_or(&lookup, "SCOUT_SUBMIT_SETTLE_MS", defaults.submit_settle_ms),
            typing_delay_ms: parse_or(&lookup, "SCOUT_TYPING_DELAY_MS", defaults.typing_delay_ms),
            diagnostics_dir: lookup("SCOUT_DIAGNOSTICS_DIR")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.diagnostics_dir),
            keywords_file: lookup("SCOUT_KEYWORDS_FILE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            recognition: RecognitionConfig {
                api_key: lookup("OPENAI_API_KEY").unwrap_or_default(),
                model: lookup("OPENAI_MODEL")
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(rec_defaults.model),
                base_url: lookup("OPENAI_BASE_URL")
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or(rec_defaults.base_url),
                temperature: parse_or(&lookup, "OPENAI_TEMPERATURE", rec_defaults.temperature),
            },
        }
    }

    /// Settings with every wait collapsed, for scripted pages in tests.
    pub fn instant() -> Self {
        Self {
            probe_timeout_ms: 20,
            assisted_probe_timeout_ms: 20,
            network_idle_timeout_ms: 20,
            settle_ms: 0,
            submit_settle_ms: 0,
            typing_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn assisted_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.assisted_probe_timeout_ms)
    }

    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.network_idle_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn submit_settle(&self) -> Duration {
        Duration::from_millis(self.submit_settle_ms)
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => match raw.trim().to_ascii_lowercase().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("ignoring unparseable {key}={raw:?}, using default");
                default
            }
        },
        _ => default,
    }
}
