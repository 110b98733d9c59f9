//! Error taxonomy for exploration runs.
//!
//! Only `Launch`, `Navigation`, `InvalidUrl`, `Config` and `Io` ever reach a
//! caller of [`crate::explorer::Explorer`]. `ElementNotFound` and
//! `ExternalService` are absorbed inside the cascade matcher and the
//! recognition adapter; they exist so those layers can log a typed reason.

/// All errors surfaced by the exploration engine.
#[derive(thiserror::Error, Debug)]
pub enum ScoutError {
    /// The automation engine could not start. Fatal, never retried.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// Navigation to a page failed or timed out. Aborts this URL only.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The requested URL has no scheme or host.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// No candidate locator matched a visible element.
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// The pattern-recognition service failed or answered garbage.
    #[error("external service error: {0}")]
    ExternalService(String),

    /// Invalid configuration (e.g. an unreadable keyword map).
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScoutError {
    /// Whether a batch run must stop after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScoutError::Launch(_))
    }

    pub(crate) fn navigation(url: &str, err: impl std::fmt::Display) -> Self {
        ScoutError::Navigation {
            url: url.to_string(),
            reason: format!("{err:#}"),
        }
    }
}

pub type ScoutResult<T> = Result<T, ScoutError>;
