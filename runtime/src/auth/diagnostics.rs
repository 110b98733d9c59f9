//! Screenshot and HTML dumps for failed logins.

use crate::error::{ScoutError, ScoutResult};
use crate::renderer::RenderContext;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Files written for one failed login. A field is `None` when that artifact
/// could not be captured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticArtifacts {
    pub screenshot: Option<PathBuf>,
    pub html: Option<PathBuf>,
}

impl DiagnosticArtifacts {
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.screenshot.iter().chain(self.html.iter())
    }
}

/// File stem for one capture: second-resolution timestamp plus a random
/// suffix, so two captures in the same second never collide.
pub fn artifact_stem(now: DateTime<Local>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("login_failed_{}_{}", now.format("%Y%m%d_%H%M%S"), &suffix[..8])
}

#[derive(Debug, Clone)]
pub struct DiagnosticsWriter {
    dir: PathBuf,
}

impl DiagnosticsWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Capture a full-page screenshot and the raw HTML of the current page.
    ///
    /// Only an unusable output directory is an error; a failed screenshot or
    /// HTML read is logged and leaves that artifact out.
    pub async fn capture(&self, ctx: &dyn RenderContext) -> ScoutResult<DiagnosticArtifacts> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(ScoutError::Io)?;
        let stem = artifact_stem(Local::now());
        let mut artifacts = DiagnosticArtifacts::default();

        match ctx.screenshot_png().await {
            Ok(png) => {
                let path = self.dir.join(format!("{stem}.png"));
                tokio::fs::write(&path, png).await?;
                info!(path = %path.display(), "saved login failure screenshot");
                artifacts.screenshot = Some(path);
            }
            Err(e) => warn!("could not capture screenshot: {e:#}"),
        }

        match ctx.get_html().await {
            Ok(html) => {
                let path = self.dir.join(format!("{stem}.html"));
                tokio::fs::write(&path, html).await?;
                info!(path = %path.display(), "saved login failure page source");
                artifacts.html = Some(path);
            }
            Err(e) => warn!("could not read page source: {e:#}"),
        }

        Ok(artifacts)
    }
}
