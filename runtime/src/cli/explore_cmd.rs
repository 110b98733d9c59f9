//! `scout explore <URL>...`: log in and extract page records.

use crate::auth::LoginInputs;
use crate::config::ExplorerConfig;
use crate::explorer::{ExploreRequest, Explorer};
use crate::renderer::chromium::ChromiumRenderer;
use crate::session::profile::DeviceKind;
use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct ExploreArgs {
    /// Page URLs to explore, one session each
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Login username
    #[arg(long, requires = "password")]
    pub username: Option<String>,

    /// Login password
    #[arg(long, requires = "username", env = "SCOUT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Captcha code to type into the captcha field, if the form has one
    #[arg(long)]
    pub captcha: Option<String>,

    /// Cookie string (`name=value; name2=value2`); takes precedence over credentials
    #[arg(long, env = "SCOUT_COOKIES", hide_env_values = true)]
    pub cookies: Option<String>,

    /// Device profile: desktop, mobile or tablet (anything else means desktop)
    #[arg(long, default_value = "desktop")]
    pub device: String,

    /// Discover login controls with the recognition service or heuristics
    #[arg(long)]
    pub assisted: bool,

    /// Write the JSON report to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl ExploreArgs {
    fn template(&self) -> ExploreRequest {
        ExploreRequest {
            url: String::new(),
            device: DeviceKind::resolve(&self.device),
            login: LoginInputs {
                username: self.username.clone(),
                password: self.password.clone(),
                captcha: self.captcha.clone(),
                cookies: self.cookies.clone(),
                assisted: self.assisted,
            },
        }
    }
}

/// Run the explore command. Fails when any URL failed or the batch aborted.
pub async fn run(args: &ExploreArgs, config: &ExplorerConfig) -> Result<()> {
    let explorer = Explorer::new(Arc::new(ChromiumRenderer::new()), config)?;
    let report = explorer.explore_many(&args.urls, &args.template()).await;

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    if report.aborted {
        bail!("browser could not be launched; remaining URLs were skipped");
    }
    if !report.failures.is_empty() {
        bail!("{} of {} URLs failed", report.failures.len(), args.urls.len());
    }
    Ok(())
}
