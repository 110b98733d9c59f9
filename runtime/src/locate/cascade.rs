//! Ordered-candidate matching with a bounded per-candidate timeout.
//!
//! Candidates are probed strictly in order. Each probe polls the page until
//! the locator resolves to a visible element or the per-candidate timeout
//! elapses, so an exhausted list of N candidates costs at most
//! `N × per_candidate` regardless of DOM size.

use super::{ElementHandle, Locator};
use crate::error::ScoutError;
use crate::renderer::RenderContext;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A successful cascade probe.
#[derive(Debug, Clone)]
pub struct CascadeHit {
    pub locator: Locator,
    pub handle: ElementHandle,
    /// Position of the winning candidate in the list.
    pub index: usize,
}

/// Outcome of running a whole candidate list.
#[derive(Debug, Clone)]
pub struct CascadeReport {
    /// How many candidates were probed.
    pub probed: usize,
    pub hit: Option<CascadeHit>,
}

/// Probes candidate locators in order until the first visible match.
#[derive(Debug, Clone)]
pub struct CascadeMatcher {
    per_candidate: Duration,
}

impl CascadeMatcher {
    pub fn new(per_candidate: Duration) -> Self {
        Self { per_candidate }
    }

    /// Wait up to the per-candidate timeout for one locator to be visible.
    pub async fn probe(
        &self,
        ctx: &dyn RenderContext,
        locator: &Locator,
        scope: Option<&Locator>,
    ) -> Result<ElementHandle, ScoutError> {
        let handle_id = format!("h-{}", Uuid::new_v4().simple());

        let waited = tokio::time::timeout(self.per_candidate, async {
            loop {
                match ctx.find_visible(locator, scope, &handle_id).await {
                    Ok(Some(handle)) => return Ok(handle),
                    Ok(None) => {}
                    // A locator the page cannot evaluate will not start working.
                    Err(e) => return Err(format!("{e:#}")),
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await;

        match waited {
            Ok(Ok(handle)) => Ok(handle),
            Ok(Err(reason)) => Err(ScoutError::ElementNotFound(format!("{locator}: {reason}"))),
            Err(_) => Err(ScoutError::ElementNotFound(format!(
                "{locator}: not visible within {}ms",
                self.per_candidate.as_millis()
            ))),
        }
    }

    /// Probe `candidates` in order and return the first visible match.
    pub async fn first_visible(
        &self,
        ctx: &dyn RenderContext,
        table: &str,
        candidates: &[Locator],
        scope: Option<&Locator>,
    ) -> CascadeReport {
        let mut probed = 0;
        for (index, locator) in candidates.iter().enumerate() {
            probed += 1;
            match self.probe(ctx, locator, scope).await {
                Ok(handle) => {
                    debug!(table, %locator, index, "cascade hit");
                    return CascadeReport {
                        probed,
                        hit: Some(CascadeHit {
                            locator: locator.clone(),
                            handle,
                            index,
                        }),
                    };
                }
                Err(e) => debug!(table, "{e}"),
            }
        }
        info!(table, probed, "no candidate matched");
        CascadeReport { probed, hit: None }
    }
}
