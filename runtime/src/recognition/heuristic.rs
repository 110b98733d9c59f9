//! Table-driven recognizer used when no external service is configured.

use super::{Control, LoginElements, PatternRecognizer};
use crate::locate::cascade::CascadeMatcher;
use crate::locate::{tables, Locator};
use crate::renderer::RenderContext;
use async_trait::async_trait;
use tracing::debug;

/// Finds login controls with the built-in candidate tables, scoped to the
/// first visible login-form container when the page has one.
pub struct HeuristicRecognizer {
    matcher: CascadeMatcher,
}

impl HeuristicRecognizer {
    pub fn new(matcher: CascadeMatcher) -> Self {
        Self { matcher }
    }

    async fn scope(&self, ctx: &dyn RenderContext) -> Option<Locator> {
        let containers = tables::login_form_container();
        let report = self
            .matcher
            .first_visible(ctx, "login_form_container", &containers, None)
            .await;
        report.hit.map(|hit| {
            debug!(container = %hit.locator, "scoping recognition to login form");
            hit.locator
        })
    }
}

#[async_trait]
impl PatternRecognizer for HeuristicRecognizer {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn recognize(&self, ctx: &dyn RenderContext) -> LoginElements {
        let scope = self.scope(ctx).await;
        let scope = scope.as_ref();

        let mut found = LoginElements::default();
        for control in Control::ALL {
            let report = self
                .matcher
                .first_visible(ctx, control.table(), &control.candidates(), scope)
                .await;
            if let Some(hit) = report.hit {
                found.pin(control, hit.locator, hit.handle);
            }
        }

        found.scope = scope.cloned();
        found.log_summary(self.name());
        found
    }
}
