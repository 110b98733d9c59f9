//! The cascade matcher's worst case is bounded by the candidate count.

mod common;

use common::{FakeRenderer, FakeSite, PageState};
use scout_runtime::locate::cascade::CascadeMatcher;
use scout_runtime::locate::tables;
use scout_runtime::renderer::{ContextSpec, Renderer};
use scout_runtime::session::profile::DeviceKind;
use std::time::{Duration, Instant};

fn spec() -> ContextSpec {
    ContextSpec {
        profile: DeviceKind::Desktop.profile(),
        cookies: Vec::new(),
        navigation_timeout: Duration::from_secs(5),
        headless: true,
        chromium_path: None,
    }
}

#[tokio::test]
async fn test_exhausted_table_costs_at_most_n_timeouts() {
    let renderer = FakeRenderer::new(FakeSite::default());
    let ctx = renderer.open_context(&spec()).await.unwrap();

    let per_candidate = Duration::from_millis(25);
    let matcher = CascadeMatcher::new(per_candidate);
    let candidates = tables::password();

    let started = Instant::now();
    let report = matcher
        .first_visible(ctx.as_ref(), "password", &candidates, None)
        .await;
    let elapsed = started.elapsed();

    assert!(report.hit.is_none());
    assert_eq!(report.probed, candidates.len());
    let bound = per_candidate * candidates.len() as u32 + Duration::from_millis(250);
    assert!(elapsed <= bound, "took {elapsed:?}, bound {bound:?}");
}

#[tokio::test]
async fn test_first_visible_candidate_wins() {
    let mut site = FakeSite::default();
    site.before = PageState::default().with_visible(&["input[type='password']", "input[name='pwd']"]);
    let renderer = FakeRenderer::new(site);
    let ctx = renderer.open_context(&spec()).await.unwrap();

    let matcher = CascadeMatcher::new(Duration::from_millis(10));
    let report = matcher
        .first_visible(ctx.as_ref(), "password", &tables::password(), None)
        .await;

    let hit = report.hit.expect("hit");
    assert_eq!(hit.locator.expression, "input[name='pwd']");
    assert_eq!(hit.index, 1);
    assert_eq!(report.probed, 2);
}
