//! Functional-area importance scoring.
//!
//! `score = 0.4 × (1 − distance) + 0.3 × area + min(0.3, 0.05 × interactive)`
//! where `distance` is the element centre's offset from the viewport centre
//! with each axis normalized by the viewport size, and `area` is the element
//! area over the viewport area.

use super::scripts::{RawArea, RawViewport};
use super::types::{BoundingBox, FunctionalArea, ImportanceTier};

const POSITION_WEIGHT: f64 = 0.4;
const SIZE_WEIGHT: f64 = 0.3;
const INTERACTIVE_STEP: f64 = 0.05;
const INTERACTIVE_CAP: f64 = 0.3;

const HIGH_THRESHOLD: f64 = 0.6;
const MEDIUM_THRESHOLD: f64 = 0.3;

pub const SNIPPET_CHARS: usize = 100;

pub fn score(area: &RawArea, viewport: RawViewport) -> f64 {
    let interactive = (INTERACTIVE_STEP * f64::from(area.interactive_count)).min(INTERACTIVE_CAP);
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return interactive;
    }

    let r = area.rect;
    let dx = (r.left + r.width / 2.0 - viewport.width / 2.0) / viewport.width;
    let dy = (r.top + r.height / 2.0 - viewport.height / 2.0) / viewport.height;
    let distance = (dx * dx + dy * dy).sqrt();
    let size = (r.width * r.height) / (viewport.width * viewport.height);

    POSITION_WEIGHT * (1.0 - distance) + SIZE_WEIGHT * size + interactive
}

pub fn tier(score: f64) -> ImportanceTier {
    if score > HIGH_THRESHOLD {
        ImportanceTier::High
    } else if score > MEDIUM_THRESHOLD {
        ImportanceTier::Medium
    } else {
        ImportanceTier::Low
    }
}

/// First `max` characters of `text`.
pub fn snippet(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Score, tier and order candidates: descending by tier, discovery order
/// within a tier. Main content and forms are always high.
pub fn rank(candidates: Vec<RawArea>, viewport: RawViewport) -> Vec<FunctionalArea> {
    let mut areas: Vec<FunctionalArea> = candidates
        .into_iter()
        .map(|raw| {
            let score = score(&raw, viewport);
            let importance_tier = if raw.forced_high {
                ImportanceTier::High
            } else {
                tier(score)
            };
            FunctionalArea {
                area_type: raw.area_type,
                tag: raw.tag,
                element_id: raw.id,
                class_name: raw.class_name,
                text_snippet: snippet(raw.text.trim(), SNIPPET_CHARS),
                importance_tier,
                score,
                interactive_child_count: raw.interactive_count,
                bounding_box: BoundingBox {
                    top: raw.rect.top.round() as i64,
                    left: raw.rect.left.round() as i64,
                    width: raw.rect.width.round() as i64,
                    height: raw.rect.height.round() as i64,
                },
            }
        })
        .collect();
    // `sort_by_key` is stable.
    areas.sort_by_key(|a| std::cmp::Reverse(a.importance_tier.rank()));
    areas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::scripts::RawRect;

    const VIEWPORT: RawViewport = RawViewport {
        width: 1000.0,
        height: 800.0,
    };

    fn area(kind: &str, rect: RawRect, interactive: u32, forced: bool) -> RawArea {
        RawArea {
            area_type: kind.into(),
            tag: "div".into(),
            id: kind.into(),
            class_name: String::new(),
            text: "x".repeat(150),
            forced_high: forced,
            interactive_count: interactive,
            rect,
        }
    }

    fn rect(top: f64, left: f64, width: f64, height: f64) -> RawRect {
        RawRect {
            top,
            left,
            width,
            height,
        }
    }

    #[test]
    fn test_centered_full_viewport_scores_high() {
        let a = area("m", rect(0.0, 0.0, 1000.0, 800.0), 10, false);
        let s = score(&a, VIEWPORT);
        assert!((s - 1.0).abs() < 1e-9, "score was {s}");
        assert_eq!(tier(s), ImportanceTier::High);
    }

    #[test]
    fn test_interactive_bonus_is_capped() {
        let few = area("a", rect(0.0, 0.0, 0.0, 0.0), 2, false);
        let many = area("b", rect(0.0, 0.0, 0.0, 0.0), 50, false);
        let s_few = score(&few, RawViewport::default());
        let s_many = score(&many, RawViewport::default());
        assert!((s_few - 0.1).abs() < 1e-9);
        assert!((s_many - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_tier_thresholds_are_strict() {
        assert_eq!(tier(0.6), ImportanceTier::Medium);
        assert_eq!(tier(0.61), ImportanceTier::High);
        assert_eq!(tier(0.3), ImportanceTier::Low);
        assert_eq!(tier(0.31), ImportanceTier::Medium);
    }

    #[test]
    fn test_rank_is_stable_and_forces_forms_high() {
        let corner = rect(0.0, 0.0, 10.0, 10.0);
        let center = rect(300.0, 400.0, 200.0, 200.0);
        let candidates = vec![
            area("low-1", corner, 0, false),
            area("medium-1", center, 0, false),
            area("form", corner, 0, true),
            area("low-2", corner, 0, false),
            area("medium-2", center, 1, false),
        ];
        let ranked = rank(candidates.clone(), VIEWPORT);
        let ids: Vec<&str> = ranked.iter().map(|a| a.element_id.as_str()).collect();
        assert_eq!(ids, ["form", "medium-1", "medium-2", "low-1", "low-2"]);
        assert_eq!(ranked[0].text_snippet.chars().count(), SNIPPET_CHARS);

        let again = rank(candidates, VIEWPORT);
        assert_eq!(ranked, again);
    }
}
