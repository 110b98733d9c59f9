//! Page structure extraction.
//!
//! A fixed sequence of independent sub-probes runs against the live page.
//! A probe that fails to evaluate or returns an unexpected shape is logged,
//! recorded as a [`ProbeFailure`], and replaced by its default value; the
//! record is always returned.

pub mod classify;
pub mod scoring;
pub mod scripts;
pub mod types;

use crate::keywords::KeywordMap;
use crate::renderer::RenderContext;
use scripts::{RawAreas, RawContent, RawControls, RawField, RawForm, RawMessage};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use types::{
    Button, ContentBlock, Field, Form, FunctionalArea, Heading, InputControl,
    InteractiveElements, Link, ListGroup, Message, PageRecord, Position, ProbeFailure,
    StructureSummary,
};

const PARAGRAPH_PREVIEW_CHARS: usize = 100;

/// Builds [`PageRecord`]s from live pages.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    keywords: Arc<KeywordMap>,
}

impl PageExtractor {
    pub fn new(keywords: Arc<KeywordMap>) -> Self {
        Self { keywords }
    }

    /// Extract the record of the page currently loaded in `ctx`.
    ///
    /// `fallback_url` is used when the page URL cannot be read.
    pub async fn extract(
        &self,
        ctx: &dyn RenderContext,
        fallback_url: &str,
    ) -> (PageRecord, Vec<ProbeFailure>) {
        let mut failures = Vec::new();

        let url = ctx
            .get_url()
            .await
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| fallback_url.to_string());
        let title = match ctx.title().await {
            Ok(title) => title,
            Err(e) => {
                record_failure(&mut failures, "title", format!("{e:#}"));
                String::new()
            }
        };

        let structure_summary: StructureSummary =
            probe(ctx, "structure", scripts::STRUCTURE_JS, &mut failures).await;
        let meta: BTreeMap<String, String> =
            probe(ctx, "meta", scripts::META_JS, &mut failures).await;
        let functional_areas = self.functional_areas(ctx, &mut failures).await;
        let forms = self.forms(ctx, &mut failures).await;
        let interactive_elements = self.interactive_elements(ctx, &mut failures).await;
        let content_structure = content_structure(ctx, &mut failures).await;
        let messages = self.messages(ctx, &mut failures).await;
        let input_controls = self.input_controls(ctx, &mut failures).await;

        let record = PageRecord {
            url,
            title,
            timestamp_seconds: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
            structure_summary,
            meta,
            functional_areas,
            forms,
            interactive_elements,
            content_structure,
            messages,
            input_controls,
        };
        info!(
            url = %record.url,
            areas = record.functional_areas.len(),
            forms = record.forms.len(),
            failed_probes = failures.len(),
            "page structure extracted"
        );
        (record, failures)
    }

    async fn functional_areas(
        &self,
        ctx: &dyn RenderContext,
        failures: &mut Vec<ProbeFailure>,
    ) -> Vec<FunctionalArea> {
        let raw: Option<RawAreas> = probe(ctx, "functional_areas", scripts::AREAS_JS, failures).await;
        raw.map(|r| scoring::rank(r.candidates, r.viewport))
            .unwrap_or_default()
    }

    async fn forms(&self, ctx: &dyn RenderContext, failures: &mut Vec<ProbeFailure>) -> Vec<Form> {
        let raw: Vec<RawForm> = probe(ctx, "forms", &scripts::forms_js(), failures).await;
        raw.into_iter()
            .map(|form| Form {
                purpose: classify::form_purpose(&form, &self.keywords),
                fields: form.fields.iter().map(|f| self.field(f)).collect(),
                id: form.id,
                action: form.action,
                method: form.method,
            })
            .collect()
    }

    fn field(&self, raw: &RawField) -> Field {
        Field {
            field_type: raw.field_type.clone(),
            name: raw.name.clone(),
            id: raw.id.clone(),
            placeholder: raw.placeholder.clone(),
            required: raw.required,
            disabled: raw.disabled,
            purpose: classify::field_purpose(raw, &self.keywords),
        }
    }

    async fn interactive_elements(
        &self,
        ctx: &dyn RenderContext,
        failures: &mut Vec<ProbeFailure>,
    ) -> InteractiveElements {
        let raw: RawControls = probe(ctx, "interactive_elements", scripts::CONTROLS_JS, failures).await;
        let kw = &self.keywords;
        InteractiveElements {
            buttons: raw
                .buttons
                .into_iter()
                .map(|b| Button {
                    purpose: classify::element_purpose(&b.text, &b.class_name, kw),
                    is_form_submit: b.button_type == "submit",
                    position: Position {
                        top: b.position.top,
                        left: b.position.left,
                    },
                    text: b.text,
                    button_type: b.button_type,
                })
                .collect(),
            links: raw
                .links
                .into_iter()
                .map(|l| Link {
                    purpose: classify::element_purpose(&l.text, &l.class_name, kw),
                    position: Position {
                        top: l.position.top,
                        left: l.position.left,
                    },
                    text: l.text,
                    href: l.href,
                    is_external: l.is_external,
                })
                .collect(),
        }
    }

    async fn messages(&self, ctx: &dyn RenderContext, failures: &mut Vec<ProbeFailure>) -> Vec<Message> {
        let raw: Vec<RawMessage> = probe(ctx, "messages", scripts::MESSAGES_JS, failures).await;
        raw.into_iter()
            .map(|m| Message {
                kind: classify::message_kind(&m.class_name, &self.keywords),
                text: m.text,
            })
            .collect()
    }

    async fn input_controls(
        &self,
        ctx: &dyn RenderContext,
        failures: &mut Vec<ProbeFailure>,
    ) -> Vec<InputControl> {
        let raw: Vec<RawField> = probe(ctx, "input_controls", &scripts::inputs_js(), failures).await;
        raw.iter()
            .map(|f| InputControl {
                control_type: f.field_type.clone(),
                purpose: classify::field_purpose(f, &self.keywords),
                name: f.name.clone(),
                id: f.id.clone(),
                placeholder: f.placeholder.clone(),
                required: f.required,
                disabled: f.disabled,
                read_only: f.read_only,
            })
            .collect()
    }
}

async fn content_structure(
    ctx: &dyn RenderContext,
    failures: &mut Vec<ProbeFailure>,
) -> Vec<ContentBlock> {
    let raw: RawContent = probe(ctx, "content_structure", scripts::CONTENT_JS, failures).await;
    let mut blocks = Vec::new();
    if !raw.headings.is_empty() {
        blocks.push(ContentBlock::HeadingHierarchy(
            raw.headings
                .into_iter()
                .map(|h| Heading {
                    level: h.level,
                    text: h.text,
                })
                .collect(),
        ));
    }
    if !raw.lists.is_empty() {
        blocks.push(ContentBlock::Lists(
            raw.lists
                .into_iter()
                .map(|l| ListGroup {
                    list_type: l.list_type,
                    items: l.items,
                })
                .collect(),
        ));
    }
    let paragraphs: Vec<String> = raw
        .paragraphs
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(paragraph_preview)
        .collect();
    if !paragraphs.is_empty() {
        blocks.push(ContentBlock::Paragraphs(paragraphs));
    }
    blocks
}

/// First 100 characters, with `...` appended when the text was longer.
pub fn paragraph_preview(text: &str) -> String {
    if text.chars().count() > PARAGRAPH_PREVIEW_CHARS {
        format!("{}...", scoring::snippet(text, PARAGRAPH_PREVIEW_CHARS))
    } else {
        text.to_string()
    }
}

fn record_failure(failures: &mut Vec<ProbeFailure>, probe: &str, message: String) {
    warn!(probe, "page probe failed: {message}");
    failures.push(ProbeFailure {
        probe: probe.to_string(),
        message,
    });
}

/// Run one sub-probe, falling back to `T::default()` on any failure.
async fn probe<T>(
    ctx: &dyn RenderContext,
    name: &str,
    script: &str,
    failures: &mut Vec<ProbeFailure>,
) -> T
where
    T: DeserializeOwned + Default,
{
    let value = match ctx.execute_js(script).await {
        Ok(value) => value,
        Err(e) => {
            record_failure(failures, name, format!("{e:#}"));
            return T::default();
        }
    };
    match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            record_failure(failures, name, format!("unexpected result shape: {e}"));
            T::default()
        }
    }
}
