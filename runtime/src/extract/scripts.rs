//! In-page probe scripts and the raw shapes they return.
//!
//! Scripts only report facts about the DOM. Scoring and every purpose
//! classification happen in Rust over these raw shapes.

use crate::locate::VISIBLE_FN;
use serde::Deserialize;

/// Landmark presence and element counts.
pub const STRUCTURE_JS: &str = r#"(() => ({
    hasHeader: !!document.querySelector('header'),
    hasFooter: !!document.querySelector('footer'),
    hasNavigation: !!document.querySelector('nav'),
    hasMainContent: !!document.querySelector('main'),
    hasSidebar: !!document.querySelector('aside'),
    hasForms: document.forms.length > 0,
    formCount: document.forms.length,
    linkCount: document.querySelectorAll('a').length,
    buttonCount: document.querySelectorAll('button, input[type="button"], input[type="submit"]').length,
    inputCount: document.querySelectorAll('input:not([type="button"]):not([type="submit"]), textarea, select').length,
    imageCount: document.querySelectorAll('img').length,
    tableCount: document.querySelectorAll('table').length
}))()"#;

/// Selected `<meta>` tags by name or property.
pub const META_JS: &str = r#"(() => {
    const wanted = ['description', 'keywords', 'viewport', 'author', 'og:title', 'og:description'];
    const out = {};
    document.querySelectorAll('meta').forEach(meta => {
        const name = meta.getAttribute('name') || meta.getAttribute('property');
        if (name && wanted.includes(name)) out[name] = meta.content || '';
    });
    return out;
})()"#;

/// Functional-area candidates in discovery order: main content, every form,
/// then container-like elements holding at least one interactive descendant.
pub const AREAS_JS: &str = r#"(() => {
    const interactive = 'button, a, input, select, textarea';
    const seen = new Set();
    const candidates = [];
    const add = (el, type, forced) => {
        if (!el || seen.has(el)) return;
        const r = el.getBoundingClientRect();
        if (r.width === 0 || r.height === 0) return;
        seen.add(el);
        candidates.push({
            type,
            tag: el.tagName.toLowerCase(),
            id: el.id || '',
            className: typeof el.className === 'string' ? el.className : '',
            text: (el.textContent || '').trim().substring(0, 200),
            forcedHigh: forced,
            interactiveCount: el.querySelectorAll(interactive).length,
            rect: { top: r.top, left: r.left, width: r.width, height: r.height }
        });
    };
    const main = document.querySelector('main') || document.querySelector('article') ||
        document.querySelector('#content') || document.querySelector('.content');
    add(main, 'main_content', true);
    document.querySelectorAll('form').forEach(f => add(f, 'form', true));
    ['section', '.card', '.panel', '.box', '.container', '.module', '[role="region"]'].forEach(sel => {
        document.querySelectorAll(sel).forEach(el => {
            if (el.querySelectorAll(interactive).length > 0) add(el, 'functional_module', false);
        });
    });
    return {
        viewport: { width: window.innerWidth, height: window.innerHeight },
        candidates
    };
})()"#;

/// Field facts shared by the form and input-control probes.
const FIELD_FACTS_FN: &str = r#"const __field = (el) => ({
        type: el.type || el.tagName.toLowerCase(),
        tag: el.tagName.toLowerCase(),
        name: el.name || '',
        id: el.id || '',
        placeholder: el.placeholder || '',
        label: el.labels && el.labels.length > 0 ? (el.labels[0].textContent || '').trim() : '',
        required: !!el.required,
        disabled: !!el.disabled,
        readOnly: !!el.readOnly
    });"#;

/// Every form with its submit-control text and non-button fields.
pub fn forms_js() -> String {
    format!(
        r#"(() => {{ {FIELD_FACTS_FN}
    return Array.from(document.forms).map(form => ({{
        id: form.id || '',
        action: form.getAttribute('action') ? form.action : '',
        method: (form.method || 'get').toLowerCase(),
        className: typeof form.className === 'string' ? form.className : '',
        buttonText: Array.from(form.querySelectorAll('button, input[type="submit"]'))
            .map(el => el.textContent || el.value || '').join(' '),
        hasPassword: !!(form.querySelector('input[name="password"]') || form.querySelector('input[type="password"]')),
        fields: Array.from(form.elements)
            .filter(el => el.tagName !== 'BUTTON' && !['submit', 'reset', 'button'].includes(el.type))
            .map(__field)
    }}));
}})()"#
    )
}

/// Visible, enabled buttons and visible, non-empty links.
pub const CONTROLS_JS: &str = r#"(() => {
    const shown = (el) => {
        const s = window.getComputedStyle(el);
        return s.display !== 'none' && s.visibility !== 'hidden';
    };
    const pos = (el) => {
        const r = el.getBoundingClientRect();
        return { top: Math.round(r.top), left: Math.round(r.left) };
    };
    const cls = (el) => typeof el.className === 'string' ? el.className : '';
    const buttons = Array.from(document.querySelectorAll('button, input[type="button"], input[type="submit"], [role="button"]'))
        .filter(b => shown(b) && !b.disabled)
        .map(b => ({
            text: (b.textContent || b.value || '').trim(),
            type: b.type || '',
            className: cls(b),
            position: pos(b)
        }));
    const links = Array.from(document.querySelectorAll('a'))
        .filter(a => (a.textContent || '').trim().length > 0 && shown(a))
        .map(a => ({
            text: a.textContent.trim(),
            href: a.href || '',
            className: cls(a),
            isExternal: !!a.hostname && a.hostname !== window.location.hostname,
            position: pos(a)
        }));
    return { buttons, links };
})()"#;

/// Headings, lists and main-content paragraphs.
pub const CONTENT_JS: &str = r#"(() => {
    const headings = Array.from(document.querySelectorAll('h1, h2, h3, h4, h5, h6'))
        .map(h => ({ level: parseInt(h.tagName.substring(1), 10), text: (h.textContent || '').trim() }));
    const lists = Array.from(document.querySelectorAll('ul, ol')).map(list => ({
        type: list.tagName.toLowerCase(),
        items: Array.from(list.querySelectorAll('li')).map(li => (li.textContent || '').trim())
    }));
    const main = document.querySelector('main') || document.querySelector('article') ||
        document.querySelector('#content') || document.querySelector('.content');
    const paragraphs = main
        ? Array.from(main.querySelectorAll('p')).map(p => (p.textContent || '').trim()).filter(t => t.length > 0)
        : [];
    return { headings, lists, paragraphs };
})()"#;

/// Alert and notification elements with text.
pub const MESSAGES_JS: &str = r#"(() => Array.from(document.querySelectorAll(
        '.error, .alert, .message, .notification, [role="alert"], [aria-live]'))
    .filter(el => (el.textContent || '').trim().length > 0)
    .map(el => ({
        className: typeof el.className === 'string' ? el.className : '',
        text: el.textContent.trim()
    })))()"#;

/// Visible input-like elements. Zero-size, `display: none` and
/// `visibility: hidden` inputs are left out.
pub fn inputs_js() -> String {
    format!(
        r#"(() => {{ {FIELD_FACTS_FN} {VISIBLE_FN}
    return Array.from(document.querySelectorAll('input:not([type="button"]):not([type="submit"]), textarea, select'))
        .filter(__visible)
        .map(__field);
}})()"#
    )
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RawRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RawViewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArea {
    #[serde(rename = "type")]
    pub area_type: String,
    pub tag: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub forced_high: bool,
    #[serde(default)]
    pub interactive_count: u32,
    pub rect: RawRect,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAreas {
    pub viewport: RawViewport,
    pub candidates: Vec<RawArea>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawField {
    #[serde(rename = "type")]
    pub field_type: String,
    pub tag: String,
    pub name: String,
    pub id: String,
    pub placeholder: String,
    pub label: String,
    pub required: bool,
    pub disabled: bool,
    pub read_only: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawForm {
    pub id: String,
    pub action: String,
    pub method: String,
    pub class_name: String,
    pub button_text: String,
    pub has_password: bool,
    pub fields: Vec<RawField>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RawPosition {
    pub top: i64,
    pub left: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawButton {
    pub text: String,
    #[serde(rename = "type")]
    pub button_type: String,
    pub class_name: String,
    pub position: RawPosition,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLink {
    pub text: String,
    pub href: String,
    pub class_name: String,
    pub is_external: bool,
    pub position: RawPosition,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawControls {
    #[serde(default)]
    pub buttons: Vec<RawButton>,
    #[serde(default)]
    pub links: Vec<RawLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHeading {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawList {
    #[serde(rename = "type")]
    pub list_type: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawContent {
    pub headings: Vec<RawHeading>,
    pub lists: Vec<RawList>,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(default)]
    pub class_name: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_helper_is_inlined() {
        assert!(forms_js().contains("const __field"));
        assert!(inputs_js().contains(".map(__field)"));
        assert!(!forms_js().contains("{FIELD_FACTS_FN}"));
    }

    #[test]
    fn test_inputs_use_strict_visibility() {
        let js = inputs_js();
        assert!(js.contains("const __visible"));
        assert!(js.contains(".filter(__visible)"));
        assert!(js.contains("s.visibility !== 'hidden'"));
        assert!(js.contains("r.width > 0 && r.height > 0"));
    }

    #[test]
    fn test_raw_area_accepts_script_shape() {
        let raw: RawAreas = serde_json::from_value(serde_json::json!({
            "viewport": {"width": 1280, "height": 800},
            "candidates": [{
                "type": "form", "tag": "form", "id": "login", "className": "",
                "text": "Sign in", "forcedHigh": true, "interactiveCount": 3,
                "rect": {"top": 10.5, "left": 0, "width": 300, "height": 200}
            }]
        }))
        .unwrap();
        assert_eq!(raw.candidates[0].area_type, "form");
        assert!(raw.candidates[0].forced_high);
        assert_eq!(raw.viewport.width, 1280.0);
    }
}
