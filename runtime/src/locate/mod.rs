//! Element locators and their in-page resolution.
//!
//! A [`Locator`] is a tagged expression: CSS, XPath, or "element of tag X
//! whose text contains Y". Each kind renders its own resolution script; the
//! script tags the first visible match with a unique `data-scout-handle`
//! attribute so later clicks and keystrokes can address it with plain CSS.

pub mod cascade;
pub mod tables;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute used to pin a resolved element.
pub const HANDLE_ATTR: &str = "data-scout-handle";

/// How a locator expression is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocatorKind {
    Css,
    XPath,
    /// Elements of `tag` whose text (or `value`) contains the expression.
    Text { tag: String },
}

/// A locator expression plus its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    #[serde(flatten)]
    pub kind: LocatorKind,
    pub expression: String,
}

impl Locator {
    pub fn css(expression: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::Css,
            expression: expression.into(),
        }
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::XPath,
            expression: expression.into(),
        }
    }

    pub fn text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::Text { tag: tag.into() },
            expression: text.into(),
        }
    }

    /// Infer the kind of a free-form locator string.
    ///
    /// `//x`, `(//x)[1]`, `./x` are XPath; `tag:has-text('t')` is a text
    /// locator; everything else is CSS. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with('/') || raw.starts_with("(/") || raw.starts_with("./") {
            return Some(Self::xpath(raw));
        }
        if let Some((tag, rest)) = raw.split_once(":has-text(") {
            let inner = rest.strip_suffix(')')?.trim();
            let text = inner
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
                .unwrap_or(inner);
            let tag = if tag.is_empty() { "*" } else { tag };
            return Some(Self::text(tag, text));
        }
        Some(Self::css(raw))
    }

    /// JS expression evaluating to an array of candidate elements under `root`.
    fn candidates_js(&self, root: &str) -> String {
        match &self.kind {
            LocatorKind::Css => format!(
                "Array.from({root}.querySelectorAll('{}'))",
                sanitize_js_string(&self.expression)
            ),
            LocatorKind::XPath => {
                // Absolute paths are made relative so a scope root applies.
                let expr = if self.expression.starts_with('/') {
                    format!(".{}", self.expression)
                } else {
                    self.expression.clone()
                };
                format!(
                    "(() => {{ const snap = document.evaluate('{}', {root}, null, \
                     XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                     for (let i = 0; i < snap.snapshotLength; i++) out.push(snap.snapshotItem(i)); \
                     return out; }})()",
                    sanitize_js_string(&expr)
                )
            }
            LocatorKind::Text { tag } => format!(
                "Array.from({root}.querySelectorAll('{}')).filter(el => \
                 ((el.textContent || el.value || '') + '').toLowerCase().includes('{}'))",
                sanitize_js_string(tag),
                sanitize_js_string(&self.expression.to_lowercase())
            ),
        }
    }

    /// Script that tags the first visible match and returns its handle id,
    /// or `null`. `scope` restricts the search to the first element matching
    /// the scope locator, falling back to the whole document.
    pub fn resolve_script(&self, scope: Option<&Locator>, handle: &str) -> String {
        let root_js = match scope {
            Some(scope) => format!(
                "(({}).find(el => el.nodeType === 1) || document)",
                scope.candidates_js("document")
            ),
            None => "document".to_string(),
        };
        format!(
            "(() => {{ {VISIBLE_FN} const root = {root_js}; \
             const hit = ({}).find(el => el && el.nodeType === 1 && __visible(el)); \
             if (!hit) return null; hit.setAttribute('{HANDLE_ATTR}', '{handle}'); \
             return '{handle}'; }})()",
            self.candidates_js("root"),
            handle = sanitize_js_string(handle),
        )
    }

    /// Script returning how many visible elements match this locator.
    pub fn count_visible_script(&self) -> String {
        format!(
            "(() => {{ {VISIBLE_FN} return ({}).filter(el => el && el.nodeType === 1 && __visible(el)).length; }})()",
            self.candidates_js("document")
        )
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LocatorKind::Css => write!(f, "{}", self.expression),
            LocatorKind::XPath => write!(f, "xpath={}", self.expression),
            LocatorKind::Text { tag } => write!(f, "{tag}:has-text('{}')", self.expression),
        }
    }
}

/// Visibility predicate shared by every resolution script.
pub(crate) const VISIBLE_FN: &str = "const __visible = (el) => { const r = el.getBoundingClientRect(); \
    const s = window.getComputedStyle(el); return r.width > 0 && r.height > 0 && \
    s.display !== 'none' && s.visibility !== 'hidden'; };";

/// A resolved, pinned element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub id: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// CSS selector addressing exactly this element.
    pub fn selector(&self) -> String {
        format!("[{HANDLE_ATTR}=\"{}\"]", self.id)
    }

    /// Script that empties the element's value and fires an `input` event.
    pub fn clear_script(&self) -> String {
        format!(
            "(() => {{ const el = document.querySelector('{}'); if (!el) return false; \
             el.focus(); el.value = ''; el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             return true; }})()",
            sanitize_js_string(&self.selector())
        )
    }
}

/// Sanitize a string for safe injection into a JavaScript string literal.
///
/// Escapes backslashes, quotes, backticks, and line breaks; `<`/`>` become
/// hex escapes so a value can never close a `<script>` element; null bytes
/// are dropped.
pub(crate) fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}
            '<' => result.push_str("\\x3c"),
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}
