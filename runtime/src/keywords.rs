//! Versioned category-to-keywords map shared by every classifier.
//!
//! The default map is embedded at compile time from `keywords.json`. An
//! external JSON file with the same shape can replace individual categories;
//! categories it does not mention keep their embedded keywords.

use crate::error::ScoutError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Raw JSON content of the default keyword map.
const KEYWORDS_JSON: &str = include_str!("keywords.json");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordMap {
    /// Schema version of the map.
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    categories: HashMap<String, Vec<String>>,
}

fn embedded() -> &'static KeywordMap {
    static MAP: OnceLock<KeywordMap> = OnceLock::new();
    MAP.get_or_init(|| {
        serde_json::from_str::<KeywordMap>(KEYWORDS_JSON)
            .map(KeywordMap::normalized)
            .unwrap_or_default()
    })
}

impl KeywordMap {
    /// The embedded default map.
    pub fn builtin() -> Self {
        embedded().clone()
    }

    /// Parse a map from JSON and layer it over the embedded defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ScoutError> {
        let overlay: KeywordMap = serde_json::from_str(json)
            .map_err(|e| ScoutError::Config(format!("invalid keyword map: {e}")))?;
        let mut merged = Self::builtin();
        if overlay.version != 0 {
            merged.version = overlay.version;
        }
        merged
            .categories
            .extend(overlay.normalized().categories);
        Ok(merged)
    }

    /// Load an override file, or the builtin map when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ScoutError> {
        match path {
            None => Ok(Self::builtin()),
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    ScoutError::Config(format!("cannot read keyword map {}: {e}", path.display()))
                })?;
                Self::from_json_str(&raw)
            }
        }
    }

    fn normalized(mut self) -> Self {
        for words in self.categories.values_mut() {
            for word in words.iter_mut() {
                *word = word.to_lowercase();
            }
            words.retain(|w| !w.is_empty());
        }
        self
    }

    /// Keywords of a category (empty when the category is unknown).
    pub fn keywords(&self, category: &str) -> &[String] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First keyword of `category` contained in `haystack`, case-insensitive.
    pub fn find(&self, category: &str, haystack: &str) -> Option<&str> {
        let lowered = haystack.to_lowercase();
        self.keywords(category)
            .iter()
            .find(|kw| lowered.contains(kw.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, category: &str, haystack: &str) -> bool {
        self.find(category, haystack).is_some()
    }

    /// Whether any of the haystacks contains a keyword of `category`.
    pub fn matches_any(&self, category: &str, haystacks: &[&str]) -> bool {
        haystacks.iter().any(|h| self.matches(category, h))
    }
}
