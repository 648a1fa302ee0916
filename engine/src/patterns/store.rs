//! Pattern Store
//!
//! Read-only collection of pattern records, loaded once and shared freely
//! across selection requests.

use quill_sdk::errors::QuillError;
use quill_sdk::types::PatternRecord;
use std::collections::HashSet;
use std::path::Path;

use crate::config::PatternsConfig;

const BUILTIN_CATALOG: &str = include_str!("../../catalog/patterns.json");

#[derive(Debug, Clone)]
pub struct PatternStore {
    patterns: Vec<PatternRecord>,
}

impl PatternStore {
    /// Build a store, rejecting duplicate or empty ids.
    pub fn from_patterns(patterns: Vec<PatternRecord>) -> Result<Self, QuillError> {
        let mut seen = HashSet::new();
        for pattern in &patterns {
            let id = pattern.id.trim();
            if id.is_empty() {
                return Err(QuillError::Config(format!(
                    "Pattern '{}' has an empty id",
                    pattern.name
                )));
            }
            if !seen.insert(id.to_lowercase()) {
                return Err(QuillError::Config(format!("Duplicate pattern id '{}'", id)));
            }
        }
        Ok(Self { patterns })
    }

    /// Parse a JSON array of pattern records
    pub fn from_json_str(json: &str) -> Result<Self, QuillError> {
        let patterns: Vec<PatternRecord> = serde_json::from_str(json)?;
        Self::from_patterns(patterns)
    }

    /// Catalog shipped with the binary
    pub fn builtin() -> Result<Self, QuillError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn load(path: &Path) -> Result<Self, QuillError> {
        let contents = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&contents)?;
        tracing::debug!("Loaded {} pattern(s) from {}", store.len(), path.display());
        Ok(store)
    }

    /// Configured catalog file, or the builtin catalog when none is set
    pub fn from_config(config: &PatternsConfig) -> Result<Self, QuillError> {
        match &config.catalog {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    /// Patterns in catalog order
    pub fn patterns(&self) -> &[PatternRecord] {
        &self.patterns
    }

    pub fn get(&self, id: &str) -> Option<&PatternRecord> {
        let id = id.trim();
        self.patterns.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let store = PatternStore::builtin().unwrap();
        assert!(store.len() >= 5);
        assert!(store.get("MEME_REACTION").is_some());
        assert!(store
            .get("meme_reaction")
            .unwrap()
            .is_avoided_on("linkedin"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[{"id": "a", "name": "A"}, {"id": "A", "name": "Again"}]"#;
        let err = PatternStore::from_json_str(json).unwrap_err();
        assert!(matches!(err, QuillError::Config(ref m) if m.contains("Duplicate")));
    }

    #[test]
    fn test_empty_id_rejected() {
        let json = r#"[{"id": " ", "name": "Blank"}]"#;
        assert!(PatternStore::from_json_str(json).is_err());
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        let err = PatternStore::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, QuillError::Serialization(_)));
    }
}
