//! Content template and pattern catalog types
//!
//! These are the leaf data records the pipeline and the pattern engine
//! consume. They are immutable once loaded.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Kind of value a template field holds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    LongText,
    List,
    Url,
    Number,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::LongText => write!(f, "long_text"),
            FieldType::List => write!(f, "list"),
            FieldType::Url => write!(f, "url"),
            FieldType::Number => write!(f, "number"),
        }
    }
}

/// One structural field of a content template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    /// JSON key the model must emit
    pub name: String,

    #[serde(default, rename = "type")]
    pub field_type: FieldType,

    /// Human label shown in prompts and rendered output
    pub label: String,

    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type,
            label: label.into(),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Active content template: structural fields plus the renderable layout
///
/// The layout references fields as `{{field_name}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateSpec {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub fields: Vec<FieldSpec>,

    pub layout: String,
}

impl TemplateSpec {
    /// Field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Required fields that are absent (or null/empty) in `content`
    pub fn missing_required(&self, content: &Value) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .filter(|f| match content.get(&f.name) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .map(|f| f.name.clone())
            .collect()
    }

    /// Render the layout with values from a content object
    ///
    /// Lists are joined one item per line; missing fields render empty.
    pub fn render(&self, content: &Value) -> String {
        let mut out = self.layout.clone();
        for field in &self.fields {
            let placeholder = format!("{{{{{}}}}}", field.name);
            let value = content
                .get(&field.name)
                .map(render_value)
                .unwrap_or_default();
            out = out.replace(&placeholder, &value);
        }
        out
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

/// How hard a pattern is to execute well
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Audience size bucket used for reach statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FollowerTier {
    Nano,
    Micro,
    Mid,
    Macro,
    Mega,
}

impl FollowerTier {
    pub fn from_followers(followers: u64) -> Self {
        match followers {
            0..=9_999 => FollowerTier::Nano,
            10_000..=99_999 => FollowerTier::Micro,
            100_000..=499_999 => FollowerTier::Mid,
            500_000..=999_999 => FollowerTier::Macro,
            _ => FollowerTier::Mega,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FollowerTier::Nano => "nano",
            FollowerTier::Micro => "micro",
            FollowerTier::Mid => "mid",
            FollowerTier::Macro => "macro",
            FollowerTier::Mega => "mega",
        }
    }
}

impl fmt::Display for FollowerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reusable content template family with historical performance data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternRecord {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Platforms the pattern is known to work on
    #[serde(default)]
    pub platforms: Vec<String>,

    /// Platform caveats, keyed by platform (e.g. "linkedin" -> "Avoid: ...")
    #[serde(default)]
    pub platform_notes: BTreeMap<String, String>,

    /// Industries the pattern fits; "all" matches any industry
    #[serde(default)]
    pub industries: Vec<String>,

    /// Content types the pattern needs; empty means unconstrained
    #[serde(default)]
    pub required_content_types: Vec<String>,

    /// Historical success rate (0.0-1.0) per account type
    #[serde(default)]
    pub success_rate: BTreeMap<String, f64>,

    /// Average reach per follower tier
    #[serde(default)]
    pub avg_reach: BTreeMap<FollowerTier, f64>,

    #[serde(default)]
    pub min_followers: u64,

    #[serde(default)]
    pub optimal_followers: u64,

    #[serde(default)]
    pub difficulty: Difficulty,

    #[serde(default)]
    pub hook_template: String,

    #[serde(default)]
    pub body_template: String,

    #[serde(default)]
    pub cta_template: String,
}

impl PatternRecord {
    /// Caveat text recorded for a platform, if any
    pub fn caveat_for(&self, platform: &str) -> Option<&str> {
        let platform = platform.trim().to_lowercase();
        self.platform_notes
            .iter()
            .find(|(k, _)| k.trim().to_lowercase() == platform)
            .map(|(_, v)| v.as_str())
    }

    /// True when the platform caveat tells authors to avoid this pattern there
    pub fn is_avoided_on(&self, platform: &str) -> bool {
        self.caveat_for(platform)
            .map(|note| note.to_lowercase().contains("avoid"))
            .unwrap_or(false)
    }

    /// Average reach recorded for a follower count's tier
    pub fn expected_reach(&self, followers: u64) -> Option<f64> {
        self.avg_reach
            .get(&FollowerTier::from_followers(followers))
            .copied()
    }
}

/// Request attributes a pattern is scored against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestAttributes {
    pub platform: String,
    pub industry: String,
    pub account_type: String,
    pub follower_count: u64,
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post_template() -> TemplateSpec {
        TemplateSpec {
            name: "post".to_string(),
            description: String::new(),
            fields: vec![
                FieldSpec::new("headline", FieldType::Text, "Headline").required(),
                FieldSpec::new("hashtags", FieldType::List, "Hashtags"),
            ],
            layout: "# {{headline}}\n{{hashtags}}".to_string(),
        }
    }

    #[test]
    fn test_render_substitutes_fields() {
        let template = post_template();
        let content = json!({"headline": "Launch day", "hashtags": ["#saas", "#launch"]});
        assert_eq!(template.render(&content), "# Launch day\n#saas\n#launch");
    }

    #[test]
    fn test_render_missing_field_is_empty() {
        let template = post_template();
        assert_eq!(template.render(&json!({"headline": "Hi"})), "# Hi\n");
    }

    #[test]
    fn test_missing_required() {
        let template = post_template();
        assert_eq!(
            template.missing_required(&json!({"headline": "  "})),
            vec!["headline".to_string()]
        );
        assert!(template
            .missing_required(&json!({"headline": "ok"}))
            .is_empty());
    }

    #[test]
    fn test_follower_tiers() {
        assert_eq!(FollowerTier::from_followers(8_000), FollowerTier::Nano);
        assert_eq!(FollowerTier::from_followers(10_000), FollowerTier::Micro);
        assert_eq!(FollowerTier::from_followers(250_000), FollowerTier::Mid);
        assert_eq!(FollowerTier::from_followers(750_000), FollowerTier::Macro);
        assert_eq!(FollowerTier::from_followers(5_000_000), FollowerTier::Mega);
    }

    #[test]
    fn test_avoid_caveat_is_case_insensitive() {
        let mut pattern = PatternRecord {
            id: "p1".to_string(),
            name: "Hot take".to_string(),
            description: String::new(),
            platforms: vec!["linkedin".to_string()],
            platform_notes: BTreeMap::new(),
            industries: vec![],
            required_content_types: vec![],
            success_rate: BTreeMap::new(),
            avg_reach: BTreeMap::new(),
            min_followers: 0,
            optimal_followers: 0,
            difficulty: Difficulty::Medium,
            hook_template: String::new(),
            body_template: String::new(),
            cta_template: String::new(),
        };
        assert!(!pattern.is_avoided_on("LinkedIn"));

        pattern
            .platform_notes
            .insert("LinkedIn".to_string(), "AVOID for B2B audiences".to_string());
        assert!(pattern.is_avoided_on("linkedin"));
        assert!(!pattern.is_avoided_on("tiktok"));
    }

    #[test]
    fn test_pattern_deserializes_with_defaults() {
        let pattern: PatternRecord = serde_json::from_value(json!({
            "id": "listicle",
            "name": "Listicle",
            "avg_reach": {"nano": 1200.0}
        }))
        .unwrap();
        assert_eq!(pattern.difficulty, Difficulty::Medium);
        assert!(pattern.required_content_types.is_empty());
        assert_eq!(pattern.expected_reach(500), Some(1200.0));
        assert_eq!(pattern.expected_reach(50_000), None);
    }
}
