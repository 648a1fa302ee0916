use proptest::prelude::*;
use quill_sdk::errors::{QuillError, QuillErrorExt};
use quill_sdk::types::{FieldSpec, FieldType, FollowerTier, TemplateSpec};
use serde_json::{json, Value};

// Every error carries a usable hint, and stage wrappers keep the root
// classification
proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "\\PC*") {
        let errs = vec![
            QuillError::Config(error_str.clone()),
            QuillError::Transport(error_str.clone()),
            QuillError::NoStructureFound { excerpt: error_str.clone() },
            QuillError::MalformedStructure { reason: error_str.clone(), excerpt: error_str.clone() },
            QuillError::PreconditionFailed(error_str.clone()),
            QuillError::PatternNotFound(error_str.clone()),
            QuillError::UnknownMetric(error_str.clone()),
            QuillError::UnknownTemplate(error_str.clone()),
        ];

        for err in errs {
            let kind = err.kind();
            let recoverable = err.is_recoverable();
            let hint = err.user_hint().to_string();
            prop_assert!(!hint.is_empty());

            let wrapped = QuillError::TranslationFailed(Box::new(err));
            prop_assert_eq!(wrapped.kind(), kind);
            prop_assert_eq!(wrapped.is_recoverable(), recoverable);
            prop_assert_eq!(wrapped.user_hint(), hint.as_str());
        }
    }

    #[test]
    fn test_follower_tiers_are_monotonic(a in any::<u64>(), b in any::<u64>()) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(FollowerTier::from_followers(low) <= FollowerTier::from_followers(high));
    }
}

fn template() -> TemplateSpec {
    TemplateSpec {
        name: "post".to_string(),
        description: String::new(),
        fields: vec![
            FieldSpec::new("hook", FieldType::Text, "Hook").required(),
            FieldSpec::new("hashtags", FieldType::List, "Hashtags"),
        ],
        layout: "{{hook}}\n\n{{hashtags}}".to_string(),
    }
}

// Rendering substitutes every field and leaves no placeholders behind
proptest! {
    #[test]
    fn test_render_substitutes_fields(
        hook in "[a-zA-Z0-9 ]{1,30}",
        tags in prop::collection::vec("#[a-z]{1,10}", 0..5),
    ) {
        let content = json!({"hook": hook, "hashtags": tags});
        let rendered = template().render(&content);

        prop_assert!(rendered.starts_with(&hook));
        prop_assert!(!rendered.contains("{{"));
        for tag in &tags {
            prop_assert!(rendered.contains(tag.as_str()));
        }
        prop_assert!(template().missing_required(&content).is_empty());
    }

    #[test]
    fn test_blank_required_field_is_missing(blank in "[ \\t]{0,5}") {
        let content = json!({"hook": blank, "hashtags": Value::Null});
        prop_assert_eq!(template().missing_required(&content), vec!["hook".to_string()]);
    }
}
