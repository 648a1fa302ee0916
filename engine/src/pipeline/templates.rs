//! Content templates
//!
//! Builtin templates plus loading of user templates from JSON files.

use quill_sdk::errors::QuillError;
use quill_sdk::types::{FieldSpec, FieldType, TemplateSpec};
use std::path::Path;

/// Names of the builtin templates
pub const BUILTIN_TEMPLATES: [&str; 3] = ["social_post", "email_campaign", "product_description"];

pub fn builtin_templates() -> Vec<TemplateSpec> {
    BUILTIN_TEMPLATES
        .iter()
        .filter_map(|name| builtin(name))
        .collect()
}

fn builtin(name: &str) -> Option<TemplateSpec> {
    let template = match name {
        "social_post" => TemplateSpec {
            name: "social_post".to_string(),
            description: "Short social media post with hook, body and hashtags".to_string(),
            fields: vec![
                FieldSpec::new("hook", FieldType::Text, "Hook").required(),
                FieldSpec::new("body", FieldType::LongText, "Body").required(),
                FieldSpec::new("call_to_action", FieldType::Text, "Call to action").required(),
                FieldSpec::new("hashtags", FieldType::List, "Hashtags"),
            ],
            layout: "{{hook}}\n\n{{body}}\n\n{{call_to_action}}\n\n{{hashtags}}".to_string(),
        },
        "email_campaign" => TemplateSpec {
            name: "email_campaign".to_string(),
            description: "Marketing email with subject line and preview text".to_string(),
            fields: vec![
                FieldSpec::new("subject", FieldType::Text, "Subject line").required(),
                FieldSpec::new("preview_text", FieldType::Text, "Preview text"),
                FieldSpec::new("greeting", FieldType::Text, "Greeting"),
                FieldSpec::new("body", FieldType::LongText, "Body").required(),
                FieldSpec::new("call_to_action", FieldType::Text, "Call to action").required(),
                FieldSpec::new("cta_url", FieldType::Url, "Call to action URL"),
            ],
            layout: "Subject: {{subject}}\nPreview: {{preview_text}}\n\n{{greeting}}\n\n{{body}}\n\n{{call_to_action}} {{cta_url}}".to_string(),
        },
        "product_description" => TemplateSpec {
            name: "product_description".to_string(),
            description: "Product page copy with feature bullets".to_string(),
            fields: vec![
                FieldSpec::new("title", FieldType::Text, "Product title").required(),
                FieldSpec::new("tagline", FieldType::Text, "Tagline"),
                FieldSpec::new("description", FieldType::LongText, "Description").required(),
                FieldSpec::new("features", FieldType::List, "Key features").required(),
                FieldSpec::new("call_to_action", FieldType::Text, "Call to action"),
            ],
            layout: "# {{title}}\n_{{tagline}}_\n\n{{description}}\n\n{{features}}\n\n{{call_to_action}}".to_string(),
        },
        _ => return None,
    };
    Some(template)
}

/// Look up a builtin template by name
pub fn find_builtin(name: &str) -> Result<TemplateSpec, QuillError> {
    builtin(name.trim()).ok_or_else(|| QuillError::UnknownTemplate(name.trim().to_string()))
}

/// Load a template from a JSON file
pub fn load_template(path: &Path) -> Result<TemplateSpec, QuillError> {
    let contents = std::fs::read_to_string(path)?;
    let template: TemplateSpec = serde_json::from_str(&contents)?;

    if template.fields.is_empty() {
        return Err(QuillError::Config(format!(
            "Template '{}' declares no fields",
            template.name
        )));
    }

    Ok(template)
}

/// Resolve a builtin name, or a path to a JSON template file
pub fn resolve_template(name_or_path: &str) -> Result<TemplateSpec, QuillError> {
    let path = Path::new(name_or_path);
    if path.extension().is_some_and(|ext| ext == "json") {
        load_template(path)
    } else {
        find_builtin(name_or_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_all_builtins_resolve() {
        let templates = builtin_templates();
        assert_eq!(templates.len(), BUILTIN_TEMPLATES.len());
        for template in templates {
            for field in template.field_names() {
                assert!(
                    template.layout.contains(&format!("{{{{{}}}}}", field)),
                    "{} layout misses {}",
                    template.name,
                    field
                );
            }
        }
    }

    #[test]
    fn test_unknown_template() {
        let err = find_builtin("press_release").unwrap_err();
        assert!(matches!(err, QuillError::UnknownTemplate(ref n) if n == "press_release"));
    }

    #[test]
    fn test_load_template_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"name": "tweet", "fields": [{{"name": "text", "type": "text", "label": "Text", "required": true}}], "layout": "{{{{text}}}}"}}"#
        )
        .unwrap();

        let template = resolve_template(file.path().to_str().unwrap()).unwrap();
        assert_eq!(template.name, "tweet");
        assert!(template.fields[0].required);
    }

    #[test]
    fn test_template_without_fields_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"name": "empty", "fields": [], "layout": ""}}"#).unwrap();
        assert!(matches!(
            load_template(file.path()),
            Err(QuillError::Config(_))
        ));
    }
}
