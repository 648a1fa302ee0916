//! Prompt construction for every model call in the pipeline
//!
//! Prompts are assembled as message lists. Contextual notes (audience,
//! similar content, pattern guidance) are sent as their own messages so the
//! model sees them apart from the main instruction.

use quill_sdk::types::{PatternRecord, RequestAttributes, TemplateSpec};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::llm::Message;
use crate::pipeline::metrics::Metric;
use crate::pipeline::state::GenerationRequest;

const COPYWRITER_SYSTEM_PROMPT: &str = "You are a senior marketing copywriter and localization expert. \
Follow the requested output format exactly.";

const JUDGE_SYSTEM_PROMPT: &str = "You are a strict reviewer of translated marketing content. \
You answer with a single JSON object and nothing else.";

/// JSON skeleton listing every template field with its label and type
pub fn template_shape(template: &TemplateSpec) -> String {
    let mut shape = serde_json::Map::new();
    for field in &template.fields {
        let hint = if field.required {
            format!("<{} ({}, required)>", field.label, field.field_type)
        } else {
            format!("<{} ({})>", field.label, field.field_type)
        };
        shape.insert(field.name.clone(), Value::String(hint));
    }
    serde_json::to_string_pretty(&Value::Object(shape)).unwrap_or_default()
}

fn language_list(languages: &BTreeSet<String>) -> String {
    languages
        .iter()
        .map(|l| format!("\"{}\"", l))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Translations concatenated per language under `<code>...</code>` delimiters
pub fn delimited_translations(translations: &BTreeMap<String, Value>) -> String {
    translations
        .iter()
        .map(|(language, content)| {
            let body = serde_json::to_string_pretty(content).unwrap_or_default();
            format!("<{lang}>\n{body}\n</{lang}>", lang = language, body = body)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Messages for the first-draft generation call
pub fn generation(
    request: &GenerationRequest,
    template: &TemplateSpec,
    audience: Option<&str>,
    use_context: bool,
    max_snippets: usize,
) -> Vec<Message> {
    let mut messages = vec![Message::system(COPYWRITER_SYSTEM_PROMPT)];

    if let Some(audience) = audience {
        messages.push(Message::user(format!(
            "Audience note: the content targets {}. Keep this audience in mind for every field.",
            audience
        )));
    }

    if use_context {
        let snippets: Vec<&str> = request
            .context_snippets
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .take(max_snippets)
            .collect();
        if !snippets.is_empty() {
            let joined = snippets
                .iter()
                .enumerate()
                .map(|(i, s)| format!("[{}] {}", i + 1, s))
                .collect::<Vec<_>>()
                .join("\n");
            messages.push(Message::user(format!(
                "Similar content note: these past pieces performed well. Borrow their strengths, do not copy them.\n{}",
                joined
            )));
        }
    }

    if let Some(pattern) = &request.pattern {
        messages.push(Message::user(format!(
            "Pattern note: structure the content with the \"{}\" pattern.\nHook: {}\nBody: {}\nCall to action: {}",
            pattern.name, pattern.hook, pattern.body, pattern.cta
        )));
    }

    let fields = template
        .fields
        .iter()
        .map(|f| {
            let required = if f.required { ", required" } else { "" };
            format!("- \"{}\": {} ({}{})", f.name, f.label, f.field_type, required)
        })
        .collect::<Vec<_>>()
        .join("\n");

    messages.push(Message::user(format!(
        "Write {template_name} content for this request:\n{prompt}\n\n\
         The content is rendered with this layout:\n{layout}\n\n\
         Fields:\n{fields}\n\n\
         Output ONLY a JSON object with exactly these keys:\n{shape}",
        template_name = template.name,
        prompt = request.prompt.trim(),
        layout = template.layout,
        fields = fields,
        shape = template_shape(template),
    )));

    messages
}

/// Messages for the Translate stage
pub fn translation(
    draft: &str,
    languages: &BTreeSet<String>,
    template: &TemplateSpec,
) -> Vec<Message> {
    vec![
        Message::system(COPYWRITER_SYSTEM_PROMPT),
        Message::user(format!(
            "Translate this marketing content into each of these languages: {langs}.\n\n\
             Source content:\n{draft}\n\n\
             Output ONLY a JSON object whose top-level keys are exactly {langs}. \
             Each value must be an object with the keys {keys}, translated field by field. \
             Do not translate the keys.",
            langs = language_list(languages),
            draft = draft,
            keys = template
                .field_names()
                .iter()
                .map(|k| format!("\"{}\"", k))
                .collect::<Vec<_>>()
                .join(", "),
        )),
    ]
}

/// Messages for the Critique stage
pub fn critique(translations: &BTreeMap<String, Value>) -> Vec<Message> {
    vec![
        Message::system(COPYWRITER_SYSTEM_PROMPT),
        Message::user(format!(
            "Review these translations of the same marketing content. For each language, \
             list concrete problems with accuracy, fluency, tone, idioms and cultural fit, \
             and say how to fix them.\n\n{}",
            delimited_translations(translations)
        )),
    ]
}

/// Messages for the Reflect stage
pub fn reflection(
    translations: &BTreeMap<String, Value>,
    criticism: &str,
    languages: &BTreeSet<String>,
    template: &TemplateSpec,
) -> Vec<Message> {
    vec![
        Message::system(COPYWRITER_SYSTEM_PROMPT),
        Message::user(format!(
            "Improve these translations using the review below.\n\n\
             Translations:\n{translations}\n\n\
             Review:\n{criticism}\n\n\
             Output ONLY a JSON object whose top-level keys are exactly {langs}. \
             Each value must be an object with the keys {keys}.",
            translations = delimited_translations(translations),
            criticism = criticism.trim(),
            langs = language_list(languages),
            keys = template
                .field_names()
                .iter()
                .map(|k| format!("\"{}\"", k))
                .collect::<Vec<_>>()
                .join(", "),
        )),
    ]
}

/// Messages for one (language, metric) judgement
pub fn metric_judgement(
    metric: Metric,
    language: &str,
    source: &str,
    translation: &Value,
) -> Vec<Message> {
    let translation = serde_json::to_string_pretty(translation).unwrap_or_default();
    vec![
        Message::system(JUDGE_SYSTEM_PROMPT),
        Message::user(format!(
            "Score the {language} translation on {metric}.\n\
             Criteria: {criteria}\n\n\
             Source content:\n{source}\n\n\
             <{language}>\n{translation}\n</{language}>\n\n\
             Answer with {{\"score\": <number between 0 and 1>, \"reason\": \"<one sentence>\"}}.",
            language = language,
            metric = metric.display_name(),
            criteria = metric.criteria(),
            source = source,
            translation = translation,
        )),
    ]
}

/// Messages asking the model to pick one pattern among scored candidates
pub fn pattern_judgement(
    attributes: &RequestAttributes,
    candidates: &[(&PatternRecord, f64)],
) -> Vec<Message> {
    let listing = candidates
        .iter()
        .map(|(pattern, score)| {
            format!(
                "- id: {}\n  name: {}\n  score: {:.1}\n  description: {}\n  hook: {}",
                pattern.id, pattern.name, score, pattern.description, pattern.hook_template
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        Message::system(
            "You are a social media strategist. You answer with a single JSON object and nothing else.",
        ),
        Message::user(format!(
            "Pick the best content pattern for this account.\n\
             Platform: {}\nIndustry: {}\nAccount type: {}\nFollowers: {}\nContent type: {}\n\n\
             Candidates:\n{}\n\n\
             Answer with {{\"pattern_id\": \"<one of the candidate ids>\", \"reason\": \"<why>\"}}.",
            attributes.platform,
            attributes.industry,
            attributes.account_type,
            attributes.follower_count,
            attributes.content_type,
            listing
        )),
    ]
}
