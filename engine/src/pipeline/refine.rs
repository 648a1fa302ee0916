//! Refinement loop: Translate → Critique → Reflect
//!
//! A single fixed-order pass with no loop-back. Translate and Reflect must
//! return a JSON object keyed by exactly the selected language codes, each
//! value an object of template fields. Critique is free text.
//!
//! Translate failures are fatal to the stage. Reflect extraction failures are
//! not: the reflected object is discarded and the previous translations stay
//! in place.

use quill_sdk::errors::QuillError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::extract::{excerpt, extract_object};
use crate::llm::{LLMProvider, Message};
use crate::pipeline::prompts;
use crate::pipeline::state::{PipelineState, Stage};

/// Outcome of a refinement pass
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RefineReport {
    pub languages: Vec<String>,

    /// False when the reflected translations were discarded
    pub reflected: bool,

    /// Why the reflected translations were discarded
    pub discarded_reason: Option<String>,
}

/// Trim and de-duplicate language codes.
///
/// Codes that differ only by case collapse to the first spelling given.
///
/// # Errors
///
/// `PreconditionFailed` when no non-empty code remains.
pub fn normalize_languages<S: AsRef<str>>(languages: &[S]) -> Result<BTreeSet<String>, QuillError> {
    let mut seen = BTreeSet::new();
    let mut set = BTreeSet::new();
    for language in languages {
        let code = language.as_ref().trim();
        if !code.is_empty() && seen.insert(code.to_ascii_lowercase()) {
            set.insert(code.to_string());
        }
    }

    if set.is_empty() {
        return Err(QuillError::PreconditionFailed(
            "at least one target language is required".to_string(),
        ));
    }
    Ok(set)
}

/// Check a Translate/Reflect object against the requested languages.
///
/// An exact key match wins; otherwise the key takes the first still-unmatched
/// language that equals it case-insensitively. Keys are returned in their
/// requested form. Every value must be a JSON object.
pub fn validate_language_set(
    object: Map<String, Value>,
    languages: &BTreeSet<String>,
    raw: &str,
) -> Result<BTreeMap<String, Value>, QuillError> {
    let mut matched = BTreeMap::new();
    let mut unexpected = Vec::new();

    for (key, value) in object {
        let trimmed = key.trim();
        let canonical = languages
            .get(trimmed)
            .filter(|l| !matched.contains_key(*l))
            .or_else(|| {
                languages
                    .iter()
                    .find(|l| !matched.contains_key(*l) && l.eq_ignore_ascii_case(trimmed))
            });

        match canonical {
            Some(language) => {
                matched.insert(language.clone(), value);
            }
            None => unexpected.push(key),
        }
    }

    let missing: Vec<String> = languages
        .iter()
        .filter(|l| !matched.contains_key(*l))
        .cloned()
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(QuillError::IncompleteLanguageSet {
            missing,
            unexpected,
            excerpt: excerpt(raw),
        });
    }

    if let Some((language, _)) = matched.iter().find(|(_, v)| !v.is_object()) {
        return Err(QuillError::MalformedStructure {
            reason: format!("translation for {} is not an object", language),
            excerpt: excerpt(raw),
        });
    }

    Ok(matched)
}

fn parse_translations(
    reply: &str,
    languages: &BTreeSet<String>,
) -> Result<BTreeMap<String, Value>, QuillError> {
    let object = extract_object(reply)?;
    validate_language_set(object, languages, reply)
}

fn warn_missing_fields(state: &PipelineState, translations: &BTreeMap<String, Value>) {
    for (language, content) in translations {
        let missing = state.template.missing_required(content);
        if !missing.is_empty() {
            tracing::warn!(
                "Translation {} is missing required fields: {}",
                language,
                missing.join(", ")
            );
        }
    }
}

/// Translate the draft into every language in `languages`.
///
/// On success `translations` and `selected_languages` are replaced and any
/// criticism or evaluation of older translations is cleared.
pub async fn translate(
    llm: &dyn LLMProvider,
    state: &mut PipelineState,
    languages: &BTreeSet<String>,
) -> Result<(), QuillError> {
    state.require_draft()?;
    if languages.is_empty() {
        return Err(QuillError::PreconditionFailed(
            "at least one target language is required".to_string(),
        ));
    }

    let start = Instant::now();
    tracing::info!("Translating draft into {} language(s)", languages.len());

    let messages = prompts::translation(&state.draft_content, languages, &state.template);
    let reply = llm
        .complete(&messages)
        .await
        .map_err(|e| QuillError::TranslationFailed(Box::new(e.into())))?;

    let translations = parse_translations(&reply, languages)
        .map_err(|e| QuillError::TranslationFailed(Box::new(e)))?;
    warn_missing_fields(state, &translations);

    // Commit
    if let Some(last) = messages.last() {
        state.conversation.push(last.clone());
    }
    state.conversation.push(Message::assistant(reply));
    state.selected_languages = languages.clone();
    state.translations = translations;
    state.criticism.clear();
    state.evaluation.clear();
    state.commit(Stage::Translated);

    tracing::info!("Translated in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Critique the current translations. Only transport can fail here.
pub async fn critique(llm: &dyn LLMProvider, state: &mut PipelineState) -> Result<(), QuillError> {
    state.require_translations()?;

    let start = Instant::now();
    tracing::info!("Critiquing {} translation(s)", state.translations.len());

    let messages = prompts::critique(&state.translations);
    let reply = llm
        .complete(&messages)
        .await
        .map_err(|e| QuillError::CritiqueFailed(Box::new(e.into())))?;

    if reply.trim().is_empty() {
        tracing::warn!("Critique came back empty");
    }

    // Commit
    if let Some(last) = messages.last() {
        state.conversation.push(last.clone());
    }
    state.conversation.push(Message::assistant(reply.clone()));
    state.criticism = reply.trim().to_string();
    state.commit(Stage::Critiqued);

    tracing::info!("Critique done in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Replace translations with improved ones that address the criticism.
///
/// Returns `Ok(Some(reason))` when the reply could not be used; the previous
/// translations are kept in that case.
///
/// # Errors
///
/// `ReflectionFailed` on transport failure, with the state untouched.
pub async fn reflect(
    llm: &dyn LLMProvider,
    state: &mut PipelineState,
) -> Result<Option<String>, QuillError> {
    state.require_translations()?;

    let start = Instant::now();
    tracing::info!("Reflecting on criticism");

    let messages = prompts::reflection(
        &state.translations,
        &state.criticism,
        &state.selected_languages,
        &state.template,
    );
    let reply = llm
        .complete(&messages)
        .await
        .map_err(|e| QuillError::ReflectionFailed(Box::new(e.into())))?;

    let outcome = parse_translations(&reply, &state.selected_languages);

    // Commit
    if let Some(last) = messages.last() {
        state.conversation.push(last.clone());
    }
    state.conversation.push(Message::assistant(reply));

    let discarded = match outcome {
        Ok(improved) => {
            warn_missing_fields(state, &improved);
            state.translations = improved;
            state.evaluation.clear();
            None
        }
        Err(e) => {
            tracing::warn!("Discarding reflected translations, keeping previous ones: {}", e);
            Some(e.to_string())
        }
    };
    state.commit(Stage::Reflected);

    tracing::info!("Reflection done in {:.1}s", start.elapsed().as_secs_f64());
    Ok(discarded)
}

/// Run Translate → Critique → Reflect for `languages`.
pub async fn refine<S: AsRef<str>>(
    llm: &dyn LLMProvider,
    state: &mut PipelineState,
    languages: &[S],
) -> Result<RefineReport, QuillError> {
    state.require_draft()?;
    let languages = normalize_languages(languages)?;

    translate(llm, state, &languages).await?;
    critique(llm, state).await?;
    let discarded_reason = reflect(llm, state).await?;

    Ok(RefineReport {
        languages: languages.into_iter().collect(),
        reflected: discarded_reason.is_none(),
        discarded_reason,
    })
}
