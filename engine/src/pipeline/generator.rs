//! Content generation stage
//!
//! Produces the first-draft content object for a request. The model is
//! called once; the reply is fence-stripped and must be a JSON object, or
//! contain one the extractor can recover.

use quill_sdk::errors::QuillError;
use serde_json::Value;
use std::time::Instant;

use crate::extract::{extract_object, strip_code_fences};
use crate::llm::{LLMProvider, Message};
use crate::pipeline::prompts;
use crate::pipeline::state::{PipelineState, Stage};

/// Generate the draft and commit it to `state`.
///
/// Downstream results (translations, criticism, evaluation) are cleared on
/// success since they no longer describe the draft.
///
/// # Errors
///
/// `GenerationFailed` wrapping the transport or extraction failure. The
/// state is untouched on error.
pub async fn generate(
    llm: &dyn LLMProvider,
    state: &mut PipelineState,
    use_context: bool,
    max_snippets: usize,
) -> Result<(), QuillError> {
    let start = Instant::now();
    tracing::info!("Generating {} draft (run {})", state.template.name, state.run_id);

    let messages = prompts::generation(
        &state.request,
        &state.template,
        state.audience_context.as_deref(),
        use_context && state.request.use_context,
        max_snippets,
    );
    tracing::debug!(
        "Generation prompt: {} messages, {} chars",
        messages.len(),
        messages.iter().map(|m| m.content.len()).sum::<usize>()
    );

    let reply = llm
        .complete(&messages)
        .await
        .map_err(|e| QuillError::GenerationFailed(Box::new(e.into())))?;

    let draft = normalize_draft(&reply).map_err(|e| QuillError::GenerationFailed(Box::new(e)))?;

    if let Ok(value) = serde_json::from_str::<Value>(&draft) {
        let missing = state.template.missing_required(&value);
        if !missing.is_empty() {
            tracing::warn!("Draft is missing required fields: {}", missing.join(", "));
        }
    }

    // Commit
    if let Some(last) = messages.last() {
        state.conversation.push(last.clone());
    }
    state.conversation.push(Message::assistant(reply));
    state.draft_content = draft;
    state.translations.clear();
    state.criticism.clear();
    state.evaluation.clear();
    state.selected_languages.clear();
    state.commit(Stage::Generated);

    tracing::info!(
        "Draft generated in {:.1}s",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Fence-stripped reply when it is already a JSON object, otherwise the
/// extracted object re-serialized.
fn normalize_draft(reply: &str) -> Result<String, QuillError> {
    let cleaned = strip_code_fences(reply);
    if let Ok(Value::Object(_)) = serde_json::from_str::<Value>(cleaned) {
        return Ok(cleaned.to_string());
    }

    let object = extract_object(cleaned)?;
    Ok(serde_json::to_string_pretty(&Value::Object(object))?)
}
