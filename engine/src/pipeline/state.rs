//! Pipeline State
//!
//! `PipelineState` is the single record threaded through every stage of a
//! request. Stages receive it as `&mut PipelineState`, compute their output
//! first and assign it last, so a stage that fails leaves the state exactly
//! as it found it. Every committed stage bumps `version`.
//!
//! The `Conversation` log is adapted from the agent working memory: messages
//! are appended in order and only removed by an explicit truncation call.

use chrono::{DateTime, Utc};
use quill_sdk::errors::QuillError;
use quill_sdk::types::{PatternRecord, TemplateSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

use crate::llm::{Message, MessageRole};
use crate::pipeline::evaluator::LanguageEvaluation;

/// Average characters per token (rough estimate: 1 token ≈ 4 characters)
const CHARS_PER_TOKEN: usize = 4;

/// Per-message overhead for role and structure, in tokens
const MESSAGE_OVERHEAD_TOKENS: usize = 10;

/// Last stage that was committed to a state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Created,
    Generated,
    Translated,
    Critiqued,
    Reflected,
    Evaluated,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Created => "created",
            Stage::Generated => "generated",
            Stage::Translated => "translated",
            Stage::Critiqued => "critiqued",
            Stage::Reflected => "reflected",
            Stage::Evaluated => "evaluated",
        };
        f.write_str(name)
    }
}

/// Pattern guidance injected into the generation prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternGuidance {
    pub id: String,
    pub name: String,
    pub hook: String,
    pub body: String,
    pub cta: String,
}

impl From<&PatternRecord> for PatternGuidance {
    fn from(pattern: &PatternRecord) -> Self {
        Self {
            id: pattern.id.clone(),
            name: pattern.name.clone(),
            hook: pattern.hook_template.clone(),
            body: pattern.body_template.clone(),
            cta: pattern.cta_template.clone(),
        }
    }
}

/// A single content generation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    /// Natural-language description of the content wanted
    pub prompt: String,

    /// Optional targeting hint
    #[serde(default)]
    pub audience: Option<String>,

    /// Retrieved similar-content snippets
    #[serde(default)]
    pub context_snippets: Vec<String>,

    /// Inject `context_snippets` into the prompt
    #[serde(default = "default_true")]
    pub use_context: bool,

    #[serde(default)]
    pub pattern: Option<PatternGuidance>,
}

fn default_true() -> bool {
    true
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            audience: None,
            context_snippets: Vec::new(),
            use_context: true,
            pattern: None,
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_context(mut self, snippets: Vec<String>) -> Self {
        self.context_snippets = snippets;
        self
    }

    pub fn with_pattern(mut self, pattern: &PatternRecord) -> Self {
        self.pattern = Some(PatternGuidance::from(pattern));
        self
    }
}

/// Ordered, role-tagged message log
///
/// Append-only until `truncate_to_budget` is called.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Estimated token count of the whole log
    pub fn estimated_tokens(&self) -> usize {
        self.messages.iter().map(estimate_tokens).sum()
    }

    fn system_prefix_len(&self) -> usize {
        match self.messages.first() {
            Some(m) if m.role == MessageRole::System => 1,
            _ => 0,
        }
    }

    /// Drop the oldest messages until the log fits in `limit` tokens.
    ///
    /// A leading system message and the two most recent messages are always
    /// kept, even if they alone exceed the budget. Returns the number of
    /// messages removed.
    pub fn truncate_to_budget(&mut self, limit: usize) -> usize {
        let prefix = self.system_prefix_len();
        let mut tokens = self.estimated_tokens();
        let mut removed = 0;

        while tokens > limit && self.messages.len() > prefix + 2 {
            let dropped = self.messages.remove(prefix);
            tokens = tokens.saturating_sub(estimate_tokens(&dropped));
            removed += 1;
        }

        removed
    }
}

fn estimate_tokens(message: &Message) -> usize {
    message.content.len().div_ceil(CHARS_PER_TOKEN) + MESSAGE_OVERHEAD_TOKENS
}

/// The baton passed from stage to stage for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub stage: Stage,

    /// Incremented on every committed stage
    pub version: u64,

    pub request: GenerationRequest,
    pub conversation: Conversation,
    pub template: TemplateSpec,

    /// Baseline content as JSON text; non-empty once generated
    pub draft_content: String,

    /// Language code -> translated content object
    pub translations: BTreeMap<String, Value>,

    /// Latest critique of `translations`
    pub criticism: String,

    /// Language code -> metric results; only set once translations exist
    pub evaluation: BTreeMap<String, LanguageEvaluation>,

    pub selected_languages: BTreeSet<String>,
    pub audience_context: Option<String>,
}

impl PipelineState {
    pub fn new(request: GenerationRequest, template: TemplateSpec) -> Self {
        let audience_context = request
            .audience
            .as_ref()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            stage: Stage::Created,
            version: 0,
            request,
            conversation: Conversation::new(),
            template,
            draft_content: String::new(),
            translations: BTreeMap::new(),
            criticism: String::new(),
            evaluation: BTreeMap::new(),
            selected_languages: BTreeSet::new(),
            audience_context,
        }
    }

    /// Record that `stage` completed
    pub(crate) fn commit(&mut self, stage: Stage) {
        self.stage = stage;
        self.version += 1;
        tracing::debug!(
            "Run {} committed stage {} (version {})",
            self.run_id,
            stage,
            self.version
        );
    }

    pub fn require_draft(&self) -> Result<(), QuillError> {
        if self.draft_content.trim().is_empty() {
            return Err(QuillError::PreconditionFailed(
                "draft content is empty; run generate first".to_string(),
            ));
        }
        Ok(())
    }

    pub fn require_translations(&self) -> Result<(), QuillError> {
        if self.translations.is_empty() {
            return Err(QuillError::PreconditionFailed(
                "no translations; run refine first".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed draft content
    pub fn draft_value(&self) -> Result<Value, QuillError> {
        self.require_draft()?;
        Ok(serde_json::from_str(&self.draft_content)?)
    }

    /// Draft rendered through the template layout
    pub fn render_draft(&self) -> Result<String, QuillError> {
        Ok(self.template.render(&self.draft_value()?))
    }

    /// Translation rendered through the template layout
    pub fn render_translation(&self, language: &str) -> Option<String> {
        self.translations
            .get(language)
            .map(|content| self.template.render(content))
    }

    /// Load a state previously written with [`PipelineState::save`]
    pub fn load(path: &Path) -> Result<Self, QuillError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the state as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), QuillError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
