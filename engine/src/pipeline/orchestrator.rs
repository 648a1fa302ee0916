//! Pipeline Orchestrator
//!
//! Drives the fixed-order state machine for one request:
//! Generate → Translate → Critique → Reflect → (optional) Evaluate.
//!
//! Stages run strictly one after another. A transport failure aborts the
//! run; state committed by earlier stages is kept.

use quill_sdk::errors::QuillError;
use quill_sdk::types::TemplateSpec;
use serde::Serialize;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::llm::LLMProvider;
use crate::pipeline::evaluator::{self, EvaluationPolicy, EvaluationReport};
use crate::pipeline::generator;
use crate::pipeline::metrics::Metric;
use crate::pipeline::refine::{self, RefineReport};
use crate::pipeline::state::{GenerationRequest, PipelineState};

/// Pipeline behaviour resolved from configuration
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub default_languages: Vec<String>,
    pub use_context: bool,
    pub max_context_snippets: usize,
    pub evaluation_policy: EvaluationPolicy,
    pub default_metrics: Vec<Metric>,
    pub conversation_token_limit: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            default_languages: vec!["es-ES".to_string()],
            use_context: true,
            max_context_snippets: 5,
            evaluation_policy: EvaluationPolicy::Isolate,
            default_metrics: vec![Metric::Accuracy, Metric::Fluency],
            conversation_token_limit: 8192,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &PipelineConfig) -> Result<Self, QuillError> {
        Ok(Self {
            default_languages: config.default_languages.clone(),
            use_context: config.use_context,
            max_context_snippets: config.max_context_snippets,
            evaluation_policy: config.evaluation_policy,
            default_metrics: config.metrics()?,
            conversation_token_limit: config.conversation_token_limit,
        })
    }
}

/// Result of a full `run`
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub state: PipelineState,
    pub refine: RefineReport,
    pub evaluation: Option<EvaluationReport>,
}

pub struct Pipeline {
    llm: Arc<dyn LLMProvider>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(llm: Arc<dyn LLMProvider>, settings: PipelineSettings) -> Self {
        Self { llm, settings }
    }

    /// Create a state for the request and generate its draft.
    ///
    /// Never returns a state with a half-populated draft.
    pub async fn generate(
        &self,
        request: GenerationRequest,
        template: TemplateSpec,
    ) -> Result<PipelineState, QuillError> {
        let mut state = PipelineState::new(request, template);
        generator::generate(
            self.llm.as_ref(),
            &mut state,
            self.settings.use_context,
            self.settings.max_context_snippets,
        )
        .await?;
        self.trim_conversation(&mut state);
        Ok(state)
    }

    /// Translate, critique and reflect. Empty `languages` means the
    /// configured defaults.
    pub async fn refine(
        &self,
        state: &mut PipelineState,
        languages: &[String],
    ) -> Result<RefineReport, QuillError> {
        let languages = if languages.is_empty() {
            self.settings.default_languages.as_slice()
        } else {
            languages
        };

        let result = refine::refine(self.llm.as_ref(), state, languages).await;
        self.trim_conversation(state);
        result
    }

    /// Score the translations. Empty `metrics` means the configured defaults.
    pub async fn evaluate(
        &self,
        state: &mut PipelineState,
        metrics: &[Metric],
    ) -> Result<EvaluationReport, QuillError> {
        let metrics = if metrics.is_empty() {
            self.settings.default_metrics.as_slice()
        } else {
            metrics
        };

        evaluator::evaluate(
            self.llm.as_ref(),
            state,
            metrics,
            self.settings.evaluation_policy,
        )
        .await
    }

    /// Generate, refine and optionally evaluate in one go.
    pub async fn run(
        &self,
        request: GenerationRequest,
        template: TemplateSpec,
        languages: &[String],
        metrics: Option<&[Metric]>,
    ) -> Result<RunOutcome, QuillError> {
        let mut state = self.generate(request, template).await?;
        let refine = self.refine(&mut state, languages).await?;

        let evaluation = match metrics {
            Some(metrics) => Some(self.evaluate(&mut state, metrics).await?),
            None => None,
        };

        Ok(RunOutcome {
            state,
            refine,
            evaluation,
        })
    }

    fn trim_conversation(&self, state: &mut PipelineState) {
        let removed = state
            .conversation
            .truncate_to_budget(self.settings.conversation_token_limit);
        if removed > 0 {
            tracing::debug!("Dropped {} old conversation message(s)", removed);
        }
    }
}
