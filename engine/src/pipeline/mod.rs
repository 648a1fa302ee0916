//! Content refinement pipeline
//!
//! Generate → Translate → Critique → Reflect → Evaluate over a single
//! [`PipelineState`] per request.

pub mod evaluator;
pub mod generator;
pub mod metrics;
pub mod orchestrator;
pub mod prompts;
pub mod refine;
pub mod state;
pub mod templates;

pub use evaluator::{EvaluationPolicy, EvaluationReport, LanguageEvaluation, MetricResult};
pub use metrics::Metric;
pub use orchestrator::{Pipeline, PipelineSettings, RunOutcome};
pub use refine::RefineReport;
pub use state::{Conversation, GenerationRequest, PatternGuidance, PipelineState, Stage};
