//! Evaluator
//!
//! Scores every translation against a set of metrics, one judge call per
//! (language, metric) pair, sequentially. A language's aggregate is the
//! arithmetic mean of its metric scores, all metrics weighted equally.
//!
//! How a failed judgement is handled depends on [`EvaluationPolicy`].

use quill_sdk::errors::QuillError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::extract::{excerpt, extract_object};
use crate::llm::LLMProvider;
use crate::pipeline::metrics::Metric;
use crate::pipeline::prompts;
use crate::pipeline::state::{PipelineState, Stage};

/// What to do when one (language, metric) judgement fails
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationPolicy {
    /// Record an error entry for the pair and keep going
    #[default]
    Isolate,

    /// Abort the whole evaluation on the first failure
    FailFast,
}

/// Judge verdict for one metric
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricResult {
    #[serde(rename = "name")]
    pub metric: Metric,

    /// Score in [0, 1]; `None` when the judgement failed
    pub score: Option<f64>,

    pub reason: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MetricResult {
    pub fn scored(metric: Metric, score: f64, reason: impl Into<String>) -> Self {
        Self {
            metric,
            score: Some(score),
            reason: reason.into(),
            error: None,
        }
    }

    pub fn failed(metric: Metric, error: &QuillError) -> Self {
        Self {
            metric,
            score: None,
            reason: String::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Ordered metric results for one language
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LanguageEvaluation {
    pub results: Vec<MetricResult>,

    /// Mean of the successful scores
    pub aggregate: Option<f64>,
}

impl LanguageEvaluation {
    pub fn from_results(results: Vec<MetricResult>) -> Self {
        let aggregate = mean(results.iter().filter_map(|r| r.score));
        Self { results, aggregate }
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.score.is_none()).count()
    }
}

/// Arithmetic mean, `None` for an empty input
pub fn mean(scores: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = scores
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), s| (sum + s, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Summary of an evaluation batch
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EvaluationReport {
    /// Language code -> aggregate score
    pub languages: BTreeMap<String, Option<f64>>,

    /// Mean of the per-language aggregates
    pub overall: Option<f64>,

    /// Number of failed (language, metric) judgements
    pub failures: usize,
}

impl EvaluationReport {
    pub fn from_evaluation(evaluation: &BTreeMap<String, LanguageEvaluation>) -> Self {
        let languages: BTreeMap<String, Option<f64>> = evaluation
            .iter()
            .map(|(language, e)| (language.clone(), e.aggregate))
            .collect();
        let overall = mean(languages.values().filter_map(|a| *a));
        let failures = evaluation.values().map(LanguageEvaluation::failures).sum();

        Self {
            languages,
            overall,
            failures,
        }
    }
}

/// Map a judge score onto [0, 1].
///
/// Scores above 1 and up to 10 are read as a ten-point scale.
pub fn normalize_score(raw: f64) -> Option<f64> {
    if !raw.is_finite() || raw < 0.0 {
        None
    } else if raw <= 1.0 {
        Some(raw)
    } else if raw <= 10.0 {
        Some(raw / 10.0)
    } else {
        None
    }
}

/// Parse a judge reply of the form `{"score": .., "reason": ..}`
pub fn parse_verdict(reply: &str) -> Result<(f64, String), QuillError> {
    let object = extract_object(reply)?;

    let raw = match object.get("score") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| QuillError::MalformedStructure {
        reason: "judge reply has no numeric score".to_string(),
        excerpt: excerpt(reply),
    })?;

    let score = normalize_score(raw).ok_or_else(|| QuillError::MalformedStructure {
        reason: format!("score {} is outside [0, 1]", raw),
        excerpt: excerpt(reply),
    })?;

    let reason = object
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok((score, reason))
}

async fn judge(
    llm: &dyn LLMProvider,
    metric: Metric,
    language: &str,
    source: &str,
    translation: &Value,
) -> Result<(f64, String), QuillError> {
    let messages = prompts::metric_judgement(metric, language, source, translation);
    let reply = llm.complete(&messages).await?;
    parse_verdict(&reply)
}

/// Evaluate every translation against `metrics` and commit the result.
///
/// Judge calls are not added to the conversation log. The evaluation map is
/// replaced only once the whole batch completes.
///
/// # Errors
///
/// - `PreconditionFailed` without translations or metrics
/// - `EvaluationFailed` on the first failed judgement under `FailFast`
pub async fn evaluate(
    llm: &dyn LLMProvider,
    state: &mut PipelineState,
    metrics: &[Metric],
    policy: EvaluationPolicy,
) -> Result<EvaluationReport, QuillError> {
    state.require_translations()?;

    let mut unique: Vec<Metric> = Vec::with_capacity(metrics.len());
    for metric in metrics {
        if !unique.contains(metric) {
            unique.push(*metric);
        }
    }
    if unique.is_empty() {
        return Err(QuillError::PreconditionFailed(
            "at least one metric is required".to_string(),
        ));
    }

    let start = Instant::now();
    tracing::info!(
        "Evaluating {} language(s) on {} metric(s)",
        state.translations.len(),
        unique.len()
    );

    let mut evaluation = BTreeMap::new();
    for (language, translation) in &state.translations {
        let mut results = Vec::with_capacity(unique.len());

        for metric in &unique {
            match judge(llm, *metric, language, &state.draft_content, translation).await {
                Ok((score, reason)) => {
                    tracing::debug!("{} {} = {:.2}", language, metric, score);
                    results.push(MetricResult::scored(*metric, score, reason));
                }
                Err(e) => match policy {
                    EvaluationPolicy::FailFast => {
                        return Err(QuillError::EvaluationFailed {
                            language: language.clone(),
                            metric: metric.name().to_string(),
                            source: Box::new(e),
                        });
                    }
                    EvaluationPolicy::Isolate => {
                        tracing::warn!("Metric {} for {} failed: {}", metric, language, e);
                        results.push(MetricResult::failed(*metric, &e));
                    }
                },
            }
        }

        evaluation.insert(language.clone(), LanguageEvaluation::from_results(results));
    }

    // Commit
    state.evaluation = evaluation;
    state.commit(Stage::Evaluated);

    let report = EvaluationReport::from_evaluation(&state.evaluation);
    tracing::info!(
        "Evaluation done in {:.1}s ({} failed judgement(s))",
        start.elapsed().as_secs_f64(),
        report.failures
    );
    Ok(report)
}
