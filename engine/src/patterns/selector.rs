//! Pattern Selector
//!
//! Ranks the whole catalog, keeps the top N (stable sort, so ties keep
//! catalog order) and optionally lets the model pick one of them. The
//! selector never returns a pattern outside its own top N: a judge that
//! fails or names an unknown id falls back to the top-scored candidate.

use quill_sdk::errors::QuillError;
use quill_sdk::types::{PatternRecord, RequestAttributes};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::extract::{excerpt, extract_object};
use crate::llm::LLMProvider;
use crate::patterns::scorer::{score_pattern, ScoreBreakdown};
use crate::patterns::store::PatternStore;
use crate::pipeline::prompts;

/// Default number of candidates kept for the final pick
pub const DEFAULT_TOP_N: usize = 3;

/// A pattern with its score for one request
#[derive(Debug, Clone, Serialize)]
pub struct ScoredPattern<'a> {
    pub pattern: &'a PatternRecord,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Score every pattern and return the `top_n` best, highest first.
pub fn select_patterns<'a>(
    attributes: &RequestAttributes,
    catalog: &'a [PatternRecord],
    top_n: usize,
) -> Vec<ScoredPattern<'a>> {
    let mut scored: Vec<ScoredPattern<'a>> = catalog
        .iter()
        .map(|pattern| {
            let breakdown = score_pattern(pattern, attributes);
            ScoredPattern {
                pattern,
                score: breakdown.total(),
                breakdown,
            }
        })
        .collect();

    // `sort_by` is stable
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_n);
    scored
}

/// How the final pattern was chosen
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    Judge,
    TopScore,
}

/// Final pick among the top candidates
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub pattern: PatternRecord,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub rationale: String,
    pub source: SelectionSource,

    /// Expected reach for the request's follower tier, when recorded
    pub expected_reach: Option<f64>,

    /// `(id, score)` of every top-N candidate, highest first
    pub candidates: Vec<(String, f64)>,
}

pub struct PatternSelector {
    llm: Option<Arc<dyn LLMProvider>>,
    top_n: usize,
}

impl PatternSelector {
    /// Selector that always takes the top-scored candidate
    pub fn new(top_n: usize) -> Self {
        Self {
            llm: None,
            top_n: top_n.max(1),
        }
    }

    /// Selector that asks the model to pick among the top candidates
    pub fn with_judge(llm: Arc<dyn LLMProvider>, top_n: usize) -> Self {
        Self {
            llm: Some(llm),
            top_n: top_n.max(1),
        }
    }

    /// Rank the store and choose one pattern.
    ///
    /// # Errors
    ///
    /// `PreconditionFailed` when the store is empty. Judge failures are
    /// never returned; they fall back to the top-scored candidate.
    pub async fn choose(
        &self,
        attributes: &RequestAttributes,
        store: &PatternStore,
    ) -> Result<Selection, QuillError> {
        let candidates = select_patterns(attributes, store.patterns(), self.top_n);
        let top = candidates.first().ok_or_else(|| {
            QuillError::PreconditionFailed("pattern catalog is empty".to_string())
        })?;

        tracing::info!(
            "Top {} pattern(s): {}",
            candidates.len(),
            candidates
                .iter()
                .map(|c| format!("{} ({:.1})", c.pattern.id, c.score))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let (chosen, rationale, source) = match (&self.llm, candidates.len()) {
            (Some(llm), n) if n > 1 => {
                match judge_pick(llm.as_ref(), attributes, &candidates).await {
                    Ok((index, reason)) => (&candidates[index], reason, SelectionSource::Judge),
                    Err(e) => {
                        tracing::warn!(
                            "Pattern judge failed, falling back to top score: {}",
                            e
                        );
                        (top, top_score_rationale(top), SelectionSource::TopScore)
                    }
                }
            }
            _ => (top, top_score_rationale(top), SelectionSource::TopScore),
        };

        Ok(Selection {
            pattern: chosen.pattern.clone(),
            score: chosen.score,
            breakdown: chosen.breakdown,
            rationale,
            source,
            expected_reach: chosen.pattern.expected_reach(attributes.follower_count),
            candidates: candidates
                .iter()
                .map(|c| (c.pattern.id.clone(), c.score))
                .collect(),
        })
    }
}

fn top_score_rationale(candidate: &ScoredPattern<'_>) -> String {
    format!(
        "Highest weighted score ({:.1}) among the candidates",
        candidate.score
    )
}

/// Ask the model to pick a candidate; returns its index and the reason.
async fn judge_pick(
    llm: &dyn LLMProvider,
    attributes: &RequestAttributes,
    candidates: &[ScoredPattern<'_>],
) -> Result<(usize, String), QuillError> {
    let listing: Vec<(&PatternRecord, f64)> =
        candidates.iter().map(|c| (c.pattern, c.score)).collect();
    let messages = prompts::pattern_judgement(attributes, &listing);

    let reply = llm.complete(&messages).await?;
    parse_judge_reply(&reply, candidates)
}

fn parse_judge_reply(
    reply: &str,
    candidates: &[ScoredPattern<'_>],
) -> Result<(usize, String), QuillError> {
    let object = extract_object(reply)?;

    let id = object
        .get("pattern_id")
        .or_else(|| object.get("id"))
        .and_then(Value::as_str)
        .map(str::trim)
        .ok_or_else(|| QuillError::MalformedStructure {
            reason: "judge reply has no pattern_id".to_string(),
            excerpt: excerpt(reply),
        })?;

    let index = candidates
        .iter()
        .position(|c| c.pattern.id.eq_ignore_ascii_case(id))
        .ok_or_else(|| QuillError::PatternNotFound(id.to_string()))?;

    let reason = object
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok((index, reason))
}
