//! Integration tests for pattern scoring and selection

mod common;

use common::ScriptedProvider;
use quill_engine::llm::LLMError;
use quill_engine::patterns::{score_pattern, select_patterns, PatternSelector, PatternStore, SelectionSource};
use quill_sdk::errors::ErrorKind;
use quill_sdk::types::{PatternRecord, RequestAttributes};
use serde_json::json;
use std::sync::Arc;

fn linkedin_request() -> RequestAttributes {
    RequestAttributes {
        platform: "linkedin".to_string(),
        industry: "saas".to_string(),
        account_type: "brand_static_only".to_string(),
        follower_count: 8000,
        content_type: "static".to_string(),
    }
}

fn record(id: &str, note: Option<&str>) -> PatternRecord {
    let mut value = json!({
        "id": id,
        "name": id,
        "platforms": ["linkedin", "instagram"],
        "industries": ["all"],
        "required_content_types": ["static"],
        "success_rate": {"brand_static_only": 0.5},
        "avg_reach": {"nano": 9000.0},
        "min_followers": 1000,
        "optimal_followers": 5000,
        "difficulty": "easy"
    });
    if let Some(note) = note {
        value["platform_notes"] = json!({ "linkedin": note });
    }
    serde_json::from_value(value).unwrap()
}

fn test_store() -> PatternStore {
    PatternStore::from_patterns(vec![
        record("avoided", Some("Avoid: memes get suppressed here.")),
        record("plain", None),
        record("noted", Some("Keep it short.")),
    ])
    .unwrap()
}

#[test]
fn test_avoid_note_scores_strictly_lower() {
    let attributes = linkedin_request();
    let avoided = score_pattern(&record("a", Some("Avoid: memes.")), &attributes);
    let plain = score_pattern(&record("b", None), &attributes);

    assert!(avoided.total() < plain.total());
    assert_eq!(plain.total() - avoided.total(), 30.0);
}

#[test]
fn test_builtin_catalog_penalizes_meme_on_linkedin() {
    let store = PatternStore::builtin().unwrap();
    let meme = store.get("meme_reaction").unwrap();
    let carousel = store.get("before_after_carousel").unwrap();

    let attributes = linkedin_request();
    let meme_score = score_pattern(meme, &attributes);
    let carousel_score = score_pattern(carousel, &attributes);

    assert_eq!(meme_score.platform_caveat, -30.0);
    assert!(meme_score.total() < carousel_score.total());

    let ranked = select_patterns(&attributes, store.patterns(), store.len());
    let meme_rank = ranked.iter().position(|c| c.pattern.id == "meme_reaction").unwrap();
    let carousel_rank = ranked
        .iter()
        .position(|c| c.pattern.id == "before_after_carousel")
        .unwrap();
    assert!(carousel_rank < meme_rank);
}

#[test]
fn test_builtin_ranking_is_deterministic() {
    let store = PatternStore::builtin().unwrap();
    let attributes = linkedin_request();

    let first: Vec<(String, f64)> = select_patterns(&attributes, store.patterns(), 5)
        .into_iter()
        .map(|c| (c.pattern.id.clone(), c.score))
        .collect();
    let second: Vec<(String, f64)> = select_patterns(&attributes, store.patterns(), 5)
        .into_iter()
        .map(|c| (c.pattern.id.clone(), c.score))
        .collect();

    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
    assert!(first.windows(2).all(|w| w[0].1 >= w[1].1));
}

#[tokio::test]
async fn test_judge_pick_in_candidate_set() {
    let provider = Arc::new(
        ScriptedProvider::new()
            .reply("I'd go with this one: {\"pattern_id\": \"noted\", \"reason\": \"short copy suits the feed\"}"),
    );
    let selector = PatternSelector::with_judge(provider.clone(), 3);

    let selection = selector.choose(&linkedin_request(), &test_store()).await.unwrap();

    assert_eq!(selection.source, SelectionSource::Judge);
    assert_eq!(selection.pattern.id, "noted");
    assert_eq!(selection.rationale, "short copy suits the feed");
    assert_eq!(selection.expected_reach, Some(9000.0));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_judge_out_of_set_falls_back_to_top_score() {
    let provider = Arc::new(
        ScriptedProvider::new().reply("{\"pattern_id\": \"viral_dance\", \"reason\": \"trendy\"}"),
    );
    let selector = PatternSelector::with_judge(provider.clone(), 2);

    let selection = selector.choose(&linkedin_request(), &test_store()).await.unwrap();

    assert_eq!(selection.source, SelectionSource::TopScore);
    // "plain" and "noted" tie; catalog order wins
    assert_eq!(selection.pattern.id, "plain");
    assert_eq!(selection.candidates.len(), 2);
    assert!(selection.candidates.iter().all(|(id, _)| id != "avoided"));
}

#[tokio::test]
async fn test_judge_transport_failure_falls_back() {
    let provider = Arc::new(ScriptedProvider::new().fail(LLMError::Timeout));
    let selector = PatternSelector::with_judge(provider, 3);

    let selection = selector.choose(&linkedin_request(), &test_store()).await.unwrap();
    assert_eq!(selection.source, SelectionSource::TopScore);
    assert_eq!(selection.pattern.id, "plain");
}

#[tokio::test]
async fn test_judge_garbage_reply_falls_back() {
    let provider = Arc::new(ScriptedProvider::new().reply("They are all great!"));
    let selector = PatternSelector::with_judge(provider, 3);

    let selection = selector.choose(&linkedin_request(), &test_store()).await.unwrap();
    assert_eq!(selection.source, SelectionSource::TopScore);
}

#[tokio::test]
async fn test_single_candidate_skips_judge() {
    let provider = Arc::new(ScriptedProvider::new());
    let selector = PatternSelector::with_judge(provider.clone(), 1);

    let selection = selector.choose(&linkedin_request(), &test_store()).await.unwrap();
    assert_eq!(selection.source, SelectionSource::TopScore);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_empty_store_is_precondition_failure() {
    let store = PatternStore::from_patterns(vec![]).unwrap();
    let err = PatternSelector::new(3)
        .choose(&linkedin_request(), &store)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

#[test]
fn test_catalog_file_with_duplicate_ids_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patterns.json");
    std::fs::write(
        &path,
        json!([
            {"id": "listicle", "name": "Listicle"},
            {"id": "Listicle", "name": "Listicle again"}
        ])
        .to_string(),
    )
    .unwrap();

    let err = PatternStore::load(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_catalog_file_loads_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patterns.json");
    std::fs::write(
        &path,
        json!([
            {"id": "b", "name": "B"},
            {"id": "a", "name": "A"}
        ])
        .to_string(),
    )
    .unwrap();

    let store = PatternStore::load(&path).unwrap();
    let ids: Vec<&str> = store.patterns().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert!(store.get("A").is_some());
}
