//! Pattern Scorer
//!
//! Weighted fitness of a pattern for a request. Pure and deterministic:
//! identical inputs always give identical scores. Scores are not clamped and
//! may be negative.
//!
//! | Criterion          | Contribution                                        |
//! |--------------------|-----------------------------------------------------|
//! | Platform fit       | +40 when the platform is listed                     |
//! | Platform caveat    | -30 when the platform note says "avoid"             |
//! | Industry fit       | +20 when the industry is listed, or "all" is        |
//! | Content type       | +20 on match, -15 on mismatch if types are declared |
//! | Historical success | success rate for the account type × 10              |
//! | Followers          | +5 at `min_followers`, +5 more at `optimal_followers` |
//! | Difficulty         | easy +5, medium 0, hard -2                          |

use quill_sdk::types::{Difficulty, PatternRecord, RequestAttributes};
use serde::Serialize;

pub const PLATFORM_FIT: f64 = 40.0;
pub const PLATFORM_CAVEAT_PENALTY: f64 = -30.0;
pub const INDUSTRY_FIT: f64 = 20.0;
pub const CONTENT_TYPE_MATCH: f64 = 20.0;
pub const CONTENT_TYPE_MISMATCH: f64 = -15.0;
pub const SUCCESS_RATE_WEIGHT: f64 = 10.0;
pub const MIN_FOLLOWERS_BONUS: f64 = 5.0;
pub const OPTIMAL_FOLLOWERS_BONUS: f64 = 5.0;
pub const EASY_BONUS: f64 = 5.0;
pub const HARD_PENALTY: f64 = -2.0;

/// Industry value that matches every request
const ANY_INDUSTRY: &str = "all";

/// Per-criterion contributions to a pattern's score
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct ScoreBreakdown {
    pub platform_fit: f64,
    pub platform_caveat: f64,
    pub industry_fit: f64,
    pub content_type: f64,
    pub success_rate: f64,
    pub followers: f64,
    pub difficulty: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.platform_fit
            + self.platform_caveat
            + self.industry_fit
            + self.content_type
            + self.success_rate
            + self.followers
            + self.difficulty
    }

    /// Non-zero criteria as `(name, contribution)` pairs
    pub fn contributions(&self) -> Vec<(&'static str, f64)> {
        [
            ("platform_fit", self.platform_fit),
            ("platform_caveat", self.platform_caveat),
            ("industry_fit", self.industry_fit),
            ("content_type", self.content_type),
            ("success_rate", self.success_rate),
            ("followers", self.followers),
            ("difficulty", self.difficulty),
        ]
        .into_iter()
        .filter(|(_, value)| *value != 0.0)
        .collect()
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn contains(list: &[String], value: &str) -> bool {
    list.iter().any(|item| normalize(item) == value)
}

/// Score one pattern against the request attributes
pub fn score_pattern(pattern: &PatternRecord, attributes: &RequestAttributes) -> ScoreBreakdown {
    let platform = normalize(&attributes.platform);
    let industry = normalize(&attributes.industry);
    let account_type = normalize(&attributes.account_type);
    let content_type = normalize(&attributes.content_type);

    let mut breakdown = ScoreBreakdown::default();

    if contains(&pattern.platforms, &platform) {
        breakdown.platform_fit = PLATFORM_FIT;
    }

    if pattern.is_avoided_on(&platform) {
        breakdown.platform_caveat = PLATFORM_CAVEAT_PENALTY;
    }

    if contains(&pattern.industries, &industry) || contains(&pattern.industries, ANY_INDUSTRY) {
        breakdown.industry_fit = INDUSTRY_FIT;
    }

    // An empty list means the pattern is not type-constrained
    if !pattern.required_content_types.is_empty() {
        breakdown.content_type = if contains(&pattern.required_content_types, &content_type) {
            CONTENT_TYPE_MATCH
        } else {
            CONTENT_TYPE_MISMATCH
        };
    }

    breakdown.success_rate = pattern
        .success_rate
        .iter()
        .find(|(k, _)| normalize(k) == account_type)
        .map(|(_, rate)| rate * SUCCESS_RATE_WEIGHT)
        .unwrap_or(0.0);

    if attributes.follower_count >= pattern.min_followers {
        breakdown.followers += MIN_FOLLOWERS_BONUS;
        if attributes.follower_count >= pattern.optimal_followers {
            breakdown.followers += OPTIMAL_FOLLOWERS_BONUS;
        }
    }

    breakdown.difficulty = match pattern.difficulty {
        Difficulty::Easy => EASY_BONUS,
        Difficulty::Medium => 0.0,
        Difficulty::Hard => HARD_PENALTY,
    };

    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn attributes() -> RequestAttributes {
        RequestAttributes {
            platform: "linkedin".to_string(),
            industry: "saas".to_string(),
            account_type: "brand_static_only".to_string(),
            follower_count: 8000,
            content_type: "static".to_string(),
        }
    }

    fn pattern() -> PatternRecord {
        PatternRecord {
            id: "p".to_string(),
            name: "Pattern".to_string(),
            description: String::new(),
            platforms: vec!["LinkedIn".to_string()],
            platform_notes: BTreeMap::new(),
            industries: vec!["saas".to_string()],
            required_content_types: vec!["static".to_string()],
            success_rate: BTreeMap::from([("brand_static_only".to_string(), 0.5)]),
            avg_reach: BTreeMap::new(),
            min_followers: 1000,
            optimal_followers: 10000,
            difficulty: Difficulty::Easy,
            hook_template: String::new(),
            body_template: String::new(),
            cta_template: String::new(),
        }
    }

    #[test]
    fn test_full_breakdown() {
        let breakdown = score_pattern(&pattern(), &attributes());
        assert_eq!(breakdown.platform_fit, 40.0);
        assert_eq!(breakdown.platform_caveat, 0.0);
        assert_eq!(breakdown.industry_fit, 20.0);
        assert_eq!(breakdown.content_type, 20.0);
        assert_eq!(breakdown.success_rate, 5.0);
        assert_eq!(breakdown.followers, 5.0);
        assert_eq!(breakdown.difficulty, 5.0);
        assert_eq!(breakdown.total(), 95.0);
    }

    #[test]
    fn test_avoid_caveat_penalty() {
        let mut avoided = pattern();
        avoided
            .platform_notes
            .insert("linkedin".to_string(), "Avoid on LinkedIn".to_string());

        let base = score_pattern(&pattern(), &attributes()).total();
        let penalized = score_pattern(&avoided, &attributes()).total();
        assert_eq!(base - penalized, 30.0);
    }

    #[test]
    fn test_non_avoid_note_is_neutral() {
        let mut noted = pattern();
        noted
            .platform_notes
            .insert("linkedin".to_string(), "Keep it short".to_string());
        assert_eq!(score_pattern(&noted, &attributes()).platform_caveat, 0.0);
    }

    #[test]
    fn test_industry_all() {
        let mut any = pattern();
        any.industries = vec!["All".to_string()];
        let mut attrs = attributes();
        attrs.industry = "healthcare".to_string();
        assert_eq!(score_pattern(&any, &attrs).industry_fit, 20.0);
    }

    #[test]
    fn test_content_type_mismatch_only_when_declared() {
        let mut attrs = attributes();
        attrs.content_type = "video".to_string();
        assert_eq!(score_pattern(&pattern(), &attrs).content_type, -15.0);

        let mut unconstrained = pattern();
        unconstrained.required_content_types.clear();
        assert_eq!(score_pattern(&unconstrained, &attrs).content_type, 0.0);
    }

    #[test]
    fn test_unseen_account_type() {
        let mut attrs = attributes();
        attrs.account_type = "creator".to_string();
        assert_eq!(score_pattern(&pattern(), &attrs).success_rate, 0.0);
    }

    #[test]
    fn test_follower_thresholds() {
        let mut attrs = attributes();
        attrs.follower_count = 500;
        assert_eq!(score_pattern(&pattern(), &attrs).followers, 0.0);
        attrs.follower_count = 10000;
        assert_eq!(score_pattern(&pattern(), &attrs).followers, 10.0);
    }

    #[test]
    fn test_scores_can_be_negative() {
        let mut poor = pattern();
        poor.platforms.clear();
        poor.industries.clear();
        poor.success_rate.clear();
        poor.min_followers = 1_000_000;
        poor.optimal_followers = 1_000_000;
        poor.difficulty = Difficulty::Hard;
        poor.platform_notes
            .insert("linkedin".to_string(), "avoid".to_string());

        let mut attrs = attributes();
        attrs.content_type = "video".to_string();
        assert_eq!(score_pattern(&poor, &attrs).total(), -47.0);
    }

    #[test]
    fn test_contributions_skip_zero() {
        let mut p = pattern();
        p.difficulty = Difficulty::Medium;
        let names: Vec<_> = score_pattern(&p, &attributes())
            .contributions()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert!(!names.contains(&"difficulty"));
        assert!(names.contains(&"platform_fit"));
    }
}
