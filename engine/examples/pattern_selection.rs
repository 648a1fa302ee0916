//! Example: rank the builtin pattern catalog for one request
//!
//! Runs offline; the selector takes the top-scored candidate.

use quill_engine::patterns::{PatternSelector, PatternStore};
use quill_sdk::types::RequestAttributes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let store = PatternStore::builtin()?;
    let attributes = RequestAttributes {
        platform: "linkedin".to_string(),
        industry: "saas".to_string(),
        account_type: "brand_static_only".to_string(),
        follower_count: 8000,
        content_type: "static".to_string(),
    };

    let selection = PatternSelector::new(3).choose(&attributes, &store).await?;

    println!("Candidates:");
    for (id, score) in &selection.candidates {
        println!("  {:<24} {:>6.1}", id, score);
    }

    println!("\nSelected: {} ({:.1})", selection.pattern.name, selection.score);
    for (criterion, points) in selection.breakdown.contributions() {
        println!("  {:<16} {:+.1}", criterion, points);
    }
    if let Some(reach) = selection.expected_reach {
        println!("Expected reach: {:.0}", reach);
    }

    Ok(())
}
