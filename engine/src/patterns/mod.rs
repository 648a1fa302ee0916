//! Pattern engine
//!
//! Scores catalog patterns against request attributes and picks the best fit.

pub mod scorer;
pub mod selector;
pub mod store;

pub use scorer::{score_pattern, ScoreBreakdown};
pub use selector::{select_patterns, PatternSelector, ScoredPattern, Selection, SelectionSource};
pub use store::PatternStore;
