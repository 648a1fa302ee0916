//! Error types and handling
//!
//! This module provides the error taxonomy used throughout Quill.
//! All errors implement the `QuillErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! Stage errors (`GenerationFailed`, `TranslationFailed`, ...) wrap the root
//! cause. Use [`QuillError::kind`] to get the root classification and
//! [`QuillError::excerpt`] to get the raw model text that caused it.
//!
//! # Examples
//!
//! ```
//! use quill_sdk::errors::{ErrorKind, QuillError, QuillErrorExt};
//!
//! let root = QuillError::MalformedStructure {
//!     reason: "expected value at line 1".to_string(),
//!     excerpt: "{\"es-ES\": ".to_string(),
//! };
//! let error = QuillError::TranslationFailed(Box::new(root));
//!
//! assert_eq!(error.kind(), ErrorKind::MalformedStructure);
//! assert_eq!(error.excerpt(), Some("{\"es-ES\": "));
//! assert!(error.is_recoverable());
//! ```

use std::fmt;
use thiserror::Error;

/// Trait for Quill error extensions
///
/// Provides additional context for errors: a user-friendly hint and
/// recoverability information.
pub trait QuillErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around by the caller.
    /// Non-recoverable errors need a configuration or input change.
    fn is_recoverable(&self) -> bool;
}

/// Root classification of a [`QuillError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    TransportFailure,
    NoStructureFound,
    MalformedStructure,
    PreconditionFailed,
    PatternNotFound,
    UnknownMetric,
    UnknownTemplate,
    Io,
    Serialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Config => "config",
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::NoStructureFound => "no_structure_found",
            ErrorKind::MalformedStructure => "malformed_structure",
            ErrorKind::PreconditionFailed => "precondition_failed",
            ErrorKind::PatternNotFound => "pattern_not_found",
            ErrorKind::UnknownMetric => "unknown_metric",
            ErrorKind::UnknownTemplate => "unknown_template",
            ErrorKind::Io => "io",
            ErrorKind::Serialization => "serialization",
        };
        f.write_str(name)
    }
}

/// Main Quill error type
///
/// # Error Categories
///
/// - **Configuration**: invalid or missing configuration
/// - **Transport**: the text-generation service is unreachable or refused the call
/// - **Extraction**: model output did not contain usable structured data
/// - **Stage**: a pipeline stage failed; wraps one of the above
/// - **Lookup**: unknown metric, template or pattern
#[derive(Debug, Error)]
pub enum QuillError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Upstream call errors
    #[error("Transport failure: {0}")]
    Transport(String),

    // Extraction errors
    #[error("No structured data found in model output")]
    NoStructureFound { excerpt: String },

    #[error("Malformed structure: {reason}")]
    MalformedStructure { reason: String, excerpt: String },

    #[error(
        "Incomplete language set: missing [{}], unexpected [{}]",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    IncompleteLanguageSet {
        missing: Vec<String>,
        unexpected: Vec<String>,
        excerpt: String,
    },

    // Pipeline contract errors
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    // Stage errors
    #[error("Generation failed: {0}")]
    GenerationFailed(#[source] Box<QuillError>),

    #[error("Translation failed: {0}")]
    TranslationFailed(#[source] Box<QuillError>),

    #[error("Critique failed: {0}")]
    CritiqueFailed(#[source] Box<QuillError>),

    #[error("Reflection failed: {0}")]
    ReflectionFailed(#[source] Box<QuillError>),

    #[error("Evaluation of {metric} for {language} failed: {source}")]
    EvaluationFailed {
        language: String,
        metric: String,
        #[source]
        source: Box<QuillError>,
    },

    // Lookup errors
    #[error("Pattern not found among candidates: {0}")]
    PatternNotFound(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QuillError {
    /// Root classification, looking through stage wrappers.
    ///
    /// `IncompleteLanguageSet` is reported as `MalformedStructure`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Transport(_) => ErrorKind::TransportFailure,
            Self::NoStructureFound { .. } => ErrorKind::NoStructureFound,
            Self::MalformedStructure { .. } | Self::IncompleteLanguageSet { .. } => {
                ErrorKind::MalformedStructure
            }
            Self::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            Self::GenerationFailed(inner)
            | Self::TranslationFailed(inner)
            | Self::CritiqueFailed(inner)
            | Self::ReflectionFailed(inner) => inner.kind(),
            Self::EvaluationFailed { source, .. } => source.kind(),
            Self::PatternNotFound(_) => ErrorKind::PatternNotFound,
            Self::UnknownMetric(_) => ErrorKind::UnknownMetric,
            Self::UnknownTemplate(_) => ErrorKind::UnknownTemplate,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Raw model text attached to an extraction failure, if any.
    pub fn excerpt(&self) -> Option<&str> {
        match self {
            Self::NoStructureFound { excerpt }
            | Self::MalformedStructure { excerpt, .. }
            | Self::IncompleteLanguageSet { excerpt, .. } => Some(excerpt),
            Self::GenerationFailed(inner)
            | Self::TranslationFailed(inner)
            | Self::CritiqueFailed(inner)
            | Self::ReflectionFailed(inner) => inner.excerpt(),
            Self::EvaluationFailed { source, .. } => source.excerpt(),
            _ => None,
        }
    }
}

impl QuillErrorExt for QuillError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Transport(_) => "Model provider unavailable. Check the endpoint, API key and quota",
            Self::NoStructureFound { .. } => "The model answered without JSON. Try again",
            Self::MalformedStructure { .. } => "The model returned broken JSON. Try again",
            Self::IncompleteLanguageSet { .. } => {
                "The model skipped some languages. Try again or request fewer languages"
            }
            Self::PreconditionFailed(_) => "Run the earlier pipeline steps first",
            Self::GenerationFailed(inner)
            | Self::TranslationFailed(inner)
            | Self::CritiqueFailed(inner)
            | Self::ReflectionFailed(inner) => inner.user_hint(),
            Self::EvaluationFailed { source, .. } => source.user_hint(),
            Self::PatternNotFound(_) => "The requested pattern is not in the candidate list",
            Self::UnknownMetric(_) => "Run 'quill metrics' to list available metrics",
            Self::UnknownTemplate(_) => "Run 'quill templates' to list available templates",
            Self::Io(_) => "File system operation failed",
            Self::Serialization(_) => "State file is not valid JSON",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable errors
            Self::Config(_)
            | Self::UnknownMetric(_)
            | Self::UnknownTemplate(_)
            | Self::PreconditionFailed(_) => false,

            Self::GenerationFailed(inner)
            | Self::TranslationFailed(inner)
            | Self::CritiqueFailed(inner)
            | Self::ReflectionFailed(inner) => inner.is_recoverable(),
            Self::EvaluationFailed { source, .. } => source.is_recoverable(),

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}
