//! Quill SDK
//!
//! Shared data contracts and error types for Quill components.
//! This crate is used by the engine and by anything embedding it.

/// Error types and handling
pub mod errors;

/// Template and pattern catalog types
pub mod types;

// Re-export commonly used types
pub use errors::{ErrorKind, QuillError, QuillErrorExt};
pub use types::{
    Difficulty, FieldSpec, FieldType, FollowerTier, PatternRecord, RequestAttributes, TemplateSpec,
};
