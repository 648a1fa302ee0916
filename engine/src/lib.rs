//! Quill Engine Library
//!
//! This library provides the core functionality of the Quill engine.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// LLM provider abstraction layer
pub mod llm;

/// Structured data recovery from model output
pub mod extract;

/// Content refinement pipeline
pub mod pipeline;

/// Pattern scoring and selection
pub mod patterns;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
