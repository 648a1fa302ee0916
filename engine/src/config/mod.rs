//! Configuration management
//!
//! This module handles loading, validation, and management of the Quill configuration.
//! Configuration is stored in TOML format at ~/.quill/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: log level
//! - **llm**: provider selection and per-provider settings
//! - **pipeline**: refinement and evaluation defaults
//! - **patterns**: pattern catalog location and selection settings
//!
//! # Examples
//!
//! ```no_run
//! use quill_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Provider: {}", config.llm.provider);
//! println!("Languages: {:?}", config.pipeline.default_languages);
//! # Ok(())
//! # }
//! ```

use quill_sdk::errors::QuillError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::pipeline::evaluator::EvaluationPolicy;
use crate::pipeline::metrics::Metric;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Refinement pipeline defaults
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Pattern selection settings
    #[serde(default)]
    pub patterns: PatternsConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Provider used for every model call (ollama, openai)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Per-request timeout enforced by the provider's HTTP client
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// OpenAI-compatible provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for an OpenAI-compatible API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,
}

/// Refinement and evaluation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Languages used when a refine request names none
    #[serde(default = "default_languages")]
    pub default_languages: Vec<String>,

    /// Inject similar-content snippets into the generation prompt
    #[serde(default = "default_true")]
    pub use_context: bool,

    /// Upper bound on injected similar-content snippets
    #[serde(default = "default_max_context_snippets")]
    pub max_context_snippets: usize,

    /// What to do when a single metric judgement fails
    #[serde(default)]
    pub evaluation_policy: EvaluationPolicy,

    /// Metrics used when an evaluate request names none
    #[serde(default = "default_metrics")]
    pub default_metrics: Vec<String>,

    /// Token budget applied when the conversation log is truncated
    #[serde(default = "default_conversation_token_limit")]
    pub conversation_token_limit: usize,
}

/// Pattern selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternsConfig {
    /// Catalog file (JSON). The builtin catalog is used when unset.
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    /// Number of top-scored candidates kept for the final pick
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Ask the model to pick among the top candidates
    #[serde(default = "default_true")]
    pub use_judge: bool,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_request_timeout() -> u64 {
    300
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["es-ES".to_string()]
}

fn default_max_context_snippets() -> usize {
    5
}

fn default_metrics() -> Vec<String> {
    vec![
        "accuracy".to_string(),
        "fluency".to_string(),
        "cultural_appropriateness".to_string(),
    ]
}

fn default_conversation_token_limit() -> usize {
    8192
}

fn default_top_n() -> usize {
    3
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            request_timeout_secs: default_request_timeout(),
            ollama: OllamaConfig::default(),
            openai: OpenAIConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            api_key_env: default_openai_key_env(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_languages: default_languages(),
            use_context: true,
            max_context_snippets: default_max_context_snippets(),
            evaluation_policy: EvaluationPolicy::default(),
            default_metrics: default_metrics(),
            conversation_token_limit: default_conversation_token_limit(),
        }
    }
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            top_n: default_top_n(),
            use_judge: true,
        }
    }
}

impl PipelineConfig {
    /// Resolve `default_metrics` against the metric catalog
    pub fn metrics(&self) -> Result<Vec<Metric>, QuillError> {
        self.default_metrics.iter().map(|m| m.parse()).collect()
    }
}

impl Config {
    /// Load configuration from the default location (~/.quill/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, QuillError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, QuillError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| QuillError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, QuillError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| QuillError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    pub fn create_default(path: &Path) -> Result<Self, QuillError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                QuillError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default();
        config.validate_and_process()?;

        let toml_string = config.to_toml()?;

        fs::write(path, toml_string)
            .map_err(|e| QuillError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Wrote default configuration to {}", path.display());

        Ok(config)
    }

    /// Serialize the configuration as pretty TOML
    pub fn to_toml(&self) -> Result<String, QuillError> {
        toml::to_string_pretty(self)
            .map_err(|e| QuillError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Get the default configuration file path (~/.quill/config.toml)
    pub fn default_config_path() -> Result<PathBuf, QuillError> {
        let home = dirs::home_dir()
            .ok_or_else(|| QuillError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".quill").join("config.toml"))
    }

    /// Validate and process configuration
    fn validate_and_process(&mut self) -> Result<(), QuillError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(QuillError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_providers = ["ollama", "openai"];
        if !valid_providers.contains(&self.llm.provider.as_str()) {
            return Err(QuillError::Config(format!(
                "Invalid provider '{}'. Must be one of: {}",
                self.llm.provider,
                valid_providers.join(", ")
            )));
        }

        if self.llm.request_timeout_secs == 0 {
            return Err(QuillError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.patterns.top_n == 0 {
            return Err(QuillError::Config("top_n must be at least 1".to_string()));
        }

        if self
            .pipeline
            .default_languages
            .iter()
            .any(|l| l.trim().is_empty())
        {
            return Err(QuillError::Config(
                "default_languages must not contain empty codes".to_string(),
            ));
        }

        // Every metric name must resolve against the catalog
        self.pipeline
            .metrics()
            .map_err(|e| QuillError::Config(e.to_string()))?;

        if let Some(catalog) = &self.patterns.catalog {
            self.patterns.catalog = Some(expand_path(catalog)?);
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, QuillError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| QuillError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| QuillError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| QuillError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
