//! CLI interface for Quill
//!
//! This module provides the command-line interface using clap's derive API.
//! Pipeline commands persist the `PipelineState` as a JSON file so the
//! stages can be run one at a time.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Quill marketing content engine
///
/// Generates marketing content with a language model, refines it through a
/// translate → critique → reflect loop and scores the result.
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Generation inputs shared by `generate` and `run`
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// What the content should be about
    #[arg(long)]
    pub prompt: String,

    /// Builtin template name or path to a JSON template file
    #[arg(long, default_value = "social_post")]
    pub template: String,

    /// Audience targeting hint
    #[arg(long)]
    pub audience: Option<String>,

    /// File with a similar-content snippet (repeatable)
    #[arg(long = "context-file", value_name = "PATH")]
    pub context_files: Vec<PathBuf>,

    /// Do not inject similar-content snippets
    #[arg(long)]
    pub no_context: bool,

    /// Catalog pattern id to structure the content with
    #[arg(long, value_name = "ID")]
    pub pattern: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a first draft and save the pipeline state
    Generate {
        #[command(flatten)]
        args: GenerateArgs,

        /// Where to write the pipeline state
        #[arg(long, default_value = "quill-state.json")]
        out: PathBuf,
    },

    /// Translate, critique and reflect a generated draft
    Refine {
        /// Pipeline state file
        #[arg(long)]
        state: PathBuf,

        /// Target language code (repeatable); defaults from config
        #[arg(long = "lang", value_name = "CODE")]
        languages: Vec<String>,

        /// Where to write the updated state (defaults to --state)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Score the translations of a refined state
    Evaluate {
        /// Pipeline state file
        #[arg(long)]
        state: PathBuf,

        /// Metric name (repeatable); defaults from config
        #[arg(long = "metric", value_name = "NAME")]
        metrics: Vec<String>,

        /// Where to write the updated state (defaults to --state)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Generate, refine and optionally evaluate in one go
    Run {
        #[command(flatten)]
        args: GenerateArgs,

        /// Target language code (repeatable); defaults from config
        #[arg(long = "lang", value_name = "CODE")]
        languages: Vec<String>,

        /// Also evaluate the refined translations
        #[arg(long)]
        evaluate: bool,

        /// Metric name (repeatable); implies --evaluate
        #[arg(long = "metric", value_name = "NAME")]
        metrics: Vec<String>,

        /// Where to write the final state
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Browse and select content patterns
    Patterns {
        #[command(subcommand)]
        action: PatternAction,
    },

    /// List the evaluation metrics
    Metrics,

    /// List the builtin content templates
    Templates,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Request attributes a pattern is scored against
#[derive(Args, Debug, Clone)]
pub struct AttributeArgs {
    /// Target platform (e.g. linkedin, instagram)
    #[arg(long)]
    pub platform: String,

    /// Industry of the account (e.g. saas)
    #[arg(long)]
    pub industry: String,

    /// Account type (e.g. brand_static_only, creator)
    #[arg(long)]
    pub account_type: String,

    /// Follower count of the account
    #[arg(long)]
    pub followers: u64,

    /// Content type to publish (e.g. static, video, carousel)
    #[arg(long)]
    pub content_type: String,
}

/// Pattern actions
#[derive(Subcommand, Debug)]
pub enum PatternAction {
    /// List every pattern in the catalog
    List,

    /// Score the catalog for a request and pick a pattern
    Select {
        #[command(flatten)]
        attributes: AttributeArgs,

        /// Number of top candidates to consider
        #[arg(long)]
        top: Option<usize>,

        /// Take the top-scored candidate without asking the model
        #[arg(long)]
        no_judge: bool,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Also check that the configured model provider is reachable
        #[arg(long)]
        check: bool,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_refine_with_languages() {
        let cli = Cli::parse_from([
            "quill", "refine", "--state", "s.json", "--lang", "es-ES", "--lang", "fr-FR",
        ]);
        match cli.command {
            Command::Refine { languages, out, .. } => {
                assert_eq!(languages, vec!["es-ES", "fr-FR"]);
                assert!(out.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_pattern_select() {
        let cli = Cli::parse_from([
            "quill",
            "--json",
            "patterns",
            "select",
            "--platform",
            "linkedin",
            "--industry",
            "saas",
            "--account-type",
            "brand_static_only",
            "--followers",
            "8000",
            "--content-type",
            "static",
            "--no-judge",
        ]);
        assert!(cli.json);
        match cli.command {
            Command::Patterns {
                action: PatternAction::Select {
                    attributes,
                    no_judge,
                    top,
                },
            } => {
                assert_eq!(attributes.followers, 8000);
                assert!(no_judge);
                assert!(top.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::parse_from(["quill", "generate", "--prompt", "Launch"]);
        match cli.command {
            Command::Generate { args, out } => {
                assert_eq!(args.template, "social_post");
                assert!(!args.no_context);
                assert_eq!(out, PathBuf::from("quill-state.json"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_show_check() {
        let cli = Cli::parse_from(["quill", "config", "show", "--check"]);
        match cli.command {
            Command::Config {
                action: ConfigAction::Show { check },
            } => assert!(check),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
