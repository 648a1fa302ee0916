// Quill marketing content engine
// Main entry point for the quill binary

use clap::Parser;
use quill_engine::cli::{Cli, Command, ConfigAction, PatternAction};
use quill_engine::config::Config;
use quill_engine::handlers::{
    handle_config_init, handle_config_show, handle_evaluate, handle_generate, handle_metrics,
    handle_patterns_list, handle_patterns_select, handle_refine, handle_run, handle_templates,
    OutputFormat,
};
use quill_engine::telemetry::init_telemetry_with_level;
use quill_sdk::errors::{QuillError, QuillErrorExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // `config init` must work without a readable config file
    if let Command::Config {
        action: ConfigAction::Init { force },
    } = &cli.command
    {
        init_telemetry_with_level(cli.log.as_deref().unwrap_or("info"));
        return handle_config_init(cli.config.clone(), *force, format);
    }

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // Priority: RUST_LOG > --log > config
    init_telemetry_with_level(cli.log.as_deref().unwrap_or(&config.core.log_level));

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");
    tracing::info!("Quill v{} ({} - {})", version, commit, timestamp);

    let result = match cli.command {
        Command::Generate { args, out } => {
            tracing::info!("Generating content with template {}", args.template);
            handle_generate(args, out, &config, format).await
        }

        Command::Refine {
            state,
            languages,
            out,
        } => handle_refine(state, languages, out, &config, format).await,

        Command::Evaluate {
            state,
            metrics,
            out,
        } => handle_evaluate(state, metrics, out, &config, format).await,

        Command::Run {
            args,
            languages,
            evaluate,
            metrics,
            out,
        } => handle_run(args, languages, evaluate, metrics, out, &config, format).await,

        Command::Patterns { action } => match action {
            PatternAction::List => handle_patterns_list(&config, format).await,
            PatternAction::Select {
                attributes,
                top,
                no_judge,
            } => handle_patterns_select(attributes, top, no_judge, &config, format).await,
        },

        Command::Metrics => handle_metrics(format),

        Command::Templates => handle_templates(format),

        Command::Config { action } => match action {
            ConfigAction::Show { check } => handle_config_show(&config, check, format).await,
            ConfigAction::Init { force } => handle_config_init(cli.config, force, format),
        },
    };

    if let Err(e) = &result {
        if let Some(quill_error) = e.downcast_ref::<QuillError>() {
            tracing::error!("{} failed: {}", quill_error.kind(), quill_error);
            if let Some(excerpt) = quill_error.excerpt() {
                eprintln!("Model output: {}", excerpt);
            }
            eprintln!("Hint: {}", quill_error.user_hint());
        }
    }

    result
}
