//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - generate / refine / evaluate / run: drive the content pipeline
//! - patterns list / select: browse and score the pattern catalog
//! - metrics / templates: list the catalogs
//! - config show / init: inspect or create the configuration file

use anyhow::{bail, Context, Result};
use quill_sdk::types::{RequestAttributes, TemplateSpec};
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::cli::{AttributeArgs, GenerateArgs};
use crate::config::Config;
use crate::llm::build_provider;
use crate::patterns::{PatternSelector, PatternStore};
use crate::pipeline::templates::{builtin_templates, resolve_template};
use crate::pipeline::{
    EvaluationReport, GenerationRequest, Metric, Pipeline, PipelineSettings, PipelineState,
    RefineReport,
};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let llm = build_provider(&config.llm).context("Failed to create LLM provider")?;
    let settings =
        PipelineSettings::from_config(&config.pipeline).context("Invalid pipeline settings")?;
    Ok(Pipeline::new(llm, settings))
}

fn parse_metrics(names: &[String]) -> Result<Vec<Metric>> {
    names
        .iter()
        .map(|name| name.parse::<Metric>().map_err(anyhow::Error::from))
        .collect()
}

/// Resolve the template, read context files and look up pattern guidance
fn build_request(args: &GenerateArgs, config: &Config) -> Result<(GenerationRequest, TemplateSpec)> {
    let template = resolve_template(&args.template)
        .with_context(|| format!("Failed to load template '{}'", args.template))?;

    let mut snippets = Vec::with_capacity(args.context_files.len());
    for path in &args.context_files {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read context file {}", path.display()))?;
        snippets.push(text);
    }

    let mut request = GenerationRequest::new(args.prompt.clone()).with_context(snippets);
    request.use_context = !args.no_context;
    if let Some(audience) = &args.audience {
        request = request.with_audience(audience.clone());
    }

    if let Some(id) = &args.pattern {
        let store = PatternStore::from_config(&config.patterns)
            .context("Failed to load pattern catalog")?;
        let Some(pattern) = store.get(id) else {
            bail!("Unknown pattern '{}'. Run 'quill patterns list'", id);
        };
        request = request.with_pattern(pattern);
    }

    Ok((request, template))
}

fn load_state(path: &Path) -> Result<PipelineState> {
    PipelineState::load(path)
        .with_context(|| format!("Failed to load pipeline state from {}", path.display()))
}

fn save_state(state: &PipelineState, path: &Path) -> Result<()> {
    state
        .save(path)
        .with_context(|| format!("Failed to save pipeline state to {}", path.display()))
}

fn print_translations(state: &PipelineState) {
    for language in state.translations.keys() {
        if let Some(rendered) = state.render_translation(language) {
            println!("── {} ──", language);
            println!("{}", rendered);
            println!();
        }
    }
}

fn print_refine_report(report: &RefineReport) {
    if report.reflected {
        println!("✓ Refined {} language(s)", report.languages.len());
    } else {
        println!(
            "⚠ Reflection discarded, kept first translations: {}",
            report.discarded_reason.as_deref().unwrap_or("unknown reason")
        );
    }
}

fn print_evaluation(state: &PipelineState, report: &EvaluationReport) {
    for (language, evaluation) in &state.evaluation {
        println!("{}:", language);
        for result in &evaluation.results {
            match (result.score, &result.error) {
                (Some(score), _) => println!(
                    "  {:<28} {:.2}  {}",
                    result.metric.display_name(),
                    score,
                    result.reason
                ),
                (None, Some(error)) => {
                    println!("  {:<28} --    {}", result.metric.display_name(), error)
                }
                (None, None) => println!("  {:<28} --", result.metric.display_name()),
            }
        }
        match evaluation.aggregate {
            Some(aggregate) => println!("  {:<28} {:.2}", "Aggregate", aggregate),
            None => println!("  {:<28} --", "Aggregate"),
        }
        println!();
    }

    if let Some(overall) = report.overall {
        println!("Overall: {:.2}", overall);
    }
    if report.failures > 0 {
        println!("⚠ {} judgement(s) failed", report.failures);
    }
}

/// Generate a first draft and save the state
pub async fn handle_generate(
    args: GenerateArgs,
    out: PathBuf,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let (request, template) = build_request(&args, config)?;
    let pipeline = build_pipeline(config)?;

    let state = pipeline.generate(request, template).await?;
    save_state(&state, &out)?;

    match format {
        OutputFormat::Text => {
            println!("{}", state.render_draft()?);
            println!();
            println!("✓ Draft saved to {}", out.display());
        }
        OutputFormat::Json => {
            let output = json!({
                "run_id": state.run_id,
                "state_file": out,
                "draft": state.draft_value()?,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Refine a saved draft
pub async fn handle_refine(
    state_path: PathBuf,
    languages: Vec<String>,
    out: Option<PathBuf>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let mut state = load_state(&state_path)?;
    let out = out.unwrap_or(state_path);
    let pipeline = build_pipeline(config)?;

    let version = state.version;
    let report = match pipeline.refine(&mut state, &languages).await {
        Ok(report) => report,
        Err(e) => {
            // Keep whatever the earlier stages committed
            if state.version != version {
                save_state(&state, &out)?;
                tracing::warn!("Saved partially refined state to {}", out.display());
            }
            return Err(e.into());
        }
    };
    save_state(&state, &out)?;

    match format {
        OutputFormat::Text => {
            print_translations(&state);
            print_refine_report(&report);
            println!("  State: {}", out.display());
        }
        OutputFormat::Json => {
            let output = json!({
                "run_id": state.run_id,
                "state_file": out,
                "report": report,
                "translations": state.translations,
                "criticism": state.criticism,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Evaluate a refined state
pub async fn handle_evaluate(
    state_path: PathBuf,
    metrics: Vec<String>,
    out: Option<PathBuf>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let metrics = parse_metrics(&metrics)?;
    let mut state = load_state(&state_path)?;
    let out = out.unwrap_or(state_path);
    let pipeline = build_pipeline(config)?;

    let report = pipeline.evaluate(&mut state, &metrics).await?;
    save_state(&state, &out)?;

    match format {
        OutputFormat::Text => print_evaluation(&state, &report),
        OutputFormat::Json => {
            let output = json!({
                "run_id": state.run_id,
                "state_file": out,
                "report": report,
                "evaluation": state.evaluation,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Run the whole pipeline
pub async fn handle_run(
    args: GenerateArgs,
    languages: Vec<String>,
    evaluate: bool,
    metrics: Vec<String>,
    out: Option<PathBuf>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let metrics = parse_metrics(&metrics)?;
    let (request, template) = build_request(&args, config)?;
    let pipeline = build_pipeline(config)?;

    let evaluate = evaluate || !metrics.is_empty();
    let outcome = pipeline
        .run(
            request,
            template,
            &languages,
            evaluate.then_some(metrics.as_slice()),
        )
        .await?;

    if let Some(path) = &out {
        save_state(&outcome.state, path)?;
    }

    match format {
        OutputFormat::Text => {
            println!("{}", outcome.state.render_draft()?);
            println!();
            print_translations(&outcome.state);
            print_refine_report(&outcome.refine);
            if let Some(report) = &outcome.evaluation {
                println!();
                print_evaluation(&outcome.state, report);
            }
            if let Some(path) = &out {
                println!("  State: {}", path.display());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }
    Ok(())
}

/// List the pattern catalog
pub async fn handle_patterns_list(config: &Config, format: OutputFormat) -> Result<()> {
    let store = PatternStore::from_config(&config.patterns).context("Failed to load pattern catalog")?;

    match format {
        OutputFormat::Text => {
            println!("Patterns ({}):", store.len());
            println!();
            for pattern in store.patterns() {
                println!("{} - {}", pattern.id, pattern.name);
                if !pattern.description.is_empty() {
                    println!("  {}", pattern.description);
                }
                println!("  Platforms: {}", pattern.platforms.join(", "));
                println!("  Difficulty: {:?}", pattern.difficulty);
                println!();
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(store.patterns())?);
        }
    }
    Ok(())
}

/// Score the catalog for a request and pick a pattern
pub async fn handle_patterns_select(
    attributes: AttributeArgs,
    top: Option<usize>,
    no_judge: bool,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let store = PatternStore::from_config(&config.patterns).context("Failed to load pattern catalog")?;
    let top_n = top.unwrap_or(config.patterns.top_n);
    if top_n == 0 {
        bail!("--top must be at least 1");
    }

    let attributes = RequestAttributes {
        platform: attributes.platform,
        industry: attributes.industry,
        account_type: attributes.account_type,
        follower_count: attributes.followers,
        content_type: attributes.content_type,
    };

    let selector = if config.patterns.use_judge && !no_judge {
        PatternSelector::with_judge(
            build_provider(&config.llm).context("Failed to create LLM provider")?,
            top_n,
        )
    } else {
        PatternSelector::new(top_n)
    };

    let selection = selector.choose(&attributes, &store).await?;

    match format {
        OutputFormat::Text => {
            println!("Candidates:");
            for (id, score) in &selection.candidates {
                let marker = if *id == selection.pattern.id { "→" } else { " " };
                println!("{} {:<28} {:>6.1}", marker, id, score);
            }
            println!();
            println!("Selected: {} ({})", selection.pattern.name, selection.pattern.id);
            println!("  Score: {:.1}", selection.score);
            for (criterion, value) in selection.breakdown.contributions() {
                println!("    {:<16} {:+.1}", criterion, value);
            }
            if let Some(reach) = selection.expected_reach {
                println!("  Expected reach: {:.0}", reach);
            }
            println!("  Why: {}", selection.rationale);
            println!("  Hook: {}", selection.pattern.hook_template);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&selection)?);
        }
    }
    Ok(())
}

/// List the metric catalog
pub fn handle_metrics(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for metric in Metric::ALL {
                println!("{:<28} {}", metric.name(), metric.criteria());
            }
        }
        OutputFormat::Json => {
            let output: Vec<_> = Metric::ALL
                .iter()
                .map(|m| {
                    json!({
                        "name": m.name(),
                        "display_name": m.display_name(),
                        "criteria": m.criteria(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// List the builtin templates
pub fn handle_templates(format: OutputFormat) -> Result<()> {
    let templates = builtin_templates();
    match format {
        OutputFormat::Text => {
            for template in &templates {
                println!("{} - {}", template.name, template.description);
                for field in &template.fields {
                    let required = if field.required { " (required)" } else { "" };
                    println!("  {:<16} {}{}", field.name, field.field_type, required);
                }
                println!();
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&templates)?);
        }
    }
    Ok(())
}

/// Show the effective configuration, optionally with a provider health line
pub async fn handle_config_show(config: &Config, check: bool, format: OutputFormat) -> Result<()> {
    let health = if check {
        let llm = build_provider(&config.llm).context("Failed to create LLM provider")?;
        let healthy = llm.check_health().await;
        if !healthy {
            tracing::warn!("Provider {} failed its health check", llm.name());
        }
        Some((llm.name().to_string(), healthy))
    } else {
        None
    };

    match format {
        OutputFormat::Text => {
            print!("{}", config.to_toml()?);
            if let Some((provider, healthy)) = &health {
                let status = if *healthy { "✓ reachable" } else { "✗ unreachable" };
                println!("\n# provider {}: {}", provider, status);
            }
        }
        OutputFormat::Json => {
            let mut value = serde_json::to_value(config)?;
            if let Some((provider, healthy)) = health {
                value["provider_health"] = json!({ "provider": provider, "healthy": healthy });
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

/// Write a default configuration file
pub fn handle_config_init(path: Option<PathBuf>, force: bool, format: OutputFormat) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::default_config_path()?,
    };

    if path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite",
            path.display()
        );
    }

    Config::create_default(&path)?;

    match format {
        OutputFormat::Text => println!("✓ Wrote default configuration to {}", path.display()),
        OutputFormat::Json => println!("{}", json!({ "config_file": path })),
    }
    Ok(())
}
