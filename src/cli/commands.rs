//! CLI command definitions for prompt-forge.
//!
//! Every command builds the same stack: prompt templates from YAML layered
//! over the built-in set, workflow settings from file and environment, an
//! LLM client, and (where needed) the package store.

use crate::agents::{AgentContext, GenerationBrief, ReverseEngineerAgent, VariableExtractorAgent};
use crate::llm::{ImageAttachment, LiteLlmClient, LlmProvider};
use crate::package::{ContentType, PromptPackage};
use crate::pipeline::{
    add_quick_copy, EventStatus, QuickCopySummary, WorkflowConfig, WorkflowOrchestrator,
    WorkflowRequest, MIN_MARKETPLACE_VARIABLES,
};
use crate::prompts::PromptsConfig;
use crate::storage::{sanitize_prefix, JsonFileSink, PackageStore, SqlitePackageStore};
use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default output directory for generated packages.
const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Default SQLite database file.
const DEFAULT_DATABASE: &str = "prompt_forge.db";

/// Image extensions picked up by `batch`.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic"];

/// Marketplace prompt template generator.
#[derive(Parser)]
#[command(name = "prompt-forge")]
#[command(about = "Generate, evaluate and refine marketplace prompt templates")]
#[command(version)]
#[command(
    long_about = "prompt-forge drives an LLM through a generate/evaluate/refine workflow and writes marketplace-ready prompt packages as JSON.\n\nExample usage:\n  prompt-forge create --topic \"Retro Travel Posters\" --platform Midjourney"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Prompt template YAML files layered over the built-in set (repeatable).
    #[arg(short, long, global = true)]
    pub config: Vec<PathBuf>,

    /// Workflow settings YAML (thresholds, sampling, models).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// SQLite database for stored packages.
    #[arg(long, default_value = DEFAULT_DATABASE, global = true)]
    pub database: String,

    /// OpenRouter API key (can also be set via OPENROUTER_API_KEY or LITELLM_API_KEY env var).
    #[arg(long, env = "OPENROUTER_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for every agent; overrides the settings file.
    #[arg(short, long, global = true)]
    pub model: Option<String>,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new template from a topic and run the full workflow.
    Create(CreateArgs),

    /// Reverse-engineer a package from existing prompt text.
    Analyze(AnalyzeArgs),

    /// Reverse-engineer an image template from an image.
    Reverse(ReverseArgs),

    /// Reverse-engineer every image in a folder.
    Batch(BatchArgs),

    /// Run the quality loop on a saved package.
    Improve(ImproveArgs),

    /// Add quick-copy values and the marketplace block to a saved package.
    Enhance(EnhanceArgs),

    /// List stored packages.
    List(ListArgs),
}

/// Output options shared by workflow commands.
#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output file path (default: timestamped file in --output-dir).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for timestamped output files.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Also store the package in the database.
    #[arg(long)]
    pub save: bool,

    /// Use the model for quick-copy value extraction.
    #[arg(long)]
    pub smart: bool,
}

/// Arguments for `prompt-forge create`.
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Topic/theme for the template.
    #[arg(short, long)]
    pub topic: String,

    /// Style direction.
    #[arg(short, long, default_value = "")]
    pub style: String,

    /// Target AI platform.
    #[arg(short, long, default_value = "Midjourney")]
    pub platform: String,

    /// Content type (image, text, video).
    #[arg(long, default_value = "image")]
    pub content_type: ContentType,

    /// Primary use case.
    #[arg(short, long, default_value = "")]
    pub use_case: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `prompt-forge analyze`.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Prompt text to analyze.
    #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
    pub template: Option<String>,

    /// File containing the prompt text.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Content type (image, text, video).
    #[arg(long, default_value = "image")]
    pub content_type: ContentType,

    /// Target AI platform.
    #[arg(short, long, default_value = "Midjourney")]
    pub platform: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `prompt-forge reverse`.
#[derive(Parser, Debug)]
pub struct ReverseArgs {
    /// Image to reverse-engineer.
    #[arg(short, long)]
    pub image: PathBuf,

    /// Additional context for the analysis.
    #[arg(long, default_value = "")]
    pub context: String,

    /// Target AI platform.
    #[arg(short, long, default_value = "Midjourney")]
    pub platform: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `prompt-forge batch`.
#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// Folder containing images.
    #[arg(short, long)]
    pub folder: PathBuf,

    /// Output folder (default: `processed/` inside the input folder).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Seconds to wait between images.
    #[arg(long, default_value = "5")]
    pub delay: u64,

    /// Target AI platform.
    #[arg(short, long, default_value = "Midjourney")]
    pub platform: String,

    /// Use the model for quick-copy value extraction.
    #[arg(long)]
    pub smart: bool,
}

/// Arguments for `prompt-forge improve`.
#[derive(Parser, Debug)]
pub struct ImproveArgs {
    /// Saved package JSON.
    pub path: PathBuf,

    /// Quality threshold (0-100); overrides settings.
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Maximum improvement passes; overrides settings.
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Output file path (default: `<stem>_improved.json` next to the input).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `prompt-forge enhance`.
#[derive(Parser, Debug)]
pub struct EnhanceArgs {
    /// Saved package JSON.
    pub path: PathBuf,

    /// Overwrite the input file.
    #[arg(long)]
    pub overwrite: bool,

    /// Use the model for value extraction.
    #[arg(long)]
    pub smart: bool,
}

/// Arguments for `prompt-forge list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output JSON instead of a table.
    #[arg(short, long)]
    pub json: bool,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        config,
        settings,
        database,
        api_key,
        model,
        ..
    } = cli;
    let env = || Environment::load(&config, settings.as_deref(), api_key.clone(), model.as_deref());

    match command {
        Commands::Create(args) => {
            let brief = GenerationBrief::new(args.topic.clone(), args.content_type, args.platform)
                .with_style(args.style)
                .with_use_case(args.use_case);
            let prefix = format!("prompt_{}", truncate_chars(&args.topic, 30));
            let request = WorkflowRequest::Generate(brief);
            run_workflow(&env()?, &database, request, &prefix, &args.output).await
        }
        Commands::Analyze(args) => {
            let template = match (&args.template, &args.file) {
                (Some(text), _) => text.clone(),
                (None, Some(path)) => fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("Provide --template or --file"),
            };
            let request = WorkflowRequest::ReverseTemplate {
                template,
                content_type: args.content_type,
                platform: args.platform,
            };
            run_workflow(&env()?, &database, request, "analyze", &args.output).await
        }
        Commands::Reverse(args) => {
            let image = load_image(&args.image)?;
            let prefix = format!("reverse_{}", file_stem(&args.image));
            let request = WorkflowRequest::ReverseImage {
                image,
                additional_context: args.context,
                platform: args.platform,
            };
            run_workflow(&env()?, &database, request, &prefix, &args.output).await
        }
        Commands::Batch(args) => run_batch_command(&env()?, args).await,
        Commands::Improve(args) => run_improve_command(&env()?, args).await,
        Commands::Enhance(args) => run_enhance_command(&env()?, args).await,
        Commands::List(args) => run_list_command(&database, args).await,
    }
}

/// Shared command dependencies.
struct Environment {
    llm: Arc<dyn LlmProvider>,
    prompts: Arc<PromptsConfig>,
    config: WorkflowConfig,
}

impl Environment {
    /// Prompts, then settings (file, `PROMPT_FORGE_*`, `--model`), then the client.
    fn load(
        prompt_files: &[PathBuf],
        settings: Option<&Path>,
        api_key: Option<String>,
        model: Option<&str>,
    ) -> anyhow::Result<Self> {
        let prompts = PromptsConfig::load(prompt_files).context("Failed to load prompt templates")?;

        let mut config = match settings {
            Some(path) => WorkflowConfig::from_yaml_file(path)?,
            None => WorkflowConfig::default(),
        };
        config = config.with_env_overrides(|key| std::env::var(key).ok())?;
        if let Some(model) = model {
            config = config
                .with_generator_model(model)
                .with_evaluator_model(model);
        }

        let llm = build_llm_client(api_key, &config)?;
        Ok(Self {
            llm,
            prompts: Arc::new(prompts),
            config,
        })
    }

    fn orchestrator(&self) -> WorkflowOrchestrator {
        WorkflowOrchestrator::new(self.llm.clone(), self.prompts.clone(), self.config.clone())
    }

    fn generator_context(&self) -> AgentContext {
        AgentContext::new(self.llm.clone(), self.prompts.clone())
            .with_sampling(self.config.generator_sampling())
    }
}

fn build_llm_client(
    api_key: Option<String>,
    config: &WorkflowConfig,
) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let resolved_api_key = api_key
        .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
        .or_else(|| std::env::var("LITELLM_API_KEY").ok());

    if std::env::var("LITELLM_API_BASE").is_err() {
        if let Some(key) = resolved_api_key {
            info!("Using OpenRouter with specified API key");
            return Ok(Arc::new(LiteLlmClient::new_with_defaults(key).with_timeout(timeout)));
        }
    }

    info!("Using LiteLLM client from environment");
    let client = LiteLlmClient::from_env().map_err(|e| {
        anyhow::anyhow!(
            "Failed to initialize LLM client: {}. Please provide --api-key or set OPENROUTER_API_KEY/LITELLM_API_BASE.",
            e
        )
    })?;
    Ok(Arc::new(client.with_timeout(timeout)))
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string())
}

fn load_image(path: &Path) -> anyhow::Result<ImageAttachment> {
    let data = fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?;
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(ImageAttachment::new(
        ImageAttachment::mime_type_for_extension(&extension),
        data,
    ))
}

fn load_package(path: &Path) -> anyhow::Result<PromptPackage> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    PromptPackage::from_json_str(&content)
        .with_context(|| format!("{} is not a valid package", path.display()))
}

fn report_quick_copy(summary: &QuickCopySummary, package: &PromptPackage) {
    if summary.skipped {
        return;
    }
    println!("  Quick-copy examples: {}", summary.extracted);
    if summary.low_variable_count {
        println!(
            "  Warning: template has only {} variables; marketplaces require at least 4",
            package.variables().len()
        );
    }
}

fn print_template(package: &PromptPackage) {
    println!("\nTemplate:");
    println!("{}", "-".repeat(50));
    println!("{}", package.template());
    println!("{}", "-".repeat(50));
    println!("Variables: {}", package.variables_text());
}

// ============================================================================
// Workflow commands
// ============================================================================

async fn run_workflow(
    env: &Environment,
    database: &str,
    request: WorkflowRequest,
    prefix: &str,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let orchestrator = env.orchestrator();
    let events = orchestrator.run(request);
    futures::pin_mut!(events);

    let mut finished = None;
    while let Some(event) = events.next().await {
        match event.status {
            EventStatus::Running => {
                if event.package.is_some() {
                    println!("✓ [{}] {}", event.step, event.message);
                } else {
                    println!("… [{}] {}", event.step, event.message);
                }
            }
            EventStatus::Completed => finished = event.package,
            EventStatus::Error => {
                anyhow::bail!("Workflow failed at {}: {}", event.step, event.message);
            }
        }
    }
    let mut package = finished.context("Workflow ended without a package")?;

    let extractor = output
        .smart
        .then(|| VariableExtractorAgent::new(env.generator_context()));
    let summary = add_quick_copy(&mut package, extractor.as_ref()).await;

    let sink = JsonFileSink::new(&output.output_dir);
    let path = match &output.output {
        Some(path) => {
            sink.write_to(&package, path)?;
            path.clone()
        }
        None => sink.save(&package, prefix)?,
    };
    println!("\n✓ Saved to: {}", path.display());
    report_quick_copy(&summary, &package);

    if output.save {
        let store = SqlitePackageStore::open(database).await?;
        let id = store.create(&package).await?;
        println!("  Stored as {}", id);
    }

    print_template(&package);
    Ok(())
}

// ============================================================================
// Batch command
// ============================================================================

/// Outcome of one image in a batch.
enum BatchOutcome {
    Success { output: String, note: String },
    Skipped { existing: String },
    Failed { error: String },
}

fn find_existing_output(dir: &Path, prefix: &str) -> Option<String> {
    let entries = fs::read_dir(dir).ok()?;
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .find(|name| name.starts_with(prefix) && name.ends_with(".json"))
}

async fn run_batch_command(env: &Environment, args: BatchArgs) -> anyhow::Result<()> {
    let out_dir = args
        .output
        .clone()
        .unwrap_or_else(|| args.folder.join("processed"));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut images: Vec<PathBuf> = fs::read_dir(&args.folder)
        .with_context(|| format!("Failed to read {}", args.folder.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .map(|e| IMAGE_EXTENSIONS.contains(&e.to_string_lossy().to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    images.sort();

    if images.is_empty() {
        println!("No images found in {}", args.folder.display());
        return Ok(());
    }

    println!("Batch: {} images found", images.len());
    println!("  Output: {}", out_dir.display());
    println!("  Smart mode: {}", if args.smart { "on" } else { "off" });
    println!("  Delay: {}s", args.delay);

    let context = env.generator_context();
    let agent = ReverseEngineerAgent::new(context.clone());
    let extractor = args.smart.then(|| VariableExtractorAgent::new(context));
    let sink = JsonFileSink::new(&out_dir);

    let mut rows = Vec::new();
    for (i, image_path) in images.iter().enumerate() {
        let name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let prefix = sanitize_prefix(&format!("reverse_{}", file_stem(image_path)));

        if let Some(existing) = find_existing_output(&out_dir, &prefix) {
            println!("Skipping {} (already exists: {})", name, existing);
            rows.push((name, BatchOutcome::Skipped { existing }));
            continue;
        }

        println!("[{}/{}] Processing {}...", i + 1, images.len(), name);
        let outcome = match load_image(image_path) {
            Err(e) => BatchOutcome::Failed {
                error: e.to_string(),
            },
            Ok(image) => match agent.from_image(&image, "", &args.platform).await {
                Err(e) => BatchOutcome::Failed {
                    error: e.to_string(),
                },
                Ok(mut package) => {
                    add_quick_copy(&mut package, extractor.as_ref()).await;
                    match sink.save(&package, &prefix) {
                        Err(e) => BatchOutcome::Failed {
                            error: e.to_string(),
                        },
                        Ok(path) => {
                            let mut note = if args.smart {
                                "Smart extracted".to_string()
                            } else {
                                "Regex extracted".to_string()
                            };
                            let vars = package.variables().len();
                            if vars < MIN_MARKETPLACE_VARIABLES {
                                note.push_str(&format!(" | Low vars: {}", vars));
                            }
                            BatchOutcome::Success {
                                output: path
                                    .file_name()
                                    .map(|n| n.to_string_lossy().to_string())
                                    .unwrap_or_default(),
                                note,
                            }
                        }
                    }
                }
            },
        };

        match &outcome {
            BatchOutcome::Success { .. } => {
                println!("  ✓ Done");
                tokio::time::sleep(Duration::from_secs(args.delay)).await;
            }
            BatchOutcome::Failed { error } => {
                warn!(image = %name, error = %error, "Batch item failed");
                println!("  ✗ Error: {}", error);
            }
            BatchOutcome::Skipped { .. } => {}
        }
        rows.push((name, outcome));
    }

    let report_path = out_dir.join(format!(
        "batch_report_{}.md",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ));
    fs::write(&report_path, batch_report(&args.folder, &rows))
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    let count = |f: fn(&BatchOutcome) -> bool| rows.iter().filter(|(_, o)| f(o)).count();
    println!("\nBatch complete.");
    println!("  Success: {}", count(|o| matches!(o, BatchOutcome::Success { .. })));
    println!("  Skipped: {}", count(|o| matches!(o, BatchOutcome::Skipped { .. })));
    println!("  Failed:  {}", count(|o| matches!(o, BatchOutcome::Failed { .. })));
    println!("  Report:  {}", report_path.display());
    Ok(())
}

fn batch_report(folder: &Path, rows: &[(String, BatchOutcome)]) -> String {
    let mut report = format!(
        "# Batch Process Report\nDate: {}\nFolder: {}\n\n| Image | Status | Output | Notes |\n|---|---|---|---|\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        folder.display()
    );
    for (name, outcome) in rows {
        let line = match outcome {
            BatchOutcome::Success { output, note } => {
                format!("| {} | Success | {} | {} |\n", name, output, note)
            }
            BatchOutcome::Skipped { existing } => {
                format!("| {} | Skipped | {} | already processed |\n", name, existing)
            }
            BatchOutcome::Failed { error } => {
                format!("| {} | Failed | - | {} |\n", name, error.replace('|', "/"))
            }
        };
        report.push_str(&line);
    }
    report
}

// ============================================================================
// Package commands
// ============================================================================

async fn run_improve_command(env: &Environment, args: ImproveArgs) -> anyhow::Result<()> {
    let package = load_package(&args.path)?;

    let mut config = env.config.clone();
    if let Some(threshold) = args.threshold {
        config = config.with_quality_threshold(threshold);
    }
    if let Some(max) = args.max_iterations {
        config = config.with_max_iterations(max);
    }
    config.validate()?;

    let orchestrator = WorkflowOrchestrator::new(env.llm.clone(), env.prompts.clone(), config);
    println!("Improving '{}'...", package.topic);
    let run = orchestrator.quality_loop().run(package).await;

    for entry in &run.history {
        let marker = if entry.iteration == run.best.iteration { "*" } else { " " };
        println!("{} iteration {}: score {}", marker, entry.iteration, entry.score);
    }
    println!("Stopped: {}", run.stop_reason);
    println!("Best: iteration {} ({:+} over initial)", run.best.iteration, run.improvement());

    let output = args.output.unwrap_or_else(|| {
        args.path
            .with_file_name(format!("{}_improved.json", file_stem(&args.path)))
    });
    JsonFileSink::new(".").write_to(&run.best.prompt, &output)?;
    println!("✓ Saved to: {}", output.display());
    Ok(())
}

async fn run_enhance_command(env: &Environment, args: EnhanceArgs) -> anyhow::Result<()> {
    let mut package = load_package(&args.path)?;
    println!("Enhancing: {}", args.path.display());

    let extractor = args
        .smart
        .then(|| VariableExtractorAgent::new(env.generator_context()));
    let summary = add_quick_copy(&mut package, extractor.as_ref()).await;
    if summary.skipped {
        println!("Nothing to enhance: package has no examples or no variables");
        return Ok(());
    }

    let output = if args.overwrite {
        args.path.clone()
    } else {
        args.path
            .with_file_name(format!("{}_enhanced.json", file_stem(&args.path)))
    };
    JsonFileSink::new(".").write_to(&package, &output)?;
    println!("✓ Saved to: {}", output.display());
    report_quick_copy(&summary, &package);
    Ok(())
}

async fn run_list_command(database: &str, args: ListArgs) -> anyhow::Result<()> {
    let store = SqlitePackageStore::open(database).await?;
    let stored = store.list_all().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
        return Ok(());
    }
    if stored.is_empty() {
        println!("No stored packages.");
        return Ok(());
    }
    for entry in &stored {
        println!(
            "{}  {}  {:<6} {:<14} {}",
            entry.id,
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.package.content_type.as_str(),
            entry.package.category.as_deref().unwrap_or("-"),
            entry.package.topic
        );
    }
    println!("{} packages", stored.len());
    Ok(())
}
