//! # File Fairy CLI
//!
//! Command-line interface for File Fairy.
//!
//! File Fairy organizes a directory by content: files are sorted into
//! category folders and renamed from a rule table, optionally with names and
//! folders suggested by a local LLM. It also keeps a vector index of file
//! content for natural-language search.
//!
//! ## Commands
//!
//! - `fairy organize <PATH>` - Preview and apply a rename/move plan
//! - `fairy scan <PATH>` - Report file counts and the oldest files
//! - `fairy index <PATH>` - Index a directory for semantic search
//! - `fairy query <QUERY>` - Search indexed content
//! - `fairy status` - Show index statistics
//!
//! ## Examples
//!
//! ```bash
//! # See what would happen
//! fairy organize ~/Downloads --dry-run
//!
//! # Apply with AI file names, writing an operation log
//! fairy organize ~/Downloads --ai-filename --log
//!
//! # Decide change by change
//! fairy organize ~/Downloads --review
//!
//! # Search for content
//! fairy query "quarterly budget" --format json
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use clap::{Parser, Subcommand};
use fairy_core::{
    ChangeEntry, ChunkConfig, Embedder, EmbeddingConfig, FileEntry, Suggester, VectorStore,
};
use fairy_embed::{EmbedderPool, HashEmbedder, NoopEmbedder};
use fairy_extract::ExtractorRegistry;
use fairy_index::{IndexConfig, IndexService, IndexUpdate};
use fairy_llm::{LlmSuggester, OllamaClient, OllamaEmbedder};
use fairy_organize::{
    append_log, AiOptions, ApplyReport, AutoConfirm, Confirm, KeyChunkSelector, OutcomeStatus,
    Plan, PlanExecutor, Planner, Review, RuleTable, ScanReport, LOG_FILE_NAME,
};
use fairy_query::HybridSearcher;
use fairy_store::SqliteStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod config;

use config::{check_threshold, ensure_parent, Config, EmbeddingProvider};

#[derive(Parser)]
#[command(name = "fairy")]
#[command(about = "Organize files by content and search them with natural language")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/fairy/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Sort a directory into category folders
    Organize {
        /// Directory to organize
        path: PathBuf,

        /// Include subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Only show the plan
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Apply without asking
        #[arg(short, long)]
        yes: bool,

        /// Approve, skip or rename each change one at a time
        #[arg(long, conflicts_with = "yes")]
        review: bool,

        /// Append the operation log to a file
        #[arg(long)]
        log: bool,

        /// Log file (default: <PATH>/fairy.log)
        #[arg(long, requires = "log")]
        log_file: Option<PathBuf>,

        /// Rule table to use instead of the configured one
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Ask the LLM for keywords
        #[arg(long)]
        ai_keywords: bool,

        /// Ask the LLM for file names
        #[arg(long)]
        ai_filename: bool,

        /// Ask the LLM for destination folders
        #[arg(long)]
        ai_folder: bool,

        /// Disable every AI suggestion, including configured ones
        #[arg(long, conflicts_with_all = ["ai_keywords", "ai_filename", "ai_folder"])]
        no_ai: bool,
    },

    /// Report what a directory contains
    Scan {
        /// Directory to scan
        path: PathBuf,

        /// Include subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Show counts per extension
        #[arg(long)]
        by_ext: bool,

        /// Show the oldest files
        #[arg(long)]
        by_date: bool,
    },

    /// Index a directory for search
    Index {
        /// Directory to index
        path: PathBuf,

        /// Only the top level of the directory
        #[arg(long)]
        no_recursive: bool,

        /// Extensions to index (default from config)
        #[arg(short, long, value_delimiter = ',')]
        ext: Vec<String>,
    },

    /// Query the index
    Query {
        /// Natural language query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum similarity score
        #[arg(short, long)]
        threshold: Option<f32>,
    },

    /// Show index status
    Status,

    /// Remove a file from the index
    Remove {
        /// Indexed file
        path: PathBuf,
    },

    /// Drop every indexed record
    Clear {
        /// Clear without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage the rule table
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// Show the effective rule table
    Show,
    /// Write the default rule table
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration
    Init,
    /// Show config file path
    Path,
}

/// JSON output for a plan.
#[derive(Serialize)]
struct PlanOutput {
    root: String,
    dry_run: bool,
    aborted: bool,
    entries: Vec<PlanItem>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct PlanItem {
    from: String,
    to: String,
    category: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// JSON output for a scan report.
#[derive(Serialize)]
struct ScanOutput {
    path: String,
    total_files: usize,
    by_extension: Vec<ExtensionCount>,
    oldest: Vec<OldFile>,
}

#[derive(Serialize)]
struct ExtensionCount {
    extension: String,
    count: usize,
}

#[derive(Serialize)]
struct OldFile {
    path: String,
    modified: String,
}

/// JSON output for indexing.
#[derive(Serialize)]
struct IndexOutput {
    path: String,
    indexed_files: usize,
    total_chunks: u64,
    failed: Vec<FailedFile>,
}

#[derive(Serialize)]
struct FailedFile {
    path: String,
    error: String,
}

/// JSON output for status.
#[derive(Serialize)]
struct StatusOutput {
    db_path: String,
    total_files: u64,
    total_chunks: u64,
    last_updated: Option<String>,
}

/// Asks on the terminal before a plan is applied.
struct PromptConfirm;

#[async_trait]
impl Confirm for PromptConfirm {
    async fn confirm(&self, plan: &Plan) -> bool {
        let message = format!("Apply {} change(s)?", plan.len());
        tokio::task::spawn_blocking(move || prompt_yes_no(&message))
            .await
            .unwrap_or(false)
    }

    async fn review(&self, entry: &ChangeEntry, position: usize, total: usize) -> Review {
        let message = format!(
            "[{position}/{total}] {} -> {}",
            entry.from.display(),
            entry.to.display()
        );
        tokio::task::spawn_blocking(move || prompt_review(&message))
            .await
            .unwrap_or(Review::Quit)
    }
}

const REVIEW_CHOICES: [&str; 4] = ["apply", "skip", "edit name", "quit"];

fn prompt_review(message: &str) -> Review {
    let choice = match inquire::Select::new(message, REVIEW_CHOICES.to_vec()).prompt() {
        Ok(choice) => choice,
        Err(e) => {
            warn!("Prompt failed: {}", e);
            return Review::Quit;
        }
    };
    match choice {
        "apply" => Review::Apply,
        "skip" => Review::Skip,
        "edit name" => match inquire::Text::new("New file name:").prompt() {
            Ok(name) if !name.trim().is_empty() => Review::Rename(name),
            Ok(_) => Review::Skip,
            Err(e) => {
                warn!("Prompt failed: {}", e);
                Review::Skip
            }
        },
        _ => Review::Quit,
    }
}

fn prompt_yes_no(message: &str) -> bool {
    match inquire::Confirm::new(message).with_default(false).prompt() {
        Ok(answer) => answer,
        Err(e) => {
            warn!("Prompt failed: {}", e);
            false
        }
    }
}

/// Build the embedder pool the configuration asks for.
fn create_embedder(config: &Config) -> Result<Arc<EmbedderPool>> {
    let dimension = config.embedding.dimension;
    let embedder: Arc<dyn Embedder> = match config.embedding.provider {
        EmbeddingProvider::Ollama => {
            let client = Arc::new(ollama_client(config)?);
            Arc::new(OllamaEmbedder::new(
                client,
                config.embedding.model.clone(),
                dimension,
            ))
        }
        EmbeddingProvider::Hash => Arc::new(HashEmbedder::new(dimension)),
        EmbeddingProvider::Noop => Arc::new(NoopEmbedder::with_dimension(dimension)),
    };

    Ok(Arc::new(EmbedderPool::new(
        embedder,
        config.embedding.max_concurrent.max(1),
    )))
}

fn ollama_client(config: &Config) -> Result<OllamaClient> {
    OllamaClient::new(
        config.llm.base_url.clone(),
        Duration::from_secs(config.llm.timeout_secs),
    )
    .context("Failed to create LLM client")
}

fn db_path(config: &Config) -> Result<PathBuf> {
    config
        .db_path()
        .context("Could not determine data directory")
}

/// Open the index, creating the database if needed.
async fn open_index(config: &Config) -> Result<IndexService> {
    let path = db_path(config)?;
    ensure_parent(&path).context("Failed to create data directory")?;

    let store = SqliteStore::open(&path, config.embedding.dimension)
        .with_context(|| format!("Failed to open index at {}", path.display()))?;
    let index_config = IndexConfig {
        chunk_config: ChunkConfig {
            size: config.chunking.size,
            overlap: config.chunking.overlap,
        },
        embed_config: EmbeddingConfig::default(),
    };

    let index = IndexService::new(
        Arc::new(store) as Arc<dyn VectorStore>,
        create_embedder(config)?,
        index_config,
    );
    index.init().await.context("Failed to initialize index")?;
    Ok(index)
}

/// Open the index only when its database already exists.
async fn open_existing_index(config: &Config) -> Result<Option<IndexService>> {
    if !db_path(config)?.exists() {
        return Ok(None);
    }
    open_index(config).await.map(Some)
}

fn load_rules(config: &Config, explicit: Option<&Path>) -> Result<RuleTable> {
    if let Some(path) = explicit {
        return RuleTable::load(path)
            .with_context(|| format!("Invalid rules file {}", path.display()));
    }
    match config.rules_path() {
        Some(path) => RuleTable::load_or_default(&path)
            .with_context(|| format!("Invalid rules file {}", path.display())),
        None => Ok(RuleTable::default()),
    }
}

fn ai_options(config: &Config, keywords: bool, filename: bool, folder: bool, no_ai: bool) -> AiOptions {
    let concurrency = config.organize.concurrency.max(1);
    let max_file_size = Some(config.organize.max_file_size);
    if no_ai {
        return AiOptions {
            keywords: false,
            filename: false,
            folder: false,
            concurrency,
            max_file_size,
        };
    }
    AiOptions {
        keywords: keywords || config.organize.ai_keywords,
        filename: filename || config.organize.ai_filename,
        folder: folder || config.organize.ai_folder,
        concurrency,
        max_file_size,
    }
}

#[allow(clippy::too_many_arguments)]
async fn organize(
    config: &Config,
    format: OutputFormat,
    path: &Path,
    recursive: bool,
    dry_run: bool,
    yes: bool,
    review: bool,
    log_file: Option<PathBuf>,
    rules: Option<&Path>,
    ai: AiOptions,
) -> Result<()> {
    if !path.is_dir() {
        anyhow::bail!("Directory does not exist: {}", path.display());
    }
    let root = path.canonicalize()?;

    let rules = Arc::new(load_rules(config, rules)?);
    let extractors = Arc::new(ExtractorRegistry::with_defaults());
    let mut planner = Planner::new(rules, extractors);
    if ai.keywords || ai.filename || ai.folder {
        let client = Arc::new(ollama_client(config)?);
        if !client.health_check().await {
            warn!(
                "LLM backend at {} is not reachable, AI suggestions will fall back to rules",
                client.base_url()
            );
        }
        let suggester = LlmSuggester::new(client, config.llm.model.clone());
        info!("AI suggestions enabled (model: {})", suggester.model());
        planner = planner.with_suggester(Arc::new(suggester) as Arc<dyn Suggester>, ai);

        if config.organize.key_chunks && config.embedding.provider != EmbeddingProvider::Noop {
            let selector = KeyChunkSelector::new(
                create_embedder(config)?,
                ChunkConfig {
                    size: config.chunking.size,
                    overlap: config.chunking.overlap,
                },
            )
            .with_clusters(config.organize.key_chunk_clusters);
            planner = planner.with_key_chunks(selector);
        }
    }

    let plan = planner
        .plan(&root, recursive)
        .await
        .context("Failed to compute plan")?;
    for warning in &plan.warnings {
        warn!("{}", warning);
    }

    if plan.is_empty() {
        match format {
            OutputFormat::Json => print_plan_json(&plan, &ApplyReport::default(), dry_run)?,
            OutputFormat::Text => println!("Nothing to organize in {}", root.display()),
        }
        return Ok(());
    }

    if matches!(format, OutputFormat::Text) {
        for line in plan.preview_lines() {
            println!("{line}");
        }
        println!("\n{} file(s) will be moved.", plan.len());
    }

    let confirm: Arc<dyn Confirm> = if yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(PromptConfirm)
    };
    let report = PlanExecutor::new(confirm)
        .with_review(review)
        .execute(&plan, dry_run, !yes)
        .await
        .context("Failed to apply plan")?;

    if let Some(log_path) = log_file {
        let log_path = if log_path.is_relative() {
            root.join(log_path)
        } else {
            log_path
        };
        append_log(&log_path, &report.log_lines())
            .await
            .with_context(|| format!("Failed to write log {}", log_path.display()))?;
    }

    if !dry_run && !report.aborted && config.organize.update_index {
        follow_moves(config, &report).await;
    }

    match format {
        OutputFormat::Json => print_plan_json(&plan, &report, dry_run)?,
        OutputFormat::Text => {
            if report.aborted {
                println!("Cancelled, nothing changed.");
            } else if dry_run {
                println!("Dry run, nothing changed.");
            } else {
                for outcome in &report.outcomes {
                    if let OutcomeStatus::Failed(reason) = &outcome.status {
                        println!("Failed: {} ({reason})", outcome.entry.from.display());
                    }
                }
                if report.quit {
                    println!("Review stopped early.");
                }
                println!(
                    "Moved {} file(s), {} skipped, {} failed.",
                    report.moved(),
                    report.skipped(),
                    report.failed()
                );
            }
        }
    }
    Ok(())
}

/// Point index records of moved files at their new paths.
async fn follow_moves(config: &Config, report: &ApplyReport) {
    if report.moved() == 0 {
        return;
    }
    let index = match open_existing_index(config).await {
        Ok(Some(index)) => index,
        Ok(None) => return,
        Err(e) => {
            warn!("Index not updated: {:#}", e);
            return;
        }
    };

    let mut updated = 0u64;
    for outcome in &report.outcomes {
        if outcome.status != OutcomeStatus::Moved {
            continue;
        }
        match index.rename(&outcome.entry.from, &outcome.entry.to).await {
            Ok(n) => updated += n,
            Err(e) => warn!("Index not updated for {:?}: {}", outcome.entry.from, e),
        }
    }
    if let Err(e) = index.shutdown().await {
        warn!("Failed to flush index: {}", e);
    }
    if updated > 0 {
        info!("Updated {} index record(s) for moved files", updated);
    }
}

fn print_plan_json(plan: &Plan, report: &ApplyReport, dry_run: bool) -> Result<()> {
    let entries = if report.outcomes.is_empty() {
        plan.entries
            .iter()
            .map(|e| PlanItem {
                from: e.from.display().to_string(),
                to: e.to.display().to_string(),
                category: e.category.clone(),
                status: "planned".to_string(),
                reason: None,
            })
            .collect()
    } else {
        report
            .outcomes
            .iter()
            .map(|o| {
                let (status, reason) = match &o.status {
                    OutcomeStatus::Planned => ("planned", None),
                    OutcomeStatus::Moved => ("moved", None),
                    OutcomeStatus::Skipped => ("skipped", None),
                    OutcomeStatus::Failed(reason) => ("failed", Some(reason.clone())),
                };
                PlanItem {
                    from: o.entry.from.display().to_string(),
                    to: o.entry.to.display().to_string(),
                    category: o.entry.category.clone(),
                    status: status.to_string(),
                    reason,
                }
            })
            .collect()
    };

    let output = PlanOutput {
        root: plan.root.display().to_string(),
        dry_run,
        aborted: report.aborted,
        entries,
        warnings: plan.warnings.clone(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn format_date(file: &FileEntry) -> String {
    file.modified_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

async fn scan_report(
    config: &Config,
    format: OutputFormat,
    path: &Path,
    recursive: bool,
    by_ext: bool,
    by_date: bool,
) -> Result<()> {
    let rules = load_rules(config, None)?;
    let root = path.to_path_buf();
    let files =
        tokio::task::spawn_blocking(move || fairy_organize::scan(&root, recursive, &rules.exclude))
            .await
            .context("Scan task failed")?
            .with_context(|| format!("Failed to scan {}", path.display()))?;
    let report = ScanReport::from_entries(&files);
    let (show_ext, show_date) = if by_ext || by_date {
        (by_ext, by_date)
    } else {
        (true, true)
    };

    match format {
        OutputFormat::Json => {
            let output = ScanOutput {
                path: path.display().to_string(),
                total_files: report.total_files,
                by_extension: report
                    .by_extension
                    .iter()
                    .map(|(extension, count)| ExtensionCount {
                        extension: extension.clone(),
                        count: *count,
                    })
                    .collect(),
                oldest: report
                    .oldest
                    .iter()
                    .map(|f| OldFile {
                        path: f.path.display().to_string(),
                        modified: format_date(f),
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("Scan of {}", path.display());
            println!("  Files: {}", report.total_files);
            if show_ext && !report.by_extension.is_empty() {
                println!("\nBy extension:");
                for (ext, count) in &report.by_extension {
                    println!("  {ext:<16} {count}");
                }
            }
            if show_date && !report.oldest.is_empty() {
                println!("\nOldest files:");
                for file in &report.oldest {
                    println!("  {}  {}", format_date(file), file.path.display());
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from(Some(path.clone()))
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.logging.level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Organize {
            path,
            recursive,
            dry_run,
            yes,
            review,
            log,
            log_file,
            rules,
            ai_keywords,
            ai_filename,
            ai_folder,
            no_ai,
        } => {
            let log_file = log.then(|| {
                log_file
                    .or_else(|| config.organize.log_file.clone())
                    .unwrap_or_else(|| PathBuf::from(LOG_FILE_NAME))
            });
            let ai = ai_options(&config, ai_keywords, ai_filename, ai_folder, no_ai);
            organize(
                &config,
                cli.format,
                &path,
                recursive,
                dry_run,
                yes,
                review,
                log_file,
                rules.as_deref(),
                ai,
            )
            .await?;
        }

        Commands::Scan {
            path,
            recursive,
            by_ext,
            by_date,
        } => {
            scan_report(&config, cli.format, &path, recursive, by_ext, by_date).await?;
        }

        Commands::Index {
            path,
            no_recursive,
            ext,
        } => {
            if !path.is_dir() {
                anyhow::bail!("Directory does not exist: {}", path.display());
            }
            let path = path.canonicalize()?;
            let recursive = config.index.recursive && !no_recursive;
            let extensions = if ext.is_empty() {
                config.index.extensions.clone()
            } else {
                ext
            };
            info!("Indexing {:?} (recursive={})", path, recursive);

            let index = open_index(&config).await?;

            // Progress reporter
            let mut updates = index.subscribe();
            let progress_handle = tokio::spawn(async move {
                while let Ok(update) = updates.recv().await {
                    match update {
                        IndexUpdate::FileIndexed { path, chunk_count } => {
                            info!("Indexed: {:?} ({} chunks)", path, chunk_count);
                        }
                        IndexUpdate::FileError { path, error } => {
                            warn!("Error: {:?}: {}", path, error);
                        }
                        IndexUpdate::IndexingStarted { .. } | IndexUpdate::FileRemoved { .. } => {}
                    }
                }
            });

            let filter = (!extensions.is_empty()).then_some(extensions.as_slice());
            let report = index
                .index_folder(&path, recursive, filter)
                .await
                .context("Indexing failed")?;
            index.shutdown().await.context("Failed to flush index")?;
            progress_handle.abort();

            match cli.format {
                OutputFormat::Json => {
                    let output = IndexOutput {
                        path: path.display().to_string(),
                        indexed_files: report.indexed.len(),
                        total_chunks: report.total_chunks(),
                        failed: report
                            .failed
                            .iter()
                            .map(|(path, error)| FailedFile {
                                path: path.display().to_string(),
                                error: error.clone(),
                            })
                            .collect(),
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    println!(
                        "Indexed {} file(s), {} chunk(s).",
                        report.indexed.len(),
                        report.total_chunks()
                    );
                    for (path, error) in &report.failed {
                        println!("  Failed: {} ({error})", path.display());
                    }
                }
            }
        }

        Commands::Query {
            query,
            limit,
            threshold,
        } => {
            let db = db_path(&config)?;
            if !db.exists() {
                anyhow::bail!("Index not found. Run 'fairy index <PATH>' first.");
            }
            let limit = limit
                .unwrap_or(config.query.default_limit)
                .clamp(1, config.query.max_limit.max(1));
            let threshold = check_threshold(threshold.unwrap_or(config.query.threshold))?;

            let store = SqliteStore::open(&db, config.embedding.dimension)
                .with_context(|| format!("Failed to open index at {}", db.display()))?;
            store.init().await.context("Failed to initialize store")?;
            let store = Arc::new(store) as Arc<dyn VectorStore>;
            let embedder = create_embedder(&config)?;
            let searcher = if config.query.hybrid {
                HybridSearcher::new(store, embedder)
            } else {
                HybridSearcher::new(store, embedder).vector_only()
            };

            let response = searcher.search(&query, limit, threshold).await;

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                }
                OutputFormat::Text => {
                    if !response.success {
                        anyhow::bail!(
                            "Search failed: {}",
                            response.error.unwrap_or_else(|| "unknown error".to_string())
                        );
                    }
                    println!("Query: {query}\n");
                    if response.results.is_empty() {
                        println!("No results found.");
                    } else {
                        for (i, result) in response.results.iter().enumerate() {
                            println!(
                                "{}. {} (score: {:.3})",
                                i + 1,
                                result.file_path.display(),
                                result.score
                            );
                            println!("   {}", result.excerpt.replace(['\n', '\r'], " "));
                            println!();
                        }
                    }
                }
            }
        }

        Commands::Status => {
            let db = db_path(&config)?;
            if !db.exists() {
                match cli.format {
                    OutputFormat::Json => {
                        println!(r#"{{"error": "Index not found"}}"#);
                    }
                    OutputFormat::Text => {
                        println!("Index not found at {}", db.display());
                        println!("Run 'fairy index <PATH>' to create it.");
                    }
                }
                return Ok(());
            }

            let store = SqliteStore::open(&db, config.embedding.dimension)
                .with_context(|| format!("Failed to open index at {}", db.display()))?;
            store.init().await.context("Failed to initialize store")?;
            let stats = store.stats().await?;

            match cli.format {
                OutputFormat::Json => {
                    let output = StatusOutput {
                        db_path: db.display().to_string(),
                        total_files: stats.total_files,
                        total_chunks: stats.total_chunks,
                        last_updated: stats.last_updated.map(|t| t.to_rfc3339()),
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    println!("Index Status ({})", db.display());
                    println!("  Files:  {}", stats.total_files);
                    println!("  Chunks: {}", stats.total_chunks);
                    if let Some(last) = stats.last_updated {
                        println!("  Updated: {}", last.format("%Y-%m-%d %H:%M:%S"));
                    }
                }
            }
        }

        Commands::Remove { path } => {
            let Some(index) = open_existing_index(&config).await? else {
                anyhow::bail!("Index not found. Run 'fairy index <PATH>' first.");
            };
            let path = path.canonicalize().unwrap_or(path);
            let removed = index.remove(&path).await.context("Failed to remove file")?;
            index.shutdown().await?;
            if removed == 0 {
                println!("{} was not indexed.", path.display());
            } else {
                println!("Removed {} record(s) for {}.", removed, path.display());
            }
        }

        Commands::Clear { yes } => {
            let Some(index) = open_existing_index(&config).await? else {
                println!("Index not found, nothing to clear.");
                return Ok(());
            };
            let go = yes
                || tokio::task::spawn_blocking(|| prompt_yes_no("Delete every indexed record?"))
                    .await
                    .unwrap_or(false);
            if go {
                index.clear().await.context("Failed to clear index")?;
                index.shutdown().await?;
                println!("Index cleared.");
            } else {
                println!("Cancelled.");
            }
        }

        Commands::Rules { action } => match action {
            RulesAction::Show => {
                let rules = load_rules(&config, None)?;
                match cli.format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rules)?),
                    OutputFormat::Text => println!("{}", rules.to_toml()?),
                }
            }
            RulesAction::Init { force } => {
                let path = config
                    .rules_path()
                    .context("Could not determine config directory")?;
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                ensure_parent(&path).context("Failed to create config directory")?;
                std::fs::write(&path, RuleTable::default().to_toml()?)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Wrote {}", path.display());
            }
        },

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config)
                            .context("Failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("Failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}
