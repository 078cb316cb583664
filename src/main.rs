use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use ragquery::config::AppConfig;
use ragquery::metrics::PerformanceTracker;
use ragquery::RagService;
use tracing::info;

#[derive(Parser)]
#[command(name = "ragquery")]
#[command(about = "Answer questions from a Supabase document collection with an OpenAI model")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a TOML configuration file (default: ./config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Query {
        /// The question
        text: String,
        /// Minimum similarity for a document to be used
        #[arg(short, long)]
        threshold: Option<f32>,
        /// Maximum number of documents passed to the model
        #[arg(short, long)]
        max_sources: Option<usize>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
        /// Print per-stage timings after the answer
        #[arg(long)]
        timings: bool,
    },
    /// Start the HTTP API server
    Serve {
        /// Host to bind (default: server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (default: server.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Allow cross-origin requests
        #[arg(long)]
        cors: bool,
    },
    /// Show the effective configuration and check credentials
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_required(path, |name| std::env::var(name).ok())
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load()?,
    };

    if cli.verbose {
        ragquery::logging::init_logging_with_level("debug")?;
    } else {
        ragquery::logging::init_logging_with_config(&config)?;
    }
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Query {
            text,
            threshold,
            max_sources,
            json,
            timings,
        } => handle_query(&config, text, threshold, max_sources, json, timings).await?,
        Commands::Serve { host, port, cors } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            ragquery::api::serve_api(&config, &host, port, cors).await?;
        }
        Commands::CheckConfig => handle_check_config(&config),
    }

    Ok(())
}

async fn handle_query(
    config: &AppConfig,
    text: String,
    threshold: Option<f32>,
    max_sources: Option<usize>,
    json: bool,
    timings: bool,
) -> Result<()> {
    let tracker = Arc::new(PerformanceTracker::new());
    let service = RagService::from_config(config, tracker.clone())?;

    let mut query = service.new_query(text);
    if let Some(threshold) = threshold {
        query = query.with_similarity_threshold(threshold);
    }
    if let Some(max_sources) = max_sources {
        query = query.with_max_sources(max_sources);
    }
    query.validate()?;

    let result = service.query(&query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.format());
    }

    if timings {
        println!();
        println!("⏱  Stage timings:");
        for (name, m) in tracker.metrics() {
            println!(
                "  {:<26} count={} avg={:.3}s min={:.3}s max={:.3}s",
                name, m.count, m.average_time, m.min_time, m.max_time
            );
        }
    }

    if result.is_error() {
        anyhow::bail!("query failed: {}", result.metadata.error.as_deref().unwrap_or("unknown error"));
    }

    Ok(())
}

fn handle_check_config(config: &AppConfig) {
    println!("📋 ragquery configuration:");
    println!();
    println!("🧠 Embeddings:");
    println!("  model:     {}", config.embedding_model());
    println!("  dimension: {}", config.embedding_dimension());
    println!("  endpoint:  {}", config.embeddings.endpoint);
    println!();
    println!("🤖 LLM:");
    println!("  model:    {}", config.llm_model());
    println!("  endpoint: {}", config.llm.endpoint);
    println!("  api key:  {}", mask(config.api_key()));
    println!();
    println!("🗄️  Vector store:");
    match config.supabase_url() {
        Ok(url) => println!("  url:            {url}"),
        Err(e) => println!("  url:            ❌ {e}"),
    }
    println!("  key:            {}", mask(config.supabase_key().ok()));
    println!("  collection:     {}", config.vector_store.collection_name);
    println!("  match function: {}", config.vector_store.match_function);
    println!(
        "  query log:      {}",
        config.vector_store.query_log_table.as_deref().unwrap_or("disabled")
    );
    println!();
    println!("🔎 Retrieval:");
    println!("  similarity threshold: {}", config.retrieval.similarity_threshold);
    println!("  max sources:          {}", config.retrieval.max_sources);
    println!();
    println!("🌐 Server: {}:{}", config.server.host, config.server.port);
    println!("⏳ Request timeout: {}s", config.http.request_timeout_secs);
    println!();

    match RagService::from_config(config, Arc::new(PerformanceTracker::new())) {
        Ok(_) => println!("✅ Configuration is complete"),
        Err(e) => println!("❌ Configuration is incomplete: {e}"),
    }
}

/// Show only the first few characters of a secret
fn mask(secret: Option<&str>) -> String {
    match secret {
        Some(s) if !s.is_empty() => {
            let prefix: String = s.chars().take(5).collect();
            format!("{prefix}... (set)")
        }
        _ => "not set".to_string(),
    }
}
