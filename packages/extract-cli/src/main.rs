//! CLI for running extraction templates
//!
//! Reads a template JSON file, extracts from one utterance (or one per stdin
//! line) and prints each `ExtractionResult` as a JSON line.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contract_extraction::ai::OpenAI;
use contract_extraction::{
    ExtractionRequest, ExtractionRuntime, ExtractionTemplate, IntentDefinition,
};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "extract")]
#[command(about = "Contract-driven extraction from free text")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract from text using a template
    Run {
        /// Path to the template JSON
        #[arg(long, short)]
        template: PathBuf,

        /// Utterance to extract from; one utterance per stdin line if absent
        #[arg(long)]
        text: Option<String>,
    },

    /// Validate a template and print its try order
    Check {
        #[arg(long, short)]
        template: PathBuf,
    },

    /// Rank intents for an utterance by embedding similarity
    Classify {
        /// Path to a JSON array of intent definitions
        #[arg(long)]
        intents: PathBuf,

        #[arg(long)]
        text: String,

        #[arg(long, default_value_t = 3)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,contract_extraction=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let runtime = build_runtime(&config);

    match cli.command {
        Commands::Run { template, text } => cmd_run(&runtime, &template, text).await,
        Commands::Check { template } => cmd_check(&runtime, &template),
        Commands::Classify { intents, text, top } => {
            cmd_classify(&runtime, &intents, &text, top).await
        }
    }
}

fn build_runtime(config: &Config) -> ExtractionRuntime {
    let runtime = ExtractionRuntime::new().with_config(config.runtime_config());

    let Some(api_key) = &config.openai_api_key else {
        info!("OPENAI_API_KEY not set; llm and embedding engines unavailable");
        return runtime;
    };

    let mut openai = OpenAI::new(api_key.clone());
    if let Some(model) = &config.openai_model {
        openai = openai.with_model(model.clone());
    }
    let openai = Arc::new(openai);

    runtime.with_llm(openai.clone()).with_embedder(openai)
}

fn read_template(path: &Path) -> Result<ExtractionTemplate> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template {}", path.display()))?;
    ExtractionTemplate::from_json(&json)
        .with_context(|| format!("Failed to parse template {}", path.display()))
}

async fn cmd_run(runtime: &ExtractionRuntime, path: &Path, text: Option<String>) -> Result<()> {
    let template = read_template(path)?;
    let plan = runtime.load(&template).context("Template failed validation")?;

    let utterances: Vec<String> = match text {
        Some(text) => vec![text],
        None => io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<_>>()
            .context("Failed to read stdin")?,
    };

    for text in utterances.into_iter().filter(|t| !t.trim().is_empty()) {
        let result = runtime.handle(&plan, &ExtractionRequest::new(text)).await;
        println!("{}", serde_json::to_string(&result)?);
    }

    Ok(())
}

fn cmd_check(runtime: &ExtractionRuntime, path: &Path) -> Result<()> {
    let template = read_template(path)?;
    let plan = runtime.load(&template).context("Template failed validation")?;

    let order: Vec<&str> = plan.try_order().iter().map(|e| e.as_str()).collect();
    println!("{}", serde_json::json!({ "valid": true, "tryOrder": order }));
    Ok(())
}

async fn cmd_classify(
    runtime: &ExtractionRuntime,
    path: &Path,
    text: &str,
    top: usize,
) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read intents {}", path.display()))?;
    let intents: Vec<IntentDefinition> =
        serde_json::from_str(&json).context("Failed to parse intents")?;

    let classification = runtime.classify(intents, text, top).await?;

    let top: Vec<_> = classification
        .top
        .iter()
        .map(|c| serde_json::json!({ "id": c.id, "score": c.score.final_score }))
        .collect();
    println!(
        "{}",
        serde_json::json!({
            "best": classification.best.as_ref().map(|c| c.id.as_str()),
            "top": top,
        })
    );
    Ok(())
}
