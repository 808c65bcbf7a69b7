mod cli;
mod config;
mod db;
mod documents;
mod errors;
mod extraction;
mod llm_client;
mod pipeline;
mod profile;
mod scoring;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::cli::{Cli, Command, ScorerKind, ScoringArgs};
use crate::config::Config;
use crate::db::{create_pool, PgResumeStore};
use crate::documents::FileDocumentReader;
use crate::extraction::ExtractionClient;
use crate::llm_client::{GeminiClient, TextModel};
use crate::pipeline::output::CsvSink;
use crate::pipeline::worklist::CsvWorklist;
use crate::pipeline::{BatchPipeline, Pacing, UniformJitter};
use crate::profile::dates::DatePoint;
use crate::scoring::{KeywordMatchScorer, LlmMatchScorer, MatchScorer, ScoringStyle};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the model client
    let gemini = GeminiClient::new(config.google_api_key.clone(), config.model.clone())?;
    info!("Model client initialized (model: {})", gemini.model());
    let model: Arc<dyn TextModel> = Arc::new(gemini);

    let summary = match cli.command {
        Command::Run(args) => {
            let pipeline = build_pipeline(&config, model, &args.scoring);
            let source = CsvWorklist::new(args.input);
            let mut sink = CsvSink::new(args.output);
            pipeline.execute(&source, &mut sink).await?
        }
        Command::Db(args) => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the db command")?;
            let store = Arc::new(PgResumeStore::new(create_pool(database_url).await?));

            let pipeline = build_pipeline(&config, model, &args.scoring).with_store(store.clone());
            let mut sink = CsvSink::new(args.output);
            pipeline.execute(store.as_ref(), &mut sink).await?
        }
    };

    info!(
        "Batch finished: {} scored, {} failed",
        summary.scored, summary.failed
    );
    Ok(())
}

/// Wires the reader, extractor, chosen scorer and pacing into one pipeline.
fn build_pipeline(config: &Config, model: Arc<dyn TextModel>, args: &ScoringArgs) -> BatchPipeline {
    let extractor = ExtractionClient::new(model.clone());

    let scorer: Arc<dyn MatchScorer> = match args.scorer {
        ScorerKind::Explainable => Arc::new(LlmMatchScorer::new(model, ScoringStyle::Explainable)),
        ScorerKind::Basic => Arc::new(LlmMatchScorer::new(model, ScoringStyle::Basic)),
        ScorerKind::Keyword => Arc::new(KeywordMatchScorer::new(extractor.clone())),
    };
    info!("Match scorer: {}", scorer.backend());

    let pacing = if args.no_pacing {
        Pacing::disabled()
    } else {
        Pacing::exponential(config.pacing_cap_secs)
    };

    let pipeline = BatchPipeline::new(Arc::new(FileDocumentReader), extractor, scorer)
        .with_pacing(pacing)
        .with_jitter(Arc::new(UniformJitter));

    match args.as_of {
        Some(day) => pipeline.with_reference_date(DatePoint::from(day)),
        None => pipeline,
    }
}
