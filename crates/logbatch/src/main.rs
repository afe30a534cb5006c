// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! logbatch CLI
//!
//! Consumes newline-delimited JSON log records and writes them to a SQLite
//! document collection in batches.
//!
//! # Usage
//!
//! ```bash
//! # Consume stdin until it closes or stays quiet for 3 seconds
//! producer | logbatch --db logs.db run
//!
//! # Consume a file with a larger batch, never stopping on idle
//! logbatch --db logs.db --collection audit run --input audit.jsonl --batch-size 500 --keep-running
//!
//! # Using configuration file
//! logbatch --config logbatch.toml run
//!
//! # Inspect the collection
//! logbatch --db logs.db count
//! logbatch --db logs.db dump --limit 20
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logbatch::{
    BatchConsumer, DocumentSink, DocumentStore, IdlePolicy, Inbound, LineSource, MemoryStore,
    RunReport, ServiceConfig, SqliteStore,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "logbatch")]
#[command(about = "Batching queue consumer - persists log records in bounded batches", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "LOGBATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Database path (SQLite file)
    #[arg(long, env = "LOGBATCH_DB")]
    db: Option<String>,

    /// Collection receiving the documents
    #[arg(long, env = "LOGBATCH_COLLECTION")]
    collection: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Consume payloads until the input closes or goes idle
    Run {
        /// Input file, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Records per batch
        #[arg(long, env = "LOGBATCH_BATCH_SIZE")]
        batch_size: Option<usize>,

        /// Idle timeout in milliseconds
        #[arg(long, env = "LOGBATCH_IDLE_TIMEOUT_MS")]
        idle_timeout_ms: Option<u64>,

        /// Flush on idle instead of stopping; run until the input closes
        #[arg(long)]
        keep_running: bool,

        /// Keep documents in memory instead of writing the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the number of stored documents
    Count,
    /// Print stored documents as JSON lines
    Dump {
        /// Maximum number of documents to print
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ServiceConfig::default(),
    };

    if let Some(db) = &args.db {
        config.store.path = db.clone();
    }
    if let Some(collection) = &args.collection {
        config.store.collection = collection.clone();
    }

    match args.command {
        Commands::Run {
            input,
            batch_size,
            idle_timeout_ms,
            keep_running,
            dry_run,
        } => {
            if let Some(size) = batch_size {
                config.consumer.batch_size = size;
            }
            if let Some(ms) = idle_timeout_ms {
                config.consumer.idle_timeout_ms = ms;
            }
            if keep_running {
                config.consumer.idle_policy = IdlePolicy::FlushAndContinue;
            }
            config.validate().context("Invalid configuration")?;

            let store: Box<dyn DocumentStore> = if dry_run {
                tracing::info!("Dry run: documents are kept in memory");
                Box::new(MemoryStore::new(&config.store.collection)?)
            } else {
                Box::new(open_store(&config)?)
            };

            tracing::info!("logbatch starting...");
            tracing::info!("  Input: {}", input);
            tracing::info!("  Database: {}", config.store.path);
            tracing::info!("  Collection: {}", config.store.collection);

            let report = if input == "-" {
                consume(&config, LineSource::stdin(), store).await?
            } else {
                let source = LineSource::open(&input)
                    .await
                    .with_context(|| format!("Failed to open input {}", input))?;
                consume(&config, source, store).await?
            };

            print_report(&report);
        }
        Commands::Count => {
            config.validate().context("Invalid configuration")?;
            let store = open_store(&config)?;
            println!(
                "Documents in '{}': {}",
                store.collection(),
                store.count()?
            );
        }
        Commands::Dump { limit } => {
            config.validate().context("Invalid configuration")?;
            let store = open_store(&config)?;
            let documents = store.load()?;
            let limit = limit.unwrap_or(documents.len());
            for doc in documents.iter().take(limit) {
                println!("{}", serde_json::to_string(doc)?);
            }
        }
    }

    Ok(())
}

fn open_store(config: &ServiceConfig) -> Result<SqliteStore> {
    SqliteStore::new(&config.store.path, &config.store.collection).with_context(|| {
        format!(
            "Failed to open collection '{}' in {}",
            config.store.collection, config.store.path
        )
    })
}

async fn consume<I: Inbound>(
    config: &ServiceConfig,
    inbound: I,
    store: Box<dyn DocumentStore>,
) -> Result<RunReport> {
    let consumer = BatchConsumer::new(config.consumer_config(), inbound, DocumentSink::new(store))?;
    Ok(consumer.run().await)
}

fn print_report(report: &RunReport) {
    println!("Run finished: {}", report.termination);
    println!("  Elapsed: {:.3}s", report.elapsed.as_secs_f64());
    println!("  Records received: {}", report.stats.records_received);
    println!("  Records dropped (decode): {}", report.stats.records_dropped);
    println!("  Records persisted: {}", report.stats.records_persisted);
    println!(
        "  Batches flushed: {} ({} failed, {} records lost)",
        report.stats.batches_flushed, report.stats.batches_failed, report.stats.records_lost
    );
}
