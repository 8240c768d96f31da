use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docsift::cache::{ExtractionCache, SidecarCache};
use docsift::config::Config;
use docsift::models::{ExtractionOutcome, SourceFile};
use docsift::processing::{ExtractionEvent, ExtractionOrchestrator};

#[derive(Parser)]
#[command(name = "docsift")]
#[command(about = "Extract text from documents with OCR fallback and sidecar caching")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract text and cache it beside each source file
    Extract {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Never call the OCR service
        #[arg(long)]
        no_ocr: bool,
        /// Ignore existing cache records
        #[arg(long)]
        force: bool,
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
        /// Print extracted text to stdout
        #[arg(long)]
        print: bool,
    },
    /// Show the cache record for a file
    Show { path: PathBuf },
    /// Delete cache records
    Clear {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docsift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();

    match args.command {
        Command::Extract {
            paths,
            no_ocr,
            force,
            concurrency,
            print,
        } => extract(&config, paths, no_ocr, force, concurrency, print).await,
        Command::Show { path } => show(&path).await,
        Command::Clear { paths } => clear(&paths).await,
    }
}

async fn extract(
    config: &Config,
    paths: Vec<PathBuf>,
    no_ocr: bool,
    force: bool,
    concurrency: usize,
    print: bool,
) -> anyhow::Result<()> {
    let mut settings = config.extraction.clone();
    if no_ocr {
        settings.auto_apply_ocr = false;
    }

    let (sources, unreadable) = load_sources(&paths).await;

    tracing::info!("Initializing OCR provider: {}...", config.ocr.model);
    let orchestrator = ExtractionOrchestrator::from_config(config);

    let mut events = orchestrator.subscribe();
    tokio::spawn(async move {
        while let Ok(ExtractionEvent::Cached {
            source,
            cache_location,
            method,
        }) = events.recv().await
        {
            tracing::debug!(
                "Cached {} ({}) at {}",
                source.display(),
                method,
                cache_location.display()
            );
        }
    });

    let cancel_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel_token.clone()));

    let results = orchestrator
        .extract_many(sources, &settings, concurrency, !force, &cancel_token)
        .await;

    let mut failures = unreadable;
    for (source, outcome) in &results {
        report(source, outcome, print);
        if !outcome.result.is_success() {
            failures += 1;
        }
    }

    check_failures(failures, paths.len())
}

/// Stats every path, returning the readable sources and how many were skipped.
async fn load_sources(paths: &[PathBuf]) -> (Vec<SourceFile>, usize) {
    let mut sources = Vec::with_capacity(paths.len());
    let mut unreadable = 0;
    for path in paths {
        match SourceFile::from_path(path).await {
            Ok(source) => sources.push(source),
            Err(e) => {
                tracing::error!("Skipping {}: {}", path.display(), e);
                unreadable += 1;
            }
        }
    }
    (sources, unreadable)
}

fn check_failures(failures: usize, total: usize) -> anyhow::Result<()> {
    if failures > 0 {
        anyhow::bail!("{failures} of {total} files produced no text");
    }
    Ok(())
}

fn report(source: &SourceFile, outcome: &ExtractionOutcome, print: bool) {
    let result = &outcome.result;
    match result.failure_reason() {
        None => {
            let chars = result.text.as_deref().map_or(0, |t| t.chars().count());
            println!("ok\t{}\t{}\t{} chars", source.path.display(), result.method, chars);
            if print {
                if let Some(text) = &result.text {
                    println!("{text}");
                }
            }
        }
        Some(reason) => match &result.error {
            Some(e) => println!("{reason}\t{}\t{e}", source.path.display()),
            None => println!("{reason}\t{}", source.path.display()),
        },
    }
}

async fn show(path: &Path) -> anyhow::Result<()> {
    let source = SourceFile::from_path(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let Some(record) = SidecarCache::new().load(&source).await else {
        println!("No readable cache record for {}", path.display());
        return Ok(());
    };

    println!("{}", serde_json::to_string_pretty(&record)?);
    if record.is_valid_for(&source) {
        println!("status: valid");
    } else {
        println!("status: stale (source modified {})", source.modified.to_rfc3339());
    }
    Ok(())
}

async fn clear(paths: &[PathBuf]) -> anyhow::Result<()> {
    let cache = SidecarCache::new();
    for path in paths {
        let source = SourceFile::new(path.clone(), 0, chrono::Utc::now());
        match cache.remove(&source).await {
            Ok(true) => println!("removed\t{}", path.display()),
            Ok(false) => println!("absent\t{}", path.display()),
            Err(e) => tracing::error!("Failed to remove cache for {}: {}", path.display(), e),
        }
    }
    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling extraction...");
    cancel_token.cancel();
}
