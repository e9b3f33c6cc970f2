use anyhow::{Context, Result};
use clap::Parser;
use feedspec::checks::check_interpreter::DisplayCheckInterpreter;
use feedspec::checks::report::CheckOutcome;
use feedspec::checks::suite::{Suite, SuiteRunner, standard_suites};
use feedspec::config::{Cli, ReportFormat};
use feedspec::display::FeedDisplay;
use feedspec::entry_factory::EntryFactory;
use feedspec::event::RunEvent;
use feedspec::feed_download::{FeedFetcher, HttpFeedFetcher};
use feedspec::feed_loader::RenderingFeedLoader;
use feedspec::logging;
use log::{error, info, warn};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.resolve_config().context("Invalid configuration")?;
    logging::init_logging(config.log_level_filter()?, config.log_file.as_deref())
        .context("Failed to initialise logging")?;

    // A catalog that cannot be loaded is reported by the checks, not treated as fatal.
    let catalog = match config.load_catalog() {
        Ok(catalog) => {
            info!("Loaded feed catalog with {} feeds", catalog.len());
            Some(Arc::new(catalog))
        }
        Err(e) => {
            error!("Feed catalog is unavailable: {}", e);
            None
        }
    };

    let display = Arc::new(FeedDisplay::new());
    let fetcher: Arc<dyn FeedFetcher + Send + Sync> =
        Arc::new(HttpFeedFetcher::new(config.fetch_timeout())?);
    let mut factory = EntryFactory::new();
    if let Some(limit) = config.entry_limit {
        factory = factory.with_entry_limit(limit);
    }
    let loader = Arc::new(RenderingFeedLoader::new(
        catalog.clone().unwrap_or_default(),
        fetcher,
        display.clone(),
        factory,
    ));

    let interpreter = DisplayCheckInterpreter::new(catalog, loader, display)
        .with_load_timeout(config.load_timeout());

    let (event_tx, mut event_rx) = broadcast::channel::<RunEvent>(64);
    let progress = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(RunEvent::CheckStarted { suite, description, .. }) => {
                    info!("Running: {} {}", suite, description);
                }
                Ok(RunEvent::CheckFinished { result, .. }) => match result.outcome {
                    CheckOutcome::Passed => {
                        info!("Passed: {} ({} ms)", result.description, result.elapsed_ms)
                    }
                    CheckOutcome::Failed { .. } => {
                        warn!("Failed: {} ({} ms)", result.description, result.elapsed_ms)
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Progress output skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut suites: Vec<Suite> = standard_suites();
    if let Some(pattern) = &config.filter {
        suites = suites.into_iter().map(|suite| suite.filtered(pattern)).collect();
    }

    let mut runner = SuiteRunner::new(interpreter).with_events(event_tx);
    let report = runner.run(&suites).await;
    drop(runner);
    if let Err(e) = progress.await {
        warn!("Progress task ended abnormally: {}", e);
    }

    match config.format {
        ReportFormat::Text => println!("{}", report),
        ReportFormat::Json => println!("{}", report.to_json()?),
    }

    if report.all_passed() { Ok(ExitCode::SUCCESS) } else { Ok(ExitCode::FAILURE) }
}
