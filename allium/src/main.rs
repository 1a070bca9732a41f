mod config;
mod errors;
mod pipeline;

use clap::Parser;
use config::{Config, LoggingConfig, MetricsConfig};
use errors::{AlliumError, Result};
use metrics_exporter_statsd::StatsdBuilder;
use pipeline::RunOutcome;
use relays::timestamp::{FilesystemTimestampStore, NoopTimestampStore, TimestampStore};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use url::Url;

/// Generates a static site describing the Tor relays listed by Onionoo.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// YAML config file. Without one the built-in defaults are used
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory, overrides site.output_root
    #[arg(long)]
    out: Option<PathBuf>,

    /// Onionoo details URL, overrides onionoo.url
    #[arg(long)]
    onionoo_url: Option<Url>,

    /// Ignore the stored freshness token and always fetch
    #[arg(long)]
    force: bool,
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("allium: {err}");
            process::exit(1);
        }
    };

    let sentry = init_logging(&config.logging);

    let result = match &config.metrics {
        Some(metrics) => init_metrics(metrics),
        None => Ok(()),
    }
    .and_then(|()| run(&config, cli.force));

    match result {
        Ok(RunOutcome::NotModified) => {}
        Ok(RunOutcome::Written { relays, pages }) => {
            tracing::info!(relays, pages, output_root = ?config.site.output_root, "Site updated");
        }
        Err(err) => {
            tracing::error!(error = %err, "Run failed");
            drop(sentry);
            process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(out) = &cli.out {
        config.site.output_root = out.clone();
    }
    if let Some(url) = &cli.onionoo_url {
        config.onionoo.url = url.clone();
    }

    Ok(config)
}

fn init_logging(config: &LoggingConfig) -> Option<sentry::ClientInitGuard> {
    let guard = config
        .sentry_dsn
        .as_deref()
        .and_then(|dsn| dsn.parse::<sentry::types::Dsn>().ok())
        .map(|dsn| {
            sentry::init(sentry::ClientOptions {
                dsn: Some(dsn),
                release: sentry::release_name!(),
                ..Default::default()
            })
        });

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(guard.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .init();

    guard
}

fn init_metrics(config: &MetricsConfig) -> Result<()> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some("allium"))
        .map_err(|err| AlliumError::Metrics(err.to_string()))?;
    metrics::set_global_recorder(recorder).map_err(|err| AlliumError::Metrics(err.to_string()))?;
    relays::metrics_defs::describe_all();

    tracing::debug!(host = %config.statsd_host, port = config.statsd_port, "Metrics enabled");
    Ok(())
}

fn run(config: &Config, force: bool) -> Result<RunOutcome> {
    let store: Box<dyn TimestampStore> = if force {
        Box::new(NoopTimestampStore)
    } else {
        Box::new(FilesystemTimestampStore::new(&config.onionoo.timestamp_file))
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(pipeline::run(config, store.as_ref()))
}
