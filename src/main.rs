//! minwon-kiosk - touchscreen guide for family-registration forms.
//!
//! Reads display input lines from stdin and writes the screen state to stdout.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use minwon_kiosk::clock::TokioClock;
use minwon_kiosk::config::{Config, OutputFormat};
use minwon_kiosk::domain::FormCatalog;
use minwon_kiosk::input::LineSource;
use minwon_kiosk::kiosk;
use minwon_kiosk::present::{JsonPresenter, TextPresenter, write_catalog};
use minwon_kiosk::view::ViewController;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Family-registration form guide kiosk.
///
/// Reads `activity>>KIND`, `select>>FORM` and `close>>` lines from stdin and
/// prints the screen to stdout.
#[derive(Parser, Debug)]
#[command(name = "minwon-kiosk")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print JSON snapshots instead of text screens.
    #[arg(long)]
    json: bool,

    /// Print the form catalog and exit.
    #[arg(long)]
    list_forms: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        Config::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    if args.json {
        config.output = OutputFormat::Json;
    }

    let catalog = FormCatalog::builtin(&config.asset_dir);

    if args.list_forms {
        write_catalog(&mut io::stdout().lock(), &catalog).context("Failed to print forms")?;
        return Ok(());
    }

    init_logging(&args.log_level)?;

    info!("minwon-kiosk v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Idle timeout {:?}, return delay {:?}, modal auto-close {:?}",
        config.idle_timeout(),
        config.idle_return(),
        config.modal_auto_close()
    );

    for form in catalog.iter() {
        if !form.image.exists() {
            warn!("Guide image missing for '{}': {}", form.id.as_str(), form.image.display());
        }
    }

    let output = config.output;
    let view = ViewController::new(config, catalog, TokioClock);
    let source = LineSource::stdin();

    let handle = match output {
        OutputFormat::Text => kiosk::spawn(view, source, TextPresenter::new(io::stdout())),
        OutputFormat::Json => kiosk::spawn(view, source, JsonPresenter::new(io::stdout())),
    };

    let stop = handle.stop_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
            stop.cancel();
        }
    });

    handle.join().await
}

/// Initialize logging with the specified level.
///
/// Logs go to stderr; stdout carries the screen output.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(format!("minwon_kiosk={level}"))
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    Ok(())
}
