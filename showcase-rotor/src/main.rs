/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use showcase_rotor::config::DisplayConfig;
use showcase_rotor::driver::{DisplayView, DriverSettings, RotationDriver};
use showcase_rotor::feed::file::FileFeed;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Showcase rotor – headless rotation runtime for the signage display.
///
/// Example:
///   showcase-rotor --feed showcase-rotor/demos/feed.yaml --run-for 120
#[derive(Debug, Parser)]
#[command(
    name = "showcase-rotor",
    about = "Showcase rotor – category rotation for the signage display",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML display configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Feed document to observe (overrides `feed_path` from the config).
    #[arg(short = 'f', long = "feed")]
    feed: Option<PathBuf>,

    /// Tick interval in milliseconds (overrides `tick_interval_ms`).
    #[arg(short = 't', long = "tick-ms")]
    tick_ms: Option<u64>,

    /// Stop after this many seconds instead of waiting for Ctrl-C.
    #[arg(short = 'r', long = "run-for")]
    run_for: Option<u64>,
}

// ── View logging ──────────────────────────────────────────────────────────────

/// Logs what a renderer would redraw: category changes and connection state.
async fn log_views(mut views: watch::Receiver<DisplayView>) {
    let mut last_id: Option<String> = None;
    let mut last_degraded = false;

    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();

        let id = view.current.as_ref().map(|c| c.id.clone());
        if id != last_id {
            match &view.current {
                Some(current) => {
                    let theme = view.theme();
                    info!(
                        category = %current.name,
                        id = %current.id,
                        index = view.current_index,
                        of = view.categories.len(),
                        dwell_secs = current.display_duration.as_secs_f64(),
                        next = ?view.next.as_ref().map(|c| c.name.as_str()),
                        layout = ?view.layout(),
                        accent = theme.accent,
                        "Now showing"
                    );
                }
                None => warn!("No active categories, waiting for products…"),
            }
            last_id = id;
        }

        if view.connection_degraded != last_degraded {
            if view.connection_degraded {
                warn!("Connection lost, displaying last known data");
            } else {
                info!("Connection restored");
            }
            last_degraded = view.connection_degraded;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Showcase rotor starting up...");

    // ── Parse CLI arguments ───────────────────────────────────────────────────
    let cli = Cli::parse();

    // ── Load display configuration ────────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => match DisplayConfig::load_from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("Failed to load display configuration: {:#}", e);
                process::exit(1);
            }
        },
        None => {
            warn!("No configuration file provided, using default display settings");
            DisplayConfig::default()
        }
    };

    if let Some(feed) = cli.feed {
        config.feed_path = Some(feed);
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.tick_interval_ms = tick_ms;
    }
    if let Err(e) = config.validate() {
        error!("Invalid display configuration: {:#}", e);
        process::exit(1);
    }

    info!(
        tick_ms       = config.tick_interval_ms,
        feed_path     = ?config.feed_path,
        feed_poll_ms  = config.feed_poll_interval_ms,
        max_retries   = config.max_feed_retries,
        run_for_secs  = ?cli.run_for,
        "Configuration"
    );

    // ── Wire driver and feed ──────────────────────────────────────────────────
    let mut driver = RotationDriver::new(DriverSettings::from(&config));
    let logger = tokio::spawn(log_views(driver.subscribe()));

    match &config.feed_path {
        Some(path) => {
            let feed = FileFeed::new(path.clone(), config.feed_poll_interval());
            tokio::spawn(feed.run(driver.feed_sender()));
        }
        None => warn!("No feed document configured, display will stay empty"),
    }

    driver.start();

    // ── Run until Ctrl-C or the time limit ────────────────────────────────────
    let shutdown = async {
        match cli.run_for {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Cannot listen for Ctrl-C: {}", e);
                }
            }
        }
    };
    shutdown.await;

    info!("Shutting down...");
    driver.stop().await;
    driver.dispose();
    logger.abort();
}
