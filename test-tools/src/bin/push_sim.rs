/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Admin-panel simulator: edits a feed document the way the CMS would and
//! stamps a fresh push signal so running displays restart their rotation.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use showcase_rotor::category::CategoryRecord;
use showcase_rotor::feed::file::FeedDocument;
use showcase_rotor::signal::PushSignal;

#[derive(Debug, Parser)]
#[command(name = "push-sim", about = "Admin panel simulator for the showcase rotor")]
struct Cli {
    /// Feed document to edit.
    #[arg(short = 'f', long = "feed")]
    feed: PathBuf,

    /// Mark a category active (repeatable).
    #[arg(long = "activate")]
    activate: Vec<String>,

    /// Mark a category inactive (repeatable).
    #[arg(long = "deactivate")]
    deactivate: Vec<String>,

    /// Set a category's dwell, as `<id>=<seconds>` (repeatable).
    #[arg(long = "duration", value_parser = parse_duration_arg)]
    duration: Vec<(String, f64)>,

    /// Edit only; leave `lastPushed` untouched.
    #[arg(long = "no-push", default_value_t = false)]
    no_push: bool,
}

fn parse_duration_arg(s: &str) -> Result<(String, f64), String> {
    let (id, secs) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <id>=<seconds>, got '{s}'"))?;
    let secs: f64 = secs
        .parse()
        .map_err(|e| format!("invalid seconds in '{s}': {e}"))?;
    Ok((id.to_string(), secs))
}

fn category_mut<'a>(doc: &'a mut FeedDocument, id: &str) -> &'a mut CategoryRecord {
    doc.categories.entry(id.to_string()).or_insert_with(|| {
        warn!(id, "Category not in feed document, creating it");
        CategoryRecord::default()
    })
}

fn epoch_millis() -> Result<i64> {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the Unix epoch")?
        .as_millis();
    i64::try_from(ms).map_err(|_| anyhow!("epoch millis overflow i64"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut doc = FeedDocument::load(&cli.feed)
        .with_context(|| format!("Cannot load feed document {}", cli.feed.display()))?;

    for id in &cli.activate {
        category_mut(&mut doc, id).active = Some(true);
        info!(id = %id, "Activated");
    }
    for id in &cli.deactivate {
        category_mut(&mut doc, id).active = Some(false);
        info!(id = %id, "Deactivated");
    }
    for (id, secs) in &cli.duration {
        let rec = category_mut(&mut doc, id);
        rec.display_duration = Some(*secs);
        rec.duration = Some(*secs);
        info!(id = %id, secs, "Dwell updated");
    }

    if cli.no_push {
        info!("Skipping push signal");
    } else {
        let token = PushSignal::Int(epoch_millis()?);
        info!(previous = ?doc.last_pushed(), current = %token, "Pushing to displays");
        doc.set_last_pushed(token);
    }

    doc.save(&cli.feed)
        .with_context(|| format!("Cannot save feed document {}", cli.feed.display()))?;

    info!(
        path = %cli.feed.display(),
        categories = doc.categories.len(),
        active = doc.categories.values().filter(|c| c.is_active()).count(),
        "Feed document written"
    );
    Ok(())
}
