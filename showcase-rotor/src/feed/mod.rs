/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! External observation adapter contract.
//!
//! Two independent feeds reach the display:
//!
//! ```text
//! categories collection ──► FeedUpdate::Categories ─┐
//!                                                   ├─► RotationDriver (applied per tick)
//! settings/display doc  ──► FeedUpdate::PushSignal ─┘
//!            (either)   ──► FeedUpdate::Failed     ──► FeedHealth ──► degraded flag
//! ```
//!
//! Adapters deliver the *latest* full value at least once; intermediate values
//! may be skipped.  A failure never clears what was delivered before.

pub mod error;
pub mod file;

pub use error::FeedError;

use tracing::{error, info, warn};

use crate::category::CategoryRecord;
use crate::signal::PushSignal;

/// Consecutive failures on one source before the display is flagged degraded.
pub const DEFAULT_MAX_FEED_RETRIES: u32 = 3;

// ── Updates ───────────────────────────────────────────────────────────────────

/// Which upstream feed an update or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedSource {
    Categories,
    Settings,
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedSource::Categories => f.write_str("categories"),
            FeedSource::Settings => f.write_str("settings"),
        }
    }
}

/// One delivery from an adapter.
#[derive(Debug)]
pub enum FeedUpdate {
    /// Full snapshot of the category collection, keyed by document id.
    /// Inactive records are included; the driver filters them.
    Categories(Vec<(String, CategoryRecord)>),

    /// Latest push-signal value.  `None` when the settings document or its
    /// field is absent.
    PushSignal(Option<PushSignal>),

    /// The adapter could not deliver a fresh value for `source`.
    Failed { source: FeedSource, error: FeedError },
}

impl FeedUpdate {
    /// The source this update reports on.
    pub fn source(&self) -> FeedSource {
        match self {
            FeedUpdate::Categories(_) => FeedSource::Categories,
            FeedUpdate::PushSignal(_) => FeedSource::Settings,
            FeedUpdate::Failed { source, .. } => *source,
        }
    }
}

// ── FeedHealth ────────────────────────────────────────────────────────────────

/// Tracks consecutive delivery failures per source.
///
/// A source is degraded once it has failed `max_retries` times in a row.  A
/// successful delivery clears that source's counter only, so a healthy
/// categories feed cannot hide a broken settings feed.
#[derive(Debug, Clone)]
pub struct FeedHealth {
    max_retries: u32,
    category_failures: u32,
    settings_failures: u32,
}

impl Default for FeedHealth {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEED_RETRIES)
    }
}

impl FeedHealth {
    /// `max_retries` of zero is treated as one: a single failure degrades.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
            category_failures: 0,
            settings_failures: 0,
        }
    }

    /// Updates the counters for one delivery.  Returns `true` when the
    /// overall degraded flag flipped.
    pub fn record(&mut self, update: &FeedUpdate) -> bool {
        let was_degraded = self.is_degraded();

        match update {
            FeedUpdate::Failed { source, error: e } => {
                let count = self.counter_mut(*source);
                *count = count.saturating_add(1);
                error!(
                    source = %source,
                    consecutive = *count,
                    error = %e,
                    "Feed delivery failed"
                );
            }
            ok => *self.counter_mut(ok.source()) = 0,
        }

        let now_degraded = self.is_degraded();
        if now_degraded != was_degraded {
            if now_degraded {
                warn!(
                    category_failures = self.category_failures,
                    settings_failures = self.settings_failures,
                    "Feed connection degraded, keeping last good snapshot"
                );
            } else {
                info!("Feed connection restored");
            }
        }
        now_degraded != was_degraded
    }

    pub fn is_degraded(&self) -> bool {
        self.category_failures >= self.max_retries || self.settings_failures >= self.max_retries
    }

    /// Consecutive failures recorded for `source`.
    pub fn failures(&self, source: FeedSource) -> u32 {
        match source {
            FeedSource::Categories => self.category_failures,
            FeedSource::Settings => self.settings_failures,
        }
    }

    fn counter_mut(&mut self, source: FeedSource) -> &mut u32 {
        match source {
            FeedSource::Categories => &mut self.category_failures,
            FeedSource::Settings => &mut self.settings_failures,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
