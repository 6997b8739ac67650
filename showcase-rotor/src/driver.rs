/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cooperative tick loop around the [`RotationScheduler`].
//!
//! ```text
//!  feed adapters ──mpsc<FeedUpdate>──┐
//!                                    ├──► RotationLoop (one tokio task) ──watch<DisplayView>──► renderer
//!  jump_to()     ──mpsc<Command>─────┘         owns RotationScheduler + FeedHealth
//! ```
//!
//! # Ordering
//! * Feed snapshots are buffered and applied at the start of the next tick,
//!   categories first, then the push-signal reset, then `advance`.  A
//!   renderer never sees a half-applied pair of feeds.
//! * Jumps are applied as soon as they are received and published at once.
//!   A snapshot still waiting for its tick is applied first, so a jump always
//!   resolves against the latest category list.
//! * Only one loop exists per driver.  `start()` while running is a no-op.
//!
//! # Lifecycle
//! `stop()` hands the loop state back to the driver, so a later `start()`
//! resumes with the same categories and position (the current dwell
//! restarts).  `dispose()`, or dropping the driver, aborts the loop.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::category::{normalize_snapshot, Category, CategoryRecord, DEFAULT_DISPLAY_DURATION};
use crate::config::DisplayConfig;
use crate::feed::{FeedHealth, FeedUpdate, DEFAULT_MAX_FEED_RETRIES};
use crate::rotation::{Advance, JumpTarget, RotationScheduler, RotationSnapshot};
use crate::theme::{layout_for, theme_for, LayoutKind, Theme};

/// Reads "now" from tokio's clock so paused-time tests drive the scheduler.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// `tokio::time::interval` panics on a zero period.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

// ── Settings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct DriverSettings {
    pub tick_interval: Duration,
    pub default_display_duration: Duration,
    pub max_feed_retries: u32,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(crate::config::DEFAULT_TICK_INTERVAL_MS),
            default_display_duration: DEFAULT_DISPLAY_DURATION,
            max_feed_retries: DEFAULT_MAX_FEED_RETRIES,
        }
    }
}

impl From<&DisplayConfig> for DriverSettings {
    fn from(cfg: &DisplayConfig) -> Self {
        Self {
            tick_interval: cfg.tick_interval(),
            default_display_duration: cfg.default_display_duration(),
            max_feed_retries: cfg.max_feed_retries,
        }
    }
}

// ── DisplayView ───────────────────────────────────────────────────────────────

/// Read-only state published to the renderer after every change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayView {
    pub current: Option<Category>,
    pub next: Option<Category>,
    /// Always within `[0, 1]`.
    pub progress: f64,
    pub current_index: usize,
    /// Active categories in display order, for jump targets and dots.
    pub categories: Vec<Category>,
    /// `true` while a feed keeps failing.  The rest of the view is the last
    /// good snapshot.
    pub connection_degraded: bool,
}

impl DisplayView {
    fn new(snapshot: RotationSnapshot, connection_degraded: bool) -> Self {
        Self {
            current: snapshot.current,
            next: snapshot.next,
            progress: snapshot.progress,
            current_index: snapshot.current_index,
            categories: snapshot.categories,
            connection_degraded,
        }
    }

    pub fn theme(&self) -> Theme {
        theme_for(self.current.as_ref())
    }

    /// `None` while there is nothing to show.
    pub fn layout(&self) -> Option<LayoutKind> {
        self.current.as_ref().map(layout_for)
    }
}

// ── Loop internals ────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Command {
    Jump(JumpTarget),
}

/// Everything the tick loop owns.  Lives inside the spawned task while
/// running and inside the driver while stopped.
struct RotationLoop {
    scheduler: RotationScheduler,
    health: FeedHealth,
    pending_categories: Option<Vec<(String, CategoryRecord)>>,
    default_duration: Duration,
    tick_interval: Duration,
    feed_rx: mpsc::UnboundedReceiver<FeedUpdate>,
    command_rx: mpsc::UnboundedReceiver<Command>,
    view_tx: watch::Sender<DisplayView>,
}

impl RotationLoop {
    async fn run(mut self, mut stop_rx: oneshot::Receiver<()>) -> Self {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                // Feeds before commands: a jump must see every snapshot sent
                // ahead of it.
                Some(update) = self.feed_rx.recv() => self.absorb(update),
                Some(cmd) = self.command_rx.recv() => self.handle_command(cmd),
                _ = ticker.tick() => self.tick(),
            }
        }

        self
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Jump(target) => {
                let now = now();
                self.apply_pending_categories(now);
                self.scheduler.jump_to(target, now);
            }
        }
        self.publish();
    }

    /// Records a feed delivery; the data itself waits for the next tick.
    fn absorb(&mut self, update: FeedUpdate) {
        let degraded_changed = self.health.record(&update);

        match update {
            FeedUpdate::Categories(records) => {
                debug!(records = records.len(), "Category snapshot queued");
                self.pending_categories = Some(records);
            }
            FeedUpdate::PushSignal(token) => {
                if self.scheduler.observe_push_signal(token) {
                    debug!("Rotation reset queued for next tick");
                }
            }
            FeedUpdate::Failed { .. } => {}
        }

        if degraded_changed {
            self.publish();
        }
    }

    fn tick(&mut self) {
        let now = now();
        self.apply_pending_categories(now);

        if let Advance::Reset = self.scheduler.advance(now) {
            debug!("Push-signal reset applied");
        }

        self.publish();
    }

    fn apply_pending_categories(&mut self, now: Instant) {
        if let Some(records) = self.pending_categories.take() {
            let categories = normalize_snapshot(records, self.default_duration);
            self.scheduler.replace_categories(categories, now);
        }
    }

    fn publish(&self) {
        let view = DisplayView::new(self.scheduler.snapshot(), self.health.is_degraded());
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}

struct Running {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<RotationLoop>,
}

// ── RotationDriver ────────────────────────────────────────────────────────────

/// Owns the rotation tick loop and its lifecycle.
///
/// # Example
/// ```rust,ignore
/// let mut driver = RotationDriver::new(DriverSettings::default());
/// tokio::spawn(FileFeed::new(path, poll).run(driver.feed_sender()));
/// let mut views = driver.subscribe();
/// driver.start();
/// while views.changed().await.is_ok() {
///     render(&views.borrow());
/// }
/// ```
pub struct RotationDriver {
    feed_tx: mpsc::UnboundedSender<FeedUpdate>,
    command_tx: mpsc::UnboundedSender<Command>,
    view_rx: watch::Receiver<DisplayView>,
    parked: Option<RotationLoop>,
    running: Option<Running>,
}

impl RotationDriver {
    /// Builds a stopped driver.  Nothing ticks until [`start`](Self::start).
    ///
    /// A tick interval below 1 ms is raised to 1 ms.
    pub fn new(settings: DriverSettings) -> Self {
        let (feed_tx, feed_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(DisplayView::default());

        let state = RotationLoop {
            scheduler: RotationScheduler::new(now()),
            health: FeedHealth::new(settings.max_feed_retries),
            pending_categories: None,
            default_duration: settings.default_display_duration,
            tick_interval: settings.tick_interval.max(MIN_TICK_INTERVAL),
            feed_rx,
            command_rx,
            view_tx,
        };

        Self {
            feed_tx,
            command_tx,
            view_rx,
            parked: Some(state),
            running: None,
        }
    }

    /// Sender for feed adapters.  Clone freely; one per adapter is typical.
    pub fn feed_sender(&self) -> mpsc::UnboundedSender<FeedUpdate> {
        self.feed_tx.clone()
    }

    /// Receiver of published views.
    pub fn subscribe(&self) -> watch::Receiver<DisplayView> {
        self.view_rx.clone()
    }

    /// The most recently published view.
    pub fn view(&self) -> DisplayView {
        self.view_rx.borrow().clone()
    }

    /// Requests a jump.  Applied by the loop as soon as it runs.
    pub fn jump_to(&self, target: impl Into<JumpTarget>) {
        let target = target.into();
        if self.command_tx.send(Command::Jump(target.clone())).is_err() {
            warn!(jump = ?target, "Rotation loop is gone, jump dropped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Spawns the tick loop on the current tokio runtime.
    ///
    /// Returns `false` without side effects if the loop is already running.
    pub fn start(&mut self) -> bool {
        if self.running.is_some() {
            debug!("Rotation loop already running");
            return false;
        }
        let Some(mut state) = self.parked.take() else {
            warn!("Rotation loop state was lost, cannot start");
            return false;
        };

        state.scheduler.restart_cycle(now());
        let tick_ms = state.tick_interval.as_millis() as u64;

        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(state.run(stop_rx));
        self.running = Some(Running { stop_tx, handle });

        info!(tick_ms, "Rotation loop started");
        true
    }

    /// Stops the tick loop and waits for it to finish.
    ///
    /// Returns `false` if it was not running.
    pub async fn stop(&mut self) -> bool {
        let Some(Running { stop_tx, handle }) = self.running.take() else {
            return false;
        };

        // The loop may already be gone; the join below reports that.
        let _ = stop_tx.send(());

        match handle.await {
            Ok(state) => {
                self.parked = Some(state);
                info!("Rotation loop stopped");
                true
            }
            Err(e) => {
                error!(error = %e, "Rotation loop terminated abnormally");
                false
            }
        }
    }

    /// Tears the driver down, aborting the loop if it is running.
    pub fn dispose(self) {
        info!(running = self.is_running(), "Disposing rotation driver");
        // Drop does the work.
    }
}

impl Drop for RotationDriver {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.handle.abort();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
