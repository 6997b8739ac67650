/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Category rotation scheduler.
//!
//! [`RotationScheduler`] cycles through the active [`Category`] list, keeping
//! each one on screen for its own dwell and reporting a clamped progress
//! fraction for the renderer's progress bar.  It is a total state machine:
//! every input is clamped or wrapped, nothing returns an error.
//!
//! # State transitions
//!
//! | Trigger | Effect |
//! |---|---|
//! | [`advance`](RotationScheduler::advance), progress < 1 | progress updated |
//! | [`advance`](RotationScheduler::advance), progress ≥ 1 | index → next, origin → now, progress → 0 |
//! | [`advance`](RotationScheduler::advance), reset pending | index → 0, origin → now, no rotation this tick |
//! | [`jump_to`](RotationScheduler::jump_to) | index → target (or 0), origin → now, progress → 0 |
//! | [`replace_categories`](RotationScheduler::replace_categories) | list swapped, index wrapped by modulo |
//!
//! Time is injected: every method that needs "now" takes an [`Instant`], so
//! the scheduler never reads a clock itself and tests are deterministic.
//!
//! # Example
//! ```rust
//! use std::time::{Duration, Instant};
//! use showcase_rotor::category::Category;
//! use showcase_rotor::rotation::RotationScheduler;
//!
//! let t0 = Instant::now();
//! let mut sched = RotationScheduler::new(t0);
//! sched.replace_categories(
//!     vec![
//!         Category::new("a", "A", 1, Duration::from_secs(10)),
//!         Category::new("b", "B", 2, Duration::from_secs(5)),
//!     ],
//!     t0,
//! );
//!
//! sched.advance(t0 + Duration::from_secs(10));
//! assert_eq!(sched.current().unwrap().id, "b");
//! assert_eq!(sched.progress(), 0.0);
//! ```

pub mod progress;

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::category::Category;
use crate::signal::{PushSignal, PushTracker};

use progress::{next_index, progress_fraction, wrap_index};

// ── Public types ──────────────────────────────────────────────────────────────

/// Where a manual jump should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JumpTarget {
    /// Position in the current (active, sorted) list.
    Index(usize),
    /// Category id.
    Id(String),
}

impl From<usize> for JumpTarget {
    fn from(i: usize) -> Self {
        JumpTarget::Index(i)
    }
}

impl From<&str> for JumpTarget {
    fn from(id: &str) -> Self {
        JumpTarget::Id(id.to_string())
    }
}

impl From<String> for JumpTarget {
    fn from(id: String) -> Self {
        JumpTarget::Id(id)
    }
}

/// What a single [`RotationScheduler::advance`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// No categories; nothing to do.
    Idle,
    /// Progress recomputed, same category.
    Progressed,
    /// Dwell elapsed; moved from one index to the next.
    Rotated { from: usize, to: usize },
    /// A pending push-signal reset was applied instead of advancing.
    Reset,
}

/// Point-in-time copy of everything a renderer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationSnapshot {
    pub current: Option<Category>,
    pub next: Option<Category>,
    /// Always within `[0, 1]`.
    pub progress: f64,
    pub current_index: usize,
    pub categories: Vec<Category>,
}

impl Default for RotationSnapshot {
    fn default() -> Self {
        Self {
            current: None,
            next: None,
            progress: 0.0,
            current_index: 0,
            categories: Vec::new(),
        }
    }
}

// ── RotationScheduler ─────────────────────────────────────────────────────────

/// Owns the transient rotation state.
///
/// Only this struct mutates its fields; renderers read through
/// [`snapshot`](Self::snapshot) or the accessors.
#[derive(Debug)]
pub struct RotationScheduler {
    /// Active categories sorted by order, replaced wholesale on every feed
    /// snapshot.
    categories: Vec<Category>,

    /// Always `< categories.len()` when the list is non-empty.
    current_index: usize,

    /// When the current category's dwell started.
    cycle_start: Instant,

    /// Last computed progress, in `[0, 1]`.
    progress: f64,

    push: PushTracker,

    /// Set by a push-signal change, consumed by the next `advance`.
    reset_pending: bool,
}

impl RotationScheduler {
    /// Creates an idle scheduler with no categories.
    pub fn new(now: Instant) -> Self {
        Self {
            categories: Vec::new(),
            current_index: 0,
            cycle_start: now,
            progress: 0.0,
            push: PushTracker::new(),
            reset_pending: false,
        }
    }

    // ── Inputs ────────────────────────────────────────────────────────────────

    /// Replaces the category list with a fresh snapshot.
    ///
    /// The index is re-wrapped against the new length.  When the list goes
    /// from empty to non-empty the dwell restarts at `now`, so categories
    /// arriving after a long empty period are shown for their full duration.
    pub fn replace_categories(&mut self, categories: Vec<Category>, now: Instant) {
        let was_empty = self.categories.is_empty();
        let old_len = self.categories.len();

        self.categories = categories;
        self.current_index = wrap_index(self.current_index, self.categories.len());

        if self.categories.is_empty() {
            self.progress = 0.0;
        } else if was_empty {
            self.restart_cycle(now);
        }

        debug!(
            old_len,
            new_len = self.categories.len(),
            current_index = self.current_index,
            "Category snapshot replaced"
        );
    }

    /// Feeds one observation of the push signal.  Returns `true` when it
    /// queued a reset for the next [`advance`](Self::advance).
    pub fn observe_push_signal(&mut self, token: Option<PushSignal>) -> bool {
        let changed = self.push.observe(token);
        if changed {
            self.reset_pending = true;
        }
        changed
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    /// One scheduling tick.
    ///
    /// A pending reset takes precedence over advancing: it is applied and the
    /// tick ends there, so the fresh origin it sets is never overwritten by
    /// a rotation computed from the old one.
    pub fn advance(&mut self, now: Instant) -> Advance {
        if self.reset_pending {
            self.reset_pending = false;
            self.reset(now);
            return Advance::Reset;
        }

        let len = self.categories.len();
        if len == 0 {
            return Advance::Idle;
        }

        self.current_index = wrap_index(self.current_index, len);
        let dwell = self.categories[self.current_index].display_duration;
        let elapsed = now.saturating_duration_since(self.cycle_start);
        let progress = progress_fraction(elapsed, dwell);

        if progress < 1.0 {
            self.progress = progress;
            return Advance::Progressed;
        }

        let from = self.current_index;
        let to = next_index(from, len);
        self.current_index = to;
        self.restart_cycle(now);

        info!(
            from = %self.categories[from].id,
            to = %self.categories[to].id,
            dwell_ms = self.categories[to].display_duration_ms() as u64,
            "Rotated to next category"
        );

        Advance::Rotated { from, to }
    }

    /// Back to the first category with a fresh dwell.  The list is untouched.
    pub fn reset(&mut self, now: Instant) {
        self.current_index = 0;
        self.restart_cycle(now);
        info!(
            first = ?self.categories.first().map(|c| c.id.as_str()),
            "Rotation reset to first category"
        );
    }

    /// Shows `target` immediately with a fresh dwell and returns the index
    /// that was selected.
    ///
    /// Unknown ids and out-of-range indices fall back to `0`.
    pub fn jump_to(&mut self, target: impl Into<JumpTarget>, now: Instant) -> usize {
        let target = target.into();
        let resolved = match &target {
            JumpTarget::Index(i) if *i < self.categories.len() => Some(*i),
            JumpTarget::Index(_) => None,
            JumpTarget::Id(id) => self.categories.iter().position(|c| &c.id == id),
        };

        let index = resolved.unwrap_or_else(|| {
            warn!(jump = ?target, "Jump target not found, falling back to first category");
            0
        });

        self.current_index = index;
        self.restart_cycle(now);
        info!(
            index,
            category = ?self.current().map(|c| c.id.as_str()),
            "Jumped to category"
        );
        index
    }

    /// Restarts the current category's dwell at `now` without moving.
    pub fn restart_cycle(&mut self, now: Instant) {
        self.cycle_start = now;
        self.progress = 0.0;
    }

    // ── Outputs ───────────────────────────────────────────────────────────────

    pub fn current(&self) -> Option<&Category> {
        self.categories
            .get(wrap_index(self.current_index, self.categories.len()))
    }

    /// The category after the current one; equal to the current one when
    /// there are fewer than two.
    pub fn next(&self) -> Option<&Category> {
        if self.categories.is_empty() {
            return None;
        }
        self.categories
            .get(next_index(self.current_index, self.categories.len()))
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn current_index(&self) -> usize {
        wrap_index(self.current_index, self.categories.len())
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn is_reset_pending(&self) -> bool {
        self.reset_pending
    }

    /// Copies the renderer-facing state.
    pub fn snapshot(&self) -> RotationSnapshot {
        RotationSnapshot {
            current: self.current().cloned(),
            next: self.next().cloned(),
            progress: self.progress,
            current_index: self.current_index(),
            categories: self.categories.clone(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cat(id: &str, order: i64, secs: u64) -> Category {
        Category::new(id, id.to_uppercase(), order, Duration::from_secs(secs))
    }

    fn a_b() -> Vec<Category> {
        vec![cat("a", 1, 10), cat("b", 2, 5)]
    }

    fn a_b_c() -> Vec<Category> {
        vec![cat("a", 1, 10), cat("b", 2, 5), cat("c", 3, 8)]
    }

    fn scheduler_with(cats: Vec<Category>, t0: Instant) -> RotationScheduler {
        let mut s = RotationScheduler::new(t0);
        s.replace_categories(cats, t0);
        s
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    // ── advance ───────────────────────────────────────────────────────────────

    #[test]
    fn dwell_elapsed_rotates_to_b_with_zero_progress() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b(), t0);

        assert_eq!(s.advance(t0 + secs(10)), Advance::Rotated { from: 0, to: 1 });
        assert_eq!(s.current().unwrap().id, "b");
        assert_eq!(s.progress(), 0.0);
    }

    #[test]
    fn partial_dwell_reports_fraction() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b(), t0);

        assert_eq!(s.advance(t0 + secs(4)), Advance::Progressed);
        assert!((s.progress() - 0.4).abs() < 1e-9);
        assert_eq!(s.current().unwrap().id, "a");
    }

    #[test]
    fn each_category_uses_its_own_dwell() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b(), t0);

        s.advance(t0 + secs(10)); // a → b, b dwells 5 s
        let t1 = t0 + secs(10);
        assert_eq!(s.advance(t1 + secs(4)), Advance::Progressed);
        assert_eq!(s.advance(t1 + secs(5)), Advance::Rotated { from: 1, to: 0 });
        assert_eq!(s.current().unwrap().id, "a");
    }

    #[test]
    fn long_stall_advances_only_one_step() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b_c(), t0);

        // Even an hour late, a single tick moves exactly one position.
        assert_eq!(s.advance(t0 + secs(3_600)), Advance::Rotated { from: 0, to: 1 });
        assert_eq!(s.progress(), 0.0);
    }

    #[test]
    fn progress_stays_within_unit_interval() {
        let t0 = Instant::now();
        let mut s = scheduler_with(vec![cat("solo", 1, 2)], t0);

        for ms in (0..20_000).step_by(137) {
            s.advance(t0 + Duration::from_millis(ms));
            let p = s.progress();
            assert!((0.0..=1.0).contains(&p), "progress {p} out of range");
        }
    }

    #[test]
    fn single_category_restarts_its_own_dwell() {
        let t0 = Instant::now();
        let mut s = scheduler_with(vec![cat("solo", 1, 2)], t0);

        assert_eq!(s.advance(t0 + secs(2)), Advance::Rotated { from: 0, to: 0 });
        assert_eq!(s.current().unwrap().id, "solo");
        assert_eq!(s.next().unwrap().id, "solo");
    }

    #[test]
    fn clock_reading_before_origin_is_zero_progress() {
        let t0 = Instant::now();
        let later = t0 + secs(5);
        let mut s = scheduler_with(a_b(), later);
        assert_eq!(s.advance(t0), Advance::Progressed);
        assert_eq!(s.progress(), 0.0);
    }

    // ── Empty list ────────────────────────────────────────────────────────────

    #[test]
    fn empty_list_is_idle_and_reports_nothing() {
        let t0 = Instant::now();
        let mut s = RotationScheduler::new(t0);

        assert_eq!(s.advance(t0 + secs(100)), Advance::Idle);
        assert!(s.current().is_none());
        assert!(s.next().is_none());
        assert_eq!(s.progress(), 0.0);
        assert_eq!(s.snapshot(), RotationSnapshot::default());
    }

    #[test]
    fn categories_arriving_late_get_a_full_dwell() {
        let t0 = Instant::now();
        let mut s = RotationScheduler::new(t0);
        s.advance(t0 + secs(60));

        let t1 = t0 + secs(60);
        s.replace_categories(a_b(), t1);
        assert_eq!(s.advance(t1 + secs(1)), Advance::Progressed);
        assert_eq!(s.current().unwrap().id, "a");
    }

    // ── replace_categories ────────────────────────────────────────────────────

    #[test]
    fn shrinking_list_rewraps_index() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b_c(), t0);
        s.jump_to(2, t0);

        s.replace_categories(vec![cat("x", 1, 10), cat("y", 2, 10)], t0);
        // 2 mod 2 = 0
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.current().unwrap().id, "x");

        s.replace_categories(vec![cat("only", 1, 10)], t0);
        assert_eq!(s.current().unwrap().id, "only");
        assert_eq!(s.advance(t0 + secs(1)), Advance::Progressed);
    }

    #[test]
    fn replacing_with_same_length_keeps_position_and_dwell() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b(), t0);
        s.advance(t0 + secs(4));

        s.replace_categories(a_b(), t0 + secs(4));
        assert_eq!(s.advance(t0 + secs(6)), Advance::Progressed);
        assert!((s.progress() - 0.6).abs() < 1e-9, "dwell origin untouched");
    }

    #[test]
    fn emptying_the_list_clears_progress() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b(), t0);
        s.advance(t0 + secs(5));

        s.replace_categories(Vec::new(), t0 + secs(5));
        assert_eq!(s.progress(), 0.0);
        assert!(s.current().is_none());
    }

    // ── jump_to ───────────────────────────────────────────────────────────────

    #[test]
    fn jump_by_id() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b(), t0);
        s.advance(t0 + secs(3));

        assert_eq!(s.jump_to("b", t0 + secs(3)), 1);
        assert_eq!(s.current().unwrap().id, "b");
        assert_eq!(s.progress(), 0.0);
    }

    #[test]
    fn jump_by_index_restarts_dwell() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b_c(), t0);
        s.advance(t0 + secs(9));

        let tj = t0 + secs(9);
        s.jump_to(2, tj);
        assert_eq!(s.current_index(), 2);
        assert_eq!(s.progress(), 0.0);
        // c dwells 8 s from the jump, not from t0.
        assert_eq!(s.advance(tj + secs(7)), Advance::Progressed);
        assert_eq!(s.advance(tj + secs(8)), Advance::Rotated { from: 2, to: 0 });
    }

    #[test]
    fn jump_to_unknown_id_falls_back_to_first() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b(), t0);
        s.jump_to(1, t0);

        assert_eq!(s.jump_to("nope", t0), 0);
        assert_eq!(s.current().unwrap().id, "a");
    }

    #[test]
    fn jump_to_out_of_range_index_falls_back_to_first() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b(), t0);
        s.jump_to(1, t0);

        assert_eq!(s.jump_to(7, t0), 0);
    }

    #[test]
    fn jump_on_empty_list_is_harmless() {
        let t0 = Instant::now();
        let mut s = RotationScheduler::new(t0);
        assert_eq!(s.jump_to("a", t0), 0);
        assert!(s.current().is_none());
    }

    // ── push-signal reset ─────────────────────────────────────────────────────

    #[test]
    fn push_change_resets_to_first() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b(), t0);
        assert!(!s.observe_push_signal(Some(100.into())));
        s.jump_to(1, t0);

        assert!(s.observe_push_signal(Some(200.into())));
        assert_eq!(s.advance(t0 + secs(1)), Advance::Reset);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.progress(), 0.0);
    }

    #[test]
    fn reset_wins_over_due_rotation() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b_c(), t0);
        s.observe_push_signal(Some(100.into()));
        s.jump_to(1, t0);

        // b's 5 s dwell is over; without the push this tick would move to c.
        s.observe_push_signal(Some(200.into()));
        let t1 = t0 + secs(6);
        assert_eq!(s.advance(t1), Advance::Reset);
        assert_eq!(s.current().unwrap().id, "a");
        assert_eq!(s.progress(), 0.0);

        // The next tick measures from the reset origin.
        assert_eq!(s.advance(t1 + secs(1)), Advance::Progressed);
        assert_eq!(s.current().unwrap().id, "a");
    }

    #[test]
    fn first_push_observation_does_not_reset() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b(), t0);
        s.jump_to(1, t0);

        assert!(!s.observe_push_signal(Some(100.into())));
        assert!(!s.is_reset_pending());
        assert_eq!(s.advance(t0 + secs(1)), Advance::Progressed);
        assert_eq!(s.current_index(), 1);
    }

    // ── snapshot ──────────────────────────────────────────────────────────────

    #[test]
    fn snapshot_reports_current_next_and_list() {
        let t0 = Instant::now();
        let mut s = scheduler_with(a_b_c(), t0);
        s.jump_to("c", t0);

        let snap = s.snapshot();
        assert_eq!(snap.current.unwrap().id, "c");
        assert_eq!(snap.next.unwrap().id, "a");
        assert_eq!(snap.current_index, 2);
        assert_eq!(snap.categories.len(), 3);
    }
}
