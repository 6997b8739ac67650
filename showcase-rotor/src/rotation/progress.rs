/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Pure arithmetic helpers: index wrapping and clamped progress.
//!
//! These are free functions rather than methods so they can be used and tested
//! independently of the `RotationScheduler`.

use std::time::Duration;

/// Wraps `index` into `0..len`.  Returns `0` for an empty list so callers
/// never have to special-case the modulo.
pub fn wrap_index(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        index % len
    }
}

/// Index of the category after `index`.  With zero or one category the
/// "next" one is the current one.
pub fn next_index(index: usize, len: usize) -> usize {
    if len <= 1 {
        wrap_index(index, len)
    } else {
        (wrap_index(index, len) + 1) % len
    }
}

/// Fraction of `dwell` covered by `elapsed`, clamped to `[0, 1]`.
///
/// A zero dwell reports `1.0` (finished) rather than dividing by zero; the
/// category layer never produces one, but this stays total regardless.
pub fn progress_fraction(elapsed: Duration, dwell: Duration) -> f64 {
    let dwell_ms = dwell.as_secs_f64() * 1_000.0;
    if dwell_ms <= 0.0 {
        return 1.0;
    }
    let elapsed_ms = elapsed.as_secs_f64() * 1_000.0;
    (elapsed_ms / dwell_ms).clamp(0.0, 1.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_index_basic() {
        assert_eq!(wrap_index(0, 3), 0);
        assert_eq!(wrap_index(4, 3), 1);
        assert_eq!(wrap_index(7, 0), 0);
    }

    #[test]
    fn next_index_cycles() {
        assert_eq!(next_index(0, 3), 1);
        assert_eq!(next_index(2, 3), 0);
        assert_eq!(next_index(5, 3), 0); // wraps 5 → 2 first
    }

    #[test]
    fn next_index_single_or_empty_is_current() {
        assert_eq!(next_index(0, 1), 0);
        assert_eq!(next_index(3, 1), 0);
        assert_eq!(next_index(0, 0), 0);
    }

    #[test]
    fn progress_is_linear_inside_dwell() {
        let p = progress_fraction(Duration::from_secs(5), Duration::from_secs(10));
        assert!((p - 0.5).abs() < 1e-9);
    }

    #[test]
    fn progress_clamps_to_one() {
        let p = progress_fraction(Duration::from_secs(3_600), Duration::from_secs(10));
        assert_eq!(p, 1.0);
    }

    #[test]
    fn progress_zero_dwell_is_finished() {
        assert_eq!(progress_fraction(Duration::ZERO, Duration::ZERO), 1.0);
    }

    #[test]
    fn progress_starts_at_zero() {
        assert_eq!(progress_fraction(Duration::ZERO, Duration::from_secs(15)), 0.0);
    }
}
