/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Push signal: the admin's "content changed, start over" marker.
//!
//! The token is opaque.  It is compared for equality and never ordered or
//! interpreted, so clock skew between the admin panel and the display cannot
//! matter.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// An externally owned change marker (usually the `lastPushed` field of the
/// display settings document).
///
/// Accepted wire forms: an integer (epoch millis), a string, a float
/// (kept as its textual form), or a `{ seconds, nanoseconds }` timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged, from = "RawPushSignal")]
pub enum PushSignal {
    Timestamp { seconds: i64, nanoseconds: u32 },
    Int(i64),
    Text(String),
}

/// Deserialisation helper: folds floats into [`PushSignal::Text`] so the
/// public type stays `Eq`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPushSignal {
    Timestamp {
        seconds: i64,
        #[serde(default)]
        nanoseconds: u32,
    },
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<RawPushSignal> for PushSignal {
    fn from(raw: RawPushSignal) -> Self {
        match raw {
            RawPushSignal::Timestamp {
                seconds,
                nanoseconds,
            } => PushSignal::Timestamp {
                seconds,
                nanoseconds,
            },
            RawPushSignal::Int(v) => PushSignal::Int(v),
            RawPushSignal::Float(v) => PushSignal::Text(v.to_string()),
            RawPushSignal::Text(s) => PushSignal::Text(s),
        }
    }
}

impl From<i64> for PushSignal {
    fn from(v: i64) -> Self {
        PushSignal::Int(v)
    }
}

impl From<&str> for PushSignal {
    fn from(v: &str) -> Self {
        PushSignal::Text(v.to_string())
    }
}

impl std::fmt::Display for PushSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PushSignal::Timestamp {
                seconds,
                nanoseconds,
            } => write!(f, "{seconds}.{nanoseconds:09}"),
            PushSignal::Int(v) => write!(f, "{v}"),
            PushSignal::Text(s) => f.write_str(s),
        }
    }
}

// ── PushTracker ───────────────────────────────────────────────────────────────

/// Remembers the last push signal seen and decides when a change means
/// "reset the rotation".
///
/// * The first value ever observed is only recorded.  A display that boots
///   after the admin pushed must not treat the existing marker as a new push.
/// * An absent value (settings document missing, field not set) is ignored
///   and does not overwrite the stored value.
/// * Any later value different from the stored one requests a reset.
#[derive(Debug, Clone, Default)]
pub struct PushTracker {
    last_seen: Option<PushSignal>,
}

impl PushTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `token` and returns `true` when it should reset the rotation.
    pub fn observe(&mut self, token: Option<PushSignal>) -> bool {
        let Some(token) = token else {
            debug!("Push signal absent, keeping last known value");
            return false;
        };

        match self.last_seen.replace(token.clone()) {
            None => {
                debug!(signal = %token, "Initial push signal recorded");
                false
            }
            Some(prev) if prev == token => false,
            Some(prev) => {
                info!(previous = %prev, current = %token, "Push signal changed");
                true
            }
        }
    }

    /// The most recently recorded token, if any.
    pub fn last_seen(&self) -> Option<&PushSignal> {
        self.last_seen.as_ref()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
