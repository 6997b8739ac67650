/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Category data structures for the showcase rotor.
//!
//! Two distinct types model the two sides of the rotation pipeline:
//!
//! ```text
//! admin panel ──(feed record)──►  CategoryRecord  ──(normalize)──►  Category  ──►  RotationScheduler
//!                                  ↑ raw, every field optional        ↑ active only, sorted, defaults filled
//! ```
//!
//! # Ownership model
//! The display never owns categories.  Each feed delivery is a full
//! snapshot; [`normalize_snapshot`] turns it into a fresh `Vec<Category>`
//! that is **moved** into the scheduler, replacing the previous copy
//! wholesale.  No diffing, no index stability across snapshots.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use tracing::debug;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Dwell used when a category carries no usable duration.
pub const DEFAULT_DISPLAY_DURATION: Duration = Duration::from_secs(15);

/// Sort key used when a category has no `order` field.
pub const DEFAULT_ORDER: i64 = 99;

// ── CategoryRecord (wire / feed shape) ────────────────────────────────────────

/// One category document as it arrives from the upstream feed.
///
/// The record id is the document key and is carried alongside the record
/// rather than inside it.  Every field is optional: records edited by hand or
/// by older admin builds may lack any of them.
///
/// The dwell appears under two names.  The display reads `displayDuration`;
/// the admin panel writes `duration`.  Both are accepted and
/// `displayDuration` wins when both are present.
///
/// Field values of the wrong type never fail the record: numbers written as
/// strings are parsed, anything else reads as absent and gets its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub order: Option<i64>,

    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub active: Option<bool>,

    /// Dwell in seconds.
    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_duration: Option<f64>,

    /// Dwell in seconds, as written by the admin panel.
    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<f64>,

    /// Fields the display does not use (slug, theme, …), kept so simulators
    /// can round-trip documents.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl CategoryRecord {
    /// Returns `true` only for an explicit `active: true`.
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(false)
    }

    /// Raw dwell in seconds, preferring `displayDuration` over `duration`.
    pub fn dwell_secs(&self) -> Option<f64> {
        self.display_duration.or(self.duration)
    }
}

// ── Lenient field readers ─────────────────────────────────────────────────────

fn lenient_value<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Option::<Value>::deserialize(d)
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match lenient_value(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let as_int = |f: f64| f.is_finite().then(|| f as i64);
    Ok(match lenient_value(d)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(as_int)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(as_int))
        }
        _ => None,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match lenient_value(d)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(match lenient_value(d)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => s.trim().parse::<bool>().ok(),
        _ => None,
    })
}

// ── Category (normalised, read-only) ──────────────────────────────────────────

/// A category as the scheduler and renderer see it.
///
/// Always active (inactive records are filtered out before a `Category` is
/// ever built) and always carries a strictly positive dwell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Document id, unique within a snapshot.
    pub id: String,

    /// Display name.  Falls back to the id when the record has none.
    pub name: String,

    /// Sort key; ties are broken by `id`.
    pub order: i64,

    /// How long the category stays on screen.
    pub display_duration: Duration,
}

impl Category {
    /// Builds a category with an explicit dwell.  Mostly useful in tests and
    /// simulators; production snapshots go through [`normalize_snapshot`].
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        order: i64,
        display_duration: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            order,
            display_duration,
        }
    }

    /// Dwell in milliseconds, the unit progress is computed in.
    pub fn display_duration_ms(&self) -> u128 {
        self.display_duration.as_millis()
    }
}

// ── Normalisation ─────────────────────────────────────────────────────────────

/// Converts a raw dwell in seconds into a usable `Duration`.
///
/// Missing, non-finite, zero, negative and unrepresentable values all map to
/// `default`, so a tick can never divide by zero or spin through categories.
pub fn sanitize_dwell(secs: Option<f64>, default: Duration) -> Duration {
    match secs {
        Some(s) if s.is_finite() && s > 0.0 => match Duration::try_from_secs_f64(s) {
            Ok(d) if !d.is_zero() => d,
            _ => default,
        },
        _ => default,
    }
}

/// Turns one full feed snapshot into the ordered list the scheduler rotates
/// through.
///
/// * Drops every record that is not explicitly active.
/// * Sorts by `order` (missing → [`DEFAULT_ORDER`]), then by id.
/// * Fills missing or invalid dwells with `default_duration`.
pub fn normalize_snapshot<I>(records: I, default_duration: Duration) -> Vec<Category>
where
    I: IntoIterator<Item = (String, CategoryRecord)>,
{
    let mut categories: Vec<Category> = records
        .into_iter()
        .filter(|(_, rec)| rec.is_active())
        .map(|(id, rec)| {
            let display_duration = sanitize_dwell(rec.dwell_secs(), default_duration);
            Category {
                name: rec.name.clone().unwrap_or_else(|| id.clone()),
                order: rec.order.unwrap_or(DEFAULT_ORDER),
                display_duration,
                id,
            }
        })
        .collect();

    categories.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));

    debug!(
        active = categories.len(),
        ids = ?categories.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
        "Normalised category snapshot"
    );

    categories
}

// ── Tests ─────────────────────────────────────────────────────────────────────
