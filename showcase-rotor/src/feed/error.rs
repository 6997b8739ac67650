/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the feed adapter.
//!
//! A [`FeedError`] never reaches the renderer.  The driver logs it, counts it
//! against the failing [`FeedSource`](super::FeedSource) and keeps showing the
//! last good snapshot; only the derived "degraded" flag is surfaced.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// The feed document could not be read (missing file, permissions, …).
    #[error("cannot read feed document {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The feed document was read but is not valid YAML for the expected
    /// layout.
    #[error("malformed feed document {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Writing the feed document back failed (simulators only).
    #[error("cannot write feed document {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The in-memory document could not be serialised.
    #[error("cannot serialise feed document: {0}")]
    Serialize(#[source] serde_yaml::Error),

    /// Any other delivery failure reported by a transport adapter
    /// (disconnect, permission revoked, …).
    #[error("feed transport failure: {0}")]
    Transport(String),
}
