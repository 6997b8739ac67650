/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Showcase rotor – category rotation for the dispensary signage display
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── category/       – feed records → active, sorted categories
//! ├── signal/         – push-signal token and change tracking
//! ├── rotation/       – the rotation scheduler + progress arithmetic
//! ├── feed/           – observation adapter contract, health, file feed
//! ├── driver/         – tokio tick loop, start/stop lifecycle, view broadcast
//! ├── theme/          – per-category palette and layout hints
//! └── config/         – YAML display configuration
//! ```

pub mod category;
pub mod config;
pub mod driver;
pub mod feed;
pub mod rotation;
pub mod signal;
pub mod theme;
