/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-category presentation hints for the renderer: colour palette and
//! showcase layout.

use crate::category::Category;

/// Colour triple applied to the display shell while a category is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub primary: &'static str,
    pub accent: &'static str,
    pub particle: &'static str,
}

const FLOWERS: Theme = Theme {
    primary: "#122418",
    accent: "#6ab04c",
    particle: "#6ab04c",
};
const EDIBLES: Theme = Theme {
    primary: "#2a1528",
    accent: "#c06c84",
    particle: "#c06c84",
};
const VAPES: Theme = Theme {
    primary: "#101428",
    accent: "#7c8cf8",
    particle: "#7c8cf8",
};
const CARTRIDGES: Theme = Theme {
    primary: "#161616",
    accent: "#a8a8a8",
    particle: "#a8a8a8",
};
const PREROLLS: Theme = Theme {
    primary: "#1e1408",
    accent: "#b8943e",
    particle: "#b8943e",
};
const DEALS: Theme = Theme {
    primary: "#221010",
    accent: "#e55039",
    particle: "#e55039",
};

/// Lookup table, scanned in order.
const THEMES: &[(&str, Theme)] = &[
    ("flowers", FLOWERS),
    ("edibles", EDIBLES),
    ("vapes", VAPES),
    ("disposables", VAPES),
    ("cartridges", CARTRIDGES),
    ("prerolls", PREROLLS),
    ("pre-rolls", PREROLLS),
    ("deals", DEALS),
];

/// Normalised lookup key: lower-cased id (or name when the id is empty) with
/// whitespace and `/` stripped.
fn theme_key(category: &Category) -> String {
    let raw = if category.id.is_empty() {
        &category.name
    } else {
        &category.id
    };
    raw.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '/')
        .collect()
}

/// Palette for `category`.
///
/// The first table entry whose name contains the key, or is contained in it,
/// wins.  No category, or no match, gives the flowers palette.
pub fn theme_for(category: Option<&Category>) -> Theme {
    let Some(category) = category else {
        return FLOWERS;
    };
    let key = theme_key(category);
    THEMES
        .iter()
        .find(|(name, _)| key.contains(name) || name.contains(key.as_str()))
        .map(|(_, theme)| *theme)
        .unwrap_or(FLOWERS)
}

// ── Layouts ───────────────────────────────────────────────────────────────────

/// Showcase layout the renderer mounts for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Orbiting flower cards.
    BudUniverse,
    /// Node graph for edibles.
    NeuralConstellation,
    /// Grid for vapes and disposables.
    NeonTechGrid,
    /// Gallery for cartridges.
    TheCollection,
    /// Shelf for pre-rolls.
    SmokeShelf,
    Deals,
}

impl LayoutKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutKind::BudUniverse => "bud_universe",
            LayoutKind::NeuralConstellation => "neural_constellation",
            LayoutKind::NeonTechGrid => "neon_tech_grid",
            LayoutKind::TheCollection => "the_collection",
            LayoutKind::SmokeShelf => "smoke_shelf",
            LayoutKind::Deals => "deals",
        }
    }
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the layout from substrings of the category id.
pub fn layout_for(category: &Category) -> LayoutKind {
    let id = category.id.to_lowercase();
    if id.contains("flower") {
        LayoutKind::BudUniverse
    } else if id.contains("edible") {
        LayoutKind::NeuralConstellation
    } else if id.contains("vape") || id.contains("disposable") {
        LayoutKind::NeonTechGrid
    } else if id.contains("cart") {
        LayoutKind::TheCollection
    } else if id.contains("pre") {
        LayoutKind::SmokeShelf
    } else if id.contains("deal") {
        LayoutKind::Deals
    } else {
        LayoutKind::BudUniverse
    }
}
