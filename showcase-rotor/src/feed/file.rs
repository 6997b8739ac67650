/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! File-backed feed adapter.
//!
//! Stands in for the hosted document database: one YAML document holds both
//! feeds, and [`FileFeed`] polls it and forwards changes.
//!
//! The expected YAML structure is:
//! ```yaml
//! categories:
//!   exotic-flowers:
//!     name: "Exotic Flowers"
//!     order: 1
//!     active: true
//!     displayDuration: 20
//! settings:
//!   display:
//!     lastPushed: 1718000000000
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{FeedError, FeedSource, FeedUpdate};
use crate::category::CategoryRecord;
use crate::signal::PushSignal;

// ── Document layout ───────────────────────────────────────────────────────────

/// The whole feed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedDocument {
    /// Category documents keyed by id.  A record that is not a mapping is
    /// skipped; it never fails the whole document.
    #[serde(default, deserialize_with = "categories_by_record")]
    pub categories: BTreeMap<String, CategoryRecord>,

    #[serde(default)]
    pub settings: SettingsCollection,
}

/// The `settings` collection.  Only the `display` document matters here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplaySettings>,
}

/// The `settings/display` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pushed: Option<PushSignal>,

    /// Admin-only settings (rotation speed, transition style, …).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn categories_by_record<'de, D>(d: D) -> Result<BTreeMap<String, CategoryRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_yaml::Value>>::deserialize(d)?.unwrap_or_default();

    Ok(raw
        .into_iter()
        .filter_map(|(id, value)| match serde_yaml::from_value::<CategoryRecord>(value) {
            Ok(record) => Some((id, record)),
            Err(e) => {
                warn!(id = %id, error = %e, "Skipping unreadable category record");
                None
            }
        })
        .collect())
}

impl FeedDocument {
    /// Parses `content`; `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, FeedError> {
        serde_yaml::from_str(content).map_err(|source| FeedError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads and parses the document at `path`.
    pub fn load(path: &Path) -> Result<Self, FeedError> {
        let content = std::fs::read_to_string(path).map_err(|source| FeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Writes the document to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), FeedError> {
        let content = serde_yaml::to_string(self).map_err(FeedError::Serialize)?;
        std::fs::write(path, content).map_err(|source| FeedError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The category snapshot in the shape [`FeedUpdate::Categories`] carries.
    pub fn category_records(&self) -> Vec<(String, CategoryRecord)> {
        self.categories
            .iter()
            .map(|(id, rec)| (id.clone(), rec.clone()))
            .collect()
    }

    pub fn last_pushed(&self) -> Option<PushSignal> {
        self.settings
            .display
            .as_ref()
            .and_then(|d| d.last_pushed.clone())
    }

    /// Sets `settings.display.lastPushed`, creating the document if needed.
    pub fn set_last_pushed(&mut self, token: PushSignal) {
        self.settings
            .display
            .get_or_insert_with(DisplaySettings::default)
            .last_pushed = Some(token);
    }
}

// ── FileFeed ──────────────────────────────────────────────────────────────────

/// Polls a [`FeedDocument`] and turns it into [`FeedUpdate`]s.
///
/// Only values that changed since the last successful poll are delivered,
/// except right after a failure: then both values are delivered again so the
/// receiver's health tracking sees the recovery.
#[derive(Debug)]
pub struct FileFeed {
    path: PathBuf,
    poll_interval: Duration,
    last_categories: Option<BTreeMap<String, CategoryRecord>>,
    last_push: Option<Option<PushSignal>>,
    failing: bool,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            path: path.into(),
            poll_interval,
            last_categories: None,
            last_push: None,
            failing: false,
        }
    }

    /// Reads the document once and returns the updates to deliver.
    ///
    /// A read or parse failure reports one [`FeedUpdate::Failed`] per source
    /// and leaves the remembered values untouched.
    pub async fn poll_once(&mut self) -> Vec<FeedUpdate> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(source) => {
                return self.failed(FeedError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let doc = match FeedDocument::parse(&content, &self.path) {
            Ok(d) => d,
            Err(e) => return self.failed(e),
        };

        let recovering = std::mem::take(&mut self.failing);
        let mut updates = Vec::with_capacity(2);

        if recovering || self.last_categories.as_ref() != Some(&doc.categories) {
            debug!(
                path = %self.path.display(),
                records = doc.categories.len(),
                "Category feed changed"
            );
            updates.push(FeedUpdate::Categories(doc.category_records()));
            self.last_categories = Some(doc.categories.clone());
        }

        let push = doc.last_pushed();
        if recovering || self.last_push.as_ref() != Some(&push) {
            debug!(path = %self.path.display(), push = ?push, "Settings feed changed");
            updates.push(FeedUpdate::PushSignal(push.clone()));
            self.last_push = Some(push);
        }

        updates
    }

    fn failed(&mut self, error: FeedError) -> Vec<FeedUpdate> {
        self.failing = true;
        let settings_error = FeedError::Transport(format!("feed document unavailable: {error}"));
        vec![
            FeedUpdate::Failed {
                source: FeedSource::Categories,
                error,
            },
            FeedUpdate::Failed {
                source: FeedSource::Settings,
                error: settings_error,
            },
        ]
    }

    /// Polls forever, sending every update to `tx`.  Returns once the
    /// receiving side is gone.
    pub async fn run(mut self, tx: mpsc::UnboundedSender<FeedUpdate>) {
        info!(
            path = %self.path.display(),
            poll_ms = self.poll_interval.as_millis() as u64,
            "File feed started"
        );

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if tx.is_closed() {
                break;
            }
            for update in self.poll_once().await {
                if tx.send(update).is_err() {
                    break;
                }
            }
        }

        info!(path = %self.path.display(), "Feed receiver dropped, file feed stopped");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    const FEED: &str = r#"
categories:
  exotic-flowers:
    name: "Exotic Flowers"
    order: 1
    active: true
    duration: 20
  edibles:
    name: "Edibles"
    order: 2
    active: false
settings:
  display:
    lastPushed: 100
    rotationSpeed: normal
"#;

    fn kinds(updates: &[FeedUpdate]) -> Vec<&'static str> {
        updates
            .iter()
            .map(|u| match u {
                FeedUpdate::Categories(_) => "categories",
                FeedUpdate::PushSignal(_) => "push",
                FeedUpdate::Failed { .. } => "failed",
            })
            .collect()
    }

    // ── FeedDocument ──────────────────────────────────────────────────────────

    #[test]
    fn load_example_document() {
        let f = yaml_tempfile(FEED);
        let doc = FeedDocument::load(f.path()).unwrap();

        assert_eq!(doc.categories.len(), 2);
        assert_eq!(doc.categories["exotic-flowers"].dwell_secs(), Some(20.0));
        assert_eq!(doc.last_pushed(), Some(PushSignal::Int(100)));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let f = yaml_tempfile("{}\n");
        let doc = FeedDocument::load(f.path()).unwrap();
        assert!(doc.categories.is_empty());
        assert_eq!(doc.last_pushed(), None);
    }

    #[test]
    fn missing_file_returns_read_error() {
        let err = FeedDocument::load(Path::new("/nonexistent/feed.yaml")).unwrap_err();
        assert!(matches!(err, FeedError::Read { .. }));
    }

    #[test]
    fn malformed_yaml_returns_parse_error() {
        let f = yaml_tempfile("categories: [this, is, not, a, map]\n");
        let err = FeedDocument::load(f.path()).unwrap_err();
        assert!(matches!(err, FeedError::Parse { .. }));
    }

    #[test]
    fn bad_record_does_not_fail_the_document() {
        let yaml = r#"
categories:
  a:
    active: true
    order: 1
    displayDuration: 10
  b:
    active: true
    order: 2
    displayDuration: "20"
  c: 42
settings:
  display:
    lastPushed: 5
"#;
        let doc = FeedDocument::parse(yaml, Path::new("feed.yaml")).unwrap();
        assert_eq!(doc.categories.len(), 2, "scalar record skipped");
        assert_eq!(doc.categories["a"].dwell_secs(), Some(10.0));
        assert_eq!(doc.categories["b"].dwell_secs(), Some(20.0));
        assert_eq!(doc.last_pushed(), Some(PushSignal::Int(5)));
    }

    #[test]
    fn save_preserves_admin_only_settings() {
        let f = yaml_tempfile(FEED);
        let mut doc = FeedDocument::load(f.path()).unwrap();
        doc.set_last_pushed(PushSignal::Int(200));
        doc.save(f.path()).unwrap();

        let reloaded = FeedDocument::load(f.path()).unwrap();
        assert_eq!(reloaded.last_pushed(), Some(PushSignal::Int(200)));
        let display = reloaded.settings.display.unwrap();
        assert!(display.extra.contains_key("rotationSpeed"));
    }

    #[test]
    fn set_last_pushed_creates_settings_document() {
        let mut doc = FeedDocument::default();
        doc.set_last_pushed("first".into());
        assert_eq!(doc.last_pushed(), Some(PushSignal::Text("first".into())));
    }

    // ── FileFeed ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn first_poll_delivers_both_feeds() {
        let f = yaml_tempfile(FEED);
        let mut feed = FileFeed::new(f.path(), Duration::from_secs(1));

        let updates = feed.poll_once().await;
        assert_eq!(kinds(&updates), vec!["categories", "push"]);
        match &updates[0] {
            FeedUpdate::Categories(records) => assert_eq!(records.len(), 2),
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unchanged_document_delivers_nothing() {
        let f = yaml_tempfile(FEED);
        let mut feed = FileFeed::new(f.path(), Duration::from_secs(1));
        feed.poll_once().await;

        assert!(feed.poll_once().await.is_empty());
    }

    #[tokio::test]
    async fn only_changed_feed_is_delivered() {
        let f = yaml_tempfile(FEED);
        let mut feed = FileFeed::new(f.path(), Duration::from_secs(1));
        feed.poll_once().await;

        let mut doc = FeedDocument::load(f.path()).unwrap();
        doc.set_last_pushed(PushSignal::Int(200));
        doc.save(f.path()).unwrap();

        let updates = feed.poll_once().await;
        assert_eq!(kinds(&updates), vec!["push"]);
        assert!(matches!(
            updates[0],
            FeedUpdate::PushSignal(Some(PushSignal::Int(200)))
        ));
    }

    #[tokio::test]
    async fn failure_reports_both_sources_then_recovery_redelivers() {
        let f = yaml_tempfile(FEED);
        let mut feed = FileFeed::new(f.path(), Duration::from_secs(1));
        feed.poll_once().await;

        std::fs::write(f.path(), "categories: [broken\n").unwrap();
        let failed = feed.poll_once().await;
        assert_eq!(kinds(&failed), vec!["failed", "failed"]);
        let sources: Vec<FeedSource> = failed.iter().map(FeedUpdate::source).collect();
        assert_eq!(sources, vec![FeedSource::Categories, FeedSource::Settings]);

        // Same content as before the failure: still redelivered once.
        std::fs::write(f.path(), FEED).unwrap();
        assert_eq!(kinds(&feed.poll_once().await), vec!["categories", "push"]);
        assert!(feed.poll_once().await.is_empty());
    }

    #[tokio::test]
    async fn poll_delivers_good_records_next_to_a_bad_one() {
        let f = yaml_tempfile(
            "categories:\n  a:\n    active: true\n  b:\n    active: true\n    displayDuration: \"20\"\n  c: [oops]\nsettings:\n  display:\n    lastPushed: 5\n",
        );
        let mut feed = FileFeed::new(f.path(), Duration::from_secs(1));

        let updates = feed.poll_once().await;
        assert_eq!(kinds(&updates), vec!["categories", "push"]);
        match &updates[0] {
            FeedUpdate::Categories(records) => {
                let ids: Vec<&str> = records.iter().map(|(id, _)| id.as_str()).collect();
                assert_eq!(ids, vec!["a", "b"]);
            }
            other => panic!("unexpected update: {other:?}"),
        }
        assert!(matches!(
            updates[1],
            FeedUpdate::PushSignal(Some(PushSignal::Int(5)))
        ));
    }

    #[tokio::test]
    async fn run_stops_when_receiver_dropped() {
        let f = yaml_tempfile(FEED);
        let feed = FileFeed::new(f.path(), Duration::from_millis(10));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(feed.run(tx));
        let first = rx.recv().await.unwrap();
        assert_eq!(first.source(), FeedSource::Categories);

        drop(rx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("file feed did not stop")
            .unwrap();
    }
}
