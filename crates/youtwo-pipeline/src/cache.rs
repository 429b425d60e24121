//! Dated on-disk snapshot cache
//!
//! One file per local calendar day, `knowledge_graph-YYYY-MM-DD.json`, so a
//! "frozen" run reuses whatever was fetched earlier the same day.

use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use youtwo_core::{GraphResult, GraphSnapshot};

const CACHE_PREFIX: &str = "knowledge_graph";

#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
    date: NaiveDate,
}

impl SnapshotCache {
    /// Cache keyed on today's local date
    pub fn today(dir: impl Into<PathBuf>) -> Self {
        Self::for_date(dir, Local::now().date_naive())
    }

    pub fn for_date(dir: impl Into<PathBuf>, date: NaiveDate) -> Self {
        Self {
            dir: dir.into(),
            date,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!(
            "{CACHE_PREFIX}-{}.json",
            self.date.format("%Y-%m-%d")
        ))
    }

    /// Cached snapshot for this date, if one exists and parses.
    ///
    /// An unreadable cache file counts as a miss.
    pub fn load(&self) -> Option<GraphSnapshot> {
        let path = self.path();
        if !path.is_file() {
            debug!("No cached snapshot at {}", path.display());
            return None;
        }

        match GraphSnapshot::load(&path) {
            Ok(snapshot) => {
                debug!("Using cached snapshot {}", path.display());
                Some(snapshot)
            }
            Err(e) => {
                warn!("Ignoring unreadable cache {}: {}", path.display(), e.chain());
                None
            }
        }
    }

    pub fn store(&self, snapshot: &GraphSnapshot) -> GraphResult<PathBuf> {
        snapshot.save(self.path())
    }
}
