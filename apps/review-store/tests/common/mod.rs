//! Shared fixtures for review-store integration tests.

#![allow(dead_code)]

use review_core::{CollectionConfig, ManualClock, ReviewCollection};
use review_store::db::SqliteCardSource;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub type Collection = ReviewCollection<SqliteCardSource<Arc<ManualClock>>>;

/// A temporary database directory that lives as long as the fixture.
pub struct TestDb {
    pub dir: TempDir,
    pub clock: Arc<ManualClock>,
}

impl TestDb {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
            clock: Arc::new(ManualClock::default()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("cards.db")
    }

    pub fn open(&self) -> Collection {
        open_at(&self.path(), self.clock.clone())
    }
}

pub fn open_at(path: &Path, clock: Arc<ManualClock>) -> Collection {
    let source = SqliteCardSource::open(path, clock).expect("open database");
    let config = source
        .load_config()
        .expect("load config")
        .unwrap_or_else(CollectionConfig::default);
    ReviewCollection::new(source, config)
}
