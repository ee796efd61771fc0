//! Immutable load + analyze snapshot with explicit reload.

use crate::data::{CardFilter, DataLoader, LoadError, LoadedDecks};
use crate::stats::{AnalysisBundle, AnalysisError, DeckAnalyzer, Ranking};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Load failed: {0}")]
    Load(#[from] LoadError),
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}

/// Tables and aggregates from one pipeline run.
///
/// Clones share the same tables; nothing inside is ever mutated. A reload
/// swaps in freshly built tables and leaves older clones untouched.
#[derive(Debug, Clone)]
pub struct DeckSnapshot {
    source: Option<PathBuf>,
    loader: DataLoader,
    type_labels: Vec<String>,
    decks: Arc<LoadedDecks>,
    bundle: Arc<AnalysisBundle>,
    loaded_at: Instant,
}

impl DeckSnapshot {
    /// Load and analyze a comma separated file.
    pub fn load(path: impl AsRef<Path>, type_labels: Vec<String>) -> Result<Self, SnapshotError> {
        Self::load_with(DataLoader::new(), path, type_labels)
    }

    pub fn load_with(
        loader: DataLoader,
        path: impl AsRef<Path>,
        type_labels: Vec<String>,
    ) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let decks = loader.load(path)?;
        let mut snapshot = Self::build(decks, type_labels)?;
        snapshot.loader = loader;
        snapshot.source = Some(path.to_path_buf());
        Ok(snapshot)
    }

    /// Snapshot over tables that did not come from a file.
    pub fn from_tables(decks: LoadedDecks, type_labels: Vec<String>) -> Result<Self, SnapshotError> {
        Self::build(decks, type_labels)
    }

    fn build(decks: LoadedDecks, type_labels: Vec<String>) -> Result<Self, SnapshotError> {
        let bundle = DeckAnalyzer::analyze(&decks.full, &decks.non_land, &type_labels)?;
        Ok(Self {
            source: None,
            loader: DataLoader::new(),
            type_labels,
            decks: Arc::new(decks),
            bundle: Arc::new(bundle),
            loaded_at: Instant::now(),
        })
    }

    /// Re-run the pipeline. On failure the current data is kept.
    ///
    /// Snapshots built from tables are re-analyzed in place of a reload.
    pub fn reload(&mut self) -> Result<(), SnapshotError> {
        let fresh = match &self.source {
            Some(path) => Self::load_with(self.loader, path, self.type_labels.clone())?,
            None => {
                let mut fresh =
                    Self::build(LoadedDecks::clone(&self.decks), self.type_labels.clone())?;
                fresh.loader = self.loader;
                fresh
            }
        };
        *self = fresh;
        log::info!("Snapshot reloaded ({} rows)", self.decks.row_count());
        Ok(())
    }

    /// Reload when older than `ttl`. Returns whether a reload happened.
    pub fn refresh_if_stale(&mut self, ttl: Duration) -> Result<bool, SnapshotError> {
        if !self.is_stale(ttl) {
            return Ok(false);
        }
        self.reload()?;
        Ok(true)
    }

    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }

    pub fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn type_labels(&self) -> &[String] {
        &self.type_labels
    }

    pub fn decks(&self) -> &LoadedDecks {
        &self.decks
    }

    pub fn bundle(&self) -> &AnalysisBundle {
        &self.bundle
    }

    pub fn shared_bundle(&self) -> Arc<AnalysisBundle> {
        Arc::clone(&self.bundle)
    }

    /// Narrowed card ranking over the full table.
    pub fn cards_for_filter(&self, filter: &CardFilter) -> Result<Ranking<usize>, AnalysisError> {
        DeckAnalyzer::cards_for_filter(&self.decks.full, filter)
    }
}
