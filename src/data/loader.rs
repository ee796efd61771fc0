//! CSV Data Loader Module
//! Reads a deck list export and produces the full and non-land tables.

use super::processor::{
    DataProcessor, ProcessorError, COST_COL, DECK_COL, PRICE_COL, RANK_COL,
};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to prepare table: {0}")]
    Processing(#[from] ProcessorError),
    #[error("Required column '{0}' is missing after header normalization")]
    MissingColumn(&'static str),
}

/// Output of a load: every valid row plus the subset without lands.
#[derive(Debug, Clone)]
pub struct LoadedDecks {
    pub full: DataFrame,
    pub non_land: DataFrame,
}

impl LoadedDecks {
    /// Derive the non-land subset from an already cleaned table.
    pub fn from_full(full: DataFrame) -> Result<Self, ProcessorError> {
        let non_land = DataProcessor::non_land_subset(&full)?;
        Ok(Self { full, non_land })
    }

    pub fn row_count(&self) -> usize {
        self.full.height()
    }
}

/// Loads delimited deck exports with Polars.
#[derive(Debug, Clone, Copy)]
pub struct DataLoader {
    separator: u8,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { separator: b',' }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Read the file with every column kept as text.
    pub fn read_table(&self, file_path: &Path) -> Result<DataFrame, LoadError> {
        if !file_path.is_file() {
            return Err(LoadError::NotFound(file_path.to_path_buf()));
        }

        // Schema inference is off so numeric coercion stays under our control
        let df = LazyCsvReader::new(file_path)
            .with_separator(self.separator)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        Ok(df)
    }

    /// Load, normalize and clean a deck table.
    pub fn load(&self, file_path: &Path) -> Result<LoadedDecks, LoadError> {
        let raw = self.read_table(file_path)?;
        let raw_rows = raw.height();

        let normalized = DataProcessor::normalize_columns(raw)?;
        if normalized.column(DECK_COL).is_err() {
            return Err(LoadError::MissingColumn(DECK_COL));
        }

        let mut full = DataProcessor::drop_invalid_decks(&normalized)?;
        let dropped = raw_rows - full.height();
        if dropped > 0 {
            log::debug!("Dropped {dropped} rows belonging to invalid decks");
        }

        DataProcessor::coerce_numeric_or_zero(&mut full, PRICE_COL)?;
        DataProcessor::coerce_numeric_or_zero(&mut full, RANK_COL)?;
        DataProcessor::coerce_numeric_nullable(&mut full, COST_COL)?;

        let decks = LoadedDecks::from_full(full)?;
        log::info!(
            "Loaded {} rows from {} ({} without lands)",
            decks.full.height(),
            file_path.display(),
            decks.non_land.height()
        );
        Ok(decks)
    }
}

/// Load a comma separated deck table.
pub fn load(file_path: impl AsRef<Path>) -> Result<LoadedDecks, LoadError> {
    DataLoader::new().load(file_path.as_ref())
}
