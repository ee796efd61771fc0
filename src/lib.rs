//! deckstats - Commander deck statistics
//!
//! Loads deck list exports, aggregates them into a fixed set of rankings and
//! renders those rankings as static charts.

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use data::{load, LoadError, LoadedDecks};
pub use pipeline::{DeckSnapshot, SnapshotError};
pub use stats::{analyze, AnalysisBundle, AnalysisError};
