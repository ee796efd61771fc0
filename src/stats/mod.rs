//! Stats module - deck aggregates

mod analyzer;
mod ranking;

pub use analyzer::{
    analyze, is_truthy_flag, Aggregate, AnalysisBundle, AnalysisError, DeckAnalyzer,
    TypeBreakdown, POPULARITY_SCALE, REQUIRED_FIELDS,
};
pub use ranking::{ChartValue, RankEntry, Ranking};
