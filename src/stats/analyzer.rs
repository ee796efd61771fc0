//! Deck Statistics Analyzer
//! Computes the named aggregates used by the chart layer.

use super::ranking::{FirstSeen, Ranking};
use crate::data::{
    contains_ignore_case, float_cells, parse_number, text_cells, CardFilter, DataProcessor, ProcessorError,
    COLOR_COL, COMMANDER_COL, DECK_COL, NAME_COL, PRICE_COL, RANK_COL, TYPE_COL,
};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Fields `analyze` cannot work without.
pub const REQUIRED_FIELDS: [&str; 5] = [DECK_COL, COMMANDER_COL, COLOR_COL, TYPE_COL, NAME_COL];

/// EDHREC rank sums are reported in hundreds.
pub const POPULARITY_SCALE: f64 = 100.0;

/// Commander flag spellings read as true (compared lower-cased).
const TRUTHY_FLAGS: [&str; 6] = ["true", "t", "yes", "y", "sim", "s"];

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Required field '{field}' is missing from the {table} table")]
    MissingField {
        field: &'static str,
        table: &'static str,
    },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Filter error: {0}")]
    Filter(#[from] ProcessorError),
}

/// The single-ranking aggregates, by their bundle key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    PriceByDeck,
    CommanderColors,
    CommonCards,
    PopularityByDeck,
}

impl Aggregate {
    pub fn key(self) -> &'static str {
        match self {
            Aggregate::PriceByDeck => "price_by_deck",
            Aggregate::CommanderColors => "commander_colors",
            Aggregate::CommonCards => "common_cards",
            Aggregate::PopularityByDeck => "popularity_by_deck",
        }
    }
}

/// Card ranking for one requested type label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeBreakdown {
    pub label: String,
    pub cards: Ranking<usize>,
}

/// Every aggregate produced by one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisBundle {
    pub distinct_deck_count: usize,
    pub price_by_deck: Ranking<f64>,
    pub commander_colors: Ranking<usize>,
    pub common_cards: Ranking<usize>,
    pub popularity_by_deck: Ranking<f64>,
    pub cards_by_type: Vec<TypeBreakdown>,
}

impl AnalysisBundle {
    /// Bundle with every aggregate present and empty.
    pub fn empty(type_labels: &[String]) -> Self {
        Self {
            distinct_deck_count: 0,
            price_by_deck: Ranking::default(),
            commander_colors: Ranking::default(),
            common_cards: Ranking::default(),
            popularity_by_deck: Ranking::default(),
            cards_by_type: unique_labels(type_labels)
                .into_iter()
                .map(|label| TypeBreakdown {
                    label,
                    cards: Ranking::default(),
                })
                .collect(),
        }
    }

    pub fn cards_of_type(&self, label: &str) -> Option<&Ranking<usize>> {
        self.cards_by_type
            .iter()
            .find(|t| t.label == label)
            .map(|t| &t.cards)
    }

    /// Top `n` points of a single-ranking aggregate.
    pub fn top_points(&self, aggregate: Aggregate, n: usize) -> Vec<(String, f64)> {
        match aggregate {
            Aggregate::PriceByDeck => self.price_by_deck.top_points(n),
            Aggregate::CommanderColors => self.commander_colors.top_points(n),
            Aggregate::CommonCards => self.common_cards.top_points(n),
            Aggregate::PopularityByDeck => self.popularity_by_deck.top_points(n),
        }
    }
}

/// Column vectors pulled out of a frame once, so every aggregate walks plain slices.
struct CardRows {
    deck: Vec<Option<String>>,
    name: Vec<Option<String>>,
    type_line: Vec<Option<String>>,
    color: Vec<Option<String>>,
    commander: Vec<bool>,
    price: Vec<f64>,
    rank: Vec<f64>,
}

impl CardRows {
    fn from_frame(
        df: &DataFrame,
        table: &'static str,
        required: &[&'static str],
    ) -> Result<Self, AnalysisError> {
        if let Some(&field) = required.iter().find(|f| df.column(f).is_err()) {
            return Err(AnalysisError::MissingField { field, table });
        }

        let height = df.height();
        let text = |name: &str| -> Result<Vec<Option<String>>, AnalysisError> {
            match df.column(name) {
                Ok(column) => Ok(text_cells(column)?),
                Err(_) => Ok(vec![None; height]),
            }
        };
        let numbers = |name: &str| -> Result<Vec<f64>, AnalysisError> {
            match df.column(name) {
                Ok(column) => Ok(float_cells(column)?
                    .into_iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect()),
                Err(_) => Ok(vec![0.0; height]),
            }
        };

        Ok(Self {
            deck: text(DECK_COL)?,
            name: text(NAME_COL)?,
            type_line: text(TYPE_COL)?,
            color: text(COLOR_COL)?,
            commander: text(COMMANDER_COL)?
                .iter()
                .map(|flag| flag.as_deref().is_some_and(is_truthy_flag))
                .collect(),
            price: numbers(PRICE_COL)?,
            rank: numbers(RANK_COL)?,
        })
    }

    fn len(&self) -> usize {
        self.deck.len()
    }
}

/// Whether a commander cell marks its row as the deck's commander.
///
/// Any spelling of the number 1 (`1`, `1.00`, `01`) counts, as do the words in
/// [`TRUTHY_FLAGS`].
pub fn is_truthy_flag(cell: &str) -> bool {
    if parse_number(cell) == Some(1.0) {
        return true;
    }
    let normalized = cell.trim().to_lowercase();
    TRUTHY_FLAGS.contains(&normalized.as_str())
}

fn unique_labels(type_labels: &[String]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::with_capacity(type_labels.len());
    for label in type_labels {
        if !labels.contains(label) {
            labels.push(label.clone());
        }
    }
    labels
}

/// Handles deck aggregate computations.
pub struct DeckAnalyzer;

impl DeckAnalyzer {
    /// Compute the full aggregate bundle.
    pub fn analyze(
        full: &DataFrame,
        non_land: &DataFrame,
        type_labels: &[String],
    ) -> Result<AnalysisBundle, AnalysisError> {
        if full.height() == 0 {
            return Ok(AnalysisBundle::empty(type_labels));
        }

        let rows = CardRows::from_frame(full, "full", &REQUIRED_FIELDS)?;
        let non_land_rows = if non_land.height() == 0 {
            None
        } else {
            Some(CardRows::from_frame(
                non_land,
                "non-land",
                &[DECK_COL, NAME_COL, TYPE_COL],
            )?)
        };

        let bundle = AnalysisBundle {
            distinct_deck_count: Self::distinct_deck_count(&rows),
            price_by_deck: Self::positive_sum_by_deck(&rows, &rows.price, 1.0),
            commander_colors: Self::commander_colors(&rows),
            common_cards: non_land_rows
                .as_ref()
                .map(|r| Self::decks_per_card(r, |_| true))
                .unwrap_or_default(),
            popularity_by_deck: Self::positive_sum_by_deck(&rows, &rows.rank, POPULARITY_SCALE),
            cards_by_type: unique_labels(type_labels)
                .into_iter()
                .map(|label| {
                    let cards = Self::decks_per_card(&rows, |i| {
                        rows.type_line[i]
                            .as_deref()
                            .is_some_and(|t| contains_ignore_case(t, &label))
                    });
                    TypeBreakdown { label, cards }
                })
                .collect(),
        };

        log::debug!(
            "Analyzed {} rows: {} decks, {} commander identities, {} distinct non-land cards",
            rows.len(),
            bundle.distinct_deck_count,
            bundle.commander_colors.len(),
            bundle.common_cards.len()
        );
        Ok(bundle)
    }

    /// Distinct-deck card counts over rows matching a [`CardFilter`].
    pub fn cards_for_filter(
        df: &DataFrame,
        filter: &CardFilter,
    ) -> Result<Ranking<usize>, AnalysisError> {
        let narrowed = DataProcessor::filter_cards(df, filter)?;
        if narrowed.height() == 0 {
            return Ok(Ranking::default());
        }
        let rows = CardRows::from_frame(&narrowed, "filtered", &[DECK_COL, NAME_COL])?;
        Ok(Self::decks_per_card(&rows, |_| true))
    }

    fn distinct_deck_count(rows: &CardRows) -> usize {
        rows.deck
            .iter()
            .flatten()
            .collect::<HashSet<&String>>()
            .len()
    }

    /// Per-deck sum of `values` divided by `scale`, keeping positive totals only.
    fn positive_sum_by_deck(rows: &CardRows, values: &[f64], scale: f64) -> Ranking<f64> {
        let mut totals: FirstSeen<f64> = FirstSeen::default();
        for (deck, value) in rows.deck.iter().zip(values) {
            if let Some(deck) = deck {
                *totals.entry(deck) += value;
            }
        }
        Ranking::from_groups(
            totals
                .into_groups()
                .into_iter()
                .map(|(deck, total)| (deck, total / scale))
                .filter(|(_, total)| *total > 0.0),
        )
    }

    /// First commander-flagged row per deck decides the deck's identity.
    fn commander_colors(rows: &CardRows) -> Ranking<usize> {
        let mut decks_seen: FirstSeen<()> = FirstSeen::default();
        let mut colors: FirstSeen<usize> = FirstSeen::default();

        for i in 0..rows.len() {
            if !rows.commander[i] {
                continue;
            }
            let Some(deck) = rows.deck[i].as_deref() else {
                continue;
            };
            if decks_seen.contains(deck) {
                continue;
            }
            decks_seen.entry(deck);
            // A commander without a color identity is colorless
            *colors.entry(rows.color[i].as_deref().unwrap_or_default()) += 1;
        }

        Ranking::from_groups(colors.into_groups())
    }

    /// Number of distinct decks each card name appears in, over rows kept by `keep`.
    fn decks_per_card(rows: &CardRows, keep: impl Fn(usize) -> bool) -> Ranking<usize> {
        let mut cards: FirstSeen<HashSet<String>> = FirstSeen::default();
        for i in 0..rows.len() {
            let (Some(deck), Some(name)) = (rows.deck[i].as_deref(), rows.name[i].as_deref())
            else {
                continue;
            };
            if keep(i) {
                cards.entry(name).insert(deck.to_string());
            }
        }
        Ranking::from_groups(
            cards
                .into_groups()
                .into_iter()
                .map(|(name, decks)| (name, decks.len())),
        )
    }
}

/// Run the analysis over a full table and its non-land subset.
pub fn analyze(
    full: &DataFrame,
    non_land: &DataFrame,
    type_labels: &[String],
) -> Result<AnalysisBundle, AnalysisError> {
    DeckAnalyzer::analyze(full, non_land, type_labels)
}
