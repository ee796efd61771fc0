//! Data Processor Module
//! Handles column normalization, row filtering and numeric coercion.

use polars::prelude::*;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DECK_COL: &str = "deck";
pub const NAME_COL: &str = "name";
pub const TYPE_COL: &str = "type";
pub const COLOR_COL: &str = "color";
pub const COMMANDER_COL: &str = "commander";
pub const PRICE_COL: &str = "price_usd";
pub const RANK_COL: &str = "edhrec_rank";
pub const COST_COL: &str = "cost";

/// Deck identifiers ending with this suffix were rejected upstream.
pub const INVALID_DECK_SUFFIX: &str = "INVALIDO";

/// Lower-case marker searched for in type lines to detect lands.
pub const LAND_MARKER: &str = "land";

/// Alternate header spellings and their canonical field names.
///
/// Keys are matched after trimming and lower-casing the raw header.
pub const COLUMN_RENAMES: &[(&str, &str)] = &[
    ("preco_usd", PRICE_COL),
    ("preco", PRICE_COL),
    ("price", PRICE_COL),
    ("usd", PRICE_COL),
    ("price usd", PRICE_COL),
    ("edhrec", RANK_COL),
    ("edhrec rank", RANK_COL),
    ("rank", RANK_COL),
    ("deck_name", DECK_COL),
    ("deck name", DECK_COL),
    ("comandante", COMMANDER_COL),
    ("is_commander", COMMANDER_COL),
    ("cor", COLOR_COL),
    ("colors", COLOR_COL),
    ("color_identity", COLOR_COL),
    ("color identity", COLOR_COL),
    ("tipo", TYPE_COL),
    ("type_line", TYPE_COL),
    ("type line", TYPE_COL),
    ("nome", NAME_COL),
    ("card", NAME_COL),
    ("card_name", NAME_COL),
    ("card name", NAME_COL),
    ("custo", COST_COL),
    ("cmc", COST_COL),
    ("mana_value", COST_COL),
];

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Columns {first:?} and {second:?} both map to '{canonical}'")]
    DuplicateColumn {
        first: String,
        second: String,
        canonical: String,
    },
    #[error("Column '{0}' is required for filtering")]
    MissingColumn(&'static str),
    #[error("Unknown color symbol '{0}' (expected one of W, U, B, R, G)")]
    UnknownColor(char),
}

/// One of the five Magic colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManaColor {
    White,
    Blue,
    Black,
    Red,
    Green,
}

impl ManaColor {
    pub const ALL: [ManaColor; 5] = [
        ManaColor::White,
        ManaColor::Blue,
        ManaColor::Black,
        ManaColor::Red,
        ManaColor::Green,
    ];

    pub fn symbol(self) -> char {
        match self {
            ManaColor::White => 'W',
            ManaColor::Blue => 'U',
            ManaColor::Black => 'B',
            ManaColor::Red => 'R',
            ManaColor::Green => 'G',
        }
    }

    pub fn from_symbol(symbol: char) -> Result<Self, ProcessorError> {
        let upper = symbol.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.symbol() == upper)
            .ok_or(ProcessorError::UnknownColor(symbol))
    }

    /// Parse a compact color string such as `"WU"` or `"b,g"`.
    pub fn parse_list(symbols: &str) -> Result<Vec<Self>, ProcessorError> {
        let mut colors = Vec::new();
        for ch in symbols.chars().filter(|c| c.is_alphabetic()) {
            let color = Self::from_symbol(ch)?;
            if !colors.contains(&color) {
                colors.push(color);
            }
        }
        Ok(colors)
    }
}

impl fmt::Display for ManaColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManaColor::White => "White",
            ManaColor::Blue => "Blue",
            ManaColor::Black => "Black",
            ManaColor::Red => "Red",
            ManaColor::Green => "Green",
        };
        f.write_str(name)
    }
}

impl FromStr for ManaColor {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(color) = Self::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(trimmed))
        {
            return Ok(color);
        }
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Self::from_symbol(ch),
            (Some(ch), Some(_)) => Err(ProcessorError::UnknownColor(ch)),
            (None, _) => Err(ProcessorError::UnknownColor(' ')),
        }
    }
}

/// Narrowing applied to a deck table before counting cards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub type_label: String,
    pub colors: Vec<ManaColor>,
}

impl CardFilter {
    pub fn new(type_label: impl Into<String>) -> Self {
        Self {
            type_label: type_label.into(),
            colors: Vec::new(),
        }
    }

    pub fn with_colors(mut self, colors: Vec<ManaColor>) -> Self {
        self.colors = colors;
        self
    }

    /// Row predicate: the type line contains the label (ignoring case) and the
    /// color identity contains every selected color. Null cells never match.
    pub fn predicate(&self, has_color_column: bool) -> Expr {
        let type_match = col(TYPE_COL)
            .str()
            .to_lowercase()
            .str()
            .contains_literal(lit(self.type_label.to_lowercase()));
        if self.colors.is_empty() {
            return type_match;
        }
        if !has_color_column {
            // Missing identities count as colorless
            return lit(false);
        }
        self.colors.iter().fold(type_match, |predicate, color| {
            predicate.and(
                col(COLOR_COL)
                    .str()
                    .to_uppercase()
                    .str()
                    .contains_literal(lit(color.symbol().to_string())),
            )
        })
    }
}

/// Case-insensitive substring test for type lines already pulled out of a frame.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Canonical field name for a raw header.
pub fn canonical_column_name(raw: &str) -> String {
    let normalized = raw.trim().to_lowercase();
    COLUMN_RENAMES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(normalized)
}

/// Lenient numeric parse: anything that is not a finite number is `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read any column as owned text cells, casting non-string columns first.
pub fn text_cells(column: &Column) -> PolarsResult<Vec<Option<String>>> {
    let as_text = column.cast(&DataType::String)?;
    let cells = as_text
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(cells)
}

/// Read a column as floats, casting if needed. Nulls stay `None`.
pub fn float_cells(column: &Column) -> PolarsResult<Vec<Option<f64>>> {
    let as_f64 = column.cast(&DataType::Float64)?;
    Ok(as_f64.f64()?.into_iter().collect())
}

/// Handles deck table cleaning and filtering operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Trim, lower-case and rename every column to its canonical name.
    pub fn normalize_columns(df: DataFrame) -> Result<DataFrame, ProcessorError> {
        let raw_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut seen: Vec<(String, String)> = Vec::with_capacity(raw_names.len());
        for raw in &raw_names {
            let canonical = canonical_column_name(raw);
            if let Some((first, _)) = seen.iter().find(|(_, c)| *c == canonical) {
                return Err(ProcessorError::DuplicateColumn {
                    first: first.clone(),
                    second: raw.clone(),
                    canonical,
                });
            }
            seen.push((raw.clone(), canonical));
        }

        let columns: Vec<Column> = df
            .take_columns()
            .into_iter()
            .zip(seen)
            .map(|(column, (_, canonical))| column.with_name(canonical.into()))
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// Drop rows whose deck ends with [`INVALID_DECK_SUFFIX`]. Null decks are kept.
    pub fn drop_invalid_decks(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        if df.column(DECK_COL).is_err() {
            return Ok(df.clone());
        }
        let valid = col(DECK_COL)
            .str()
            .ends_with(lit(INVALID_DECK_SUFFIX))
            .not()
            .or(col(DECK_COL).is_null());
        Self::filter_rows(df, valid)
    }

    /// Replace `name` with a float column where unparseable or empty cells
    /// become `0.0`. An absent column is synthesized as all zeros.
    pub fn coerce_numeric_or_zero(df: &mut DataFrame, name: &str) -> Result<(), ProcessorError> {
        let values: Vec<f64> = match df.column(name) {
            Ok(column) => text_cells(column)?
                .into_iter()
                .map(|cell| cell.as_deref().and_then(parse_number).unwrap_or(0.0))
                .collect(),
            Err(_) => vec![0.0; df.height()],
        };
        df.with_column(Column::new(name.into(), values))?;
        Ok(())
    }

    /// Replace `name` with a nullable float column. Absent columns stay absent.
    pub fn coerce_numeric_nullable(df: &mut DataFrame, name: &str) -> Result<(), ProcessorError> {
        let values: Vec<Option<f64>> = match df.column(name) {
            Ok(column) => text_cells(column)?
                .into_iter()
                .map(|cell| cell.as_deref().and_then(parse_number))
                .collect(),
            Err(_) => return Ok(()),
        };
        df.with_column(Column::new(name.into(), values))?;
        Ok(())
    }

    /// Rows whose type line does not mention a land. Missing types are kept.
    pub fn non_land_subset(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        if df.column(TYPE_COL).is_err() {
            return Ok(df.clone());
        }
        let non_land = col(TYPE_COL)
            .str()
            .to_lowercase()
            .str()
            .contains_literal(lit(LAND_MARKER))
            .not()
            .or(col(TYPE_COL).is_null());
        Self::filter_rows(df, non_land)
    }

    /// Rows matching a [`CardFilter`]. A missing color column counts as colorless.
    pub fn filter_cards(df: &DataFrame, filter: &CardFilter) -> Result<DataFrame, ProcessorError> {
        if df.column(TYPE_COL).is_err() {
            return Err(ProcessorError::MissingColumn(TYPE_COL));
        }
        let has_colors = df.column(COLOR_COL).is_ok();
        Self::filter_rows(df, filter.predicate(has_colors))
    }

    fn filter_rows(df: &DataFrame, predicate: Expr) -> Result<DataFrame, ProcessorError> {
        let filtered = df.clone().lazy().filter(predicate).collect()?;
        Ok(filtered)
    }
}
