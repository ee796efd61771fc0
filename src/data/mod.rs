//! Data module - CSV loading and processing

mod loader;
mod processor;

pub use loader::{load, DataLoader, LoadError, LoadedDecks};
pub use processor::{
    canonical_column_name, contains_ignore_case, float_cells, parse_number, text_cells,
    CardFilter, DataProcessor, ManaColor, ProcessorError, COLOR_COL, COLUMN_RENAMES,
    COMMANDER_COL, COST_COL, DECK_COL, INVALID_DECK_SUFFIX, LAND_MARKER, NAME_COL, PRICE_COL,
    RANK_COL, TYPE_COL,
};
