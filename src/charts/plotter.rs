//! Chart Plotter Module
//! Turns analysis aggregates into renderable chart descriptions.

use crate::data::CardFilter;
use crate::stats::{Aggregate, AnalysisBundle, Ranking};
use plotters::style::RGBColor;

/// Default number of entries shown per chart
pub const DEFAULT_TOP_N: usize = 50;

pub const BAR_COLOR: RGBColor = RGBColor(52, 152, 219); // Blue

/// Fallback palette for color identities without a fixed color
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),  // Red
    RGBColor(46, 204, 113), // Green
    RGBColor(155, 89, 182), // Purple
    RGBColor(243, 156, 18), // Orange
    RGBColor(26, 188, 156), // Teal
    RGBColor(233, 30, 99),  // Pink
    RGBColor(0, 188, 212),  // Cyan
    RGBColor(255, 87, 34),  // Deep Orange
    RGBColor(121, 85, 72),  // Brown
    RGBColor(96, 125, 139), // Blue Grey
];

/// Slice colors for commander color identities
const IDENTITY_COLORS: [(&str, RGBColor); 30] = [
    ("W", RGBColor(0xFF, 0xF9, 0xA6)),
    ("U", RGBColor(0x7E, 0xB5, 0xFF)),
    ("B", RGBColor(0x00, 0x00, 0x00)),
    ("R", RGBColor(0xFF, 0x57, 0x57)),
    ("G", RGBColor(0x4C, 0xAF, 0x50)),
    ("WU", RGBColor(0xB3, 0xE5, 0xFC)),
    ("WB", RGBColor(0x9E, 0x9E, 0x9E)),
    ("WR", RGBColor(0xFF, 0xAB, 0x91)),
    ("WG", RGBColor(0xC8, 0xE6, 0xC9)),
    ("UB", RGBColor(0x79, 0x86, 0xCB)),
    ("UR", RGBColor(0xB3, 0x9D, 0xDB)),
    ("UG", RGBColor(0x80, 0xCB, 0xC4)),
    ("BR", RGBColor(0x8D, 0x6E, 0x63)),
    ("BG", RGBColor(0x8B, 0xC3, 0x4A)),
    ("RG", RGBColor(0xFB, 0xC0, 0x2D)),
    ("GW", RGBColor(0xDC, 0xED, 0xC8)),
    ("GU", RGBColor(0xB2, 0xEB, 0xF2)),
    ("GR", RGBColor(0xFF, 0xCC, 0x80)),
    ("RW", RGBColor(0xFF, 0xCD, 0xD2)),
    ("RU", RGBColor(0x90, 0xCA, 0xF9)),
    ("BUG", RGBColor(0x00, 0x96, 0x88)),
    ("BRG", RGBColor(0x79, 0x55, 0x48)),
    ("GRW", RGBColor(0xFF, 0xA0, 0x00)),
    ("RWU", RGBColor(0xE9, 0x1E, 0x63)),
    ("WUB", RGBColor(0x3F, 0x51, 0xB5)),
    ("BGR", RGBColor(0x4E, 0x34, 0x2E)),
    ("GUW", RGBColor(0x4D, 0xB6, 0xAC)),
    ("WUR", RGBColor(0xF0, 0x62, 0x92)),
    ("BGRUW", RGBColor(0x5D, 0x40, 0x37)),
    ("", RGBColor(0xBD, 0xBD, 0xBD)),
];

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub color: RGBColor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    Bar {
        x_label: String,
        y_label: String,
        bars: Vec<(String, f64)>,
    },
    Pie {
        slices: Vec<PieSlice>,
    },
    /// Stand-in drawn when there is nothing to plot
    Placeholder {
        message: String,
    },
}

/// One chart ready to be rendered. `id` doubles as the output file stem.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
}

impl ChartSpec {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, ChartKind::Placeholder { .. })
    }
}

/// Builds the chart set for an analysis bundle.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Fill color for a commander color identity.
    pub fn identity_color(identity: &str, fallback_index: usize) -> RGBColor {
        IDENTITY_COLORS
            .iter()
            .find(|(key, _)| *key == identity)
            .map(|(_, color)| *color)
            .unwrap_or(PALETTE[fallback_index % PALETTE.len()])
    }

    pub fn placeholder(id: impl Into<String>, message: impl Into<String>) -> ChartSpec {
        ChartSpec {
            id: id.into(),
            title: String::new(),
            kind: ChartKind::Placeholder {
                message: message.into(),
            },
        }
    }

    /// Every chart for a bundle: the four headline charts, then one per type label.
    pub fn build_charts(bundle: &AnalysisBundle, top_n: usize) -> Vec<ChartSpec> {
        let mut charts = vec![
            Self::bar_chart(
                bundle,
                Aggregate::PriceByDeck,
                format!("Top {top_n} Most Expensive Decks (Total Price)"),
                "Deck",
                "Price (USD)",
                "Price data not available",
                top_n,
            ),
            Self::commander_pie(bundle),
            Self::bar_chart(
                bundle,
                Aggregate::PopularityByDeck,
                format!("Top {top_n} Decks by Popularity (EDHREC Rank)"),
                "Deck",
                "Score (Rank/100)",
                "Rank data not available",
                top_n,
            ),
            Self::bar_chart(
                bundle,
                Aggregate::CommonCards,
                format!("Top {top_n} Most Common Cards (Excluding Lands)"),
                "Card",
                "Number of Decks",
                "Common card data not available",
                top_n,
            ),
        ];

        charts.extend(bundle.cards_by_type.iter().map(|breakdown| {
            Self::card_count_chart(
                format!("type_{}", breakdown.label),
                format!("Top {top_n} {} Cards", breakdown.label),
                &breakdown.cards,
                format!("No data available for {}", breakdown.label),
                top_n,
            )
        }));

        charts
    }

    /// Chart for a narrowed type + colors query.
    pub fn filter_chart(filter: &CardFilter, ranking: &Ranking<usize>, top_n: usize) -> ChartSpec {
        let colors: String = filter.colors.iter().map(|c| c.symbol()).collect();
        let title = if colors.is_empty() {
            format!("Top {top_n} {} Cards", filter.type_label)
        } else {
            format!("Top {top_n} {} Cards ({colors})", filter.type_label)
        };
        Self::card_count_chart(
            format!("filter_{}_{}", filter.type_label, colors),
            title,
            ranking,
            format!("No {} cards match the selected colors", filter.type_label),
            top_n,
        )
    }

    fn bar_chart(
        bundle: &AnalysisBundle,
        aggregate: Aggregate,
        title: String,
        x_label: &str,
        y_label: &str,
        empty_message: &str,
        top_n: usize,
    ) -> ChartSpec {
        let bars = bundle.top_points(aggregate, top_n);
        if bars.is_empty() {
            return Self::placeholder(aggregate.key(), empty_message);
        }
        ChartSpec {
            id: aggregate.key().to_string(),
            title,
            kind: ChartKind::Bar {
                x_label: x_label.to_string(),
                y_label: y_label.to_string(),
                bars,
            },
        }
    }

    fn card_count_chart(
        id: String,
        title: String,
        ranking: &Ranking<usize>,
        empty_message: String,
        top_n: usize,
    ) -> ChartSpec {
        if ranking.is_empty() {
            return Self::placeholder(id, empty_message);
        }
        ChartSpec {
            id,
            title,
            kind: ChartKind::Bar {
                x_label: "Card".to_string(),
                y_label: "Number of Decks".to_string(),
                bars: ranking.top_points(top_n),
            },
        }
    }

    /// All identities are shown; a pie has no top-N cut.
    fn commander_pie(bundle: &AnalysisBundle) -> ChartSpec {
        let id = Aggregate::CommanderColors.key();
        if bundle.commander_colors.is_empty() {
            return Self::placeholder(id, "Color data not available");
        }
        let slices = bundle
            .commander_colors
            .iter()
            .enumerate()
            .map(|(i, entry)| PieSlice {
                label: if entry.label.is_empty() {
                    "Colorless".to_string()
                } else {
                    entry.label.clone()
                },
                value: entry.value as f64,
                color: Self::identity_color(&entry.label, i),
            })
            .collect();
        ChartSpec {
            id: id.to_string(),
            title: "Commander Color Distribution".to_string(),
            kind: ChartKind::Pie { slices },
        }
    }
}
