//! Charts module - chart building and rendering

mod plotter;
mod renderer;

pub use plotter::{ChartKind, ChartPlotter, ChartSpec, PieSlice, DEFAULT_TOP_N, PALETTE};
pub use renderer::{short_label, ChartFormat, RenderError, StaticChartRenderer};
