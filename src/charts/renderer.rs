//! Static Chart Renderer
//! Draws chart specs to PNG or SVG with plotters.
//!
//! Layout:
//! 1. Bar charts: caption on top, one bar per entry, labels rotated under the axis
//! 2. Pie charts: caption on top, slices with labels and percentages
//! 3. Placeholders: a single centered message on a white canvas

use super::plotter::{ChartKind, ChartSpec, PieSlice, BAR_COLOR};
use clap::ValueEnum;
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;

const TEXT_GREY: RGBColor = RGBColor(90, 90, 90);
const MAX_LABEL_CHARS: usize = 28;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw chart '{id}': {message}")]
    Draw { id: String, message: String },
}

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Png,
    Svg,
}

impl ChartFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Svg => "svg",
        }
    }
}

/// Shorten long card names so rotated axis labels stay readable.
pub fn short_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut short: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('…');
    short
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render one chart into `path` in the requested format.
    pub fn render_to_file(
        spec: &ChartSpec,
        path: &Path,
        size: (u32, u32),
        format: ChartFormat,
    ) -> Result<(), RenderError> {
        match format {
            ChartFormat::Png => {
                let root = BitMapBackend::new(path, size).into_drawing_area();
                Self::draw_chart(&root, spec)
            }
            ChartFormat::Svg => {
                let root = SVGBackend::new(path, size).into_drawing_area();
                Self::draw_chart(&root, spec)
            }
        }
    }

    /// Render one chart to an in-memory SVG document.
    pub fn render_svg_string(spec: &ChartSpec, size: (u32, u32)) -> Result<String, RenderError> {
        let mut buffer = String::new();
        {
            let root = SVGBackend::with_string(&mut buffer, size).into_drawing_area();
            Self::draw_chart(&root, spec)?;
        }
        Ok(buffer)
    }

    fn draw_chart<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        spec: &ChartSpec,
    ) -> Result<(), RenderError> {
        let fail = |e: &dyn Display| RenderError::Draw {
            id: spec.id.clone(),
            message: e.to_string(),
        };

        root.fill(&WHITE).map_err(|e| fail(&e))?;
        match &spec.kind {
            ChartKind::Bar {
                x_label,
                y_label,
                bars,
            } => Self::draw_bars(root, &spec.title, x_label, y_label, bars).map_err(|e| fail(&e))?,
            ChartKind::Pie { slices } => {
                Self::draw_pie(root, &spec.title, slices).map_err(|e| fail(&e))?
            }
            ChartKind::Placeholder { message } => {
                Self::draw_placeholder(root, message).map_err(|e| fail(&e))?
            }
        }
        root.present().map_err(|e| fail(&e))?;
        Ok(())
    }

    fn draw_bars<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        title: &str,
        x_label: &str,
        y_label: &str,
        bars: &[(String, f64)],
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let max = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
        let y_top = if max > 0.0 { max * 1.1 } else { 1.0 };
        let labels: Vec<String> = bars
            .iter()
            .map(|(label, _)| short_label(label, MAX_LABEL_CHARS))
            .collect();

        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(160)
            .y_label_area_size(70)
            .build_cartesian_2d((0..bars.len()).into_segmented(), 0f64..y_top)?;

        let formatter = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len())
            .x_desc(x_label)
            .y_desc(y_label)
            .x_label_style(
                ("sans-serif", 11)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .x_label_formatter(&formatter)
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BAR_COLOR.filled())
                .margin(3)
                .data(bars.iter().enumerate().map(|(i, (_, v))| (i, *v))),
        )?;

        Ok(())
    }

    fn draw_pie<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        title: &str,
        slices: &[PieSlice],
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let area = root.titled(title, ("sans-serif", 22))?;
        let (w, h) = area.dim_in_pixel();
        let center = ((w / 2) as i32, (h / 2) as i32);
        let radius = f64::from(w.min(h)) * 0.38;

        let sizes: Vec<f64> = slices.iter().map(|s| s.value).collect();
        let colors: Vec<RGBColor> = slices.iter().map(|s| s.color).collect();
        let labels: Vec<String> = slices.iter().map(|s| s.label.clone()).collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.label_style(("sans-serif", 14).into_font().color(&BLACK));
        pie.percentages(("sans-serif", 12).into_font().color(&TEXT_GREY));
        area.draw(&pie)?;

        Ok(())
    }

    fn draw_placeholder<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        message: &str,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let (w, h) = root.dim_in_pixel();
        let style = TextStyle::from(("sans-serif", 24).into_font())
            .color(&TEXT_GREY)
            .pos(Pos::new(HPos::Center, VPos::Center));
        root.draw_text(message, &style, ((w / 2) as i32, (h / 2) as i32))?;
        Ok(())
    }
}
