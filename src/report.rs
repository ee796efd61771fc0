//! Report Writer Module
//! Renders the chart set and writes `summary.json` into an output directory.

use crate::charts::{ChartFormat, ChartPlotter, ChartSpec, RenderError, StaticChartRenderer};
use crate::config::{AppConfig, ChartConfig};
use crate::stats::AnalysisBundle;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SUMMARY_FILE: &str = "summary.json";

/// Chart id used for the degraded report.
pub const UNAVAILABLE_CHART_ID: &str = "unavailable";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Failed to write summary: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Complete,
    Degraded,
}

/// Contents of `summary.json`.
#[derive(Debug, Serialize)]
pub struct ReportSummary<'a> {
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub top_n: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<&'a AnalysisBundle>,
    pub charts: Vec<String>,
}

/// Files written by one report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportManifest {
    pub summary_path: PathBuf,
    pub chart_paths: Vec<PathBuf>,
}

fn safe_stem(chart_id: &str) -> String {
    chart_id
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File name for a chart id: anything outside `[A-Za-z0-9_-]` becomes `_`.
pub fn chart_file_name(chart_id: &str, format: ChartFormat) -> String {
    format!("{}.{}", safe_stem(chart_id), format.extension())
}

/// File names for a chart set, in chart order. Ids that sanitize to a name
/// already taken get a `_2`, `_3`, ... suffix.
pub fn unique_chart_file_names(charts: &[ChartSpec], format: ChartFormat) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(charts.len());
    charts
        .iter()
        .map(|spec| {
            let stem = safe_stem(&spec.id);
            let mut name = chart_file_name(&spec.id, format);
            let mut suffix = 2;
            while !taken.insert(name.clone()) {
                name = format!("{}_{}.{}", stem, suffix, format.extension());
                suffix += 1;
            }
            name
        })
        .collect()
}

pub struct ReportWriter {
    output_dir: PathBuf,
    chart: ChartConfig,
    top_n: usize,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>, chart: ChartConfig, top_n: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            chart,
            top_n,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.output_dir.clone(), config.chart.clone(), config.top_n)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Full report: every chart of the bundle plus the summary.
    pub fn write(
        &self,
        bundle: &AnalysisBundle,
        source: Option<&Path>,
    ) -> Result<ReportManifest, ReportError> {
        self.ensure_output_dir()?;
        let charts = ChartPlotter::build_charts(bundle, self.top_n);
        let chart_paths = self.render_charts(&charts)?;

        let summary = ReportSummary {
            status: ReportStatus::Complete,
            source: source.map(|p| p.display().to_string()),
            top_n: self.top_n,
            message: None,
            analysis: Some(bundle),
            charts: Self::file_names(&chart_paths),
        };
        let summary_path = self.write_summary(&summary)?;
        log::info!(
            "Wrote {} charts and {} to {}",
            chart_paths.len(),
            SUMMARY_FILE,
            self.output_dir.display()
        );

        Ok(ReportManifest {
            summary_path,
            chart_paths,
        })
    }

    /// Placeholder report used when the pipeline could not produce a bundle.
    pub fn write_degraded(&self, message: &str) -> Result<ReportManifest, ReportError> {
        self.ensure_output_dir()?;
        let placeholder = ChartPlotter::placeholder(UNAVAILABLE_CHART_ID, message);
        let chart_paths = self.render_charts(std::slice::from_ref(&placeholder))?;

        let summary = ReportSummary {
            status: ReportStatus::Degraded,
            source: None,
            top_n: self.top_n,
            message: Some(message),
            analysis: None,
            charts: Self::file_names(&chart_paths),
        };
        let summary_path = self.write_summary(&summary)?;
        log::warn!("Wrote degraded report to {}", self.output_dir.display());

        Ok(ReportManifest {
            summary_path,
            chart_paths,
        })
    }

    /// Render charts in parallel. Output order follows `charts`.
    pub fn render_charts(&self, charts: &[ChartSpec]) -> Result<Vec<PathBuf>, ReportError> {
        let size = self.chart.size();
        let format = self.chart.format;

        let names = unique_chart_file_names(charts, format);

        charts
            .par_iter()
            .zip(names.par_iter())
            .map(|(spec, name)| -> Result<PathBuf, ReportError> {
                let path = self.output_dir.join(name);
                StaticChartRenderer::render_to_file(spec, &path, size, format)?;
                log::debug!("Rendered {}", path.display());
                Ok(path)
            })
            .collect()
    }

    pub fn write_summary(&self, summary: &ReportSummary<'_>) -> Result<PathBuf, ReportError> {
        self.ensure_output_dir()?;
        let path = self.output_dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(summary)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    fn ensure_output_dir(&self) -> Result<(), ReportError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ReportError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })
    }

    fn file_names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .filter_map(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }
}
