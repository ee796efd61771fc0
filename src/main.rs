//! deckstats - Commander deck statistics & static chart reports

use anyhow::{Context, Result};
use clap::Parser;
use deckstats::charts::{ChartPlotter, StaticChartRenderer};
use deckstats::cli::{Cli, Command};
use deckstats::config::AppConfig;
use deckstats::data::{CardFilter, DataLoader, ManaColor};
use deckstats::pipeline::DeckSnapshot;
use deckstats::report::ReportWriter;
use std::path::Path;
use std::thread;

const UNAVAILABLE_MESSAGE: &str = "Data could not be loaded. Please try again later.";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = cli
        .resolve_config()
        .context("Failed to resolve configuration")?;

    match &cli.command {
        Command::Report { watch, .. } => run_report(&config, *watch),
        Command::Cards {
            type_label,
            colors,
            chart,
        } => run_cards(&config, type_label, colors, chart.as_deref()),
    }
}

fn load_snapshot(config: &AppConfig) -> Result<DeckSnapshot, deckstats::SnapshotError> {
    let loader = DataLoader::new().with_separator(config.separator_byte());
    DeckSnapshot::load_with(loader, &config.input, config.type_labels.clone())
}

fn run_report(config: &AppConfig, watch: bool) -> Result<()> {
    let writer = ReportWriter::from_config(config);

    let mut snapshot = match load_snapshot(config) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            // Failed pipelines still leave a readable report behind
            log::error!("Pipeline failed for {}: {e}", config.input.display());
            writer
                .write_degraded(UNAVAILABLE_MESSAGE)
                .context("Failed to write degraded report")?;
            return Ok(());
        }
    };

    let manifest = writer
        .write(snapshot.bundle(), snapshot.source())
        .context("Failed to write report")?;
    println!("{}", manifest.summary_path.display());

    if !watch {
        return Ok(());
    }

    let ttl = config.cache_ttl();
    loop {
        thread::sleep(ttl.saturating_sub(snapshot.age()));
        match snapshot.refresh_if_stale(ttl) {
            Ok(true) => {
                writer
                    .write(snapshot.bundle(), snapshot.source())
                    .context("Failed to write report")?;
            }
            Ok(false) => {}
            Err(e) => log::error!("Reload failed, keeping previous snapshot: {e}"),
        }
    }
}

fn run_cards(
    config: &AppConfig,
    type_label: &str,
    colors: &str,
    chart: Option<&Path>,
) -> Result<()> {
    let colors = ManaColor::parse_list(colors).context("Invalid --colors")?;
    let filter = CardFilter::new(type_label).with_colors(colors);

    let snapshot = load_snapshot(config)
        .with_context(|| format!("Failed to analyze {}", config.input.display()))?;
    let ranking = snapshot.cards_for_filter(&filter)?;

    if ranking.is_empty() {
        println!("No {type_label} cards match");
    }
    for (i, entry) in ranking.top(config.top_n).iter().enumerate() {
        println!("{:>3}. {:<40} {}", i + 1, entry.label, entry.value);
    }

    if let Some(path) = chart {
        let spec = ChartPlotter::filter_chart(&filter, &ranking, config.top_n);
        StaticChartRenderer::render_to_file(&spec, path, config.chart.size(), config.chart.format)
            .with_context(|| format!("Failed to render {}", path.display()))?;
        log::info!("Chart written to {}", path.display());
    }

    Ok(())
}
