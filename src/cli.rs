//! CLI definition.

use crate::charts::ChartFormat;
use crate::config::{AppConfig, ConfigError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Commander deck statistics and chart reports
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON). Defaults to ./deckstats.json when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Deck table to analyze
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    /// Field separator of the deck table
    #[arg(long, global = true)]
    pub separator: Option<char>,

    /// Entries shown per ranked chart or listing
    #[arg(short, long, global = true)]
    pub top: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze the deck table, then write every chart and summary.json
    Report {
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Card type labels, comma separated
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,

        /// Chart image format
        #[arg(short, long, value_enum)]
        format: Option<ChartFormat>,

        /// Keep running and rewrite the report whenever the snapshot expires
        #[arg(long)]
        watch: bool,
    },
    /// Rank the cards of one type, optionally only in decks holding all given colors
    Cards {
        /// Type label matched against type lines (case-insensitive)
        #[arg(short = 'T', long = "type")]
        type_label: String,

        /// Color symbols, e.g. WU
        #[arg(long, default_value = "")]
        colors: String,

        /// Also render the ranking as a chart to this file
        #[arg(long)]
        chart: Option<PathBuf>,
    },
}

impl Cli {
    /// Config file values with command line overrides applied.
    pub fn resolve_config(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::discover(self.config.as_deref())?;

        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(separator) = self.separator {
            config.separator = separator;
        }
        if let Some(top) = self.top {
            config.top_n = top;
        }
        if let Command::Report {
            output,
            types,
            format,
            ..
        } = &self.command
        {
            if let Some(output) = output {
                config.output_dir = output.clone();
            }
            if !types.is_empty() {
                config.type_labels = types.iter().map(|t| t.trim().to_string()).collect();
            }
            if let Some(format) = format {
                config.chart.format = *format;
            }
        }

        config.validate()?;
        Ok(config)
    }
}
