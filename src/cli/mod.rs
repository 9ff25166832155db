pub mod completions;
pub mod config;
pub mod inspect;
pub mod report;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use crate::criteria::Variant;
use crate::error::{MetricsError, Result};
use crate::settings::{load_settings, Settings};

#[derive(Parser)]
#[command(
    name = "portfolio-metrics",
    about = "Count CIFs, payment accounts and e-KYC accounts in a bank account export."
)]
pub struct Cli {
    /// Settings file (default: ~/.config/portfolio-metrics/settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the portfolio metrics for an XLSX/XLS/CSV export.
    Report {
        /// Path to the account export
        file: PathBuf,
        /// Worksheet name (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,
        /// Metric definitions to apply
        #[arg(long, value_enum)]
        variant: Option<Variant>,
        /// Reference date for ages: YYYY-MM-DD (default: today)
        #[arg(long = "as-of")]
        as_of: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Check the required columns and preview the first rows.
    Inspect {
        /// Path to the account export
        file: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long, value_enum)]
        variant: Option<Variant>,
        /// Number of rows to preview
        #[arg(long, default_value = "5")]
        rows: usize,
    },
    /// Show or create the settings file.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings as JSON.
    Show,
    /// Write default settings.
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

pub(crate) fn settings(config: Option<&Path>) -> Result<Settings> {
    load_settings(config)
}

pub(crate) fn parse_as_of(as_of: Option<&str>) -> Result<NaiveDate> {
    match as_of {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| MetricsError::InvalidDate(s.to_string())),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
