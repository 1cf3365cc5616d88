use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::utils::constants::{DEFAULT_ROW_GROUP_SIZE, OBSERVATIONS_TABLE};

#[derive(Parser)]
#[command(name = "station-obs-merger")]
#[command(about = "Merge daily weather observations from several sources into one record per station-day")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Suppress progress output")]
    pub quiet: bool,

    #[arg(
        short,
        long,
        global = true,
        help = "Configuration file (TOML, YAML or JSON)"
    )]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// Overrides shared by the merge subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[arg(long, help = "Run date [default: today]")]
    pub run_date: Option<NaiveDate>,

    #[arg(short, long, help = "Directory holding retrieved feed files")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, help = "Store snapshot file")]
    pub store: Option<PathBuf>,

    #[arg(long, help = "Only process this GHCN station id")]
    pub station: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read complete station histories, long-term normals and the decade tables
    Historical {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Read the current GHCN file, this year's GSOD file and recent CF6 reports
    Recent {
        #[command(flatten)]
        run: RunArgs,

        #[arg(long, help = "Days before the run date still considered recent")]
        window_days: Option<i64>,
    },

    /// Export a store table to Parquet or CSV
    Export {
        #[arg(short, long, help = "Store snapshot file")]
        store: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output file path [default: output/observations-{YYMMDD}.{ext}]"
        )]
        output_file: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Parquet)]
        format: ExportFormat,

        #[arg(long, default_value = "snappy")]
        compression: String,

        #[arg(long, default_value_t = DEFAULT_ROW_GROUP_SIZE, help = "Rows per Parquet row group")]
        row_group_size: usize,

        #[arg(short, long, default_value = OBSERVATIONS_TABLE)]
        table: String,
    },

    /// Display information about an exported Parquet file
    Info {
        #[arg(short, long, help = "Parquet file to inspect")]
        file: PathBuf,

        #[arg(short, long, default_value = "10", help = "Number of sample rows")]
        sample: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Parquet,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Parquet => "parquet",
            ExportFormat::Csv => "csv",
        }
    }
}
