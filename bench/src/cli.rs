//! Command-line arguments shared by the two binaries.

use crate::config::ConfigOverrides;
use crate::dataset::DatasetSize;
use crate::suite::SuiteKind;
use crate::timing::Clock;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;

/// Log level options
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only errors
    Error,
    /// Warnings and errors
    Warn,
    /// Info, warnings, and errors
    Info,
    /// Debug messages and above
    Debug,
    /// Everything, including per-trial timings
    Trace,
    /// Disable all logging
    Off,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    /// Set log level
    #[arg(short = 'l', long = "log-level", global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Verbose mode (equivalent to --log-level debug)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Also append log records to this file
    #[arg(long = "log-file", global = true)]
    pub log_file: Option<PathBuf>,
}

impl LoggingArgs {
    pub fn level(&self) -> LevelFilter {
        match self.log_level {
            Some(level) => level.to_level_filter(),
            None if self.verbose => LevelFilter::Debug,
            None => LevelFilter::Info,
        }
    }

    pub fn init(&self) -> anyhow::Result<()> {
        parts_core::initialize_logger(self.level(), self.log_file.as_deref())
    }
}

/// Location and reproducibility settings shared by both tools.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Directory holding the database files [env: PARTS_DB_DIR]
    #[arg(long, global = true)]
    pub db_dir: Option<PathBuf>,

    /// Directory holding the CSV corpora [env: PARTS_DATA_DIR]
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Dataset sizes to use, comma separated (100, 1K, 10K, 100K, 1M)
    #[arg(long, value_delimiter = ',', global = true)]
    pub sizes: Vec<DatasetSize>,

    /// Seed for the random number generator [env: PARTS_SEED]
    #[arg(long, global = true)]
    pub seed: Option<u64>,
}

/// Parts table query benchmark
#[derive(Parser, Debug)]
#[command(name = "parts-bench")]
#[command(about = "Time SQL queries on the Parts databases with and without indexes")]
#[command(version)]
pub struct BenchCli {
    #[command(flatten)]
    pub logging: LoggingArgs,

    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: BenchCommand,
}

#[derive(Subcommand, Debug)]
pub enum BenchCommand {
    /// Run one benchmark suite, or all of them
    Run {
        /// Suite to run
        #[arg(value_enum)]
        suite: SuiteChoice,

        /// Trials per query and database [env: PARTS_TRIALS]
        #[arg(short = 'n', long)]
        trials: Option<u32>,

        /// Clock used to time each trial [env: PARTS_CLOCK]
        #[arg(long)]
        clock: Option<Clock>,

        /// Also run slow queries on the large databases
        #[arg(long)]
        no_skip: bool,

        /// Write every result to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the databases with their row counts, sizes and indexes
    Sizes,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SuiteChoice {
    Part1,
    Part2,
    Part3,
    Part4,
    All,
}

impl SuiteChoice {
    pub fn suites(self) -> Vec<SuiteKind> {
        match self {
            SuiteChoice::Part1 => vec![SuiteKind::Part1],
            SuiteChoice::Part2 => vec![SuiteKind::Part2],
            SuiteChoice::Part3 => vec![SuiteKind::Part3],
            SuiteChoice::Part4 => vec![SuiteKind::Part4],
            SuiteChoice::All => SuiteKind::ALL.to_vec(),
        }
    }
}

/// Parts dataset generator
#[derive(Parser, Debug)]
#[command(name = "parts-datagen")]
#[command(about = "Generate the Parts databases from the country and UPC corpora")]
#[command(version)]
pub struct DatagenCli {
    #[command(flatten)]
    pub logging: LoggingArgs,

    #[command(flatten)]
    pub common: CommonArgs,

    /// Delete existing database files before generating
    #[arg(short, long)]
    pub force: bool,
}

impl CommonArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            db_dir: self.db_dir.clone(),
            data_dir: self.data_dir.clone(),
            seed: self.seed,
            ..Default::default()
        }
    }
}
