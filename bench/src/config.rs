//! Run configuration. Each setting is taken from the command line, then the
//! environment (a `.env` file included), then the built-in default.

use crate::corpus::{COUNTRY_CSV, UPC_CSV};
use crate::dataset::{DatasetSelector, DatasetSize};
use crate::timing::Clock;
use crate::trial::{TrialRunner, DEFAULT_TRIALS};
use anyhow::Result;
use parts_core::settings::{env_value, parse_optional, parse_setting};
use std::path::PathBuf;

pub const DB_DIR_ENV: &str = "PARTS_DB_DIR";
pub const DATA_DIR_ENV: &str = "PARTS_DATA_DIR";
pub const TRIALS_ENV: &str = "PARTS_TRIALS";
pub const CLOCK_ENV: &str = "PARTS_CLOCK";
pub const SEED_ENV: &str = "PARTS_SEED";

pub const DEFAULT_DB_DIR: &str = "SQLiteDBs";
pub const DEFAULT_DATA_DIR: &str = "Data";

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub trials: Option<u32>,
    pub clock: Option<Clock>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub db_dir: PathBuf,
    pub data_dir: PathBuf,
    pub trials: u32,
    pub clock: Clock,
    pub seed: Option<u64>,
}

impl BenchConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        Self::from_lookup(overrides, env_value)
    }

    /// Resolve against an arbitrary variable lookup.
    pub fn from_lookup<F>(overrides: ConfigOverrides, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_dir = match overrides.db_dir {
            Some(dir) => dir,
            None => lookup(DB_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_DIR)),
        };
        let data_dir = match overrides.data_dir {
            Some(dir) => dir,
            None => lookup(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        };
        let trials = match overrides.trials {
            Some(trials) => trials,
            None => parse_setting(TRIALS_ENV, lookup(TRIALS_ENV), DEFAULT_TRIALS)?,
        };
        let clock = match overrides.clock {
            Some(clock) => clock,
            None => parse_setting(CLOCK_ENV, lookup(CLOCK_ENV), Clock::default())?,
        };
        let seed = match overrides.seed {
            Some(seed) => Some(seed),
            None => parse_optional(SEED_ENV, lookup(SEED_ENV))?,
        };

        Ok(Self {
            db_dir,
            data_dir,
            trials,
            clock,
            seed,
        })
    }

    pub fn country_csv(&self) -> PathBuf {
        self.data_dir.join(COUNTRY_CSV)
    }

    pub fn upc_csv(&self) -> PathBuf {
        self.data_dir.join(UPC_CSV)
    }

    /// Databases to work on; all five when `sizes` is empty.
    pub fn selector(&self, sizes: &[DatasetSize]) -> DatasetSelector {
        if sizes.is_empty() {
            DatasetSelector::all(&self.db_dir)
        } else {
            DatasetSelector::new(&self.db_dir, sizes)
        }
    }

    pub fn trial_runner(&self) -> Result<TrialRunner> {
        TrialRunner::new(self.trials, self.clock)
    }
}
