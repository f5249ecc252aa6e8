//! Timed trials of one query against one database file.

use crate::dataset::{self, DatasetSize};
use crate::queries::{ParamValue, Query};
use crate::timing::Clock;
use anyhow::{bail, Context, Result};
use log::trace;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TRIALS: u32 = 100;

/// Timing of every trial of one query on one database.
#[derive(Debug, Clone)]
pub struct TrialResult {
    pub size: DatasetSize,
    pub path: PathBuf,
    pub trials: u32,
    pub total: Duration,
    pub file_size: u64,
    /// Rows returned by the last trial.
    pub rows: usize,
}

impl TrialResult {
    pub fn average(&self) -> Duration {
        self.total / self.trials.max(1)
    }

    pub fn average_ms(&self) -> f64 {
        self.average().as_secs_f64() * 1000.0
    }
}

#[derive(Debug, Clone)]
pub enum TrialOutcome {
    Measured(TrialResult),
    /// The database was deliberately not measured.
    Skipped { size: DatasetSize, path: PathBuf },
}

impl TrialOutcome {
    pub fn size(&self) -> DatasetSize {
        match self {
            TrialOutcome::Measured(result) => result.size,
            TrialOutcome::Skipped { size, .. } => *size,
        }
    }

    pub fn result(&self) -> Option<&TrialResult> {
        match self {
            TrialOutcome::Measured(result) => Some(result),
            TrialOutcome::Skipped { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrialRunner {
    trials: u32,
    clock: Clock,
}

impl Default for TrialRunner {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            clock: Clock::default(),
        }
    }
}

impl TrialRunner {
    pub fn new(trials: u32, clock: Clock) -> Result<Self> {
        if trials == 0 {
            bail!("trial count must be at least 1");
        }
        Ok(Self { trials, clock })
    }

    pub fn trials(&self) -> u32 {
        self.trials
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Time `query` against the database at `path`.
    ///
    /// `next_param` is called before each trial and is not timed. The timed
    /// region covers opening the connection, preparing, binding, stepping
    /// every row and closing.
    pub fn run<F>(
        &self,
        size: DatasetSize,
        path: &Path,
        query: &Query,
        mut next_param: F,
    ) -> Result<TrialResult>
    where
        F: FnMut() -> Result<Option<ParamValue>>,
    {
        if !path.is_file() {
            bail!(
                "database {} does not exist; run parts-datagen first",
                path.display()
            );
        }

        let mut total = Duration::ZERO;
        let mut rows = 0;
        for trial in 0..self.trials {
            let param = next_param()?;
            let (outcome, elapsed) = self
                .clock
                .measure(|| execute_once(path, query, param.as_ref()));
            rows = outcome.with_context(|| {
                format!("{} trial {} failed on {}", query.name, trial, path.display())
            })?;
            trace!("{} trial {trial} on {size}: {elapsed:?}, {rows} rows", query.name);
            total += elapsed;
        }

        Ok(TrialResult {
            size,
            path: path.to_path_buf(),
            trials: self.trials,
            total,
            file_size: dataset::file_size(path)?,
            rows,
        })
    }
}

/// One complete trial: connect, run the query to completion, close.
pub fn execute_once(path: &Path, query: &Query, param: Option<&ParamValue>) -> Result<usize> {
    let conn = dataset::connect(path)?;
    let rows = query.execute_on(&conn, param)?;
    close(conn)?;
    Ok(rows)
}

fn close(conn: Connection) -> Result<()> {
    conn.close().map_err(|(_, e)| e)?;
    Ok(())
}
