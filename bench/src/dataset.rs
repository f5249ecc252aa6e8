//! Dataset selector: the five database scales and the files that hold them.
//!
//! Every database holds the same single `Parts` table. The smaller files are
//! prefixes of the source table (see [`crate::generate::make_copies`]).

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name of the source database the copies are cut from.
pub const MAIN_DB_FILE: &str = "main.db";

/// One of the five benchmark scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatasetSize {
    Hundred,
    OneK,
    TenK,
    HundredK,
    OneM,
}

impl DatasetSize {
    /// All scales, smallest first.
    pub const ALL: [DatasetSize; 5] = [
        DatasetSize::Hundred,
        DatasetSize::OneK,
        DatasetSize::TenK,
        DatasetSize::HundredK,
        DatasetSize::OneM,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DatasetSize::Hundred => "100",
            DatasetSize::OneK => "1K",
            DatasetSize::TenK => "10K",
            DatasetSize::HundredK => "100K",
            DatasetSize::OneM => "1M",
        }
    }

    /// Number of rows copied into this database.
    pub fn rows(self) -> usize {
        match self {
            DatasetSize::Hundred => 100,
            DatasetSize::OneK => 1_000,
            DatasetSize::TenK => 10_000,
            DatasetSize::HundredK => 100_000,
            DatasetSize::OneM => 1_000_000,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            DatasetSize::Hundred => "A4v100.db",
            DatasetSize::OneK => "A4v1k.db",
            DatasetSize::TenK => "A4v10k.db",
            DatasetSize::HundredK => "A4v100k.db",
            DatasetSize::OneM => "A4v1M.db",
        }
    }
}

impl FromStr for DatasetSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "100" => Ok(DatasetSize::Hundred),
            "1k" | "1000" => Ok(DatasetSize::OneK),
            "10k" | "10000" => Ok(DatasetSize::TenK),
            "100k" | "100000" => Ok(DatasetSize::HundredK),
            "1m" | "1000000" => Ok(DatasetSize::OneM),
            _ => Err(format!(
                "Unknown dataset size: {}. Valid options: 100, 1K, 10K, 100K, 1M",
                s
            )),
        }
    }
}

impl fmt::Display for DatasetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered mapping from dataset size to database file.
#[derive(Debug, Clone)]
pub struct DatasetSelector {
    dir: PathBuf,
    entries: Vec<(DatasetSize, PathBuf)>,
}

impl DatasetSelector {
    /// Select all five databases under `dir`.
    pub fn all(dir: impl AsRef<Path>) -> Self {
        Self::new(dir, &DatasetSize::ALL)
    }

    /// Select a subset of databases under `dir`. Duplicates are dropped and
    /// the entries are kept smallest first regardless of input order.
    pub fn new(dir: impl AsRef<Path>, sizes: &[DatasetSize]) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let mut sizes = sizes.to_vec();
        sizes.sort();
        sizes.dedup();
        let entries = sizes
            .into_iter()
            .map(|size| (size, dir.join(size.file_name())))
            .collect();
        Self { dir, entries }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the source database in the same directory.
    pub fn main_db(&self) -> PathBuf {
        self.dir.join(MAIN_DB_FILE)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DatasetSize, &Path)> + '_ {
        self.entries
            .iter()
            .map(|(size, path)| (*size, path.as_path()))
    }

    pub fn path(&self, size: DatasetSize) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(s, _)| *s == size)
            .map(|(_, path)| path.as_path())
    }

    pub fn sizes(&self) -> Vec<DatasetSize> {
        self.entries.iter().map(|(size, _)| *size).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Create the `Parts` table, optionally inside an attached schema.
pub fn create_parts_table(conn: &Connection, schema: Option<&str>) -> Result<()> {
    let table = match schema {
        Some(schema) => format!("{schema}.Parts"),
        None => "Parts".to_string(),
    };
    conn.execute_batch(&format!(
        "CREATE TABLE {table} (
            partNumber INTEGER,
            partPrice  INTEGER,
            needsPart  INTEGER,
            madeIn     TEXT,
            PRIMARY KEY(partNumber)
        );"
    ))
    .with_context(|| format!("failed to create {table}"))?;
    Ok(())
}

/// Per-connection settings shared by every tool.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

/// Open (or create) a file-backed database.
pub fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database {}", path.display()))?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Open a database that must already exist. SQLite would otherwise create an
/// empty file and the failure would only show up as "no such table".
pub fn open_existing(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        bail!(
            "database {} does not exist; run parts-datagen first",
            path.display()
        );
    }
    connect(path)
}

pub fn file_size(path: &Path) -> Result<u64> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?;
    Ok(meta.len())
}

pub fn row_count(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM Parts", [], |r| r.get(0))?;
    Ok(count as u64)
}
