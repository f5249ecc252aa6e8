//! Random query parameters: keys sampled from a database column, and country
//! codes sampled from the country corpus.

use crate::corpus::{self, Country};
use crate::dataset;
use anyhow::{bail, Context, Result};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Column a random key is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyColumn {
    PartNumber,
    NeedsPart,
}

impl KeyColumn {
    pub fn column(self) -> &'static str {
        match self {
            KeyColumn::PartNumber => "partNumber",
            KeyColumn::NeedsPart => "needsPart",
        }
    }
}

impl fmt::Display for KeyColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Memoized column values, one list per `(database, column)`.
///
/// The first request for a pair reads the whole column; later requests only
/// sample from memory.
#[derive(Debug, Default)]
pub struct KeyPool {
    lists: HashMap<(PathBuf, KeyColumn), Vec<i64>>,
}

impl KeyPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (or return the memoized) values of `column` in the database at `path`.
    pub fn load(&mut self, path: &Path, column: KeyColumn) -> Result<&[i64]> {
        let values = match self.lists.entry((path.to_path_buf(), column)) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let values = read_column(path, column)?;
                debug!(
                    "Loaded {} {} keys from {}",
                    values.len(),
                    column,
                    path.display()
                );
                entry.insert(values)
            }
        };
        Ok(values.as_slice())
    }

    /// A uniformly random value of `column` from the database at `path`.
    pub fn random_key<R: Rng + ?Sized>(
        &mut self,
        path: &Path,
        column: KeyColumn,
        rng: &mut R,
    ) -> Result<i64> {
        let values = self.load(path, column)?;
        match values.choose(rng) {
            Some(&value) => Ok(value),
            None => bail!("no {} values in {}", column, path.display()),
        }
    }

    pub fn clear(&mut self) {
        self.lists.clear();
    }

    /// Number of memoized lists.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

fn read_column(path: &Path, column: KeyColumn) -> Result<Vec<i64>> {
    let conn = dataset::open_existing(path)?;
    let mut stmt = conn.prepare(&format!("SELECT {} FROM Parts", column.column()))?;
    let values = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("failed to read {} from {}", column, path.display()))?;
    Ok(values)
}

/// Country codes used as the parameter of the per-country query.
#[derive(Debug, Clone)]
pub struct CountryCodes {
    codes: Vec<String>,
}

impl CountryCodes {
    pub fn load(path: &Path) -> Result<Self> {
        let countries = corpus::load_country_codes(path)?;
        Ok(Self::from_countries(countries))
    }

    pub fn from_countries(countries: Vec<Country>) -> Self {
        Self {
            codes: countries.into_iter().map(|c| c.code).collect(),
        }
    }

    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str> {
        match self.codes.choose(rng) {
            Some(code) => Ok(code),
            None => bail!("country code list is empty"),
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rusqlite::Connection;
    use tempfile::TempDir;

    fn db_with(dir: &TempDir, name: &str, rows: &[(i64, i64)]) -> PathBuf {
        let path = dir.path().join(name);
        let conn = Connection::open(&path).unwrap();
        dataset::create_parts_table(&conn, None).unwrap();
        for (number, needs) in rows {
            conn.execute(
                "INSERT INTO Parts VALUES (?1, 1, ?2, 'CA')",
                [number, needs],
            )
            .unwrap();
        }
        path
    }

    #[test]
    fn keys_come_from_the_requested_database() {
        let dir = TempDir::new().unwrap();
        let small = db_with(&dir, "small.db", &[(1, 10), (2, 20)]);
        let large = db_with(&dir, "large.db", &[(3, 30), (4, 40), (5, 50)]);
        let mut pool = KeyPool::new();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..20 {
            let k = pool.random_key(&small, KeyColumn::PartNumber, &mut rng).unwrap();
            assert!([1, 2].contains(&k));
            let k = pool.random_key(&large, KeyColumn::NeedsPart, &mut rng).unwrap();
            assert!([30, 40, 50].contains(&k));
        }
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn memoized_until_cleared() {
        let dir = TempDir::new().unwrap();
        let path = db_with(&dir, "a.db", &[(1, 1)]);
        let mut pool = KeyPool::new();
        assert_eq!(pool.load(&path, KeyColumn::PartNumber).unwrap(), &[1i64]);

        let conn = Connection::open(&path).unwrap();
        conn.execute("INSERT INTO Parts VALUES (2, 1, 2, 'CA')", [])
            .unwrap();
        assert_eq!(pool.load(&path, KeyColumn::PartNumber).unwrap(), &[1i64]);

        pool.clear();
        assert!(pool.is_empty());
        let mut keys = pool.load(&path, KeyColumn::PartNumber).unwrap().to_vec();
        keys.sort();
        assert_eq!(keys, vec![1, 2]);
    }

    #[test]
    fn empty_table_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = db_with(&dir, "empty.db", &[]);
        let mut pool = KeyPool::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(pool
            .random_key(&path, KeyColumn::PartNumber, &mut rng)
            .is_err());
    }

    #[test]
    fn country_codes() {
        let codes = CountryCodes::from_countries(vec![Country {
            name: "Canada".into(),
            code: "CA".into(),
        }]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(codes.random(&mut rng).unwrap(), "CA");

        let empty = CountryCodes::from_countries(Vec::new());
        assert!(empty.random(&mut rng).is_err());
    }
}
