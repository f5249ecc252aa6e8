//! Secondary indexes that the suites switch on and off between trial batches.

use crate::dataset::{self, DatasetSelector};
use anyhow::{Context, Result};
use log::debug;
use rusqlite::{Connection, OptionalExtension};
use std::fmt;

/// A named index over one or more `Parts` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

impl IndexSpec {
    pub const NEEDS_PART: IndexSpec = IndexSpec {
        name: "idxNeedsPart",
        columns: &["needsPart"],
    };

    pub const MADE_IN: IndexSpec = IndexSpec {
        name: "idxMadeIn",
        columns: &["madeIn"],
    };

    /// Covers the per-country max-price lookup.
    pub const PRICE_MADE_IN: IndexSpec = IndexSpec {
        name: "idxPartPriceMadeIn",
        columns: &["madeIn", "partPrice"],
    };

    pub const NEEDS_PART_NUMBER: IndexSpec = IndexSpec {
        name: "idxPartNumberNeedsPart",
        columns: &["needsPart", "partNumber"],
    };

    pub const ALL: [IndexSpec; 4] = [
        IndexSpec::NEEDS_PART,
        IndexSpec::MADE_IN,
        IndexSpec::PRICE_MADE_IN,
        IndexSpec::NEEDS_PART_NUMBER,
    ];

    pub fn create_sql(&self) -> String {
        format!(
            "CREATE INDEX {} ON Parts ({});",
            self.name,
            self.columns.join(", ")
        )
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP INDEX {};", self.name)
    }

    pub fn drop_if_exists_sql(&self) -> String {
        format!("DROP INDEX IF EXISTS {};", self.name)
    }

    pub fn sql(&self, action: IndexAction) -> String {
        match action {
            IndexAction::Create => self.create_sql(),
            IndexAction::Drop => self.drop_sql(),
            IndexAction::DropIfExists => self.drop_if_exists_sql(),
        }
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.columns.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexAction {
    Create,
    Drop,
    DropIfExists,
}

/// Run one index statement against every selected database, one connection
/// per file.
pub fn apply(selector: &DatasetSelector, spec: &IndexSpec, action: IndexAction) -> Result<()> {
    let sql = spec.sql(action);
    for (size, path) in selector.iter() {
        let conn = dataset::open_existing(path)?;
        apply_on(&conn, spec, action).with_context(|| {
            format!(
                "{:?} of {} failed on {} ({size})",
                action,
                spec.name,
                path.display()
            )
        })?;
        debug!("{sql} on {}", path.display());
    }
    Ok(())
}

/// Run one index statement on an already open connection.
pub fn apply_on(conn: &Connection, spec: &IndexSpec, action: IndexAction) -> Result<()> {
    conn.execute_batch(&spec.sql(action))?;
    Ok(())
}

pub fn index_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND name = ?1",
            [name],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Names of the catalogue indexes present on `conn`.
pub fn present_indexes(conn: &Connection) -> Result<Vec<&'static str>> {
    let mut present = Vec::new();
    for spec in IndexSpec::ALL {
        if index_exists(conn, spec.name)? {
            present.push(spec.name);
        }
    }
    Ok(present)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        dataset::create_parts_table(&conn, None).unwrap();
        conn
    }

    #[test]
    fn statements() {
        assert_eq!(
            IndexSpec::PRICE_MADE_IN.create_sql(),
            "CREATE INDEX idxPartPriceMadeIn ON Parts (madeIn, partPrice);"
        );
        assert_eq!(
            IndexSpec::NEEDS_PART.drop_sql(),
            "DROP INDEX idxNeedsPart;"
        );
        assert_eq!(
            IndexSpec::MADE_IN.sql(IndexAction::DropIfExists),
            "DROP INDEX IF EXISTS idxMadeIn;"
        );
    }

    #[test]
    fn create_then_drop() {
        let conn = parts_db();
        let spec = IndexSpec::NEEDS_PART_NUMBER;
        assert!(!index_exists(&conn, spec.name).unwrap());

        apply_on(&conn, &spec, IndexAction::Create).unwrap();
        assert!(index_exists(&conn, spec.name).unwrap());
        assert_eq!(present_indexes(&conn).unwrap(), vec![spec.name]);

        // A second create fails: the index is already there.
        assert!(apply_on(&conn, &spec, IndexAction::Create).is_err());

        apply_on(&conn, &spec, IndexAction::Drop).unwrap();
        assert!(!index_exists(&conn, spec.name).unwrap());
    }

    #[test]
    fn drop_if_exists_is_idempotent() {
        let conn = parts_db();
        let spec = IndexSpec::MADE_IN;
        apply_on(&conn, &spec, IndexAction::DropIfExists).unwrap();
        apply_on(&conn, &spec, IndexAction::Create).unwrap();
        apply_on(&conn, &spec, IndexAction::DropIfExists).unwrap();
        apply_on(&conn, &spec, IndexAction::DropIfExists).unwrap();
        assert!(!index_exists(&conn, spec.name).unwrap());
        assert!(apply_on(&conn, &spec, IndexAction::Drop).is_err());
    }
}
