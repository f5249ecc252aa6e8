//! The fixed query catalogue.
//!
//! | query | shape                                   | parameter       |
//! |-------|-----------------------------------------|-----------------|
//! | Q1    | point lookup on the primary key         | a `partNumber`  |
//! | Q2    | lookup on `needsPart`                   | a `needsPart`   |
//! | Q3    | average price per country               | none            |
//! | Q4    | uncorrelated max-price subquery         | a country code  |
//! | Q5    | `NOT EXISTS` anti-join count            | none            |
//! | Q6    | `NOT IN` anti-join count                | none            |

use crate::keys::KeyColumn;
use anyhow::{bail, Context, Result};
use rusqlite::types::ToSqlOutput;
use rusqlite::{Connection, ToSql};
use std::fmt;
use std::str::FromStr;

/// Where a query's single named parameter comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryParam {
    None,
    PartNumber,
    NeedsPart,
    CountryCode,
}

impl QueryParam {
    /// Placeholder name in the SQL text.
    pub fn placeholder(self) -> Option<&'static str> {
        match self {
            QueryParam::None => None,
            QueryParam::PartNumber | QueryParam::NeedsPart => Some(":num"),
            QueryParam::CountryCode => Some(":countrycode"),
        }
    }

    /// Database column the parameter is sampled from, if any.
    pub fn key_column(self) -> Option<KeyColumn> {
        match self {
            QueryParam::PartNumber => Some(KeyColumn::PartNumber),
            QueryParam::NeedsPart => Some(KeyColumn::NeedsPart),
            QueryParam::None | QueryParam::CountryCode => None,
        }
    }
}

/// A drawn parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

impl ToSql for ParamValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            ParamValue::Int(v) => v.to_sql(),
            ParamValue::Text(v) => v.to_sql(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Text(v) => write!(f, "{v:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    pub name: &'static str,
    pub sql: &'static str,
    pub param: QueryParam,
}

pub const Q1: Query = Query {
    name: "Q1",
    sql: "
        select
            partPrice
        from
            Parts
        where
            partNumber = :num;
    ",
    param: QueryParam::PartNumber,
};

pub const Q2: Query = Query {
    name: "Q2",
    sql: "
        select
            partPrice
        from
            Parts
        where
            needsPart = :num;
    ",
    param: QueryParam::NeedsPart,
};

pub const Q3: Query = Query {
    name: "Q3",
    sql: "
        select
            avg(partPrice)
        from
            Parts
        group by
            madeIn;
    ",
    param: QueryParam::None,
};

pub const Q4: Query = Query {
    name: "Q4",
    sql: "
        select
            p1.partNumber
        from
            Parts p1
        where
            p1.madeIn = :countrycode
            and p1.partPrice = (
                select
                    max(partPrice)
                from
                    Parts p2
                where
                    p2.madeIn = :countrycode
            )
        limit 1;
    ",
    param: QueryParam::CountryCode,
};

pub const Q5: Query = Query {
    name: "Q5",
    sql: "
        select
            count(partNumber)
        from
            Parts p
        where
            not exists (
                select
                    1
                from
                    Parts p2
                where
                    p.partNumber = p2.needsPart
            );
    ",
    param: QueryParam::None,
};

pub const Q6: Query = Query {
    name: "Q6",
    sql: "
        select
            count(partNumber)
        from
            Parts p
        where
            p.partNumber not in (
                select
                    needsPart
                from
                    Parts p2
            );
    ",
    param: QueryParam::None,
};

pub const ALL: [Query; 6] = [Q1, Q2, Q3, Q4, Q5, Q6];

impl Query {
    /// Query number as printed in section headers ("Query 4").
    pub fn number(&self) -> &'static str {
        self.name.trim_start_matches('Q')
    }

    /// Prepare, bind and step through every row on `conn`. Returns the number
    /// of rows produced.
    pub fn execute_on(&self, conn: &Connection, param: Option<&ParamValue>) -> Result<usize> {
        let mut stmt = conn
            .prepare(self.sql)
            .with_context(|| format!("failed to prepare {}", self.name))?;

        let mut rows = match (self.param.placeholder(), param) {
            (Some(name), Some(value)) => stmt.query(&[(name, value as &dyn ToSql)][..])?,
            (None, None) => stmt.query([])?,
            (Some(name), None) => bail!("{} needs a value for {name}", self.name),
            (None, Some(value)) => bail!("{} takes no parameter, got {value}", self.name),
        };

        let mut count = 0usize;
        while rows.next()?.is_some() {
            count += 1;
        }
        Ok(count)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl FromStr for Query {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ALL.iter()
            .find(|q| q.name.eq_ignore_ascii_case(wanted) || q.number() == wanted)
            .copied()
            .ok_or_else(|| format!("Unknown query: {s}. Valid options: Q1-Q6"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset;

    fn sample_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        dataset::create_parts_table(&conn, None).unwrap();
        // No part needs 1 or 4.
        conn.execute_batch(
            "INSERT INTO Parts VALUES (1, 10, 2, 'CA');
             INSERT INTO Parts VALUES (2, 50, 3, 'CA');
             INSERT INTO Parts VALUES (3, 50, 2, 'FR');
             INSERT INTO Parts VALUES (4, 70, 3, 'FR');",
        )
        .unwrap();
        conn
    }

    fn scalar(conn: &Connection, query: &Query, param: Option<ParamValue>) -> i64 {
        let mut stmt = conn.prepare(query.sql).unwrap();
        match (query.param.placeholder(), param) {
            (Some(name), Some(value)) => stmt
                .query_row(&[(name, &value as &dyn ToSql)][..], |r| r.get(0))
                .unwrap(),
            _ => stmt.query_row([], |r| r.get(0)).unwrap(),
        }
    }

    #[test]
    fn point_lookups() {
        let conn = sample_db();
        assert_eq!(scalar(&conn, &Q1, Some(ParamValue::Int(2))), 50);
        assert_eq!(Q2.execute_on(&conn, Some(&ParamValue::Int(2))).unwrap(), 2);
        assert_eq!(Q2.execute_on(&conn, Some(&ParamValue::Int(4))).unwrap(), 0);
    }

    #[test]
    fn aggregation_has_one_row_per_country() {
        let conn = sample_db();
        assert_eq!(Q3.execute_on(&conn, None).unwrap(), 2);
    }

    #[test]
    fn max_price_per_country() {
        let conn = sample_db();
        assert_eq!(scalar(&conn, &Q4, Some(ParamValue::Text("FR".into()))), 4);
        assert_eq!(
            Q4.execute_on(&conn, Some(&ParamValue::Text("CA".into())))
                .unwrap(),
            1
        );
        assert_eq!(
            Q4.execute_on(&conn, Some(&ParamValue::Text("JP".into())))
                .unwrap(),
            0
        );
    }

    #[test]
    fn anti_joins_agree() {
        let conn = sample_db();
        assert_eq!(scalar(&conn, &Q5, None), 2);
        assert_eq!(scalar(&conn, &Q6, None), 2);
    }

    #[test]
    fn parameter_mismatch_is_an_error() {
        let conn = sample_db();
        assert!(Q1.execute_on(&conn, None).is_err());
        assert!(Q3.execute_on(&conn, Some(&ParamValue::Int(1))).is_err());
    }

    #[test]
    fn parse_names() {
        assert_eq!("q4".parse::<Query>().unwrap(), Q4);
        assert_eq!("6".parse::<Query>().unwrap(), Q6);
        assert!("Q7".parse::<Query>().is_err());
        assert_eq!(Q5.number(), "5");
    }
}
