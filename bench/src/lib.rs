//! SQLite Parts Query Benchmark
//!
//! Measures how long a handful of fixed SQL queries take against the same
//! `Parts` table at five sizes (100 to 1,000,000 rows), first without and
//! then with a secondary index that should help the query.
//!
//! Four suites exist:
//! - **Part 1**: point lookups on `partNumber` and `needsPart` (`idxNeedsPart`)
//! - **Part 2**: average price per country (`idxMadeIn`)
//! - **Part 3**: most expensive part of a country (`idxPartPriceMadeIn`)
//! - **Part 4**: parts nobody needs, `NOT EXISTS` vs `NOT IN` (`idxPartNumberNeedsPart`)
//!
//! Generate the databases: `cargo run --release --bin parts-datagen`
//! Run a suite: `cargo run --release -- run part1`
//! Run benchmarks: `cargo bench`

pub mod cli;
pub mod config;
pub mod corpus;
pub mod dataset;
pub mod generate;
pub mod index;
pub mod keys;
pub mod queries;
pub mod report;
pub mod suite;
pub mod timing;
pub mod trial;
