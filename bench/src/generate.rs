//! Dataset generation: builds `main.db` from the CSV corpora and cuts the five
//! sized copies out of it.

use crate::corpus::{self, Country};
use crate::dataset::{self, DatasetSelector};
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rusqlite::{named_params, Connection};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Highest generated price, inclusive.
pub const MAX_PRICE: i64 = 100;

/// One row of the `Parts` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub part_number: i64,
    pub part_price: i64,
    pub needs_part: i64,
    pub made_in: String,
}

/// Build one part per UPC code.
///
/// Both input lists are shuffled in place; every random choice comes from
/// `rng`, so a seeded generator reproduces the same table.
pub fn generate_parts<R: Rng + ?Sized>(
    countries: &mut [Country],
    upcs: &mut [i64],
    rng: &mut R,
) -> Result<Vec<Part>> {
    if countries.is_empty() {
        bail!("cannot generate parts without countries");
    }
    if upcs.is_empty() {
        bail!("cannot generate parts without UPC codes");
    }

    countries.shuffle(rng);
    upcs.shuffle(rng);

    let parts = upcs
        .iter()
        .map(|&part_number| {
            let made_in = countries[rng.gen_range(0..countries.len())].code.clone();
            let part_price = rng.gen_range(0..=MAX_PRICE);
            let needs_part = upcs[rng.gen_range(0..upcs.len())];
            Part {
                part_number,
                part_price,
                needs_part,
                made_in,
            }
        })
        .collect();
    Ok(parts)
}

/// Insert `parts` into `Parts` with one prepared statement inside a single
/// transaction. Returns the number of rows written.
pub fn populate(conn: &mut Connection, parts: &[Part]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO Parts VALUES (:partNumber, :partPrice, :needsPart, :madeIn)",
        )?;
        for part in parts {
            stmt.execute(named_params! {
                ":partNumber": part.part_number,
                ":partPrice": part.part_price,
                ":needsPart": part.needs_part,
                ":madeIn": part.made_in,
            })
            .with_context(|| format!("failed to insert part {}", part.part_number))?;
        }
    }
    tx.commit()?;
    Ok(parts.len())
}

/// Copy the first `rows` rows of `Parts` into each selected database.
///
/// `partNumber` aliases the rowid, so every copy takes the lowest part
/// numbers and a smaller database is always a prefix of a larger one.
pub fn make_copies(conn: &Connection, selector: &DatasetSelector) -> Result<()> {
    for (size, path) in selector.iter() {
        let target = path.to_string_lossy().into_owned();
        conn.execute(
            "ATTACH DATABASE :file_name AS new_db",
            named_params! { ":file_name": target },
        )
        .with_context(|| format!("failed to attach {}", path.display()))?;

        let copied = copy_into_attached(conn, size.rows());
        // Detach even when the copy failed so the next size starts clean.
        let detached = conn.execute_batch("DETACH DATABASE new_db;");
        let copied = copied.with_context(|| format!("failed to build {}", path.display()))?;
        detached.with_context(|| format!("failed to detach {}", path.display()))?;

        info!("Wrote {} rows to {} ({size})", copied, path.display());
    }
    Ok(())
}

fn copy_into_attached(conn: &Connection, amount: usize) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    dataset::create_parts_table(&tx, Some("new_db"))?;
    let copied = tx.execute(
        "INSERT INTO new_db.Parts SELECT * FROM Parts LIMIT :amount",
        named_params! { ":amount": amount as i64 },
    )?;
    tx.commit()?;
    Ok(copied)
}

/// Inputs for a full generation run.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub country_csv: PathBuf,
    pub upc_csv: PathBuf,
    pub selector: DatasetSelector,
    /// Remove existing database files instead of failing.
    pub force: bool,
    /// Fixed RNG seed; entropy when unset.
    pub seed: Option<u64>,
}

/// What a generation run produced.
#[derive(Debug, Clone)]
pub struct GeneratorSummary {
    pub main_rows: u64,
    pub main_path: PathBuf,
    /// `(label, rows, bytes)` per sized copy.
    pub copies: Vec<(String, u64, u64)>,
}

/// Load the corpora, build `main.db` and every selected copy.
pub fn run(options: &GeneratorOptions) -> Result<GeneratorSummary> {
    let started = Instant::now();
    let selector = &options.selector;

    fs::create_dir_all(selector.dir())
        .with_context(|| format!("failed to create {}", selector.dir().display()))?;
    prepare_targets(options)?;

    let mut countries = corpus::load_country_codes(&options.country_csv)?;
    let mut upcs = corpus::load_upc_codes(&options.upc_csv)?;
    info!(
        "Loaded {} countries and {} UPC codes",
        countries.len(),
        upcs.len()
    );

    let mut rng = match options.seed {
        Some(seed) => {
            debug!("Seeding generator with {seed}");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let parts = generate_parts(&mut countries, &mut upcs, &mut rng)?;

    let main_path = selector.main_db();
    let mut conn = dataset::connect(&main_path)?;
    dataset::create_parts_table(&conn, None)?;
    let inserted = populate(&mut conn, &parts)?;
    info!("Inserted {inserted} parts into {}", main_path.display());

    if let Some(largest) = selector.sizes().last() {
        if largest.rows() > inserted {
            warn!(
                "Only {inserted} parts available; {} will hold fewer than {} rows",
                largest.file_name(),
                largest.rows()
            );
        }
    }

    make_copies(&conn, selector)?;
    let main_rows = dataset::row_count(&conn)?;
    drop(conn);

    let mut copies = Vec::with_capacity(selector.len());
    for (size, path) in selector.iter() {
        let conn = dataset::open_existing(path)?;
        let rows = dataset::row_count(&conn)?;
        let bytes = dataset::file_size(path)?;
        copies.push((size.label().to_string(), rows, bytes));
    }

    info!("Generation finished in {:.2?}", started.elapsed());
    Ok(GeneratorSummary {
        main_rows,
        main_path,
        copies,
    })
}

/// Refuse to overwrite existing databases unless forced.
fn prepare_targets(options: &GeneratorOptions) -> Result<()> {
    let selector = &options.selector;
    let targets = std::iter::once(selector.main_db())
        .chain(selector.iter().map(|(_, path)| path.to_path_buf()));

    for path in targets {
        if !path.exists() {
            continue;
        }
        if !options.force {
            bail!(
                "{} already exists; pass --force to regenerate",
                path.display()
            );
        }
        fs::remove_file(&path)
            .with_context(|| format!("failed to remove {}", path.display()))?;
        debug!("Removed {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countries() -> Vec<Country> {
        ["CA", "FR", "JP"]
            .iter()
            .map(|code| Country {
                name: format!("country {code}"),
                code: code.to_string(),
            })
            .collect()
    }

    #[test]
    fn one_part_per_upc() {
        let mut countries = countries();
        let mut upcs: Vec<i64> = (1..=50).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let parts = generate_parts(&mut countries, &mut upcs, &mut rng).unwrap();

        assert_eq!(parts.len(), 50);
        let mut numbers: Vec<_> = parts.iter().map(|p| p.part_number).collect();
        numbers.sort();
        assert_eq!(numbers, (1..=50).collect::<Vec<_>>());

        for part in &parts {
            assert!((0..=MAX_PRICE).contains(&part.part_price));
            assert!((1..=50).contains(&part.needs_part));
            assert!(["CA", "FR", "JP"].contains(&part.made_in.as_str()));
        }
    }

    #[test]
    fn same_seed_same_parts() {
        let make = || {
            let mut countries = countries();
            let mut upcs: Vec<i64> = (100..200).collect();
            let mut rng = StdRng::seed_from_u64(42);
            generate_parts(&mut countries, &mut upcs, &mut rng).unwrap()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(generate_parts(&mut [], &mut [1, 2], &mut rng).is_err());
        assert!(generate_parts(&mut countries(), &mut [], &mut rng).is_err());
    }

    #[test]
    fn populate_writes_every_part() {
        let mut conn = Connection::open_in_memory().unwrap();
        dataset::create_parts_table(&conn, None).unwrap();
        let parts = vec![
            Part {
                part_number: 1,
                part_price: 0,
                needs_part: 2,
                made_in: "CA".into(),
            },
            Part {
                part_number: 2,
                part_price: 100,
                needs_part: 2,
                made_in: "FR".into(),
            },
        ];
        assert_eq!(populate(&mut conn, &parts).unwrap(), 2);
        let price: i64 = conn
            .query_row("SELECT partPrice FROM Parts WHERE partNumber = 2", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(price, 100);
    }

    #[test]
    fn populate_rolls_back_on_duplicate_key() {
        let mut conn = Connection::open_in_memory().unwrap();
        dataset::create_parts_table(&conn, None).unwrap();
        let part = Part {
            part_number: 7,
            part_price: 1,
            needs_part: 7,
            made_in: "CA".into(),
        };
        assert!(populate(&mut conn, &[part.clone(), part]).is_err());
        assert_eq!(dataset::row_count(&conn).unwrap(), 0);
    }
}
