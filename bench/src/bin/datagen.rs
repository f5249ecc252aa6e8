//! Builds `main.db` and the five sized copies from the CSV corpora.
//!
//! Usage:
//!   parts-datagen
//!   parts-datagen --force --seed 42 --data-dir Data --db-dir SQLiteDBs

use anyhow::Result;
use clap::Parser;
use log::error;
use parts_bench::cli::DatagenCli;
use parts_bench::config::BenchConfig;
use parts_bench::generate::{self, GeneratorOptions};
use std::process;

fn main() {
    dotenvy::dotenv().ok();

    let cli = DatagenCli::parse();
    if let Err(e) = cli.logging.init() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &DatagenCli) -> Result<()> {
    let config = BenchConfig::resolve(cli.common.overrides())?;
    let options = GeneratorOptions {
        country_csv: config.country_csv(),
        upc_csv: config.upc_csv(),
        selector: config.selector(&cli.common.sizes),
        force: cli.force,
        seed: config.seed,
    };

    let summary = generate::run(&options)?;

    println!(
        "{}: {} rows",
        summary.main_path.display(),
        summary.main_rows
    );
    for (label, rows, bytes) in &summary.copies {
        println!("  {label:>5}: {rows:>8} rows, {bytes:>10} bytes");
    }
    Ok(())
}
