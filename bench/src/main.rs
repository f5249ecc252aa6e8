//! Benchmark runner that prints the per-database report.
//!
//! Usage:
//!   parts-bench run part1
//!   parts-bench run all --sizes 100,1K,10K --trials 20 --output results.csv
//!   parts-bench sizes

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use parts_bench::cli::{BenchCli, BenchCommand};
use parts_bench::config::{BenchConfig, ConfigOverrides};
use parts_bench::dataset::{self, DatasetSelector};
use parts_bench::index;
use parts_bench::report::ResultsWriter;
use parts_bench::suite::SuiteRunner;
use std::process;

fn main() {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = BenchCli::parse();
    if let Err(e) = cli.logging.init() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }

    if let Err(e) = run(cli) {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: BenchCli) -> Result<()> {
    match cli.command {
        BenchCommand::Run {
            suite,
            trials,
            clock,
            no_skip,
            output,
        } => {
            let config = BenchConfig::resolve(ConfigOverrides {
                trials,
                clock,
                ..cli.common.overrides()
            })?;
            let selector = config.selector(&cli.common.sizes);
            let mut runner =
                SuiteRunner::new(selector, config.trial_runner()?, &config.country_csv())
                    .with_seed(config.seed)
                    .with_no_skip(no_skip);
            info!(
                "{} database(s) in {}, {} trials per query, {} clock",
                runner.selector().len(),
                config.db_dir.display(),
                config.trials,
                runner.clock()
            );
            let records = runner.run_all(&suite.suites())?;

            if let Some(path) = output {
                let mut writer = ResultsWriter::create(&path)?;
                writer.write_all(&records)?;
                info!("Wrote {} results to {}", records.len(), path.display());
            }
            Ok(())
        }
        BenchCommand::Sizes => {
            let config = BenchConfig::resolve(cli.common.overrides())?;
            print_sizes(&config.selector(&cli.common.sizes))
        }
    }
}

fn print_sizes(selector: &DatasetSelector) -> Result<()> {
    println!(
        "  {:8} {:14} {:>10} {:>14}  {}",
        "Dataset", "File", "Rows", "Size (bytes)", "Indexes"
    );
    println!("  {}", "-".repeat(66));
    for (size, path) in selector.iter() {
        let file = size.file_name();
        if !path.is_file() {
            println!(
                "  {:8} {:14} {:>10} {:>14}  -",
                size.label(),
                file,
                "missing",
                "-"
            );
            continue;
        }
        let conn = dataset::open_existing(path)?;
        let rows = dataset::row_count(&conn)?;
        let indexes = index::present_indexes(&conn)?;
        println!(
            "  {:8} {:14} {:>10} {:>14}  {}",
            size.label(),
            file,
            rows,
            dataset::file_size(path)?,
            if indexes.is_empty() {
                "-".to_string()
            } else {
                indexes.join(", ")
            }
        );
    }
    Ok(())
}
