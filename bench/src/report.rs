//! Report module: prints per-database timings as they are measured, a
//! comparison summary at the end of each suite, and optionally a CSV export.

use crate::trial::{TrialOutcome, TrialResult};
use anyhow::{Context, Result};
use csv::Writer;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// One measured (or skipped) query/database pair, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct BenchRecord {
    pub suite: String,
    pub query: &'static str,
    pub indexed: bool,
    pub outcome: TrialOutcome,
}

impl BenchRecord {
    pub fn index_label(&self) -> &'static str {
        if self.indexed {
            "with index"
        } else {
            "without index"
        }
    }
}

pub fn print_suite_header(title: &str) {
    println!("Executing {title}\n");
}

pub fn print_section(query_number: &str, indexed: bool) {
    let state = if indexed { "with" } else { "without" };
    println!("Avg times and sizes for Query {query_number} {state} index\n");
}

pub fn print_message(text: &str) {
    println!("{text}\n");
}

/// Print the block for one database.
pub fn print_outcome(outcome: &TrialOutcome) {
    println!("Avg time for {} entries", outcome.size());
    match outcome {
        TrialOutcome::Measured(result) => print_result(result),
        TrialOutcome::Skipped { .. } => println!("Skipping this Database"),
    }
    println!();
}

fn print_result(result: &TrialResult) {
    println!("Avg time: {} ms", result.average_ms());
    println!("Size of database {}", result.file_size);
}

pub fn print_done() {
    println!("Done!");
}

/// Print the comparison table for one suite's records.
pub fn print_summary(records: &[BenchRecord]) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_summary(&mut out, records)?;
    out.flush()?;
    Ok(())
}

/// Write a table comparing `records`, followed by the index speed-up for
/// every (query, dataset) measured in both states.
pub fn write_summary<W: Write>(out: &mut W, records: &[BenchRecord]) -> io::Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    writeln!(out, "\n{}", "=".repeat(72))?;
    writeln!(out, "  Comparison Summary")?;
    writeln!(out, "{}", "=".repeat(72))?;
    writeln!(
        out,
        "  {:8} {:6} {:14} {:>8} {:>14} {:>14}",
        "Suite", "Query", "Index", "Dataset", "Avg (ms)", "Size (bytes)"
    )?;
    writeln!(out, "  {}", "-".repeat(68))?;

    for record in records {
        let (avg, size) = match record.outcome.result() {
            Some(r) => (format!("{:.4}", r.average_ms()), r.file_size.to_string()),
            None => ("skipped".to_string(), "-".to_string()),
        };
        writeln!(
            out,
            "  {:8} {:6} {:14} {:>8} {:>14} {:>14}",
            record.suite,
            record.query,
            record.index_label(),
            record.outcome.size().label(),
            avg,
            size
        )?;
    }

    let speedups: Vec<_> = records
        .iter()
        .filter(|r| r.indexed)
        .filter_map(|with| {
            let with_ms = with.outcome.result()?.average_ms();
            let without_ms = records
                .iter()
                .find(|r| {
                    !r.indexed
                        && r.suite == with.suite
                        && r.query == with.query
                        && r.outcome.size() == with.outcome.size()
                })?
                .outcome
                .result()?
                .average_ms();
            (with_ms > 0.0).then(|| (with, without_ms / with_ms))
        })
        .collect();

    if !speedups.is_empty() {
        writeln!(out, "\n  Index speed-up (without / with):")?;
        for (record, ratio) in speedups {
            writeln!(
                out,
                "  {:8} {:6} {:>8} {:>10.2}x",
                record.suite,
                record.query,
                record.outcome.size().label(),
                ratio
            )?;
        }
    }
    writeln!(out)
}

/// CSV export of every record.
pub struct ResultsWriter {
    writer: Writer<File>,
}

impl ResultsWriter {
    pub const HEADER: [&'static str; 7] = [
        "suite",
        "query",
        "indexed",
        "dataset",
        "trials",
        "avg_ms",
        "file_size_bytes",
    ];

    pub fn create(path: &Path) -> Result<Self> {
        let mut writer = Writer::from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        writer.write_record(Self::HEADER)?;
        Ok(Self { writer })
    }

    /// Skipped records are written with empty timing columns.
    pub fn write(&mut self, record: &BenchRecord) -> Result<()> {
        let (trials, avg, size) = match record.outcome.result() {
            Some(r) => (
                r.trials.to_string(),
                format!("{:.6}", r.average_ms()),
                r.file_size.to_string(),
            ),
            None => (String::new(), String::new(), String::new()),
        };
        self.writer.write_record([
            record.suite.as_str(),
            record.query,
            if record.indexed { "true" } else { "false" },
            record.outcome.size().label(),
            trials.as_str(),
            avg.as_str(),
            size.as_str(),
        ])?;
        Ok(())
    }

    pub fn write_all(&mut self, records: &[BenchRecord]) -> Result<()> {
        for record in records {
            self.write(record)?;
        }
        self.finish()
    }

    pub fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetSize;
    use std::path::PathBuf;
    use std::time::Duration;

    fn measured(size: DatasetSize, total_ms: u64, indexed: bool) -> BenchRecord {
        BenchRecord {
            suite: "part1".into(),
            query: "Q2",
            indexed,
            outcome: TrialOutcome::Measured(TrialResult {
                size,
                path: PathBuf::from("x.db"),
                trials: 10,
                total: Duration::from_millis(total_ms),
                file_size: 8192,
                rows: 1,
            }),
        }
    }

    #[test]
    fn average_is_total_over_trials() {
        let record = measured(DatasetSize::OneK, 25, false);
        let result = record.outcome.result().unwrap();
        assert_eq!(result.average(), Duration::from_micros(2500));
        assert!((result.average_ms() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn csv_export() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let records = vec![
            measured(DatasetSize::Hundred, 10, false),
            BenchRecord {
                suite: "part4".into(),
                query: "Q5",
                indexed: false,
                outcome: TrialOutcome::Skipped {
                    size: DatasetSize::OneM,
                    path: PathBuf::from("y.db"),
                },
            },
        ];

        let mut writer = ResultsWriter::create(&path).unwrap();
        writer.write_all(&records).unwrap();
        drop(writer);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "suite,query,indexed,dataset,trials,avg_ms,file_size_bytes"
        );
        assert_eq!(lines[1], "part1,Q2,false,100,10,1.000000,8192");
        assert_eq!(lines[2], "part4,Q5,false,1M,,,");
    }

    #[test]
    fn summary_lists_records_and_speedup() {
        let mut out = Vec::new();
        write_summary(
            &mut out,
            &[
                measured(DatasetSize::TenK, 100, false),
                measured(DatasetSize::TenK, 10, true),
            ],
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Comparison Summary"));
        assert!(text.contains("without index"));
        assert!(text.contains("with index"));
        assert!(text.contains("10.00x"));

        let mut out = Vec::new();
        write_summary(&mut out, &[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn skipped_records_have_no_speedup() {
        let mut records = vec![measured(DatasetSize::TenK, 10, true)];
        records.push(BenchRecord {
            outcome: TrialOutcome::Skipped {
                size: DatasetSize::TenK,
                path: PathBuf::from("x.db"),
            },
            ..measured(DatasetSize::TenK, 0, false)
        });
        let mut out = Vec::new();
        write_summary(&mut out, &records).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("skipped"));
        assert!(!text.contains("speed-up"));
    }
}
