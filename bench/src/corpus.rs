//! CSV corpora the dataset is generated from.
//!
//! Two inputs: a country list (`Name,Code`) and a UPC corpus whose first
//! column is the UPC code. Both files carry a header row. Bad rows are
//! skipped and counted, never fatal.

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use log::{debug, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str;

/// File name of the country corpus inside the data directory.
pub const COUNTRY_CSV: &str = "data_csv.csv";
/// File name of the UPC corpus inside the data directory.
pub const UPC_CSV: &str = "upc_corpus.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub name: String,
    /// Two-letter country code.
    pub code: String,
}

pub fn load_country_codes(path: &Path) -> Result<Vec<Country>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open country corpus {}", path.display()))?;
    let countries = parse_country_codes(file)
        .with_context(|| format!("failed to read country corpus {}", path.display()))?;
    debug!("Loaded {} countries from {}", countries.len(), path.display());
    Ok(countries)
}

/// Parse the country corpus. Rows are de-duplicated on the name column, the
/// first occurrence wins.
pub fn parse_country_codes<R: Read>(input: R) -> Result<Vec<Country>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut seen = HashSet::new();
    let mut countries = Vec::new();
    let mut skipped = 0usize;

    for (line, record) in reader.byte_records().enumerate() {
        let record = match record {
            Ok(record) => record,
            // The reader does not advance past an I/O error.
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!("Skipping malformed country row {}: {}", line + 2, e);
                skipped += 1;
                continue;
            }
        };
        let (Some(name), Some(code)) = (record.get(0), record.get(1)) else {
            skipped += 1;
            continue;
        };
        // Both columns end up in the table, so both must be text.
        let (Ok(name), Ok(code)) = (str::from_utf8(name), str::from_utf8(code)) else {
            warn!("Skipping country row {}: not valid UTF-8", line + 2);
            skipped += 1;
            continue;
        };
        let code = code.trim();
        if code.is_empty() || !seen.insert(name.to_string()) {
            skipped += 1;
            continue;
        }
        countries.push(Country {
            name: name.to_string(),
            code: code.to_string(),
        });
    }

    if skipped > 0 {
        debug!("Skipped {skipped} country rows");
    }
    if countries.is_empty() {
        bail!("no usable country rows");
    }
    Ok(countries)
}

pub fn load_upc_codes(path: &Path) -> Result<Vec<i64>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open UPC corpus {}", path.display()))?;
    let codes = parse_upc_codes(file)
        .with_context(|| format!("failed to read UPC corpus {}", path.display()))?;
    debug!("Loaded {} UPC codes from {}", codes.len(), path.display());
    Ok(codes)
}

/// Parse the UPC corpus, keeping file order and dropping invalid or
/// repeated codes. A row is judged on its UPC column alone.
pub fn parse_upc_codes<R: Read>(input: R) -> Result<Vec<i64>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut seen = HashSet::new();
    let mut codes = Vec::new();
    let mut skipped = 0usize;

    // Only the first column is read, so the rest of a row may be in any
    // encoding.
    for (line, record) in reader.byte_records().enumerate() {
        let record = match record {
            Ok(record) => record,
            // The reader does not advance past an I/O error.
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!("Skipping malformed UPC row {}: {}", line + 2, e);
                skipped += 1;
                continue;
            }
        };
        let field = record.get(0).and_then(|field| str::from_utf8(field).ok());
        match field.and_then(parse_upc) {
            Some(code) if seen.insert(code) => codes.push(code),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {skipped} UPC rows");
    }
    if codes.is_empty() {
        bail!("no usable UPC rows");
    }
    Ok(codes)
}

/// A UPC is a non-empty run of ASCII digits that fits in an `i64`.
pub fn parse_upc(field: &str) -> Option<i64> {
    if field.is_empty() || field == "null" || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Overflow past 2^63 - 1 fails the parse.
    field.parse::<i64>().ok()
}
