//! Benchmark suites: an ordered script of index changes and timed query
//! batches run against every selected database.

use crate::dataset::{DatasetSelector, DatasetSize};
use crate::index::{self, IndexAction, IndexSpec};
use crate::keys::{CountryCodes, KeyPool};
use crate::queries::{ParamValue, Query, QueryParam, Q1, Q2, Q3, Q4, Q5, Q6};
use crate::report::{self, BenchRecord};
use crate::timing::Clock;
use crate::trial::{TrialOutcome, TrialRunner};
use anyhow::{bail, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Largest dataset the correlated `NOT EXISTS` query is run on by default.
pub const NOT_EXISTS_LIMIT: DatasetSize = DatasetSize::TenK;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A progress line printed between sections.
    Message(&'static str),
    Index { spec: IndexSpec, action: IndexAction },
    /// Time `query` on every database. Databases larger than `skip_above`
    /// are reported as skipped.
    Run {
        query: Query,
        indexed: bool,
        skip_above: Option<DatasetSize>,
    },
}

impl Step {
    fn run(query: Query, indexed: bool) -> Step {
        Step::Run {
            query,
            indexed,
            skip_above: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SuiteKind {
    /// Point lookups, `idxNeedsPart`.
    Part1,
    /// Aggregation, `idxMadeIn`.
    Part2,
    /// Uncorrelated subquery, `idxPartPriceMadeIn`.
    Part3,
    /// Anti-joins, `idxPartNumberNeedsPart`.
    Part4,
}

impl SuiteKind {
    pub const ALL: [SuiteKind; 4] = [
        SuiteKind::Part1,
        SuiteKind::Part2,
        SuiteKind::Part3,
        SuiteKind::Part4,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SuiteKind::Part1 => "part1",
            SuiteKind::Part2 => "part2",
            SuiteKind::Part3 => "part3",
            SuiteKind::Part4 => "part4",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SuiteKind::Part1 => "Part 1",
            SuiteKind::Part2 => "Part 2",
            SuiteKind::Part3 => "Part 3",
            SuiteKind::Part4 => "Part 4",
        }
    }

    pub fn index(self) -> IndexSpec {
        match self {
            SuiteKind::Part1 => IndexSpec::NEEDS_PART,
            SuiteKind::Part2 => IndexSpec::MADE_IN,
            SuiteKind::Part3 => IndexSpec::PRICE_MADE_IN,
            SuiteKind::Part4 => IndexSpec::NEEDS_PART_NUMBER,
        }
    }

    /// The script for this suite. Every suite first drops its index if a
    /// previous run left it behind.
    pub fn steps(self, no_skip: bool) -> Vec<Step> {
        let spec = self.index();
        let mut steps = vec![Step::Index {
            spec,
            action: IndexAction::DropIfExists,
        }];

        let (without, with): (Vec<Step>, Vec<Step>) = match self {
            SuiteKind::Part1 => (
                vec![Step::run(Q1, false), Step::run(Q2, false)],
                vec![Step::run(Q1, true), Step::run(Q2, true)],
            ),
            SuiteKind::Part2 => (vec![Step::run(Q3, false)], vec![Step::run(Q3, true)]),
            SuiteKind::Part3 => (vec![Step::run(Q4, false)], vec![Step::run(Q4, true)]),
            SuiteKind::Part4 => (
                vec![
                    Step::Run {
                        query: Q5,
                        indexed: false,
                        skip_above: (!no_skip).then_some(NOT_EXISTS_LIMIT),
                    },
                    Step::run(Q6, false),
                ],
                vec![Step::run(Q6, true)],
            ),
        };

        steps.extend(without);
        steps.push(Step::Message("Creating index for each database"));
        steps.push(Step::Index {
            spec,
            action: IndexAction::Create,
        });
        steps.extend(with);
        steps.push(Step::Message("Dropping index for each database"));
        steps.push(Step::Index {
            spec,
            action: IndexAction::Drop,
        });
        steps
    }
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SuiteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(' ', "").as_str() {
            "part1" | "1" => Ok(SuiteKind::Part1),
            "part2" | "2" => Ok(SuiteKind::Part2),
            "part3" | "3" => Ok(SuiteKind::Part3),
            "part4" | "4" => Ok(SuiteKind::Part4),
            _ => Err(format!(
                "Unknown suite: {s}. Valid options: part1, part2, part3, part4"
            )),
        }
    }
}

/// Executes suites against one dataset selection.
pub struct SuiteRunner {
    selector: DatasetSelector,
    trials: TrialRunner,
    keys: KeyPool,
    country_csv: PathBuf,
    countries: Option<CountryCodes>,
    rng: StdRng,
    no_skip: bool,
    quiet: bool,
}

impl SuiteRunner {
    pub fn new(selector: DatasetSelector, trials: TrialRunner, country_csv: &Path) -> Self {
        Self {
            selector,
            trials,
            keys: KeyPool::new(),
            country_csv: country_csv.to_path_buf(),
            countries: None,
            rng: StdRng::from_entropy(),
            no_skip: false,
            quiet: false,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self
    }

    /// Run the slow queries on every database regardless of size.
    pub fn with_no_skip(mut self, no_skip: bool) -> Self {
        self.no_skip = no_skip;
        self
    }

    /// Use an already loaded country list instead of reading the CSV.
    pub fn with_countries(mut self, countries: CountryCodes) -> Self {
        self.countries = Some(countries);
        self
    }

    /// Suppress the stdout report.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn selector(&self) -> &DatasetSelector {
        &self.selector
    }

    pub fn clock(&self) -> Clock {
        self.trials.clock()
    }

    pub fn run(&mut self, kind: SuiteKind) -> Result<Vec<BenchRecord>> {
        if self.selector.is_empty() {
            bail!("no datasets selected");
        }
        info!(
            "Running {} on {} database(s), {} trials each, {} clock",
            kind,
            self.selector.len(),
            self.trials.trials(),
            self.clock()
        );
        if !self.quiet {
            report::print_suite_header(kind.title());
        }

        let mut records = Vec::new();
        for step in kind.steps(self.no_skip) {
            match step {
                Step::Message(text) => {
                    if !self.quiet {
                        report::print_message(text);
                    }
                }
                Step::Index { spec, action } => {
                    debug!("{action:?} {spec} on every database");
                    index::apply(&self.selector, &spec, action)?;
                }
                Step::Run {
                    query,
                    indexed,
                    skip_above,
                } => {
                    if !self.quiet {
                        report::print_section(query.number(), indexed);
                    }
                    for outcome in self.run_query(&query, skip_above)? {
                        records.push(BenchRecord {
                            suite: kind.name().to_string(),
                            query: query.name,
                            indexed,
                            outcome,
                        });
                    }
                }
            }
        }

        if !self.quiet {
            report::print_done();
            report::print_summary(&records)?;
        }
        Ok(records)
    }

    pub fn run_all(&mut self, kinds: &[SuiteKind]) -> Result<Vec<BenchRecord>> {
        let mut records = Vec::new();
        for &kind in kinds {
            records.extend(self.run(kind)?);
        }
        Ok(records)
    }

    fn run_query(
        &mut self,
        query: &Query,
        skip_above: Option<DatasetSize>,
    ) -> Result<Vec<TrialOutcome>> {
        if query.param == QueryParam::CountryCode && self.countries.is_none() {
            self.countries = Some(CountryCodes::load(&self.country_csv)?);
        }

        let entries: Vec<(DatasetSize, PathBuf)> = self
            .selector
            .iter()
            .map(|(size, path)| (size, path.to_path_buf()))
            .collect();

        let mut outcomes = Vec::with_capacity(entries.len());
        for (size, path) in entries {
            let outcome = if skip_above.is_some_and(|limit| size > limit) {
                debug!("Skipping {} on {size}", query.name);
                TrialOutcome::Skipped { size, path }
            } else {
                let Self {
                    trials,
                    keys,
                    countries,
                    rng,
                    ..
                } = self;
                let result = trials.run(size, &path, query, || {
                    draw_param(query, &path, keys, countries.as_ref(), rng)
                })?;
                debug!(
                    "{} on {size}: {:.4} ms avg over {} trials",
                    query.name,
                    result.average_ms(),
                    result.trials
                );
                TrialOutcome::Measured(result)
            };

            if !self.quiet {
                report::print_outcome(&outcome);
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

/// Draw the parameter for one trial of `query` on the database at `path`.
fn draw_param(
    query: &Query,
    path: &Path,
    keys: &mut KeyPool,
    countries: Option<&CountryCodes>,
    rng: &mut StdRng,
) -> Result<Option<ParamValue>> {
    if query.param == QueryParam::CountryCode {
        let Some(codes) = countries else {
            bail!("country codes not loaded");
        };
        return Ok(Some(ParamValue::Text(codes.random(rng)?.to_string())));
    }
    match query.param.key_column() {
        Some(column) => Ok(Some(ParamValue::Int(keys.random_key(path, column, rng)?))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_steps(steps: &[Step]) -> Vec<(&'static str, bool, Option<DatasetSize>)> {
        steps
            .iter()
            .filter_map(|s| match s {
                Step::Run {
                    query,
                    indexed,
                    skip_above,
                } => Some((query.name, *indexed, *skip_above)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn every_suite_starts_with_a_conditional_drop_and_ends_with_a_drop() {
        for kind in SuiteKind::ALL {
            let steps = kind.steps(false);
            assert_eq!(
                steps.first(),
                Some(&Step::Index {
                    spec: kind.index(),
                    action: IndexAction::DropIfExists
                })
            );
            assert_eq!(
                steps.last(),
                Some(&Step::Index {
                    spec: kind.index(),
                    action: IndexAction::Drop
                })
            );
        }
    }

    #[test]
    fn part1_order() {
        assert_eq!(
            run_steps(&SuiteKind::Part1.steps(false)),
            vec![
                ("Q1", false, None),
                ("Q2", false, None),
                ("Q1", true, None),
                ("Q2", true, None),
            ]
        );
    }

    #[test]
    fn part4_skips_not_exists_on_large_sets() {
        assert_eq!(
            run_steps(&SuiteKind::Part4.steps(false)),
            vec![
                ("Q5", false, Some(DatasetSize::TenK)),
                ("Q6", false, None),
                ("Q6", true, None),
            ]
        );
        assert_eq!(
            run_steps(&SuiteKind::Part4.steps(true))[0],
            ("Q5", false, None)
        );
    }

    #[test]
    fn index_created_between_batches() {
        let steps = SuiteKind::Part3.steps(false);
        let create = steps
            .iter()
            .position(|s| {
                matches!(
                    s,
                    Step::Index {
                        action: IndexAction::Create,
                        ..
                    }
                )
            })
            .unwrap();
        assert!(matches!(steps[create - 2], Step::Run { indexed: false, .. }));
        assert!(matches!(steps[create + 1], Step::Run { indexed: true, .. }));
    }

    #[test]
    fn parse_suite() {
        assert_eq!("Part3".parse::<SuiteKind>().unwrap(), SuiteKind::Part3);
        assert_eq!("part 4".parse::<SuiteKind>().unwrap(), SuiteKind::Part4);
        assert_eq!("2".parse::<SuiteKind>().unwrap(), SuiteKind::Part2);
        assert!("part5".parse::<SuiteKind>().is_err());
    }
}
