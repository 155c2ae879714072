//! Validation Runner
//!
//! Drives the ordered case list: load schema, compile, load sample, validate.
//! Cases run strictly one after another and the run stops at the first
//! failing sample.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::file_name;
use crate::engine::{ValidationContext, ValidationResult, Violation};
use crate::error::Result;

/// One (sample, schema) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCase {
    /// Repository-relative path of the sample document
    pub sample: PathBuf,
    /// Repository-relative path of the schema it must satisfy
    pub schema: PathBuf,
}

impl ValidationCase {
    pub fn new(sample: impl Into<PathBuf>, schema: impl Into<PathBuf>) -> Self {
        Self {
            sample: sample.into(),
            schema: schema.into(),
        }
    }

    /// Whether either path contains `needle`
    pub fn matches(&self, needle: &str) -> bool {
        self.sample.to_string_lossy().contains(needle) || self.schema.to_string_lossy().contains(needle)
    }
}

impl fmt::Display for ValidationCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} against {}", self.sample.display(), self.schema.display())
    }
}

/// Overall result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every case passed
    Passed { cases: usize },
    /// A sample failed its schema; later cases were not run
    Failed {
        case: ValidationCase,
        violations: Vec<Violation>,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Passed { .. })
    }
}

/// Runs cases against a prepared [`ValidationContext`]
pub struct ValidationRunner<'a> {
    context: &'a ValidationContext,
}

impl<'a> ValidationRunner<'a> {
    pub fn new(context: &'a ValidationContext) -> Self {
        Self { context }
    }

    /// Validate a single case
    pub fn run_case(&self, case: &ValidationCase) -> Result<ValidationResult> {
        let loader = self.context.loader();
        let schema = loader.load(&case.schema)?;
        let validator = self.context.compile(&schema)?;
        let sample = loader.load(&case.sample)?;
        validator.validate(&sample.content)
    }

    /// Run `cases` in order, writing one `OK:` line per pass to `out`.
    ///
    /// The first failing sample writes its violations to `err` and ends the
    /// run. Loader, resolver and compilation faults are returned as errors.
    pub fn run<O: Write, E: Write>(
        &self,
        cases: &[ValidationCase],
        out: &mut O,
        err: &mut E,
    ) -> Result<RunOutcome> {
        for (index, case) in cases.iter().enumerate() {
            info!(case = index + 1, total = cases.len(), %case, "validating");

            match self.run_case(case)? {
                ValidationResult::Pass => {
                    writeln!(
                        out,
                        "OK: {} validates against {}",
                        file_name(&case.sample),
                        file_name(&case.schema)
                    )?;
                }
                ValidationResult::Fail(violations) => {
                    writeln!(err, "Validation failed: {case}")?;
                    for violation in &violations {
                        writeln!(err, "{violation}")?;
                    }
                    return Ok(RunOutcome::Failed {
                        case: case.clone(),
                        violations,
                    });
                }
            }
        }

        Ok(RunOutcome::Passed { cases: cases.len() })
    }
}
