use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::errors::{SpecForgeError, SpecForgeResult};
use crate::models::verification::{FunctionStatus, RunResult};

/// One persisted row of experiment bookkeeping, the contract consumed by the
/// downstream analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run: u32,
    pub time_taken: f64,
    pub iterations: u32,
    pub verified: bool,
    pub annotated_contract: String,
    /// Per-function verdicts; empty in whole-artifact mode.
    pub function_status: BTreeMap<String, FunctionStatus>,
    /// Diagnostic history of failed attempts.
    pub status: Vec<String>,
}

impl RunRecord {
    /// Flatten a run's terminal result into one persisted row. The error
    /// history is derived before the result is taken apart.
    pub fn from_run_result(run: u32, time_taken: f64, result: RunResult) -> Self {
        let status = result.error_history();
        RunRecord {
            run,
            time_taken,
            iterations: result.iterations,
            verified: result.verified,
            annotated_contract: result.artifact,
            function_status: result.per_function_status,
            status,
        }
    }
}

/// Collected run records for one experiment, written as CSV with one row per
/// run. Structured columns are embedded as JSON so the table stays flat.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub records: Vec<RunRecord>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: RunRecord) {
        self.records.push(record);
    }

    pub fn verified_count(&self) -> usize {
        self.records.iter().filter(|r| r.verified).count()
    }

    pub fn to_csv(&self) -> SpecForgeResult<String> {
        let mut out = String::from(
            "run,time_taken,iterations,verified,annotated_contract,function_status,status\n",
        );
        for record in &self.records {
            let function_status = serde_json::to_string(&record.function_status)?;
            let status = serde_json::to_string(&record.status)?;
            out.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                record.run,
                record.time_taken,
                record.iterations,
                record.verified,
                csv_field(&record.annotated_contract),
                csv_field(&function_status),
                csv_field(&status),
            ));
        }
        Ok(out)
    }

    pub fn write_csv(&self, path: &Path) -> SpecForgeResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SpecForgeError::SystemError(format!(
                    "Failed to create results directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        fs::write(path, self.to_csv()?)?;
        info!("Results saved to {}", path.display());
        Ok(())
    }
}

/// Quote a CSV field when it carries a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_fields_with_embedded_delimiters() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn builds_a_row_from_a_run_result() {
        use crate::models::verification::{
            Classification, IterationRecord, RunResult, VerificationOutcome,
        };

        let result = RunResult {
            iterations: 2,
            verified: false,
            artifact: "contract ERC20 {}".to_string(),
            per_function_status: BTreeMap::new(),
            history: vec![
                IterationRecord {
                    attempt_number: 1,
                    outcome: VerificationOutcome::new(1, "ERC20::transfer: ERROR"),
                    classification: Classification::Fail {
                        errors: vec!["ERC20::transfer: ERROR".to_string()],
                    },
                },
                IterationRecord {
                    attempt_number: 2,
                    outcome: VerificationOutcome::new(0, "ERC20::transfer: OK"),
                    classification: Classification::Pass,
                },
            ],
        };

        let record = RunRecord::from_run_result(7, 3.25, result);
        assert_eq!(record.run, 7);
        assert_eq!(record.time_taken, 3.25);
        assert_eq!(record.iterations, 2);
        assert!(!record.verified);
        assert_eq!(record.annotated_contract, "contract ERC20 {}");
        // Only the failed attempt contributes to the status column.
        assert_eq!(record.status, vec!["Attempt 1: ERC20::transfer: ERROR".to_string()]);
    }

    #[test]
    fn one_row_per_run() {
        let mut report = RunReport::new();
        report.push(RunRecord {
            run: 1,
            time_taken: 12.5,
            iterations: 3,
            verified: true,
            annotated_contract: "contract ERC20 {}".to_string(),
            function_status: BTreeMap::new(),
            status: vec![],
        });
        let csv = report.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("run,time_taken"));
        assert!(lines[1].starts_with("1,12.5,3,true"));
    }
}
