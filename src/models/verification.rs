use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved status for a verifier process that could not be launched.
pub const STATUS_LAUNCH_FAILURE: i32 = -1;
/// Reserved status for a verifier process killed by the wall-clock timeout.
pub const STATUS_TIMEOUT: i32 = -2;
/// Reserved status for an attempt where no candidate could be extracted from
/// the generator response, so the verifier was never called.
pub const STATUS_NO_CANDIDATE: i32 = -3;
/// Reserved status for a verifier process terminated by a signal, which
/// leaves no exit code.
pub const STATUS_KILLED: i32 = -4;

/// Exit status and combined output of one verifier invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub status: i32,
    pub output: String,
}

impl VerificationOutcome {
    pub fn new(status: i32, output: impl Into<String>) -> Self {
        Self {
            status,
            output: output.into(),
        }
    }

    pub fn launch_failure(message: impl Into<String>) -> Self {
        Self::new(STATUS_LAUNCH_FAILURE, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(STATUS_TIMEOUT, message)
    }

    pub fn no_candidate(message: impl Into<String>) -> Self {
        Self::new(STATUS_NO_CANDIDATE, message)
    }

    pub fn killed(message: impl Into<String>) -> Self {
        Self::new(STATUS_KILLED, message)
    }

    /// True only for a clean exit. A non-zero status is not necessarily a
    /// verification failure; the classifier decides that.
    pub fn clean_exit(&self) -> bool {
        self.status == 0
    }
}

/// Classification of a verifier outcome for the target function(s).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// Exit status zero.
    Pass,
    /// Non-zero exit status, but only filtered tool noise in the output.
    BenignPass,
    /// Genuine verification failure; the surviving diagnostic lines are
    /// retained verbatim for feedback.
    Fail { errors: Vec<String> },
}

impl Classification {
    pub fn is_success(&self) -> bool {
        !matches!(self, Classification::Fail { .. })
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Pass => write!(f, "PASS"),
            Classification::BenignPass => write!(f, "BENIGN_PASS"),
            Classification::Fail { errors } => write!(f, "FAIL ({} error lines)", errors.len()),
        }
    }
}

/// One entry of the per-run iteration log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub attempt_number: u32,
    pub outcome: VerificationOutcome,
    pub classification: Classification,
}

/// Terminal per-function verdict in the per-function refinement variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionStatus {
    Verified,
    Failed,
}

impl fmt::Display for FunctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionStatus::Verified => write!(f, "Verified"),
            FunctionStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Terminal result of one refinement run, written once at run end.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub iterations: u32,
    pub verified: bool,
    /// The final merged artifact (possibly partial in per-function mode).
    pub artifact: String,
    /// Per-function verdicts; empty in whole-artifact mode.
    pub per_function_status: BTreeMap<String, FunctionStatus>,
    /// Full per-attempt diagnostic history, never silently dropped.
    pub history: Vec<IterationRecord>,
}

impl RunResult {
    /// Diagnostic lines for the persisted `status` column: one entry per
    /// failed attempt, carrying the verifier output of that attempt.
    pub fn error_history(&self) -> Vec<String> {
        self.history
            .iter()
            .filter(|r| !r.classification.is_success())
            .map(|r| format!("Attempt {}: {}", r.attempt_number, r.outcome.output))
            .collect()
    }
}
