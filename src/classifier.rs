use log::debug;
use regex::Regex;

use crate::errors::{SpecForgeError, SpecForgeResult};
use crate::models::verification::{Classification, VerificationOutcome};

/// Diagnostics the verifier emits with a non-zero exit status that do not
/// indicate a proof failure. The exit code conflates "had any diagnostic"
/// with "has a real failure"; gating on it alone would reject every run.
///
/// These patterns are verifier-version-specific configuration data, loadable
/// from the config file.
pub fn default_benign_patterns() -> Vec<String> {
    vec![
        r"Warning: Unused function parameter".to_string(),
        r"Warning: Unused local variable".to_string(),
        r"Warning: Function state mutability can be restricted".to_string(),
        r"Warning: This is a pre-release compiler version".to_string(),
    ]
}

/// Classifies verifier outcomes per target function or artifact-wide.
///
/// A pure function of the outcome text and the target names: classifying the
/// same outcome twice yields the same result.
#[derive(Debug)]
pub struct ResultClassifier {
    benign: Vec<Regex>,
}

impl Default for ResultClassifier {
    fn default() -> Self {
        Self::from_patterns(&default_benign_patterns()).expect("default patterns compile")
    }
}

impl ResultClassifier {
    pub fn from_patterns(patterns: &[String]) -> SpecForgeResult<Self> {
        let benign = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    SpecForgeError::ConfigError(format!("invalid benign pattern {:?}: {}", p, e))
                })
            })
            .collect::<SpecForgeResult<Vec<_>>>()?;
        Ok(Self { benign })
    }

    /// Classify `outcome` for the given target function names. An empty
    /// target list means artifact-wide classification.
    pub fn classify(&self, outcome: &VerificationOutcome, targets: &[&str]) -> Classification {
        if outcome.clean_exit() {
            return Classification::Pass;
        }

        // Reserved statuses (launch failure, timeout) never carry verifier
        // diagnostics; the line filter must not mistake them for noise.
        if outcome.status < 0 {
            return Classification::Fail {
                errors: vec![outcome.output.clone()],
            };
        }

        let critical: Vec<String> = outcome
            .output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter(|line| !self.is_benign(line))
            .filter(|line| is_critical(line, targets))
            .map(|line| line.to_string())
            .collect();

        if critical.is_empty() {
            debug!(
                "Non-zero verifier status {} carried only benign diagnostics",
                outcome.status
            );
            Classification::BenignPass
        } else {
            Classification::Fail { errors: critical }
        }
    }

    fn is_benign(&self, line: &str) -> bool {
        self.benign.iter().any(|pattern| pattern.is_match(line))
    }
}

/// A surviving line is critical when it carries a verifier error marker or a
/// non-OK verdict for a target function. Verdict lines have the shape
/// `Namespace::name: VERDICT`; matching is anchored on that shape so
/// identifiers that merely contain `OK` or `ERROR` are not misread.
fn is_critical(line: &str, targets: &[&str]) -> bool {
    // Tool-level failures: the verifier's own error marker and compiler
    // diagnostics of the shape `file.sol:3:5: Error: ...`.
    if line.contains("solc-verify error:") || line.contains("Error:") {
        return true;
    }
    for name in targets {
        let marker = format!("::{}:", name);
        if let Some(idx) = line.find(&marker) {
            let verdict = line[idx + marker.len()..].trim();
            return verdict != "OK";
        }
        if line.contains(&format!("Annotation for {}", name)) {
            return true;
        }
    }
    false
}
