use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Command;

use crate::config::VerifierConfig;
use crate::models::verification::VerificationOutcome;
use crate::traits::artifact_verifier::ArtifactVerifier;

/// Adapter for the solc-verify executable: spawns the process with the
/// artifact path as its sole argument and captures the exit status plus the
/// merged standard/error output.
pub struct SolcVerifyAdapter {
    command: String,
    timeout: Duration,
}

impl SolcVerifyAdapter {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub fn from_config(config: &VerifierConfig) -> Self {
        Self::new(config.command.clone(), config.timeout())
    }
}

#[async_trait]
impl ArtifactVerifier for SolcVerifyAdapter {
    async fn verify(&self, artifact_path: &Path) -> VerificationOutcome {
        debug!(
            "Invoking {} on {}",
            self.command,
            artifact_path.display()
        );

        let output_future = Command::new(&self.command)
            .arg(artifact_path)
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, output_future).await {
            Ok(Ok(output)) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                match output.status.code() {
                    Some(status) => {
                        debug!("Verifier exited with status {}", status);
                        VerificationOutcome::new(status, combined)
                    }
                    None => {
                        warn!("Verifier terminated by signal");
                        VerificationOutcome::killed(format!(
                            "verifier terminated by signal\n{}",
                            combined
                        ))
                    }
                }
            }
            Ok(Err(e)) => {
                warn!("Failed to launch verifier {}: {}", self.command, e);
                VerificationOutcome::launch_failure(format!(
                    "failed to launch verifier {}: {}",
                    self.command, e
                ))
            }
            Err(_) => {
                warn!(
                    "Verifier timed out after {}s on {}",
                    self.timeout.as_secs(),
                    artifact_path.display()
                );
                VerificationOutcome::timeout(format!(
                    "verifier timed out after {}s",
                    self.timeout.as_secs()
                ))
            }
        }
    }
}
