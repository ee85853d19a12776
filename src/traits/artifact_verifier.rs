use std::path::Path;

use async_trait::async_trait;

use crate::models::verification::VerificationOutcome;

/// The external verifier: a black-box process invoked on a file path.
///
/// Implementations must always return a structured outcome; launch failures,
/// timeouts and internal errors are reported as reserved non-zero statuses
/// with a descriptive message, never as a propagated error.
#[async_trait]
pub trait ArtifactVerifier: Send + Sync {
    async fn verify(&self, artifact_path: &Path) -> VerificationOutcome;
}
