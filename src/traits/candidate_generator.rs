use async_trait::async_trait;

use crate::errors::SpecForgeResult;

/// The external candidate-generation backend: a blocking prompt/response
/// round trip of unspecified duration.
///
/// Implementations own their conversation state and their retry/backoff
/// policy for transient failures; the refinement loop only sees the final
/// response text (or a terminal error).
#[async_trait]
pub trait CandidateGenerator: Send {
    /// Send a prompt on the current generation channel and wait for the
    /// response.
    async fn send(&mut self, prompt: &str) -> SpecForgeResult<String>;

    /// Open a fresh generation channel, discarding accumulated conversation
    /// context. Used per function in the per-function refinement variant.
    fn reset(&mut self);
}
