use std::path::Path;
use std::time::Duration;

use crate::config::GeneratorConfig;
use crate::implementations::{ChatCandidateGenerator, SolcVerifyAdapter};
use crate::models::verification::STATUS_LAUNCH_FAILURE;
use crate::traits::artifact_verifier::ArtifactVerifier;
use crate::traits::candidate_generator::CandidateGenerator;

#[tokio::test]
async fn failed_send_leaves_no_dangling_turn() {
    let config = GeneratorConfig {
        api_key: Some("test-key".to_string()),
        // Nothing listens on the discard port; the send fails without
        // touching the network.
        api_endpoint: Some("http://127.0.0.1:9/v1/chat/completions".to_string()),
        max_retries: Some(1),
        ..GeneratorConfig::default()
    };
    let mut generator = ChatCandidateGenerator::new(config);
    assert_eq!(generator.history_len(), 1);

    assert!(generator.send("annotate this interface").await.is_err());

    // The unanswered user message must not linger in the transcript.
    assert_eq!(generator.history_len(), 1);
}

#[tokio::test]
async fn missing_verifier_binary_is_a_launch_failure() {
    let adapter = SolcVerifyAdapter::new(
        "specforge-no-such-verifier",
        Duration::from_secs(5),
    );
    let outcome = adapter.verify(Path::new("artifact.sol")).await;
    assert_eq!(outcome.status, STATUS_LAUNCH_FAILURE);
    assert!(outcome.output.contains("specforge-no-such-verifier"));
}
