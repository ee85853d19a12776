pub mod artifact_verifier;
pub mod candidate_generator;

// Re-export traits
pub use artifact_verifier::ArtifactVerifier;
pub use candidate_generator::CandidateGenerator;
