pub mod classifier;
pub mod cli;
pub mod config;
pub mod errors;
pub mod implementations;
pub mod merge;
pub mod models;
pub mod refinement;
pub mod traits;
#[cfg(test)]
pub mod tests;

// Re-export core components
pub use classifier::ResultClassifier;
pub use config::{ForgeConfig, GeneratorConfig, RefinementConfig, VerifierConfig};
pub use errors::{SpecForgeError, SpecForgeResult};
pub use implementations::{ChatCandidateGenerator, SolcVerifyAdapter};
pub use merge::{
    ContractTemplate, MergePipeline, PartialContractAssembler, ReferenceRewriter,
    StructuralParser,
};
pub use models::{
    contract::{AnnotationMap, FunctionEntry, StructuralModel},
    report::{RunRecord, RunReport},
    verification::{
        Classification, FunctionStatus, IterationRecord, RunResult, VerificationOutcome,
    },
};
pub use refinement::{FunctionByFunctionLoop, PromptBuilder, WholeArtifactLoop};
pub use traits::{ArtifactVerifier, CandidateGenerator};
