use std::path::PathBuf;

use log::{info, warn};

use crate::classifier::ResultClassifier;
use crate::errors::SpecForgeResult;
use crate::merge::MergePipeline;
use crate::models::verification::{
    Classification, IterationRecord, RunResult, VerificationOutcome,
};
use crate::refinement::extract::extract_solidity_code;
use crate::refinement::prompts::PromptBuilder;
use crate::refinement::{LoopPhase, RunState};
use crate::traits::artifact_verifier::ArtifactVerifier;
use crate::traits::candidate_generator::CandidateGenerator;

/// Whole-artifact refinement: the generator annotates the full interface in
/// one shot, the merge pipeline produces the verifier artifact, and failed
/// verifications feed the surviving diagnostics back until the attempt
/// budget runs out.
pub struct WholeArtifactLoop<G, V> {
    generator: G,
    verifier: V,
    pipeline: MergePipeline,
    classifier: ResultClassifier,
    prompts: PromptBuilder,
    max_attempts: u32,
    workdir: PathBuf,
}

impl<G: CandidateGenerator, V: ArtifactVerifier> WholeArtifactLoop<G, V> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        generator: G,
        verifier: V,
        pipeline: MergePipeline,
        classifier: ResultClassifier,
        prompts: PromptBuilder,
        max_attempts: u32,
        workdir: PathBuf,
    ) -> Self {
        Self {
            generator,
            verifier,
            pipeline,
            classifier,
            prompts,
            max_attempts,
            workdir,
        }
    }

    /// Run refinement on `interface_text` until verification succeeds or the
    /// attempt budget is exhausted. Unrecoverable errors (a malformed
    /// interface, broken configuration) abort the run; everything else is
    /// folded into the iteration log and consumes an attempt.
    pub async fn run(mut self, interface_text: &str) -> SpecForgeResult<RunResult> {
        let mut state = RunState::new(self.max_attempts);
        let mut prompt = self.prompts.initial_whole_prompt(interface_text);
        let mut last_candidate = String::new();

        while state.begin_attempt() {
            let attempt = state.attempt();
            info!("Attempt {}/{}", attempt, self.max_attempts);

            state.set_phase(LoopPhase::Generating);
            let response = match self.generator.send(&prompt).await {
                Ok(response) => response,
                Err(e) if e.is_recoverable() => {
                    warn!("Generator failed on attempt {}: {}", attempt, e);
                    let outcome = VerificationOutcome::no_candidate(e.to_string());
                    state.record(IterationRecord {
                        attempt_number: attempt,
                        outcome,
                        classification: Classification::Fail {
                            errors: vec![e.to_string()],
                        },
                    });
                    state.set_phase(LoopPhase::FailRetry);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let candidate = match extract_solidity_code(&response) {
                Some(candidate) => candidate,
                None => {
                    warn!("Attempt {} produced no extractable candidate", attempt);
                    let outcome = VerificationOutcome::no_candidate(
                        "response contained no code block or annotation lines",
                    );
                    state.record(IterationRecord {
                        attempt_number: attempt,
                        outcome,
                        classification: Classification::Fail {
                            errors: vec!["no candidate in response".to_string()],
                        },
                    });
                    prompt = self.prompts.clarification_prompt();
                    state.set_phase(LoopPhase::FailRetry);
                    continue;
                }
            };
            last_candidate = candidate.clone();

            state.set_phase(LoopPhase::Merging);
            let artifact_path = self.workdir.join(format!("attempt_{}.sol", attempt));
            let model = match self.pipeline.merge_to_file(&candidate, &artifact_path) {
                Ok((_, model)) => model,
                Err(e) if e.is_recoverable() => {
                    warn!("Merge failed on attempt {}: {}", attempt, e);
                    let message = e.to_string();
                    state.record(IterationRecord {
                        attempt_number: attempt,
                        outcome: VerificationOutcome::no_candidate(message.clone()),
                        classification: Classification::Fail {
                            errors: vec![message.clone()],
                        },
                    });
                    prompt = self.prompts.feedback_prompt(&[message]);
                    state.set_phase(LoopPhase::FailRetry);
                    continue;
                }
                Err(e) => return Err(e),
            };

            state.set_phase(LoopPhase::Verifying);
            let outcome = self.verifier.verify(&artifact_path).await;
            let targets = model.function_names();
            let classification = self.classifier.classify(&outcome, &targets);
            info!("Attempt {} classified {}", attempt, classification);

            let success = classification.is_success();
            let errors = match &classification {
                Classification::Fail { errors } => errors.clone(),
                _ => Vec::new(),
            };
            state.record(IterationRecord {
                attempt_number: attempt,
                outcome,
                classification,
            });

            if success {
                state.set_phase(LoopPhase::Succeeded);
                let iterations = state.attempts_used();
                return Ok(RunResult {
                    iterations,
                    verified: true,
                    artifact: candidate,
                    per_function_status: Default::default(),
                    history: state.into_records(),
                });
            }

            prompt = self.prompts.feedback_prompt(&errors);
            state.set_phase(LoopPhase::FailRetry);
        }

        state.set_phase(LoopPhase::FailTerminal);
        info!("Attempt budget exhausted without verification");
        let iterations = state.attempts_used();
        Ok(RunResult {
            iterations,
            verified: false,
            artifact: last_candidate,
            per_function_status: Default::default(),
            history: state.into_records(),
        })
    }
}
