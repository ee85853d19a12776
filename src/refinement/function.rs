use std::collections::BTreeMap;
use std::path::PathBuf;

use log::{info, warn};

use crate::classifier::ResultClassifier;
use crate::errors::SpecForgeResult;
use crate::merge::{MergePipeline, PartialContractAssembler};
use crate::models::contract::{AnnotationMap, FunctionEntry, StructuralModel};
use crate::models::verification::{
    Classification, FunctionStatus, IterationRecord, RunResult, VerificationOutcome,
};
use crate::refinement::extract::extract_function_annotations;
use crate::refinement::prompts::PromptBuilder;
use crate::refinement::{LoopPhase, RunState};
use crate::traits::artifact_verifier::ArtifactVerifier;
use crate::traits::candidate_generator::CandidateGenerator;

/// Per-function refinement: each function is annotated and verified in
/// isolation against a partial contract in which already-confirmed functions
/// keep their verified annotations and the rest carry a neutral placeholder.
///
/// Every function gets a fresh generator channel and its own attempt budget;
/// a function that exhausts its budget is marked failed and the loop moves
/// on, so one stubborn function cannot starve the rest.
pub struct FunctionByFunctionLoop<G, V> {
    generator: G,
    verifier: V,
    assembler: PartialContractAssembler,
    pipeline: MergePipeline,
    classifier: ResultClassifier,
    prompts: PromptBuilder,
    max_attempts_per_function: u32,
    workdir: PathBuf,
}

impl<G: CandidateGenerator, V: ArtifactVerifier> FunctionByFunctionLoop<G, V> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        generator: G,
        verifier: V,
        assembler: PartialContractAssembler,
        pipeline: MergePipeline,
        classifier: ResultClassifier,
        prompts: PromptBuilder,
        max_attempts_per_function: u32,
        workdir: PathBuf,
    ) -> Self {
        Self {
            generator,
            verifier,
            assembler,
            pipeline,
            classifier,
            prompts,
            max_attempts_per_function,
            workdir,
        }
    }

    /// Refine every function of `model` in declaration order. The returned
    /// artifact is the partial contract assembled from the confirmed
    /// annotations; unverified functions appear with the neutral
    /// placeholder.
    pub async fn run(mut self, model: &StructuralModel) -> SpecForgeResult<RunResult> {
        let mut confirmed = AnnotationMap::new();
        let mut per_function_status: BTreeMap<String, FunctionStatus> = BTreeMap::new();
        let mut history: Vec<IterationRecord> = Vec::new();
        let mut total_attempts: u32 = 0;

        for entry in &model.functions {
            // Each function gets its own conversation; stale feedback from
            // earlier functions must not leak into this one.
            self.generator.reset();

            let status = self.refine_function(model, &confirmed, entry, &mut history).await?;
            match status {
                FunctionOutcome::Verified {
                    annotation,
                    attempts,
                } => {
                    confirmed.insert(&entry.signature, annotation);
                    per_function_status.insert(entry.name.clone(), FunctionStatus::Verified);
                    total_attempts += attempts;
                    info!("Function {} verified after {} attempts", entry.name, attempts);
                }
                FunctionOutcome::Failed { attempts } => {
                    per_function_status.insert(entry.name.clone(), FunctionStatus::Failed);
                    total_attempts += attempts;
                    warn!(
                        "Function {} failed after {} attempts, moving on",
                        entry.name, attempts
                    );
                }
            }
        }

        let verified = !per_function_status.is_empty()
            && per_function_status
                .values()
                .all(|s| *s == FunctionStatus::Verified);
        let artifact = self.assembler.assemble(model, &confirmed, None);

        Ok(RunResult {
            iterations: total_attempts,
            verified,
            artifact,
            per_function_status,
            history,
        })
    }

    async fn refine_function(
        &mut self,
        model: &StructuralModel,
        confirmed: &AnnotationMap,
        entry: &FunctionEntry,
        history: &mut Vec<IterationRecord>,
    ) -> SpecForgeResult<FunctionOutcome> {
        let mut state = RunState::new(self.max_attempts_per_function);
        let mut prompt = self.prompts.function_prompt(model, confirmed, entry);

        while state.begin_attempt() {
            let attempt = state.attempt();
            info!(
                "Function {}: attempt {}/{}",
                entry.name, attempt, self.max_attempts_per_function
            );

            state.set_phase(LoopPhase::Generating);
            let response = match self.generator.send(&prompt).await {
                Ok(response) => response,
                Err(e) if e.is_recoverable() => {
                    warn!("Generator failed for {}: {}", entry.name, e);
                    state.record(IterationRecord {
                        attempt_number: attempt,
                        outcome: VerificationOutcome::no_candidate(e.to_string()),
                        classification: Classification::Fail {
                            errors: vec![e.to_string()],
                        },
                    });
                    state.set_phase(LoopPhase::FailRetry);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let proposed = match extract_function_annotations(&response, entry) {
                Some(proposed) => proposed,
                None => {
                    // The attempt is spent, but there is nothing to verify.
                    warn!(
                        "No candidate for {} on attempt {}, asking for clarification",
                        entry.name, attempt
                    );
                    state.record(IterationRecord {
                        attempt_number: attempt,
                        outcome: VerificationOutcome::no_candidate(
                            "response contained no annotation lines",
                        ),
                        classification: Classification::Fail {
                            errors: vec![format!("no candidate for {}", entry.name)],
                        },
                    });
                    prompt = self.prompts.clarification_prompt();
                    state.set_phase(LoopPhase::FailRetry);
                    continue;
                }
            };

            state.set_phase(LoopPhase::Merging);
            let mut trial = confirmed.clone();
            trial.insert(&entry.signature, proposed.clone());
            let partial = self.assembler.assemble(model, &trial, None);

            let artifact_path = self
                .workdir
                .join(format!("{}_attempt_{}.sol", entry.name, attempt));
            if let Err(e) = self.pipeline.merge_to_file(&partial, &artifact_path) {
                if !e.is_recoverable() {
                    return Err(e);
                }
                warn!("Merge failed for {}: {}", entry.name, e);
                let message = e.to_string();
                state.record(IterationRecord {
                    attempt_number: attempt,
                    outcome: VerificationOutcome::no_candidate(message.clone()),
                    classification: Classification::Fail {
                        errors: vec![message.clone()],
                    },
                });
                prompt = self
                    .prompts
                    .function_feedback_prompt(entry, &proposed, &[message]);
                state.set_phase(LoopPhase::FailRetry);
                continue;
            }

            state.set_phase(LoopPhase::Verifying);
            let outcome = self.verifier.verify(&artifact_path).await;
            let classification = self.classifier.classify(&outcome, &[&entry.name]);
            info!(
                "Function {} attempt {} classified {}",
                entry.name, attempt, classification
            );

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
                let attempts = state.attempts_used();
                history.extend(state.into_records());
                return Ok(FunctionOutcome::Verified {
                    annotation: proposed,
                    attempts,
                });
            }

            prompt = self
                .prompts
                .function_feedback_prompt(entry, &proposed, &errors);
            state.set_phase(LoopPhase::FailRetry);
        }

        state.set_phase(LoopPhase::FailTerminal);
        let attempts = state.attempts_used();
        history.extend(state.into_records());
        Ok(FunctionOutcome::Failed { attempts })
    }
}

enum FunctionOutcome {
    Verified { annotation: String, attempts: u32 },
    Failed { attempts: u32 },
}
