use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::classifier::ResultClassifier;
use crate::errors::{SpecForgeError, SpecForgeResult};
use crate::merge::{
    ContractTemplate, MergePipeline, PartialContractAssembler, StructuralParser,
    NEUTRAL_PLACEHOLDER,
};
use crate::models::verification::{
    FunctionStatus, VerificationOutcome, STATUS_NO_CANDIDATE,
};
use crate::refinement::{
    FunctionByFunctionLoop, LoopPhase, PromptBuilder, RunState, WholeArtifactLoop,
};
use crate::traits::artifact_verifier::ArtifactVerifier;
use crate::traits::candidate_generator::CandidateGenerator;

struct ScriptedGenerator {
    responses: Mutex<VecDeque<String>>,
    calls: Arc<AtomicU32>,
}

impl ScriptedGenerator {
    fn new(responses: Vec<&str>) -> (Self, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let generator = Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            calls: Arc::clone(&calls),
        };
        (generator, calls)
    }
}

#[async_trait]
impl CandidateGenerator for ScriptedGenerator {
    async fn send(&mut self, _prompt: &str) -> SpecForgeResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SpecForgeError::GeneratorError("script exhausted".to_string()))
    }

    fn reset(&mut self) {}
}

struct ScriptedVerifier {
    outcomes: Mutex<VecDeque<VerificationOutcome>>,
    calls: Arc<AtomicU32>,
}

impl ScriptedVerifier {
    fn new(outcomes: Vec<VerificationOutcome>) -> (Self, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let verifier = Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Arc::clone(&calls),
        };
        (verifier, calls)
    }
}

#[async_trait]
impl ArtifactVerifier for ScriptedVerifier {
    async fn verify(&self, _artifact_path: &Path) -> VerificationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .expect("verifier script exhausted")
    }
}

const INTERFACE: &str = "\
uint public _totalSupply;

function totalSupply() public view returns (uint256 supply);
";

const TEMPLATE: &str = "\
contract TokenImp {
    uint _totalSupply;
$totalSupply
    function totalSupply() public view returns (uint256 supply) { return _totalSupply; }
}
";

fn good_response() -> String {
    "```solidity\n\
uint public _totalSupply;\n\
\n\
/// @notice postcondition supply == _totalSupply\n\
function totalSupply() public view returns (uint256 supply);\n\
```"
        .to_string()
}

fn whole_loop(
    generator: ScriptedGenerator,
    verifier: ScriptedVerifier,
    max_attempts: u32,
    workdir: &Path,
) -> WholeArtifactLoop<ScriptedGenerator, ScriptedVerifier> {
    WholeArtifactLoop::new(
        generator,
        verifier,
        MergePipeline::new(ContractTemplate::new(TEMPLATE), None),
        ResultClassifier::default(),
        PromptBuilder::new(None, Vec::new()),
        max_attempts,
        workdir.to_path_buf(),
    )
}

#[tokio::test]
async fn whole_loop_succeeds_on_first_attempt() {
    let workdir = tempfile::TempDir::new().unwrap();
    let (generator, generator_calls) = ScriptedGenerator::new(vec![&good_response()]);
    let (verifier, verifier_calls) =
        ScriptedVerifier::new(vec![VerificationOutcome::new(0, "TokenImp::totalSupply: OK")]);

    let result = whole_loop(generator, verifier, 10, workdir.path())
        .run(INTERFACE)
        .await
        .unwrap();

    assert!(result.verified);
    assert_eq!(result.iterations, 1);
    assert_eq!(result.history.len(), 1);
    assert!(result.artifact.contains("postcondition supply == _totalSupply"));
    assert_eq!(generator_calls.load(Ordering::SeqCst), 1);
    assert_eq!(verifier_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn whole_loop_stops_at_attempt_budget() {
    let workdir = tempfile::TempDir::new().unwrap();
    let good = good_response();
    // One more response than the budget allows; the extra one must never be
    // requested.
    let (generator, generator_calls) =
        ScriptedGenerator::new(vec![&good, &good, &good, &good]);
    let failure = VerificationOutcome::new(1, "TokenImp::totalSupply: ERROR");
    let (verifier, verifier_calls) =
        ScriptedVerifier::new(vec![failure.clone(), failure.clone(), failure]);

    let result = whole_loop(generator, verifier, 3, workdir.path())
        .run(INTERFACE)
        .await
        .unwrap();

    assert!(!result.verified);
    assert_eq!(result.iterations, 3);
    assert_eq!(result.history.len(), 3);
    assert_eq!(generator_calls.load(Ordering::SeqCst), 3);
    assert_eq!(verifier_calls.load(Ordering::SeqCst), 3);
    // Every failed attempt keeps its diagnostics.
    assert_eq!(result.error_history().len(), 3);
}

#[tokio::test]
async fn unparseable_response_skips_the_verifier() {
    let workdir = tempfile::TempDir::new().unwrap();
    let good = good_response();
    let (generator, _) =
        ScriptedGenerator::new(vec!["I am unable to annotate this contract.", &good]);
    let (verifier, verifier_calls) =
        ScriptedVerifier::new(vec![VerificationOutcome::new(0, "TokenImp::totalSupply: OK")]);

    let result = whole_loop(generator, verifier, 10, workdir.path())
        .run(INTERFACE)
        .await
        .unwrap();

    assert!(result.verified);
    assert_eq!(result.iterations, 2);
    assert_eq!(result.history.len(), 2);
    // The first attempt is recorded with the reserved status and never
    // reached the verifier.
    assert_eq!(result.history[0].outcome.status, STATUS_NO_CANDIDATE);
    assert_eq!(verifier_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn generator_failures_consume_attempts() {
    let workdir = tempfile::TempDir::new().unwrap();
    // An empty script makes every send fail recoverably.
    let (generator, generator_calls) = ScriptedGenerator::new(vec![]);
    let (verifier, verifier_calls) = ScriptedVerifier::new(vec![]);

    let result = whole_loop(generator, verifier, 2, workdir.path())
        .run(INTERFACE)
        .await
        .unwrap();

    assert!(!result.verified);
    assert_eq!(result.history.len(), 2);
    assert_eq!(generator_calls.load(Ordering::SeqCst), 2);
    assert_eq!(verifier_calls.load(Ordering::SeqCst), 0);
}

const TWO_FUNCTION_INTERFACE: &str = "\
uint public _totalSupply;

function totalSupply() public view returns (uint256 supply);

function transfer(address to, uint value) public returns (bool success);
";

const TWO_FUNCTION_TEMPLATE: &str = "\
contract TokenImp {
    uint _totalSupply;
$totalSupply
    function totalSupply() public view returns (uint256 supply) { return _totalSupply; }
$transfer
    function transfer(address to, uint value) public returns (bool success) { return true; }
}
";

fn function_response(signature: &str, postcondition: &str) -> String {
    format!(
        "```solidity\n/// @notice postcondition {}\n{}\n```",
        postcondition, signature
    )
}

#[tokio::test]
async fn function_loop_records_mixed_verdicts() {
    let workdir = tempfile::TempDir::new().unwrap();
    let parser = StructuralParser::new();
    let model = parser.parse_checked(TWO_FUNCTION_INTERFACE).unwrap();

    let total_supply =
        function_response(&model.functions[0].signature, "supply == _totalSupply");
    let transfer = function_response(&model.functions[1].signature, "_totalSupply == 0");
    let (generator, _) = ScriptedGenerator::new(vec![&total_supply, &transfer]);
    let (verifier, verifier_calls) = ScriptedVerifier::new(vec![
        VerificationOutcome::new(0, "TokenImp::totalSupply: OK"),
        VerificationOutcome::new(1, "TokenImp::transfer: ERROR"),
    ]);

    let refinement = FunctionByFunctionLoop::new(
        generator,
        verifier,
        PartialContractAssembler::new("Token"),
        MergePipeline::new(ContractTemplate::new(TWO_FUNCTION_TEMPLATE), None),
        ResultClassifier::default(),
        PromptBuilder::new(None, Vec::new()),
        1,
        workdir.path().to_path_buf(),
    );
    let result = refinement.run(&model).await.unwrap();

    assert!(!result.verified);
    assert_eq!(result.iterations, 2);
    assert_eq!(
        result.per_function_status.get("totalSupply"),
        Some(&FunctionStatus::Verified)
    );
    assert_eq!(
        result.per_function_status.get("transfer"),
        Some(&FunctionStatus::Failed)
    );
    assert_eq!(verifier_calls.load(Ordering::SeqCst), 2);

    // The final artifact keeps the confirmed annotation and falls back to
    // the placeholder for the failed function.
    assert!(result.artifact.contains("postcondition supply == _totalSupply"));
    assert!(result.artifact.contains(NEUTRAL_PLACEHOLDER));
}

#[tokio::test]
async fn function_loop_verifies_everything_when_outcomes_allow() {
    let workdir = tempfile::TempDir::new().unwrap();
    let parser = StructuralParser::new();
    let model = parser.parse_checked(TWO_FUNCTION_INTERFACE).unwrap();

    let total_supply =
        function_response(&model.functions[0].signature, "supply == _totalSupply");
    let transfer = function_response(&model.functions[1].signature, "success == true");
    let (generator, _) = ScriptedGenerator::new(vec![&total_supply, &transfer]);
    let (verifier, _) = ScriptedVerifier::new(vec![
        VerificationOutcome::new(0, "TokenImp::totalSupply: OK"),
        VerificationOutcome::new(0, "TokenImp::transfer: OK"),
    ]);

    let refinement = FunctionByFunctionLoop::new(
        generator,
        verifier,
        PartialContractAssembler::new("Token"),
        MergePipeline::new(ContractTemplate::new(TWO_FUNCTION_TEMPLATE), None),
        ResultClassifier::default(),
        PromptBuilder::new(None, Vec::new()),
        3,
        workdir.path().to_path_buf(),
    );
    let result = refinement.run(&model).await.unwrap();

    assert!(result.verified);
    assert_eq!(result.iterations, 2);
    assert!(!result.artifact.contains(NEUTRAL_PLACEHOLDER));
}

#[test]
fn run_state_enforces_the_attempt_budget() {
    let mut state = RunState::new(2);
    assert_eq!(state.phase(), LoopPhase::Generating);
    assert!(state.begin_attempt());
    assert!(state.begin_attempt());
    assert!(!state.begin_attempt());
    assert_eq!(state.attempts_used(), 2);
}

#[test]
fn extracts_fenced_solidity_code() {
    use crate::refinement::extract::extract_solidity_code;

    let response = "Here you go:\n```solidity\ncontract A {}\n```\nDone.";
    assert_eq!(extract_solidity_code(response).as_deref(), Some("contract A {}"));
    assert!(extract_solidity_code("no code here").is_none());
}

#[test]
fn extracts_annotations_above_the_declaration() {
    use crate::refinement::extract::extract_function_annotations;

    let parser = StructuralParser::new();
    let model = parser.parse(INTERFACE);
    let entry = &model.functions[0];

    let response = "```solidity\n\
/// @notice postcondition supply == _totalSupply;\n\
function totalSupply() public view returns (uint256 supply);\n\
```";
    // The stray trailing semicolon is removed.
    assert_eq!(
        extract_function_annotations(response, entry).as_deref(),
        Some("/// @notice postcondition supply == _totalSupply")
    );
}

#[test]
fn falls_back_to_bare_annotation_lines() {
    use crate::refinement::extract::extract_function_annotations;

    let parser = StructuralParser::new();
    let model = parser.parse(INTERFACE);
    let entry = &model.functions[0];

    let response = "/// @notice postcondition supply >= 0";
    assert_eq!(
        extract_function_annotations(response, entry).as_deref(),
        Some("/// @notice postcondition supply >= 0")
    );
    assert!(extract_function_annotations("sorry, no idea", entry).is_none());
}
