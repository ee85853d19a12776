pub mod extract;
pub mod function;
pub mod prompts;
pub mod whole;

pub use function::FunctionByFunctionLoop;
pub use prompts::PromptBuilder;
pub use whole::WholeArtifactLoop;

use crate::models::verification::IterationRecord;

/// Phase of a refinement run. Transitions are driven by the loop drivers;
/// `Succeeded` and `FailTerminal` are the only terminal phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Generating,
    Merging,
    Verifying,
    Succeeded,
    FailRetry,
    FailTerminal,
}

/// Mutable state of one refinement run: the attempt counter, the current
/// phase and the full iteration log. All run-scoped bookkeeping lives here
/// so that concurrent runs cannot observe each other.
pub struct RunState {
    attempt: u32,
    max_attempts: u32,
    phase: LoopPhase,
    records: Vec<IterationRecord>,
}

impl RunState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            phase: LoopPhase::Generating,
            records: Vec::new(),
        }
    }

    /// Start the next attempt; returns false once the budget is spent.
    pub fn begin_attempt(&mut self) -> bool {
        if self.attempt >= self.max_attempts {
            return false;
        }
        self.attempt += 1;
        true
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempt
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: LoopPhase) {
        self.phase = phase;
    }

    pub fn record(&mut self, record: IterationRecord) {
        self.records.push(record);
    }

    pub fn into_records(self) -> Vec<IterationRecord> {
        self.records
    }
}
