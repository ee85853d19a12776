use crate::models::contract::{AnnotationMap, FunctionEntry, StructuralModel};

/// Standing instructions sent with the first prompt of every run.
pub const DEFAULT_INSTRUCTIONS: &str = "\
Given a smart contract interface, write solc-verify postconditions for each \
function. Output only the annotated interface inside a ```solidity code \
block. Rules:
- Use only `/// @notice postcondition <expression>` lines, placed directly \
above each function signature.
- Write at most 4 postconditions per function.
- Refer only to state variables, function parameters and the return value.
- Use __verifier_old_uint(x) or __verifier_old_bool(x) for pre-state values.
- Do not add preconditions, modifiers, invariants or function bodies.";

/// Builds the prompts for both refinement variants.
///
/// An optional standards document (for example the EIP text) and worked
/// examples are folded into the initial prompt; feedback prompts carry the
/// critical verifier lines verbatim.
pub struct PromptBuilder {
    instructions: String,
    eip_doc: Option<String>,
    examples: Vec<String>,
}

impl PromptBuilder {
    pub fn new(eip_doc: Option<String>, examples: Vec<String>) -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            eip_doc,
            examples,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// The opening prompt of a whole-artifact run.
    pub fn initial_whole_prompt(&self, interface_text: &str) -> String {
        let mut prompt = self.instructions.clone();

        if let Some(doc) = &self.eip_doc {
            prompt.push_str("\n\nThe interface follows this standard:\n\n");
            prompt.push_str(doc);
        }

        for example in &self.examples {
            prompt.push_str("\n\nExample of a correctly annotated interface:\n\n");
            prompt.push_str(example);
        }

        prompt.push_str("\n\nAnnotate this interface:\n\n```solidity\n");
        prompt.push_str(interface_text);
        prompt.push_str("\n```\n");
        prompt
    }

    /// Follow-up after a failed verification, quoting the surviving
    /// diagnostic lines unchanged.
    pub fn feedback_prompt(&self, error_lines: &[String]) -> String {
        let mut prompt = String::from(
            "The verifier rejected the previous annotations with these errors:\n\n",
        );
        for line in error_lines {
            prompt.push_str(line);
            prompt.push('\n');
        }
        prompt.push_str(
            "\nFix the postconditions that failed and resend the complete annotated \
             interface in a ```solidity code block.",
        );
        prompt
    }

    /// Follow-up when no candidate could be extracted from the response.
    pub fn clarification_prompt(&self) -> String {
        "Your previous response did not contain an annotated interface. Resend the \
         complete interface with `/// @notice postcondition` lines above each \
         function, inside a ```solidity code block."
            .to_string()
    }

    /// The opening prompt when refining a single function, carrying the
    /// contract's structure and the annotations already confirmed.
    pub fn function_prompt(
        &self,
        model: &StructuralModel,
        confirmed: &AnnotationMap,
        entry: &FunctionEntry,
    ) -> String {
        let mut prompt = self.instructions.clone();

        if let Some(doc) = &self.eip_doc {
            prompt.push_str("\n\nThe contract follows this standard:\n\n");
            prompt.push_str(doc);
        }

        prompt.push_str("\n\nThe contract declares these state variables:\n\n");
        for var in &model.state_vars {
            prompt.push_str(var);
            prompt.push('\n');
        }

        if !model.events.is_empty() {
            prompt.push_str("\nAnd these events:\n\n");
            for event in &model.events {
                prompt.push_str(event);
                prompt.push('\n');
            }
        }

        if !confirmed.is_empty() {
            prompt.push_str("\nThese functions are already verified:\n\n");
            for (signature, annotation) in confirmed.iter() {
                prompt.push_str(annotation);
                prompt.push('\n');
                prompt.push_str(signature);
                prompt.push_str("\n\n");
            }
        }

        prompt.push_str("\nWrite postconditions for this function only:\n\n```solidity\n");
        prompt.push_str(&entry.signature);
        prompt.push_str("\n```\n");
        prompt
    }

    /// Per-function follow-up after a failed verification of `proposed`.
    pub fn function_feedback_prompt(
        &self,
        entry: &FunctionEntry,
        proposed: &str,
        error_lines: &[String],
    ) -> String {
        let mut prompt = format!(
            "The postconditions you proposed for {} failed verification:\n\n{}\n{}\n\n\
             The verifier reported:\n\n",
            entry.name, proposed, entry.signature
        );
        for line in error_lines {
            prompt.push_str(line);
            prompt.push('\n');
        }
        prompt.push_str(
            "\nResend corrected postconditions for this function only, inside a \
             ```solidity code block.",
        );
        prompt
    }
}
