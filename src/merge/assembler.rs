use crate::models::contract::{AnnotationMap, StructuralModel};

/// Annotation inserted for functions that have no confirmed annotation yet.
/// Always true, so the artifact stays well-formed while only the target
/// function's candidate is actually under test.
pub const NEUTRAL_PLACEHOLDER: &str = "/// @notice postcondition true";

/// Builds an artifact in which confirmed functions carry their verified
/// annotations, the function currently being verified carries whatever the
/// caller inserted, and every other function gets the neutral placeholder.
pub struct PartialContractAssembler {
    contract_name: String,
}

impl PartialContractAssembler {
    pub fn new(contract_name: impl Into<String>) -> Self {
        Self {
            contract_name: contract_name.into(),
        }
    }

    /// Assemble the partial contract. `in_flight` is the signature of the
    /// function whose candidate the caller manages separately; it gets no
    /// annotation line here.
    pub fn assemble(
        &self,
        model: &StructuralModel,
        annotations: &AnnotationMap,
        in_flight: Option<&str>,
    ) -> String {
        let mut code = format!(
            "pragma solidity >=0.5.0;\n\ncontract {} {{\n\n",
            self.contract_name
        );

        code.push_str("    // Events\n");
        for event in &model.events {
            code.push_str(&format!("    {}\n", event));
        }
        code.push('\n');

        code.push_str("    // State Variables\n");
        for var in &model.state_vars {
            code.push_str(&format!("    {}\n", var));
        }
        code.push('\n');

        code.push_str("    // Functions\n");
        for function in &model.functions {
            if let Some(annotation) = annotations.get(&function.signature) {
                for line in annotation.lines() {
                    let line = line.trim();
                    if !line.is_empty() {
                        code.push_str(&format!("    {}\n", line));
                    }
                }
            } else if in_flight == Some(function.signature.as_str()) {
                // Candidate annotations are inserted by the caller.
            } else {
                code.push_str(&format!("    {}\n", NEUTRAL_PLACEHOLDER));
            }
            code.push_str(&format!("    {}\n\n", function.signature));
        }

        code.push_str("}\n");
        code
    }
}
