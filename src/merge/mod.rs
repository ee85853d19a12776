pub mod assembler;
pub mod parser;
pub mod rewriter;
pub mod template;

pub use assembler::{PartialContractAssembler, NEUTRAL_PLACEHOLDER};
pub use parser::StructuralParser;
pub use rewriter::ReferenceRewriter;
pub use template::ContractTemplate;

use std::collections::HashMap;
use std::path::Path;

use log::debug;

use crate::errors::{SpecForgeError, SpecForgeResult};
use crate::models::contract::StructuralModel;

/// The annotation merge engine: parses an annotated specification, rewrites
/// each function's annotation block into the merge namespace, and substitutes
/// the blocks into the contract template.
pub struct MergePipeline {
    parser: StructuralParser,
    rewriter: ReferenceRewriter,
    template: ContractTemplate,
}

impl MergePipeline {
    pub fn new(template: ContractTemplate, prefix: Option<String>) -> Self {
        Self {
            parser: StructuralParser::new(),
            rewriter: ReferenceRewriter::new(prefix),
            template,
        }
    }

    /// Merge `annotated_spec` into the template, returning the artifact text
    /// and the structural model it was built from.
    pub fn merge(&self, annotated_spec: &str) -> SpecForgeResult<(String, StructuralModel)> {
        let model = self.parser.parse(annotated_spec);
        if model.functions.is_empty() {
            return Err(SpecForgeError::MergeError(
                "annotated specification contains no function declarations".to_string(),
            ));
        }

        let mut values: HashMap<String, String> = HashMap::new();
        for function in &model.functions {
            // Functions the candidate left unannotated substitute to the
            // empty string so the placeholder becomes a no-op.
            let annotation = match &function.documentation {
                Some(doc) => self.rewriter.rewrite_block(doc, &model.state_var_names),
                None => String::new(),
            };
            values.insert(function.name.clone(), annotation);
        }

        debug!(
            "Merging {} annotation blocks into template",
            values.len()
        );
        let artifact = self.template.substitute(&values)?;
        Ok((artifact, model))
    }

    /// Merge and write the artifact to `out_path` for the verifier.
    pub fn merge_to_file(
        &self,
        annotated_spec: &str,
        out_path: &Path,
    ) -> SpecForgeResult<(String, StructuralModel)> {
        let (artifact, model) = self.merge(annotated_spec)?;
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(out_path, &artifact)?;
        debug!("Merge artifact written to {}", out_path.display());
        Ok((artifact, model))
    }
}
