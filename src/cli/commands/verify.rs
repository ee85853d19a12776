use std::path::Path;

use anyhow::{anyhow, Result};

use crate::classifier::ResultClassifier;
use crate::cli::ui;
use crate::config::ForgeConfig;
use crate::implementations::SolcVerifyAdapter;
use crate::merge::{ContractTemplate, MergePipeline};
use crate::traits::artifact_verifier::ArtifactVerifier;

/// One-shot verification: merge an already-annotated interface into the
/// template and run the verifier once, printing the classification.
pub async fn execute(
    config: &ForgeConfig,
    annotated: &Path,
    template: &Path,
    prefix: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    ui::print_header("One-Shot Verification");

    let annotated_text = super::read_input("annotated interface", annotated)?;
    let template_text = super::read_input("template", template)?;

    let prefix = prefix.or_else(|| config.refinement.prefix.clone());
    let pipeline = MergePipeline::new(ContractTemplate::new(template_text), prefix);

    // The scratch directory must outlive the verifier call.
    let workdir = tempfile::TempDir::new()?;
    let artifact_path = match output {
        Some(path) => path.to_path_buf(),
        None => workdir.path().join("merged.sol"),
    };

    let (_, model) = pipeline
        .merge_to_file(&annotated_text, &artifact_path)
        .map_err(|e| anyhow!("Merge failed: {}", e))?;
    ui::print_info(&format!("Merged artifact at {}", artifact_path.display()));

    let verifier = SolcVerifyAdapter::from_config(&config.verifier);
    let outcome = verifier.verify(&artifact_path).await;
    ui::print_result("Verifier status", &outcome.status.to_string());

    let classifier = ResultClassifier::from_patterns(&config.verifier.benign_patterns)?;
    let targets = model.function_names();
    let classification = classifier.classify(&outcome, &targets);
    ui::print_classification(&classification);

    if classification.is_success() {
        ui::print_success("Annotations verified");
    } else {
        ui::print_warning("Annotations rejected; full verifier output follows");
        println!("{}", outcome.output);
    }

    Ok(())
}
