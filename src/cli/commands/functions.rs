use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::classifier::ResultClassifier;
use crate::cli::ui;
use crate::config::ForgeConfig;
use crate::errors::{SpecForgeError, SpecForgeResult};
use crate::implementations::{ChatCandidateGenerator, SolcVerifyAdapter};
use crate::merge::{ContractTemplate, MergePipeline, PartialContractAssembler, StructuralParser};
use crate::models::contract::StructuralModel;
use crate::models::report::{RunRecord, RunReport};
use crate::models::verification::FunctionStatus;
use crate::refinement::{FunctionByFunctionLoop, PromptBuilder};

struct RunInputs {
    config: ForgeConfig,
    model: StructuralModel,
    template_text: String,
    eip_doc: Option<String>,
    contract_name: String,
    prefix: Option<String>,
    max_attempts_per_function: u32,
}

/// Per-function refinement command: each run annotates the interface one
/// function at a time, verifying against partial contracts.
#[allow(clippy::too_many_arguments)]
pub async fn execute(
    config: &ForgeConfig,
    interface: &Path,
    template: &Path,
    eip: Option<&Path>,
    contract_name: &str,
    runs: Option<u32>,
    max_attempts_per_function: Option<u32>,
    jobs: Option<usize>,
    prefix: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    ui::print_header("Function-by-Function Refinement");

    let interface_text = super::read_input("interface", interface)?;
    let parser = StructuralParser::new();
    let model = parser
        .parse_checked(&interface_text)
        .map_err(|e| anyhow!("Interface {} is unusable: {}", interface.display(), e))?;
    ui::print_info(&format!(
        "Interface declares {} functions: {}",
        model.functions.len(),
        model.function_names().join(", ")
    ));

    let template_text = super::read_input("template", template)?;
    let eip_doc = eip.map(|p| super::read_input("standard document", p)).transpose()?;

    let runs = runs.unwrap_or(config.refinement.runs);
    let max_attempts_per_function =
        max_attempts_per_function.unwrap_or(config.refinement.max_attempts_per_function);
    let jobs = jobs.unwrap_or(config.refinement.jobs).max(1);
    let prefix = prefix.or_else(|| config.refinement.prefix.clone());

    let inputs = Arc::new(RunInputs {
        config: config.clone(),
        model,
        template_text,
        eip_doc,
        contract_name: contract_name.to_string(),
        prefix,
        max_attempts_per_function,
    });

    ui::print_info(&format!(
        "Starting {} runs ({} concurrent, {} attempts per function)",
        runs, jobs, max_attempts_per_function
    ));
    let progress = ui::create_progress_bar(runs as u64, "refining");
    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut tasks: JoinSet<SpecForgeResult<RunRecord>> = JoinSet::new();

    for run in 1..=runs {
        let inputs = Arc::clone(&inputs);
        let semaphore = Arc::clone(&semaphore);
        let progress = progress.clone();
        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| SpecForgeError::SystemError(format!("worker pool closed: {}", e)))?;
            let record = run_once(run, &inputs).await;
            progress.inc(1);
            record
        });
    }

    let mut records = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let record = joined.map_err(|e| anyhow!("run task panicked: {}", e))??;
        records.push(record);
    }
    progress.finish_with_message("runs complete");

    records.sort_by_key(|r| r.run);
    let mut report = RunReport::new();
    for record in records {
        report.push(record);
    }

    print_function_summary(&inputs.model, &report);
    ui::print_result(
        "Verified runs",
        &format!("{}/{}", report.verified_count(), runs),
    );
    let out_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| super::default_output_path("refine_functions"));
    report.write_csv(&out_path)?;
    ui::print_success(&format!("Run records written to {}", out_path.display()));

    Ok(())
}

async fn run_once(run: u32, inputs: &RunInputs) -> SpecForgeResult<RunRecord> {
    let workdir = tempfile::TempDir::new()?;

    let generator = ChatCandidateGenerator::new(inputs.config.generator.clone());
    let verifier = SolcVerifyAdapter::from_config(&inputs.config.verifier);
    let assembler = PartialContractAssembler::new(inputs.contract_name.clone());
    let pipeline = MergePipeline::new(
        ContractTemplate::new(inputs.template_text.clone()),
        inputs.prefix.clone(),
    );
    let classifier = ResultClassifier::from_patterns(&inputs.config.verifier.benign_patterns)?;
    let prompts = PromptBuilder::new(inputs.eip_doc.clone(), Vec::new());

    let refinement = FunctionByFunctionLoop::new(
        generator,
        verifier,
        assembler,
        pipeline,
        classifier,
        prompts,
        inputs.max_attempts_per_function,
        workdir.path().to_path_buf(),
    );

    let started = Instant::now();
    let result = refinement.run(&inputs.model).await?;
    Ok(RunRecord::from_run_result(
        run,
        started.elapsed().as_secs_f64(),
        result,
    ))
}

/// How often each function verified across the runs.
fn print_function_summary(model: &StructuralModel, report: &RunReport) {
    if report.records.is_empty() {
        return;
    }
    println!("\nPer-function verification rate:");
    for name in model.function_names() {
        let verified = report
            .records
            .iter()
            .filter(|r| r.function_status.get(name) == Some(&FunctionStatus::Verified))
            .count();
        let status = if verified == report.records.len() {
            FunctionStatus::Verified
        } else {
            FunctionStatus::Failed
        };
        ui::print_function_status(
            &format!("{} ({}/{})", name, verified, report.records.len()),
            &status,
        );
    }
}
