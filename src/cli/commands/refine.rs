use std::path::{Path, PathBuf};
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
use crate::merge::{ContractTemplate, MergePipeline, StructuralParser};
use crate::models::report::{RunRecord, RunReport};
use crate::refinement::{PromptBuilder, WholeArtifactLoop};

struct RunInputs {
    config: ForgeConfig,
    interface_text: String,
    template_text: String,
    eip_doc: Option<String>,
    examples: Vec<String>,
    prefix: Option<String>,
    max_attempts: u32,
}

/// Whole-artifact refinement command: N independent runs, bounded
/// concurrency, one CSV row per run.
#[allow(clippy::too_many_arguments)]
pub async fn execute(
    config: &ForgeConfig,
    interface: &Path,
    template: &Path,
    eip: Option<&Path>,
    examples: &[PathBuf],
    runs: Option<u32>,
    max_attempts: Option<u32>,
    jobs: Option<usize>,
    prefix: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    ui::print_header("Whole-Artifact Refinement");

    let interface_text = super::read_input("interface", interface)?;

    // A target interface with no recognizable functions means every run
    // would be wasted; fail before spending any API budget.
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
    let examples = examples
        .iter()
        .map(|p| super::read_input("example", p))
        .collect::<Result<Vec<_>>>()?;

    let runs = runs.unwrap_or(config.refinement.runs);
    let max_attempts = max_attempts.unwrap_or(config.refinement.max_attempts);
    let jobs = jobs.unwrap_or(config.refinement.jobs).max(1);
    let prefix = prefix.or_else(|| config.refinement.prefix.clone());

    let inputs = Arc::new(RunInputs {
        config: config.clone(),
        interface_text,
        template_text,
        eip_doc,
        examples,
        prefix,
        max_attempts,
    });

    ui::print_info(&format!(
        "Starting {} runs ({} concurrent, {} attempts each)",
        runs, jobs, max_attempts
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

    ui::print_result(
        "Verified runs",
        &format!("{}/{}", report.verified_count(), runs),
    );
    let out_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| super::default_output_path("refine"));
    report.write_csv(&out_path)?;
    ui::print_success(&format!("Run records written to {}", out_path.display()));

    Ok(())
}

async fn run_once(run: u32, inputs: &RunInputs) -> SpecForgeResult<RunRecord> {
    // Every run gets its own scratch directory; concurrent runs must not
    // share artifact paths.
    let workdir = tempfile::TempDir::new()?;

    let generator = ChatCandidateGenerator::new(inputs.config.generator.clone());
    let verifier = SolcVerifyAdapter::from_config(&inputs.config.verifier);
    let pipeline = MergePipeline::new(
        ContractTemplate::new(inputs.template_text.clone()),
        inputs.prefix.clone(),
    );
    let classifier = ResultClassifier::from_patterns(&inputs.config.verifier.benign_patterns)?;
    let prompts = PromptBuilder::new(inputs.eip_doc.clone(), inputs.examples.clone());

    let refinement = WholeArtifactLoop::new(
        generator,
        verifier,
        pipeline,
        classifier,
        prompts,
        inputs.max_attempts,
        workdir.path().to_path_buf(),
    );

    let started = Instant::now();
    let result = refinement.run(&inputs.interface_text).await?;
    Ok(RunRecord::from_run_result(
        run,
        started.elapsed().as_secs_f64(),
        result,
    ))
}
