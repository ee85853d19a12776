use anyhow::Result;
use clap::Parser;
use log::info;

use specforge::cli::commands;
use specforge::cli::{Commands, SpecForgeCli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = SpecForgeCli::parse();
    setup_logging(&cli.log_level);

    let config = commands::load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Refine {
            interface,
            template,
            eip,
            examples,
            runs,
            max_attempts,
            jobs,
            prefix,
            output,
        } => {
            commands::refine::execute(
                &config,
                interface,
                template,
                eip.as_deref(),
                examples,
                *runs,
                *max_attempts,
                *jobs,
                prefix.clone(),
                output.as_deref(),
            )
            .await?;
        }

        Commands::RefineFunctions {
            interface,
            template,
            eip,
            contract_name,
            runs,
            max_attempts_per_function,
            jobs,
            prefix,
            output,
        } => {
            commands::functions::execute(
                &config,
                interface,
                template,
                eip.as_deref(),
                contract_name,
                *runs,
                *max_attempts_per_function,
                *jobs,
                prefix.clone(),
                output.as_deref(),
            )
            .await?;
        }

        Commands::Verify {
            annotated,
            template,
            prefix,
            output,
        } => {
            commands::verify::execute(
                &config,
                annotated,
                template,
                prefix.clone(),
                output.as_deref(),
            )
            .await?;
        }
    }

    Ok(())
}

fn setup_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    env_logger::Builder::new().filter_level(level).init();

    info!("Logger initialized with level: {}", log_level);
}
