use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;
pub mod ui;

#[derive(Parser)]
#[command(
    name = "specforge",
    about = "Generates and refines verifier-checked postcondition annotations for token contract interfaces",
    version,
    author,
    long_about = None
)]
pub struct SpecForgeCli {
    /// Sets the log level (error, warn, info, debug, trace)
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Refine annotations for the whole interface at once
    Refine {
        /// Path to the contract interface to annotate
        #[arg(short, long)]
        interface: PathBuf,

        /// Path to the implementation template with $function placeholders
        #[arg(short, long)]
        template: PathBuf,

        /// Path to the standard document (e.g. the EIP text) given to the generator
        #[arg(short, long)]
        eip: Option<PathBuf>,

        /// Paths to example annotated interfaces given to the generator
        #[arg(long)]
        examples: Vec<PathBuf>,

        /// Number of independent runs
        #[arg(short, long)]
        runs: Option<u32>,

        /// Attempt budget per run
        #[arg(short, long)]
        max_attempts: Option<u32>,

        /// Number of runs executed concurrently
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Namespace token prepended to state-variable references
        #[arg(short, long)]
        prefix: Option<String>,

        /// Output CSV file for the run records
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Refine annotations one function at a time against partial contracts
    RefineFunctions {
        /// Path to the contract interface to annotate
        #[arg(short, long)]
        interface: PathBuf,

        /// Path to the implementation template with $function placeholders
        #[arg(short, long)]
        template: PathBuf,

        /// Path to the standard document (e.g. the EIP text) given to the generator
        #[arg(short, long)]
        eip: Option<PathBuf>,

        /// Contract name used for the assembled partial contracts
        #[arg(long, default_value = "ERC20")]
        contract_name: String,

        /// Number of independent runs
        #[arg(short, long)]
        runs: Option<u32>,

        /// Attempt budget per function
        #[arg(short, long)]
        max_attempts_per_function: Option<u32>,

        /// Number of runs executed concurrently
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Namespace token prepended to state-variable references
        #[arg(short, long)]
        prefix: Option<String>,

        /// Output CSV file for the run records
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge an already-annotated interface and verify it once
    Verify {
        /// Path to the annotated interface
        #[arg(short, long)]
        annotated: PathBuf,

        /// Path to the implementation template with $function placeholders
        #[arg(short, long)]
        template: PathBuf,

        /// Namespace token prepended to state-variable references
        #[arg(short, long)]
        prefix: Option<String>,

        /// Where to keep the merged artifact (a temporary file by default)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
