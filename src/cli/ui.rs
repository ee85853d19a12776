use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::models::verification::{Classification, FunctionStatus};

/// Print a section header
pub fn print_header(title: &str) {
    let title = format!(" {} ", title);
    println!("\n{}\n", title.bold().white().on_blue());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "ERROR:".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "WARNING:".yellow().bold(), message);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "SUCCESS:".green().bold(), message);
}

/// Print information
pub fn print_info(message: &str) {
    println!("{} {}", "INFO:".blue().bold(), message);
}

/// Print a formatted result
pub fn print_result(label: &str, value: &str) {
    println!("{}: {}", label.bold(), value);
}

/// Create a new progress bar
pub fn create_progress_bar(length: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(length);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Print a classification with color
pub fn print_classification(classification: &Classification) {
    match classification {
        Classification::Pass => println!("{}", "✓ PASS".green().bold()),
        Classification::BenignPass => {
            println!("{}", "✓ PASS (benign diagnostics only)".green().bold())
        }
        Classification::Fail { errors } => {
            println!("{}", format!("✗ FAIL ({} error lines)", errors.len()).red().bold());
            for line in errors {
                println!("  {}", line.red());
            }
        }
    }
}

/// Print a per-function verdict with color
pub fn print_function_status(name: &str, status: &FunctionStatus) {
    match status {
        FunctionStatus::Verified => println!("  {} {}", "✓".green().bold(), name),
        FunctionStatus::Failed => println!("  {} {}", "✗".red().bold(), name),
    }
}
