pub mod functions;
pub mod refine;
pub mod verify;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::cli::ui;
use crate::config::ForgeConfig;

/// Load the configuration file if given, falling back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<ForgeConfig> {
    match path {
        Some(path) => {
            let config = ForgeConfig::from_file(path)
                .map_err(|e| anyhow!("Failed to load config {}: {}", path.display(), e))?;
            ui::print_info(&format!("Loaded configuration from {}", path.display()));
            Ok(config)
        }
        None => Ok(ForgeConfig::default()),
    }
}

pub fn read_input(label: &str, path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read {} file {}: {}", label, path.display(), e))
}

/// Timestamped default location for the run records CSV.
pub fn default_output_path(kind: &str) -> PathBuf {
    PathBuf::from(format!(
        "results_{}_{}.csv",
        kind,
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    ))
}
