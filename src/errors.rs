use thiserror::Error;

/// Custom error types for the specforge system
#[derive(Debug, Error)]
pub enum SpecForgeError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Extraction error: {0}")]
    ExtractionError(String),

    #[error("Merge error: {0}")]
    MergeError(String),

    #[error("Unbound template placeholder: {0}")]
    UnboundPlaceholder(String),

    #[error("Generator error: {0}")]
    GeneratorError(String),

    #[error("Verifier invocation error: {0}")]
    VerifierError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("System error: {0}")]
    SystemError(String),

    #[error("Error in external tool {tool}: {message}")]
    ExternalToolError { tool: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
}

/// Result type specific to specforge operations
pub type SpecForgeResult<T> = Result<T, SpecForgeError>;

impl SpecForgeError {
    /// Whether the refinement state machine may fold this error into a retry.
    ///
    /// A failed parse of the target interface and configuration problems
    /// abort a run outright; everything else becomes a FAIL classification
    /// and consumes an attempt.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SpecForgeError::ParseError(_) => false,
            SpecForgeError::ConfigError(_) => false,
            SpecForgeError::InvalidInput(_) => false,
            SpecForgeError::ExtractionError(_) => true,
            SpecForgeError::MergeError(_) => true,
            SpecForgeError::UnboundPlaceholder(_) => true,
            SpecForgeError::GeneratorError(_) => true,
            SpecForgeError::VerifierError(_) => true,
            SpecForgeError::ExternalToolError { .. } => true,
            _ => false,
        }
    }
}
