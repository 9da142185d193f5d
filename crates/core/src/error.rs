use thiserror::Error;

/// Errors shared by the classifier, translator, executor and backends.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeskError {
    #[error("could not understand command: {0}")]
    Classification(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("malformed augmented response: {0}")]
    MalformedAugmentedResponse(String),

    #[error("unsupported: {0}")]
    CapabilityUnsupported(String),

    #[error("{program} exited with status {code}: {stderr}")]
    ToolFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("tool not allowed: {0}")]
    ToolNotAllowed(String),

    #[error("bus error: {0}")]
    Bus(String),

    #[error("augmentation error: {0}")]
    Augmentation(String),

    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DeskError {
    fn from(err: std::io::Error) -> Self {
        DeskError::Io(err.to_string())
    }
}

impl DeskError {
    /// Errors after which no further fallback attempt should run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeskError::Cancelled)
    }
}

pub type DeskResult<T> = Result<T, DeskError>;
