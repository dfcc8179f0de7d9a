//! Error types for the home office node.

use homeoffice_tally::ClosureReport;
use thiserror::Error;
use uuid::Uuid;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in node operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Actor's role or status does not allow the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Target cannot be nominated
    #[error("Invalid nominee: {0}")]
    InvalidNominee(String),

    /// Target is not a candidate of the period
    #[error("Invalid candidate: {0}")]
    InvalidCandidate(String),

    /// Same nominator already nominated this user in the period
    #[error("Nomination already exists for this user in this period")]
    DuplicateNomination,

    /// Period cannot be closed in its current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Period no longer accepts nominations or votes
    #[error("Period {0} is closed")]
    PeriodClosed(Uuid),

    /// Closure blocked by missing activity; retry with force to override
    #[error("Validation required: {}", .0.summary)]
    ValidationRequired(ClosureReport),
}

impl Error {
    /// Machine-readable error kind for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::InvalidInput(_) => "invalid_input",
            Error::Forbidden(_) => "forbidden",
            Error::InvalidNominee(_) => "invalid_nominee",
            Error::InvalidCandidate(_) => "invalid_candidate",
            Error::DuplicateNomination => "duplicate_nomination",
            Error::InvalidState(_) => "invalid_state",
            Error::PeriodClosed(_) => "period_closed",
            Error::ValidationRequired(_) => "validation_required",
            Error::Storage(_) | Error::Serialization(_) | Error::Io(_) | Error::Config(_) => {
                "internal"
            }
        }
    }
}

impl From<rocksdb::Error> for Error {
    fn from(e: rocksdb::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<homeoffice_tally::RoleError> for Error {
    fn from(e: homeoffice_tally::RoleError) -> Self {
        Error::InvalidInput(e.to_string())
    }
}
