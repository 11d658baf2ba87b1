use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No observer is registered")]
    MissingObserver,

    #[error("Observer already registered: {existing} (rejected {rejected})")]
    DuplicateObserver { existing: String, rejected: String },

    #[error("Entity already tracked: {id}")]
    DuplicateEntity { id: String },

    #[error("Invalid target: {id}")]
    InvalidTarget { id: String },

    #[error("Serialization failure: {reason}")]
    SerializationFailure { reason: String },

    #[error("Dispatch failure: {0}")]
    DispatchFailure(String),

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::SerializationFailure {
            reason: e.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Response slot error: {0}")]
    ResponseSlot(String),

    #[error("Journal error: {0}")]
    Journal(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
