use jmxgate_common::{QueryResult, ResponseMap, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JmxGateError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, JmxGateError>;

/// Failures of a single query. Each one is turned into an `error` entry at
/// the boundary where it happens; none aborts the surrounding request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("User {user_id} has no permission.")]
    Unauthorized { user_id: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unknown worker '{0}'")]
    UnknownWorker(String),

    #[error("No workers are registered")]
    NoWorkers,

    #[error("Cannot contact worker {host_port}: {cause}")]
    Transport { host_port: String, cause: String },
}

impl QueryError {
    pub fn into_map(self) -> ResponseMap {
        QueryResult::from(self).into_map()
    }
}

impl From<QueryError> for QueryResult {
    fn from(err: QueryError) -> Self {
        QueryResult::Error(err.to_string())
    }
}
