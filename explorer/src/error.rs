use std::fmt::Display;

use database::DatabaseError;
use thiserror::Error;
use types::AlreadyCompleted;

/// Reasons a play session cannot start or continue.
#[derive(Error, Debug)]
pub enum PlayError {
    #[error("No game found for code {0:?}")]
    GameNotFound(String),

    #[error("You need to sign in to play")]
    Unauthenticated,

    #[error(transparent)]
    AlreadyCompleted(#[from] AlreadyCompleted),

    #[error("Could not reach the game store: {0}")]
    Persistence(#[from] DatabaseError),
}

/// A write that failed during a run. The run carries on; the next
/// transition writes again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub operation: &'static str,
    pub message: String,
}

impl Notice {
    pub fn new(operation: &'static str, err: &DatabaseError) -> Self {
        Self {
            operation,
            message: err.to_string(),
        }
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Could not {}: {}", self.operation, self.message)
    }
}

/// Everything the command line front end can fail with.
#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unable to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Play(#[from] PlayError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Scenario(#[from] types::ScenarioError),
}
