use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query execution error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Game not found: {0}")]
    GameNotFound(String),

    #[error("Score not found: {0}")]
    ScoreNotFound(Uuid),

    #[error("Report not found: {0}")]
    ReportNotFound(Uuid),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Invalid scenario: {0}")]
    Scenario(#[from] types::ScenarioError),

    #[error("Invalid join code: {0}")]
    JoinCode(#[from] types::JoinCodeError),

    #[error("Simulated write failure: {0}")]
    Unavailable(String),

    #[error("UUID parsing error: {0}")]
    UuidParsing(#[from] uuid::Error),
}

impl DatabaseError {
    pub fn query(err: sqlx::Error) -> Self {
        DatabaseError::Query(err.to_string())
    }

    pub fn transaction(err: sqlx::Error) -> Self {
        DatabaseError::Transaction(err.to_string())
    }
}
