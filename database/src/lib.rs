pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod moderation;
pub mod profiles;
pub mod store;

pub use config::{DatabaseConfig, MEMORY_URL};
pub use error::DatabaseError;
pub use models::{GameCatalog, GameListing, GameSummary, PendingReport, ProgressReset, ScoreWithTitle};
pub use store::{GameStore, MemoryStore, SqliteStore};

#[cfg(test)]
mod tests;
