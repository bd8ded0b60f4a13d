pub mod accounts;
pub mod config;
pub mod controller;
pub mod error;
pub mod game_file;
pub mod gameplay;

pub use accounts::sign_in;
pub use config::ExplorerConfig;
pub use controller::{Finalized, PlaySession};
pub use error::{ExplorerError, Notice, PlayError};
pub use game_file::GameFile;
pub use gameplay::{run_session, Outcome, SessionReport};
