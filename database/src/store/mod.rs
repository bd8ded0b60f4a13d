mod memory;
pub(crate) mod rows;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::GameStore;
