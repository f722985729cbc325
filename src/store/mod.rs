//! Resource store backends

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryResourceStore;
pub use sqlite::SqliteResourceStore;
pub use traits::{ResourceStoreCapability, StorageError, StorageResult};
