pub mod file_store;
pub mod key_value;
pub mod memory_store;

pub use file_store::FileStore;
pub use key_value::{KeyValueStore, StorageError};
pub use memory_store::InMemoryStore;
