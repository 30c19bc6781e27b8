#![forbid(unsafe_code)]

pub mod progress_store;
pub mod records;
pub mod repository;
pub mod sqlite;
pub mod user_store;

pub use progress_store::{ProgressStore, RecordedResult};
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
pub use user_store::UserStore;
