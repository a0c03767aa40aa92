#![forbid(unsafe_code)]

pub mod fs;
pub mod repository;

pub use fs::FileSnapshotRepository;
pub use repository::{InMemoryRepository, SnapshotRepository, Storage, StorageError};
