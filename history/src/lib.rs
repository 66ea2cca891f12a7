//! History Crate
//!
//! Keeps a capped, file-backed history of grade extractions for one student
//! and reports what changed between consecutive extractions.

pub mod change_detector;
pub mod error;
pub mod store;

pub use change_detector::{diff, ReferenceSnapshot};
pub use error::StorageError;
pub use store::{
    store_path, CorruptFilePolicy, HistoryData, HistoryOptions, HistoryStore, MAX_CHANGES,
    MAX_SNAPSHOTS,
};
