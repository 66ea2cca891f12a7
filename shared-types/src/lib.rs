pub mod extraction;
pub mod grades;
pub mod history;
pub mod timestamp;

pub use grades::{
    ExtractionResult, ScoreField, Scores, SubjectRecord, UnknownScoreField, FINAL_GRADE_LABEL,
    MAX_PARTIAL, NOT_AVAILABLE,
};
pub use history::{ChangeEvent, ChangeKind, HistoryStatistics, Snapshot};

// Re-export extraction types
pub use extraction::*;
