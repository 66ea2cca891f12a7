use crate::grades::{ExtractionResult, ScoreField, SubjectRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped extraction kept in the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub data: ExtractionResult,
}

/// A single difference found between a new extraction and its reference snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "materia")]
    pub subject: String,
    #[serde(flatten)]
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum ChangeKind {
    /// Subject present in the new extraction but not in the reference
    #[serde(rename = "materia_nueva")]
    NewSubject {
        #[serde(rename = "datos")]
        record: SubjectRecord,
    },
    /// A score column changed to a published value
    #[serde(rename = "calificacion_actualizada")]
    GradeUpdated {
        #[serde(rename = "parcial")]
        field: ScoreField,
        #[serde(rename = "calificacion_anterior")]
        old: Option<f64>,
        #[serde(rename = "calificacion_nueva")]
        new: f64,
    },
}

impl ChangeEvent {
    pub fn new_subject(timestamp: DateTime<Utc>, record: SubjectRecord) -> Self {
        Self {
            timestamp,
            subject: record.name.clone(),
            kind: ChangeKind::NewSubject { record },
        }
    }

    pub fn grade_updated(
        timestamp: DateTime<Utc>,
        subject: impl Into<String>,
        field: ScoreField,
        old: Option<f64>,
        new: f64,
    ) -> Self {
        Self {
            timestamp,
            subject: subject.into(),
            kind: ChangeKind::GradeUpdated { field, old, new },
        }
    }

    /// `new-subject` or `grade-updated`
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ChangeKind::NewSubject { .. } => "new-subject",
            ChangeKind::GradeUpdated { .. } => "grade-updated",
        }
    }
}

/// Summary numbers reported by the history store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStatistics {
    pub total_snapshots: usize,
    pub total_changes: usize,
    #[serde(default, deserialize_with = "crate::timestamp::deserialize_option")]
    pub last_check: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::timestamp::deserialize_option")]
    pub first_snapshot: Option<DateTime<Utc>>,
}
