use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{ChangeEvent, ExtractionResult, SubjectRecord};
use std::collections::HashMap;

/// Which stored snapshot a new extraction is compared against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceSnapshot {
    /// The snapshot that was newest before the extraction being checked was
    /// added. Falls back to the newest snapshot when nothing was added since
    /// the last detection.
    #[default]
    Previous,
    /// Whatever snapshot is newest when detection runs. If the extraction was
    /// already added this compares it with itself and finds nothing; kept for
    /// parity with history files written by older tooling.
    Latest,
}

/// Subjects keyed by name. A later duplicate replaces the earlier record but
/// keeps its position.
fn subjects_by_name(result: &ExtractionResult) -> Vec<(&str, &SubjectRecord)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut subjects: Vec<(&str, &SubjectRecord)> = Vec::new();

    for subject in &result.subjects {
        match positions.get(subject.name.as_str()) {
            Some(&index) => subjects[index].1 = subject,
            None => {
                positions.insert(subject.name.as_str(), subjects.len());
                subjects.push((subject.name.as_str(), subject));
            }
        }
    }

    subjects
}

/// Field-level differences between a reference extraction and a new one.
///
/// New subjects produce one `new-subject` event. For subjects in both, every
/// score column of the new record is compared exactly; a difference is
/// reported only when the new value is published. Subjects that disappeared
/// are not reported.
pub fn diff(
    reference: &ExtractionResult,
    new: &ExtractionResult,
    timestamp: DateTime<Utc>,
) -> Vec<ChangeEvent> {
    let previous: HashMap<&str, &SubjectRecord> = subjects_by_name(reference).into_iter().collect();
    let mut changes = Vec::new();

    for (name, record) in subjects_by_name(new) {
        let Some(old_record) = previous.get(name) else {
            changes.push(ChangeEvent::new_subject(timestamp, record.clone()));
            continue;
        };

        for (field, new_value) in record.score_fields() {
            let Some(new_value) = new_value else {
                continue;
            };

            let old_value = old_record.score(field);
            if old_value != Some(new_value) {
                changes.push(ChangeEvent::grade_updated(
                    timestamp, name, field, old_value, new_value,
                ));
            }
        }
    }

    changes
}
