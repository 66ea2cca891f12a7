use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Placeholder stored for student metadata that could not be recovered
pub const NOT_AVAILABLE: &str = "No disponible";

/// Label used for the overall subject grade in change events
pub const FINAL_GRADE_LABEL: &str = "calificacion_final";

/// Highest partial number the portal ever shows (P1..P9, PF1..PF9)
pub const MAX_PARTIAL: u8 = 9;

/// A score column of a subject row.
///
/// Serializes as the label the portal uses: `P1`..`P9`, `PF1`..`PF9` and
/// `calificacion_final`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScoreField {
    Partial(u8),
    FinalPartial(u8),
    FinalGrade,
}

impl ScoreField {
    pub fn partial(number: u8) -> Option<Self> {
        (1..=MAX_PARTIAL)
            .contains(&number)
            .then_some(ScoreField::Partial(number))
    }

    pub fn final_partial(number: u8) -> Option<Self> {
        (1..=MAX_PARTIAL)
            .contains(&number)
            .then_some(ScoreField::FinalPartial(number))
    }

    pub fn label(&self) -> String {
        match self {
            ScoreField::Partial(n) => format!("P{}", n),
            ScoreField::FinalPartial(n) => format!("PF{}", n),
            ScoreField::FinalGrade => FINAL_GRADE_LABEL.to_string(),
        }
    }
}

impl fmt::Display for ScoreField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown score field label: {0}")]
pub struct UnknownScoreField(pub String);

impl FromStr for ScoreField {
    type Err = UnknownScoreField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == FINAL_GRADE_LABEL {
            return Ok(ScoreField::FinalGrade);
        }

        let parse_number = |digits: &str| -> Option<u8> {
            if digits.len() == 1 {
                digits.parse::<u8>().ok()
            } else {
                None
            }
        };

        let field = if let Some(rest) = s.strip_prefix("PF") {
            parse_number(rest).and_then(ScoreField::final_partial)
        } else if let Some(rest) = s.strip_prefix('P') {
            parse_number(rest).and_then(ScoreField::partial)
        } else {
            None
        };

        field.ok_or_else(|| UnknownScoreField(s.to_string()))
    }
}

impl TryFrom<String> for ScoreField {
    type Error = UnknownScoreField;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScoreField> for String {
    fn from(field: ScoreField) -> Self {
        field.label()
    }
}

/// Score column → parsed value. `None` marks a score the portal has not
/// published yet (empty cell or placeholder text).
pub type Scores = BTreeMap<ScoreField, Option<f64>>;

/// One row of the grade roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "clave")]
    pub code: Option<String>,
    #[serde(rename = "aula")]
    pub room: Option<String>,
    #[serde(rename = "grupo")]
    pub group: Option<String>,
    #[serde(rename = "profesor")]
    pub instructor: Option<String>,
    #[serde(rename = "calificaciones", default)]
    pub partials: Scores,
    #[serde(rename = "calificaciones_finales", default)]
    pub final_partials: Option<Scores>,
    #[serde(rename = "calificacion_final", default)]
    pub final_grade: Option<f64>,
}

impl SubjectRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: None,
            room: None,
            group: None,
            instructor: None,
            partials: Scores::new(),
            final_partials: None,
            final_grade: None,
        }
    }

    /// Value of a score column, `None` when the column is absent or missing
    pub fn score(&self, field: ScoreField) -> Option<f64> {
        match field {
            ScoreField::Partial(_) => self.partials.get(&field).copied().flatten(),
            ScoreField::FinalPartial(_) => self
                .final_partials
                .as_ref()
                .and_then(|scores| scores.get(&field).copied().flatten()),
            ScoreField::FinalGrade => self.final_grade,
        }
    }

    /// Every score column this record carries, partials first, final grade last
    pub fn score_fields(&self) -> Vec<(ScoreField, Option<f64>)> {
        let mut fields: Vec<(ScoreField, Option<f64>)> = self
            .partials
            .iter()
            .map(|(field, value)| (*field, *value))
            .collect();

        if let Some(final_partials) = &self.final_partials {
            fields.extend(final_partials.iter().map(|(field, value)| (*field, *value)));
        }

        fields.push((ScoreField::FinalGrade, self.final_grade));
        fields
    }
}

/// Everything recovered from one grades page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(rename = "alumno")]
    pub student_name: String,
    #[serde(rename = "matricula")]
    pub student_id: String,
    #[serde(rename = "periodo")]
    pub period: String,
    #[serde(rename = "fecha_consulta", deserialize_with = "crate::timestamp::deserialize")]
    pub queried_at: DateTime<Utc>,
    #[serde(rename = "materias")]
    pub subjects: Vec<SubjectRecord>,
}

impl ExtractionResult {
    pub fn subject(&self, name: &str) -> Option<&SubjectRecord> {
        self.subjects.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_field_labels() {
        assert_eq!(ScoreField::Partial(1).label(), "P1");
        assert_eq!(ScoreField::FinalPartial(3).label(), "PF3");
        assert_eq!(ScoreField::FinalGrade.label(), "calificacion_final");

        assert_eq!("P9".parse::<ScoreField>().unwrap(), ScoreField::Partial(9));
        assert_eq!("PF2".parse::<ScoreField>().unwrap(), ScoreField::FinalPartial(2));
        assert!("P0".parse::<ScoreField>().is_err());
        assert!("P10".parse::<ScoreField>().is_err());
        assert!("grade".parse::<ScoreField>().is_err());
    }

    #[test]
    fn test_partial_bounds() {
        assert!(ScoreField::partial(0).is_none());
        assert!(ScoreField::partial(10).is_none());
        assert_eq!(ScoreField::final_partial(9), Some(ScoreField::FinalPartial(9)));
    }

    #[test]
    fn test_subject_record_serialization() {
        let mut record = SubjectRecord::new("Calculus");
        record.group = Some("7A".to_string());
        record.partials.insert(ScoreField::Partial(1), Some(9.5));
        record.partials.insert(ScoreField::Partial(2), None);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["nombre"], "Calculus");
        assert_eq!(json["grupo"], "7A");
        assert_eq!(json["clave"], serde_json::Value::Null);
        assert_eq!(json["calificaciones"]["P1"], 9.5);
        assert_eq!(json["calificaciones"]["P2"], serde_json::Value::Null);
        assert_eq!(json["calificaciones_finales"], serde_json::Value::Null);
        assert_eq!(json["calificacion_final"], serde_json::Value::Null);

        let back: SubjectRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_score_lookup() {
        let mut record = SubjectRecord::new("Physics");
        record.partials.insert(ScoreField::Partial(1), Some(8.0));
        record.partials.insert(ScoreField::Partial(2), None);
        record.final_partials = Some(Scores::from([(ScoreField::FinalPartial(1), Some(8.5))]));
        record.final_grade = Some(9.0);

        assert_eq!(record.score(ScoreField::Partial(1)), Some(8.0));
        assert_eq!(record.score(ScoreField::Partial(2)), None);
        assert_eq!(record.score(ScoreField::Partial(3)), None);
        assert_eq!(record.score(ScoreField::FinalPartial(1)), Some(8.5));
        assert_eq!(record.score(ScoreField::FinalGrade), Some(9.0));

        let fields: Vec<ScoreField> = record.score_fields().into_iter().map(|(f, _)| f).collect();
        assert_eq!(
            fields,
            vec![
                ScoreField::Partial(1),
                ScoreField::Partial(2),
                ScoreField::FinalPartial(1),
                ScoreField::FinalGrade
            ]
        );
    }
}
