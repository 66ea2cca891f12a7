//! Keyword tables and pure lookups used to recognise grade-table headers.
//!
//! Every header variant the portal has shipped lives in one of the tables
//! below; supporting a new wording means adding a term, not a branch.

use once_cell::sync::Lazy;
use regex::Regex;
use shared_types::ScoreField;

pub const SUBJECT_TERMS: &[&str] = &["materia", "asignatura", "curso", "subject", "course"];
pub const CODE_TERMS: &[&str] = &["clave", "código", "codigo", "code"];
pub const ROOM_TERMS: &[&str] = &["aula", "salón", "salon", "classroom", "room"];
pub const GROUP_TERMS: &[&str] = &["grupo", "sección", "seccion", "group", "section"];
pub const INSTRUCTOR_TERMS: &[&str] = &[
    "profesor",
    "docente",
    "maestro",
    "instructor",
    "professor",
    "teacher",
];
pub const GRADE_TERMS: &[&str] = &["calificación", "calificacion", "grade", "nota"];
pub const PARTIAL_TERMS: &[&str] = &["parcial", "partial"];
pub const FINAL_TERMS: &[&str] = &["final"];

/// Phrases marking the closing value of a partial (PF columns)
pub const FINAL_OF_PARTIAL_PHRASES: &[&str] = &[
    "final del",
    "final de parcial",
    "final parcial",
    "final partial",
    "partial final",
];

pub const ORDINALS: &[(&str, u8)] = &[
    ("primer", 1),
    ("segundo", 2),
    ("tercer", 3),
    ("cuarto", 4),
    ("quinto", 5),
    ("sexto", 6),
    ("séptimo", 7),
    ("septimo", 7),
    ("octavo", 8),
    ("noveno", 9),
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
];

// A single digit only: `p10` is not partial 1
static PARTIAL_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"p([1-9])(?:\D|$)").unwrap());
static PARTIAL_WORD_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:parcial|partial)\s*([1-9])(?:\D|$)").unwrap());
static FINAL_PARTIAL_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"pf([1-9])(?:\D|$)").unwrap());
static PARTIAL_COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"pf?[1-9](?:\D|$)").unwrap());

/// Semantic meaning of a grade-table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnField {
    Subject,
    Code,
    Room,
    Group,
    Instructor,
    Score(ScoreField),
}

pub struct FieldSynonyms {
    pub field: ColumnField,
    pub terms: &'static [&'static str],
}

/// Descriptive columns in the order they are tried against a header
pub const DESCRIPTIVE_FIELDS: &[FieldSynonyms] = &[
    FieldSynonyms {
        field: ColumnField::Subject,
        terms: SUBJECT_TERMS,
    },
    FieldSynonyms {
        field: ColumnField::Code,
        terms: CODE_TERMS,
    },
    FieldSynonyms {
        field: ColumnField::Room,
        terms: ROOM_TERMS,
    },
    FieldSynonyms {
        field: ColumnField::Group,
        terms: GROUP_TERMS,
    },
    FieldSynonyms {
        field: ColumnField::Instructor,
        terms: INSTRUCTOR_TERMS,
    },
];

/// Weights used to rank the tables of a page
#[derive(Debug, Clone, PartialEq)]
pub struct TableScoring {
    /// Keyword groups; each term found in the headers adds `keyword_weight`
    pub keyword_groups: Vec<&'static [&'static str]>,
    pub keyword_weight: i32,
    pub subject_bonus: i32,
    pub grade_bonus: i32,
    pub partial_column_bonus: i32,
    /// Minimum score for a table to be taken as the grade roster
    pub acceptance_threshold: i32,
}

impl Default for TableScoring {
    fn default() -> Self {
        Self {
            keyword_groups: vec![
                SUBJECT_TERMS,
                GRADE_TERMS,
                PARTIAL_TERMS,
                GROUP_TERMS,
                INSTRUCTOR_TERMS,
            ],
            keyword_weight: 1,
            subject_bonus: 3,
            grade_bonus: 2,
            partial_column_bonus: 1,
            acceptance_threshold: 3,
        }
    }
}

impl TableScoring {
    pub fn with_threshold(acceptance_threshold: i32) -> Self {
        Self {
            acceptance_threshold,
            ..Self::default()
        }
    }

    /// Score a table from its lowercased header texts
    pub fn score(&self, headers: &[String]) -> i32 {
        let blob = headers.join(" ");

        let keyword_hits = self
            .keyword_groups
            .iter()
            .flat_map(|group| group.iter())
            .filter(|term| blob.contains(*term))
            .count() as i32;

        let mut score = keyword_hits * self.keyword_weight;
        if contains_any(&blob, SUBJECT_TERMS) {
            score += self.subject_bonus;
        }
        if contains_any(&blob, GRADE_TERMS) {
            score += self.grade_bonus;
        }
        if headers.iter().any(|h| is_partial_column(h)) {
            score += self.partial_column_bonus;
        }
        score
    }
}

pub fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| text.contains(term))
}

/// True when the header looks like `p<n>` or `pf<n>`
pub fn is_partial_column(header: &str) -> bool {
    PARTIAL_COLUMN.is_match(header)
}

pub fn ordinal_number(text: &str) -> Option<u8> {
    ORDINALS
        .iter()
        .find(|(word, _)| text.contains(word))
        .map(|(_, n)| *n)
}

/// Partial number from `p<n>`, `parcial <n>` or an ordinal word, in that order
pub fn partial_number(header: &str) -> Option<u8> {
    PARTIAL_DIGIT
        .captures(header)
        .or_else(|| PARTIAL_WORD_DIGIT.captures(header))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .or_else(|| ordinal_number(header))
}

/// Partial number of a final-of-partial column, if the header is one
pub fn final_partial_number(header: &str) -> Option<u8> {
    if let Some(caps) = FINAL_PARTIAL_DIGIT.captures(header) {
        return caps.get(1).and_then(|m| m.as_str().parse().ok());
    }
    if contains_any(header, FINAL_OF_PARTIAL_PHRASES) {
        return partial_number(header);
    }
    None
}

/// Score column a header names, if any. Expects a lowercased header.
pub fn score_field(header: &str) -> Option<ScoreField> {
    if let Some(field) = final_partial_number(header).and_then(ScoreField::final_partial) {
        return Some(field);
    }
    if let Some(field) = partial_number(header).and_then(ScoreField::partial) {
        return Some(field);
    }
    if contains_any(header, FINAL_TERMS) && contains_any(header, GRADE_TERMS) {
        return Some(ScoreField::FinalGrade);
    }
    None
}

/// Field a single header maps to. The first matching rule wins.
pub fn match_header(header: &str) -> Option<ColumnField> {
    let header = header.to_lowercase();

    DESCRIPTIVE_FIELDS
        .iter()
        .find(|synonyms| contains_any(&header, synonyms.terms))
        .map(|synonyms| synonyms.field)
        .or_else(|| score_field(&header).map(ColumnField::Score))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptive_headers() {
        assert_eq!(match_header("Materia"), Some(ColumnField::Subject));
        assert_eq!(match_header("ASIGNATURA"), Some(ColumnField::Subject));
        assert_eq!(match_header("Clave"), Some(ColumnField::Code));
        assert_eq!(match_header("Salón"), Some(ColumnField::Room));
        assert_eq!(match_header("Sección"), Some(ColumnField::Group));
        assert_eq!(match_header("Docente"), Some(ColumnField::Instructor));
        assert_eq!(match_header("Teacher"), Some(ColumnField::Instructor));
    }

    #[test]
    fn test_partial_headers() {
        assert_eq!(match_header("P1"), Some(ColumnField::Score(ScoreField::Partial(1))));
        assert_eq!(
            match_header("Primer Parcial"),
            Some(ColumnField::Score(ScoreField::Partial(1)))
        );
        assert_eq!(
            match_header("Segundo Parcial"),
            Some(ColumnField::Score(ScoreField::Partial(2)))
        );
        assert_eq!(
            match_header("Parcial 3"),
            Some(ColumnField::Score(ScoreField::Partial(3)))
        );
        assert_eq!(
            match_header("Third partial"),
            Some(ColumnField::Score(ScoreField::Partial(3)))
        );
    }

    #[test]
    fn test_final_partial_headers() {
        assert_eq!(
            match_header("PF2"),
            Some(ColumnField::Score(ScoreField::FinalPartial(2)))
        );
        assert_eq!(
            match_header("Calificación final del primer parcial"),
            Some(ColumnField::Score(ScoreField::FinalPartial(1)))
        );
    }

    #[test]
    fn test_final_grade_header() {
        assert_eq!(
            match_header("Calificación Final"),
            Some(ColumnField::Score(ScoreField::FinalGrade))
        );
        assert_eq!(
            match_header("Final grade"),
            Some(ColumnField::Score(ScoreField::FinalGrade))
        );
        assert_eq!(match_header("Final"), None);
    }

    #[test]
    fn test_unmatched_headers() {
        assert_eq!(match_header("Faltas"), None);
        assert_eq!(match_header(""), None);
        assert_eq!(match_header("P0"), None);
    }

    #[test]
    fn test_multi_digit_partials_not_truncated() {
        assert_eq!(match_header("P10"), None);
        assert_eq!(match_header("PF12"), None);
        assert_eq!(match_header("Parcial 12"), None);
        assert!(!is_partial_column("p10"));
        assert!(is_partial_column("p9"));
        assert_eq!(match_header("P9 "), Some(ColumnField::Score(ScoreField::Partial(9))));

        let map = crate::grades_table::ColumnMap::from_headers(&["Materia", "P1", "P10"]);
        assert_eq!(map.get(ColumnField::Score(ScoreField::Partial(1))), Some(1));
    }

    #[test]
    fn test_ordinal_number() {
        assert_eq!(ordinal_number("tercer parcial"), Some(3));
        assert_eq!(ordinal_number("séptimo"), Some(7));
        assert_eq!(ordinal_number("ninth"), Some(9));
        assert_eq!(ordinal_number("materia"), None);
    }

    #[test]
    fn test_table_scoring() {
        let scoring = TableScoring::default();

        let grades = vec!["materia".to_string(), "p1".to_string(), "p2".to_string()];
        // materia keyword (1) + subject bonus (3) + partial column (1)
        assert_eq!(scoring.score(&grades), 5);

        let full = vec![
            "materia".to_string(),
            "grupo".to_string(),
            "profesor".to_string(),
            "calificación final".to_string(),
        ];
        // four keywords + subject bonus + grade bonus
        assert_eq!(scoring.score(&full), 9);

        let menu = vec!["inicio".to_string(), "salir".to_string()];
        assert_eq!(scoring.score(&menu), 0);
        assert_eq!(scoring.score(&[]), 0);
    }
}
