use super::column_mapper::ColumnMap;
use super::field_matcher::ColumnField;
use crate::dom::{element_text, row_cells, TR};
use scraper::ElementRef;
use shared_types::{ScoreField, Scores, SubjectRecord};

/// Shorter subject cells are layout noise, not subjects
pub const MIN_SUBJECT_CHARS: usize = 3;

/// Rows with fewer data cells are separators
pub const MIN_DATA_CELLS: usize = 2;

/// Parse a score cell. Empty cells, placeholder labels such as `P3` and
/// non-finite values are all "not published yet".
pub fn parse_score(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// One record per data row with a usable subject, in document order.
/// `header` is the row the columns were mapped from; it is never a record.
pub fn extract_rows(
    table: &ElementRef<'_>,
    columns: &ColumnMap,
    header: Option<&ElementRef<'_>>,
) -> Vec<SubjectRecord> {
    let header_id = header.map(|row| row.id());
    let mut subjects = Vec::new();

    for row in table.select(&TR) {
        if Some(row.id()) == header_id {
            continue;
        }

        let cells: Vec<String> = row_cells(&row, &["td"]).iter().map(element_text).collect();

        if cells.len() < MIN_DATA_CELLS {
            continue;
        }

        match extract_row(&cells, columns) {
            Some(record) => subjects.push(record),
            None => tracing::trace!("Dropping row without a subject: {:?}", cells),
        }
    }

    subjects
}

/// Build a record from the text of one row's cells
pub fn extract_row(cells: &[String], columns: &ColumnMap) -> Option<SubjectRecord> {
    let cell = |field: ColumnField| -> Option<String> {
        columns
            .get(field)
            .and_then(|index| cells.get(index))
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    };

    let name = cell(ColumnField::Subject)?;
    if name.chars().count() < MIN_SUBJECT_CHARS {
        return None;
    }

    let mut record = SubjectRecord::new(name);
    record.code = cell(ColumnField::Code);
    record.room = cell(ColumnField::Room);
    record.group = cell(ColumnField::Group);
    record.instructor = cell(ColumnField::Instructor);

    let mut final_partials = Scores::new();
    for (field, _) in columns.score_columns() {
        let value = cell(ColumnField::Score(field)).and_then(|text| parse_score(&text));
        match field {
            ScoreField::Partial(_) => {
                record.partials.insert(field, value);
            }
            ScoreField::FinalPartial(_) => {
                final_partials.insert(field, value);
            }
            ScoreField::FinalGrade => record.final_grade = value,
        }
    }

    if !final_partials.is_empty() {
        record.final_partials = Some(final_partials);
    }

    Some(record)
}
