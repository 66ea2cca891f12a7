use super::field_matcher::{match_header, ColumnField};
use crate::dom::{element_text, row_cells, THEAD, TR};
use scraper::ElementRef;
use shared_types::ScoreField;
use std::collections::BTreeMap;

/// Semantic field → zero-based column index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: BTreeMap<ColumnField, usize>,
}

impl ColumnMap {
    /// Map header texts to fields. When two headers name the same field the
    /// later column wins.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut columns = BTreeMap::new();

        for (index, header) in headers.iter().enumerate() {
            if let Some(field) = match_header(header.as_ref()) {
                columns.insert(field, index);
            }
        }

        Self { columns }
    }

    pub fn get(&self, field: ColumnField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Mapped score columns in label order (P1..P9, PF1..PF9, final grade)
    pub fn score_columns(&self) -> impl Iterator<Item = (ScoreField, usize)> + '_ {
        self.columns.iter().filter_map(|(field, index)| match field {
            ColumnField::Score(score) => Some((*score, *index)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Header row of a table.
///
/// Walks the `<thead>` rows from the deepest one up and takes the first that
/// does not merge cells, which skips the grouping row some revisions put above
/// the real headers. Without such a row, the first row of the table is used.
pub fn header_row<'a>(table: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    table
        .select(&THEAD)
        .next()
        .and_then(|thead| {
            let rows: Vec<ElementRef<'a>> = thead.select(&TR).collect();
            rows.into_iter().rev().find(|row| {
                !row_cells(row, &["th"])
                    .iter()
                    .any(|th| th.value().attr("colspan").is_some())
            })
        })
        .or_else(|| table.select(&TR).next())
}

/// Cell texts of a header row: its `<th>` cells, or all cells when it has none
pub fn row_header_texts(row: &ElementRef<'_>) -> Vec<String> {
    let mut cells = row_cells(row, &["th"]);
    if cells.is_empty() {
        cells = row_cells(row, &["th", "td"]);
    }

    cells.iter().map(element_text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::TABLE;
    use scraper::Html;

    fn headers_of(html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let table = document.select(&TABLE).next().unwrap();
        header_row(&table)
            .map(|row| row_header_texts(&row))
            .unwrap_or_default()
    }

    #[test]
    fn test_literal_headers() {
        let map = ColumnMap::from_headers(&["Materia", "P1", "P2"]);
        assert_eq!(map.get(ColumnField::Subject), Some(0));
        assert_eq!(map.get(ColumnField::Score(ScoreField::Partial(1))), Some(1));
        assert_eq!(map.get(ColumnField::Score(ScoreField::Partial(2))), Some(2));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_synonym_headers_match_literal_headers() {
        let literal = ColumnMap::from_headers(&["Materia", "P1", "P2"]);
        let synonyms = ColumnMap::from_headers(&["ASIGNATURA", "Primer Parcial", "Segundo Parcial"]);
        assert_eq!(literal, synonyms);
    }

    #[test]
    fn test_unmapped_headers_are_ignored() {
        let map = ColumnMap::from_headers(&["#", "Materia", "Faltas", "Calificación Final"]);
        assert_eq!(map.get(ColumnField::Subject), Some(1));
        assert_eq!(map.get(ColumnField::Score(ScoreField::FinalGrade)), Some(3));
        assert_eq!(map.len(), 2);

        let scores: Vec<_> = map.score_columns().collect();
        assert_eq!(scores, vec![(ScoreField::FinalGrade, 3)]);
    }

    #[test]
    fn test_skips_grouping_header_row() {
        let html = r#"
            <table>
              <thead>
                <tr><th colspan="2">Datos</th><th colspan="2">Parciales</th></tr>
                <tr><th>Clave</th><th>Materia</th><th>P1</th><th>P2</th></tr>
              </thead>
              <tbody><tr><td>MAT1</td><td>Calculus</td><td>9</td><td>8</td></tr></tbody>
            </table>"#;

        assert_eq!(headers_of(html), vec!["Clave", "Materia", "P1", "P2"]);
    }

    #[test]
    fn test_all_header_rows_merged_falls_back_to_first_row() {
        let html = r#"
            <table>
              <thead><tr><th colspan="3">Calificaciones</th></tr></thead>
              <tbody><tr><td>Materia</td><td>P1</td></tr></tbody>
            </table>"#;

        assert_eq!(headers_of(html), vec!["Calificaciones"]);
    }

    #[test]
    fn test_first_row_cells_without_th() {
        let html = r#"<table><tr><td>Materia</td><td>P1</td></tr><tr><td>Algebra</td><td>7</td></tr></table>"#;
        assert_eq!(headers_of(html), vec!["Materia", "P1"]);
    }
}
