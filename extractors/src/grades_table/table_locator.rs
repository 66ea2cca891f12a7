use super::field_matcher::TableScoring;
use crate::dom::{element_text, TABLE, TH, TR};
use scraper::{ElementRef, Html};

/// A table of the page together with how it ranked
#[derive(Debug, Clone)]
pub struct TableCandidate<'a> {
    pub table: ElementRef<'a>,
    pub score: i32,
    pub rows: usize,
}

impl<'a> TableCandidate<'a> {
    fn new(table: ElementRef<'a>, scoring: &TableScoring) -> Self {
        let headers: Vec<String> = table
            .select(&TH)
            .map(|th| element_text(&th).to_lowercase())
            .collect();

        Self {
            table,
            score: scoring.score(&headers),
            rows: table.select(&TR).count(),
        }
    }
}

/// How the roster table was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatedBy {
    HeaderScore,
    LargestTable,
}

/// Every table of the document, scored, in document order
pub fn candidates<'a>(document: &'a Html, scoring: &TableScoring) -> Vec<TableCandidate<'a>> {
    document
        .select(&TABLE)
        .map(|table| TableCandidate::new(table, scoring))
        .collect()
}

/// Pick the table most likely to be the grade roster.
///
/// The best header score wins if it reaches the acceptance threshold; ties go
/// to the earlier table. Otherwise the table with the most rows is used,
/// provided it has more than one.
pub fn locate<'a>(
    document: &'a Html,
    scoring: &TableScoring,
) -> Option<(TableCandidate<'a>, LocatedBy)> {
    let tables = candidates(document, scoring);

    for (index, candidate) in tables.iter().enumerate() {
        tracing::debug!(
            "Table {} scored {} with {} rows",
            index,
            candidate.score,
            candidate.rows
        );
    }

    let mut best: Option<&TableCandidate<'a>> = None;
    for candidate in &tables {
        if best.map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }

    if let Some(best) = best {
        if best.score >= scoring.acceptance_threshold {
            return Some((best.clone(), LocatedBy::HeaderScore));
        }
    }

    let mut largest: Option<&TableCandidate<'a>> = None;
    for candidate in &tables {
        if largest.map_or(true, |l| candidate.rows > l.rows) {
            largest = Some(candidate);
        }
    }

    largest
        .filter(|candidate| candidate.rows > 1)
        .map(|candidate| (candidate.clone(), LocatedBy::LargestTable))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate_index(html: &str) -> Option<(usize, LocatedBy)> {
        let document = Html::parse_document(html);
        let scoring = TableScoring::default();
        let all = candidates(&document, &scoring);
        locate(&document, &scoring).map(|(found, by)| {
            let index = all.iter().position(|c| c.table.id() == found.table.id()).unwrap();
            (index, by)
        })
    }

    #[test]
    fn test_picks_grade_table_over_layout_table() {
        let html = r#"
            <table><tr><th>Inicio</th><th>Salir</th></tr><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>
            <table>
              <tr><th>Materia</th><th>P1</th><th>P2</th></tr>
              <tr><td>Calculus</td><td>9.5</td><td>8.0</td></tr>
            </table>"#;

        assert_eq!(locate_index(html), Some((1, LocatedBy::HeaderScore)));
    }

    #[test]
    fn test_first_table_wins_ties() {
        let table = r#"<table><tr><th>Materia</th><th>P1</th></tr><tr><td>Algebra</td><td>9</td></tr></table>"#;
        let html = format!("{table}{table}");

        assert_eq!(locate_index(&html), Some((0, LocatedBy::HeaderScore)));
    }

    #[test]
    fn test_falls_back_to_largest_table() {
        let html = r#"
            <table><tr><td>x</td></tr></table>
            <table><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr><tr><td>e</td><td>f</td></tr></table>"#;

        assert_eq!(locate_index(html), Some((1, LocatedBy::LargestTable)));
    }

    #[test]
    fn test_no_table_qualifies() {
        assert_eq!(locate_index("<p>No hay datos</p>"), None);
        assert_eq!(
            locate_index("<table><tr><th>Grupo</th></tr></table>"),
            None
        );
    }

    #[test]
    fn test_threshold_is_configurable() {
        let html = r#"<table><tr><th>Grupo</th><th>Profesor</th></tr></table>"#;
        let document = Html::parse_document(html);

        assert!(locate(&document, &TableScoring::default()).is_none());
        let lenient = TableScoring::with_threshold(2);
        assert!(locate(&document, &lenient).is_some());
    }
}
