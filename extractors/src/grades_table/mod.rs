pub mod column_mapper;
pub mod field_matcher;
pub mod row_extractor;
pub mod table_locator;

pub use column_mapper::{header_row, row_header_texts, ColumnMap};
pub use field_matcher::{ColumnField, TableScoring};
pub use table_locator::LocatedBy;

use crate::student_metadata::{StudentMetadata, StudentMetadataExtractor};
use chrono::Utc;
use scraper::Html;
use shared_types::{ExtractionError, ExtractionResult, Extractor, SubjectRecord};

/// Grade roster extractor for the student portal.
///
/// Finds the roster table by header heuristics, maps its columns by synonym
/// and reads one record per subject row. Student name, id and period come from
/// the free text of the page.
pub struct GradesTableExtractor {
    scoring: TableScoring,
    metadata: StudentMetadataExtractor,
}

impl GradesTableExtractor {
    pub fn new(scoring: TableScoring, metadata: StudentMetadataExtractor) -> Self {
        Self { scoring, metadata }
    }

    /// Create an extractor with the built-in keyword tables and patterns
    pub fn with_defaults() -> Self {
        Self::new(TableScoring::default(), StudentMetadataExtractor::new())
    }

    /// Subject records of the roster table in an already parsed document
    pub fn extract_subjects(&self, document: &Html) -> Result<Vec<SubjectRecord>, ExtractionError> {
        let (candidate, located_by) =
            table_locator::locate(document, &self.scoring).ok_or(ExtractionError::NoTableFound)?;

        tracing::debug!(
            "Using table with score {} and {} rows ({:?})",
            candidate.score,
            candidate.rows,
            located_by
        );

        let header = header_row(&candidate.table);
        let headers = header
            .as_ref()
            .map(row_header_texts)
            .unwrap_or_default();
        let columns = ColumnMap::from_headers(&headers);
        tracing::debug!("Headers {:?} mapped to {:?}", headers, columns);

        if columns.is_empty() {
            tracing::warn!("No header of the grade table was recognised");
        } else if columns.get(ColumnField::Subject).is_none() {
            tracing::warn!("Grade table has no recognisable subject column");
        }

        Ok(row_extractor::extract_rows(
            &candidate.table,
            &columns,
            header.as_ref(),
        ))
    }
}

impl Default for GradesTableExtractor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Extractor for GradesTableExtractor {
    fn extract(&self, html: &str) -> Result<ExtractionResult, ExtractionError> {
        tracing::info!("Parsing grades page ({} bytes)", html.len());

        let document = Html::parse_document(html);
        let subjects = self.extract_subjects(&document)?;
        let StudentMetadata {
            name,
            student_id,
            period,
        } = self.metadata.extract(html, &document);

        tracing::info!("Parsed {} subjects", subjects.len());

        Ok(ExtractionResult {
            student_name: name.unwrap_or_else(not_available),
            student_id: student_id.unwrap_or_else(not_available),
            period: period.unwrap_or_else(not_available),
            queried_at: Utc::now(),
            subjects,
        })
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}

fn not_available() -> String {
    shared_types::NOT_AVAILABLE.to_string()
}
