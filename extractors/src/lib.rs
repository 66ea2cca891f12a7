//! Extractors Crate
//!
//! Turns an already-fetched grades page into an [`ExtractionResult`]. Nothing
//! here depends on ids or CSS classes of the portal: the roster table is found
//! by scoring header keywords, columns are mapped by synonym tables and the
//! student's metadata is recovered by ordered pattern chains.
//!
//! # Available Extractors
//!
//! - `GradesTableExtractor`: roster table plus student metadata
//! - `StudentMetadataExtractor`: name, identifier and period only
//!
//! # Example
//!
//! ```rust,ignore
//! use extractors::{Extractor, GradesTableExtractor};
//!
//! let extractor = GradesTableExtractor::with_defaults();
//! let result = extractor.extract(&html)?;
//! ```

mod dom;
pub mod grades_table;
pub mod student_metadata;

// Re-export commonly used types
pub use grades_table::{ColumnField, ColumnMap, GradesTableExtractor, TableScoring};
pub use student_metadata::{StudentMetadata, StudentMetadataExtractor};

// Re-export the Extractor trait from shared-types for convenience
pub use shared_types::{ExtractionError, ExtractionResult, Extractor};

/// Extract a grades page with the built-in tables and patterns
pub fn extract(html: &str) -> Result<ExtractionResult, ExtractionError> {
    GradesTableExtractor::with_defaults().extract(html)
}
