use crate::grades::ExtractionResult;

/// Core trait that all grade page extractors implement
pub trait Extractor {
    /// Extract a grade roster from one already-fetched HTML page
    fn extract(&self, html: &str) -> Result<ExtractionResult, ExtractionError>;

    /// Get extractor version for tracking
    fn version(&self) -> String {
        "1.0.0".to_string()
    }
}

/// Extraction error types
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("No grade table found in the page")]
    NoTableFound,

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}
