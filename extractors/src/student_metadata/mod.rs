//! Student name, identifier and period recovered from the free text of a page.
//!
//! Each field has an ordered chain of matchers. The first matcher that yields
//! an accepted value wins and the rest of the chain is skipped.

mod matchers;

pub use matchers::{
    has_two_tokens, non_empty, Acceptor, FieldMatcher, GreetingMatcher, MetadataPattern,
    MetadataSource, PatternMatcher, ProfileRowMatcher, ProfileValue,
};

use scraper::Html;
use shared_types::ExtractionError;

/// Ordered list of strategies for one field
pub struct MatcherChain {
    field: &'static str,
    matchers: Vec<Box<dyn FieldMatcher>>,
}

impl MatcherChain {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            matchers: Vec::new(),
        }
    }

    pub fn then(mut self, matcher: impl FieldMatcher + 'static) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    /// Append one regex matcher per pattern, in order
    pub fn then_patterns(mut self, patterns: &[MetadataPattern]) -> Result<Self, ExtractionError> {
        for pattern in patterns {
            self.matchers.push(Box::new(PatternMatcher::compile(pattern)?));
        }
        Ok(self)
    }

    pub fn first_match(&self, source: &MetadataSource<'_>) -> Option<String> {
        for matcher in &self.matchers {
            if let Some(value) = matcher.find(source) {
                tracing::debug!("{} found by {}", self.field, matcher.name());
                return Some(value);
            }
        }
        tracing::debug!("{} not found by any of {} matchers", self.field, self.matchers.len());
        None
    }
}

/// Metadata found on a page; `None` for fields no matcher recovered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentMetadata {
    pub name: Option<String>,
    pub student_id: Option<String>,
    pub period: Option<String>,
}

pub struct StudentMetadataExtractor {
    name: MatcherChain,
    student_id: MatcherChain,
    period: MatcherChain,
}

impl StudentMetadataExtractor {
    /// Extractor with the built-in pattern chains
    pub fn new() -> Self {
        Self::from_patterns(
            &create_student_id_patterns(),
            &create_name_patterns(),
            &create_period_patterns(),
        )
        .unwrap_or_else(|e| panic!("built-in metadata patterns must compile: {e}"))
    }

    /// Build the chains from custom regex patterns. The structural fallbacks
    /// (greeting containers, profile rows, unlabelled identifier) are always
    /// appended after the given patterns.
    pub fn from_patterns(
        student_id_patterns: &[MetadataPattern],
        name_patterns: &[MetadataPattern],
        period_patterns: &[MetadataPattern],
    ) -> Result<Self, ExtractionError> {
        let student_id = MatcherChain::new("student_id")
            .then_patterns(student_id_patterns)?
            .then(ProfileRowMatcher::new(
                "profile_row_student_id",
                &["matrícula", "matricula"],
                ProfileValue::Identifier,
            ))
            .then_patterns(&[UNLABELLED_STUDENT_ID])?;

        let name = MatcherChain::new("name")
            .then_patterns(name_patterns)?
            .then(GreetingMatcher)
            .then(ProfileRowMatcher::new(
                "profile_row_name",
                &["nombre"],
                ProfileValue::PersonName,
            ));

        let period = MatcherChain::new("period")
            .then_patterns(period_patterns)?
            .then(ProfileRowMatcher::new(
                "profile_row_period",
                &["periodo"],
                ProfileValue::Text,
            ));

        Ok(Self {
            name,
            student_id,
            period,
        })
    }

    pub fn extract(&self, raw: &str, document: &Html) -> StudentMetadata {
        let source = MetadataSource { raw, document };

        StudentMetadata {
            name: self.name.first_match(&source),
            student_id: self.student_id.first_match(&source),
            period: self.period.first_match(&source),
        }
    }

    /// Parse and extract in one go
    pub fn extract_from_html(&self, html: &str) -> StudentMetadata {
        let document = Html::parse_document(html);
        self.extract(html, &document)
    }
}

impl Default for StudentMetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Any standalone 8–9 digit run; only tried after every labelled variant
pub const UNLABELLED_STUDENT_ID: MetadataPattern = MetadataPattern {
    name: "unlabelled_8_9_digits",
    pattern: r"\b(\d{8,9})\b",
    group: 1,
    accept: non_empty,
};

pub fn create_student_id_patterns() -> Vec<MetadataPattern> {
    vec![
        MetadataPattern {
            name: "matricula_label",
            pattern: r"(?i)matr[íi]cula:\s*(\d{8,9})\b",
            group: 1,
            accept: non_empty,
        },
        MetadataPattern {
            name: "cuenta_label",
            pattern: r"(?i)cuenta:\s*(\d{8,9})\b",
            group: 1,
            accept: non_empty,
        },
        MetadataPattern {
            name: "no_control_label",
            pattern: r"(?i)no\.\s*control:\s*(\d{8,9})\b",
            group: 1,
            accept: non_empty,
        },
    ]
}

pub fn create_name_patterns() -> Vec<MetadataPattern> {
    vec![
        MetadataPattern {
            name: "bienvenido_greeting",
            pattern: r"(?i)bienvenid[oa]\s*([A-ZÁÉÍÓÚÑ\s]+)",
            group: 1,
            accept: has_two_tokens,
        },
        MetadataPattern {
            name: "alumno_label",
            pattern: r"(?i)alumno:\s*([A-ZÁÉÍÓÚÑ\s]+)",
            group: 1,
            accept: has_two_tokens,
        },
        MetadataPattern {
            name: "nombre_label",
            pattern: r"(?i)nombre:\s*([A-ZÁÉÍÓÚÑ\s]+)",
            group: 1,
            accept: has_two_tokens,
        },
        MetadataPattern {
            name: "estudiante_label",
            pattern: r"(?i)estudiante:\s*([A-ZÁÉÍÓÚÑ\s]+)",
            group: 1,
            accept: has_two_tokens,
        },
    ]
}

pub fn create_period_patterns() -> Vec<MetadataPattern> {
    vec![
        MetadataPattern {
            name: "periodo_label",
            pattern: r"Periodo:\s*([A-Z][A-Z\s\-\d]*)",
            group: 1,
            accept: non_empty,
        },
        MetadataPattern {
            name: "periodo_label_upper",
            pattern: r"PERIODO:\s*([A-Z][A-Z\s\-\d]*)",
            group: 1,
            accept: non_empty,
        },
        MetadataPattern {
            name: "cuatrimestre_range",
            pattern: r"((?:ENERO-ABRIL|MAYO-AGOSTO|SEPTIEMBRE-DICIEMBRE)\s*\d{4})",
            group: 1,
            accept: non_empty,
        },
    ]
}
