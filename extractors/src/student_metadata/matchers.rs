use crate::dom::{collapse_whitespace, element_text, row_cells, selector, TR};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use shared_types::ExtractionError;

static GREETING_CONTAINERS: Lazy<Selector> = Lazy::new(|| selector("div, span, h1, h2, h3, h4, p"));
static USERNAME_BOX: Lazy<Selector> = Lazy::new(|| selector("div.username"));
static USERNAME_HIGHLIGHT: Lazy<Selector> = Lazy::new(|| selector("span, strong"));
static GREETING_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[Bb]ienvenid[oa]\s*([A-ZÁÉÍÓÚÑ\s]+)").unwrap());
static LEADING_GREETING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)bienvenid[oa][\s,:]*").unwrap());
static LONG_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{6,}").unwrap());

/// What a matcher can look at: the raw markup and its parsed tree
pub struct MetadataSource<'a> {
    pub raw: &'a str,
    pub document: &'a Html,
}

/// One strategy for recovering a metadata field
pub trait FieldMatcher: Send + Sync {
    fn name(&self) -> &str;

    fn find(&self, source: &MetadataSource<'_>) -> Option<String>;
}

/// Value check applied to a candidate before a matcher reports it
pub type Acceptor = fn(&str) -> bool;

/// A person's name needs at least a given name and a surname
pub fn has_two_tokens(value: &str) -> bool {
    value.split_whitespace().count() >= 2
}

pub fn non_empty(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Declarative description of a regex matcher
#[derive(Debug, Clone, Copy)]
pub struct MetadataPattern {
    pub name: &'static str,
    pub pattern: &'static str,
    pub group: usize,
    pub accept: Acceptor,
}

/// Regex over the raw markup; the first accepted capture wins
pub struct PatternMatcher {
    name: String,
    regex: Regex,
    group: usize,
    accept: Acceptor,
}

impl PatternMatcher {
    pub fn compile(pattern: &MetadataPattern) -> Result<Self, ExtractionError> {
        let regex = Regex::new(pattern.pattern).map_err(|e| {
            ExtractionError::InvalidPattern(format!("{}: {}", pattern.name, e))
        })?;

        if pattern.group >= regex.captures_len() {
            return Err(ExtractionError::InvalidPattern(format!(
                "{}: group {} does not exist (regex has {} groups)",
                pattern.name,
                pattern.group,
                regex.captures_len()
            )));
        }

        Ok(Self {
            name: pattern.name.to_string(),
            regex,
            group: pattern.group,
            accept: pattern.accept,
        })
    }
}

impl FieldMatcher for PatternMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    /// First accepted capture among all matches of the pattern
    fn find(&self, source: &MetadataSource<'_>) -> Option<String> {
        self.regex
            .captures_iter(source.raw)
            .filter_map(|caps| caps.get(self.group))
            .map(|m| collapse_whitespace(m.as_str()))
            .find(|value| (self.accept)(value))
    }
}

/// Greeting text ("Bienvenido NOMBRE") in the page's layout containers,
/// then the `div.username` box with its greeting stripped
pub struct GreetingMatcher;

impl GreetingMatcher {
    fn from_containers(document: &Html) -> Option<String> {
        document
            .select(&GREETING_CONTAINERS)
            .map(|element| element_text(&element))
            .filter(|text| text.to_lowercase().contains("bienvenid"))
            .filter_map(|text| {
                GREETING_NAME
                    .captures(&text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| collapse_whitespace(m.as_str()))
            })
            .find(|name| has_two_tokens(name))
    }

    fn from_username_box(document: &Html) -> Option<String> {
        let username = document.select(&USERNAME_BOX).next()?;
        let candidate = username
            .select(&USERNAME_HIGHLIGHT)
            .next()
            .map(|highlight| element_text(&highlight))
            .unwrap_or_else(|| element_text(&username));

        let candidate = LEADING_GREETING.replace(&candidate, "").trim().to_string();
        has_two_tokens(&candidate).then_some(candidate)
    }
}

impl FieldMatcher for GreetingMatcher {
    fn name(&self) -> &str {
        "greeting_container"
    }

    fn find(&self, source: &MetadataSource<'_>) -> Option<String> {
        Self::from_containers(source.document).or_else(|| Self::from_username_box(source.document))
    }
}

/// How the value cell of a profile row is turned into a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileValue {
    /// Whole cell, must hold at least two words
    PersonName,
    /// First run of 6+ digits, else the whole cell
    Identifier,
    /// Whole cell
    Text,
}

/// Two-column "label | value" rows of a profile table
pub struct ProfileRowMatcher {
    name: String,
    key_terms: &'static [&'static str],
    value: ProfileValue,
}

impl ProfileRowMatcher {
    pub fn new(name: &str, key_terms: &'static [&'static str], value: ProfileValue) -> Self {
        Self {
            name: name.to_string(),
            key_terms,
            value,
        }
    }

    fn read_value(&self, cell: &str) -> Option<String> {
        let cell = collapse_whitespace(cell);
        match self.value {
            ProfileValue::PersonName => has_two_tokens(&cell).then_some(cell),
            ProfileValue::Identifier => LONG_DIGITS
                .find(&cell)
                .map(|m| m.as_str().to_string())
                .or_else(|| non_empty(&cell).then_some(cell)),
            ProfileValue::Text => non_empty(&cell).then_some(cell),
        }
    }
}

impl FieldMatcher for ProfileRowMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&self, source: &MetadataSource<'_>) -> Option<String> {
        source.document.select(&TR).find_map(|row| {
            let cells = row_cells(&row, &["th", "td"]);
            if cells.len() < 2 {
                return None;
            }

            let key = element_text(&cells[0]).to_lowercase();
            if !self.key_terms.iter().any(|term| key.contains(term)) {
                return None;
            }

            self.read_value(&element_text(&cells[1]))
        })
    }
}
