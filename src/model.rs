//! Core data model for reference reconciliation
//!
//! A closed, tagged schema for everything the review core handles: submitted
//! citations, candidate matches from the search collaborator, and the
//! processed list that feeds the output renderer. Field sets are a fixed
//! set of named optional fields rather than free-form maps so that diff
//! computation and rendering cannot silently mis-handle an unexpected shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Style name for the locally computed, unstyled rendering
pub const ORIGINAL_STYLE: &str = "original";

/// Stable identifier for one submitted citation, assigned at split time
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The closed set of bibliographic fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Title,
    Authors,
    Journal,
    Year,
    Volume,
    Issue,
    Pages,
    Pmid,
    Doi,
}

impl FieldName {
    /// All fields, in display order
    pub const ALL: [FieldName; 9] = [
        FieldName::Title,
        FieldName::Authors,
        FieldName::Journal,
        FieldName::Year,
        FieldName::Volume,
        FieldName::Issue,
        FieldName::Pages,
        FieldName::Pmid,
        FieldName::Doi,
    ];

    /// Human-readable label for console output
    pub fn label(&self) -> &'static str {
        match self {
            FieldName::Title => "Title",
            FieldName::Authors => "Authors",
            FieldName::Journal => "Journal",
            FieldName::Year => "Year",
            FieldName::Volume => "Volume",
            FieldName::Issue => "Issue",
            FieldName::Pages => "Pages",
            FieldName::Pmid => "PMID",
            FieldName::Doi => "DOI",
        }
    }
}

/// A field's value: scalar text, a publication year, or an ordered author list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Year(u16),
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Year(y) => write!(f, "{}", y),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// Structured keyword set extracted from (or known for) a citation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
}

impl ReferenceFields {
    /// Read one field by name
    pub fn get(&self, name: FieldName) -> Option<FieldValue> {
        match name {
            FieldName::Title => self.title.clone().map(FieldValue::Text),
            FieldName::Authors => self.authors.clone().map(FieldValue::List),
            FieldName::Journal => self.journal.clone().map(FieldValue::Text),
            FieldName::Year => self.year.map(FieldValue::Year),
            FieldName::Volume => self.volume.clone().map(FieldValue::Text),
            FieldName::Issue => self.issue.clone().map(FieldValue::Text),
            FieldName::Pages => self.pages.clone().map(FieldValue::Text),
            FieldName::Pmid => self.pmid.clone().map(FieldValue::Text),
            FieldName::Doi => self.doi.clone().map(FieldValue::Text),
        }
    }

    /// Write one field by name
    ///
    /// A year given as text is parsed; a value whose shape does not fit the
    /// field is dropped rather than coerced into the wrong slot.
    pub fn set(&mut self, name: FieldName, value: FieldValue) {
        match (name, value) {
            (FieldName::Title, FieldValue::Text(s)) => self.title = Some(s),
            (FieldName::Authors, FieldValue::List(v)) => self.authors = Some(v),
            (FieldName::Journal, FieldValue::Text(s)) => self.journal = Some(s),
            (FieldName::Year, FieldValue::Year(y)) => self.year = Some(y),
            (FieldName::Year, FieldValue::Text(s)) => self.year = s.trim().parse().ok(),
            (FieldName::Volume, FieldValue::Text(s)) => self.volume = Some(s),
            (FieldName::Issue, FieldValue::Text(s)) => self.issue = Some(s),
            (FieldName::Pages, FieldValue::Text(s)) => self.pages = Some(s),
            (FieldName::Pmid, FieldValue::Text(s)) => self.pmid = Some(s),
            (FieldName::Doi, FieldValue::Text(s)) => self.doi = Some(s),
            (name, value) => {
                tracing::debug!(field = name.label(), ?value, "dropping mis-shaped field value");
            }
        }
    }

    /// Clear one field by name
    pub fn clear(&mut self, name: FieldName) {
        match name {
            FieldName::Title => self.title = None,
            FieldName::Authors => self.authors = None,
            FieldName::Journal => self.journal = None,
            FieldName::Year => self.year = None,
            FieldName::Volume => self.volume = None,
            FieldName::Issue => self.issue = None,
            FieldName::Pages => self.pages = None,
            FieldName::Pmid => self.pmid = None,
            FieldName::Doi => self.doi = None,
        }
    }

    /// Copy with the PubMed identifier removed (used when accepting a
    /// candidate, so the identifier never leaks into composed text)
    pub fn without_identifier(&self) -> Self {
        let mut fields = self.clone();
        fields.pmid = None;
        fields
    }

    /// Compose a plain reference line from the field set
    ///
    /// Layout: `authors (year). title. journal, volume(issue): pages DOI: doi`
    /// with absent fields collapsing out. This is the local composition used
    /// when a candidate replaces a record's text; styled renderings come from
    /// the format collaborator instead.
    pub fn compose_text(&self) -> String {
        let authors = self
            .authors
            .as_deref()
            .map(|a| a.join(", "))
            .unwrap_or_default();
        let year = self
            .year
            .map(|y| format!("({})", y))
            .unwrap_or_default();
        let title = self.title.as_deref().unwrap_or_default();
        let journal = self.journal.as_deref().unwrap_or_default();
        let volume = self.volume.as_deref().unwrap_or_default();
        let issue = self
            .issue
            .as_deref()
            .map(|i| format!("({})", i))
            .unwrap_or_default();
        let pages = self
            .pages
            .as_deref()
            .map(|p| format!(": {}", p))
            .unwrap_or_default();
        let doi = self
            .doi
            .as_deref()
            .map(|d| format!(" DOI: {}", d))
            .unwrap_or_default();

        format!(
            "{} {}. {}. {}, {}{}{}{}",
            authors, year, title, journal, volume, issue, pages, doi
        )
        .trim()
        .to_string()
    }
}

/// Lifecycle status of a submitted citation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Pending,
    Matched,
    NotFound,
    Completed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Matched => "matched",
            RecordStatus::NotFound => "not_found",
            RecordStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// How a candidate was matched, when the search collaborator matched on an
/// identifier rather than by text similarity. Takes precedence in display
/// over any reconciled text diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    DoiMatch,
    PmidMatch,
}

impl MatchType {
    pub fn label(&self) -> &'static str {
        match self {
            MatchType::DoiMatch => "DOI match",
            MatchType::PmidMatch => "PMID match",
        }
    }
}

/// Per-field classification supplied by the collaborator that produced a
/// candidate; only `different` drives word-level highlighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldDiff {
    Same,
    Different {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original: Option<FieldValue>,
    },
    /// Populated on the candidate only; `value` carries the candidate's value
    Missing {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<FieldValue>,
    },
    /// Populated on the submission only; `value` carries the submitted value
    Extra {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<FieldValue>,
    },
}

/// One externally supplied potential match for a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
    /// Candidate's own field set, fully populated as known
    #[serde(rename = "keywords")]
    pub fields: ReferenceFields,

    /// Collaborator confidence in [0,1]; opaque beyond ordering and display
    pub similarity_score: f64,

    /// Collaborator-supplied per-field classification
    #[serde(rename = "differences", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_differences: BTreeMap<FieldName, FieldDiff>,

    /// Identifier-match tag, if the collaborator matched on DOI/PMID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,
}

/// One submitted citation plus its derived matching state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub id: RecordId,

    /// Verbatim submitted citation string; never mutated
    pub original_text: String,

    /// Detected citation style of the original text, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_type: Option<String>,

    #[serde(rename = "extracted_keywords", default)]
    pub extracted_fields: ReferenceFields,

    /// Candidates ordered by descending similarity, as supplied; this core
    /// never re-sorts them
    #[serde(rename = "matched_articles", default)]
    pub candidates: Vec<CandidateMatch>,

    #[serde(default)]
    pub status: RecordStatus,
}

impl ReferenceRecord {
    /// The record's declared style, defaulting to "original" when unknown
    pub fn style(&self) -> &str {
        self.format_type.as_deref().unwrap_or(ORIGINAL_STYLE)
    }
}

/// The currently accepted rendering source for one record
///
/// Exactly one exists per record after initialization; accepting a candidate
/// replaces this entry in place, preserving list order and size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedReference {
    pub id: RecordId,

    /// Rendered or replacement text
    pub text: String,

    /// Field set backing that text
    pub data: ReferenceFields,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_type: Option<String>,
}
