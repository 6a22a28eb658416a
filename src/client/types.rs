//! Service traits, wire types, and the transport error taxonomy

use crate::model::{
    CandidateMatch, ProcessedReference, RecordId, RecordStatus, ReferenceFields, ReferenceRecord,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport-level failure talking to a collaborator
///
/// Every collaborator call funnels into this taxonomy so higher layers
/// branch on one error shape instead of duplicating fallback logic at call
/// sites. No variant is retried automatically.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Collaborator unreachable or the connection failed mid-flight
    #[error("network error: {message}")]
    Network { message: String },

    /// Collaborator answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Collaborator answered but the body did not parse
    #[error("parse error: {message}")]
    Parse { message: String },
}

impl ClientError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}

/// Request body for the split collaborator
#[derive(Debug, Clone, Serialize)]
pub struct SplitRequest {
    pub text: String,
}

/// Response from the split collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct SplitResponse {
    pub references: Vec<ReferenceRecord>,
}

/// Request body for the search collaborator
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    #[serde(flatten)]
    pub keywords: ReferenceFields,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub use_smart_matching: bool,
}

/// Response from the search collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub reference_id: Option<RecordId>,
    #[serde(default)]
    pub matched_articles: Vec<CandidateMatch>,
    pub status: RecordStatus,
}

/// Core-facing result of one search call
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub candidates: Vec<CandidateMatch>,
    pub status: RecordStatus,
}

impl From<SearchResponse> for SearchOutcome {
    fn from(response: SearchResponse) -> Self {
        Self {
            candidates: response.matched_articles,
            status: response.status,
        }
    }
}

/// Request body for the format collaborator
#[derive(Debug, Clone, Serialize)]
pub struct FormatRequest {
    pub references: Vec<ProcessedReference>,
    pub target_format: String,
}

/// Response from the format collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct FormatResponse {
    pub formatted_text: String,
}

/// Splits raw pasted text into individual citation records with extracted
/// keyword fields
#[async_trait]
pub trait SplitService: Send + Sync {
    async fn split(&self, text: &str) -> Result<Vec<ReferenceRecord>, ClientError>;
}

/// Returns ranked candidate records for one citation's keyword fields
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(
        &self,
        id: &RecordId,
        keywords: &ReferenceFields,
        use_smart_matching: bool,
    ) -> Result<SearchOutcome, ClientError>;
}

/// Renders a processed reference list in a named citation style
#[async_trait]
pub trait FormatService: Send + Sync {
    async fn format(
        &self,
        references: &[ProcessedReference],
        target_format: &str,
    ) -> Result<String, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::network("connection refused");
        assert!(err.to_string().contains("connection refused"));

        let err = ClientError::http(503, "unavailable");
        assert!(err.to_string().contains("503"));

        let err = ClientError::parse("bad json");
        assert!(err.to_string().starts_with("parse error"));
    }

    #[test]
    fn test_search_request_flattens_keywords() {
        let request = SearchRequest {
            keywords: ReferenceFields {
                title: Some("A study".into()),
                year: Some(2020),
                ..Default::default()
            },
            use_smart_matching: true,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["title"], "A study");
        assert_eq!(value["year"], 2020);
        assert_eq!(value["use_smart_matching"], true);
    }

    #[test]
    fn test_search_request_omits_disabled_smart_flag() {
        let request = SearchRequest {
            keywords: ReferenceFields::default(),
            use_smart_matching: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("use_smart_matching").is_none());
    }

    #[test]
    fn test_search_response_into_outcome() {
        let response: SearchResponse = serde_json::from_value(json!({
            "reference_id": "ref_1",
            "matched_articles": [
                { "keywords": { "title": "T" }, "similarity_score": 0.9 }
            ],
            "status": "matched"
        }))
        .unwrap();

        let outcome = SearchOutcome::from(response);
        assert_eq!(outcome.status, RecordStatus::Matched);
        assert_eq!(outcome.candidates.len(), 1);
    }

    #[test]
    fn test_search_response_parses_one_sided_differences() {
        // One-sided difference tags must never fail the whole response
        // parse, or a matched record would degrade to not_found.
        let response: SearchResponse = serde_json::from_value(json!({
            "matched_articles": [{
                "keywords": { "title": "T", "volume": "12" },
                "similarity_score": 0.77,
                "differences": {
                    "volume": { "type": "missing", "value": "12" },
                    "pages": { "type": "extra", "value": "100-110" }
                }
            }],
            "status": "matched"
        }))
        .unwrap();

        let outcome = SearchOutcome::from(response);
        assert_eq!(outcome.status, RecordStatus::Matched);
        assert_eq!(outcome.candidates.len(), 1);
    }
}
