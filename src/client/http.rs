//! HTTP implementation of the collaborator services

use super::types::{
    ClientError, FormatRequest, FormatResponse, FormatService, SearchOutcome, SearchRequest,
    SearchResponse, SearchService, SplitRequest, SplitResponse, SplitService,
};
use crate::config::ServiceConfig;
use crate::model::{ProcessedReference, RecordId, ReferenceFields, ReferenceRecord};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// One HTTP client serving all three collaborator endpoints under a common
/// base URL (`/split`, `/search/{id}`, `/format`)
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCollaborator {
    /// Create a collaborator client from service config
    pub fn from_config(config: &ServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: config.base_url.clone(),
            client,
        }
    }

    /// Create a collaborator client with an explicit base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Join a path onto the base URL
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ClientError::network(format!("connection failed: {}", e))
                } else {
                    ClientError::network(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::http(status.as_u16(), message));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::parse(format!("failed to parse response: {}", e)))
    }

    /// Cheap availability probe against the collaborator base URL
    pub async fn is_available(&self) -> bool {
        let request = self.client.get(&self.base_url);
        match tokio::time::timeout(Duration::from_secs(5), request.send()).await {
            Ok(Ok(response)) => !response.status().is_server_error(),
            _ => false,
        }
    }
}

#[async_trait]
impl SplitService for HttpCollaborator {
    async fn split(&self, text: &str) -> Result<Vec<ReferenceRecord>, ClientError> {
        let request = SplitRequest {
            text: text.to_string(),
        };
        let response: SplitResponse = self.post_json("split", &request).await?;
        Ok(response.references)
    }
}

#[async_trait]
impl SearchService for HttpCollaborator {
    async fn search(
        &self,
        id: &RecordId,
        keywords: &ReferenceFields,
        use_smart_matching: bool,
    ) -> Result<SearchOutcome, ClientError> {
        let request = SearchRequest {
            keywords: keywords.clone(),
            use_smart_matching,
        };
        let path = format!("search/{}", id);
        let response: SearchResponse = self.post_json(&path, &request).await?;
        Ok(response.into())
    }
}

#[async_trait]
impl FormatService for HttpCollaborator {
    async fn format(
        &self,
        references: &[ProcessedReference],
        target_format: &str,
    ) -> Result<String, ClientError> {
        let request = FormatRequest {
            references: references.to_vec(),
            target_format: target_format.to_string(),
        };
        let response: FormatResponse = self.post_json("format", &request).await?;
        Ok(response.formatted_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joining() {
        let client = HttpCollaborator::new("http://localhost:8000/api");
        assert_eq!(client.endpoint("split"), "http://localhost:8000/api/split");

        // Trailing and leading slashes collapse
        let client = HttpCollaborator::new("http://localhost:8000/api/");
        assert_eq!(
            client.endpoint("/search/ref_1"),
            "http://localhost:8000/api/search/ref_1"
        );
    }

    #[test]
    fn test_from_config() {
        let config = ServiceConfig {
            base_url: "http://example.com/api".into(),
            timeout: 30,
        };
        let client = HttpCollaborator::from_config(&config);
        assert_eq!(client.base_url, "http://example.com/api");
    }
}
