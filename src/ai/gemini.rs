//! Gemini `generateContent` backend for [`TopicModel`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ai::{parse_string_list, TopicModel, UpstreamError};
use crate::utils::HttpClient;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Gemini-backed topic model
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Arc<HttpClient>,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Arc::new(HttpClient::new()),
            base_url: GEMINI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Use a different model id (e.g. from config)
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a different endpoint (test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// One request/response round trip returning the raw model text
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(&self.api_key)
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Api(format!(
                "status {}",
                response.status()
            )));
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(format!("not a generateContent body: {}", e)))?;

        data.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| UpstreamError::Malformed("response carried no candidates".to_string()))
    }
}

#[async_trait]
impl TopicModel for GeminiClient {
    async fn decompose(&self, description: &str) -> Result<Vec<String>, UpstreamError> {
        let prompt = format!(
            "You are an academic research assistant. Break the following research \
             topic into narrower sub-topics suitable for a literature search. \
             Respond with a JSON array of sub-topic strings and nothing else. \
             If the topic cannot be split, return a one-element array; if it is \
             not a research topic at all, return an empty array.\n\nTopic: {}",
            description
        );

        let text = self.generate(&prompt).await?;
        parse_string_list(&text)
    }

    async fn keywords(&self, sub_topic: &str) -> Result<Vec<String>, UpstreamError> {
        let prompt = format!(
            "Generate 3-5 specific academic search keywords for finding research \
             papers about the sub-topic below. Respond with a JSON array of \
             keyword strings and nothing else.\n\nSub-topic: {}",
            sub_topic
        );

        let text = self.generate(&prompt).await?;
        parse_string_list(&text)
    }
}

// ===== generateContent wire types =====

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(text: &str) -> String {
        serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": text}]}}
            ]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_decompose_parses_model_list() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "POST",
                format!("/models/{}:generateContent", DEFAULT_MODEL).as_str(),
            )
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(fixture("```json\n[\"indexing\", \"query optimization\"]\n```"))
            .create_async()
            .await;

        let client = GeminiClient::new("test-key").with_base_url(server.url());
        let sub_topics = client.decompose("graph databases").await.unwrap();
        assert_eq!(sub_topics, vec!["indexing", "query optimization"]);
    }

    #[tokio::test]
    async fn test_prose_answer_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "POST",
                format!("/models/{}:generateContent", DEFAULT_MODEL).as_str(),
            )
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(fixture("I'd suggest looking into indexing."))
            .create_async()
            .await;

        let client = GeminiClient::new("test-key").with_base_url(server.url());
        let result = client.keywords("indexing").await;
        assert!(matches!(result, Err(UpstreamError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_api_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "POST",
                format!("/models/{}:generateContent", DEFAULT_MODEL).as_str(),
            )
            .match_query(mockito::Matcher::Any)
            .with_status(403)
            .with_body("{}")
            .create_async()
            .await;

        let client = GeminiClient::new("bad-key").with_base_url(server.url());
        let result = client.decompose("anything").await;
        assert!(matches!(result, Err(UpstreamError::Api(_))));
    }
}
