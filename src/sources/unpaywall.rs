//! Unpaywall source client.
//!
//! Uses the Unpaywall v2 search API, which requires a contact email but no
//! key. Only entries flagged `is_oa` with a usable file location become
//! candidates. The best location is tried first, then the remaining
//! `oa_locations`; across all of them a `url_for_pdf` beats a plain
//! location URL.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{CandidateDocument, Origin};
use crate::sources::{Source, SourceError};
use crate::utils::{api_retry_config, with_retry, HttpClient};

const UNPAYWALL_API_BASE: &str = "https://api.unpaywall.org/v2";

/// Unpaywall source client
#[derive(Debug, Clone)]
pub struct UnpaywallSource {
    client: Arc<HttpClient>,
    base_url: String,
    email: String,
}

impl UnpaywallSource {
    pub fn new(contact_email: &str) -> Self {
        Self {
            client: Arc::new(HttpClient::new()),
            base_url: UNPAYWALL_API_BASE.to_string(),
            email: contact_email.to_string(),
        }
    }

    /// Point the client at a different endpoint (test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Source for UnpaywallSource {
    fn id(&self) -> &str {
        "unpaywall"
    }

    fn name(&self) -> &str {
        "Unpaywall"
    }

    fn origin(&self) -> Origin {
        Origin::Unpaywall
    }

    async fn search(&self, keyword: &str) -> Result<Vec<CandidateDocument>, SourceError> {
        let url = format!(
            "{}/search?query={}&is_oa=true&email={}",
            self.base_url,
            urlencoding::encode(keyword),
            urlencoding::encode(&self.email)
        );

        let client = Arc::clone(&self.client);
        let url_for_retry = url.clone();

        let data: SearchResponse = with_retry(api_retry_config(), || {
            let client = Arc::clone(&client);
            let url = url_for_retry.clone();
            async move {
                let response = client.get(&url).send().await.map_err(|e| {
                    SourceError::Network(format!("Failed to query Unpaywall: {}", e))
                })?;

                if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(SourceError::RateLimit);
                }

                if !response.status().is_success() {
                    return Err(SourceError::Api(format!(
                        "Unpaywall returned status {}",
                        response.status()
                    )));
                }

                response.json().await.map_err(|e| {
                    SourceError::Parse(format!("Failed to parse Unpaywall JSON: {}", e))
                })
            }
        })
        .await?;

        let candidates: Vec<CandidateDocument> = data
            .results
            .into_iter()
            .filter_map(|entry| {
                let work = entry.response;
                if !work.is_oa {
                    return None;
                }

                let doi = work.doi?;
                let locations: Vec<OaLocation> = work
                    .best_oa_location
                    .into_iter()
                    .chain(work.oa_locations)
                    .collect();
                let pdf_url = locations
                    .iter()
                    .find_map(|l| l.url_for_pdf.clone())
                    .or_else(|| locations.iter().find_map(|l| l.url.clone()))?;
                let title = work.title.unwrap_or_default();

                Some(CandidateDocument::new(
                    title,
                    doi,
                    pdf_url,
                    Origin::Unpaywall,
                ))
            })
            .collect();

        tracing::debug!(
            keyword,
            candidates = candidates.len(),
            "Unpaywall search complete"
        );

        Ok(candidates)
    }
}

// ===== Unpaywall API types =====

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    response: OaWork,
}

#[derive(Debug, Deserialize)]
struct OaWork {
    doi: Option<String>,
    title: Option<String>,
    #[serde(default)]
    is_oa: bool,
    best_oa_location: Option<OaLocation>,
    #[serde(default)]
    oa_locations: Vec<OaLocation>,
}

#[derive(Debug, Deserialize)]
struct OaLocation {
    url_for_pdf: Option<String>,
    url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_FIXTURE: &str = r#"{
        "results": [
            {
                "response": {
                    "doi": "10.2/x",
                    "title": "Open access result",
                    "is_oa": true,
                    "best_oa_location": {
                        "url_for_pdf": "https://host/x.pdf",
                        "url": "https://host/x"
                    }
                }
            },
            {
                "response": {
                    "doi": "10.2/y",
                    "title": "Landing page only",
                    "is_oa": true,
                    "best_oa_location": {
                        "url_for_pdf": null,
                        "url": "https://host/y"
                    }
                }
            },
            {
                "response": {
                    "doi": "10.2/z",
                    "title": "Closed",
                    "is_oa": false,
                    "best_oa_location": null
                }
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_search_filters_to_open_access() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SEARCH_FIXTURE)
            .create_async()
            .await;

        let source = UnpaywallSource::new("tests@example.com").with_base_url(server.url());
        let candidates = source.search("query optimization").await.unwrap();

        assert_eq!(candidates.len(), 2);
        // url_for_pdf preferred, plain url accepted as fallback
        assert_eq!(candidates[0].source_url, "https://host/x.pdf");
        assert_eq!(candidates[1].source_url, "https://host/y");
        assert!(candidates.iter().all(|c| c.origin == Origin::Unpaywall));
    }

    #[tokio::test]
    async fn test_other_locations_are_tried_when_best_has_no_url() {
        let fixture = r#"{
            "results": [
                {
                    "response": {
                        "doi": "10.2/alt",
                        "title": "Repository copy only",
                        "is_oa": true,
                        "best_oa_location": {
                            "url_for_pdf": null,
                            "url": null
                        },
                        "oa_locations": [
                            {"url_for_pdf": null, "url": "https://host/alt"},
                            {"url_for_pdf": "https://host/alt.pdf", "url": "https://host/alt"}
                        ]
                    }
                }
            ]
        }"#;

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(fixture)
            .create_async()
            .await;

        let source = UnpaywallSource::new("tests@example.com").with_base_url(server.url());
        let candidates = source.search("repositories").await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].source_url, "https://host/alt.pdf");
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(400)
            .with_body("bad request")
            .create_async()
            .await;

        let source = UnpaywallSource::new("tests@example.com").with_base_url(server.url());
        let result = source.search("anything").await;
        assert!(matches!(result, Err(SourceError::Api(_))));
    }
}
