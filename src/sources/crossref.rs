//! Crossref source client.
//!
//! Uses the Crossref works REST API. Only journal articles that expose a
//! direct `application/pdf` link and carry a DOI are reported as candidates;
//! everything else is not retrievable and gets filtered here.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{CandidateDocument, Origin};
use crate::sources::{Source, SourceError};
use crate::utils::{api_retry_config, with_retry, HttpClient};

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// Crossref source client
#[derive(Debug, Clone)]
pub struct CrossrefSource {
    client: Arc<HttpClient>,
    base_url: String,
    rows: usize,
    from_year: Option<u16>,
    until_year: Option<u16>,
}

impl CrossrefSource {
    /// `mailto` in the user agent puts requests in Crossref's polite pool.
    pub fn new(contact_email: &str, rows: usize) -> Self {
        let user_agent = format!(
            "{}/{} (mailto:{})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            contact_email
        );
        Self {
            client: Arc::new(HttpClient::with_user_agent(&user_agent)),
            base_url: CROSSREF_API_BASE.to_string(),
            rows,
            from_year: None,
            until_year: None,
        }
    }

    /// Restrict results to a publication-year window; either bound may be
    /// open.
    pub fn with_date_range(mut self, from_year: Option<u16>, until_year: Option<u16>) -> Self {
        self.from_year = from_year;
        self.until_year = until_year;
        self
    }

    /// Point the client at a different endpoint (test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn filter_param(&self) -> String {
        let mut filters = vec!["type:journal-article".to_string()];
        if let Some(year) = self.from_year {
            filters.push(format!("from-pub-date:{}-01-01", year));
        }
        if let Some(year) = self.until_year {
            filters.push(format!("until-pub-date:{}-12-31", year));
        }
        filters.join(",")
    }
}

#[async_trait]
impl Source for CrossrefSource {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "Crossref"
    }

    fn origin(&self) -> Origin {
        Origin::Crossref
    }

    async fn search(&self, keyword: &str) -> Result<Vec<CandidateDocument>, SourceError> {
        let url = format!(
            "{}/works?query={}&rows={}&filter={}",
            self.base_url,
            urlencoding::encode(keyword),
            self.rows,
            self.filter_param()
        );

        // Clone values for the retry closure
        let client = Arc::clone(&self.client);
        let url_for_retry = url.clone();

        let data: WorksResponse = with_retry(api_retry_config(), || {
            let client = Arc::clone(&client);
            let url = url_for_retry.clone();
            async move {
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| SourceError::Network(format!("Failed to query Crossref: {}", e)))?;

                if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(SourceError::RateLimit);
                }

                if !response.status().is_success() {
                    return Err(SourceError::Api(format!(
                        "Crossref returned status {}",
                        response.status()
                    )));
                }

                response
                    .json()
                    .await
                    .map_err(|e| SourceError::Parse(format!("Failed to parse Crossref JSON: {}", e)))
            }
        })
        .await?;

        let candidates: Vec<CandidateDocument> = data
            .message
            .items
            .into_iter()
            .filter_map(|item| {
                let doi = item.doi?;

                let pdf_url = item
                    .link
                    .iter()
                    .find(|l| l.content_type.as_deref() == Some("application/pdf"))
                    .and_then(|l| l.url.clone())?;

                let title = item
                    .title
                    .as_ref()
                    .and_then(|t| t.first())
                    .cloned()
                    .unwrap_or_default();

                Some(CandidateDocument::new(title, doi, pdf_url, Origin::Crossref))
            })
            .collect();

        tracing::debug!(
            keyword,
            candidates = candidates.len(),
            "Crossref search complete"
        );

        Ok(candidates)
    }
}

// ===== Crossref API types =====

#[derive(Debug, Deserialize)]
struct WorksResponse {
    message: WorksMessage,
}

#[derive(Debug, Deserialize)]
struct WorksMessage {
    #[serde(default)]
    items: Vec<WorkItem>,
}

#[derive(Debug, Deserialize)]
struct WorkItem {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    title: Option<Vec<String>>,
    #[serde(default)]
    link: Vec<WorkLink>,
}

#[derive(Debug, Deserialize)]
struct WorkLink {
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(rename = "content-type")]
    content_type: Option<String>,
}
