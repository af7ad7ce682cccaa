//! Bibliographic source clients.
//!
//! Each client implements the [`Source`] trait: given one keyword it returns
//! the Open-Access candidates that source knows about, already filtered to
//! entries with a downloadable file and an identifier. "No results" is an
//! empty list, never an error; network failures bubble up as [`SourceError`]
//! and the pipeline decides whether to skip or abort.

mod crossref;
mod unpaywall;

pub mod mock;

pub use crossref::CrossrefSource;
pub use mock::MockSource;
pub use unpaywall::UnpaywallSource;

use crate::models::{CandidateDocument, Origin};
use async_trait::async_trait;

/// Interface implemented by every bibliographic source client
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (used in logs and config)
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Which [`Origin`] this client's candidates carry
    fn origin(&self) -> Origin;

    /// Search for Open-Access documents matching the keyword.
    ///
    /// Returned candidates must have a direct file URL; paywalled or
    /// file-less entries are filtered out by the client itself.
    async fn search(&self, keyword: &str) -> Result<Vec<CandidateDocument>, SourceError>;
}

/// Errors that can occur when talking to a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Response could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// API-level error from the source
    #[error("API error: {0}")]
    Api(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}
