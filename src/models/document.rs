//! Document models shared across the discovery and retrieval stages.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The bibliographic source a candidate document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Crossref,
    Unpaywall,
}

impl Origin {
    /// Returns the display name of the source
    pub fn name(&self) -> &str {
        match self {
            Origin::Crossref => "Crossref",
            Origin::Unpaywall => "Unpaywall",
        }
    }

    /// Returns the source identifier (for logging and config)
    pub fn id(&self) -> &str {
        match self {
            Origin::Crossref => "crossref",
            Origin::Unpaywall => "unpaywall",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An Open-Access document reported by one source for one keyword.
///
/// The `identifier` is the document's DOI (or equivalent handle) and is the
/// sole key used for deduplication. `source_url` points directly at the
/// downloadable file as flagged Open Access by the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDocument {
    /// Document title (may be empty if the source omitted it)
    pub title: String,

    /// DOI or equivalent handle; empty identifiers are dropped during merge
    pub identifier: String,

    /// Direct URL of the Open-Access file
    pub source_url: String,

    /// Which source produced this candidate
    pub origin: Origin,
}

impl CandidateDocument {
    pub fn new(
        title: impl Into<String>,
        identifier: impl Into<String>,
        source_url: impl Into<String>,
        origin: Origin,
    ) -> Self {
        Self {
            title: title.into(),
            identifier: identifier.into(),
            source_url: source_url.into(),
            origin,
        }
    }
}

/// Terminal outcome of one download attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Success,
    Failed,
}

/// Outcome of downloading one unique document.
///
/// Exactly one of these exists per document attempted; a failed download is
/// terminal for that document within the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResult {
    pub document: CandidateDocument,
    pub status: DownloadStatus,

    /// Path of the saved file; present only on success
    pub local_path: Option<PathBuf>,

    /// Human-readable failure reason; present only on failure
    pub error: Option<String>,
}

impl DownloadResult {
    pub fn success(document: CandidateDocument, local_path: PathBuf) -> Self {
        Self {
            document,
            status: DownloadStatus::Success,
            local_path: Some(local_path),
            error: None,
        }
    }

    pub fn failed(document: CandidateDocument, error: impl Into<String>) -> Self {
        Self {
            document,
            status: DownloadStatus::Failed,
            local_path: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DownloadStatus::Success
    }
}

/// Final totals for one completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub sub_topics: usize,
    pub keywords: usize,
    pub documents_found: usize,
    pub downloads_completed: usize,
    pub downloads_failed: usize,
    pub archive_path: PathBuf,
}
