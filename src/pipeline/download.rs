//! Bounded-concurrency document fetcher.

use futures_util::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::models::{CandidateDocument, DownloadResult};
use crate::utils::{looks_like_pdf, stem_for, unique_pdf_names, HttpClient, MIN_PDF_BYTES};

/// Fetches unique documents into a local directory.
///
/// Exactly one [`DownloadResult`] comes back per input document; a failed
/// fetch never fails the batch and leaves no file behind. File names are
/// assigned up front from the input order, so names (and therefore archive
/// contents) do not depend on completion order.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Arc<HttpClient>,
    dir: PathBuf,
    max_concurrent: usize,
    max_bytes: usize,
}

impl Downloader {
    pub fn new(dir: PathBuf, max_concurrent: usize, max_file_size_mb: usize) -> Self {
        Self {
            client: Arc::new(HttpClient::new()),
            dir,
            max_concurrent: max_concurrent.max(1),
            max_bytes: max_file_size_mb * 1024 * 1024,
        }
    }

    /// Download every document, at most `max_concurrent` at a time.
    pub async fn fetch_all(&self, documents: Vec<CandidateDocument>) -> Vec<DownloadResult> {
        self.fetch_all_observed(documents, |_| {}).await
    }

    /// Like [`Downloader::fetch_all`], calling `observe` as each result lands
    /// (from whichever task finished, so the observer must be `Sync`).
    pub async fn fetch_all_observed<F>(
        &self,
        documents: Vec<CandidateDocument>,
        observe: F,
    ) -> Vec<DownloadResult>
    where
        F: Fn(&DownloadResult) + Send + Sync,
    {
        if documents.is_empty() {
            return Vec::new();
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            // No directory means nothing can succeed; report per document.
            return documents
                .into_iter()
                .map(|doc| {
                    let result =
                        DownloadResult::failed(doc, format!("cannot create download dir: {}", e));
                    observe(&result);
                    result
                })
                .collect();
        }

        let stems: Vec<String> = documents
            .iter()
            .map(|d| stem_for(&d.title, &d.identifier))
            .collect();
        let names = unique_pdf_names(&stems);

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let observe = &observe;

        let tasks = documents.into_iter().zip(names).map(|(doc, name)| {
            let semaphore = Arc::clone(&semaphore);
            let downloader = self.clone();
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                let result = downloader.fetch_one(doc, &name).await;
                observe(&result);
                result
            }
        });

        join_all(tasks).await
    }

    /// Fetch one document to `<dir>/<name>`.
    async fn fetch_one(&self, doc: CandidateDocument, name: &str) -> DownloadResult {
        let path = self.dir.join(name);

        match self.fetch_bytes(&doc).await {
            Ok(bytes) => match tokio::fs::write(&path, &bytes).await {
                Ok(()) => {
                    tracing::info!(
                        identifier = %doc.identifier,
                        bytes = bytes.len(),
                        "downloaded {}",
                        name
                    );
                    DownloadResult::success(doc, path)
                }
                Err(e) => {
                    let _ = tokio::fs::remove_file(&path).await;
                    DownloadResult::failed(doc, format!("write failed: {}", e))
                }
            },
            Err(reason) => {
                tracing::warn!(identifier = %doc.identifier, %reason, "download failed");
                DownloadResult::failed(doc, reason)
            }
        }
    }

    /// Fetch and validate the document body, returning a failure reason on
    /// any problem.
    async fn fetch_bytes(&self, doc: &CandidateDocument) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .get(&doc.source_url)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        // Sources sometimes serve a login or landing page with a 200.
        if let Some(content_type) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if content_type.starts_with("text/") {
                return Err(format!("not a document: content-type {}", content_type));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("body read failed: {}", e))?;

        if bytes.len() > self.max_bytes {
            return Err(format!(
                "file too large: {} bytes (limit {})",
                bytes.len(),
                self.max_bytes
            ));
        }

        if !looks_like_pdf(&bytes) {
            return Err(format!(
                "not a PDF: {} bytes, missing %PDF header or below {} byte minimum",
                bytes.len(),
                MIN_PDF_BYTES
            ));
        }

        Ok(bytes.to_vec())
    }
}
