//! The discovery-and-retrieval pipeline.
//!
//! One [`Pipeline::execute`] call is one run: decompose the description into
//! sub-topics, derive keywords per sub-topic, search every source per keyword,
//! merge and deduplicate, download, archive. Failure scope follows the stage:
//! a bad decomposition aborts the run, a bad keyword response skips one
//! sub-topic, a failed search empties one keyword, a failed download loses one
//! document. Only "nothing at all" outcomes fail the run.

mod archive;
mod download;
mod merge;

pub use archive::build_archive;
pub use download::Downloader;
pub use merge::merge;

use futures_util::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;

use crate::ai::{TopicModel, UpstreamError};
use crate::models::{CandidateDocument, DownloadResult, RunReport};
use crate::sources::Source;
use crate::state::{Phase, RunState};

/// Errors that terminate a run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The AI service failed or answered with something unusable
    #[error("upstream service failure: {0}")]
    Upstream(#[from] UpstreamError),

    /// The AI service explicitly found nothing to research
    #[error("no sub-topics found for this description")]
    NoSubTopics,

    /// Nothing could be archived
    #[error("packaging failed: {0}")]
    Packaging(String),

    /// The caller asked the run to stop
    #[error("run aborted")]
    Aborted,

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One run's worth of wiring: model, sources, downloader, archive location
pub struct Pipeline {
    model: Arc<dyn TopicModel>,
    sources: Vec<Arc<dyn Source>>,
    downloader: Downloader,
    archive_dir: PathBuf,
    max_concurrent_searches: usize,
    max_documents: usize,
}

impl Pipeline {
    /// `sources` order is the dedup tie-break order; pass Crossref before
    /// Unpaywall to keep runs reproducible.
    pub fn new(
        model: Arc<dyn TopicModel>,
        sources: Vec<Arc<dyn Source>>,
        downloader: Downloader,
        archive_dir: PathBuf,
        max_concurrent_searches: usize,
    ) -> Self {
        Self {
            model,
            sources,
            downloader,
            archive_dir,
            max_concurrent_searches: max_concurrent_searches.max(1),
            max_documents: usize::MAX,
        }
    }

    /// Download at most `max` unique documents per run; the merged list is
    /// cut after dedup, so the kept entries are the first found in search
    /// order.
    pub fn with_max_documents(mut self, max: usize) -> Self {
        self.max_documents = max.max(1);
        self
    }

    /// Run the full pipeline for one description.
    ///
    /// `state` must be a fresh [`RunState`]; phase and counters are updated
    /// live, and the phase ends at `Done` or `Failed` to match the returned
    /// result.
    pub async fn execute(
        &self,
        description: &str,
        state: &RunState,
    ) -> Result<RunReport, PipelineError> {
        match self.run_stages(description, state).await {
            Ok(report) => {
                state.set_phase(Phase::Done);
                Ok(report)
            }
            Err(e) => {
                state.set_phase(Phase::Failed);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        description: &str,
        state: &RunState,
    ) -> Result<RunReport, PipelineError> {
        // Stage 1: decompose
        state.set_phase(Phase::Decomposing);
        let sub_topics = self.model.decompose(description).await?;
        state.add_sub_topics(sub_topics.len());
        tracing::info!(count = sub_topics.len(), "decomposed into sub-topics");

        if sub_topics.is_empty() {
            return Err(PipelineError::NoSubTopics);
        }
        self.checkpoint(state)?;

        // Stage 2: keywords, one AI call per sub-topic; a bad answer skips
        // that sub-topic only
        state.set_phase(Phase::GeneratingKeywords);
        let mut keywords: Vec<String> = Vec::new();
        for sub_topic in &sub_topics {
            match self.model.keywords(sub_topic).await {
                Ok(generated) => {
                    state.add_keywords(generated.len());
                    keywords.extend(generated);
                }
                Err(e) => {
                    tracing::warn!(sub_topic, error = %e, "skipping sub-topic");
                }
            }
        }
        self.checkpoint(state)?;

        // Stage 3: search, bounded concurrency across keywords with results
        // collected in keyword order so dedup stays deterministic
        state.set_phase(Phase::Searching);
        let per_keyword: Vec<Vec<CandidateDocument>> = stream::iter(keywords.iter())
            .map(|keyword| self.search_keyword(keyword))
            .buffered(self.max_concurrent_searches)
            .collect()
            .await;
        let candidates: Vec<CandidateDocument> = per_keyword.into_iter().flatten().collect();
        self.checkpoint(state)?;

        // Stage 4: merge, then cut to the per-run document cap
        let mut unique = merge(candidates);
        if unique.len() > self.max_documents {
            tracing::info!(
                found = unique.len(),
                cap = self.max_documents,
                "more documents than the cap, keeping the first found"
            );
            unique.truncate(self.max_documents);
        }
        state.add_documents_found(unique.len());
        tracing::info!(count = unique.len(), "unique documents after merge");

        // Stage 5: download
        state.set_phase(Phase::Downloading);
        let results: Vec<DownloadResult> = self
            .downloader
            .fetch_all_observed(unique, |result| {
                if result.is_success() {
                    state.record_download_success();
                } else {
                    state.record_download_failure();
                }
            })
            .await;
        self.checkpoint(state)?;

        // Stage 6: archive
        state.set_phase(Phase::Archiving);
        std::fs::create_dir_all(&self.archive_dir)?;
        let archive_path = self
            .archive_dir
            .join(format!("{}.zip", state.run_id()));
        let archive_path = build_archive(&results, &archive_path)?;
        state.set_archive_path(archive_path.clone());

        let snapshot = state.snapshot();
        Ok(RunReport {
            sub_topics: snapshot.sub_topics,
            keywords: snapshot.keywords,
            documents_found: snapshot.documents_found,
            downloads_completed: snapshot.downloads_completed,
            downloads_failed: snapshot.downloads_failed,
            archive_path,
        })
    }

    /// Query every source for one keyword, in declared source order.
    ///
    /// A source that keeps failing contributes nothing for this keyword; its
    /// sibling is still queried.
    async fn search_keyword(&self, keyword: &str) -> Vec<CandidateDocument> {
        let mut found = Vec::new();

        for source in &self.sources {
            match source.search(keyword).await {
                Ok(mut docs) => found.append(&mut docs),
                Err(e) => {
                    tracing::warn!(
                        source = source.id(),
                        keyword,
                        error = %e,
                        "source search failed, continuing without it"
                    );
                }
            }
        }

        found
    }

    /// Honor abort requests at stage boundaries only; in-flight work has
    /// already finished by the time this runs.
    fn checkpoint(&self, state: &RunState) -> Result<(), PipelineError> {
        if state.abort_requested() {
            Err(PipelineError::Aborted)
        } else {
            Ok(())
        }
    }
}
