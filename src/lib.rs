//! # oa-harvester
//!
//! Turns a free-text research description into one archive of Open-Access
//! PDFs: an AI model splits the topic into sub-topics and search keywords,
//! Crossref and Unpaywall are queried per keyword, results are merged and
//! deduplicated by identifier, files are downloaded with bounded concurrency,
//! and the successes are bundled into a zip.
//!
//! ## Architecture
//!
//! - [`ai`]: topic decomposition and keyword generation (Gemini backend)
//! - [`sources`]: bibliographic source clients (Crossref, Unpaywall)
//! - [`pipeline`]: merge/dedup, downloader, archive assembly, orchestration
//! - [`state`]: per-run phase and counters for polling
//! - [`models`]: shared data structures
//! - [`config`]: configuration management
//! - [`utils`]: HTTP client, retry policy, filename handling

pub mod ai;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use models::{CandidateDocument, DownloadResult, RunReport};
pub use pipeline::{Pipeline, PipelineError};
pub use state::{Phase, RunSnapshot, RunState};
