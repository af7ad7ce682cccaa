//! Core data models for candidate documents and download outcomes.

mod document;

pub use document::{CandidateDocument, DownloadResult, DownloadStatus, Origin, RunReport};
