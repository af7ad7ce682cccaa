//! Run state shared between the pipeline and its observers.
//!
//! One [`RunState`] instance belongs to one run. The pipeline bumps counters
//! and the phase as it moves through the stages; observers poll
//! [`RunState::snapshot`]. Counters only ever increase within a run, and the
//! tracker itself performs no I/O.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Coarse pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Decomposing,
    GeneratingKeywords,
    Searching,
    Downloading,
    Archiving,
    Done,
    Failed,
}

impl Phase {
    fn as_u8(self) -> u8 {
        match self {
            Phase::Decomposing => 0,
            Phase::GeneratingKeywords => 1,
            Phase::Searching => 2,
            Phase::Downloading => 3,
            Phase::Archiving => 4,
            Phase::Done => 5,
            Phase::Failed => 6,
        }
    }

    fn from_u8(value: u8) -> Phase {
        match value {
            0 => Phase::Decomposing,
            1 => Phase::GeneratingKeywords,
            2 => Phase::Searching,
            3 => Phase::Downloading,
            4 => Phase::Archiving,
            5 => Phase::Done,
            _ => Phase::Failed,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Decomposing => "decomposing",
            Phase::GeneratingKeywords => "generating keywords",
            Phase::Searching => "searching",
            Phase::Downloading => "downloading",
            Phase::Archiving => "archiving",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Mutable state of one run, safe to share across tasks
#[derive(Debug)]
pub struct RunState {
    run_id: String,
    phase: AtomicU8,
    sub_topics: AtomicUsize,
    keywords: AtomicUsize,
    documents_found: AtomicUsize,
    downloads_completed: AtomicUsize,
    downloads_failed: AtomicUsize,
    abort_requested: AtomicBool,
    archive_path: Mutex<Option<PathBuf>>,
}

/// Read-only view of a [`RunState`] at one point in time
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub run_id: String,
    pub phase: Phase,
    pub sub_topics: usize,
    pub keywords: usize,
    pub documents_found: usize,
    pub downloads_completed: usize,
    pub downloads_failed: usize,
    pub archive_path: Option<PathBuf>,
}

impl RunState {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            phase: AtomicU8::new(Phase::Decomposing.as_u8()),
            sub_topics: AtomicUsize::new(0),
            keywords: AtomicUsize::new(0),
            documents_found: AtomicUsize::new(0),
            downloads_completed: AtomicUsize::new(0),
            downloads_failed: AtomicUsize::new(0),
            abort_requested: AtomicBool::new(false),
            archive_path: Mutex::new(None),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub fn set_phase(&self, phase: Phase) {
        self.phase.store(phase.as_u8(), Ordering::SeqCst);
        tracing::debug!(run_id = %self.run_id, %phase, "phase change");
    }

    pub fn add_sub_topics(&self, count: usize) {
        self.sub_topics.fetch_add(count, Ordering::SeqCst);
    }

    pub fn add_keywords(&self, count: usize) {
        self.keywords.fetch_add(count, Ordering::SeqCst);
    }

    pub fn add_documents_found(&self, count: usize) {
        self.documents_found.fetch_add(count, Ordering::SeqCst);
    }

    pub fn record_download_success(&self) {
        self.downloads_completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_download_failure(&self) {
        self.downloads_failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Ask the run to stop at the next stage boundary.
    ///
    /// In-flight network calls are left to finish or time out on their own.
    pub fn request_abort(&self) {
        self.abort_requested.store(true, Ordering::SeqCst);
    }

    pub fn abort_requested(&self) -> bool {
        self.abort_requested.load(Ordering::SeqCst)
    }

    pub fn set_archive_path(&self, path: PathBuf) {
        *self.archive_path.lock().unwrap() = Some(path);
    }

    /// Take a consistent-enough view for polling.
    ///
    /// Each field is read atomically; no compound invariant spans fields, so
    /// per-field reads are all observers need.
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            run_id: self.run_id.clone(),
            phase: self.phase(),
            sub_topics: self.sub_topics.load(Ordering::SeqCst),
            keywords: self.keywords.load(Ordering::SeqCst),
            documents_found: self.documents_found.load(Ordering::SeqCst),
            downloads_completed: self.downloads_completed.load(Ordering::SeqCst),
            downloads_failed: self.downloads_failed.load(Ordering::SeqCst),
            archive_path: self.archive_path.lock().unwrap().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_starts_decomposing_with_zero_counts() {
        let state = RunState::new("run-1");
        let snap = state.snapshot();

        assert_eq!(snap.run_id, "run-1");
        assert_eq!(snap.phase, Phase::Decomposing);
        assert_eq!(snap.sub_topics, 0);
        assert_eq!(snap.downloads_completed, 0);
        assert!(snap.archive_path.is_none());
    }

    #[test]
    fn test_counters_accumulate() {
        let state = RunState::new("run-1");
        state.add_sub_topics(2);
        state.add_keywords(4);
        state.add_documents_found(8);
        state.record_download_success();
        state.record_download_success();
        state.record_download_failure();

        let snap = state.snapshot();
        assert_eq!(snap.sub_topics, 2);
        assert_eq!(snap.keywords, 4);
        assert_eq!(snap.documents_found, 8);
        assert_eq!(snap.downloads_completed, 2);
        assert_eq!(snap.downloads_failed, 1);
    }

    #[test]
    fn test_phase_round_trip() {
        let state = RunState::new("run-1");
        for phase in [
            Phase::GeneratingKeywords,
            Phase::Searching,
            Phase::Downloading,
            Phase::Archiving,
            Phase::Done,
            Phase::Failed,
        ] {
            state.set_phase(phase);
            assert_eq!(state.phase(), phase);
        }
    }

    #[test]
    fn test_abort_flag() {
        let state = RunState::new("run-1");
        assert!(!state.abort_requested());
        state.request_abort();
        assert!(state.abort_requested());
    }

    #[test]
    fn test_concurrent_increments_are_lossless() {
        use std::sync::Arc;

        let state = Arc::new(RunState::new("run-1"));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let state = Arc::clone(&state);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    state.record_download_success();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(state.snapshot().downloads_completed, 800);
    }
}
