//! Scripted source for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{CandidateDocument, Origin};
use crate::sources::{Source, SourceError};

/// A source that serves pre-scripted candidates per keyword.
///
/// Keywords with no script return an empty list, matching the real clients'
/// "no results" behavior. `fail_keyword` makes a specific keyword error out so
/// tests can exercise the skip-on-failure path.
#[derive(Debug)]
pub struct MockSource {
    origin: Origin,
    results: HashMap<String, Vec<CandidateDocument>>,
    fail_keyword: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            results: HashMap::new(),
            fail_keyword: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Script the candidates returned for a keyword
    pub fn with_results(mut self, keyword: &str, docs: Vec<CandidateDocument>) -> Self {
        self.results.insert(keyword.to_string(), docs);
        self
    }

    /// Make searches for this keyword fail with a network error
    pub fn failing_on(mut self, keyword: &str) -> Self {
        self.fail_keyword = Some(keyword.to_string());
        self
    }

    /// Keywords this source was asked about, in call order
    pub fn searched_keywords(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        match self.origin {
            Origin::Crossref => "mock-crossref",
            Origin::Unpaywall => "mock-unpaywall",
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }

    fn origin(&self) -> Origin {
        self.origin
    }

    async fn search(&self, keyword: &str) -> Result<Vec<CandidateDocument>, SourceError> {
        self.calls.lock().unwrap().push(keyword.to_string());

        if self.fail_keyword.as_deref() == Some(keyword) {
            return Err(SourceError::Network("mock source offline".to_string()));
        }

        Ok(self.results.get(keyword).cloned().unwrap_or_default())
    }
}
