//! Topic decomposition and keyword generation via an external text model.
//!
//! Both operations are a single request/response call: the model is asked for
//! a JSON array of strings and anything else is malformed output. Malformed
//! output is an error here; deciding whether that aborts the run or just one
//! sub-topic is the pipeline's call.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

/// External AI text-generation service used for topic work
#[async_trait]
pub trait TopicModel: Send + Sync {
    /// Break a free-text research description into sub-topic strings.
    ///
    /// An explicitly empty list is a valid answer (the topic had nothing to
    /// split); malformed output or an unreachable service is an error.
    async fn decompose(&self, description: &str) -> Result<Vec<String>, UpstreamError>;

    /// Derive academic search keywords for one sub-topic.
    async fn keywords(&self, sub_topic: &str) -> Result<Vec<String>, UpstreamError>;
}

/// Failures of the AI text-generation service
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Service unreachable or transport failure
    #[error("text service unreachable: {0}")]
    Network(String),

    /// Service answered with a non-success status
    #[error("text service error: {0}")]
    Api(String),

    /// Response was not a JSON list of strings
    #[error("malformed model output: {0}")]
    Malformed(String),
}

/// Parse model output into a list of non-empty strings.
///
/// Accepts a bare JSON array or one wrapped in a Markdown code fence; entries
/// are trimmed and blanks dropped. An empty array is a legitimate result.
pub fn parse_string_list(text: &str) -> Result<Vec<String>, UpstreamError> {
    let fence = regex::Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").expect("static regex");

    let body = fence
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
        .trim();

    let items: Vec<String> = serde_json::from_str(body)
        .map_err(|e| UpstreamError::Malformed(format!("{}: {:?}", e, truncate(body, 120))))?;

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let items = parse_string_list(r#"["indexing", "query optimization"]"#).unwrap();
        assert_eq!(items, vec!["indexing", "query optimization"]);
    }

    #[test]
    fn test_parse_fenced_array() {
        let text = "```json\n[\"graph storage\", \"traversal\"]\n```";
        let items = parse_string_list(text).unwrap();
        assert_eq!(items, vec!["graph storage", "traversal"]);
    }

    #[test]
    fn test_parse_trims_and_drops_blanks() {
        let items = parse_string_list(r#"["  a  ", "", "b"]"#).unwrap();
        assert_eq!(items, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(parse_string_list("[]").unwrap().is_empty());
    }

    #[test]
    fn test_prose_is_malformed() {
        let result = parse_string_list("Sure! Here are some sub-topics: indexing, caching");
        assert!(matches!(result, Err(UpstreamError::Malformed(_))));
    }

    #[test]
    fn test_non_string_array_is_malformed() {
        let result = parse_string_list(r#"[1, 2, 3]"#);
        assert!(matches!(result, Err(UpstreamError::Malformed(_))));
    }
}
