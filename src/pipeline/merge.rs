//! Candidate merging and identifier-based deduplication.

use std::collections::HashSet;

use crate::models::CandidateDocument;

/// Collapse candidates to one document per identifier.
///
/// Input order is significant: the caller concatenates results in a fixed
/// order (sub-topics in generation order, keywords in generation order,
/// Crossref before Unpaywall), and the first occurrence of each identifier
/// wins regardless of which source it came from. Candidates with an empty
/// identifier cannot be deduplicated and are dropped.
pub fn merge(candidates: Vec<CandidateDocument>) -> Vec<CandidateDocument> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();

    for candidate in candidates {
        if candidate.identifier.is_empty() {
            tracing::debug!(
                title = %candidate.title,
                origin = %candidate.origin,
                "dropping candidate without identifier"
            );
            continue;
        }

        if seen.insert(candidate.identifier.to_lowercase()) {
            unique.push(candidate);
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Origin;

    fn doc(identifier: &str, origin: Origin) -> CandidateDocument {
        CandidateDocument::new(
            format!("title {}", identifier),
            identifier,
            format!("https://host/{}.pdf", identifier.replace('/', "_")),
            origin,
        )
    }

    #[test]
    fn test_first_seen_wins_across_sources() {
        let merged = merge(vec![
            doc("10.1/a", Origin::Crossref),
            doc("10.1/b", Origin::Crossref),
            doc("10.1/a", Origin::Unpaywall),
            doc("10.1/c", Origin::Unpaywall),
        ]);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].identifier, "10.1/a");
        assert_eq!(merged[0].origin, Origin::Crossref);
        assert_eq!(merged[1].identifier, "10.1/b");
        assert_eq!(merged[2].identifier, "10.1/c");
    }

    #[test]
    fn test_identifiers_compare_case_insensitively() {
        let merged = merge(vec![
            doc("10.1/ABC", Origin::Crossref),
            doc("10.1/abc", Origin::Unpaywall),
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].origin, Origin::Crossref);
    }

    #[test]
    fn test_empty_identifiers_are_dropped() {
        let merged = merge(vec![
            doc("", Origin::Crossref),
            doc("10.1/a", Origin::Unpaywall),
            doc("", Origin::Unpaywall),
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].identifier, "10.1/a");
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(merge(Vec::new()).is_empty());
    }
}
