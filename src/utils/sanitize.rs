//! Filename derivation and downloaded-file validation.
//!
//! Archive entry names are derived from document titles (falling back to the
//! identifier), so the same characters must be rejected on every platform and
//! collisions must resolve the same way on every run.

/// Maximum length of a derived file stem, in characters
const MAX_STEM_LEN: usize = 120;

/// Downloads smaller than this are rejected as truncated or bogus
pub const MIN_PDF_BYTES: usize = 1024;

/// Sanitize a title or identifier into a safe file stem.
///
/// Replaces path separators and shell-hostile characters with underscores,
/// collapses whitespace, and truncates. Returns `None` when nothing printable
/// survives.
pub fn sanitize_stem(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    let stem = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_STEM_LEN)
        .collect::<String>()
        .trim()
        .to_string();

    if stem.is_empty() {
        None
    } else {
        Some(stem)
    }
}

/// Derive the file stem for a document: title first, identifier as fallback.
pub fn stem_for(title: &str, identifier: &str) -> String {
    sanitize_stem(title)
        .or_else(|| sanitize_stem(identifier))
        .unwrap_or_else(|| "document".to_string())
}

/// Assign a unique `.pdf` file name for each stem, in input order.
///
/// On collision a numeric suffix is appended (`name (2).pdf`, `name (3).pdf`,
/// ...). A suffixed name can itself collide with a stem that literally ends
/// in ` (N)`, so every assigned name is reserved and the counter keeps
/// bumping until the candidate is genuinely unused. The mapping is
/// deterministic for a given input sequence.
pub fn unique_pdf_names(stems: &[String]) -> Vec<String> {
    let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut used: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut names = Vec::with_capacity(stems.len());

    for stem in stems {
        let key = stem.to_lowercase();
        let mut attempt = counts.get(&key).copied().unwrap_or(0) + 1;

        let name = loop {
            let candidate = if attempt == 1 {
                format!("{}.pdf", stem)
            } else {
                format!("{} ({}).pdf", stem, attempt)
            };
            if used.insert(candidate.to_lowercase()) {
                break candidate;
            }
            attempt += 1;
        };

        counts.insert(key, attempt);
        names.push(name);
    }

    names
}

/// Check whether downloaded bytes look like a genuine PDF.
///
/// Landing pages and error bodies served with a 200 are the common failure
/// mode, so the magic header and a minimum size are both required.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.len() >= MIN_PDF_BYTES && bytes.starts_with(b"%PDF")
}
