//! Shared utilities: HTTP client, retry policy, and filename handling.

mod http;
mod retry;
mod sanitize;

pub use http::HttpClient;
pub use retry::{api_retry_config, with_retry, RetryConfig, TransientError};
pub use sanitize::{looks_like_pdf, sanitize_stem, stem_for, unique_pdf_names, MIN_PDF_BYTES};
