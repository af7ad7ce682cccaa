//! Configuration management.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Credentials for external services
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Download settings
    #[serde(default)]
    pub downloads: DownloadConfig,

    /// Concurrency and result-count limits
    #[serde(default)]
    pub limits: LimitConfig,

    /// Search filters applied at the sources
    #[serde(default)]
    pub search: SearchConfig,
}

/// Credentials for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Gemini API key for topic decomposition and keyword generation
    #[serde(default)]
    pub gemini: Option<String>,

    /// Contact email; required by Unpaywall, puts Crossref requests in the
    /// polite pool
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            gemini: std::env::var("GEMINI_API_KEY").ok(),
            contact_email: std::env::var("UNPAYWALL_EMAIL").ok(),
        }
    }
}

/// Download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory for downloaded files and the run archive
    #[serde(default = "default_download_dir")]
    pub dir: PathBuf,

    /// Maximum file size for downloads (in MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size_mb: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: default_download_dir(),
            max_file_size_mb: default_max_file_size(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_max_file_size() -> usize {
    100
}

/// Concurrency and result-count limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Concurrent keyword searches
    #[serde(default = "default_concurrent_searches")]
    pub max_concurrent_searches: usize,

    /// Concurrent document downloads
    #[serde(default = "default_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    /// Results requested per keyword from each source
    #[serde(default = "default_results_per_keyword")]
    pub results_per_keyword: usize,

    /// Unique documents downloaded per run; the merged list is cut here
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_concurrent_searches: default_concurrent_searches(),
            max_concurrent_downloads: default_concurrent_downloads(),
            results_per_keyword: default_results_per_keyword(),
            max_documents: default_max_documents(),
        }
    }
}

/// Search filters applied at the sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Earliest publication year to accept (open when unset)
    #[serde(default)]
    pub from_year: Option<u16>,

    /// Latest publication year to accept (open when unset)
    #[serde(default)]
    pub until_year: Option<u16>,
}

fn default_concurrent_searches() -> usize {
    4
}

fn default_concurrent_downloads() -> usize {
    5
}

fn default_results_per_keyword() -> usize {
    20
}

fn default_max_documents() -> usize {
    20
}

/// Load configuration from a file, layered with `OA_HARVESTER_*` env vars
pub fn load_config(path: &PathBuf) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("OA_HARVESTER"))
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.downloads.dir, PathBuf::from("./downloads"));
        assert_eq!(config.downloads.max_file_size_mb, 100);
        assert_eq!(config.limits.max_concurrent_downloads, 5);
        assert_eq!(config.limits.results_per_keyword, 20);
        assert_eq!(config.limits.max_documents, 20);
        assert!(config.search.from_year.is_none());
        assert!(config.search.until_year.is_none());
    }
}
