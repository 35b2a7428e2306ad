//! Configuration management.

mod file_config;

pub use file_config::{find_config_file, load_config, ConfigFileError, CONFIG_FILE_NAME};

use serde::{Deserialize, Serialize};

use crate::models::DEFAULT_PAGE_SIZE;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "RESEARCH_AGGREGATOR";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Pipeline settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Outbound HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Source selection
    #[serde(default)]
    pub sources: SourcesConfig,

    /// API keys and contact details for upstream services
    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the server binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Results per page returned to callers
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Records requested from each source
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_fetch_limit() -> usize {
    50
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout for a single upstream call
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connection timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// User agent sent upstream
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Source selection
///
/// `disabled` always wins. When `enabled` is non-empty only those ids are used.
/// `RESEARCH_AGGREGATOR_ENABLED_SOURCES` and `RESEARCH_AGGREGATOR_DISABLED_SOURCES`
/// (comma-separated) extend the lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub enabled: Vec<String>,

    #[serde(default)]
    pub disabled: Vec<String>,
}

impl SourcesConfig {
    /// Whether the source with this id should be registered
    pub fn is_enabled(&self, id: &str) -> bool {
        let disabled = merge_env_list(&self.disabled, "DISABLED_SOURCES");
        if disabled.iter().any(|d| d.eq_ignore_ascii_case(id)) {
            return false;
        }

        let enabled = merge_env_list(&self.enabled, "ENABLED_SOURCES");
        enabled.is_empty() || enabled.iter().any(|e| e.eq_ignore_ascii_case(id))
    }
}

fn merge_env_list(configured: &[String], suffix: &str) -> Vec<String> {
    let mut list: Vec<String> = configured
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if let Ok(value) = std::env::var(format!("{}_{}", ENV_PREFIX, suffix)) {
        list.extend(
            value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        );
    }

    list
}

/// API keys for external services
///
/// Each accessor falls back to a well-known environment variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Semantic Scholar API key (optional, for higher rate limits)
    #[serde(default)]
    pub semantic_scholar: Option<String>,

    /// NCBI E-utilities API key (optional)
    #[serde(default)]
    pub ncbi: Option<String>,

    /// Contact address for Crossref/OpenAlex polite pools
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl ApiKeys {
    pub fn semantic_scholar_key(&self) -> Option<String> {
        non_empty(self.semantic_scholar.clone())
            .or_else(|| non_empty(std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok()))
    }

    pub fn ncbi_key(&self) -> Option<String> {
        non_empty(self.ncbi.clone()).or_else(|| non_empty(std::env::var("NCBI_API_KEY").ok()))
    }

    pub fn contact_email(&self) -> Option<String> {
        non_empty(self.contact_email.clone())
            .or_else(|| non_empty(std::env::var(format!("{}_EMAIL", ENV_PREFIX)).ok()))
    }
}

impl Config {
    /// Copy with API keys masked, for display
    pub fn redacted(&self) -> Config {
        let mut config = self.clone();
        config.api_keys.semantic_scholar = mask_secret(config.api_keys.semantic_scholar);
        config.api_keys.ncbi = mask_secret(config.api_keys.ncbi);
        config
    }
}

/// Replace a non-empty secret with asterisks, keeping the last four characters of long values
fn mask_secret(value: Option<String>) -> Option<String> {
    let value = non_empty(value)?;
    let count = value.chars().count();
    if count <= 8 {
        return Some("********".to_string());
    }
    let tail: String = value.chars().skip(count - 4).collect();
    Some(format!("********{}", tail))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
