//! Runtime configuration
//!
//! Loaded from a TOML file at startup. Every field carries a serde default
//! so a missing file, or a sparse one, still yields a working local setup
//! pointed at an unauthenticated cluster on localhost.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub elasticsearch: EsSettings,
    #[serde(default)]
    pub indices: IndexSettings,
    #[serde(default)]
    pub limits: LimitSettings,
    #[serde(default)]
    pub synonyms: SynonymSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub cors: CorsSettings,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors: CorsSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsSettings {
    /// The portal runs on a different origin, so CORS is on by default
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Allowed origins; "*" allows any origin
    #[serde(default = "default_cors_origins")]
    pub origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EsSettings {
    /// Base URL of the Elasticsearch cluster
    #[serde(default = "default_es_url")]
    pub url: String,
    /// Basic auth credentials; ignored when an API key is set
    pub username: Option<String>,
    pub password: Option<String>,
    /// API key, sent as `Authorization: ApiKey ...`; takes precedence over
    /// basic auth
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for EsSettings {
    fn default() -> Self {
        Self {
            url: default_es_url(),
            username: None,
            password: None,
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexSettings {
    #[serde(default = "default_index_sample")]
    pub sample: String,
    #[serde(default = "default_index_population")]
    pub population: String,
    #[serde(default = "default_index_superpopulation")]
    pub superpopulation: String,
    /// The route says data-collection but the index name is plural
    #[serde(default = "default_index_data_collections")]
    pub data_collections: String,
    #[serde(default = "default_index_analysis_group")]
    pub analysis_group: String,
    #[serde(default = "default_index_file")]
    pub file: String,
    #[serde(default = "default_index_sitemap")]
    pub sitemap: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            sample: default_index_sample(),
            population: default_index_population(),
            superpopulation: default_index_superpopulation(),
            data_collections: default_index_data_collections(),
            analysis_group: default_index_analysis_group(),
            file: default_index_file(),
            sitemap: default_index_sitemap(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitSettings {
    /// Cap applied when the portal asks for "all" rows (size -1 or absent).
    /// Must stay at or below the index max_result_window, 10,000 unless
    /// raised on the cluster, or Elasticsearch rejects the request.
    #[serde(default = "default_search_size_cap")]
    pub search_size_cap: i64,
    /// Same cap for TSV downloads, which are allowed to pull more
    #[serde(default = "default_export_size_cap")]
    pub export_size_cap: i64,
    /// Free-text queries shorter than this become match_none; 0 disables
    /// the gate
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            search_size_cap: default_search_size_cap(),
            export_size_cap: default_export_size_cap(),
            min_query_len: default_min_query_len(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SynonymSettings {
    /// How long the analysis-group alias tables stay fresh before the next
    /// search triggers a refetch
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: i64,
    /// Upper bound on reference documents fetched per refresh
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

impl Default for SynonymSettings {
    fn default() -> Self {
        Self {
            refresh_ttl_secs: default_refresh_ttl_secs(),
            fetch_size: default_fetch_size(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8200".to_string()
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:8080".to_string(),
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:8080".to_string(),
    ]
}

fn default_es_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_index_sample() -> String {
    "sample".to_string()
}

fn default_index_population() -> String {
    "population".to_string()
}

fn default_index_superpopulation() -> String {
    "superpopulation".to_string()
}

fn default_index_data_collections() -> String {
    "data_collections".to_string()
}

fn default_index_analysis_group() -> String {
    "analysis_group".to_string()
}

fn default_index_file() -> String {
    "file".to_string()
}

fn default_index_sitemap() -> String {
    "sitemap".to_string()
}

fn default_search_size_cap() -> i64 {
    10_000
}

fn default_export_size_cap() -> i64 {
    100_000
}

fn default_min_query_len() -> usize {
    2
}

fn default_refresh_ttl_secs() -> i64 {
    600
}

fn default_fetch_size() -> usize {
    500
}

impl Settings {
    /// Load config from file path, or create the default one there
    pub fn load_or_create(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            let settings = Settings::default();
            let _ = settings.save(config_path);
            Ok(settings)
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("cannot serialise config: {e}")))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        Ok(())
    }
}
