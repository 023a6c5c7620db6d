use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ActlogConfig {
    pub service: ServiceConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub socket_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Connection settings for the search cluster holding the fleet action indices.
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Takes precedence over basic auth when non-empty.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_actions_index")]
    pub actions_index: String,
    #[serde(default = "default_results_index")]
    pub results_index: String,
    /// Value of the `X-elastic-product-origin` header sent with every query.
    #[serde(default = "default_product_origin")]
    pub product_origin: String,
}

impl SearchConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
            actions_index: default_actions_index(),
            results_index: default_results_index(),
            product_origin: default_product_origin(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8767,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_actions_index() -> String {
    ".fleet-actions".to_string()
}

fn default_results_index() -> String {
    ".fleet-actions-results".to_string()
}

fn default_product_origin() -> String {
    "fleet".to_string()
}

impl ActlogConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        s.try_deserialize()
    }
}
