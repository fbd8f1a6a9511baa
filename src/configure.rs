use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::fmt;

use crate::geocode::adapters::{google, here};

pub const DEFAULT_CONFIG_FILE: &str = "config/geocoder.yaml";
pub const ENV_PREFIX: &str = "GEOCODER";

#[derive(Clone, Deserialize)]
pub struct GeocoderConfig {
    pub google_api_key: Option<String>,
    pub here_api_key: Option<String>,
    pub google_endpoint: String,
    pub here_geocode_endpoint: String,
    pub here_reverse_endpoint: String,
    pub here_reverse_radius_m: u32,
    pub http_timeout_ms: u64,
    pub http_connect_timeout_ms: u64,
    pub log_level: String,
    pub log_to_file: bool,
    pub log_file: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            here_api_key: None,
            google_endpoint: google::DEFAULT_ENDPOINT.to_string(),
            here_geocode_endpoint: here::DEFAULT_GEOCODE_ENDPOINT.to_string(),
            here_reverse_endpoint: here::DEFAULT_REVERSE_ENDPOINT.to_string(),
            here_reverse_radius_m: here::DEFAULT_REVERSE_RADIUS_M,
            http_timeout_ms: 15_000,
            http_connect_timeout_ms: 5_000,
            log_level: "info".to_string(),
            log_to_file: false,
            log_file: "log/geocoder.log".to_string(),
        }
    }
}

// API keys stay out of logs
impl fmt::Debug for GeocoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeocoderConfig")
            .field("google_api_key", &self.google_api_key.as_ref().map(|_| "<set>"))
            .field("here_api_key", &self.here_api_key.as_ref().map(|_| "<set>"))
            .field("google_endpoint", &self.google_endpoint)
            .field("here_geocode_endpoint", &self.here_geocode_endpoint)
            .field("here_reverse_endpoint", &self.here_reverse_endpoint)
            .field("here_reverse_radius_m", &self.here_reverse_radius_m)
            .field("http_timeout_ms", &self.http_timeout_ms)
            .field("http_connect_timeout_ms", &self.http_connect_timeout_ms)
            .field("log_level", &self.log_level)
            .field("log_to_file", &self.log_to_file)
            .field("log_file", &self.log_file)
            .finish()
    }
}

pub fn load_config() -> Result<GeocoderConfig, ConfigError> {
    load_config_from(DEFAULT_CONFIG_FILE)
}

/// Defaults, then the optional YAML file at `path`, then `GEOCODER_*` environment variables
pub fn load_config_from(path: &str) -> Result<GeocoderConfig, ConfigError> {
    let defaults = GeocoderConfig::default();

    let s = Config::builder()
        // Set defaults
        .set_default("google_endpoint", defaults.google_endpoint)?
        .set_default("here_geocode_endpoint", defaults.here_geocode_endpoint)?
        .set_default("here_reverse_endpoint", defaults.here_reverse_endpoint)?
        .set_default("here_reverse_radius_m", i64::from(defaults.here_reverse_radius_m))?
        .set_default("http_timeout_ms", defaults.http_timeout_ms as i64)?
        .set_default("http_connect_timeout_ms", defaults.http_connect_timeout_ms as i64)?
        .set_default("log_level", defaults.log_level)?
        .set_default("log_to_file", defaults.log_to_file)?
        .set_default("log_file", defaults.log_file)?
        // Add configuration from a file, if present
        .add_source(File::with_name(path).required(false))
        // Add configuration from environment variables
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()?;

    s.try_deserialize()
}
