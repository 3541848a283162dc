use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub api: Api,
    pub guard: Guard,
    pub session: Session,
    pub http: Http,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Api {
    pub backend: String, // "fake" or "real"
    pub base_url: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Unset means a refresh may take as long as it takes.
    pub refresh_timeout_secs: Option<u64>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Api {
    pub fn refresh_timeout(&self) -> Option<Duration> {
        self.refresh_timeout_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_refresh_path() -> String {
    "/refresh".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct Guard {
    pub unauthenticated_destination: String,
    pub authenticated_destination: String,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub backend: String, // "memory" or "redis"
    pub redis_dsn: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_key_prefix() -> String {
    "tollgate".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
