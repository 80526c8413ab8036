use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::SecretString;

pub const DEFAULT_BROKERAGE_NAME: &str = "Partnership";
pub const DEFAULT_SCAN_DEADLINE_SECS: u64 = 600;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent: listings, sync runs and translations are kept in memory
    pub database_url: Option<String>,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub spark_api_url: String,
    pub spark_access_token: Option<SecretString>,
    /// `ListAgentKey` of the site's agent
    pub agent_key: Option<String>,
    /// Office-name substring identifying the brokerage's listings
    pub brokerage_name: String,
    pub sync_api_secret: Option<SecretString>,
    pub scan_deadline: Duration,
    /// Cron expression for automatic syncs
    pub sync_cron: Option<String>,
    pub deepl_api_key: Option<SecretString>,
    pub deepl_api_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let scan_deadline_secs: u64 = env::var("SYNC_SCAN_DEADLINE_SECS")
            .unwrap_or_else(|_| DEFAULT_SCAN_DEADLINE_SECS.to_string())
            .parse()
            .context("SYNC_SCAN_DEADLINE_SECS must be a whole number of seconds")?;

        Ok(Self {
            database_url: non_empty_var("DATABASE_URL"),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|s| parse_origins(&s))
                .unwrap_or_default(),
            spark_api_url: non_empty_var("SPARK_API_URL")
                .unwrap_or_else(|| reso_client::DEFAULT_BASE_URL.to_string()),
            spark_access_token: non_empty_var("SPARK_ACCESS_TOKEN").map(SecretString::from),
            agent_key: non_empty_var("AGENT_KEY"),
            brokerage_name: non_empty_var("BROKERAGE_NAME")
                .unwrap_or_else(|| DEFAULT_BROKERAGE_NAME.to_string()),
            sync_api_secret: non_empty_var("SYNC_API_SECRET").map(SecretString::from),
            scan_deadline: Duration::from_secs(scan_deadline_secs),
            sync_cron: non_empty_var("SYNC_CRON"),
            deepl_api_key: non_empty_var("DEEPL_API_KEY").map(SecretString::from),
            deepl_api_url: non_empty_var("DEEPL_API_URL")
                .unwrap_or_else(|| deepl_client::DEFAULT_API_URL.to_string()),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Comma-separated origins; empty or `*` means any origin.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .map(str::to_string)
        .collect()
}
