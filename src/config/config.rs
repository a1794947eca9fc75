use crate::Result;
use crate::facts::hosting::{Endpoints, RetryPolicy};
use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use core::num::NonZeroU32;
use core::time::Duration;
use serde::Deserialize;
use std::fs;
use std::io;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Configuration file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "profile-banner.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// GitHub account whose statistics are shown
    #[serde(default = "default_username")]
    pub username: String,

    /// Start of the uptime counter
    #[serde(default = "default_birth_date")]
    pub birth_date: NaiveDate,

    /// Assumed lifespan in days
    #[serde(default = "default_lifespan_days")]
    pub lifespan_days: NonZeroU32,

    /// Banner documents to patch
    #[serde(default = "default_documents")]
    pub documents: Vec<Utf8PathBuf>,

    /// Per-request HTTP timeout
    #[serde(default = "default_http_timeout", with = "humantime_serde")]
    pub http_timeout: Duration,

    /// Extra attempts for transient HTTP failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds before the first retry, doubled for every following retry
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound on repository pages read when summing stars
    #[serde(default = "default_max_repo_pages")]
    pub max_repo_pages: u32,

    /// GitHub REST API base URL
    #[serde(default = "default_github_api_url")]
    pub github_api_url: Url,

    /// Badge service endpoint
    #[serde(default = "default_badge_api_url")]
    pub badge_api_url: Url,
}

fn default_username() -> String {
    "pyoneerc".to_string()
}

fn default_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2005, 3, 3).unwrap_or_default()
}

const fn default_lifespan_days() -> NonZeroU32 {
    NonZeroU32::MIN.saturating_add(26_782)
}

fn default_documents() -> Vec<Utf8PathBuf> {
    vec![Utf8PathBuf::from("dark_mode.svg"), Utf8PathBuf::from("light_mode.svg")]
}

const fn default_http_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_backoff_factor() -> f64 {
    0.5
}

const fn default_max_repo_pages() -> u32 {
    10
}

fn default_github_api_url() -> Url {
    Url::parse("https://api.github.com").expect("default GitHub API URL should be valid")
}

fn default_badge_api_url() -> Url {
    Url::parse("https://github-readme-stats.vercel.app/api").expect("default badge service URL should be valid")
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `profile-banner.toml` in the working directory is used if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed. Values are not checked here, call
    /// [`Config::validate`] once command-line overrides have been applied.
    pub fn load(config_path: Option<&Utf8Path>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).with_context(|| format!("reading configuration file '{path}'"))?;
            (path.to_path_buf(), text)
        } else {
            let path = Utf8PathBuf::from(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // No config file found, use defaults
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).with_context(|| format!("reading configuration file '{path}'")),
            }
        };

        toml::from_str(&text).with_context(|| format!("parsing configuration file '{final_path}'"))
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).with_context(|| format!("writing default configuration to '{output_path}'"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is empty or out of range
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            bail!("username must not be empty");
        }

        if self.documents.is_empty() {
            bail!("at least one document must be configured");
        }

        if self.http_timeout.is_zero() {
            bail!("http_timeout must be greater than zero");
        }

        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            bail!("backoff_factor must be a non-negative number, got {}", self.backoff_factor);
        }

        if self.max_repo_pages == 0 {
            bail!("max_repo_pages must be at least 1");
        }

        Ok(())
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.backoff_factor)
    }

    #[must_use]
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            api_url: self.github_api_url.clone(),
            badge_url: self.badge_api_url.clone(),
            timeout: self.http_timeout,
            max_repo_pages: self.max_repo_pages,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
