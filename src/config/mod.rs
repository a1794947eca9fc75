#[expect(clippy::module_inception, reason = "I like it this way")]
mod config;

pub use config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_TOML};
