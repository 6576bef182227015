//! Runtime settings: defaults, then an optional TOML file, then `MULTIVERSE_*`
//! environment variables.

use std::num::NonZeroUsize;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{MultiverseError, Result};

pub const DEFAULT_API_BASE: &str = "https://rickandmortyapi.com/api";
pub const DEFAULT_CONFIG_FILE: &str = "multiverse";
pub const ENV_PREFIX: &str = "MULTIVERSE";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_base: String,
    pub page_size: usize,
    pub request_timeout_ms: u64,
    pub bind_addr: String,
}

impl Settings {
    /// Reads the file named by `MULTIVERSE_CONFIG` (or `multiverse.toml` next to
    /// the binary, when present) and the environment.
    pub fn load() -> Result<Self> {
        let file = std::env::var(format!("{ENV_PREFIX}_CONFIG")).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Some(&file), true)
    }

    pub fn load_from(file: Option<&str>, with_env: bool) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("api_base", DEFAULT_API_BASE)?
            .set_default("page_size", 20_i64)?
            .set_default("request_timeout_ms", 10_000_i64)?
            .set_default("bind_addr", "127.0.0.1:8080")?;
        if let Some(file) = file {
            builder = builder.add_source(File::with_name(file).required(false));
        }
        if with_env {
            builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        }
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(MultiverseError::Config("page_size must be positive".into()));
        }
        if self.api_base.trim().is_empty() {
            return Err(MultiverseError::Config("api_base must not be empty".into()));
        }
        Ok(())
    }

    pub fn page_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.page_size).unwrap_or(NonZeroUsize::MIN)
    }
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
