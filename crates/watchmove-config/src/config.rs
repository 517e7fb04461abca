use crate::paths::PathManager;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use watchmove_models::{AmbiguityPolicy, PayloadLayout};

/// Overrides `[trakt] client_id` when set and non-empty
pub const TRAKT_CLIENT_ID_ENV: &str = "TRAKT_CLIENT_ID";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub files: FilesConfig,
    pub lookup: LookupConfig,
    pub trakt: TraktConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Resolution cache; caching is off when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("tracking-prod-records.csv"),
            output: PathBuf::from("import_data_for_trakt.json"),
            cache: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Read ids from TV Time movie pages
    pub tvtime: bool,
    /// Search the IMDb find page by title
    pub imdb_search: bool,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Pause between lookup requests
    pub request_delay_ms: u64,
    pub ambiguity: AmbiguityPolicy,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            tvtime: true,
            imdb_search: true,
            timeout_secs: 10,
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            request_delay_ms: 0,
            ambiguity: AmbiguityPolicy::Skip,
        }
    }
}

impl LookupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraktConfig {
    /// API client id; title search through Trakt is enabled when set
    pub client_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub layout: PayloadLayout,
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load the effective file configuration.
    ///
    /// An explicit path must exist. Otherwise `./watchmove.toml` and the
    /// platform config file are tried, and built-in defaults are used when
    /// neither exists. Returns the config and the file it came from.
    pub fn discover(
        explicit: Option<&Path>,
        paths: &PathManager,
        working_dir: &Path,
    ) -> anyhow::Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(anyhow!("Config file not found: {}", path.display()));
            }
            return Ok((Self::load_from_file(path)?, Some(path.to_path_buf())));
        }

        match paths.discover_config_file(working_dir) {
            Some(path) => {
                debug!("Using config file {}", path.display());
                Ok((Self::load_from_file(&path)?, Some(path)))
            }
            None => {
                debug!("No config file found, using defaults");
                Ok((Self::default(), None))
            }
        }
    }

    /// Apply environment overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(client_id) = lookup(TRAKT_CLIENT_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.trakt.client_id = client_id.trim().to_string();
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.lookup.timeout_secs == 0 {
            return Err(anyhow!("lookup.timeout_secs must be greater than zero"));
        }
        if self.lookup.max_delay_ms < self.lookup.base_delay_ms {
            return Err(anyhow!(
                "lookup.max_delay_ms ({}) must not be smaller than lookup.base_delay_ms ({})",
                self.lookup.max_delay_ms,
                self.lookup.base_delay_ms
            ));
        }
        if self.files.input == self.files.output {
            return Err(anyhow!(
                "Input and output file are the same ({}); refusing to overwrite the export",
                self.files.input.display()
            ));
        }
        if self.files.cache.as_ref().is_some_and(|c| *c == self.files.input || *c == self.files.output) {
            return Err(anyhow!("files.cache must differ from the input and output files"));
        }
        Ok(())
    }

    pub fn is_trakt_configured(&self) -> bool {
        let id = self.trakt.client_id.trim();
        !id.is_empty() && id != "YOUR_CLIENT_ID"
    }

    /// Names of the lookup providers this configuration enables, in priority order
    pub fn enabled_providers(&self) -> Vec<&'static str> {
        let mut providers = Vec::new();
        if self.lookup.tvtime {
            providers.push("tvtime");
        }
        if self.is_trakt_configured() {
            providers.push("trakt");
        }
        if self.lookup.imdb_search {
            providers.push("imdb");
        }
        providers
    }
}
