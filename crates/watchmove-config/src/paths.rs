use anyhow::Result;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory
pub const LOCAL_CONFIG_FILE: &str = "watchmove.toml";

pub struct PathManager {
    config_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("watchmove");

        Ok(Self::with_base(base_dir))
    }

    pub fn with_base(base_dir: PathBuf) -> Self {
        Self { config_dir: base_dir }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// First existing config file: `./watchmove.toml`, then the platform config file
    pub fn discover_config_file(&self, working_dir: &Path) -> Option<PathBuf> {
        [working_dir.join(LOCAL_CONFIG_FILE), self.config_file()]
            .into_iter()
            .find(|candidate| candidate.is_file())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // Without a platform config dir (minimal containers), fall back to the working directory
        Self::new().unwrap_or_else(|_| Self::with_base(PathBuf::from(".watchmove")))
    }
}
