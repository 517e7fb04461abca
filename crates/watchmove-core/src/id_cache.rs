use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use watchmove_models::ImdbId;

/// A resolution remembered from an earlier run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedId {
    pub imdb_id: ImdbId,
    pub title: String,
    pub resolved_by: String,
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    entries: BTreeMap<String, CachedId>,
}

/// JSON file of successful resolutions keyed by movie key (`uuid:…` / `title:…`).
///
/// Loaded before the run and written back once afterwards. Failed lookups are
/// never stored, so a later run retries them.
pub struct ResolutionCache {
    path: PathBuf,
    entries: BTreeMap<String, CachedId>,
    dirty: bool,
}

impl ResolutionCache {
    /// Load the cache at `path`; a missing file gives an empty cache.
    ///
    /// An unreadable or corrupt file is copied to `<name>.bak` and ignored.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CacheFile>(&content) {
                Ok(file) => {
                    info!("Loaded ID cache: {} entries from {}", file.entries.len(), path.display());
                    file.entries
                }
                Err(e) => {
                    Self::backup_corrupt(&path, &e.to_string());
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("ID cache file {} does not exist, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                Self::backup_corrupt(&path, &e.to_string());
                BTreeMap::new()
            }
        };

        Self { path, entries, dirty: false }
    }

    fn backup_corrupt(path: &Path, error: &str) {
        let mut backup = path.as_os_str().to_owned();
        backup.push(".bak");
        let backup = PathBuf::from(backup);
        match std::fs::copy(path, &backup) {
            Ok(_) => warn!(
                "ID cache {} is unreadable ({}). Backed it up to {} and starting with an empty cache.",
                path.display(),
                error,
                backup.display()
            ),
            Err(copy_err) => warn!(
                "ID cache {} is unreadable ({}) and could not be backed up ({}). Starting with an empty cache.",
                path.display(),
                error,
                copy_err
            ),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&CachedId> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, entry: CachedId) {
        if self.entries.get(&key) != Some(&entry) {
            self.entries.insert(key, entry);
            self.dirty = true;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the cache if anything changed. Returns whether a write happened.
    pub fn save(&mut self) -> Result<bool> {
        if !self.dirty {
            debug!("ID cache unchanged, not saving");
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory {}", parent.display()))?;
        }

        let file = CacheFile { entries: self.entries.clone() };
        let json = serde_json::to_string_pretty(&file).context("Failed to serialize ID cache")?;

        // Write to a temp file, then rename over the old cache
        let mut temp = self.path.as_os_str().to_owned();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        std::fs::write(&temp, json).with_context(|| format!("Failed to write {}", temp.display()))?;
        std::fs::rename(&temp, &self.path)
            .with_context(|| format!("Failed to replace ID cache {}", self.path.display()))?;

        info!("Saved ID cache: {} entries to {}", self.entries.len(), self.path.display());
        self.dirty = false;
        Ok(true)
    }
}
