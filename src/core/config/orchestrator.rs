use crate::core::config::data::Config;
use crate::core::config::io::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::SystemTime;
use tracing::debug;

#[derive(Default)]
struct ConfigCacheState {
    config: Option<Config>,
    modified: Option<SystemTime>,
}

/// Caches the parsed config file and reloads it whenever the file's mtime
/// changes, so edits made by another process are picked up.
pub struct ConfigOrchestrator {
    path: PathBuf,
    state: Mutex<ConfigCacheState>,
}

static CONFIG_ORCHESTRATOR: LazyLock<ConfigOrchestrator> =
    LazyLock::new(|| ConfigOrchestrator::new(Config::get_config_path()));

impl ConfigOrchestrator {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: Mutex::new(ConfigCacheState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_with_cache(&self) -> Result<Config, ConfigError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Self::refresh(&self.path, &mut state)?;
        Ok(state.config.clone().unwrap_or_default())
    }

    /// Applies `mutator` to the current config and saves the result. Nothing
    /// is written if the mutator fails.
    pub fn mutate<F, T, E>(&self, mutator: F) -> Result<T, E>
    where
        F: FnOnce(&mut Config) -> Result<T, E>,
        E: From<ConfigError>,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Self::refresh(&self.path, &mut state)?;

        let mut working = state.config.clone().unwrap_or_default();
        let result = mutator(&mut working)?;
        working.save_to_path(&self.path)?;
        state.modified = Self::modified_time(&self.path);
        state.config = Some(working);
        Ok(result)
    }

    fn refresh(path: &Path, state: &mut ConfigCacheState) -> Result<(), ConfigError> {
        let disk_modified = Self::modified_time(path);
        if state.config.is_none() || state.modified != disk_modified {
            debug!(path = %path.display(), "loading config");
            state.config = Some(Config::load_from_path(path)?);
            state.modified = disk_modified;
        }
        Ok(())
    }

    fn modified_time(path: &Path) -> Option<SystemTime> {
        fs::metadata(path).ok()?.modified().ok()
    }
}

impl Config {
    /// Loads the user's config file through the process-wide cache.
    pub fn load() -> Result<Config, ConfigError> {
        CONFIG_ORCHESTRATOR.load_with_cache()
    }

    pub fn mutate<F, T, E>(mutator: F) -> Result<T, E>
    where
        F: FnOnce(&mut Config) -> Result<T, E>,
        E: From<ConfigError>,
    {
        CONFIG_ORCHESTRATOR.mutate(mutator)
    }
}
