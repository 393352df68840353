use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::runtime::Runtime;

/// How the metadata helper is invoked.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Interpreter used to run the helper
    pub python: PathBuf,
    /// Path to `yum-dump.py`
    pub helper: PathBuf,
    /// Seconds the helper waits for the yum lock
    pub lock_timeout: u64,
    /// Seconds before a helper run is killed
    pub command_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            python: PathBuf::from("/usr/bin/python"),
            helper: PathBuf::from("/usr/lib/rpmcache/yum-dump.py"),
            lock_timeout: 30,
            command_timeout_secs: 900,
        }
    }
}

impl CacheConfig {
    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one,
    /// `<config_dir>/rpmcache/config.json` is used when present, and the
    /// defaults otherwise.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path(runtime) {
                Some(path) if runtime.exists(&path) => path,
                _ => {
                    debug!("No configuration file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!("Loading configuration from {:?}", path);
        let content = runtime.read_to_string(&path)?;
        let config: CacheConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {:?}", path))?;
        Ok(config)
    }

    pub fn default_path<R: Runtime>(runtime: &R) -> Option<PathBuf> {
        runtime
            .config_dir()
            .map(|dir| dir.join("rpmcache").join("config.json"))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}
