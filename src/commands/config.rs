use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{
    application::repo_control_args,
    cache::{CacheConfig, MetadataCache},
    runtime::Runtime,
};

/// Command-line overrides for the cache configuration.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    pub config: Option<PathBuf>,
    pub python: Option<PathBuf>,
    pub helper: Option<PathBuf>,
    pub lock_timeout: Option<u64>,
    pub command_timeout: Option<u64>,
    /// Free-form yum options; only repository switches are used
    pub repo_control: Option<String>,
}

impl CacheOptions {
    /// The file configuration with these overrides applied.
    pub fn resolve<R: Runtime>(&self, runtime: &R) -> Result<CacheConfig> {
        let mut config = CacheConfig::load(runtime, self.config.as_deref())?;
        if let Some(python) = &self.python {
            config.python = python.clone();
        }
        if let Some(helper) = &self.helper {
            config.helper = helper.clone();
        }
        if let Some(lock_timeout) = self.lock_timeout {
            config.lock_timeout = lock_timeout;
        }
        if let Some(timeout) = self.command_timeout {
            config.command_timeout_secs = timeout;
        }
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }
}

/// Build a cache for `runtime` configured by `options`.
#[tracing::instrument(skip(runtime))]
pub fn open_cache<R: Runtime>(runtime: R, options: &CacheOptions) -> Result<MetadataCache<R>> {
    let config = options.resolve(&runtime)?;
    let mut cache = MetadataCache::new(runtime, config);
    match options.repo_control.as_deref().and_then(repo_control_args) {
        Some(args) => cache.enable_extra_repo_control(&args),
        None => cache.disable_extra_repo_control(),
    }
    Ok(cache)
}
