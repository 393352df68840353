//! The refreshable package metadata cache.
//!
//! [`MetadataCache`] holds what the metadata helper (`yum-dump.py`) reported
//! about installed and available packages. Queries refresh whatever scopes
//! are pending before answering, so callers never see stale data after
//! calling one of the `reload*` methods.
//!
//! # Structure
//!
//! - `config` - How the helper is invoked
//! - `dump` - Parsing the helper's output
//! - `scope` - Refresh scopes and the pending set

mod config;
mod dump;
mod scope;

pub use config::CacheConfig;
pub use dump::{DumpLine, OPTION_MARKER, ParsedDump, parse_dump};
pub use scope::{DirtyScopes, RefreshScope};

use anyhow::Result;
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::time::Instant;

use crate::db::PackageIndex;
use crate::error::{CacheError, ParseWarning};
use crate::rpm::{CacheEntry, Capability, Evr, PackageRecord};
use crate::runtime::{CommandLine, Runtime};

pub struct MetadataCache<R: Runtime> {
    runtime: R,
    config: CacheConfig,
    index: PackageIndex,
    dirty: DirtyScopes,
    extra_repo_control: Option<String>,
    allow_multi_install: Vec<String>,
    warnings: Vec<ParseWarning>,
}

impl<R: Runtime> MetadataCache<R> {
    /// Create an empty cache. The first query runs a full refresh.
    pub fn new(runtime: R, config: CacheConfig) -> Self {
        let mut dirty = DirtyScopes::new();
        dirty.insert(RefreshScope::All);
        Self {
            runtime,
            config,
            index: PackageIndex::new(),
            dirty,
            extra_repo_control: None,
            allow_multi_install: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Current contents, without refreshing.
    pub fn index(&self) -> &PackageIndex {
        &self.index
    }

    /// Scopes waiting for the next refresh.
    pub fn pending(&self) -> DirtyScopes {
        self.dirty
    }

    /// Lines the most recent refresh could not parse.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Run the helper for every pending scope.
    ///
    /// A failed run leaves the index and the pending scopes as they were.
    #[tracing::instrument(skip(self))]
    pub fn refresh(&mut self) -> Result<()> {
        while let Some(scope) = self.dirty.next_pending() {
            self.refresh_scope(scope)?;
            self.dirty.mark_refreshed(scope);
        }
        Ok(())
    }

    /// The helper invocation for `scope`.
    pub fn command_line(&self, scope: RefreshScope) -> CommandLine {
        let mut args = vec![self.config.helper.to_string_lossy().into_owned()];
        args.extend(scope.flags().iter().map(|flag| flag.to_string()));
        if let Some(extra) = &self.extra_repo_control {
            args.extend(extra.split_whitespace().map(String::from));
        }
        args.push("--yum-lock-timeout".to_string());
        args.push(self.config.lock_timeout.to_string());
        CommandLine::new(&self.config.python, args)
    }

    fn refresh_scope(&mut self, scope: RefreshScope) -> Result<()> {
        let command = self.command_line(scope);
        let started = Instant::now();
        info!("Refreshing {} package metadata", scope);

        let output = self
            .runtime
            .run_command(&command, self.config.command_timeout())?;
        if !output.success() {
            return Err(CacheError::Metadata {
                command: command.to_string(),
                status: output.status,
                stderr: output.stderr,
            }
            .into());
        }

        if output.stdout.trim().is_empty() {
            warn!("no output from yum-dump.py ({})", command);
        }
        let parsed = parse_dump(&output.stdout);
        for warning in &parsed.warnings {
            warn!("{}", warning);
        }

        match scope {
            RefreshScope::Installed => self.index.clear_installed(),
            RefreshScope::All => self.index.clear(),
            RefreshScope::Provides => {}
        }
        self.index.extend(parsed.entries);
        if let Some(names) = parsed.allow_multi_install {
            self.allow_multi_install = names;
        }
        self.warnings = parsed.warnings;

        debug!(
            "Rebuilt {} package cache in {:.2}s: {} packages, {} installed, {} available",
            scope,
            started.elapsed().as_secs_f64(),
            self.index.len(),
            self.index.installed_count(),
            self.index.available_count()
        );
        Ok(())
    }

    /// Version of the newest installed `name`, optionally of one arch.
    pub fn installed_version(&mut self, name: &str, arch: Option<&str>) -> Result<Option<Evr>> {
        self.refresh()?;
        Ok(self
            .find(name, arch, |entry| entry.installed)
            .map(|entry| entry.package.evr().clone()))
    }

    /// Version of the newest available `name`, optionally of one arch.
    pub fn available_version(&mut self, name: &str, arch: Option<&str>) -> Result<Option<Evr>> {
        self.refresh()?;
        Ok(self
            .find(name, arch, |entry| entry.available)
            .map(|entry| entry.package.evr().clone()))
    }

    /// Whether `version` of `name` can be installed from a repository.
    pub fn version_available(
        &mut self,
        name: &str,
        version: &str,
        arch: Option<&str>,
    ) -> Result<bool> {
        self.refresh()?;
        Ok(self.find_version(name, version, arch).is_some())
    }

    /// Repository offering `version` of `name`.
    pub fn package_repository(
        &mut self,
        name: &str,
        version: &str,
        arch: Option<&str>,
    ) -> Result<Option<String>> {
        self.refresh()?;
        Ok(self
            .find_version(name, version, arch)
            .and_then(|entry| entry.repo_id.clone()))
    }

    /// Whether a package is known, by name or as `name.arch`.
    ///
    /// A dotted suffix only counts as an arch when the index holds `name`
    /// with that arch; `znc-test.beta1` is a package name in its own right.
    pub fn package_available(&mut self, name: &str) -> Result<bool> {
        self.refresh()?;
        if !self.index.lookup(name).is_empty() {
            return Ok(true);
        }
        if let Some((base, arch)) = name.rsplit_once('.') {
            return Ok(self
                .index
                .lookup(base)
                .iter()
                .any(|entry| entry.package.arch() == arch));
        }
        Ok(false)
    }

    /// Packages providing `capability`, e.g. `libz.so.1` or `mochiweb >= 1.4`.
    pub fn packages_from_require(&mut self, capability: &str) -> Result<Vec<PackageRecord>> {
        self.refresh()?;
        let require = Capability::parse(capability);
        Ok(self
            .index
            .whatprovides(&require)
            .into_iter()
            .map(|entry| entry.package.clone())
            .collect())
    }

    /// Packages that may be installed in several versions side by side.
    pub fn allow_multi_install(&mut self) -> Result<&[String]> {
        self.refresh()?;
        Ok(&self.allow_multi_install)
    }

    pub fn extra_repo_control(&self) -> Option<&str> {
        self.extra_repo_control.as_deref()
    }

    /// Pass repository switches such as `--enablerepo=foo` to the helper.
    /// A full reload is scheduled only when the switches change.
    pub fn enable_extra_repo_control(&mut self, args: &str) {
        if self.extra_repo_control.as_deref() != Some(args) {
            debug!("Enabling extra repo control: {}", args);
            self.extra_repo_control = Some(args.to_string());
            self.reload();
        }
    }

    pub fn disable_extra_repo_control(&mut self) {
        if self.extra_repo_control.take().is_some() {
            debug!("Disabling extra repo control");
            self.reload();
        }
    }

    /// Drop all cached packages. Pending scopes are left untouched.
    pub fn reset(&mut self) {
        self.index.clear();
        self.allow_multi_install.clear();
        self.warnings.clear();
    }

    pub fn reload(&mut self) {
        self.dirty.insert(RefreshScope::All);
    }

    pub fn reload_installed(&mut self) {
        self.dirty.insert(RefreshScope::Installed);
    }

    pub fn reload_provides(&mut self) {
        self.dirty.insert(RefreshScope::Provides);
    }

    fn find(
        &self,
        name: &str,
        arch: Option<&str>,
        state: impl Fn(&CacheEntry) -> bool,
    ) -> Option<&CacheEntry> {
        self.index
            .lookup(name)
            .into_iter()
            .filter(|entry| state(*entry))
            .find(|entry| arch.is_none_or(|arch| entry.package.arch() == arch))
    }

    fn find_version(&self, name: &str, version: &str, arch: Option<&str>) -> Option<&CacheEntry> {
        let wanted = Evr::parse(version);
        self.index
            .lookup(name)
            .into_iter()
            .filter(|entry| entry.available)
            .filter(|entry| arch.is_none_or(|arch| entry.package.arch() == arch))
            .find(|entry| entry.package.evr().partial_compare(&wanted) == Ordering::Equal)
    }
}
