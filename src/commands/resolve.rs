use anyhow::{Result, anyhow};
use log::debug;
use serde::Serialize;
use std::fmt;

use crate::{
    application::{InstallPlan, InstallRequest, plan_install, resolve_name_arch, resolve_provides},
    cache::MetadataCache,
    runtime::Runtime,
};

/// A package argument turned into a concrete package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveReport {
    pub input: String,
    pub name: String,
    pub arch: Option<String>,
    pub version: Option<String>,
    /// Set when the name was matched through Provides
    pub provided_by: Option<Vec<String>>,
}

impl fmt::Display for ResolveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, "-{}", version)?;
        }
        if let Some(arch) = &self.arch {
            write!(f, ".{}", arch)?;
        }
        if self.provided_by.is_some() {
            write!(f, " (provides {})", self.input)?;
        }
        Ok(())
    }
}

/// Resolve `package` (a name, `name.arch`, or a Provides requirement) the
/// way a package provider would before acting on it.
///
/// Literal package names win over Provides matches.
#[tracing::instrument(skip(cache))]
pub fn resolve<R: Runtime>(
    cache: &mut MetadataCache<R>,
    package: &str,
    version: Option<&str>,
    removing: bool,
) -> Result<ResolveReport> {
    let mut name = package.to_string();
    let mut version = version.map(String::from);
    let mut provided_by = None;

    if !cache.package_available(package)?
        && let Some(found) = resolve_provides(cache, package, version.as_deref(), removing)?
    {
        debug!("{} resolved to {} through Provides", package, found.name);
        name = found.name;
        if found.version.is_some() {
            version = found.version;
        }
        provided_by = Some(found.candidates);
    }

    let resolved = resolve_name_arch(cache, &name)?;
    Ok(ResolveReport {
        input: package.to_string(),
        name: resolved.name,
        arch: resolved.arch,
        version,
        provided_by,
    })
}

/// Resolve `package` and plan its installation. Without a version the
/// newest available one is the candidate.
#[tracing::instrument(skip(cache))]
pub fn plan<R: Runtime>(
    cache: &mut MetadataCache<R>,
    package: &str,
    version: Option<&str>,
    allow_downgrade: bool,
) -> Result<InstallPlan> {
    let resolved = resolve(cache, package, version, false)?;

    let version = match resolved.version {
        Some(version) => version,
        None => cache
            .available_version(&resolved.name, resolved.arch.as_deref())?
            .map(|v| v.to_string())
            .ok_or_else(|| anyhow!("No candidate version available for {}", package))?,
    };

    let request = InstallRequest {
        name: resolved.name,
        version,
        arch: resolved.arch,
        allow_downgrade,
    };
    plan_install(cache, &request)
}
