//! Install planning - decides whether and how a requested version is installed.

use std::cmp::Ordering;
use std::fmt;

use anyhow::{Result, bail};
use log::{debug, info};
use serde::Serialize;

use crate::cache::MetadataCache;
use crate::rpm::Evr;
use crate::runtime::Runtime;

/// What the caller wants installed.
#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    pub name: String,
    /// `version-release`, e.g. `1.84-10.fc6`
    pub version: String,
    pub arch: Option<String>,
    /// Permit replacing a newer installed version
    pub allow_downgrade: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMethod {
    Install,
    Downgrade,
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallMethod::Install => f.write_str("install"),
            InstallMethod::Downgrade => f.write_str("downgrade"),
        }
    }
}

/// The outcome of [`plan_install`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InstallPlan {
    /// The requested version is already installed
    UpToDate { name: String, version: Evr },
    Change {
        method: InstallMethod,
        name: String,
        version: Evr,
        arch: Option<String>,
        /// Installed version being replaced
        current: Option<Evr>,
        repository: Option<String>,
    },
}

impl fmt::Display for InstallPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallPlan::UpToDate { name, version } => {
                write!(f, "{}-{} is already installed", name, version)
            }
            InstallPlan::Change {
                method,
                name,
                version,
                arch,
                repository,
                ..
            } => {
                write!(f, "{} {}-{}", method, name, version)?;
                if let Some(arch) = arch {
                    write!(f, ".{}", arch)?;
                }
                if let Some(repository) = repository {
                    write!(f, " from {} repository", repository)?;
                }
                Ok(())
            }
        }
    }
}

/// Decide how to bring `request` about.
///
/// Fails when the version is not available, and when a newer version is
/// installed unless downgrades are allowed. Packages that may be installed
/// side by side (e.g. kernels) never count as downgrades.
#[tracing::instrument(skip(cache))]
pub fn plan_install<R: Runtime>(
    cache: &mut MetadataCache<R>,
    request: &InstallRequest,
) -> Result<InstallPlan> {
    let name = request.name.as_str();
    let arch = request.arch.as_deref();

    if !cache.version_available(name, &request.version, arch)? {
        bail!(
            "Version {} of {} not found. Did you specify both version and release? \
             (version-release, e.g. 1.84-10.fc6)",
            request.version,
            name
        );
    }

    let wanted = Evr::parse(&request.version);
    let current = cache.installed_version(name, arch)?;
    let multi_install = cache.allow_multi_install()?.iter().any(|n| n == name);

    let mut method = InstallMethod::Install;
    if let Some(current) = &current {
        if current.partial_compare(&wanted) == Ordering::Equal {
            debug!("{}-{} is already installed", name, current);
            return Ok(InstallPlan::UpToDate {
                name: name.to_string(),
                version: current.clone(),
            });
        }

        if !multi_install && current.partial_compare(&wanted) == Ordering::Greater {
            if !request.allow_downgrade {
                bail!(
                    "Installed package {}-{} is newer than candidate package {}-{}",
                    name,
                    current,
                    name,
                    request.version
                );
            }
            method = InstallMethod::Downgrade;
        }
    }

    let repository = cache.package_repository(name, &request.version, arch)?;
    let plan = InstallPlan::Change {
        method,
        name: name.to_string(),
        version: wanted,
        arch: request.arch.clone(),
        current,
        repository,
    };
    info!("{}", plan);
    Ok(plan)
}
