//! Resolving user-supplied package names.

use anyhow::Result;
use log::{debug, warn};
use serde::Serialize;

use crate::cache::MetadataCache;
use crate::rpm::Capability;
use crate::runtime::Runtime;

/// A package name with the arch split off, when there was one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedName {
    pub name: String,
    pub arch: Option<String>,
}

/// Split `foo.i386` into name and arch.
///
/// `foo.i386` and `foo.beta1` are both valid package names, so the suffix is
/// only taken as an arch when no package is called `foo.i386` and `foo` is
/// known with arch `i386`.
#[tracing::instrument(skip(cache))]
pub fn resolve_name_arch<R: Runtime>(
    cache: &mut MetadataCache<R>,
    package_name: &str,
) -> Result<ResolvedName> {
    if let Some((name, arch)) = package_name.rsplit_once('.') {
        let whole_known = cache.installed_version(package_name, None)?.is_some()
            || cache.available_version(package_name, None)?.is_some();
        let split_known = cache.installed_version(name, Some(arch))?.is_some()
            || cache.available_version(name, Some(arch))?.is_some();

        if !whole_known && split_known {
            debug!("Parsed out arch {}, new package name is {}", arch, name);
            return Ok(ResolvedName {
                name: name.to_string(),
                arch: Some(arch.to_string()),
            });
        }
    }

    Ok(ResolvedName {
        name: package_name.to_string(),
        arch: None,
    })
}

/// The package chosen to satisfy a Provides requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvidesMatch {
    pub name: String,
    /// Version of the chosen package, `None` when the requirement had no
    /// version
    pub version: Option<String>,
    /// nevra of every matching package, chosen one first
    pub candidates: Vec<String>,
}

/// Find the package providing `name` (optionally constrained by `version`,
/// e.g. `>= 2:0.71`).
///
/// When nothing matches the installed Provides, the available Provides are
/// loaded and the lookup retried, unless the caller is only removing.
#[tracing::instrument(skip(cache))]
pub fn resolve_provides<R: Runtime>(
    cache: &mut MetadataCache<R>,
    name: &str,
    version: Option<&str>,
    removing: bool,
) -> Result<Option<ProvidesMatch>> {
    let require = match version {
        Some(version) => format!("{} {}", name, version),
        None => name.to_string(),
    };

    let mut packages = cache.packages_from_require(&require)?;
    if packages.is_empty() && !removing {
        debug!(
            "Couldn't match {} in installed Provides, loading available Provides",
            require
        );
        cache.reload_provides();
        packages = cache.packages_from_require(&require)?;
    }

    let Some(first) = packages.first() else {
        return Ok(None);
    };

    debug!(
        "{}: Unable to match package '{}' but matched {} package(s), selected '{}' version '{}'",
        require,
        name,
        packages.len(),
        first.name(),
        first.evr()
    );

    let mut unique: Vec<String> = packages
        .iter()
        .map(|p| format!("{}-{}", p.name(), p.evr().evr()))
        .collect();
    unique.sort();
    unique.dedup();
    if unique.len() > 1 {
        warn!(
            "Matched multiple Provides for {} but we can only use the first match: {}. \
             Please use a more specific version.",
            require,
            first.name()
        );
    }

    let has_version = !Capability::parse(&require).evr().is_empty();
    Ok(Some(ProvidesMatch {
        name: first.name().to_string(),
        version: has_version.then(|| first.evr().to_string()),
        candidates: packages.iter().map(|p| p.nevra()).collect(),
    }))
}
