use anyhow::Result;
use serde::Serialize;
use std::fmt;

use crate::{cache::MetadataCache, rpm::Evr, runtime::Runtime};

/// Installed or available version of a package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionReport {
    pub name: String,
    pub arch: Option<String>,
    pub version: Option<String>,
}

impl VersionReport {
    fn new(name: &str, arch: Option<&str>, version: Option<Evr>) -> Self {
        Self {
            name: name.to_string(),
            arch: arch.map(String::from),
            version: version.map(|v| v.to_string()),
        }
    }
}

impl fmt::Display for VersionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} {}", self.name, version),
            None => write!(f, "{} (none)", self.name),
        }
    }
}

#[tracing::instrument(skip(cache))]
pub fn installed<R: Runtime>(
    cache: &mut MetadataCache<R>,
    name: &str,
    arch: Option<&str>,
) -> Result<VersionReport> {
    let version = cache.installed_version(name, arch)?;
    Ok(VersionReport::new(name, arch, version))
}

#[tracing::instrument(skip(cache))]
pub fn available<R: Runtime>(
    cache: &mut MetadataCache<R>,
    name: &str,
    arch: Option<&str>,
) -> Result<VersionReport> {
    let version = cache.available_version(name, arch)?;
    Ok(VersionReport::new(name, arch, version))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryReport {
    pub name: String,
    pub version: String,
    pub arch: Option<String>,
    pub repository: Option<String>,
}

impl fmt::Display for RepositoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repository {
            Some(repo) => write!(f, "{}", repo),
            None => write!(f, "{}-{} is not available", self.name, self.version),
        }
    }
}

#[tracing::instrument(skip(cache))]
pub fn repository<R: Runtime>(
    cache: &mut MetadataCache<R>,
    name: &str,
    version: &str,
    arch: Option<&str>,
) -> Result<RepositoryReport> {
    let repository = cache.package_repository(name, version, arch)?;
    Ok(RepositoryReport {
        name: name.to_string(),
        version: version.to_string(),
        arch: arch.map(String::from),
        repository,
    })
}

/// Whether a package, and optionally one version of it, is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    pub name: String,
    pub known: bool,
    pub version: Option<String>,
    pub version_available: Option<bool>,
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known = if self.known { "known" } else { "unknown" };
        write!(f, "{}: {}", self.name, known)?;
        if let (Some(version), Some(available)) = (&self.version, self.version_available) {
            let state = if available { "available" } else { "not available" };
            write!(f, ", {} {}", version, state)?;
        }
        Ok(())
    }
}

#[tracing::instrument(skip(cache))]
pub fn check<R: Runtime>(
    cache: &mut MetadataCache<R>,
    name: &str,
    version: Option<&str>,
    arch: Option<&str>,
) -> Result<CheckReport> {
    let known = cache.package_available(name)?;
    let version_available = match version {
        Some(version) => Some(cache.version_available(name, version, arch)?),
        None => None,
    };
    Ok(CheckReport {
        name: name.to_string(),
        known,
        version: version.map(String::from),
        version_available,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provider {
    pub nevra: String,
    pub installed: bool,
    pub available: bool,
}

/// Packages providing a capability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvidersReport {
    pub capability: String,
    pub packages: Vec<Provider>,
}

impl fmt::Display for ProvidersReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.packages.is_empty() {
            return write!(f, "No package provides {}", self.capability);
        }
        for (i, package) in self.packages.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let state = match (package.installed, package.available) {
                (true, true) => "installed, available",
                (true, false) => "installed",
                _ => "available",
            };
            write!(f, "{} ({})", package.nevra, state)?;
        }
        Ok(())
    }
}

#[tracing::instrument(skip(cache))]
pub fn whatprovides<R: Runtime>(
    cache: &mut MetadataCache<R>,
    capability: &str,
) -> Result<ProvidersReport> {
    let packages = cache
        .packages_from_require(capability)?
        .into_iter()
        .map(|package| {
            let nevra = package.nevra();
            Provider {
                installed: cache.index().is_installed(&nevra),
                available: cache.index().is_available(&nevra),
                nevra,
            }
        })
        .collect();

    Ok(ProvidersReport {
        capability: capability.to_string(),
        packages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{STDOUT_GOOD, fixture_cache};

    #[test]
    fn test_installed_and_available() {
        let mut cache = fixture_cache(STDOUT_GOOD);

        let report = installed(&mut cache, "zip", None).unwrap();
        assert_eq!(report.to_string(), "zip 2.31-2.el5");

        let report = installed(&mut cache, "znc", None).unwrap();
        assert_eq!(report.version, None);
        assert_eq!(report.to_string(), "znc (none)");

        let report = available(&mut cache, "znc-devel", Some("i386")).unwrap();
        assert_eq!(report.version.as_deref(), Some("0.098-1.el5"));
        assert_eq!(report.arch.as_deref(), Some("i386"));
    }

    #[test]
    fn test_repository() {
        let mut cache = fixture_cache(STDOUT_GOOD);
        let report = repository(&mut cache, "zlib-devel", "1.2.3-3", Some("i386")).unwrap();
        assert_eq!(report.to_string(), "extras");

        let report = repository(&mut cache, "zlib-devel", "9", None).unwrap();
        assert_eq!(report.repository, None);
        assert_eq!(report.to_string(), "zlib-devel-9 is not available");
    }

    #[test]
    fn test_check() {
        let mut cache = fixture_cache(STDOUT_GOOD);
        let report = check(&mut cache, "zisofs-tools", Some("1.0.6-3.2.2"), None).unwrap();
        assert!(report.known);
        assert_eq!(report.version_available, Some(true));
        assert_eq!(report.to_string(), "zisofs-tools: known, 1.0.6-3.2.2 available");

        let report = check(&mut cache, "moo.i386", None, None).unwrap();
        assert!(!report.known);
        assert_eq!(report.version_available, None);
        assert_eq!(report.to_string(), "moo.i386: unknown");
    }

    #[test]
    fn test_whatprovides() {
        let mut cache = fixture_cache(STDOUT_GOOD);
        let report = whatprovides(&mut cache, "libz.so.1()(64bit)").unwrap();
        assert_eq!(
            report.packages,
            [Provider {
                nevra: "zlib-0:1.2.3-3.x86_64".to_string(),
                installed: true,
                available: true,
            }]
        );
        assert_eq!(report.to_string(), "zlib-0:1.2.3-3.x86_64 (installed, available)");

        let report = whatprovides(&mut cache, "nothing").unwrap();
        assert_eq!(report.to_string(), "No package provides nothing");
    }
}
