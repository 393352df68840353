//! Package records as reported by the metadata dump.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::dependency::{Capability, Comparator};
use super::version::Evr;

/// A package identity plus the capabilities it provides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageRecord {
    name: String,
    evr: Evr,
    arch: String,
    provides: Vec<Capability>,
}

impl PackageRecord {
    /// Create a record. A package always provides itself, so the
    /// `name = evr` capability is added when it is not already listed.
    pub fn new(name: &str, evr: Evr, arch: &str, provides: Vec<Capability>) -> Self {
        let mut provides = provides;
        let provides_self = provides
            .iter()
            .any(|p| p.name() == name && p.comparator() == Comparator::Eq && p.evr() == &evr);
        if !provides_self {
            provides.push(Capability::new(name, evr.clone(), Comparator::Eq));
        }

        Self {
            name: name.to_string(),
            evr,
            arch: arch.to_string(),
            provides,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evr(&self) -> &Evr {
        &self.evr
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn provides(&self) -> &[Capability] {
        &self.provides
    }

    /// `name-epoch:version-release.arch`, the unique identity of a package.
    pub fn nevra(&self) -> String {
        format!("{}-{}.{}", self.name, self.evr.evr(), self.arch)
    }

    /// Order by name, then full EVR, then arch.
    pub fn compare(&self, other: &PackageRecord) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.evr.compare(&other.evr))
            .then_with(|| self.arch.cmp(&other.arch))
    }

    pub(crate) fn add_provide(&mut self, provide: Capability) -> bool {
        if self.provides.contains(&provide) {
            return false;
        }
        self.provides.push(provide);
        true
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nevra())
    }
}

/// Where a package was seen, from the dump's single-character type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    /// `i`: installed only
    Installed,
    /// `a`: available from a repository only
    Available,
    /// `r`: installed and re-installable from a repository
    Both,
}

impl PackageState {
    pub fn installed(self) -> bool {
        matches!(self, PackageState::Installed | PackageState::Both)
    }

    pub fn available(self) -> bool {
        matches!(self, PackageState::Available | PackageState::Both)
    }
}

impl FromStr for PackageState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "i" => Ok(PackageState::Installed),
            "a" => Ok(PackageState::Available),
            "r" => Ok(PackageState::Both),
            _ => anyhow::bail!("Unknown package type '{}'. Expected i, a or r.", s),
        }
    }
}

/// A package as held by the cache, with its installed/available state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub package: PackageRecord,
    pub installed: bool,
    pub available: bool,
    pub repo_id: Option<String>,
}

impl CacheEntry {
    pub fn new(package: PackageRecord, state: PackageState, repo_id: Option<&str>) -> Self {
        Self {
            package,
            installed: state.installed(),
            available: state.available(),
            repo_id: repo_id.map(String::from),
        }
    }

    /// Entries that are neither installed nor available are dropped.
    pub fn is_retained(&self) -> bool {
        self.installed || self.available
    }
}
