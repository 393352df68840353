//! RPM data types
//!
//! This module provides the value types used to reason about RPM packages:
//! version comparison, capabilities (provides/requires) and package records.

mod dependency;
mod package;
mod version;

pub use dependency::{Capability, Comparator};
pub use package::{CacheEntry, PackageRecord, PackageState};
pub use version::{Evr, rpmvercmp};
