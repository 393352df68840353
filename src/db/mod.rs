//! Package database
//!
//! Storage for installed and available packages, keyed by name and by
//! provided capability.

mod index;

pub use index::PackageIndex;
