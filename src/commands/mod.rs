//! Command handlers for the `rpmcache` binary.
//!
//! Every handler returns a report that prints as a short line of text or,
//! with `--json`, as a JSON document.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Display;

pub mod config;
mod compare;
mod query;
mod resolve;

pub use compare::{CompareReport, compare};
pub use config::{CacheOptions, open_cache};
pub use query::{
    CheckReport, Provider, ProvidersReport, RepositoryReport, VersionReport, available, check,
    installed, repository, whatprovides,
};
pub use resolve::{ResolveReport, plan, resolve};

/// Format `report` for the terminal.
pub fn render<T: Serialize + Display>(report: &T, json: bool) -> Result<String> {
    if json {
        serde_json::to_string_pretty(report).context("Failed to serialize report")
    } else {
        Ok(report.to_string())
    }
}
