//! Application layer - decisions a package provider makes on top of the cache.
//!
//! These functions turn what a user asked for (`foo.i386`, `perl(Carp)`,
//! `zip 2.31-2.el5`) into concrete packages and a go/no-go install plan.

mod install;
mod options;
mod resolve;

pub use install::{InstallMethod, InstallPlan, InstallRequest, plan_install};
pub use options::repo_control_args;
pub use resolve::{ProvidesMatch, ResolvedName, resolve_name_arch, resolve_provides};
