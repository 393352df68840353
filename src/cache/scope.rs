//! Refresh scopes and the pending-refresh bitset.

use std::fmt;

/// What part of the package database a refresh rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshScope {
    /// Installed packages only
    Installed,
    /// Installed and available packages, plus the options line
    All,
    /// Provides of every installed and available package
    Provides,
}

impl RefreshScope {
    /// Helper flags selecting this scope.
    pub fn flags(self) -> &'static [&'static str] {
        match self {
            RefreshScope::Installed => &["--installed"],
            RefreshScope::All => &["--options", "--installed-provides"],
            RefreshScope::Provides => &["--options", "--all-provides"],
        }
    }

    fn bit(self) -> u8 {
        match self {
            RefreshScope::Installed => 0b001,
            RefreshScope::All => 0b010,
            RefreshScope::Provides => 0b100,
        }
    }
}

impl fmt::Display for RefreshScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshScope::Installed => "installed",
            RefreshScope::All => "all",
            RefreshScope::Provides => "provides",
        };
        f.write_str(name)
    }
}

/// Scopes waiting for a refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyScopes(u8);

impl DirtyScopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, scope: RefreshScope) {
        self.0 |= scope.bit();
    }

    pub fn contains(self, scope: RefreshScope) -> bool {
        self.0 & scope.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The scope to refresh next: `All` before `Installed`, `Provides` last.
    pub fn next_pending(self) -> Option<RefreshScope> {
        [
            RefreshScope::All,
            RefreshScope::Installed,
            RefreshScope::Provides,
        ]
        .into_iter()
        .find(|scope| self.contains(*scope))
    }

    /// Clear `scope` after a successful refresh. A full refresh also
    /// satisfies a pending installed refresh.
    pub fn mark_refreshed(&mut self, scope: RefreshScope) {
        self.0 &= !scope.bit();
        if scope == RefreshScope::All {
            self.0 &= !RefreshScope::Installed.bit();
        }
    }
}
