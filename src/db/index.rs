//! In-memory package index.
//!
//! Keeps [`CacheEntry`] values unique by nevra, grouped by package name, and
//! indexed by every capability name they provide.

use std::collections::HashMap;

use crate::rpm::{CacheEntry, Capability};

/// Storage for cached packages: unique, sorted on lookup, searchable by
/// provided capability.
#[derive(Debug, Default)]
pub struct PackageIndex {
    /// nevra => entry
    entries: HashMap<String, CacheEntry>,
    /// package name => nevras, in registration order
    by_name: HashMap<String, Vec<String>>,
    /// capability name => nevras of the providers, in registration order
    provides: HashMap<String, Vec<String>>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, merging it into an existing entry with the same nevra.
    ///
    /// Installed/available flags accumulate, the repository of an available
    /// entry replaces the previous one, and provides not seen before are
    /// appended and indexed.
    pub fn push(&mut self, entry: CacheEntry) {
        if !entry.is_retained() {
            return;
        }

        let key = entry.package.nevra();
        match self.entries.get_mut(&key) {
            Some(existing) => {
                existing.installed |= entry.installed;
                if entry.available {
                    existing.available = true;
                    if entry.repo_id.is_some() {
                        existing.repo_id = entry.repo_id;
                    }
                } else if existing.repo_id.is_none() {
                    existing.repo_id = entry.repo_id;
                }

                for provide in entry.package.provides() {
                    if existing.package.add_provide(provide.clone()) {
                        register(&mut self.provides, provide.name(), &key);
                    }
                }
            }
            None => {
                register(&mut self.by_name, entry.package.name(), &key);
                for provide in entry.package.provides() {
                    register(&mut self.provides, provide.name(), &key);
                }
                self.entries.insert(key, entry);
            }
        }
    }

    pub fn extend<I: IntoIterator<Item = CacheEntry>>(&mut self, entries: I) {
        for entry in entries {
            self.push(entry);
        }
    }

    /// All entries for `name`, newest first.
    pub fn lookup(&self, name: &str) -> Vec<&CacheEntry> {
        let mut found = self.resolve(self.by_name.get(name));
        found.sort_by(|a, b| b.package.compare(&a.package));
        found
    }

    /// Entries providing the capability `name`, in registration order.
    pub fn lookup_provides(&self, name: &str) -> Vec<&CacheEntry> {
        self.resolve(self.provides.get(name))
    }

    /// Entries with at least one provide satisfying `require`, in
    /// registration order.
    pub fn whatprovides(&self, require: &Capability) -> Vec<&CacheEntry> {
        self.lookup_provides(require.name())
            .into_iter()
            .filter(|entry| {
                entry
                    .package
                    .provides()
                    .iter()
                    .any(|provide| provide.satisfies(require))
            })
            .collect()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_name.clear();
        self.provides.clear();
    }

    /// Drop the installed flag everywhere; entries left with no flag go away.
    pub fn clear_installed(&mut self) {
        for entry in self.entries.values_mut() {
            entry.installed = false;
        }
        self.prune();
    }

    /// Drop the available flag everywhere; entries left with no flag go away.
    pub fn clear_available(&mut self) {
        for entry in self.entries.values_mut() {
            entry.available = false;
            entry.repo_id = None;
        }
        self.prune();
    }

    /// Number of distinct package names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn installed_count(&self) -> usize {
        self.entries.values().filter(|e| e.installed).count()
    }

    pub fn available_count(&self) -> usize {
        self.entries.values().filter(|e| e.available).count()
    }

    pub fn is_installed(&self, nevra: &str) -> bool {
        self.entries.get(nevra).is_some_and(|e| e.installed)
    }

    pub fn is_available(&self, nevra: &str) -> bool {
        self.entries.get(nevra).is_some_and(|e| e.available)
    }

    fn resolve(&self, keys: Option<&Vec<String>>) -> Vec<&CacheEntry> {
        keys.map(|keys| keys.iter().filter_map(|k| self.entries.get(k)).collect())
            .unwrap_or_default()
    }

    fn prune(&mut self) {
        self.entries.retain(|_, entry| entry.is_retained());

        let entries = &self.entries;
        let keep = |keys: &mut Vec<String>| {
            keys.retain(|k| entries.contains_key(k));
            !keys.is_empty()
        };
        self.by_name.retain(|_, keys| keep(keys));
        self.provides.retain(|_, keys| keep(keys));
    }
}

fn register(index: &mut HashMap<String, Vec<String>>, name: &str, key: &str) {
    let keys = index.entry(name.to_string()).or_default();
    if !keys.iter().any(|k| k == key) {
        keys.push(key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpm::{Evr, PackageRecord, PackageState};

    fn entry(
        name: &str,
        evr: &str,
        arch: &str,
        provides: &[&str],
        state: PackageState,
        repo: &str,
    ) -> CacheEntry {
        let package = PackageRecord::new(
            name,
            Evr::parse(evr),
            arch,
            provides.iter().map(|p| Capability::parse(p)).collect(),
        );
        CacheEntry::new(package, state, Some(repo))
    }

    fn versions(entries: &[&CacheEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| format!("{}.{}", e.package.evr(), e.package.arch()))
            .collect()
    }

    #[test]
    fn test_push_same_nevra_once() {
        let mut index = PackageIndex::new();
        let e = entry("zip", "0:2.31-2.el5", "x86_64", &[], PackageState::Available, "base");
        index.push(e.clone());
        index.push(e);
        assert_eq!(index.lookup("zip").len(), 1);
        assert_eq!(index.lookup_provides("zip").len(), 1);
        assert_eq!(index.available_count(), 1);
    }

    #[test]
    fn test_push_merges_installed_and_available() {
        let mut index = PackageIndex::new();
        index.push(entry(
            "zip",
            "0:2.31-2.el5",
            "x86_64",
            &[],
            PackageState::Installed,
            "installed",
        ));
        index.push(entry("zip", "0:2.31-2.el5", "x86_64", &[], PackageState::Available, "base"));

        let found = index.lookup("zip");
        assert_eq!(found.len(), 1);
        assert!(found[0].installed);
        assert!(found[0].available);
        assert_eq!(found[0].repo_id.as_deref(), Some("base"));
        assert_eq!(index.installed_count(), 1);
        assert_eq!(index.available_count(), 1);
        assert!(index.is_installed("zip-0:2.31-2.el5.x86_64"));
        assert!(index.is_available("zip-0:2.31-2.el5.x86_64"));
    }

    #[test]
    fn test_push_merges_new_provides() {
        let mut index = PackageIndex::new();
        index.push(entry("zlib", "1.2.3-3", "x86_64", &[], PackageState::Available, "base"));
        assert!(index.lookup_provides("libz.so.1()(64bit)").is_empty());

        index.push(entry(
            "zlib",
            "1.2.3-3",
            "x86_64",
            &["zlib = 1.2.3-3", "libz.so.1()(64bit)"],
            PackageState::Available,
            "base",
        ));
        assert_eq!(index.lookup_provides("libz.so.1()(64bit)").len(), 1);
        assert_eq!(index.lookup_provides("zlib").len(), 1);
    }

    #[test]
    fn test_lookup_newest_first() {
        let mut index = PackageIndex::new();
        index.push(entry(
            "kernel",
            "2.6.18-1",
            "x86_64",
            &[],
            PackageState::Installed,
            "installed",
        ));
        index.push(entry("kernel", "2.6.18-10", "x86_64", &[], PackageState::Available, "base"));
        index.push(entry("kernel", "2.6.9-99", "x86_64", &[], PackageState::Available, "base"));
        index.push(entry("kernel", "1:2.0-1", "x86_64", &[], PackageState::Available, "base"));

        assert_eq!(
            versions(&index.lookup("kernel")),
            vec![
                "2.0-1.x86_64",
                "2.6.18-10.x86_64",
                "2.6.18-1.x86_64",
                "2.6.9-99.x86_64"
            ]
        );
    }

    #[test]
    fn test_lookup_ties_broken_by_arch() {
        let mut index = PackageIndex::new();
        index.push(entry("zlib", "1.2.3-3", "i386", &[], PackageState::Both, "base"));
        index.push(entry("zlib", "1.2.3-3", "x86_64", &[], PackageState::Both, "base"));
        index.push(entry("zlib", "1.2.3-3", "noarch", &[], PackageState::Both, "base"));

        assert_eq!(
            versions(&index.lookup("zlib")),
            vec!["1.2.3-3.x86_64", "1.2.3-3.noarch", "1.2.3-3.i386"]
        );
    }

    #[test]
    fn test_lookup_unknown() {
        let index = PackageIndex::new();
        assert!(index.lookup("nothing").is_empty());
        assert!(index.lookup_provides("nothing").is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_lookup_provides_registration_order() {
        let mut index = PackageIndex::new();
        index.push(entry(
            "postfix",
            "2:2.3.3-2",
            "x86_64",
            &["MTA", "smtpdaemon"],
            PackageState::Available,
            "base",
        ));
        index.push(entry("exim", "4.63-2", "x86_64", &["MTA"], PackageState::Available, "base"));
        index.push(entry(
            "sendmail",
            "8.13.8-2",
            "x86_64",
            &["MTA", "smtpdaemon"],
            PackageState::Installed,
            "installed",
        ));

        let names: Vec<&str> = index
            .lookup_provides("MTA")
            .iter()
            .map(|e| e.package.name())
            .collect();
        assert_eq!(names, vec!["postfix", "exim", "sendmail"]);
    }

    #[test]
    fn test_whatprovides_filters_by_version() {
        let mut index = PackageIndex::new();
        index.push(entry(
            "mtr",
            "2:0.71-3.0",
            "x86_64",
            &["mtr = 2:0.71-3.0"],
            PackageState::Available,
            "base",
        ));
        index.push(entry(
            "mtr",
            "2:0.75-4.el5",
            "x86_64",
            &["mtr = 2:0.75-4.el5"],
            PackageState::Available,
            "updates",
        ));

        let found = index.whatprovides(&Capability::parse("mtr > 2:0.71"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].package.evr().to_string(), "0.75-4.el5");

        assert_eq!(index.whatprovides(&Capability::parse("mtr")).len(), 2);
        assert!(index.whatprovides(&Capability::parse("mtr < 1:0.1")).is_empty());
    }

    #[test]
    fn test_whatprovides_uses_self_provide_when_listed_provide_lacks_release() {
        let mut index = PackageIndex::new();
        index.push(entry(
            "zip",
            "0:2.31-2.el5",
            "x86_64",
            &["zip = 2.31"],
            PackageState::Available,
            "base",
        ));

        assert_eq!(index.lookup_provides("zip").len(), 1);
        let found = index.whatprovides(&Capability::parse("zip > 2.31-1"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].package.evr().to_string(), "2.31-2.el5");
    }

    #[test]
    fn test_whatprovides_virtual_name() {
        let mut index = PackageIndex::new();
        index.push(entry(
            "perl",
            "4:5.8.8-27",
            "x86_64",
            &["perl(Config)", "perl = 4:5.8.8-27"],
            PackageState::Installed,
            "installed",
        ));

        let found = index.whatprovides(&Capability::parse("perl(Config)"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].package.name(), "perl");
    }

    #[test]
    fn test_clear_installed() {
        let mut index = PackageIndex::new();
        index.push(entry(
            "erlang-mochiweb",
            "1.4.1-5.el5",
            "x86_64",
            &["mochiweb = 1.4.1-5.el5"],
            PackageState::Installed,
            "installed",
        ));
        index.push(entry("zip", "2.31-2.el5", "x86_64", &[], PackageState::Both, "base"));
        index.push(entry("znc", "0.098-1.el5", "x86_64", &[], PackageState::Available, "base"));

        index.clear_installed();

        assert!(index.lookup("erlang-mochiweb").is_empty());
        assert!(index.lookup_provides("mochiweb").is_empty());
        let zip = index.lookup("zip");
        assert_eq!(zip.len(), 1);
        assert!(!zip[0].installed);
        assert!(zip[0].available);
        assert_eq!(index.lookup_provides("zip").len(), 1);
        assert_eq!(index.installed_count(), 0);
        assert_eq!(index.available_count(), 2);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_clear_available() {
        let mut index = PackageIndex::new();
        index.push(entry("zip", "2.31-2.el5", "x86_64", &[], PackageState::Both, "base"));
        index.push(entry("znc", "0.098-1.el5", "x86_64", &[], PackageState::Available, "base"));

        index.clear_available();

        assert!(index.lookup("znc").is_empty());
        assert!(index.lookup_provides("znc").is_empty());
        assert_eq!(index.lookup("zip").len(), 1);
        assert_eq!(index.installed_count(), 1);
        assert_eq!(index.available_count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut index = PackageIndex::new();
        index.push(entry("zip", "2.31-2.el5", "x86_64", &[], PackageState::Both, "base"));
        index.clear();
        assert!(index.is_empty());
        assert!(index.lookup("zip").is_empty());
        assert!(index.lookup_provides("zip").is_empty());
    }
}
