//! Parsing of the metadata helper's output.
//!
//! Each record line has the shape
//! `name epoch version release arch ['provide', ...] type repo`, and a full
//! refresh may also emit option lines such as
//! `[option installonlypkgs] kernel kernel-bigmem`.

use log::debug;
use std::str::FromStr;

use crate::error::ParseWarning;
use crate::rpm::{CacheEntry, Capability, Evr, PackageRecord, PackageState};

pub const OPTION_MARKER: &str = "[option ";
const INSTALL_ONLY_OPTION: &str = "installonlypkgs";

/// One understood line of helper output.
#[derive(Debug, Clone, PartialEq)]
pub enum DumpLine {
    /// Names of packages that may be installed side by side
    InstallOnly(Vec<String>),
    /// An option the cache does not use
    Option(String),
    Package(CacheEntry),
}

impl FromStr for DumpLine {
    type Err = ParseWarning;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = line.strip_prefix(OPTION_MARKER) {
            return parse_option(line, rest);
        }
        parse_record(line).map(DumpLine::Package)
    }
}

fn parse_option(line: &str, rest: &str) -> Result<DumpLine, ParseWarning> {
    let Some((name, values)) = rest.split_once(']') else {
        return Err(ParseWarning::new(line, "unterminated option"));
    };
    let name = name.trim();
    if name == INSTALL_ONLY_OPTION {
        Ok(DumpLine::InstallOnly(
            values.split_whitespace().map(String::from).collect(),
        ))
    } else {
        Ok(DumpLine::Option(name.to_string()))
    }
}

fn parse_record(line: &str) -> Result<CacheEntry, ParseWarning> {
    let (Some(open), Some(close)) = (line.find('['), line.rfind(']')) else {
        return Err(ParseWarning::new(line, "missing provides list"));
    };
    if close < open {
        return Err(ParseWarning::new(line, "malformed provides list"));
    }

    let head: Vec<&str> = line[..open].split_whitespace().collect();
    let tail: Vec<&str> = line[close + 1..].split_whitespace().collect();

    let [name, epoch, version, release, arch] = head[..] else {
        return Err(ParseWarning::new(
            line,
            format!("expected 5 fields before provides, found {}", head.len()),
        ));
    };
    let [kind, repo] = tail[..] else {
        return Err(ParseWarning::new(
            line,
            format!("expected 2 fields after provides, found {}", tail.len()),
        ));
    };

    if epoch.is_empty() || !epoch.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseWarning::new(line, format!("invalid epoch '{}'", epoch)));
    }
    let state: PackageState = kind
        .parse()
        .map_err(|e: anyhow::Error| ParseWarning::new(line, e.to_string()))?;
    let evr = Evr::from_fields(&[epoch, version, release])
        .map_err(|e| ParseWarning::new(line, e.to_string()))?;

    let provides = parse_provides(&line[open + 1..close]);
    let package = PackageRecord::new(name, evr, arch, provides);
    Ok(CacheEntry::new(package, state, Some(repo)))
}

fn parse_provides(list: &str) -> Vec<Capability> {
    list.split(", ")
        .map(|p| p.trim().trim_matches('\'').trim_matches('"'))
        .filter(|p| !p.is_empty())
        .map(Capability::parse)
        .collect()
}

/// Everything a refresh learned from the helper's stdout.
#[derive(Debug, Default)]
pub struct ParsedDump {
    pub entries: Vec<CacheEntry>,
    /// Set when the output carried an installonlypkgs option line
    pub allow_multi_install: Option<Vec<String>>,
    pub warnings: Vec<ParseWarning>,
}

/// Parse helper output. Lines that cannot be understood become warnings and
/// are otherwise skipped.
pub fn parse_dump(output: &str) -> ParsedDump {
    let mut parsed = ParsedDump::default();
    for line in output.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()) {
        match line.parse::<DumpLine>() {
            Ok(DumpLine::Package(entry)) => parsed.entries.push(entry),
            Ok(DumpLine::InstallOnly(names)) => parsed.allow_multi_install = Some(names),
            Ok(DumpLine::Option(name)) => debug!("Ignoring helper option '{}'", name),
            Err(warning) => parsed.warnings.push(warning),
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{STDOUT_BAD_SEPARATORS, STDOUT_BAD_TYPE, STDOUT_GOOD};

    fn package(line: &str) -> CacheEntry {
        match line.parse::<DumpLine>().unwrap() {
            DumpLine::Package(entry) => entry,
            other => panic!("expected a package, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_record() {
        let entry = package(
            "zlib 0 1.2.3 3 x86_64 ['zlib = 1.2.3-3', 'libz.so.1()(64bit)'] r base",
        );
        assert_eq!(entry.package.name(), "zlib");
        assert_eq!(entry.package.arch(), "x86_64");
        assert_eq!(entry.package.evr().to_string(), "1.2.3-3");
        assert_eq!(entry.package.evr().epoch(), Some(0));
        assert!(entry.installed);
        assert!(entry.available);
        assert_eq!(entry.repo_id.as_deref(), Some("base"));

        let names: Vec<&str> = entry.package.provides().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["zlib", "libz.so.1()(64bit)"]);
    }

    #[test]
    fn test_parse_record_empty_provides_gets_self() {
        let entry = package("zisofs-tools 0 1.0.6 3.2.2 x86_64 [] a extras");
        assert!(!entry.installed);
        assert!(entry.available);
        assert_eq!(entry.package.provides().len(), 1);
        assert_eq!(entry.package.provides()[0].to_string(), "zisofs-tools = 0:1.0.6-3.2.2");
    }

    #[test]
    fn test_parse_record_provides_with_brackets() {
        let entry = package("perl 4 5.8.8 27.el5 x86_64 ['perl(Carp) = 1.04', 'perl'] i installed");
        let names: Vec<&str> = entry.package.provides().iter().map(|p| p.name()).collect();
        assert!(names.contains(&"perl(Carp)"));
        assert_eq!(entry.package.evr().epoch(), Some(4));
    }

    #[test]
    fn test_parse_option_line() {
        let line: DumpLine = "[option installonlypkgs] kernel kernel-bigmem kernel-enterprise"
            .parse()
            .unwrap();
        assert_eq!(
            line,
            DumpLine::InstallOnly(vec![
                "kernel".into(),
                "kernel-bigmem".into(),
                "kernel-enterprise".into()
            ])
        );

        let line: DumpLine = "[option tolerant] 1".parse().unwrap();
        assert_eq!(line, DumpLine::Option("tolerant".into()));
    }

    #[test]
    fn test_bad_lines_are_warnings() {
        for line in [
            "zlib 0 1.2.3 3 x86_64 ['zlib = 1.2.3-3'] i base bad",
            "bad zlib-devel 0 1.2.3 3 x86_64 [] i installed",
            "zlib x 1.2.3 3 x86_64 [] i base",
            "zlib 0 1.2.3 3 x86_64 [] c base",
            "zlib 0 1.2.3 3 x86_64 i base",
        ] {
            let warning = line.parse::<DumpLine>().unwrap_err();
            assert_eq!(warning.line, line);
            assert!(warning.to_string().starts_with("Problem parsing"));
        }
    }

    #[test]
    fn test_parse_dump_good() {
        let parsed = parse_dump(STDOUT_GOOD);
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.entries.len(), 14);
        assert_eq!(
            parsed.allow_multi_install,
            Some(vec![
                "kernel".to_string(),
                "kernel-bigmem".to_string(),
                "kernel-enterprise".to_string()
            ])
        );
    }

    #[test]
    fn test_parse_dump_warning_counts() {
        let parsed = parse_dump(STDOUT_BAD_SEPARATORS);
        assert_eq!(parsed.warnings.len(), 3);
        assert_eq!(parsed.entries.len(), 2);

        let parsed = parse_dump(STDOUT_BAD_TYPE);
        assert_eq!(parsed.warnings.len(), 2);
        assert_eq!(parsed.entries.len(), 3);
        assert!(parsed.allow_multi_install.is_none());
    }

    #[test]
    fn test_parse_dump_empty() {
        let parsed = parse_dump("\n\n");
        assert!(parsed.entries.is_empty());
        assert!(parsed.warnings.is_empty());
    }
}
