//! RPM version comparison.
//!
//! This module implements the segment-wise comparison algorithm used by
//! `rpmvercmp()` in librpm, and the [`Evr`] (epoch:version-release) value type
//! built on top of it.

use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CacheError;

/// Compare two version strings using RPM's algorithm.
///
/// An empty string stands for a missing value and sorts before any non-empty
/// string.
///
/// Rules:
/// - strings are split into maximal runs of ASCII digits or ASCII letters,
///   everything else is a separator and never contributes to ordering
/// - `10 > 1`, `1 > a`, `z > a`, `Z > A`, `z > Z`
/// - leading zeros are ignored
/// - when all segments match, the side with more unprocessed input wins
///   (`"1.20.b18.el5.extrastuff" > "1.20.b18.el5"`)
pub fn rpmvercmp(x: &str, y: &str) -> Ordering {
    if x == y {
        return Ordering::Equal;
    }

    let (x, y) = (x.as_bytes(), y.as_bytes());
    let (mut xi, mut yi) = (0, 0);

    while xi < x.len() && yi < y.len() {
        while xi < x.len() && !x[xi].is_ascii_alphanumeric() {
            xi += 1;
        }
        while yi < y.len() && !y[yi].is_ascii_alphanumeric() {
            yi += 1;
        }

        if xi == x.len() || yi == y.len() {
            break;
        }

        let numeric = x[xi].is_ascii_digit();
        let class: fn(&u8) -> bool = if numeric {
            u8::is_ascii_digit
        } else {
            u8::is_ascii_alphabetic
        };

        let x_seg = segment(&x[xi..], class);
        let y_seg = segment(&y[yi..], class);

        // Segments of different types: numbers always win over letters
        if y_seg.is_empty() {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        xi += x_seg.len();
        yi += y_seg.len();

        let ord = if numeric {
            compare_numeric(x_seg, y_seg)
        } else {
            x_seg.cmp(y_seg)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    // Segments matched but separators differed
    if xi == x.len() && yi == y.len() {
        return Ordering::Equal;
    }

    if x.len() - xi > y.len() - yi {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

fn segment(s: &[u8], class: fn(&u8) -> bool) -> &[u8] {
    let end = s.iter().position(|b| !class(b)).unwrap_or(s.len());
    &s[..end]
}

fn compare_numeric(x: &[u8], y: &[u8]) -> Ordering {
    let x = strip_leading_zeros(x);
    let y = strip_leading_zeros(y);
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}

fn strip_leading_zeros(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|b| *b != b'0').unwrap_or(s.len());
    &s[start..]
}

/// Outcome of parsing an EVR string.
///
/// Malformed input is preserved verbatim instead of being rejected, so a
/// single corrupt version string cannot break a whole query.
#[derive(Debug, Clone, PartialEq)]
enum EvrParse {
    Parsed {
        epoch: Option<u64>,
        version: String,
        release: Option<String>,
    },
    Literal(String),
}

impl EvrParse {
    fn new(evr: &str) -> Self {
        let (epoch, remainder) = match evr.split_once(':') {
            None => (None, evr),
            Some(("", rest)) => (None, rest),
            Some((lead, rest)) => match parse_epoch(lead) {
                Some(epoch) => (Some(epoch), rest),
                None => return EvrParse::Literal(evr.to_string()),
            },
        };

        let (version, release) = match remainder.rsplit_once('-') {
            Some((version, release)) => (version, non_empty(release)),
            None => (remainder, None),
        };

        if version.is_empty() {
            return EvrParse::Literal(evr.to_string());
        }

        EvrParse::Parsed {
            epoch,
            version: version.to_string(),
            release,
        }
    }
}

fn parse_epoch(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// An RPM epoch:version-release triple.
///
/// Equality and ordering follow [`Evr::compare`]: a missing epoch is treated
/// as `0` and a missing release sorts before any present release. Use
/// [`Evr::partial_compare`] when missing fields should act as wildcards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Evr {
    epoch: Option<u64>,
    version: String,
    release: Option<String>,
}

impl Evr {
    /// Build an EVR from explicit fields. An empty release is stored as `None`.
    pub fn new(epoch: Option<u64>, version: &str, release: Option<&str>) -> Self {
        Evr {
            epoch,
            version: version.to_string(),
            release: release.and_then(non_empty),
        }
    }

    /// Parse `[epoch:]version[-release]`. Never fails.
    pub fn parse(evr: &str) -> Self {
        if evr.is_empty() {
            return Evr::default();
        }
        match EvrParse::new(evr) {
            EvrParse::Parsed {
                epoch,
                version,
                release,
            } => Evr {
                epoch,
                version,
                release,
            },
            EvrParse::Literal(raw) => Evr {
                epoch: None,
                version: raw,
                release: None,
            },
        }
    }

    /// Build an EVR from either one `epoch:version-release` field or three
    /// `epoch, version, release` fields.
    pub fn from_fields(fields: &[&str]) -> Result<Self, CacheError> {
        match fields {
            [evr] => Ok(Evr::parse(evr)),
            [epoch, version, release] => {
                let epoch = parse_epoch(epoch).ok_or_else(|| {
                    CacheError::Argument(format!("invalid epoch '{}'", epoch))
                })?;
                Ok(Evr::new(Some(epoch), version, Some(*release)))
            }
            _ => Err(CacheError::Argument(format!(
                "expecting either 'epoch:version-release' or \
                 'epoch, version, release', got {} fields",
                fields.len()
            ))),
        }
    }

    pub fn epoch(&self) -> Option<u64> {
        self.epoch
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn release(&self) -> Option<&str> {
        self.release.as_deref()
    }

    /// True when no version was given at all (e.g. a bare capability name).
    pub fn is_empty(&self) -> bool {
        self.version.is_empty()
    }

    /// Full `epoch:version[-release]` form, with a missing epoch shown as `0`.
    pub fn evr(&self) -> String {
        format!("{}:{}", self.epoch.unwrap_or(0), self)
    }

    /// Total ordering: epoch, then version, then release.
    pub fn compare(&self, other: &Evr) -> Ordering {
        self.epoch
            .unwrap_or(0)
            .cmp(&other.epoch.unwrap_or(0))
            .then_with(|| rpmvercmp(&self.version, &other.version))
            .then_with(|| {
                rpmvercmp(
                    self.release.as_deref().unwrap_or(""),
                    other.release.as_deref().unwrap_or(""),
                )
            })
    }

    /// Comparison where a field missing on either side matches anything.
    ///
    /// `2:1.2-1` is equal to `2:1.2`, and `1.2-1` is equal to `3:1.2-1`.
    pub fn partial_compare(&self, other: &Evr) -> Ordering {
        if let (Some(x), Some(y)) = (self.epoch, other.epoch) {
            match x.cmp(&y) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }

        if self.version.is_empty() || other.version.is_empty() {
            return Ordering::Equal;
        }
        match rpmvercmp(&self.version, &other.version) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match (&self.release, &other.release) {
            (Some(x), Some(y)) => rpmvercmp(x, y),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for Evr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.release {
            Some(release) => write!(f, "{}-{}", self.version, release),
            None => write!(f, "{}", self.version),
        }
    }
}

impl FromStr for Evr {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Evr::parse(s))
    }
}

impl PartialEq for Evr {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Evr {}

impl PartialOrd for Evr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Evr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}
