//! Capabilities: the names packages provide and installs require.
//!
//! Parses the two forms seen in yum output and requests:
//!
//! - `"mtr >= 2:0.71-3.0"`
//! - `"mta"`

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::version::Evr;

/// Version comparator of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Comparator {
    Gt,
    Ge,
    #[default]
    Eq,
    Le,
    Lt,
}

impl Comparator {
    fn includes_equal(self) -> bool {
        matches!(self, Comparator::Eq | Comparator::Ge | Comparator::Le)
    }

    fn includes_greater(self) -> bool {
        matches!(self, Comparator::Gt | Comparator::Ge)
    }

    fn includes_less(self) -> bool {
        matches!(self, Comparator::Lt | Comparator::Le)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Eq => "=",
            Comparator::Le => "<=",
            Comparator::Lt => "<",
        };
        f.write_str(op)
    }
}

impl FromStr for Comparator {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(Comparator::Gt),
            ">=" => Ok(Comparator::Ge),
            "=" | "==" => Ok(Comparator::Eq),
            "<=" => Ok(Comparator::Le),
            "<" => Ok(Comparator::Lt),
            _ => anyhow::bail!("Unknown comparator: {}", s),
        }
    }
}

/// A named capability with an optional version constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capability {
    name: String,
    evr: Evr,
    comparator: Comparator,
}

impl Capability {
    pub fn new(name: &str, evr: Evr, comparator: Comparator) -> Self {
        Self {
            name: name.to_string(),
            evr,
            comparator,
        }
    }

    /// Parse `name op evr` or a bare name.
    ///
    /// Anything that is not exactly three tokens with a known operator in the
    /// middle becomes a bare name, unchanged, with an empty version.
    pub fn parse(s: &str) -> Self {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        if let [name, op, evr] = tokens.as_slice()
            && let Ok(comparator) = op.parse::<Comparator>()
        {
            return Self::new(name, Evr::parse(evr), comparator);
        }
        Self::new(s, Evr::default(), Comparator::Eq)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evr(&self) -> &Evr {
        &self.evr
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    /// Whether this capability, taken as a provide, satisfies `require`.
    ///
    /// Both sides are treated as version ranges and the check succeeds when
    /// the ranges overlap (librpm's `rpmdsCompare`). Missing EVR fields act
    /// as wildcards. The check is symmetric.
    pub fn satisfies(&self, require: &Capability) -> bool {
        if self.name != require.name {
            return false;
        }

        let (x, y) = (self.comparator, require.comparator);
        match self.evr.partial_compare(&require.evr) {
            Ordering::Less => x.includes_greater() || y.includes_less(),
            Ordering::Greater => x.includes_less() || y.includes_greater(),
            Ordering::Equal => {
                (x.includes_equal() && y.includes_equal())
                    || (x == Comparator::Lt && y == Comparator::Lt)
                    || (x == Comparator::Gt && y == Comparator::Gt)
            }
        }
    }

    /// Whether `provide` satisfies this capability taken as a requirement.
    pub fn is_satisfied_by(&self, provide: &Capability) -> bool {
        provide.satisfies(self)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.evr.is_empty() {
            return f.write_str(&self.name);
        }
        write!(f, "{} {} ", self.name, self.comparator)?;
        match self.evr.epoch() {
            Some(epoch) => write!(f, "{}:{}", epoch, self.evr),
            None => write!(f, "{}", self.evr),
        }
    }
}
