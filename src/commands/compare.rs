use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use crate::rpm::Evr;

/// Result of comparing two EVR strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareReport {
    pub left: String,
    pub right: String,
    /// -1, 0 or 1
    pub result: i8,
    /// Whether missing fields were treated as wildcards
    pub partial: bool,
}

impl fmt::Display for CompareReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.result {
            -1 => "<",
            0 => "==",
            _ => ">",
        };
        write!(f, "{} {} {}", self.left, op, self.right)
    }
}

/// Compare two `[epoch:]version[-release]` strings the way rpm does.
pub fn compare(left: &str, right: &str, partial: bool) -> CompareReport {
    let (a, b) = (Evr::parse(left), Evr::parse(right));
    let ordering = if partial {
        a.partial_compare(&b)
    } else {
        a.compare(&b)
    };
    CompareReport {
        left: left.to_string(),
        right: right.to_string(),
        result: match ordering {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        },
        partial,
    }
}
