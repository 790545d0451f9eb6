use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// How observations are packed onto the telescope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingPolicy {
    /// Largest-first heuristic with concurrent fill-up of each bucket.
    #[default]
    Greedy,
    /// Concurrent packing in input order.
    FirstFit,
    /// One observation after the other, in input order.
    Serial,
}

impl SchedulingPolicy {
    pub fn is_concurrent(&self) -> bool {
        !matches!(self, SchedulingPolicy::Serial)
    }
}

impl FromStr for SchedulingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "greedy" => Ok(SchedulingPolicy::Greedy),
            "first-fit" | "firstfit" | "concurrent" => Ok(SchedulingPolicy::FirstFit),
            "serial" | "sequential" => Ok(SchedulingPolicy::Serial),
            _ => Err(Error::configuration(format!("Unknown scheduling policy '{}'", s))),
        }
    }
}

impl fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingPolicy::Greedy => write!(f, "greedy"),
            SchedulingPolicy::FirstFit => write!(f, "first-fit"),
            SchedulingPolicy::Serial => write!(f, "serial"),
        }
    }
}
