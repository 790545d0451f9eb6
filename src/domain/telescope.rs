use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Maximum number of stations (arrays) an observation can request on SKA Low.
pub const MAX_TEL_DEMAND_LOW: u32 = 512;
/// Maximum number of dishes an observation can request on SKA Mid.
pub const MAX_TEL_DEMAND_MID: u32 = 197;

/// The instruments workflows can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Telescope {
    Low,
    Mid,
}

impl Telescope {
    /// Total arrays available; the default `max_telescope_usage` for planning.
    pub fn max_stations(&self) -> u32 {
        match self {
            Telescope::Low => MAX_TEL_DEMAND_LOW,
            Telescope::Mid => MAX_TEL_DEMAND_MID,
        }
    }

    /// Number of compute nodes of the reference SDP design for this telescope.
    pub fn default_compute_nodes(&self) -> u32 {
        match self {
            Telescope::Low => 896,
            Telescope::Mid => 786,
        }
    }
}

impl FromStr for Telescope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" | "skalow" | "ska-low" | "ska1_low" => Ok(Telescope::Low),
            "mid" | "skamid" | "ska-mid" | "ska1_mid" => Ok(Telescope::Mid),
            _ => Err(Error::configuration(format!("Unsupported telescope '{}'", s))),
        }
    }
}

impl fmt::Display for Telescope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Telescope::Low => write!(f, "low"),
            Telescope::Mid => write!(f, "mid"),
        }
    }
}
