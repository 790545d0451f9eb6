//! Scale constants used when turning sizing-table rates into absolute costs.

pub const MEGA: f64 = 1e6;
pub const GIGA: f64 = 1e9;
pub const TERA: f64 = 1e12;
pub const PETA: f64 = 1e15;

/// Bytes per visibility, used to turn Mvis/s rates into bytes/s.
pub const BYTES_PER_VIS: f64 = 12.0;
