pub mod cluster;
pub mod cost;
pub mod graph;
pub mod instrument;
pub mod observation;
pub mod plan;
pub mod telescope;
pub mod utils;
