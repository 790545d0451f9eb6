pub mod component_groups;
pub mod distributor;
pub mod stats;
