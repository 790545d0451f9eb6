pub mod generator;
pub mod instrument_config;
pub mod workflow_builder;
pub mod workflow_file;
