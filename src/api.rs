pub mod cluster_dto;
pub mod config_dto;
pub mod instrument_dto;
pub mod pgt_dto;
pub mod plan_dto;
pub mod workflow_file_dto;
