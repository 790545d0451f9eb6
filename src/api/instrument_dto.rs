use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::cluster_dto::{BufferConfigDto, ClusterDescriptorDto};

/// Complete simulator configuration written at the end of a generation run.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FinalConfigDto {
    pub instrument: InstrumentDto,
    pub cluster: ClusterDescriptorDto,
    pub buffer: BufferConfigDto,
    pub timestep: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InstrumentDto {
    pub telescope: InstrumentConfigDto,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InstrumentConfigDto {
    pub observatory: String,
    pub max_ingest_resources: u32,
    pub total_arrays: u32,
    pub pipelines: BTreeMap<String, PipelineEntryDto>,
    /// Sorted by `start`.
    pub observations: Vec<ObservationEntryDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PipelineEntryDto {
    /// Workflow file path, relative to the output directory.
    pub workflow: String,
    pub ingest_demand: u32,
    pub duration: u64,
    pub channels: u32,
    pub workflow_parallelism: u32,
    pub demand: u32,
    pub baseline: f64,
    pub workflow_type: Vec<String>,
    pub graph_type: Vec<String>,
    pub data: bool,
    pub data_distribution: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ObservationEntryDto {
    pub name: String,
    pub start: u64,
    pub duration: u64,
    pub instrument_demand: u32,
    #[serde(rename = "type")]
    pub typ: String,
    pub data_product_rate: f64,
}
