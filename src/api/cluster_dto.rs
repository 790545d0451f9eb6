use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cluster description consumed by the simulator; also the input for ingest sizing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClusterDescriptorDto {
    pub header: ClusterHeaderDto,
    pub system: ClusterSystemDto,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClusterHeaderDto {
    pub time: bool,
    pub generator: String,
    pub version: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClusterSystemDto {
    /// Machine class name to machine data.
    pub resources: BTreeMap<String, MachineDto>,
    pub system_bandwidth: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MachineDto {
    pub count: u32,
    /// FLOP/s of a single machine.
    pub flops: f64,
    /// Bytes/s of a single machine.
    pub compute_bandwidth: i64,
    /// Bytes.
    pub memory: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BufferConfigDto {
    pub hot: HotBufferDto,
    pub cold: ColdBufferDto,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HotBufferDto {
    pub capacity: i64,
    pub max_ingest_rate: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColdBufferDto {
    pub capacity: i64,
    pub max_data_rate: i64,
}
