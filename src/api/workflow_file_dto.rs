use serde::{Deserialize, Serialize};

/// Workflow file consumed by the cluster simulator.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorkflowFileDto {
    pub header: WorkflowHeaderDto,
    pub graph: NodeLinkGraphDto,
}

/// Only the header of a workflow file; used when scanning for reusable files.
#[derive(Deserialize, Debug, Clone)]
pub struct WorkflowHeaderEnvelopeDto {
    pub header: WorkflowHeaderDto,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkflowHeaderDto {
    pub generator: GeneratorDto,
    pub parameters: WorkflowParametersDto,
    pub time: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeneratorDto {
    pub name: String,
    pub version: String,
}

/// The parameters that identify a generated workflow. Two files with equal
/// parameters are interchangeable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkflowParametersDto {
    pub max_arrays: u32,
    pub channels: u32,
    pub arrays: u32,
    pub baseline: f64,
    pub duration: u64,
    pub workflow_parallelism: u32,
    pub workflows: Vec<String>,
    pub hpso: String,
    pub data: bool,
    pub data_distribution: String,
}

/// Node-link serialisation of a directed graph (networkx `node_link_data` layout).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NodeLinkGraphDto {
    pub directed: bool,
    pub multigraph: bool,
    #[serde(default)]
    pub graph: serde_json::Map<String, serde_json::Value>,
    pub nodes: Vec<NodeDto>,
    pub links: Vec<LinkDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NodeDto {
    pub id: String,
    pub comp: f64,
    pub task_data: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LinkDto {
    pub source: String,
    pub target: String,
    pub transfer_data: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_product: Option<String>,
}
