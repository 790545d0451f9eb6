use serde::{Deserialize, Serialize};

fn default_infrastructure() -> String {
    "parametric".to_string()
}

/// Observation plan specification, the list of observation records that will be
/// expanded into individual observations and scheduled.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlanSpecDto {
    pub telescope: String,

    #[serde(default = "default_infrastructure")]
    pub infrastructure: String,

    /// Number of compute nodes; the telescope's reference design is used when absent.
    #[serde(default)]
    pub nodes: Option<u32>,

    #[serde(alias = "items")]
    pub hpsos: Vec<HpsoParameterDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HpsoParameterDto {
    pub count: i64,
    pub hpso: String,
    pub workflows: Vec<String>,
    pub demand: u32,
    pub duration: u64,
    pub channels: u32,
    pub workflow_parallelism: u32,
    pub baseline: f64,

    /// Falls back to the plan's telescope.
    #[serde(default)]
    pub telescope: Option<String>,
}
