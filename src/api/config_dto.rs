use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

fn default_data_distribution() -> String {
    "standard".to_string()
}

fn default_timestep() -> String {
    "seconds".to_string()
}

fn default_policy() -> String {
    "greedy".to_string()
}

fn default_unroll_command() -> String {
    "dlg".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

/// Top level generator configuration. Relative paths are resolved against the
/// directory containing the configuration file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeneratorConfigDto {
    pub observation_plan: PathBuf,
    pub output_dir: PathBuf,
    pub component_sizing: PathBuf,
    pub total_sizing: PathBuf,

    /// Pipeline name (e.g. `DPrepA`) to graph type (e.g. `prototype`).
    pub pipelines: BTreeMap<String, String>,

    /// Graph type to logical graph template path.
    pub templates: BTreeMap<String, PathBuf>,

    #[serde(default = "default_true")]
    pub data: bool,

    #[serde(default = "default_data_distribution")]
    pub data_distribution: String,

    #[serde(default = "default_timestep")]
    pub timestep: String,

    #[serde(default)]
    pub overwrite: bool,

    #[serde(default)]
    pub scheduling: SchedulingDto,

    pub unroller: UnrollerDto,

    #[serde(default)]
    pub cost_model: Option<CostModelDto>,

    /// File name of the final config; a timestamped name is used when absent.
    #[serde(default)]
    pub config_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SchedulingDto {
    #[serde(default = "default_policy")]
    pub policy: String,

    #[serde(default)]
    pub max_telescope_usage: Option<u32>,

    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

impl Default for SchedulingDto {
    fn default() -> Self {
        SchedulingDto { policy: default_policy(), max_telescope_usage: None, shuffle_seed: None }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UnrollerDto {
    Dlg {
        #[serde(default = "default_unroll_command")]
        command: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    Precomputed {
        directory: PathBuf,
    },
}

/// Overrides for the component grouping used by the cost distributor.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CostModelDto {
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub ignored_components: Option<Vec<String>>,
}
