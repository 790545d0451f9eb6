use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;

use crate::api::config_dto::CostModelDto;

lazy_static! {
    /// Graph components whose cost is the sum of several sizing-table components.
    static ref DEFAULT_GROUPS: BTreeMap<String, Vec<String>> = [
        ("Grid", vec!["Grid", "Phase Rotation Predict", "Visibility Weighting", "Gridding Kernel Update", "Phase Rotation"]),
        ("Predict", vec!["DFT", "IFFT"]),
        ("Degrid", vec!["Degrid", "Degridding Kernel Update"]),
        ("UpdateLSM", vec!["Reprojection Predict", "Reprojection"]),
        ("Subtract", vec!["Subtract Visibility"]),
    ]
    .into_iter()
    .map(|(group, members)| (group.to_string(), members.into_iter().map(String::from).collect()))
    .collect();

    /// Structural graph components (loops, scatter/gather) and sizing components already
    /// folded into a group.
    static ref DEFAULT_IGNORED: BTreeSet<String> = [
        "UpdateGSM",
        "BeginMajorCycle",
        "FinishMajorCycle",
        "FinishMinorCycle",
        "BeginMinorCycle",
        "Gather",
        "Scatter",
        "FrequencySplit",
        "End",
        "CalSourceFinding",
        "SelfCalConverge",
        "ExtractLSM",
        "Raw-Vis-Copy",
        "lstnr",
        "Phase Rotation Predict",
        "Visibility Weighting",
        "Gridding Kernel Update",
        "Phase Rotation",
    ]
    .into_iter()
    .map(String::from)
    .collect();
}

/// Maps graph components onto sizing-table columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CostModelConfig {
    groups: BTreeMap<String, Vec<String>>,
    ignored: BTreeSet<String>,
}

impl Default for CostModelConfig {
    fn default() -> Self {
        CostModelConfig { groups: DEFAULT_GROUPS.clone(), ignored: DEFAULT_IGNORED.clone() }
    }
}

impl CostModelConfig {
    pub fn new(groups: BTreeMap<String, Vec<String>>, ignored: BTreeSet<String>) -> Self {
        CostModelConfig { groups, ignored }
    }

    /// Configured groups extend (and override) the defaults; a configured ignore list
    /// replaces the default one.
    pub fn from_dto(dto: Option<&CostModelDto>) -> Self {
        let mut config = CostModelConfig::default();
        if let Some(dto) = dto {
            config.groups.extend(dto.groups.iter().map(|(k, v)| (k.clone(), v.clone())));
            if let Some(ignored) = &dto.ignored_components {
                config.ignored = ignored.iter().cloned().collect();
            }
        }
        config
    }

    pub fn is_ignored(&self, component: &str) -> bool {
        self.ignored.contains(component)
    }

    /// Sizing-table columns that make up `component`.
    pub fn constituents<'a>(&'a self, component: &'a str) -> Vec<&'a str> {
        match self.groups.get(component) {
            Some(members) => members.iter().map(String::as_str).collect(),
            None => vec![component],
        }
    }
}
