use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// Cost summary of one component of one pipeline, as written to the workflow's CSV side-car.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ComponentCostStats {
    pub workflow_type: String,
    #[serde(rename = "product")]
    pub component: String,
    /// PFLOP/s summed over the component's constituents.
    pub total_compute: f64,
    /// `total_compute` per task.
    pub fraction_compute_cost: f64,
    pub num_tasks: usize,
    pub out_edges: usize,
    /// Mvis/s.
    pub total_data: f64,
    pub fraction_data_cost: f64,
}

impl ComponentCostStats {
    pub fn empty(workflow_type: &str, component: &str, num_tasks: usize, out_edges: usize) -> Self {
        ComponentCostStats {
            workflow_type: workflow_type.to_string(),
            component: component.to_string(),
            total_compute: 0.0,
            fraction_compute_cost: 0.0,
            num_tasks,
            out_edges,
            total_data: 0.0,
            fraction_data_cost: 0.0,
        }
    }
}

/// Writes one row per component, header included.
pub fn write_stats_csv(path: impl AsRef<Path>, stats: &[ComponentCostStats]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for row in stats {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
