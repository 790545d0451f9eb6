use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::cost::component_groups::CostModelConfig;
use crate::domain::cost::stats::ComponentCostStats;
use crate::domain::graph::physical_graph::PhysicalGraph;
use crate::domain::graph::task_graph::TaskGraph;
use crate::domain::observation::observation::Observation;
use crate::domain::utils::units::{BYTES_PER_VIS, MEGA, PETA};
use crate::error::{Error, Result};
use crate::loader::sizing::{ComponentSizing, TotalSizing};

/// Where the I/O cost of a task ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataDistribution {
    /// On the task itself.
    #[default]
    Standard,
    /// Split evenly over the task's outgoing edges.
    Edges,
}

impl FromStr for DataDistribution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard" => Ok(DataDistribution::Standard),
            "edges" => Ok(DataDistribution::Edges),
            _ => Err(Error::configuration(format!("Unknown data distribution '{}'", s))),
        }
    }
}

impl fmt::Display for DataDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataDistribution::Standard => write!(f, "standard"),
            DataDistribution::Edges => write!(f, "edges"),
        }
    }
}

/// Total-sizing columns whose sum is the cost of a whole-pipeline workflow.
pub const PULSAR_COST_COLUMNS: [&str; 2] = ["RCAL [Pflop/s]", "FastImg [Pflop/s]"];

/// Everything the distributor needs besides the graph and the sizing tables.
#[derive(Debug, Clone, Copy)]
pub struct CostContext<'a> {
    pub observation: &'a Observation,
    pub pipeline: &'a str,
    pub data: bool,
    pub distribution: DataDistribution,
    pub cost_model: &'a CostModelConfig,
}

/// Per-task costs of one component: FLOPs and bytes.
#[derive(Debug, Clone, Copy, Default)]
struct TaskCost {
    comp: f64,
    data: f64,
}

/// Annotates `graph` with absolute costs from the component sizing table.
///
/// Each component's rate (summed over its constituents) is spread evenly over its
/// instances and integrated over the observation's duration. Ignored components get
/// the duration as a placeholder compute cost and no data.
pub fn distribute_component_costs(
    graph: &mut TaskGraph,
    physical: &PhysicalGraph,
    ctx: &CostContext,
    sizing: &ComponentSizing,
) -> Result<Vec<ComponentCostStats>> {
    let duration = ctx.observation.duration as f64;
    let query = ctx.observation.sizing_query();

    let mut stats = Vec::with_capacity(physical.multiplicity_table().len());
    let mut task_costs: HashMap<&str, TaskCost> = HashMap::new();

    for (component, multiplicity) in physical.multiplicity_table() {
        let mut row = ComponentCostStats::empty(ctx.pipeline, component, multiplicity.instances, multiplicity.out_edges);

        if ctx.cost_model.is_ignored(component) || multiplicity.instances == 0 {
            task_costs.insert(component, TaskCost { comp: duration, data: 0.0 });
            stats.push(row);
            continue;
        }

        let constituents = ctx.cost_model.constituents(component);
        let mut total_compute = 0.0;
        let mut total_data = 0.0;
        for constituent in &constituents {
            total_compute += sizing.compute_rate(&query, ctx.pipeline, constituent)?;
            if ctx.data {
                total_data += sizing.data_rate(&query, ctx.pipeline, constituent)?;
            }
        }

        let instances = multiplicity.instances as f64;
        row.total_compute = total_compute;
        row.fraction_compute_cost = total_compute / instances;
        row.total_data = total_data;
        row.fraction_data_cost = total_data / instances;

        let comp = duration * row.fraction_compute_cost * PETA;
        let data = duration * row.fraction_data_cost * MEGA * BYTES_PER_VIS;
        let cost = TaskCost { comp: if comp > 0.0 { comp } else { duration }, data: if ctx.data && data > 0.0 { data } else { 0.0 } };

        log::debug!("{}/{}: {} tasks, {:.3e} FLOPs and {:.3e} bytes per task", ctx.pipeline, component, multiplicity.instances, cost.comp, cost.data);
        task_costs.insert(component, cost);
        stats.push(row);
    }

    apply_task_costs(graph, &task_costs, ctx.distribution)?;
    Ok(stats)
}

/// Annotates `graph` for workflows costed as a whole: the summed total-sizing rate is
/// spread evenly over every task, with no data cost.
pub fn distribute_pipeline_cost(graph: &mut TaskGraph, physical: &PhysicalGraph, ctx: &CostContext, totals: &TotalSizing) -> Result<Vec<ComponentCostStats>> {
    let query = ctx.observation.sizing_query();
    let cost = PULSAR_COST_COLUMNS.iter().map(|column| totals.rate(&query, column)).sum::<Result<f64>>()?;

    let node_count = graph.node_count();
    if node_count == 0 {
        return Err(Error::GraphError(format!("Pipeline '{}' has no tasks to carry its cost", ctx.pipeline)));
    }
    let cost_per_task = cost / node_count as f64;
    let comp = cost_per_task * ctx.observation.duration as f64 * PETA;

    let ids = graph.node_ids().to_vec();
    for id in ids {
        if let Some(node) = graph.node_mut(id) {
            node.comp = comp;
            node.task_data = 0.0;
        }
    }
    graph.edges_mut().iter_mut().for_each(|edge| edge.transfer_data = 0.0);

    Ok(physical
        .multiplicity_table()
        .iter()
        .map(|(component, m)| {
            let mut row = ComponentCostStats::empty(ctx.pipeline, component, m.instances, m.out_edges);
            row.fraction_compute_cost = cost_per_task;
            row.total_compute = cost_per_task * m.instances as f64;
            row
        })
        .collect())
}

fn apply_task_costs(graph: &mut TaskGraph, costs: &HashMap<&str, TaskCost>, distribution: DataDistribution) -> Result<()> {
    let mut out_degree: HashMap<_, usize> = HashMap::new();
    for edge in graph.edges() {
        *out_degree.entry(edge.source).or_default() += 1;
    }

    let mut edge_share = HashMap::new();
    let ids = graph.node_ids().to_vec();
    for id in ids {
        let Some(node) = graph.node_mut(id) else { continue };
        let cost = costs
            .get(node.component.as_str())
            .copied()
            .ok_or_else(|| Error::GraphError(format!("Task '{}' has no entry in the multiplicity table", node.label())))?;

        node.comp = cost.comp;
        let edges = out_degree.get(&id).copied().unwrap_or(0);
        match distribution {
            DataDistribution::Edges if edges > 0 => {
                node.task_data = 0.0;
                edge_share.insert(id, cost.data / edges as f64);
            }
            _ => node.task_data = cost.data,
        }
    }

    for edge in graph.edges_mut() {
        edge.transfer_data = edge_share.get(&edge.source).copied().unwrap_or(0.0);
    }
    Ok(())
}
