use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::domain::cost::component_groups::CostModelConfig;
use crate::domain::cost::distributor::{CostContext, DataDistribution, distribute_component_costs, distribute_pipeline_cost};
use crate::domain::cost::stats::{ComponentCostStats, write_stats_csv};
use crate::domain::graph::concatenate::concatenate_workflows;
use crate::domain::graph::expander::{CachingExpander, GraphExpander};
use crate::domain::graph::task_graph::TaskGraph;
use crate::domain::graph::template::{GraphType, LogicalGraphTemplate};
use crate::domain::instrument::workflow_file::{find_existing_workflow, produce_workflow_file, workflow_file_name, workflow_parameters};
use crate::domain::observation::observation::Observation;
use crate::error::{Error, Result};
use crate::loader::parser::write_json_file;
use crate::loader::sizing::{ComponentSizing, TotalSizing};

/// How workflow costs are produced, shared by every observation of a run.
#[derive(Debug, Clone, Default)]
pub struct WorkflowSettings {
    pub data: bool,
    pub distribution: DataDistribution,
    pub cost_model: CostModelConfig,
}

/// A cost-annotated workflow and the per-component statistics behind it.
#[derive(Debug)]
pub struct BuiltWorkflow {
    pub graph: TaskGraph,
    pub stats: Vec<ComponentCostStats>,
}

/// Builds the workflow of an observation: every pipeline is expanded from its template,
/// costed, and the pipelines are chained in the observation's order.
pub struct WorkflowBuilder {
    component_sizing: ComponentSizing,
    total_sizing: TotalSizing,
    pipelines: BTreeMap<String, GraphType>,
    templates: BTreeMap<GraphType, LogicalGraphTemplate>,
    expander: CachingExpander,
    settings: WorkflowSettings,
}

impl WorkflowBuilder {
    /// Fails if a pipeline's graph type has no template.
    pub fn new(
        component_sizing: ComponentSizing,
        total_sizing: TotalSizing,
        pipelines: BTreeMap<String, GraphType>,
        templates: BTreeMap<GraphType, LogicalGraphTemplate>,
        expander: Box<dyn GraphExpander>,
        settings: WorkflowSettings,
    ) -> Result<Self> {
        if let Some((pipeline, graph_type)) = pipelines.iter().find(|(_, graph_type)| !templates.contains_key(graph_type)) {
            return Err(Error::configuration(format!("Pipeline '{}' uses graph type '{}', which has no template", pipeline, graph_type)));
        }

        Ok(WorkflowBuilder { component_sizing, total_sizing, pipelines, templates, expander: CachingExpander::new(expander), settings })
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub fn total_sizing(&self) -> &TotalSizing {
        &self.total_sizing
    }

    /// Number of distinct (template, parallelism) expansions performed so far.
    pub fn expansions(&self) -> usize {
        self.expander.cached_entries()
    }

    pub fn graph_type(&self, pipeline: &str) -> Result<GraphType> {
        self.pipelines.get(pipeline).copied().ok_or_else(|| Error::configuration(format!("No graph type configured for pipeline '{}'", pipeline)))
    }

    /// Sorted, deduplicated graph types used by `observation`.
    pub fn graph_types_of(&self, observation: &Observation) -> Result<Vec<GraphType>> {
        let mut types = observation.workflows.iter().map(|w| self.graph_type(w)).collect::<Result<Vec<_>>>()?;
        types.sort();
        types.dedup();
        Ok(types)
    }

    /// Task graph of one pipeline of `observation`, with costs attached.
    pub fn build_pipeline(&self, observation: &Observation, pipeline: &str) -> Result<BuiltWorkflow> {
        let graph_type = self.graph_type(pipeline)?;
        let template = self
            .templates
            .get(&graph_type)
            .ok_or_else(|| Error::configuration(format!("No template for graph type '{}'", graph_type)))?;

        let physical = self.expander.get(template, observation.workflow_parallelism)?;
        let mut graph = physical.to_task_graph(pipeline)?;

        let ctx = CostContext {
            observation,
            pipeline,
            data: self.settings.data,
            distribution: self.settings.distribution,
            cost_model: &self.settings.cost_model,
        };
        let stats = if graph_type.is_whole_pipeline() {
            distribute_pipeline_cost(&mut graph, &physical, &ctx, &self.total_sizing)?
        } else {
            distribute_component_costs(&mut graph, &physical, &ctx, &self.component_sizing)?
        };

        Ok(BuiltWorkflow { graph, stats })
    }

    pub fn build_workflow(&self, observation: &Observation) -> Result<BuiltWorkflow> {
        let mut graphs = HashMap::with_capacity(observation.workflows.len());
        let mut stats = Vec::new();

        for pipeline in &observation.workflows {
            if graphs.contains_key(pipeline) {
                continue;
            }
            let built = self.build_pipeline(observation, pipeline)?;
            stats.extend(built.stats);
            graphs.insert(pipeline.clone(), built.graph);
        }

        let graph = concatenate_workflows(graphs, &observation.workflows)?;
        Ok(BuiltWorkflow { graph, stats })
    }

    /// Path of the workflow file for `observation` inside `workflows_dir`.
    ///
    /// A file already in the directory with identical header parameters is reused.
    /// Otherwise the workflow is built and written together with its `<file>.csv` stats.
    pub fn generate_workflow_file(&self, observation: &Observation, workflows_dir: &Path) -> Result<PathBuf> {
        let params = workflow_parameters(observation, self.settings.data, self.settings.distribution);

        if let Some(existing) = find_existing_workflow(workflows_dir, &params)? {
            log::info!("{}: reusing workflow {}", observation.name, existing.display());
            return Ok(existing);
        }

        let built = self.build_workflow(observation)?;
        let path = workflows_dir.join(workflow_file_name(&params));

        write_json_file(&path, &produce_workflow_file(&built.graph, params))?;
        write_stats_csv(stats_path(&path), &built.stats)?;

        log::info!(
            "{}: wrote workflow {} ({} tasks, {} edges, {:.3e} FLOPs)",
            observation.name,
            path.display(),
            built.graph.node_count(),
            built.graph.edge_count(),
            built.graph.total_comp()
        );
        Ok(path)
    }
}

fn stats_path(workflow: &Path) -> PathBuf {
    let mut name = workflow.as_os_str().to_owned();
    name.push(".csv");
    PathBuf::from(name)
}
