use std::path::Path;

use crate::api::cluster_dto::ClusterDescriptorDto;
use crate::api::instrument_dto::{InstrumentConfigDto, PipelineEntryDto};
use crate::domain::cluster::ingest::assign_ingest_demands;
use crate::domain::instrument::workflow_builder::WorkflowBuilder;
use crate::domain::plan::observation_plan::ObservationPlan;
use crate::error::{Error, Result};

/// Directory below the output directory that holds the workflow files.
pub const WORKFLOW_DIR: &str = "workflows";

/// Produces the workflow of every planned observation and the instrument section of the
/// final configuration.
///
/// Pipelines are keyed by observation name and point at their workflow file relative to
/// `output_dir`; observations are listed by start time.
pub fn generate_instrument_config(
    plan: &mut ObservationPlan,
    builder: &WorkflowBuilder,
    cluster: &ClusterDescriptorDto,
    output_dir: &Path,
) -> Result<InstrumentConfigDto> {
    if let Some(unplanned) = plan.observations.iter().find(|o| !o.planned) {
        return Err(Error::configuration(format!("Observation '{}' has not been scheduled", unplanned.name)));
    }
    let Some(telescope) = plan.observations.first().map(|o| o.telescope) else {
        return Err(Error::configuration("Observation plan is empty"));
    };

    assign_ingest_demands(&mut plan.observations, builder.total_sizing(), cluster)?;

    let workflows_dir = output_dir.join(WORKFLOW_DIR);
    std::fs::create_dir_all(&workflows_dir)?;

    let mut config = InstrumentConfigDto {
        observatory: telescope.to_string(),
        max_ingest_resources: 0,
        total_arrays: plan.max_telescope_usage,
        pipelines: Default::default(),
        observations: Vec::with_capacity(plan.len()),
    };

    for observation in plan.sorted_by_start() {
        let ingest_demand = observation.ingest.map(|i| i.machines).unwrap_or(0);
        config.max_ingest_resources = config.max_ingest_resources.max(ingest_demand);

        let workflow_path = builder.generate_workflow_file(observation, &workflows_dir)?;
        let file_name = workflow_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let settings = builder.settings();

        let entry = PipelineEntryDto {
            workflow: format!("{}/{}", WORKFLOW_DIR, file_name),
            ingest_demand,
            duration: observation.duration,
            channels: observation.channels,
            workflow_parallelism: observation.workflow_parallelism,
            demand: observation.demand,
            baseline: observation.baseline,
            workflow_type: builder.graph_types_of(observation)?.iter().map(ToString::to_string).collect(),
            graph_type: observation.workflows.clone(),
            data: settings.data,
            data_distribution: settings.distribution.to_string(),
        };

        config.pipelines.insert(observation.name.to_string(), entry);
        config.observations.push(observation.to_dto());
    }

    log::info!(
        "Instrument config for {}: {} observations, {} graph expansions, up to {} ingest machines",
        config.observatory,
        config.observations.len(),
        builder.expansions(),
        config.max_ingest_resources
    );
    Ok(config)
}
