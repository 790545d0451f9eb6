use std::fs;
use std::path::{Path, PathBuf};

use crate::api::workflow_file_dto::{GeneratorDto, WorkflowFileDto, WorkflowHeaderDto, WorkflowHeaderEnvelopeDto, WorkflowParametersDto};
use crate::domain::cost::distributor::DataDistribution;
use crate::domain::graph::task_graph::TaskGraph;
use crate::domain::observation::observation::Observation;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

/// Parameters identifying the workflow of `observation`.
pub fn workflow_parameters(observation: &Observation, data: bool, distribution: DataDistribution) -> WorkflowParametersDto {
    WorkflowParametersDto {
        max_arrays: observation.telescope.max_stations(),
        channels: observation.channels,
        arrays: observation.demand,
        baseline: observation.baseline,
        duration: observation.duration,
        workflow_parallelism: observation.workflow_parallelism,
        workflows: observation.workflows.clone(),
        hpso: observation.hpso.clone(),
        data,
        data_distribution: distribution.to_string(),
    }
}

/// File name derived from the workflow parameters, so reruns land on the same file.
pub fn workflow_file_name(params: &WorkflowParametersDto) -> String {
    format!(
        "{}_{}_{}_{}_{}_{}_{}_{}_{}.json",
        params.hpso,
        params.arrays,
        params.workflow_parallelism,
        params.baseline,
        params.channels,
        params.duration,
        params.workflows.join("-"),
        if params.data { "data" } else { "nodata" },
        params.data_distribution,
    )
}

pub fn produce_workflow_file(graph: &TaskGraph, params: WorkflowParametersDto) -> WorkflowFileDto {
    WorkflowFileDto {
        header: WorkflowHeaderDto {
            generator: GeneratorDto { name: env!("CARGO_PKG_NAME").to_string(), version: env!("CARGO_PKG_VERSION").to_string() },
            parameters: params,
            time: false,
        },
        graph: graph.to_node_link_dto(),
    }
}

/// First workflow file in `dir` (by name) whose header parameters equal `params`.
///
/// CSV side-cars and files that do not parse as workflow files are skipped.
pub fn find_existing_workflow(dir: &Path, params: &WorkflowParametersDto) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_none_or(|ext| ext != "csv"))
        .collect();
    candidates.sort();

    for path in candidates {
        match parse_json_file::<WorkflowHeaderEnvelopeDto>(&path) {
            Ok(envelope) if envelope.header.parameters == *params => return Ok(Some(path)),
            Ok(_) => {}
            Err(e) => log::debug!("Skipping {} while looking for reusable workflows: {}", path.display(), e),
        }
    }
    Ok(None)
}
