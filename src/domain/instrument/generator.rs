use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::api::config_dto::{GeneratorConfigDto, UnrollerDto};
use crate::api::instrument_dto::{FinalConfigDto, InstrumentDto};
use crate::domain::cluster::hardware::{HardwareCapability, HardwareSpec};
use crate::domain::cost::component_groups::CostModelConfig;
use crate::domain::graph::expander::expander_from_dto;
use crate::domain::graph::template::{GraphType, LogicalGraphTemplate};
use crate::domain::instrument::instrument_config::generate_instrument_config;
use crate::domain::instrument::workflow_builder::{WorkflowBuilder, WorkflowSettings};
use crate::domain::observation::factory::{PlanSpec, observations_from_plan_spec};
use crate::domain::plan::observation_plan::ObservationPlan;
use crate::domain::plan::scheduler::schedule;
use crate::domain::plan::scheduling_policy::SchedulingPolicy;
use crate::error::{Error, Result};
use crate::loader::parser::{parse_json_file, resolve_path, write_json_file};
use crate::loader::sizing::{ComponentSizing, TotalSizing};

const TIMESTEPS: [&str; 2] = ["seconds", "minutes"];

/// A validated generator configuration with every path resolved.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub observation_plan: PathBuf,
    pub output_dir: PathBuf,
    pub component_sizing: PathBuf,
    pub total_sizing: PathBuf,
    pub pipelines: BTreeMap<String, GraphType>,
    pub templates: BTreeMap<GraphType, PathBuf>,
    pub settings: WorkflowSettings,
    pub timestep: String,
    pub overwrite: bool,
    pub policy: SchedulingPolicy,
    pub max_telescope_usage: Option<u32>,
    pub shuffle_seed: Option<u64>,
    pub unroller: UnrollerDto,
    pub config_name: Option<String>,
    base_dir: PathBuf,
}

impl GeneratorConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let dto: GeneratorConfigDto = parse_json_file(path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_dto(dto, &base_dir)
    }

    /// Relative paths in `dto` are taken relative to `base_dir`.
    pub fn from_dto(dto: GeneratorConfigDto, base_dir: &Path) -> Result<Self> {
        let pipelines = dto
            .pipelines
            .iter()
            .map(|(name, graph_type)| -> Result<(String, GraphType)> { Ok((name.clone(), graph_type.parse()?)) })
            .collect::<Result<BTreeMap<_, _>>>()?;
        let templates = dto
            .templates
            .iter()
            .map(|(graph_type, path)| -> Result<(GraphType, PathBuf)> { Ok((graph_type.parse()?, resolve_path(base_dir, path))) })
            .collect::<Result<BTreeMap<_, _>>>()?;

        if !TIMESTEPS.contains(&dto.timestep.as_str()) {
            return Err(Error::configuration(format!("Timestep must be one of {:?}, got '{}'", TIMESTEPS, dto.timestep)));
        }

        Ok(GeneratorConfig {
            observation_plan: resolve_path(base_dir, &dto.observation_plan),
            output_dir: resolve_path(base_dir, &dto.output_dir),
            component_sizing: resolve_path(base_dir, &dto.component_sizing),
            total_sizing: resolve_path(base_dir, &dto.total_sizing),
            pipelines,
            templates,
            settings: WorkflowSettings {
                data: dto.data,
                distribution: dto.data_distribution.parse()?,
                cost_model: CostModelConfig::from_dto(dto.cost_model.as_ref()),
            },
            timestep: dto.timestep,
            overwrite: dto.overwrite,
            policy: dto.scheduling.policy.parse()?,
            max_telescope_usage: dto.scheduling.max_telescope_usage,
            shuffle_seed: dto.scheduling.shuffle_seed,
            unroller: dto.unroller,
            config_name: dto.config_name,
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// Where the final configuration is written.
    pub fn final_config_path(&self) -> PathBuf {
        let name = self.config_name.clone().unwrap_or_else(|| Local::now().format("skaworkflows_%Y-%m-%d_%H-%M-%S.json").to_string());
        self.output_dir.join(name)
    }

    fn workflow_builder(&self) -> Result<WorkflowBuilder> {
        let templates = self.templates.iter().map(|(graph_type, path)| (*graph_type, LogicalGraphTemplate::new(path))).collect();

        WorkflowBuilder::new(
            ComponentSizing::from_path(&self.component_sizing)?,
            TotalSizing::from_path(&self.total_sizing)?,
            self.pipelines.clone(),
            templates,
            expander_from_dto(&self.unroller, &self.base_dir),
            self.settings.clone(),
        )
    }
}

/// Expands `spec` into observations and schedules them with `policy`.
///
/// Without `max_telescope_usage` the telescope's full array count is available.
pub fn create_plan(spec: &PlanSpec, policy: SchedulingPolicy, max_telescope_usage: Option<u32>, shuffle_seed: Option<u64>) -> Result<ObservationPlan> {
    let observations = observations_from_plan_spec(spec);
    if observations.is_empty() {
        return Err(Error::configuration("Observation plan specification contains no observations"));
    }

    let max_telescope_usage = max_telescope_usage.unwrap_or_else(|| spec.telescope.max_stations());
    schedule(observations, max_telescope_usage, policy, shuffle_seed)
}

pub fn load_plan_spec(path: impl AsRef<Path>) -> Result<PlanSpec> {
    PlanSpec::from_dto(parse_json_file(path)?)
}

/// Runs a full generation: plans the observations, writes one workflow file per distinct
/// observation and the final simulator configuration. Returns the final config's path.
///
/// An existing final config is left untouched unless `overwrite` is set.
pub fn create_config(config: &GeneratorConfig) -> Result<PathBuf> {
    if !config.output_dir.is_dir() {
        return Err(Error::configuration(format!("Output directory '{}' does not exist", config.output_dir.display())));
    }

    let final_path = config.final_config_path();
    if final_path.exists() && !config.overwrite {
        log::info!("{} already exists; set overwrite to regenerate it", final_path.display());
        return Ok(final_path);
    }

    let spec = load_plan_spec(&config.observation_plan)?;
    let hardware = HardwareSpec::new(spec.telescope, spec.infrastructure, spec.nodes)?;
    let mut plan = create_plan(&spec, config.policy, config.max_telescope_usage, config.shuffle_seed)?;
    log::info!("Planned {} observations with the {} policy, makespan {} s", plan.len(), config.policy, plan.makespan());

    let builder = config.workflow_builder()?;
    let cluster = hardware.to_descriptor();
    let instrument = generate_instrument_config(&mut plan, &builder, &cluster, &config.output_dir)?;

    let final_config = FinalConfigDto { instrument: InstrumentDto { telescope: instrument }, cluster, buffer: hardware.buffer_config(), timestep: config.timestep.clone() };
    write_json_file(&final_path, &final_config)?;

    log::info!("Wrote {}", final_path.display());
    Ok(final_path)
}
