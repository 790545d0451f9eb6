use crate::api::plan_dto::{HpsoParameterDto, PlanSpecDto};
use crate::domain::cluster::hardware::Infrastructure;
use crate::domain::observation::observation::Observation;
use crate::domain::telescope::Telescope;
use crate::domain::utils::id::ObservationName;
use crate::error::{Error, Result};

/// One record of a plan specification: `count` identical observations of a science tag.
#[derive(Debug, Clone, PartialEq)]
pub struct HpsoParameters {
    pub count: i64,
    pub hpso: String,
    pub workflows: Vec<String>,
    pub demand: u32,
    pub duration: u64,
    pub channels: u32,
    pub workflow_parallelism: u32,
    pub baseline: f64,
    /// Overrides the telescope of the surrounding plan.
    pub telescope: Option<Telescope>,
}

impl HpsoParameters {
    pub fn from_dto(dto: HpsoParameterDto) -> Result<Self> {
        if dto.workflow_parallelism == 0 {
            return Err(Error::configuration(format!("'{}' has a workflow parallelism of 0", dto.hpso)));
        }
        let telescope = dto.telescope.as_deref().map(str::parse).transpose()?;
        Ok(HpsoParameters {
            count: dto.count,
            hpso: dto.hpso,
            workflows: dto.workflows,
            demand: dto.demand,
            duration: dto.duration,
            channels: dto.channels,
            workflow_parallelism: dto.workflow_parallelism,
            baseline: dto.baseline,
            telescope,
        })
    }
}

/// A parsed plan specification.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSpec {
    pub telescope: Telescope,
    pub infrastructure: Infrastructure,
    /// Compute nodes of the cluster; the telescope's reference design when absent.
    pub nodes: u32,
    pub hpsos: Vec<HpsoParameters>,
}

impl PlanSpec {
    pub fn from_dto(dto: PlanSpecDto) -> Result<Self> {
        let telescope: Telescope = dto.telescope.parse()?;
        let infrastructure: Infrastructure = dto.infrastructure.parse()?;
        let hpsos = dto.hpsos.into_iter().map(HpsoParameters::from_dto).collect::<Result<Vec<_>>>()?;

        Ok(PlanSpec { telescope, infrastructure, nodes: dto.nodes.unwrap_or_else(|| telescope.default_compute_nodes()), hpsos })
    }
}

/// Creates `count` observations named `{hpso}_{offset + i}`. A non-positive count yields none.
pub fn create_observations(params: &HpsoParameters, telescope: Telescope, offset: usize) -> Vec<Observation> {
    if params.count <= 0 {
        return Vec::new();
    }

    (0..params.count as usize)
        .map(|i| {
            Observation::new(
                ObservationName::new(format!("{}_{}", params.hpso, offset + i)),
                params.telescope.unwrap_or(telescope),
                params.hpso.clone(),
                params.demand,
                params.duration,
                params.workflows.clone(),
                params.channels,
                params.workflow_parallelism,
                params.baseline,
            )
        })
        .collect()
}

/// Expands every record of the plan specification, in order, into observations.
///
/// The name offset runs across records so that a tag listed twice never produces the
/// same observation name.
pub fn observations_from_plan_spec(spec: &PlanSpec) -> Vec<Observation> {
    let mut observations = Vec::new();
    let mut offset = 0;

    for params in &spec.hpsos {
        let created = create_observations(params, spec.telescope, offset);
        offset += created.len();
        log::debug!("Created {} observations for {}", created.len(), params.hpso);
        observations.extend(created);
    }

    observations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(hpso: &str, count: i64) -> HpsoParameters {
        HpsoParameters {
            count,
            hpso: hpso.to_string(),
            workflows: vec!["ICAL".into(), "DPrepA".into()],
            demand: 512,
            duration: 18000,
            channels: 256,
            workflow_parallelism: 4,
            baseline: 65000.0,
            telescope: None,
        }
    }

    #[test]
    fn test_names_follow_offset() {
        let obs = create_observations(&params("hpso01", 3), Telescope::Low, 5);

        let names: Vec<String> = obs.iter().map(|o| o.name.to_string()).collect();
        assert_eq!(names, vec!["hpso01_5", "hpso01_6", "hpso01_7"]);
        assert!(obs.iter().all(|o| !o.planned && o.start == 0 && o.ingest.is_none()));
    }

    #[test]
    fn test_non_positive_count_is_empty() {
        assert!(create_observations(&params("hpso01", 0), Telescope::Low, 0).is_empty());
        assert!(create_observations(&params("hpso01", -2), Telescope::Low, 0).is_empty());
    }

    #[test]
    fn test_repeated_records_never_alias() {
        let spec = PlanSpec {
            telescope: Telescope::Low,
            infrastructure: Infrastructure::Parametric,
            nodes: 896,
            hpsos: vec![params("hpso01", 2), params("hpso02a", 1), params("hpso01", 2)],
        };

        let names: Vec<String> = observations_from_plan_spec(&spec).iter().map(|o| o.name.to_string()).collect();
        assert_eq!(names, vec!["hpso01_0", "hpso01_1", "hpso02a_2", "hpso01_3", "hpso01_4"]);
    }

    #[test]
    fn test_record_telescope_overrides_plan() {
        let mut mid = params("hpso13", 1);
        mid.telescope = Some(Telescope::Mid);

        let obs = create_observations(&mid, Telescope::Low, 0);
        assert_eq!(obs[0].telescope, Telescope::Mid);
    }

    #[test]
    fn test_plan_spec_from_dto() {
        let dto: PlanSpecDto = serde_json::from_str(
            r#"{"telescope": "low", "infrastructure": "parametric", "nodes": 896,
                "items": [{"count": 2, "hpso": "hpso01", "workflows": ["DPrepA"], "demand": 512,
                           "duration": 60, "channels": 256, "workflow_parallelism": 4, "baseline": 65000.0}]}"#,
        )
        .unwrap();

        let spec = PlanSpec::from_dto(dto).unwrap();
        assert_eq!(spec.telescope, Telescope::Low);
        assert_eq!(spec.hpsos[0].count, 2);

        let bad = PlanSpecDto { telescope: "alma".into(), infrastructure: "parametric".into(), nodes: None, hpsos: vec![] };
        assert!(matches!(PlanSpec::from_dto(bad), Err(Error::ConfigurationError(_))));
    }
}
