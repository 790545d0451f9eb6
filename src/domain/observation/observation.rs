use std::hash::{Hash, Hasher};

use crate::api::instrument_dto::ObservationEntryDto;
use crate::domain::telescope::Telescope;
use crate::domain::utils::id::ObservationName;
use crate::loader::sizing::SizingQuery;

/// Ingest requirements of an observation, derived from the total sizing table and
/// the cluster description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestDemand {
    /// Machines that have to be reserved for ingest while the observation runs.
    pub machines: u32,
    /// FLOP/s.
    pub flops: f64,
    /// Bytes/s written to the buffer.
    pub bytes: f64,
}

/// Parameters that decide whether two observations produce the same workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationKey<'a> {
    pub hpso: &'a str,
    pub demand: u32,
    pub workflow_parallelism: u32,
    baseline_bits: u64,
}

/// A single telescope observation.
///
/// Created by the factory, then mutated only by the scheduler (`start`, `planned`)
/// and by ingest sizing (`ingest`).
#[derive(Debug, Clone)]
pub struct Observation {
    pub name: ObservationName,
    pub telescope: Telescope,
    /// Science tag, e.g. `hpso01`.
    pub hpso: String,
    /// Arrays (stations or dishes) requested.
    pub demand: u32,
    /// Seconds.
    pub duration: u64,
    /// Pipelines processing the observation, in execution order.
    pub workflows: Vec<String>,
    pub channels: u32,
    pub workflow_parallelism: u32,
    pub baseline: f64,

    pub start: u64,
    pub planned: bool,
    pub ingest: Option<IngestDemand>,
}

impl Observation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: ObservationName,
        telescope: Telescope,
        hpso: impl Into<String>,
        demand: u32,
        duration: u64,
        workflows: Vec<String>,
        channels: u32,
        workflow_parallelism: u32,
        baseline: f64,
    ) -> Self {
        Observation {
            name,
            telescope,
            hpso: hpso.into(),
            demand,
            duration,
            workflows,
            channels,
            workflow_parallelism,
            baseline,
            start: 0,
            planned: false,
            ingest: None,
        }
    }

    pub fn key(&self) -> ObservationKey<'_> {
        ObservationKey { hpso: &self.hpso, demand: self.demand, workflow_parallelism: self.workflow_parallelism, baseline_bits: self.baseline.to_bits() }
    }

    pub fn end(&self) -> u64 {
        self.start + self.duration
    }

    pub fn sizing_query(&self) -> SizingQuery<'_> {
        SizingQuery { hpso: &self.hpso, baseline: self.baseline, channels: self.channels, demand: self.demand }
    }

    pub fn schedule_at(&mut self, start: u64) {
        self.start = start;
        self.planned = true;
    }

    pub fn reset_schedule(&mut self) {
        self.start = 0;
        self.planned = false;
    }

    pub fn to_dto(&self) -> ObservationEntryDto {
        ObservationEntryDto {
            name: self.name.to_string(),
            start: self.start,
            duration: self.duration,
            instrument_demand: self.demand,
            typ: self.hpso.clone(),
            data_product_rate: self.ingest.map(|i| i.bytes).unwrap_or(0.0),
        }
    }
}

impl PartialEq for Observation {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Observation {}

impl Hash for Observation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}
