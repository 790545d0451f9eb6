use crate::domain::observation::observation::Observation;

/// Observations with their assigned start times, in placement order.
#[derive(Debug, Clone)]
pub struct ObservationPlan {
    pub observations: Vec<Observation>,
    pub max_telescope_usage: u32,
}

impl ObservationPlan {
    pub fn new(observations: Vec<Observation>, max_telescope_usage: u32) -> Self {
        ObservationPlan { observations, max_telescope_usage }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// End of the last observation.
    pub fn makespan(&self) -> u64 {
        self.observations.iter().map(Observation::end).max().unwrap_or(0)
    }

    /// Highest summed demand at any instant.
    ///
    /// Usage only changes at observation boundaries, so probing every start is enough.
    pub fn peak_usage(&self) -> u32 {
        self.observations.iter().map(|probe| self.usage_at(probe.start)).max().unwrap_or(0)
    }

    pub fn usage_at(&self, time: u64) -> u32 {
        self.observations.iter().filter(|o| o.start <= time && time < o.end()).map(|o| o.demand).sum()
    }

    pub fn respects_capacity(&self) -> bool {
        self.peak_usage() <= self.max_telescope_usage
    }

    /// Observations ordered by start; placement order breaks ties.
    pub fn sorted_by_start(&self) -> Vec<&Observation> {
        let mut sorted: Vec<&Observation> = self.observations.iter().collect();
        sorted.sort_by_key(|o| o.start);
        sorted
    }

    /// `(name, start)` in placement order; two plans with equal signatures are the same plan.
    pub fn signature(&self) -> Vec<(String, u64)> {
        self.observations.iter().map(|o| (o.name.to_string(), o.start)).collect()
    }
}
