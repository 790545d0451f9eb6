use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::observation::observation::Observation;
use crate::domain::plan::PLAN_ANALYTICS_TARGET;
use crate::domain::plan::observation_plan::ObservationPlan;
use crate::domain::plan::scheduling_policy::SchedulingPolicy;
use crate::error::{Error, Result};

/// Observations sharing one start time. The bucket closes at the latest end of its members.
#[derive(Debug, Default)]
struct Bucket {
    start: u64,
    finish: Option<u64>,
    usage: u32,
}

impl Bucket {
    fn is_empty(&self) -> bool {
        self.finish.is_none()
    }

    fn fits(&self, demand: u32, max_telescope_usage: u32) -> bool {
        self.usage + demand <= max_telescope_usage
    }

    fn place(&mut self, observation: &mut Observation) {
        observation.schedule_at(self.start);
        self.usage += observation.demand;
        let end = observation.end();
        self.finish = Some(self.finish.map_or(end, |finish| finish.max(end)));
    }

    fn close(&mut self) {
        self.start = self.finish.unwrap_or(self.start);
        self.finish = None;
        self.usage = 0;
    }
}

fn check_capacity(observations: &[Observation], max_telescope_usage: u32) -> Result<()> {
    match observations.iter().find(|o| o.demand > max_telescope_usage) {
        Some(o) => Err(Error::CapacityError { observation: o.name.to_string(), demand: o.demand, max_telescope_usage }),
        None => Ok(()),
    }
}

fn record_placement(policy: SchedulingPolicy, observation: &Observation, bucket: &Bucket, loop_count: usize) {
    tracing::debug!(
        target: PLAN_ANALYTICS_TARGET,
        Policy = %policy,
        Observation = %observation.name,
        Start = observation.start,
        Duration = observation.duration,
        Demand = observation.demand,
        TelescopeUsage = bucket.usage,
        LoopCount = loop_count,
    );
}

/// Moves the observations into a plan, ordered as they were placed.
fn into_plan(policy: SchedulingPolicy, observations: Vec<Observation>, placed: Vec<usize>, max_telescope_usage: u32) -> ObservationPlan {
    let mut slots: Vec<Option<Observation>> = observations.into_iter().map(Some).collect();
    let ordered = placed.into_iter().filter_map(|idx| slots[idx].take()).collect();
    let plan = ObservationPlan::new(ordered, max_telescope_usage);

    tracing::info!(
        target: PLAN_ANALYTICS_TARGET,
        LogDescription = "Observation plan created",
        Policy = %policy,
        Observations = plan.len(),
        Makespan = plan.makespan(),
        PeakUsage = plan.peak_usage(),
        MaxTelescopeUsage = max_telescope_usage,
    );
    plan
}

/// Greedy bucketed packing of observations onto the telescope.
///
/// Unplanned observations are kept sorted by (baseline, duration). Every time the loop
/// counter is a multiple of the number of remaining observations the largest one is
/// offered to the current bucket; otherwise the bucket is filled in sorted order and
/// closed. A closed bucket moves the start to the latest end of its members, so buckets
/// never overlap and the capacity only has to hold within a bucket.
pub fn create_observation_plan(mut observations: Vec<Observation>, max_telescope_usage: u32) -> Result<ObservationPlan> {
    check_capacity(&observations, max_telescope_usage)?;
    observations.iter_mut().for_each(Observation::reset_schedule);

    let policy = SchedulingPolicy::Greedy;
    let mut placed = Vec::with_capacity(observations.len());
    let mut unplanned: Vec<usize> = (0..observations.len()).collect();
    let mut bucket = Bucket::default();
    let mut loop_count: usize = 0;

    while !unplanned.is_empty() {
        unplanned.sort_by(|&a, &b| {
            let (a, b) = (&observations[a], &observations[b]);
            a.baseline.total_cmp(&b.baseline).then(a.duration.cmp(&b.duration))
        });

        let remaining = unplanned.len();
        if remaining > 1 && loop_count % remaining == 0 {
            let largest = unplanned[remaining - 1];
            if bucket.is_empty() || bucket.fits(observations[largest].demand, max_telescope_usage) {
                bucket.place(&mut observations[largest]);
                placed.push(largest);
                record_placement(policy, &observations[largest], &bucket, loop_count);
            }
            loop_count += 1;
        } else {
            for &idx in &unplanned {
                if bucket.fits(observations[idx].demand, max_telescope_usage) {
                    bucket.place(&mut observations[idx]);
                    placed.push(idx);
                    record_placement(policy, &observations[idx], &bucket, loop_count);
                    loop_count += 1;
                }
            }
            bucket.close();
        }

        unplanned.retain(|&idx| !observations[idx].planned);
    }

    Ok(into_plan(policy, observations, placed, max_telescope_usage))
}

/// Plans observations in input order (optionally shuffled with `shuffle_seed`).
///
/// With `concurrent` each bucket is filled first-fit before it closes; without it every
/// observation gets a bucket of its own, so starts are cumulative durations.
pub fn create_basic_plan(mut observations: Vec<Observation>, max_telescope_usage: u32, concurrent: bool, shuffle_seed: Option<u64>) -> Result<ObservationPlan> {
    check_capacity(&observations, max_telescope_usage)?;
    observations.iter_mut().for_each(Observation::reset_schedule);

    if let Some(seed) = shuffle_seed {
        observations.shuffle(&mut StdRng::seed_from_u64(seed));
    }

    let policy = if concurrent { SchedulingPolicy::FirstFit } else { SchedulingPolicy::Serial };
    let mut placed = Vec::with_capacity(observations.len());
    let mut bucket = Bucket::default();

    while placed.len() < observations.len() {
        for idx in 0..observations.len() {
            if observations[idx].planned {
                continue;
            }
            if !concurrent {
                bucket.place(&mut observations[idx]);
                placed.push(idx);
                record_placement(policy, &observations[idx], &bucket, placed.len());
                bucket.close();
            } else if bucket.fits(observations[idx].demand, max_telescope_usage) {
                bucket.place(&mut observations[idx]);
                placed.push(idx);
                record_placement(policy, &observations[idx], &bucket, placed.len());
            }
        }
        bucket.close();
    }

    Ok(into_plan(policy, observations, placed, max_telescope_usage))
}

/// Plans `observations` with the given policy. The shuffle seed only applies to the
/// input-order policies.
pub fn schedule(observations: Vec<Observation>, max_telescope_usage: u32, policy: SchedulingPolicy, shuffle_seed: Option<u64>) -> Result<ObservationPlan> {
    log::info!("Scheduling {} observations with policy '{}' (max telescope usage {})", observations.len(), policy, max_telescope_usage);

    match policy {
        SchedulingPolicy::Greedy => {
            if shuffle_seed.is_some() {
                log::debug!("Shuffle seed ignored by the greedy policy");
            }
            create_observation_plan(observations, max_telescope_usage)
        }
        SchedulingPolicy::FirstFit => create_basic_plan(observations, max_telescope_usage, true, shuffle_seed),
        SchedulingPolicy::Serial => create_basic_plan(observations, max_telescope_usage, false, shuffle_seed),
    }
}
