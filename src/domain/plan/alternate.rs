use crate::domain::plan::observation_plan::ObservationPlan;
use crate::domain::plan::scheduler::create_basic_plan;
use crate::error::Result;

/// Variations of an existing plan: the largest observation, by (demand, channels), is
/// taken out and re-inserted after every other observation, and each ordering is
/// re-planned in input order. The original plan comes first; duplicates are dropped.
pub fn alternate_plan_compositions(plan: &ObservationPlan, concurrent: bool) -> Result<Vec<ObservationPlan>> {
    let mut plans = vec![plan.clone()];

    let Some(largest_idx) = plan.observations.iter().enumerate().max_by_key(|(_, o)| (o.demand, o.channels)).map(|(idx, _)| idx) else {
        return Ok(plans);
    };

    let largest = &plan.observations[largest_idx];
    let rest: Vec<_> = plan.observations.iter().enumerate().filter(|(idx, _)| *idx != largest_idx).map(|(_, o)| o.clone()).collect();

    for position in 1..=rest.len() {
        let mut reordered = rest.clone();
        reordered.insert(position, largest.clone());

        let candidate = create_basic_plan(reordered, plan.max_telescope_usage, concurrent, None)?;
        let signature = candidate.signature();
        if plans.iter().all(|p| p.signature() != signature) {
            plans.push(candidate);
        }
    }

    log::debug!("Derived {} alternate plans by moving '{}'", plans.len() - 1, largest.name);
    Ok(plans)
}
