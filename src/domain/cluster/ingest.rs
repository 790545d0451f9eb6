use crate::api::cluster_dto::ClusterDescriptorDto;
use crate::domain::observation::observation::{IngestDemand, Observation};
use crate::domain::utils::units::{PETA, TERA};
use crate::error::{Error, Result};
use crate::loader::sizing::TotalSizing;

pub const INGEST_FLOPS_COLUMN: &str = "Ingest [Pflop/s]";
pub const INGEST_RATE_COLUMN: &str = "Ingest Rate [TB/s]";

/// Machines needed to provide `flops`, taking machine classes first-fit in name order.
pub fn machines_for(flops: f64, cluster: &ClusterDescriptorDto) -> Result<u32> {
    let mut provided = 0.0;
    let mut machines = 0;

    for machine in cluster.system.resources.values() {
        if provided >= flops {
            break;
        }
        if machine.flops <= 0.0 {
            continue;
        }
        let needed = ((flops - provided) / machine.flops).ceil() as u32;
        let taken = needed.min(machine.count);
        provided += taken as f64 * machine.flops;
        machines += taken;
    }

    if provided < flops {
        return Err(Error::configuration(format!("Cluster provides {:.3e} FLOP/s in total, ingest needs {:.3e} FLOP/s", provided, flops)));
    }
    Ok(machines)
}

pub fn calc_ingest_demand(observation: &Observation, totals: &TotalSizing, cluster: &ClusterDescriptorDto) -> Result<IngestDemand> {
    let query = observation.sizing_query();
    let flops = totals.rate(&query, INGEST_FLOPS_COLUMN)? * PETA;
    let bytes = totals.rate(&query, INGEST_RATE_COLUMN)? * TERA;
    let machines = machines_for(flops, cluster)?;

    Ok(IngestDemand { machines, flops, bytes })
}

/// Sets the ingest demand of every observation.
pub fn assign_ingest_demands(observations: &mut [Observation], totals: &TotalSizing, cluster: &ClusterDescriptorDto) -> Result<()> {
    for observation in observations.iter_mut() {
        let demand = calc_ingest_demand(observation, totals, cluster)?;
        log::debug!("{}: ingest on {} machines, {:.3e} FLOP/s, {:.3e} B/s", observation.name, demand.machines, demand.flops, demand.bytes);
        observation.ingest = Some(demand);
    }
    Ok(())
}
