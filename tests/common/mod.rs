#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use ska_rust_workflow::domain::observation::observation::Observation;
use ska_rust_workflow::domain::telescope::Telescope;
use ska_rust_workflow::domain::utils::id::ObservationName;

pub const COMPONENT_SIZING: &str = "\
,hpso,Pipeline,Baseline,Antenna stations,Channels,Grid,Phase Rotation Predict,Visibility Weighting,Gridding Kernel Update,Phase Rotation,Degrid,Degridding Kernel Update
0,hpso01,ICAL,65000.0,512,256,0.2,0.01,0.01,0.02,0.01,0.0912,0.0
1,hpso01,ICAL_data,65000.0,512,256,1.5,0.0,0.0,0.0,0.0,2.0,0.5
2,hpso01,DPrepA,65000.0,512,256,0.1,0.0,0.0,0.0,0.0,0.05,0.01
3,hpso01,DPrepA_data,65000.0,512,256,1.0,0.0,0.0,0.0,0.0,0.5,0.0
4,hpso01,ICAL,15000.0,512,256,0.05,0.0,0.0,0.0,0.0,0.01,0.0
5,hpso01,ICAL_data,15000.0,512,256,0.5,0.0,0.0,0.0,0.0,0.5,0.0
";

pub const TOTAL_SIZING: &str = "\
HPSO,Baseline,Stations,Channels,Ingest [Pflop/s],Ingest Rate [TB/s],RCAL [Pflop/s],FastImg [Pflop/s]
hpso01,65000.0,512,256,0.3,0.0024,0.0,0.0
hpso04a,65000.0,256,256,0.05,0.0004,0.02,0.01
";

pub fn observation(name: &str, demand: u32, duration: u64, workflows: &[&str]) -> Observation {
    Observation::new(
        ObservationName::new(name),
        Telescope::Low,
        "hpso01",
        demand,
        duration,
        workflows.iter().map(|w| w.to_string()).collect(),
        256,
        4,
        65000.0,
    )
}

/// A(64), B(256), C(64), D(64), all 18000 s long.
pub fn scenario_observations() -> Vec<Observation> {
    [("A", 64), ("B", 256), ("C", 64), ("D", 64)].iter().map(|(name, demand)| observation(name, *demand, 18000, &["DPrepA"])).collect()
}

/// FrequencySplit -> `width` x (Degrid -> Grid) -> Gather, as an unroller would print it.
pub fn scatter_pgt(width: usize) -> Value {
    let mut elements = vec![json!({"oid": "split", "nm": "FrequencySplit", "app": "dlg.apps.simple.SleepApp"})];
    elements.push(json!({"oid": "gather", "nm": "Gather", "app": "dlg.apps.simple.SleepApp"}));

    let degrids: Vec<String> = (0..width).map(|i| format!("degrid_{}", i)).collect();
    elements.push(json!({"oid": "split_out", "storage": "Memory", "producers": ["split"], "consumers": degrids}));

    for i in 0..width {
        elements.push(json!({"oid": format!("degrid_{}", i), "nm": "Degrid", "app": "dlg.apps.simple.SleepApp"}));
        elements.push(json!({"oid": format!("grid_{}", i), "nm": "Grid", "app": "dlg.apps.simple.SleepApp"}));
        elements.push(json!({"oid": format!("degrid_out_{}", i), "storage": "Memory", "producers": [format!("degrid_{}", i)], "consumers": [format!("grid_{}", i)]}));
        elements.push(json!({"oid": format!("grid_out_{}", i), "storage": "Memory", "producers": [format!("grid_{}", i)], "consumers": [{"gather": "vis"}]}));
    }

    // The unroller prints a list whose last entry is the list of reprodata.
    elements.push(json!({"reprodata": {"rmode": "0"}}));
    Value::Array(elements)
}

/// Writes the sizing tables, a plan specification, pre-unrolled graphs and a generator
/// configuration into `dir`, and creates the output directory. Returns the config path.
pub fn write_generator_inputs(dir: &Path, config_extra: Value) -> std::path::PathBuf {
    fs::write(dir.join("components.csv"), COMPONENT_SIZING).unwrap();
    fs::write(dir.join("totals.csv"), TOTAL_SIZING).unwrap();

    fs::create_dir_all(dir.join("pgt")).unwrap();
    fs::write(dir.join("pgt/prototype_4.json"), scatter_pgt(4).to_string()).unwrap();
    fs::write(dir.join("pgt/pulsar.json"), scatter_pgt(2).to_string()).unwrap();
    fs::create_dir_all(dir.join("out")).unwrap();

    let plan = json!({
        "telescope": "low",
        "infrastructure": "parametric",
        "nodes": 512,
        "items": [
            {"count": 2, "hpso": "hpso01", "workflows": ["ICAL", "DPrepA"], "demand": 512, "duration": 18000,
             "channels": 256, "workflow_parallelism": 4, "baseline": 65000.0},
            {"count": 1, "hpso": "hpso04a", "workflows": ["PSS"], "demand": 256, "duration": 3600,
             "channels": 256, "workflow_parallelism": 4, "baseline": 65000.0}
        ]
    });
    fs::write(dir.join("plan.json"), plan.to_string()).unwrap();

    let mut config = json!({
        "observation_plan": "plan.json",
        "output_dir": "out",
        "component_sizing": "components.csv",
        "total_sizing": "totals.csv",
        "pipelines": {"ICAL": "prototype", "DPrepA": "prototype", "PSS": "pulsar"},
        "templates": {"prototype": "templates/prototype.graph", "pulsar": "templates/pulsar.graph"},
        "data_distribution": "edges",
        "unroller": {"kind": "precomputed", "directory": "pgt"},
        "config_name": "simulation.json"
    });
    if let (Some(target), Some(extra)) = (config.as_object_mut(), config_extra.as_object()) {
        target.extend(extra.clone());
    }

    let path = dir.join("config.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}
