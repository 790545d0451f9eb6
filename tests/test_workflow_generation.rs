mod common;

use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use ska_rust_workflow::error::Error;
use ska_rust_workflow::generate_from_config_file;

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= b.abs() * 1e-9
}

fn workflow_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.join("out/workflows")).unwrap().map(|e| e.unwrap().file_name().to_string_lossy().into_owned()).collect();
    names.sort();
    names
}

#[test]
fn test_final_config_layout() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = common::write_generator_inputs(dir.path(), json!({}));

    let final_path = generate_from_config_file(&config_path, false).unwrap();
    assert_eq!(final_path, dir.path().join("out/simulation.json"));

    let config = read_json(&final_path);
    let telescope = &config["instrument"]["telescope"];

    assert_eq!(telescope["observatory"], "low");
    assert_eq!(telescope["total_arrays"], 512);
    // 0.3 PFLOP/s of ingest on 10.7 TFLOP/s machines
    assert_eq!(telescope["max_ingest_resources"], 28);
    assert_eq!(config["timestep"], "seconds");
    assert_eq!(config["cluster"]["system"]["resources"]["GenericSDP_LOW_CDR"]["count"], 512);
    assert!(config["buffer"]["hot"]["capacity"].as_i64().unwrap() > 0);

    let observations = telescope["observations"].as_array().unwrap();
    assert_eq!(observations.len(), 3);
    let starts: Vec<u64> = observations.iter().map(|o| o["start"].as_u64().unwrap()).collect();
    assert!(starts.windows(2).all(|w| w[0] <= w[1]));
    let pulsar = observations.iter().find(|o| o["name"] == "hpso04a_2").unwrap();
    assert_eq!(pulsar["type"], "hpso04a");
    assert_eq!(pulsar["instrument_demand"], 256);

    let pipelines = telescope["pipelines"].as_object().unwrap();
    assert_eq!(pipelines.keys().collect::<Vec<_>>(), vec!["hpso01_0", "hpso01_1", "hpso04a_2"]);
    assert_eq!(pipelines["hpso01_0"]["workflow"], pipelines["hpso01_1"]["workflow"]);
    assert_eq!(pipelines["hpso01_0"]["workflow_type"], json!(["prototype"]));
    assert_eq!(pipelines["hpso01_0"]["graph_type"], json!(["ICAL", "DPrepA"]));
    assert_eq!(pipelines["hpso04a_2"]["workflow_type"], json!(["pulsar"]));
    assert_eq!(pipelines["hpso04a_2"]["ingest_demand"], 5);
    assert_eq!(pipelines["hpso01_0"]["data_distribution"], "edges");

    for entry in pipelines.values() {
        assert!(dir.path().join("out").join(entry["workflow"].as_str().unwrap()).is_file());
    }
    assert_eq!(workflow_files(dir.path()).len(), 4);
}

#[test]
fn test_workflow_file_costs_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = common::write_generator_inputs(dir.path(), json!({}));
    let final_path = generate_from_config_file(&config_path, false).unwrap();

    let config = read_json(&final_path);
    let workflow = config["instrument"]["telescope"]["pipelines"]["hpso01_0"]["workflow"].as_str().unwrap().to_string();
    let file = read_json(&dir.path().join("out").join(workflow));

    let parameters = &file["header"]["parameters"];
    assert_eq!(parameters["hpso"], "hpso01");
    assert_eq!(parameters["arrays"], 512);
    assert_eq!(parameters["workflows"], json!(["ICAL", "DPrepA"]));
    assert_eq!(file["header"]["time"], false);

    let nodes = file["graph"]["nodes"].as_array().unwrap();
    let links = file["graph"]["links"].as_array().unwrap();
    assert_eq!(nodes.len(), 20);
    assert_eq!(links.len(), 25);

    // every ICAL task precedes every DPrepA task
    let first_dprep = nodes.iter().position(|n| n["id"].as_str().unwrap().starts_with("DPrepA_")).unwrap();
    assert!(nodes[..first_dprep].iter().all(|n| n["id"].as_str().unwrap().starts_with("ICAL_")));

    let bridge = links.iter().find(|l| l["source"] == "ICAL_Gather_0").unwrap();
    assert_eq!(bridge["target"], "DPrepA_FrequencySplit_0");
    assert_eq!(bridge["transfer_data"], 0.0);
    assert!(bridge.get("data_product").is_none());

    let degrid = nodes.iter().find(|n| n["id"] == "ICAL_Degrid_3").unwrap();
    assert!(close(degrid["comp"].as_f64().unwrap(), 0.0912 * 18000.0 * 1e15 / 4.0));
    assert_eq!(degrid["task_data"], 0.0);

    let split = nodes.iter().find(|n| n["id"] == "ICAL_FrequencySplit_0").unwrap();
    assert_eq!(split["comp"], 18000.0);

    // (1.5 Grid + 2.5 Degrid) Mvis/s, moved onto the outgoing edges
    let ical_data: f64 = links.iter().filter(|l| l["source"].as_str().unwrap().starts_with("ICAL_")).map(|l| l["transfer_data"].as_f64().unwrap()).sum();
    assert!(close(ical_data, 4.0 * 18000.0 * 1e6 * 12.0));

    let stats = fs::read_to_string(dir.path().join("out").join(format!("{}.csv", config["instrument"]["telescope"]["pipelines"]["hpso01_0"]["workflow"].as_str().unwrap()))).unwrap();
    assert!(stats.starts_with("workflow_type,product,total_compute"));
    assert!(stats.lines().any(|l| l.starts_with("ICAL,Degrid,")));
}

#[test]
fn test_pulsar_workflow_is_costed_as_a_whole() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = common::write_generator_inputs(dir.path(), json!({}));
    let final_path = generate_from_config_file(&config_path, false).unwrap();

    let config = read_json(&final_path);
    let workflow = config["instrument"]["telescope"]["pipelines"]["hpso04a_2"]["workflow"].as_str().unwrap().to_string();
    let file = read_json(&dir.path().join("out").join(workflow));

    let nodes = file["graph"]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 6);
    // (0.02 + 0.01) PFLOP/s over 6 tasks for 3600 s
    let expected = 0.03 / 6.0 * 3600.0 * 1e15;
    assert!(nodes.iter().all(|n| close(n["comp"].as_f64().unwrap(), expected) && n["task_data"] == 0.0));
}

#[test]
fn test_rerun_keeps_config_and_reuses_workflows() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = common::write_generator_inputs(dir.path(), json!({}));

    let final_path = generate_from_config_file(&config_path, false).unwrap();
    let files = workflow_files(dir.path());
    fs::write(&final_path, "{}").unwrap();

    generate_from_config_file(&config_path, false).unwrap();
    assert_eq!(fs::read_to_string(&final_path).unwrap(), "{}");

    // the pre-unrolled graphs are no longer needed once the workflow files exist
    fs::remove_dir_all(dir.path().join("pgt")).unwrap();
    fs::create_dir(dir.path().join("pgt")).unwrap();

    generate_from_config_file(&config_path, true).unwrap();
    assert_eq!(read_json(&final_path)["instrument"]["telescope"]["observations"].as_array().unwrap().len(), 3);
    assert_eq!(workflow_files(dir.path()), files);
}

#[test]
fn test_changed_parameters_produce_new_workflows() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = common::write_generator_inputs(dir.path(), json!({}));
    generate_from_config_file(&config_path, false).unwrap();

    let config_path = common::write_generator_inputs(dir.path(), json!({"data": false, "config_name": "nodata.json"}));
    generate_from_config_file(&config_path, false).unwrap();

    let files = workflow_files(dir.path());
    assert_eq!(files.len(), 8);
    assert!(files.iter().any(|f| f.contains("_nodata_")));
}

#[test]
fn test_generation_errors() {
    let dir = tempfile::tempdir().unwrap();

    let config_path = common::write_generator_inputs(dir.path(), json!({"output_dir": "missing"}));
    assert!(matches!(generate_from_config_file(&config_path, false), Err(Error::ConfigurationError(_))));

    let config_path = common::write_generator_inputs(dir.path(), json!({"scheduling": {"max_telescope_usage": 256}}));
    assert!(matches!(generate_from_config_file(&config_path, false), Err(Error::CapacityError { demand: 512, .. })));

    let config_path = common::write_generator_inputs(dir.path(), json!({"pipelines": {"ICAL": "prototype", "PSS": "pulsar"}}));
    assert!(matches!(generate_from_config_file(&config_path, false), Err(Error::ConfigurationError(_))));

    let config_path = common::write_generator_inputs(dir.path(), json!({"config_name": "again.json"}));
    fs::remove_file(dir.path().join("pgt/pulsar.json")).unwrap();
    assert!(matches!(generate_from_config_file(&config_path, false), Err(Error::ExternalToolError { .. })));
}
