use am_core::*;
use am_results::*;

fn temp_store(name: &str) -> OutputStore {
    let dir = std::env::temp_dir().join(format!("am_results_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    OutputStore::new(dir).unwrap()
}

fn step(x: f64, width: f64) -> MeltPoolTimeStep {
    MeltPoolTimeStep {
        laser_x: x,
        laser_y: 0.0,
        length: 3e-4,
        width,
        depth: 5e-5,
        reference_width: width,
        reference_depth: 4e-5,
    }
}

#[test]
fn save_and_load_single_bead_summary() {
    let store = temp_store("single_bead");
    let msg = MeltPoolMessage {
        time_steps: vec![step(0.0, 1e-4), step(1e-4, 1.2e-4), step(2e-4, 1.4e-4)],
        thermal_history_vtk_zip: String::new(),
    };
    let input = SingleBeadInput::new("sb_1", AdditiveMachine::default(), AdditiveMaterial::default());
    let summary = SimulationSummary::SingleBead(SingleBeadSummary::new(
        input,
        &msg,
        "File: solver.log\nok\n".to_string(),
        None,
        SimulationStatus::Completed,
    ));

    let saved = store.save_summary(&summary).unwrap();
    assert!(store.has_output("sb_1"));

    let manifest = store.load_manifest("sb_1").unwrap();
    assert_eq!(manifest, saved);
    assert_eq!(manifest.sim_type, SimulationType::SingleBead);
    assert_eq!(manifest.metrics["median_width"], 1.2e-4);

    let steps = store.load_melt_pool("sb_1").unwrap();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[2].laser_x, 2e-4);

    assert!(store.load_logs("sb_1").unwrap().contains("solver.log"));
}

#[test]
fn microstructure_outputs_and_listing() {
    let store = temp_store("micro");
    let result = MicrostructureResult {
        xy_vtk: b"xy".to_vec(),
        xz_vtk: b"xz".to_vec(),
        yz_vtk: b"yz".to_vec(),
        ..Default::default()
    };
    let dir = store.write_microstructure_vtk("micro_1", &result).unwrap();
    assert_eq!(std::fs::read(dir.join("xz.vtk")).unwrap(), b"xz");

    let input = MicrostructureInput::new(
        "micro_1",
        AdditiveMachine::default(),
        AdditiveMaterial::default(),
        MicrostructureParams::default(),
    )
    .unwrap();
    let summary = SimulationSummary::Microstructure(MicrostructureSummary::new(
        input,
        &result,
        String::new(),
        &dir,
        SimulationStatus::Completed,
    ));
    store.save_summary(&summary).unwrap();

    let error = SimulationError::new(PorosityInput::new("por_1", AdditiveMachine::default(), AdditiveMaterial::default()).into(), "boom", "");
    store.save_error(&error).unwrap();

    let all = store.list_outputs(None).unwrap();
    assert_eq!(all.len(), 2);
    let micro = store.list_outputs(Some(SimulationType::Microstructure)).unwrap();
    assert_eq!(micro.len(), 1);
    assert_eq!(micro[0].sim_id, "micro_1");

    let por = store.load_manifest("por_1").unwrap();
    assert_eq!(por.status, SimulationStatus::Error);
    assert_eq!(por.error_message.as_deref(), Some("boom"));

    store.delete_output("micro_1").unwrap();
    assert!(!store.has_output("micro_1"));
}

#[test]
fn thermal_history_archive_is_stored() {
    let store = temp_store("thermal");
    let dir = store.write_thermal_history("sb_2", b"PK\x03\x04").unwrap();
    assert!(dir.ends_with("thermal_history"));
    assert!(dir.join("gridfullthermal.zip").exists());
}

#[test]
fn missing_output_is_reported() {
    let store = temp_store("missing");
    match store.load_manifest("nope") {
        Err(ResultsError::OutputNotFound { sim_id }) => assert_eq!(sim_id, "nope"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn thermal_history_summary_is_listed() {
    let store = temp_store("coax");
    let dir = store.write_coax_ave_output("th_1", b"PK\x03\x04").unwrap();
    assert!(dir.ends_with("coax_ave_output"));
    assert_eq!(std::fs::read(dir.join("coax_ave_output.zip")).unwrap(), b"PK\x03\x04");

    let input = ThermalHistoryInput::new("th_1", AdditiveMachine::default(), AdditiveMaterial::default());
    let summary = SimulationSummary::ThermalHistory(ThermalHistorySummary::new(
        input,
        dir,
        "File: th.log\nlayers done\n".to_string(),
        SimulationStatus::Completed,
    ));
    store.save_summary(&summary).unwrap();

    let listed = store.list_outputs(Some(SimulationType::ThermalHistory)).unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].metrics.is_empty());
    assert_eq!(store.load_logs("th_1").unwrap(), "File: th.log\nlayers done\n");
}
