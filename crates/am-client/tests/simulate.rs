use am_client::*;
use am_core::request::{GeometryMessage, RequestInput};
use am_core::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory server: every simulation finishes on the first wait.
///
/// Operations named in `lost` can no longer be read back once submitted, and
/// those in `empty` finish without a result. Uploaded files are recorded by
/// name and size.
struct ScriptedServer {
    target: String,
    rejected: HashSet<String>,
    failing: HashSet<String>,
    lost: HashSet<String>,
    empty: HashSet<String>,
    ops: Mutex<HashMap<String, (Operation, RequestInput)>>,
    submitted: Mutex<Vec<String>>,
    uploads: Mutex<Vec<(String, usize)>>,
}

impl ScriptedServer {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            rejected: HashSet::new(),
            failing: HashSet::new(),
            lost: HashSet::new(),
            empty: HashSet::new(),
            ops: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    fn finish(&self, name: &str) -> Operation {
        let mut ops = self.ops.lock().unwrap();
        let (op, input) = ops.get_mut(name).unwrap();
        if op.done {
            return op.clone();
        }
        op.done = true;
        op.metadata.percent_complete = 100;
        if self.failing.contains(name) {
            op.metadata.state = ProgressState::Error;
            op.result = Some(OperationResult::Error(OperationError {
                code: StatusCode::Internal,
                message: "solver failed".to_string(),
                logs: vec![LogFile {
                    name: "solver.log".to_string(),
                    content: "diverged".to_string(),
                }],
            }));
            return op.clone();
        }
        op.metadata.state = ProgressState::Completed;
        if self.empty.contains(name) {
            return op.clone();
        }
        let result = match input {
            RequestInput::SingleBead(_) => SimulationResult::MeltPool(MeltPoolMessage {
                time_steps: vec![
                    step(0.0, 1.0e-4, 5.0e-5),
                    step(1.0e-4, 1.2e-4, 6.0e-5),
                    step(2.0e-4, 1.4e-4, 7.0e-5),
                ],
                thermal_history_vtk_zip: String::new(),
            }),
            RequestInput::Porosity(_) => SimulationResult::Porosity(PorosityResult {
                void_ratio: 0.01,
                powder_ratio: 0.02,
                solid_ratio: 0.97,
            }),
            RequestInput::Microstructure(_) => {
                SimulationResult::Microstructure(MicrostructureResult {
                    xy_vtk: b"xy".to_vec(),
                    xz_vtk: b"xz".to_vec(),
                    yz_vtk: b"yz".to_vec(),
                    xy_circle_equivalence: vec![CircleEquivalence {
                        grain_number: 1,
                        area_fraction: 1.0,
                        diameter_um: 12.0,
                        orientation_angle: 0.0,
                    }],
                    ..Default::default()
                })
            }
            RequestInput::ThermalHistory(_) => SimulationResult::ThermalHistory(ThermalHistoryResult {
                coax_ave_zip: b"PK-coax".to_vec(),
            }),
            RequestInput::MaterialTuning(_) => {
                SimulationResult::MaterialTuning(MaterialTuningResult {
                    optimized_parameters: b"power,speed\n200,1\n".to_vec(),
                    coefficients: b"a,b\n0.1,0.2\n".to_vec(),
                    log: b"converged".to_vec(),
                    ..Default::default()
                })
            }
        };
        op.result = Some(OperationResult::Response(SimulationResponse {
            id: name.to_string(),
            result,
            logs: vec![LogFile {
                name: "solver.log".to_string(),
                content: "ok".to_string(),
            }],
            thermal_history: None,
        }));
        op.clone()
    }
}

fn step(x: f64, width: f64, depth: f64) -> MeltPoolTimeStep {
    MeltPoolTimeStep {
        laser_x: x,
        laser_y: 0.0,
        length: 3.0e-4,
        width,
        depth,
        reference_width: width,
        reference_depth: depth,
    }
}

impl ServerConnection for ScriptedServer {
    fn channel_str(&self) -> String {
        self.target.clone()
    }

    fn about(&self) -> ClientResult<BTreeMap<String, String>> {
        Ok(BTreeMap::from([("version".to_string(), "25.2".to_string())]))
    }

    fn materials_list(&self) -> ClientResult<Vec<String>> {
        Ok(vec!["17-4PH".to_string(), "IN718".to_string()])
    }

    fn material(&self, name: &str) -> ClientResult<AdditiveMaterial> {
        Ok(material(name))
    }

    fn upload_file(&self, name: &str, content: &[u8]) -> ClientResult<String> {
        self.uploads
            .lock()
            .unwrap()
            .push((name.to_string(), content.len()));
        Ok(format!("uploads/{name}"))
    }

    fn simulate(&self, request: &SimulationRequest) -> ClientResult<Operation> {
        if self.rejected.contains(&request.id) {
            return Err(ClientError::Server("rejected".to_string()));
        }
        self.submitted.lock().unwrap().push(request.id.clone());
        let op = Operation {
            name: request.id.clone(),
            done: false,
            metadata: OperationMetadata {
                simulation_id: request.id.clone(),
                state: ProgressState::Waiting,
                percent_complete: 0,
                message: "License successfully checked out\nIteration 1".to_string(),
                context: String::new(),
            },
            result: None,
        };
        self.ops
            .lock()
            .unwrap()
            .insert(request.id.clone(), (op.clone(), request.input.clone()));
        Ok(op)
    }

    fn get_operation(&self, name: &str) -> ClientResult<Operation> {
        if self.lost.contains(name) {
            return Err(ClientError::Server("connection lost".to_string()));
        }
        self.ops
            .lock()
            .unwrap()
            .get(name)
            .map(|(op, _)| op.clone())
            .ok_or_else(|| ClientError::OperationNotFound(name.to_string()))
    }

    fn wait_operation(&self, name: &str, _timeout: Duration) -> ClientResult<Operation> {
        if self.lost.contains(name) {
            return Err(ClientError::Server("connection lost".to_string()));
        }
        Ok(self.finish(name))
    }

    fn cancel_operation(&self, _name: &str) -> ClientResult<()> {
        Ok(())
    }

    fn list_operations(&self) -> ClientResult<Vec<Operation>> {
        Ok(self.ops.lock().unwrap().values().map(|(op, _)| op.clone()).collect())
    }
}

fn material(name: &str) -> AdditiveMaterial {
    AdditiveMaterial {
        name: name.to_string(),
        ..Default::default()
    }
}

fn user_data(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("am_client_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn client(name: &str, servers: Vec<Arc<ScriptedServer>>) -> Additive {
    let config = ClientConfig {
        user_data_path: Some(user_data(name)),
        ..Default::default()
    };
    let servers = servers
        .into_iter()
        .map(|s| s as Arc<dyn ServerConnection>)
        .collect();
    let mut additive = Additive::from_connections(servers, &config).unwrap();
    additive.set_progress_update_interval(Duration::from_millis(1));
    additive
}

fn single_bead(id: &str) -> SimulationInput {
    SingleBeadInput::new(id, AdditiveMachine::default(), material("17-4PH")).into()
}

fn porosity(id: &str) -> SimulationInput {
    PorosityInput::new(id, AdditiveMachine::default(), material("17-4PH")).into()
}

fn microstructure(id: &str) -> SimulationInput {
    MicrostructureInput::new(
        id,
        AdditiveMachine::default(),
        material("17-4PH"),
        MicrostructureParams::default(),
    )
    .unwrap()
    .into()
}

#[test]
fn simulations_are_spread_across_servers() {
    let a = Arc::new(ScriptedServer::new("localhost:50052"));
    let b = Arc::new(ScriptedServer::new("localhost:50053"));
    let additive = client("spread", vec![a.clone(), b.clone()]);

    let mut seen = Vec::new();
    let mut handler = |p: &Progress| seen.push((p.sim_id.clone(), p.state));
    let outcomes = additive
        .simulate(
            vec![single_bead("sb_1"), porosity("por_1"), microstructure("micro_1")],
            Some(&mut handler),
        )
        .unwrap();

    assert_eq!(a.submitted(), vec!["sb_1", "micro_1"]);
    assert_eq!(b.submitted(), vec!["por_1"]);
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| !o.is_error()));

    match &outcomes[1] {
        SimulationOutcome::Summary(SimulationSummary::Porosity(s)) => {
            assert_eq!(s.relative_density, 0.97);
            assert_eq!(s.status, SimulationStatus::Completed);
            assert_eq!(s.logs, "File: solver.log\nok\n");
        }
        other => panic!("unexpected {other:?}"),
    }
    match &outcomes[0] {
        SimulationOutcome::Summary(SimulationSummary::SingleBead(s)) => {
            assert_eq!(s.melt_pool.median_width(), 1.2e-4);
        }
        other => panic!("unexpected {other:?}"),
    }
    match &outcomes[2] {
        SimulationOutcome::Summary(SimulationSummary::Microstructure(s)) => {
            assert!(s.xy_vtk.exists());
            assert_eq!(s.xy_average_grain_size, 12.0);
        }
        other => panic!("unexpected {other:?}"),
    }

    assert!(seen.contains(&("por_1".to_string(), ProgressState::Waiting)));
    assert!(seen.contains(&("por_1".to_string(), ProgressState::Completed)));
    assert_eq!(additive.store().list_outputs(None).unwrap().len(), 3);
}

#[test]
fn waves_respect_sims_per_server() {
    let a = Arc::new(ScriptedServer::new("localhost:50052"));
    let mut additive = client("waves", vec![a.clone()]);
    additive.set_nsims_per_server(2).unwrap();

    let mut calls = 0;
    let mut handler = |_: &Progress| calls += 1;
    let inputs = (0..5).map(|i| porosity(&format!("por_{i}"))).collect();
    let outcomes = additive.simulate(inputs, Some(&mut handler)).unwrap();
    assert_eq!(outcomes.len(), 5);
    assert_eq!(a.submitted().len(), 5);
    // one submit report, one wait report and one final poll per simulation
    assert_eq!(calls, 15);
}

#[test]
fn single_input_without_handler_uses_progress_bar() {
    let a = Arc::new(ScriptedServer::new("localhost:50052"));
    let additive = client("single_bar", vec![a.clone()]);
    let outcomes = additive.simulate(vec![porosity("por_bar")], None).unwrap();
    assert_eq!(a.submitted(), vec!["por_bar"]);
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].is_error());
}

#[test]
fn rejected_inputs() {
    let additive = client("rejected", vec![Arc::new(ScriptedServer::new("localhost:50052"))]);

    let err = additive.simulate(Vec::new(), None).unwrap_err();
    assert_eq!(err.to_string(), "No simulation inputs provided");

    let err = additive
        .simulate(vec![porosity("dup"), single_bead("dup")], None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Duplicate simulation ID \"dup\" in input list");

    let unassigned: SimulationInput =
        PorosityInput::new("por_2", AdditiveMachine::default(), AdditiveMaterial::default()).into();
    let err = additive.simulate(vec![unassigned], None).unwrap_err();
    assert_eq!(err.to_string(), "A material is not assigned to the simulation input");

    let mut additive = additive;
    let err = additive.set_nsims_per_server(0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Number of simulations per server must be greater than zero."
    );
}

#[test]
fn failures_become_simulation_errors() {
    let mut server = ScriptedServer::new("localhost:50052");
    server.rejected.insert("por_bad".to_string());
    server.failing.insert("sb_bad".to_string());
    let additive = client("failures", vec![Arc::new(server)]);

    let mut states = HashMap::new();
    let mut handler = |p: &Progress| {
        states.insert(p.sim_id.clone(), p.state);
    };
    let outcomes = additive
        .simulate(
            vec![porosity("por_ok"), porosity("por_bad"), single_bead("sb_bad")],
            Some(&mut handler),
        )
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    let errors: Vec<&SimulationError> = outcomes
        .iter()
        .filter_map(|o| match o {
            SimulationOutcome::Error(e) => Some(e),
            _ => None,
        })
        .collect();
    assert_eq!(errors.len(), 2);

    let solver = errors.iter().find(|e| e.input.id() == "sb_bad").unwrap();
    assert_eq!(solver.message, "solver failed");
    assert_eq!(solver.logs, "File: solver.log\ndiverged\n");
    assert_eq!(states["sb_bad"], ProgressState::Error);

    let submit = errors.iter().find(|e| e.input.id() == "por_bad").unwrap();
    assert_eq!(submit.message, "Server error: rejected");
    assert!(!states.contains_key("por_bad"));
}

#[test]
fn unfinished_operations_still_produce_outcomes() {
    let mut server = ScriptedServer::new("localhost:50052");
    server.lost.insert("lost".to_string());
    server.empty.insert("empty".to_string());
    let additive = client("unfinished", vec![Arc::new(server)]);

    let inputs = vec![single_bead("ok"), single_bead("lost"), porosity("empty")];
    let outcomes = additive.simulate(inputs, None).unwrap();
    assert_eq!(outcomes.len(), 3);
    let ids: Vec<&str> = outcomes.iter().map(|o| o.id()).collect();
    assert_eq!(ids, vec!["ok", "lost", "empty"]);
    assert!(!outcomes[0].is_error());

    match &outcomes[1] {
        SimulationOutcome::Error(e) => assert_eq!(e.message, "Server error: connection lost"),
        other => panic!("unexpected {other:?}"),
    }
    match &outcomes[2] {
        SimulationOutcome::Error(e) => {
            assert_eq!(e.message, "Simulation empty finished without a result")
        }
        other => panic!("unexpected {other:?}"),
    }

    // Errors are persisted like solver failures.
    let manifest = additive.store().load_manifest("lost").unwrap();
    assert_eq!(manifest.sim_id, "lost");
}

#[test]
fn async_submission_and_manual_polling() {
    let server = Arc::new(ScriptedServer::new("localhost:50052"));
    let additive = client("async", vec![server.clone()]);

    let mut manager = additive
        .simulate_async(vec![porosity("por_a"), porosity("por_b")], None)
        .unwrap();
    assert_eq!(manager.len(), 2);
    assert!(!manager.done());
    assert!(manager.summaries().is_empty());

    let status = manager.status(None).unwrap();
    assert_eq!(status[0].0, "por_a");
    assert_eq!(status[0].1.state, ProgressState::Waiting);

    manager.wait_all(None);
    assert!(manager.done());
    assert_eq!(manager.summaries().len(), 2);

    let op = find_operation(additive.servers(), "por_b").unwrap();
    assert!(op.done);
    assert!(matches!(
        find_operation(additive.servers(), "nope"),
        Err(ClientError::OperationNotFound(_))
    ));
}

#[test]
fn server_metadata_and_materials() {
    let additive = client("about", vec![Arc::new(ScriptedServer::new("localhost:50052"))]);
    let about = additive.about();
    assert_eq!(about.len(), 1);
    assert!(about[0].connected);
    assert_eq!(about[0].metadata["version"], "25.2");
    assert_eq!(additive.materials_list().unwrap(), vec!["17-4PH", "IN718"]);
    assert_eq!(additive.material("IN718").unwrap().name, "IN718");
}

#[test]
fn connect_uses_configured_targets() {
    let connector = |target: &str| -> ClientResult<Arc<dyn ServerConnection>> {
        Ok(Arc::new(ScriptedServer::new(target)))
    };
    let config = ClientConfig {
        server_connections: vec!["localhost:50060".to_string(), "127.0.0.1:50061".to_string()],
        user_data_path: Some(user_data("connect")),
        ..Default::default()
    };
    let additive = Additive::connect(&config, &connector).unwrap();
    let targets: Vec<String> = additive.servers().iter().map(|s| s.channel_str()).collect();
    assert_eq!(targets, vec!["localhost:50060", "127.0.0.1:50061"]);

    let config = ClientConfig {
        host: Some("localhost".to_string()),
        port: 50070,
        user_data_path: Some(user_data("connect_host")),
        ..Default::default()
    };
    let additive = Additive::connect(&config, &connector).unwrap();
    assert_eq!(additive.servers()[0].channel_str(), "localhost:50070");

    let config = ClientConfig {
        server_connections: vec!["no-port".to_string()],
        ..Default::default()
    };
    assert!(matches!(
        Additive::connect(&config, &connector),
        Err(ClientError::InvalidAddress(_))
    ));
}

#[test]
fn remote_hosts_need_permission() {
    let connector = |target: &str| -> ClientResult<Arc<dyn ServerConnection>> {
        Ok(Arc::new(ScriptedServer::new(target)))
    };
    let mut config = ClientConfig {
        server_connections: vec!["10.0.0.5:50052".to_string()],
        user_data_path: Some(user_data("remote")),
        ..Default::default()
    };
    let err = Additive::connect(&config, &connector).err().unwrap();
    assert!(err.to_string().contains("allow_remote_host"));

    config.allow_remote_host = true;
    let additive = Additive::connect(&config, &connector).unwrap();
    assert_eq!(additive.servers()[0].channel_str(), "10.0.0.5:50052");

    config.allow_remote_host = false;
    config.transport_mode = TransportMode::Mtls;
    assert!(Additive::connect(&config, &connector).is_ok());
}

fn scratch_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn thermal_history_uploads_geometry_first() {
    let server = Arc::new(ScriptedServer::new("localhost:50052"));
    let additive = client("thermal_history", vec![server.clone()]);
    let files = user_data("thermal_history_files");
    let stl = scratch_file(&files, "part.stl", "solid part\nendsolid part\n");

    let with_geometry: SimulationInput =
        ThermalHistoryInput::new("th_1", AdditiveMachine::default(), material("IN718"))
            .with_geometry(GeometryFile::stl(&stl).unwrap())
            .into();
    let without_geometry: SimulationInput =
        ThermalHistoryInput::new("th_2", AdditiveMachine::default(), material("IN718")).into();
    let outcomes = additive
        .simulate(vec![with_geometry, without_geometry], None)
        .unwrap();

    assert_eq!(
        *server.uploads.lock().unwrap(),
        vec![("part.stl".to_string(), 25)]
    );
    assert_eq!(server.submitted(), vec!["th_1"]);
    let ops = server.ops.lock().unwrap();
    match &ops["th_1"].1 {
        RequestInput::ThermalHistory(msg) => assert_eq!(
            msg.geometry,
            GeometryMessage::StlFile {
                name: "uploads/part.stl".to_string()
            }
        ),
        other => panic!("unexpected {other:?}"),
    }

    match &outcomes[0] {
        SimulationOutcome::Summary(SimulationSummary::ThermalHistory(s)) => {
            assert!(s.coax_ave_output_folder.ends_with("th_1/coax_ave_output"));
            let zip = s.coax_ave_output_folder.join("coax_ave_output.zip");
            assert_eq!(std::fs::read(zip).unwrap(), b"PK-coax");
        }
        other => panic!("unexpected {other:?}"),
    }
    match &outcomes[1] {
        SimulationOutcome::Error(e) => assert_eq!(
            e.message,
            "The geometry path is not defined in the simulation input"
        ),
        other => panic!("unexpected {other:?}"),
    }
}

fn tuning_input(dir: &Path, id: &str) -> MaterialTuningInput {
    MaterialTuningInput::new(
        id,
        scratch_file(dir, "experiment.csv", "power,speed,width\n200,1,1e-4\n"),
        scratch_file(dir, "material.json", "{}"),
        scratch_file(dir, "thermal.csv", "T,k\n300,10\n"),
    )
    .unwrap()
}

#[test]
fn tune_material_writes_results() {
    let server = Arc::new(ScriptedServer::new("localhost:50052"));
    let additive = client("tuning", vec![server.clone()]);
    let files = user_data("tuning_files");

    let mut updates = Vec::new();
    let mut handler = |p: &Progress| updates.push(p.state);
    let summary = additive
        .tune_material(tuning_input(&files, "tune_1"), None, Some(&mut handler))
        .unwrap();

    let out = additive.store().output_dir("tune_1").unwrap();
    assert_eq!(summary.optimized_parameters_file, out.join("optimized_parameters.csv"));
    assert_eq!(
        std::fs::read_to_string(&summary.optimized_parameters_file).unwrap(),
        "power,speed\n200,1\n"
    );
    assert!(summary.coefficients_file.is_some());
    assert!(summary.material_configuration_file.is_none());
    assert_eq!(updates, vec![ProgressState::Waiting, ProgressState::Completed]);

    // The output directory now exists, so a second run must pick another one.
    let err = additive
        .tune_material(tuning_input(&files, "tune_1"), None, None)
        .unwrap_err();
    assert!(err.to_string().starts_with("Directory "));
    assert!(err.to_string().ends_with("already exists. Delete or choose a different output directory."));
}

#[test]
fn failed_tuning_is_an_error() {
    let mut server = ScriptedServer::new("localhost:50052");
    server.failing.insert("tune_bad".to_string());
    server.empty.insert("tune_empty".to_string());
    let additive = client("tuning_failed", vec![Arc::new(server)]);
    let files = user_data("tuning_failed_files");

    let out = files.join("out_bad");
    let err = additive
        .tune_material(tuning_input(&files, "tune_bad"), Some(out.as_path()), None)
        .unwrap_err();
    assert!(matches!(err, ClientError::Server(_)));
    assert!(!out.exists());

    let err = additive
        .tune_material(
            tuning_input(&files, "tune_empty"),
            Some(files.join("out_empty").as_path()),
            None,
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Server error: Material tuning tune_empty finished without a result"
    );
}
