//! The Additive client: server connections and simulation submission.

use crate::config::{ADDRESS_ENV_VAR, ClientConfig};
use crate::connection::{Connector, OperationResult, ServerConnection, ServerConnectionStatus};
use crate::error::{ClientError, ClientResult};
use crate::local_server::LocalServer;
use crate::network::{LOCALHOST, check_transport, find_open_port, parse_target};
use crate::progress::{
    DefaultSingleSimulationProgressHandler, Progress, ProgressHandler, ProgressState, reborrow,
};
use crate::task::{DEFAULT_PROGRESS_UPDATE_INTERVAL, SimulationTask};
use crate::task_manager::SimulationTaskManager;
use am_core::{
    AdditiveMaterial, MaterialTuningInput, MaterialTuningSummary, SimulationError,
    SimulationInput, SimulationOutcome, SimulationRequest, SimulationResult, new_sim_id,
};
use am_results::OutputStore;
use std::collections::HashSet;
use std::path::Path;
use std::process::Child;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Retries used when checking that a newly connected server responds.
const CONNECT_RETRIES: u32 = 5;

/// Material tuning progress lines that are not worth logging.
const TUNING_LOG_NOISE: [&str; 3] = [
    "License successfully",
    "Starting ThermalSolver",
    "threads for solver",
];

/// Server processes started by the client, killed when dropped.
#[derive(Default)]
struct LocalServers(Vec<Child>);

impl Drop for LocalServers {
    fn drop(&mut self) {
        for child in &mut self.0 {
            if let Err(e) = child.kill() {
                debug!("Failed to stop local server {}: {e}", child.id());
            }
            let _ = child.wait();
        }
    }
}

pub struct Additive {
    servers: Vec<Arc<dyn ServerConnection>>,
    nsims_per_server: u32,
    store: OutputStore,
    progress_update_interval: Duration,
    _local_servers: LocalServers,
}

impl Additive {
    /// Connect to the servers named by `config`, launching local ones if no
    /// address is configured.
    ///
    /// Targets are taken from, in order: `server_connections`, `host:port`,
    /// the `ANSYS_ADDITIVE_ADDRESS` environment variable, and finally
    /// `nservers` local servers on open ports. Insecure connections to
    /// remote hosts are refused unless `allow_remote_host` is set.
    pub fn connect(config: &ClientConfig, connector: &dyn Connector) -> ClientResult<Self> {
        config.validate()?;
        let user_data_path = config.resolved_user_data_path();
        let mut local_servers = LocalServers::default();

        let env_address = std::env::var(ADDRESS_ENV_VAR).ok().filter(|a| !a.is_empty());
        let targets: Vec<String> = if !config.server_connections.is_empty() {
            config.server_connections.clone()
        } else if let Some(host) = &config.host {
            vec![format!("{host}:{}", config.port)]
        } else if let Some(address) = env_address {
            vec![address]
        } else {
            let mut targets = Vec::new();
            for _ in 0..config.nservers {
                let port = find_open_port()?;
                let child = LocalServer::launch(
                    port,
                    &user_data_path,
                    config.product_version(),
                    config.linux_install_path.as_deref(),
                )?;
                local_servers.0.push(child);
                targets.push(format!("{LOCALHOST}:{port}"));
            }
            targets
        };

        let mut servers = Vec::with_capacity(targets.len());
        for target in &targets {
            let parsed = parse_target(target)?;
            check_transport(&parsed, config.transport_mode, config.allow_remote_host)?;
            let server = connector.connect(target)?;
            if !server.ready(CONNECT_RETRIES) {
                return Err(ClientError::Connection {
                    target: target.clone(),
                    message: "server did not respond".to_string(),
                });
            }
            info!("Connected to {target}");
            servers.push(server);
        }

        let mut client = Self::from_connections(servers, config)?;
        client._local_servers = local_servers;
        Ok(client)
    }

    /// Build a client over already established connections.
    pub fn from_connections(
        servers: Vec<Arc<dyn ServerConnection>>,
        config: &ClientConfig,
    ) -> ClientResult<Self> {
        config.validate()?;
        if servers.is_empty() {
            return Err(ClientError::Config("No server connections".to_string()));
        }
        let user_data_path = config.resolved_user_data_path();
        let store = OutputStore::new(user_data_path.clone())?;
        info!("user data path: {}", user_data_path.display());
        Ok(Self {
            servers,
            nsims_per_server: config.nsims_per_server,
            store,
            progress_update_interval: DEFAULT_PROGRESS_UPDATE_INTERVAL,
            _local_servers: LocalServers::default(),
        })
    }

    pub fn servers(&self) -> &[Arc<dyn ServerConnection>] {
        &self.servers
    }

    /// Number of simultaneous simulations to run on each server.
    pub fn nsims_per_server(&self) -> u32 {
        self.nsims_per_server
    }

    pub fn set_nsims_per_server(&mut self, value: u32) -> ClientResult<()> {
        if value < 1 {
            return Err(ClientError::InvalidInput(
                "Number of simulations per server must be greater than zero.".to_string(),
            ));
        }
        self.nsims_per_server = value;
        Ok(())
    }

    /// Longest time a wait blocks before progress is reported.
    pub fn set_progress_update_interval(&mut self, interval: Duration) {
        self.progress_update_interval = interval;
    }

    pub fn user_data_path(&self) -> &Path {
        self.store.root_dir()
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    /// Status of every connected server.
    pub fn about(&self) -> Vec<ServerConnectionStatus> {
        self.servers.iter().map(|s| s.status()).collect()
    }

    /// Names of the materials available on the server.
    pub fn materials_list(&self) -> ClientResult<Vec<String>> {
        self.servers[0].materials_list()
    }

    pub fn material(&self, name: &str) -> ClientResult<AdditiveMaterial> {
        self.servers[0].material(name)
    }

    /// Load a user defined material from a parameter file and lookup tables.
    pub fn load_material(
        parameters_file: &Path,
        thermal_lookup_file: &Path,
        characteristic_width_lookup_file: &Path,
    ) -> ClientResult<AdditiveMaterial> {
        Ok(AdditiveMaterial::load(
            parameters_file,
            thermal_lookup_file,
            characteristic_width_lookup_file,
        )?)
    }

    /// Submit simulations without waiting for them.
    ///
    /// Inputs go round-robin across the servers. Thermal history geometry
    /// is uploaded to the server first. A submission that fails is recorded
    /// as an error outcome in the returned manager. The handler receives the
    /// initial progress of each submitted simulation.
    pub fn simulate_async(
        &self,
        mut inputs: Vec<SimulationInput>,
        mut handler: Option<&mut dyn ProgressHandler>,
    ) -> ClientResult<SimulationTaskManager> {
        prepare_inputs(&mut inputs)?;
        info!("Starting {} simulations", inputs.len());

        let mut manager = SimulationTaskManager::with_interval(self.progress_update_interval);
        for (i, input) in inputs.into_iter().enumerate() {
            let server = &self.servers[i % self.servers.len()];
            let submitted = request_for(server.as_ref(), &input)
                .and_then(|request| server.simulate(&request));
            match submitted {
                Ok(op) => {
                    debug!(sim_id = input.id(), server = %server.channel_str(), "Submitted simulation");
                    if let Some(h) = handler.as_deref_mut() {
                        h.update(&Progress::from_metadata(&op.metadata));
                    }
                    manager.add_task(SimulationTask::new(
                        Arc::clone(server),
                        op,
                        input,
                        self.store.clone(),
                    ));
                }
                Err(e) => {
                    warn!("Failed to submit {}: {e}", input.id());
                    manager.add_error(SimulationError::new(input, e.to_string(), ""));
                }
            }
        }
        Ok(manager)
    }

    /// Run simulations and wait for all of them.
    ///
    /// Simulations run in waves of at most `servers * nsims_per_server`. A
    /// single input without a handler reports to a text progress bar.
    pub fn simulate(
        &self,
        mut inputs: Vec<SimulationInput>,
        handler: Option<&mut dyn ProgressHandler>,
    ) -> ClientResult<Vec<SimulationOutcome>> {
        prepare_inputs(&mut inputs)?;

        let mut default_handler;
        let mut handler = match handler {
            Some(h) => Some(&mut *h as &mut dyn ProgressHandler),
            None if inputs.len() == 1 => {
                default_handler = DefaultSingleSimulationProgressHandler::default();
                Some(&mut default_handler as &mut dyn ProgressHandler)
            }
            None => None,
        };

        let wave_size = self.servers.len() * self.nsims_per_server as usize;
        let mut outcomes = Vec::with_capacity(inputs.len());
        let mut remaining = inputs.into_iter().peekable();
        while remaining.peek().is_some() {
            let wave: Vec<SimulationInput> = remaining.by_ref().take(wave_size).collect();
            let mut manager = self.simulate_async(wave, reborrow(&mut handler))?;
            manager.wait_all(reborrow(&mut handler));
            outcomes.extend(manager.summaries());
        }
        Ok(outcomes)
    }

    /// Tune a user defined material against experimental melt pools.
    ///
    /// Result files are written to `out_dir`, by default the output
    /// directory of the tuning id, which must not exist yet. The run uses
    /// the first server.
    pub fn tune_material(
        &self,
        mut input: MaterialTuningInput,
        out_dir: Option<&Path>,
        mut handler: Option<&mut dyn ProgressHandler>,
    ) -> ClientResult<MaterialTuningSummary> {
        if input.id.is_empty() {
            input.id = new_sim_id();
        }
        let out_dir = match out_dir {
            Some(dir) => dir.to_path_buf(),
            None => self.store.output_dir(&input.id)?,
        };
        if out_dir.exists() {
            return Err(ClientError::InvalidInput(format!(
                "Directory {} already exists. Delete or choose a different output directory.",
                out_dir.display()
            )));
        }

        let server = &self.servers[0];
        let mut op = server.simulate(&input.to_request()?)?;
        info!("Tuning material {}", input.id);
        loop {
            let progress = Progress::from_metadata(&op.metadata);
            if progress.state == ProgressState::Error {
                return Err(ClientError::Server(progress.message));
            }
            for line in progress.message.lines() {
                if !TUNING_LOG_NOISE.iter().any(|noise| line.contains(noise)) {
                    info!("{line}");
                }
            }
            if let Some(h) = handler.as_deref_mut() {
                h.update(&progress);
            }
            if op.done {
                break;
            }
            op = server.wait_operation(&op.name, self.progress_update_interval)?;
        }

        match op.result {
            Some(OperationResult::Response(response)) => match response.result {
                SimulationResult::MaterialTuning(result) => {
                    Ok(MaterialTuningSummary::new(input, &result, &out_dir)?)
                }
                _ => Err(ClientError::Server(format!(
                    "Material tuning {} returned a simulation result",
                    input.id
                ))),
            },
            Some(OperationResult::Error(err)) => Err(ClientError::Server(err.message)),
            None => Err(ClientError::Server(format!(
                "Material tuning {} finished without a result",
                input.id
            ))),
        }
    }
}

/// Build the request for `input`, uploading thermal history geometry to
/// `server` first.
fn request_for(
    server: &dyn ServerConnection,
    input: &SimulationInput,
) -> ClientResult<SimulationRequest> {
    let SimulationInput::ThermalHistory(th) = input else {
        return Ok(input.to_request()?);
    };
    let Some(geometry) = th.geometry() else {
        return Err(ClientError::InvalidInput(
            "The geometry path is not defined in the simulation input".to_string(),
        ));
    };
    let path = geometry.path();
    let content = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let remote = server.upload_file(&name, &content)?;
    debug!(sim_id = th.id.as_str(), remote = %remote, "Uploaded geometry");
    Ok(th.to_request(&remote)?)
}

/// Check a batch before submission: it must be non-empty with unique ids
/// and assigned materials. Empty ids are filled in.
fn prepare_inputs(inputs: &mut [SimulationInput]) -> ClientResult<()> {
    if inputs.is_empty() {
        return Err(ClientError::InvalidInput(
            "No simulation inputs provided".to_string(),
        ));
    }
    let mut ids = HashSet::new();
    for input in inputs.iter_mut() {
        if input.id().is_empty() {
            input.set_id(new_sim_id());
        }
        if !ids.insert(input.id().to_string()) {
            return Err(ClientError::InvalidInput(format!(
                "Duplicate simulation ID \"{}\" in input list",
                input.id()
            )));
        }
        if input.material().is_unassigned() {
            return Err(ClientError::InvalidInput(
                "A material is not assigned to the simulation input".to_string(),
            ));
        }
    }
    Ok(())
}
