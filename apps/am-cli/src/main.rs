use am_client::network::{check_transport, is_loopback, parse_target};
use am_client::{ClientConfig, ClientError, LocalServer};
use am_core::{AdditiveMaterial, CoreError, METER_TO_MM, SimulationStatus, SimulationType};
use am_results::{OutputStore, ResultsError};
use am_study::{ParametricStudy, PermutationPlan, StudyError};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Study(#[from] StudyError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Results(#[from] ResultsError),
    #[error("No stored output for {0}")]
    NoOutput(String),
    #[error("Invalid plan file {path}: {source}")]
    Plan {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "am-cli")]
#[command(about = "Additive CLI - parametric studies of additive manufacturing simulations", long_about = None)]
struct Cli {
    /// Client configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Maximum level of log messages (error, warn, info, debug, trace).
    /// Defaults to the configured `log_level`
    #[arg(long, global = true)]
    log_level: Option<Level>,
    /// Write log messages to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a study, or open an existing one
    New {
        /// Path to the study file (.ps is added when missing)
        study: PathBuf,
    },
    /// List the simulations in a study
    Show { study: PathBuf },
    /// Add permutations described by a YAML plan
    Generate {
        study: PathBuf,
        /// YAML plan with `type: single_bead`, `porosity` or `microstructure`
        plan: PathBuf,
    },
    /// Import simulations from a CSV file
    Import { study: PathBuf, csv: PathBuf },
    /// Export the study to a CSV file
    Export { study: PathBuf, csv: PathBuf },
    /// Remove simulations by ID
    Remove {
        study: PathBuf,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Set the status of simulations
    SetStatus {
        study: PathBuf,
        status: SimulationStatus,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Set the priority of simulations
    SetPriority {
        study: PathBuf,
        #[arg(allow_negative_numbers = true)]
        priority: i64,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Set the iteration of simulations
    SetIteration {
        study: PathBuf,
        #[arg(allow_negative_numbers = true)]
        iteration: i64,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Remove every simulation from a study
    Clear { study: PathBuf },
    /// Load a material from its parameter file and lookup tables
    Material {
        parameters: PathBuf,
        thermal_lookup: PathBuf,
        characteristic_width_lookup: PathBuf,
    },
    /// Start a local Additive server and wait for it to exit
    LaunchServer {
        /// Defaults to the configured port
        #[arg(long)]
        port: Option<u16>,
        /// Product version, e.g. 252
        #[arg(long)]
        product_version: Option<String>,
        /// Install root on Linux
        #[arg(long)]
        install_path: Option<PathBuf>,
    },
    /// Validate a host:port server address against the transport settings
    CheckAddress { target: String },
    /// List stored simulation outputs
    Outputs {
        /// Only list outputs of this type
        #[arg(long)]
        sim_type: Option<SimulationType>,
    },
    /// Print the stored logs of a simulation
    Logs { id: String },
}

fn main() {
    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };
    let level = match cli.log_level {
        Some(level) => level,
        // Validated when the config was loaded.
        None => config.max_log_level().unwrap_or(Level::INFO),
    };
    if let Err(e) = init_logging(level, cli.log_file.as_deref()) {
        eprintln!("Failed to open log file: {e}");
        std::process::exit(2);
    }
    if let Err(e) = run(cli.command, &config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> CliResult<ClientConfig> {
    match path {
        Some(path) => Ok(ClientConfig::load(path)?),
        None => Ok(ClientConfig::default()),
    }
}

fn init_logging(level: Level, log_file: Option<&Path>) -> std::io::Result<()> {
    let builder = tracing_subscriber::fmt().with_max_level(level);
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn run(command: Commands, config: &ClientConfig) -> CliResult<()> {
    match command {
        Commands::New { study } => cmd_new(&study),
        Commands::Show { study } => cmd_show(&study),
        Commands::Generate { study, plan } => cmd_generate(&study, &plan),
        Commands::Import { study, csv } => cmd_import(&study, &csv),
        Commands::Export { study, csv } => cmd_export(&study, &csv),
        Commands::Remove { study, ids } => {
            ParametricStudy::load(&study)?.remove(&ids)?;
            println!("✓ Removed {} simulation(s)", ids.len());
            Ok(())
        }
        Commands::SetStatus { study, status, ids } => {
            ParametricStudy::load(&study)?.set_status(&ids, status)?;
            println!("✓ Status set to {status}");
            Ok(())
        }
        Commands::SetPriority {
            study,
            priority,
            ids,
        } => {
            ParametricStudy::load(&study)?.set_priority(&ids, priority)?;
            println!("✓ Priority set to {priority}");
            Ok(())
        }
        Commands::SetIteration {
            study,
            iteration,
            ids,
        } => {
            ParametricStudy::load(&study)?.set_iteration(&ids, iteration)?;
            println!("✓ Iteration set to {iteration}");
            Ok(())
        }
        Commands::Clear { study } => {
            ParametricStudy::load(&study)?.clear()?;
            println!("✓ Study cleared");
            Ok(())
        }
        Commands::Material {
            parameters,
            thermal_lookup,
            characteristic_width_lookup,
        } => cmd_material(&parameters, &thermal_lookup, &characteristic_width_lookup),
        Commands::LaunchServer {
            port,
            product_version,
            install_path,
        } => cmd_launch_server(
            config,
            port.unwrap_or(config.port),
            product_version.as_deref().unwrap_or(config.product_version()),
            install_path.as_deref().or(config.linux_install_path.as_deref()),
        ),
        Commands::CheckAddress { target } => cmd_check_address(config, &target),
        Commands::Outputs { sim_type } => cmd_outputs(config, sim_type),
        Commands::Logs { id } => cmd_logs(config, &id),
    }
}

fn cmd_new(path: &Path) -> CliResult<()> {
    let study = ParametricStudy::open(path)?;
    println!(
        "✓ Study {} ({} simulations)",
        study.file_name().display(),
        study.len()
    );
    Ok(())
}

fn cmd_show(path: &Path) -> CliResult<()> {
    let study = ParametricStudy::load(path)?;
    println!(
        "Study: {} (format version {})",
        study.file_name().display(),
        study.format_version()
    );
    if study.is_empty() {
        println!("No simulations in study");
        return Ok(());
    }

    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for row in study.rows() {
        *counts
            .entry((row.sim_type.to_string(), row.status.to_string()))
            .or_default() += 1;
    }
    println!("\nSummary:");
    for ((sim_type, status), n) in &counts {
        println!("  {sim_type:<15} {status:<10} {n}");
    }

    println!("\nSimulations:");
    for row in study.rows() {
        let mut line = format!(
            "  {:<24} {:<15} {:<10} it={} pri={} {}",
            row.id,
            row.sim_type.as_str(),
            row.status.as_str(),
            row.iteration,
            row.priority,
            row.material
        );
        match row.sim_type {
            SimulationType::SingleBead if !row.melt_pool_width.is_nan() => {
                line.push_str(&format!("  width={:.3} mm", row.melt_pool_width * METER_TO_MM));
            }
            SimulationType::Porosity if !row.relative_density.is_nan() => {
                line.push_str(&format!("  density={:.4}", row.relative_density));
            }
            SimulationType::Microstructure if !row.xy_average_grain_size.is_nan() => {
                line.push_str(&format!("  xy grain={:.2} µm", row.xy_average_grain_size));
            }
            _ => {}
        }
        if row.status == SimulationStatus::Error && !row.error_message.is_empty() {
            line.push_str(&format!("  {}", row.error_message));
        }
        println!("{line}");
    }
    Ok(())
}

fn cmd_generate(study_path: &Path, plan_path: &Path) -> CliResult<()> {
    let content = std::fs::read_to_string(plan_path)?;
    let plan: PermutationPlan =
        serde_yaml::from_str(&content).map_err(|source| CliError::Plan {
            path: plan_path.to_path_buf(),
            source,
        })?;
    let mut study = ParametricStudy::open(study_path)?;
    let added = study.generate(&plan)?;
    println!("✓ Added {added} simulation(s), {} in study", study.len());
    Ok(())
}

fn cmd_import(study_path: &Path, csv: &Path) -> CliResult<()> {
    let mut study = ParametricStudy::open(study_path)?;
    let before = study.len();
    let errors = study.import_csv_study(csv)?;
    for e in &errors {
        println!("  {e}");
    }
    println!(
        "✓ Imported {} simulation(s) from {}",
        study.len().saturating_sub(before),
        csv.display()
    );
    Ok(())
}

fn cmd_export(study_path: &Path, csv: &Path) -> CliResult<()> {
    let study = ParametricStudy::load(study_path)?;
    study.export_csv(csv)?;
    println!(
        "✓ Exported {} simulation(s) to {}",
        study.len(),
        csv.display()
    );
    Ok(())
}

fn cmd_material(parameters: &Path, thermal: &Path, characteristic_width: &Path) -> CliResult<()> {
    let material = AdditiveMaterial::load(parameters, thermal, characteristic_width)?;
    println!("✓ Loaded material {}", material.name);
    if !material.description.is_empty() {
        println!("  {}", material.description);
    }
    println!(
        "  Thermal properties: {} points",
        material.thermal_properties_data.len()
    );
    println!(
        "  Characteristic widths: {} points",
        material.characteristic_width_data.len()
    );
    for name in AdditiveMaterial::PROPERTY_NAMES {
        if let Some(value) = material.property(name) {
            println!("  {name:<48} {value}");
        }
    }
    Ok(())
}

fn cmd_launch_server(
    config: &ClientConfig,
    port: u16,
    product_version: &str,
    install_path: Option<&Path>,
) -> CliResult<()> {
    let cwd = config.resolved_user_data_path();
    let mut child = LocalServer::launch(port, &cwd, product_version, install_path)?;
    println!("✓ Server listening on port {port}, working directory {}", cwd.display());
    let status = child.wait()?;
    println!("Server exited: {status}");
    Ok(())
}

fn cmd_check_address(config: &ClientConfig, target: &str) -> CliResult<()> {
    let target = parse_target(target)?;
    check_transport(&target, config.transport_mode, config.allow_remote_host)?;
    println!("✓ {} resolves to {}", target.as_str(), target.ip);
    if !is_loopback(&target.ip) {
        println!("  Remote host ({:?} transport)", config.transport_mode);
    }
    Ok(())
}

fn cmd_outputs(config: &ClientConfig, sim_type: Option<SimulationType>) -> CliResult<()> {
    let store = OutputStore::new(config.resolved_user_data_path())?;
    let outputs = store.list_outputs(sim_type)?;
    if outputs.is_empty() {
        println!("No stored outputs in {}", store.root_dir().display());
        return Ok(());
    }
    for manifest in &outputs {
        let mut line = format!(
            "  {:<24} {:<15} {:<10} {}",
            manifest.sim_id,
            manifest.sim_type.as_str(),
            manifest.status.as_str(),
            manifest.timestamp
        );
        if let Some(message) = &manifest.error_message {
            line.push_str(&format!("  {message}"));
        }
        println!("{line}");
    }
    println!("✓ {} output(s)", outputs.len());
    Ok(())
}

fn cmd_logs(config: &ClientConfig, id: &str) -> CliResult<()> {
    let store = OutputStore::new(config.resolved_user_data_path())?;
    if !store.has_output(id) {
        return Err(CliError::NoOutput(id.to_string()));
    }
    print!("{}", store.load_logs(id)?);
    Ok(())
}
