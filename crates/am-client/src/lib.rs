//! am-client: client service layer for Additive servers.
//!
//! Contains:
//! - connection (server connection seam and long-running operation model)
//! - network (address validation and open port lookup)
//! - local_server (launching a server on this machine)
//! - progress (progress states and handlers)
//! - task, task_manager (tracking submitted simulations)
//! - additive (the client itself)
//! - config (YAML client configuration)

pub mod additive;
pub mod config;
pub mod connection;
pub mod error;
pub mod local_server;
pub mod network;
pub mod progress;
pub mod task;
pub mod task_manager;

pub use additive::{Additive, CLIENT_VERSION};
pub use config::{ClientConfig, default_user_data_path};
pub use connection::{
    Connector, Operation, OperationError, OperationMetadata, OperationResult, ServerConnection,
    ServerConnectionStatus, StatusCode, find_operation,
};
pub use error::{ClientError, ClientResult};
pub use local_server::{DEFAULT_ADDITIVE_SERVICE_PORT, DEFAULT_PRODUCT_VERSION, LocalServer};
pub use network::TransportMode;
pub use progress::{
    DefaultSingleSimulationProgressHandler, Progress, ProgressHandler, ProgressState,
};
pub use task::SimulationTask;
pub use task_manager::SimulationTaskManager;
