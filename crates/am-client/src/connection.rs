//! Server connection seam.
//!
//! A [`ServerConnection`] is one Additive server reachable over some
//! transport. Simulations run as long-running operations named after the
//! simulation id; the client polls or waits on them until they are done.

use crate::error::{ClientError, ClientResult};
use crate::progress::ProgressState;
use am_core::{AdditiveMaterial, LogFile, SimulationRequest, SimulationResponse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Progress details attached to an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationMetadata {
    pub simulation_id: String,
    pub state: ProgressState,
    pub percent_complete: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub context: String,
}

/// Status codes an operation can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    Aborted,
    Internal,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationError {
    pub code: StatusCode,
    pub message: String,
    #[serde(default)]
    pub logs: Vec<LogFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationResult {
    Response(SimulationResponse),
    Error(OperationError),
}

/// A long-running simulation on a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub done: bool,
    pub metadata: OperationMetadata,
    #[serde(default)]
    pub result: Option<OperationResult>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConnectionStatus {
    pub connected: bool,
    pub channel_str: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl fmt::Display for ServerConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = self.channel_str.as_deref().unwrap_or("<none>");
        if !self.connected {
            return write!(f, "Server {target} is not connected");
        }
        write!(f, "Server {target}")?;
        for (key, value) in &self.metadata {
            write!(f, "\n  {key}: {value}")?;
        }
        Ok(())
    }
}

/// One Additive server.
pub trait ServerConnection: Send + Sync {
    /// Target of the connection in the form `host:port`.
    fn channel_str(&self) -> String;

    /// Server metadata such as version and license information.
    fn about(&self) -> ClientResult<BTreeMap<String, String>>;

    fn materials_list(&self) -> ClientResult<Vec<String>>;

    fn material(&self, name: &str) -> ClientResult<AdditiveMaterial>;

    /// Upload a file used by a later request, such as a part geometry.
    /// Returns the name the server stored it under.
    fn upload_file(&self, name: &str, content: &[u8]) -> ClientResult<String>;

    /// Start a simulation or material tuning run. The returned operation is
    /// named after the request id.
    fn simulate(&self, request: &SimulationRequest) -> ClientResult<Operation>;

    fn get_operation(&self, name: &str) -> ClientResult<Operation>;

    /// Block until the operation changes or `timeout` elapses, then return it.
    fn wait_operation(&self, name: &str, timeout: Duration) -> ClientResult<Operation>;

    fn cancel_operation(&self, name: &str) -> ClientResult<()>;

    fn list_operations(&self) -> ClientResult<Vec<Operation>>;

    fn status(&self) -> ServerConnectionStatus {
        match self.about() {
            Ok(metadata) => ServerConnectionStatus {
                connected: true,
                channel_str: Some(self.channel_str()),
                metadata,
            },
            Err(_) => ServerConnectionStatus {
                connected: false,
                channel_str: Some(self.channel_str()),
                metadata: BTreeMap::new(),
            },
        }
    }

    /// Poll the server up to `retries + 1` times with a linearly growing delay.
    fn ready(&self, retries: u32) -> bool {
        ready_with_delay(self, retries, Duration::from_secs(1))
    }
}

/// [`ServerConnection::ready`] with a configurable base delay.
pub fn ready_with_delay<S: ServerConnection + ?Sized>(
    server: &S,
    retries: u32,
    base_delay: Duration,
) -> bool {
    for attempt in 0..=retries {
        if server.about().is_ok() {
            return true;
        }
        if attempt < retries {
            thread::sleep(base_delay * (attempt + 1));
        }
    }
    false
}

/// Opens connections to servers by address.
pub trait Connector {
    fn connect(&self, target: &str) -> ClientResult<Arc<dyn ServerConnection>>;
}

impl<F> Connector for F
where
    F: Fn(&str) -> ClientResult<Arc<dyn ServerConnection>>,
{
    fn connect(&self, target: &str) -> ClientResult<Arc<dyn ServerConnection>> {
        self(target)
    }
}

/// Fetch an operation from whichever server knows it.
pub fn find_operation(
    servers: &[Arc<dyn ServerConnection>],
    name: &str,
) -> ClientResult<Operation> {
    for server in servers {
        match server.get_operation(name) {
            Ok(op) => return Ok(op),
            Err(e) => {
                tracing::debug!("Failed to find {name} on {}: {e}", server.channel_str());
            }
        }
    }
    Err(ClientError::OperationNotFound(name.to_string()))
}
