//! Network address helpers.

use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, TcpListener, ToSocketAddrs};

/// Receive buffer size for server messages (bytes).
pub const MAX_RCV_MSG_LEN: usize = 256 * 1024 * 1024;

pub const LOCALHOST: &str = "127.0.0.1";
pub const MIN_PORT: u16 = 1024;
pub const MAX_PORT: u16 = 65535;

/// How a connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Insecure,
    Mtls,
    Uds,
}

impl std::str::FromStr for TransportMode {
    type Err = ClientError;

    fn from_str(s: &str) -> ClientResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "insecure" => Ok(TransportMode::Insecure),
            "mtls" => Ok(TransportMode::Mtls),
            "uds" => Ok(TransportMode::Uds),
            _ => Err(ClientError::InvalidAddress(format!(
                "Invalid transport mode string: {s}"
            ))),
        }
    }
}

/// Accepts `localhost` or a dotted IPv4 address. Quotes are ignored.
pub fn check_valid_ip(ip: &str) -> ClientResult<()> {
    if ip.eq_ignore_ascii_case("localhost") {
        return Ok(());
    }
    let cleaned: String = ip.chars().filter(|c| *c != '"' && *c != '\'').collect();
    cleaned
        .parse::<Ipv4Addr>()
        .map(|_| ())
        .map_err(|_| ClientError::InvalidAddress(format!("illegal IP address string {ip}")))
}

pub fn check_valid_port(port: u32, lower_bound: u32, high_bound: u32) -> ClientResult<()> {
    if (lower_bound..=high_bound).contains(&port) {
        Ok(())
    } else {
        Err(ClientError::InvalidAddress(format!(
            "'port' value outside of range {lower_bound} to {high_bound}."
        )))
    }
}

pub fn is_loopback(ip: &str) -> bool {
    ip.parse::<IpAddr>().map(|a| a.is_loopback()).unwrap_or(false)
}

/// A validated `host:port` target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    /// Resolved address of `host`.
    pub ip: String,
}

impl Target {
    pub fn as_str(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split and validate a `host:port` string, resolving the host.
pub fn parse_target(target: &str) -> ClientResult<Target> {
    let malformed = || {
        ClientError::InvalidAddress(format!(
            "Improperly formed target string {target}, it should be of the form 'host:port'"
        ))
    };
    let (host, port_str) = target.rsplit_once(':').ok_or_else(malformed)?;
    if host.is_empty() {
        return Err(malformed());
    }
    let port: u32 = port_str.trim().parse().map_err(|_| malformed())?;
    check_valid_port(port, MIN_PORT.into(), MAX_PORT.into())?;
    let port = port as u16;

    let ip = if host.eq_ignore_ascii_case("localhost") {
        LOCALHOST.to_string()
    } else if host.parse::<IpAddr>().is_ok() {
        host.to_string()
    } else {
        (host, port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.find(|a| a.is_ipv4()))
            .map(|a| a.ip().to_string())
            .ok_or_else(|| ClientError::InvalidAddress(format!("Cannot resolve host {host}")))?
    };
    check_valid_ip(&ip)?;

    Ok(Target {
        host: host.to_string(),
        port,
        ip,
    })
}

/// Insecure connections are only allowed to loopback unless explicitly overridden.
pub fn check_transport(
    target: &Target,
    mode: TransportMode,
    allow_remote_host: bool,
) -> ClientResult<()> {
    if mode == TransportMode::Insecure && !allow_remote_host && !is_loopback(&target.ip) {
        return Err(ClientError::InvalidAddress(
            "Connections to remote hosts are not allowed. Set 'allow_remote_host: true' to override."
                .to_string(),
        ));
    }
    Ok(())
}

/// Ask the OS for a free local port. It may be taken again by the time it is used.
pub fn find_open_port() -> ClientResult<u16> {
    let listener = TcpListener::bind(("0.0.0.0", 0))?;
    Ok(listener.local_addr()?.port())
}
