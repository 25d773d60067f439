//! Launching an Additive server on the local host.

use crate::error::{ClientError, ClientResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_PRODUCT_VERSION: &str = "252";
pub const DEFAULT_ADDITIVE_SERVICE_PORT: u16 = 50052;
pub const ADDITIVE_SERVER_EXE_NAME: &str = "additiveserver";
/// Location of the server executable relative to a versioned install root.
pub const ADDITIVE_SERVER_SUBDIR: &str = "Additive/additiveserver";
pub const LINUX_INSTALL_ROOTS: [&str; 2] = ["/usr/ansys_inc", "/ansys_inc"];

const STARTUP_GRACE: Duration = Duration::from_secs(2);

pub struct LocalServer;

impl LocalServer {
    /// Start a server listening on `port` with `cwd` as its working directory.
    ///
    /// Output goes to a timestamped log file in `cwd`. The returned child is
    /// owned by the caller; kill it to stop the server.
    pub fn launch(
        port: u16,
        cwd: &Path,
        product_version: &str,
        linux_install_path: Option<&Path>,
    ) -> ClientResult<Child> {
        let product_version = if product_version.is_empty() {
            DEFAULT_PRODUCT_VERSION
        } else {
            product_version
        };
        let server_exe = Self::server_executable(product_version, linux_install_path)?;
        if !server_exe.exists() {
            return Err(not_found(format!("Cannot find {}", server_exe.display())));
        }

        fs::create_dir_all(cwd)?;
        let start_time = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let log_path = cwd.join(format!("additiveserver_{start_time}.log"));
        let log_file = File::create(&log_path)?;
        let log_err = log_file.try_clone()?;

        debug!(exe = %server_exe.display(), port, "Launching local server");
        let mut child = Command::new(&server_exe)
            .arg("--port")
            .arg(port.to_string())
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_err))
            .spawn()?;

        thread::sleep(STARTUP_GRACE);
        if let Some(status) = child.try_wait()? {
            let code = status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(ClientError::LocalServer {
                message: format!("Server exited with code {code}"),
            });
        }

        info!(port, log = %log_path.display(), "Local server started");
        Ok(child)
    }

    #[cfg(windows)]
    fn server_executable(
        product_version: &str,
        _linux_install_path: Option<&Path>,
    ) -> ClientResult<PathBuf> {
        let var = format!("AWP_ROOT{product_version}");
        let awp_root = std::env::var_os(&var)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| not_found("Cannot find Ansys installation directory".to_string()))?;
        Ok(PathBuf::from(awp_root)
            .join(ADDITIVE_SERVER_SUBDIR)
            .join(format!("{ADDITIVE_SERVER_EXE_NAME}.exe")))
    }

    #[cfg(not(windows))]
    fn server_executable(
        product_version: &str,
        linux_install_path: Option<&Path>,
    ) -> ClientResult<PathBuf> {
        let base = match linux_install_path {
            Some(path) => {
                if !path.is_dir() {
                    return Err(not_found(format!("Cannot find {}", path.display())));
                }
                path.to_path_buf()
            }
            None => LINUX_INSTALL_ROOTS
                .iter()
                .map(PathBuf::from)
                .find(|p| p.is_dir())
                .ok_or_else(|| not_found("Cannot find Ansys installation directory".to_string()))?,
        };
        Ok(base
            .join(format!("v{product_version}"))
            .join(ADDITIVE_SERVER_SUBDIR)
            .join(ADDITIVE_SERVER_EXE_NAME))
    }
}

fn not_found(message: String) -> ClientError {
    ClientError::LocalServer { message }
}
