use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Command;
use tracing::warn;

/// Name of the server binary built alongside the launcher
pub const SERVER_BIN_NAME: &str = "chat-convert-web";

/// How long an interrupted server gets to exit before it is killed
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum ServerExit {
    /// The server process ended on its own
    Finished(ExitStatus),
    /// Ctrl+C reached the launcher while the server was running
    Interrupted,
}

/// Launcher port: the positional argument when given, else `default`
pub fn parse_port(arg: Option<&str>, default: u16) -> Result<u16, String> {
    match arg {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|_| format!("Invalid port number: {}", raw)),
    }
}

/// `SERVER_BIN` if set, else the server binary next to the current executable
pub fn server_binary() -> PathBuf {
    if let Ok(path) = std::env::var("SERVER_BIN") {
        return PathBuf::from(path);
    }

    let file_name = format!("{}{}", SERVER_BIN_NAME, std::env::consts::EXE_SUFFIX);
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&file_name)))
        .unwrap_or_else(|| PathBuf::from(file_name))
}

/// Runs the server in the foreground and waits for it.
pub async fn run_server(binary: &Path, port: u16) -> Result<ServerExit> {
    let mut child = Command::new(binary)
        .arg("--port")
        .arg(port.to_string())
        .spawn()
        .with_context(|| format!("failed to start {}", binary.display()))?;

    tokio::select! {
        status = child.wait() => {
            let status = status.context("failed to wait for server process")?;
            return Ok(ServerExit::Finished(status));
        }
        result = tokio::signal::ctrl_c() => {
            result.context("failed to install Ctrl+C handler")?;
        }
    }

    // The terminal delivers the same interrupt to the child; give it time to drain
    if tokio::time::timeout(SHUTDOWN_GRACE, child.wait())
        .await
        .is_err()
    {
        warn!("Server did not stop within {:?}, killing it", SHUTDOWN_GRACE);
        child.kill().await.context("failed to kill server process")?;
    }

    Ok(ServerExit::Interrupted)
}
