use std::process::{Command, Stdio};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Delay before the browser is pointed at the freshly started server
pub const BROWSER_DELAY: Duration = Duration::from_secs(2);

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(windows)]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", "", url]);
    cmd
}

#[cfg(all(unix, not(target_os = "macos")))]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}

/// Opens `url` with the platform's default browser handler
pub fn open_browser(url: &str) -> std::io::Result<()> {
    let status = opener_command(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!(
            "browser opener exited with {}",
            status
        )))
    }
}

/// Fires once after `delay`. Failures are logged, never propagated.
pub fn schedule_browser_open(url: String, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let target = url.clone();
        let result = tokio::task::spawn_blocking(move || open_browser(&target))
            .await
            .map_err(std::io::Error::other)
            .and_then(|r| r);

        match result {
            Ok(()) => info!("🌐 Opened browser at {}", url),
            Err(e) => {
                warn!("Could not open browser automatically: {}", e);
                info!("Please manually open {} in your browser.", url);
            }
        }
    })
}
