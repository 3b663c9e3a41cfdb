use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

use crate::config::ServerConfig;

/// Arguments for a single converter run
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub user_id: String,
    pub output_dir: PathBuf,
    pub input_path: PathBuf,
}

/// Exit status and captured streams of a finished converter run
#[derive(Debug, Clone, Default)]
pub struct ConverterOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ConverterOutput {
    /// Text reported to the client when the run failed: stderr if any,
    /// otherwise stdout, otherwise a fixed message.
    pub fn diagnostics(&self) -> String {
        [self.stderr.trim(), self.stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("Conversion failed")
            .to_string()
    }
}

#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("converter tool '{tool}' not found")]
    ToolNotFound { tool: String },

    #[error("converter timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("failed to run converter: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the external conversion tool
#[async_trait::async_trait]
pub trait ConverterRunner: Send + Sync {
    /// Run the converter to completion. A nonzero exit is a successful call
    /// returning `success == false`; only spawn failures and timeouts are errors.
    async fn run(&self, job: &ConversionJob) -> Result<ConverterOutput, ConverterError>;

    /// Check if the converter tool can be invoked
    async fn health_check(&self) -> bool;
}

/// Converter launched as `<program> <launch args...> --userid <id> --output-dir <dir> <input>`
pub struct ScriptConverter {
    program: String,
    launch_args: Vec<OsString>,
    working_dir: PathBuf,
    timeout: Duration,
}

impl ScriptConverter {
    pub fn new(
        program: impl Into<String>,
        launch_args: Vec<OsString>,
        working_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            launch_args,
            working_dir: working_dir.into(),
            timeout,
        }
    }

    /// `uv run <script>` in the configured working directory
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.converter_tool.clone(),
            vec![
                OsString::from("run"),
                OsString::from(&config.converter_script),
            ],
            config.converter_workdir.clone(),
            config.conversion_timeout,
        )
    }

    pub(crate) fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, job: &ConversionJob) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.launch_args)
            .arg("--userid")
            .arg(&job.user_id)
            .arg("--output-dir")
            .arg(&job.output_dir)
            .arg(&job.input_path)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

#[async_trait::async_trait]
impl ConverterRunner for ScriptConverter {
    async fn run(&self, job: &ConversionJob) -> Result<ConverterOutput, ConverterError> {
        tracing::info!(
            "Running converter '{}' for user {} in {}",
            self.program,
            job.user_id,
            self.working_dir().display()
        );

        let mut cmd = self.command(job);

        // Dropping the output future on timeout kills the child (kill_on_drop)
        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                tracing::warn!(
                    "Converter exceeded {}s for user {}",
                    self.timeout.as_secs(),
                    job.user_id
                );
                return Err(ConverterError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConverterError::ToolNotFound {
                    tool: self.program().to_string(),
                });
            }
            Ok(result) => result?,
        };

        let result = ConverterOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if result.success {
            tracing::info!("Converter finished for user {}", job.user_id);
        } else {
            tracing::warn!(
                "Converter exited with {:?} for user {}",
                result.exit_code,
                job.user_id
            );
        }

        Ok(result)
    }

    async fn health_check(&self) -> bool {
        let mut probe = Command::new(&self.program);
        probe
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        matches!(
            tokio::time::timeout(Duration::from_secs(5), probe.status()).await,
            Ok(Ok(status)) if status.success()
        )
    }
}
