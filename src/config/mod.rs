use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime configuration for the converter web server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind (default: "127.0.0.1")
    pub host: String,

    /// Port to listen on (default: 3010)
    pub port: u16,

    /// Static HTML form served on GET (default: "webserver/index.html")
    pub index_path: PathBuf,

    /// Package-run tool used to launch the converter (default: "uv")
    pub converter_tool: String,

    /// Converter script passed to the tool (default: "convert_chatgpt.py")
    pub converter_script: String,

    /// Working directory the converter runs in (default: ".")
    pub converter_workdir: PathBuf,

    /// Upper bound on a single conversion run (default: 60 seconds)
    pub conversion_timeout: Duration,

    /// Maximum request body size in bytes (default: 256 MB)
    pub max_upload_size: usize,

    /// Parent directory for per-request scratch space (default: system temp dir)
    pub temp_root: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3010,
            index_path: PathBuf::from("webserver/index.html"),
            converter_tool: "uv".to_string(),
            converter_script: "convert_chatgpt.py".to_string(),
            converter_workdir: PathBuf::from("."),
            conversion_timeout: Duration::from_secs(60),
            max_upload_size: 256 * 1024 * 1024, // 256 MB
            temp_root: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(default.host),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            index_path: env::var("INDEX_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.index_path),

            converter_tool: env::var("CONVERTER_TOOL").unwrap_or(default.converter_tool),

            converter_script: env::var("CONVERTER_SCRIPT").unwrap_or(default.converter_script),

            converter_workdir: env::var("CONVERTER_WORKDIR")
                .map(PathBuf::from)
                .unwrap_or(default.converter_workdir),

            conversion_timeout: env::var("CONVERSION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.conversion_timeout),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            temp_root: env::var("CONVERT_TEMP_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .or(default.temp_root),
        }
    }

    /// Config for local experiments: short timeout, small uploads
    pub fn development() -> Self {
        Self {
            conversion_timeout: Duration::from_secs(10),
            max_upload_size: 16 * 1024 * 1024,
            ..Self::default()
        }
    }

    /// Location of the converter script as seen from the working directory
    pub fn converter_script_path(&self) -> PathBuf {
        if self.converter_workdir == Path::new(".") {
            PathBuf::from(&self.converter_script)
        } else {
            self.converter_workdir.join(&self.converter_script)
        }
    }
}
