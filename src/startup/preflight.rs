use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

use crate::config::ServerConfig;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PreflightError {
    #[error("Missing required files: {}", .0.join(", "))]
    MissingFiles(Vec<String>),

    #[error("'{tool}' command not found. Make sure {tool} is installed and in your PATH.")]
    ToolUnavailable { tool: String },
}

/// Entries of `required` that do not exist under `root`, in input order
pub fn missing_files<P: AsRef<Path>>(root: &Path, required: &[P]) -> Vec<String> {
    required
        .iter()
        .filter(|p| !root.join(p.as_ref()).exists())
        .map(|p| p.as_ref().display().to_string())
        .collect()
}

/// True when `<tool> --version` runs and exits successfully
pub fn tool_available(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// The form page and converter script as the server will resolve them
pub fn required_files(config: &ServerConfig) -> Vec<PathBuf> {
    vec![config.index_path.clone(), config.converter_script_path()]
}

/// Launcher preflight: required files first, then the package-run tool.
pub fn check_dependencies(root: &Path, config: &ServerConfig) -> Result<(), PreflightError> {
    let missing = missing_files(root, &required_files(config));
    if !missing.is_empty() {
        return Err(PreflightError::MissingFiles(missing));
    }

    if !tool_available(&config.converter_tool) {
        return Err(PreflightError::ToolUnavailable {
            tool: config.converter_tool.clone(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_FILES: &[&str] = &["webserver/index.html", "convert_chatgpt.py"];

    fn project_with(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "").unwrap();
        }
        dir
    }

    fn config_with_tool(tool: &str) -> ServerConfig {
        ServerConfig {
            converter_tool: tool.to_string(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_missing_files_lists_all_absent() {
        let dir = project_with(&[]);
        assert_eq!(
            missing_files(dir.path(), DEFAULT_FILES),
            vec!["webserver/index.html", "convert_chatgpt.py"]
        );

        let dir = project_with(&["convert_chatgpt.py"]);
        assert_eq!(
            missing_files(dir.path(), DEFAULT_FILES),
            vec!["webserver/index.html"]
        );
    }

    #[test]
    fn test_default_required_files() {
        assert_eq!(
            required_files(&ServerConfig::default()),
            vec![
                PathBuf::from("webserver/index.html"),
                PathBuf::from("convert_chatgpt.py")
            ]
        );
    }

    #[test]
    fn test_check_dependencies_reports_files_before_tool() {
        let dir = project_with(&["webserver/index.html"]);
        let err = check_dependencies(
            dir.path(),
            &config_with_tool("definitely-not-an-installed-tool-7f3a"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            PreflightError::MissingFiles(vec!["convert_chatgpt.py".to_string()])
        );
        assert_eq!(
            err.to_string(),
            "Missing required files: convert_chatgpt.py"
        );
    }

    #[test]
    fn test_check_dependencies_follows_configured_locations() {
        let project = project_with(&["webserver/index.html"]);
        let workdir = project_with(&["convert_chatgpt.py"]);
        let config = ServerConfig {
            converter_workdir: workdir.path().to_path_buf(),
            ..config_with_tool("definitely-not-an-installed-tool-7f3a")
        };

        // Files resolve, so the tool is the first thing reported
        let err = check_dependencies(project.path(), &config).unwrap_err();
        assert!(matches!(err, PreflightError::ToolUnavailable { .. }));

        // The script in the project root no longer counts
        let project = project_with(DEFAULT_FILES);
        let empty_workdir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            converter_workdir: empty_workdir.path().to_path_buf(),
            ..config_with_tool("definitely-not-an-installed-tool-7f3a")
        };
        let err = check_dependencies(project.path(), &config).unwrap_err();
        assert_eq!(
            err,
            PreflightError::MissingFiles(vec![
                empty_workdir
                    .path()
                    .join("convert_chatgpt.py")
                    .display()
                    .to_string()
            ])
        );
    }

    #[test]
    fn test_check_dependencies_reports_missing_tool() {
        let dir = project_with(DEFAULT_FILES);
        let err = check_dependencies(
            dir.path(),
            &config_with_tool("definitely-not-an-installed-tool-7f3a"),
        )
        .unwrap_err();
        assert!(matches!(err, PreflightError::ToolUnavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_check_dependencies_passes() {
        // `true --version` exits 0 on every unix
        let dir = project_with(DEFAULT_FILES);
        assert_eq!(check_dependencies(dir.path(), &config_with_tool("true")), Ok(()));
    }
}
