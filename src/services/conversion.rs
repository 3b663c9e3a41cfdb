use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::api::error::AppError;
use crate::models::{ConvertRequest, ConvertedArchive};
use crate::services::archive::zip_directory;
use crate::services::converter::{ConversionJob, ConverterRunner};
use crate::utils::validation::validate_export_json;

/// Fixed name the upload is staged under
pub const INPUT_FILE_NAME: &str = "conversations.json";

/// Directory handed to the converter as `--output-dir`
pub const OUTPUT_DIR_NAME: &str = "output";

/// Subdirectory of the output dir the converter is expected to populate
pub const RESULT_DIR_NAME: &str = "chatgpt";

const WORKSPACE_PREFIX: &str = "chat-convert-";

/// Orchestrates one upload -> converter -> zip round trip.
///
/// Every call gets its own [`TempDir`]; it is removed when the call returns,
/// whichever way it returns.
pub struct ConversionService {
    runner: Arc<dyn ConverterRunner>,
    temp_root: Option<PathBuf>,
}

impl ConversionService {
    pub fn new(runner: Arc<dyn ConverterRunner>, temp_root: Option<PathBuf>) -> Self {
        Self { runner, temp_root }
    }

    pub fn runner(&self) -> &Arc<dyn ConverterRunner> {
        &self.runner
    }

    fn create_workspace(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }

    pub async fn convert(&self, request: &ConvertRequest) -> Result<ConvertedArchive, AppError> {
        let workspace = self.create_workspace()?;
        let result = self.convert_in(&workspace, request).await;

        let path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            warn!("Failed to remove workspace {}: {}", path.display(), e);
        }

        result
    }

    async fn convert_in(
        &self,
        workspace: &TempDir,
        request: &ConvertRequest,
    ) -> Result<ConvertedArchive, AppError> {
        info!(
            "Converting '{}' ({} bytes) for user {} in {}",
            request.file_name,
            request.contents.len(),
            request.user_id,
            workspace.path().display()
        );

        // 1. Stage upload
        let input_path = workspace.path().join(INPUT_FILE_NAME);
        tokio::fs::write(&input_path, &request.contents).await?;

        // 2. Reject anything that is not JSON before spawning the converter
        let staged = tokio::fs::read(&input_path).await?;
        if let Err(e) = validate_export_json(&staged) {
            warn!("Rejected upload from user {}: {}", request.user_id, e);
            return Err(AppError::BadRequest(format!("Invalid JSON file: {}", e)));
        }

        // 3. Run converter
        let output_dir = workspace.path().join(OUTPUT_DIR_NAME);
        tokio::fs::create_dir_all(&output_dir).await?;

        let job = ConversionJob {
            user_id: request.user_id.clone(),
            output_dir: output_dir.clone(),
            input_path,
        };
        let output = self.runner.run(&job).await?;
        if !output.success {
            return Err(AppError::ConversionFailed(output.diagnostics()));
        }

        // 4. Package results
        let result_dir = output_dir.join(RESULT_DIR_NAME);
        if !tokio::fs::metadata(&result_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            return Err(AppError::NoOutput);
        }

        let bytes = tokio::task::spawn_blocking(move || zip_directory(&result_dir))
            .await
            .map_err(|e| AppError::Internal(format!("Archive task failed: {}", e)))??;

        info!(
            "Conversion for user {} produced a {} byte archive",
            request.user_id,
            bytes.len()
        );

        Ok(ConvertedArchive {
            file_name: ConvertedArchive::file_name_for(&request.user_id),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::converter::{ConverterError, ConverterOutput};
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Writes `chatgpt/<user>.json` and records how often it ran
    struct WritingRunner {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ConverterRunner for WritingRunner {
        async fn run(&self, job: &ConversionJob) -> Result<ConverterOutput, ConverterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let dir = job.output_dir.join(RESULT_DIR_NAME);
            std::fs::create_dir_all(&dir)?;
            std::fs::write(dir.join(format!("{}.json", job.user_id)), b"[]")?;
            Ok(ConverterOutput {
                success: true,
                exit_code: Some(0),
                ..ConverterOutput::default()
            })
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    /// Exits cleanly without writing anything
    struct SilentRunner;

    #[async_trait::async_trait]
    impl ConverterRunner for SilentRunner {
        async fn run(&self, _job: &ConversionJob) -> Result<ConverterOutput, ConverterError> {
            Ok(ConverterOutput {
                success: true,
                exit_code: Some(0),
                ..ConverterOutput::default()
            })
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn request(user_id: &str, contents: &'static [u8]) -> ConvertRequest {
        ConvertRequest {
            user_id: user_id.to_string(),
            file_name: "conversations.json".to_string(),
            contents: Bytes::from_static(contents),
        }
    }

    /// Deletes its own workspace and then reports failure
    struct VanishingRunner;

    #[async_trait::async_trait]
    impl ConverterRunner for VanishingRunner {
        async fn run(&self, job: &ConversionJob) -> Result<ConverterOutput, ConverterError> {
            let workspace = job.output_dir.parent().unwrap();
            std::fs::remove_dir_all(workspace)?;
            Ok(ConverterOutput {
                success: false,
                exit_code: Some(1),
                stderr: "boom".to_string(),
                ..ConverterOutput::default()
            })
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn workspaces_left(root: &std::path::Path) -> usize {
        std::fs::read_dir(root).unwrap().count()
    }

    #[tokio::test]
    async fn test_convert_packages_runner_output() {
        let root = tempfile::tempdir().unwrap();
        let runner = Arc::new(WritingRunner {
            calls: AtomicUsize::new(0),
        });
        let service = ConversionService::new(runner.clone(), Some(root.path().to_path_buf()));

        let archive = service.convert(&request("alice", b"[]")).await.unwrap();

        assert_eq!(archive.file_name, "chatgpt_converted_alice.zip");
        let zip = zip::ZipArchive::new(std::io::Cursor::new(archive.bytes)).unwrap();
        assert_eq!(zip.file_names().collect::<Vec<_>>(), vec!["alice.json"]);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(workspaces_left(root.path()), 0);
    }

    #[tokio::test]
    async fn test_invalid_json_skips_runner() {
        let root = tempfile::tempdir().unwrap();
        let runner = Arc::new(WritingRunner {
            calls: AtomicUsize::new(0),
        });
        let service = ConversionService::new(runner.clone(), Some(root.path().to_path_buf()));

        let err = service
            .convert(&request("alice", br#"[{"title": "#))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(ref msg) if msg.starts_with("Invalid JSON file:")));
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
        assert_eq!(workspaces_left(root.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_result_dir_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let service = ConversionService::new(Arc::new(SilentRunner), Some(root.path().to_path_buf()));

        let err = service.convert(&request("bob", b"{}")).await.unwrap_err();

        assert!(matches!(err, AppError::NoOutput));
        assert_eq!(workspaces_left(root.path()), 0);
    }

    #[tokio::test]
    async fn test_cleanup_failure_keeps_conversion_result() {
        let root = tempfile::tempdir().unwrap();
        let service = ConversionService::new(Arc::new(VanishingRunner), Some(root.path().to_path_buf()));

        let err = service.convert(&request("carol", b"[]")).await.unwrap_err();

        assert!(matches!(err, AppError::ConversionFailed(ref msg) if msg == "boom"));
        assert_eq!(workspaces_left(root.path()), 0);
    }
}
