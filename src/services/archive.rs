use anyhow::{Context, Result};
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use zip::{CompressionMethod, ZipWriter, write::FileOptions};

/// Builds an in-memory deflate zip of every regular file under `root`.
///
/// Entry names are relative to `root` and always use `/` separators.
/// Directories are not stored as entries, so empty directories are dropped.
pub fn zip_directory(root: &Path) -> Result<Vec<u8>> {
    let mut files = Vec::new();
    collect_files(root, &mut files)?;
    files.sort();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in &files {
        let name = entry_name(root, path)?;
        writer
            .start_file(name.as_str(), options)
            .with_context(|| format!("Failed to add {} to archive", name))?;

        let mut file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        std::io::copy(&mut file, &mut writer)
            .with_context(|| format!("Failed to compress {}", path.display()))?;
    }

    let cursor = writer.finish().context("Failed to finalize archive")?;

    tracing::debug!("Archived {} files from {}", files.len(), root.display());
    Ok(cursor.into_inner())
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            collect_files(&path, files)?;
        } else if file_type.is_file() {
            files.push(path);
        } else if file_type.is_symlink() && path.is_file() {
            // Symlinked files are archived by content; symlinked dirs are not followed
            files.push(path);
        }
    }

    Ok(())
}

fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();

    Ok(parts.join("/"))
}
