//! Zip a directory (or a single file) for upload

use crate::{CliError, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::{
    write::{FileOptions, SimpleFileOptions},
    AesMode, CompressionMethod, ZipWriter,
};

/// What ended up in the archive
#[derive(Clone, Debug)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    /// Number of file entries
    pub files: usize,
    /// Size of the archive in bytes
    pub size: u64,
}

/// Deflate everything under `source` into a new zip at `output`.
///
/// Entry names are relative to `source` and use `/`. Directories are walked
/// in file-name order. An existing `output` is never overwritten.
pub fn zip_source(source: &Path, output: &Path, password: Option<&str>) -> Result<ArchiveSummary> {
    if !source.exists() {
        return Err(CliError::SourceNotFound(source.to_path_buf()));
    }

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(output)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => CliError::ArchiveExists(output.to_path_buf()),
            _ => CliError::Io(e),
        })?;
    info!("Zipping {} to {}", source.display(), output.display());

    let mut writer = ZipWriter::new(file);
    let dir_options = SimpleFileOptions::default();
    let mut options: FileOptions<'_, ()> =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    if let Some(password) = password {
        options = options.with_aes_encryption(AesMode::Aes256, password);
    }

    let mut files = 0;
    if source.is_file() {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| CliError::InvalidArgument(format!("no file name in {}", source.display())))?;
        add_file(&mut writer, source, &name, options)?;
        files += 1;
    } else {
        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = entry?;
            if entry.depth() == 0 {
                continue;
            }
            let name = entry_name(source, entry.path())?;

            if entry.file_type().is_dir() {
                writer.add_directory(name, dir_options)?;
            } else {
                add_file(&mut writer, entry.path(), &name, options)?;
                files += 1;
            }
        }
    }

    writer.finish()?;
    let size = std::fs::metadata(output)?.len();
    info!("{} is {}", output.display(), format_size(size));

    Ok(ArchiveSummary {
        path: output.to_path_buf(),
        files,
        size,
    })
}

fn add_file(
    writer: &mut ZipWriter<File>,
    path: &Path,
    name: &str,
    options: FileOptions<'_, ()>,
) -> Result<()> {
    debug!("Zipping {}", name);
    writer.start_file(name, options)?;
    let mut f = File::open(path)?;
    io::copy(&mut f, writer)?;
    Ok(())
}

fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| CliError::InvalidArgument(format!("{} is outside {}", path.display(), root.display())))?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

/// Human readable byte count
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
