use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use klip_logging::{klip_info, klip_warn};
use tempfile::NamedTempFile;
use thiserror::Error;

const PART_PREFIX: &str = ".klip-";
const PART_SUFFIX: &str = ".part";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("download directory {} unusable: {message}", path.display())]
    DownloadDir { path: PathBuf, message: String },
    #[error("refusing unsafe filename {0:?}")]
    UnsafeFilename(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the download directory exists; create it (and parents) if missing.
/// Temp files left behind by an interrupted earlier run are removed.
pub fn ensure_download_dir(dir: &Path) -> Result<(), PersistError> {
    let dir_error = |message: String| PersistError::DownloadDir {
        path: dir.to_path_buf(),
        message,
    };
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {
            sweep_stale_parts(dir);
            Ok(())
        }
        Ok(_) => Err(dir_error("path is not a directory".into())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| dir_error(e.to_string()))
        }
        Err(err) => Err(dir_error(err.to_string())),
    }
}

/// Removes `.klip-*.part` files. Runs are serialized, so none belongs to a
/// live download. Returns the number removed.
pub fn sweep_stale_parts(dir: &Path) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            klip_warn!("Could not scan {:?} for stale downloads: {}", dir, err);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !is_part_name(name) || !entry.file_type().is_ok_and(|t| t.is_file()) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                klip_info!("Removed stale partial download {}", name);
                removed += 1;
            }
            Err(err) => klip_warn!("Failed to remove stale partial download {}: {}", name, err),
        }
    }
    removed
}

fn is_part_name(name: &str) -> bool {
    name.len() > PART_PREFIX.len() + PART_SUFFIX.len()
        && name.starts_with(PART_PREFIX)
        && name.ends_with(PART_SUFFIX)
}

/// Resolve `{dir}/{filename}`, rejecting names that would escape `dir`.
pub fn local_target(dir: &Path, filename: &str) -> Result<PathBuf, PersistError> {
    let unsafe_name = || PersistError::UnsafeFilename(filename.to_string());
    // Reserved names would be swept as stale downloads on the next run.
    if filename.contains(['/', '\\', '\0']) || is_part_name(filename) {
        return Err(unsafe_name());
    }
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(dir.join(filename)),
        _ => Err(unsafe_name()),
    }
}

/// Presence of any entry at `path` marks the article as synced.
pub fn is_already_synced(path: &Path) -> bool {
    path.exists()
}

/// Streams a download into a hidden temp file next to `target`, renaming it
/// into place only on [`AtomicDownload::commit`]. Dropping it uncommitted
/// removes the temp file.
pub struct AtomicDownload {
    tmp: NamedTempFile,
    target: PathBuf,
    bytes: u64,
}

impl AtomicDownload {
    pub fn create(target: &Path) -> Result<Self, PersistError> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = tempfile::Builder::new()
            .prefix(PART_PREFIX)
            .suffix(PART_SUFFIX)
            .tempfile_in(dir)?;
        Ok(Self {
            tmp,
            target: target.to_path_buf(),
            bytes: 0,
        })
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), PersistError> {
        self.tmp.write_all(chunk)?;
        self.bytes += chunk.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Flush, sync and rename onto the target. Returns the byte count.
    pub fn commit(mut self) -> Result<u64, PersistError> {
        self.tmp.flush()?;
        self.tmp.as_file_mut().sync_all()?;
        self.tmp
            .persist(&self.target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(self.bytes)
    }
}
