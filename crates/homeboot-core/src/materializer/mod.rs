// # Config Materializer
//
// Writes generated files (env files, compose fragments) from validated
// inputs.
//
// ## Guarantees
//
// - No clobbering: an existing file is left byte-for-byte and mode-for-mode
//   untouched unless overwriting is explicitly requested
// - Atomic writes: contents go to a temporary file in the target directory,
//   which is then renamed over the target
// - No exposure window: the temporary file is created owner-only before the
//   first byte is written, so secrets are never world-readable

pub mod env_file;

pub use env_file::EnvFile;

use std::fs::{self, Permissions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Mode of files that may contain secrets
pub const SECRET_FILE_MODE: u32 = 0o600;

/// Mode of generated files without secrets
pub const PUBLIC_FILE_MODE: u32 = 0o644;

/// Outcome of a materialize call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeOutcome {
    /// The file was (re)written
    Written,
    /// The file existed and overwriting was not requested
    SkippedExisting,
}

/// Write `values` as an owner-only env file at `path`
///
/// # Returns
///
/// - `Ok(MaterializeOutcome::SkippedExisting)`: `path` exists and `overwrite` is false
/// - `Ok(MaterializeOutcome::Written)`: the file now holds exactly `values`, mode 0600
/// - `Err(Error::Validation)`: a key or value cannot be represented
pub fn materialize(path: &Path, values: &EnvFile, overwrite: bool) -> Result<MaterializeOutcome> {
    let contents = values.render()?;
    write_generated(path, contents.as_bytes(), SECRET_FILE_MODE, overwrite)
}

/// Write arbitrary generated contents with the no-clobber rule
pub fn write_generated(
    path: &Path,
    contents: &[u8],
    mode: u32,
    overwrite: bool,
) -> Result<MaterializeOutcome> {
    if path.try_exists()? && !overwrite {
        info!("{} exists, leaving it untouched", path.display());
        return Ok(MaterializeOutcome::SkippedExisting);
    }

    write_atomic(path, contents, mode)?;
    info!("Wrote {}", path.display());
    Ok(MaterializeOutcome::Written)
}

/// Atomically replace `path` with `contents`, using `mode` from creation
///
/// The parent directory is created when missing.
pub fn write_atomic(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            Error::config(format!(
                "Failed to create directory {}: {}",
                dir.display(),
                e
            ))
        })?;
    }

    let mut staged = tempfile::Builder::new()
        .prefix(".homeboot-")
        .suffix(".tmp")
        .permissions(Permissions::from_mode(SECRET_FILE_MODE))
        .tempfile_in(dir)?;

    // umask never widens 0600; this pins the exact final mode
    staged
        .as_file()
        .set_permissions(Permissions::from_mode(mode))?;

    staged.write_all(contents)?;
    staged.as_file().sync_all()?;

    staged.persist(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.error.kind(),
            format!("Failed to rename into {}: {}", path.display(), e.error),
        ))
    })?;

    debug!("Atomically replaced {} (mode {:o})", path.display(), mode);
    Ok(())
}

/// Directories among `dir` and its ancestors that do not exist yet
///
/// Outermost first, so the list can be created or chowned in order.
pub fn missing_dirs(dir: &Path) -> Vec<PathBuf> {
    let mut missing: Vec<PathBuf> = dir
        .ancestors()
        .filter(|d| !d.as_os_str().is_empty())
        .take_while(|d| !d.exists())
        .map(Path::to_path_buf)
        .collect();
    missing.reverse();
    missing
}

/// Read and parse an env file
pub fn read_env_file(path: &Path) -> Result<EnvFile> {
    let text = fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    EnvFile::parse(&text)
}
