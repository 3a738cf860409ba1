use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::IoError;

/// Copy the input file to `<backup_dir>/backup_<YYYYMMDD_HHMMSS>_<name>`.
pub fn backup_input(
    input: &Path,
    backup_dir: &Path,
    stamp: NaiveDateTime,
) -> Result<PathBuf, IoError> {
    std::fs::create_dir_all(backup_dir).map_err(|source| IoError::CreateDir {
        path: backup_dir.to_path_buf(),
        source,
    })?;

    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input.csv".to_string());
    let target = backup_dir.join(format!("backup_{}_{name}", stamp.format("%Y%m%d_%H%M%S")));

    std::fs::copy(input, &target).map_err(|source| IoError::Backup {
        from: input.to_path_buf(),
        to: target.clone(),
        source,
    })?;

    log::info!("input backed up to {}", target.display());
    Ok(target)
}
