use std::path::PathBuf;

use faed_dedup::DedupError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot back up {} to {}: {source}", from.display(), to.display())]
    Backup {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file was read but its table is not a valid register export.
    #[error("{}: {source}", path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: DedupError,
    },
}

impl IoError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write { path: path.into(), source }
    }

    pub(crate) fn csv_write(path: impl Into<PathBuf>, err: csv::Error) -> Self {
        Self::write(path, std::io::Error::from(err))
    }
}
