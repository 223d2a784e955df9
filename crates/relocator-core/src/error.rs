use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Path already exists: {}", .0.display())]
    Conflict(PathBuf),

    #[error("Operation already in progress for {}", .0.display())]
    Busy(PathBuf),

    #[error("Access denied: {}", .0.display())]
    AccessDenied(PathBuf),

    #[error(
        "Junction {} no longer matches backup {}",
        junction.display(),
        backup.display()
    )]
    StructuralMismatch { junction: PathBuf, backup: PathBuf },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Scan generation {generation} was superseded")]
    Superseded { generation: u64 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Preferences error: {0}")]
    Preferences(String),
}

impl Error {
    /// Classify an io error raised while operating on `path`.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Error::AccessDenied(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => Error::Conflict(path.to_path_buf()),
            _ => Error::Io(io::Error::new(
                err.kind(),
                format!("{}: {}", path.display(), err),
            )),
        }
    }
}

/// Attach the path an io operation was working on.
pub(crate) trait IoResultExt<T> {
    fn at(self, path: &Path) -> Result<T, Error>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T, Error> {
        self.map_err(|err| Error::from_io(err, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_map_to_taxonomy() {
        let path = Path::new("/data/games");
        let err = Error::from_io(io::Error::from(io::ErrorKind::PermissionDenied), path);
        assert!(matches!(err, Error::AccessDenied(p) if p == path));

        let err = Error::from_io(io::Error::from(io::ErrorKind::NotFound), path);
        assert!(matches!(err, Error::NotFound(_)));

        let err = Error::from_io(io::Error::from(io::ErrorKind::AlreadyExists), path);
        assert!(matches!(err, Error::Conflict(_)));

        let err = Error::from_io(io::Error::new(io::ErrorKind::Other, "boom"), path);
        assert!(matches!(err, Error::Io(_)));
    }
}
