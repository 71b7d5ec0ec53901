use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("invalid drive specification: must have path and permissions suffix (:rw or :ro)")]
    NoSuffix,

    #[error("invalid drive specification: must have a path before the permissions suffix")]
    NoPath,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NIC config wasn't of the form DEVICE/MACADDR")]
    NicConfigFormat,

    #[error("unable to parse vsock devices, must be of the form PATH:CID")]
    MalformedVsockSpec,

    #[error("unable to parse vsock CID as a 32-bit unsigned integer")]
    InvalidVsockCid,

    #[error("vmm-log-fifo and firecracker-log cannot be used together")]
    ConflictingLogOptions,

    #[error("failed to create fifo log file: {0}")]
    FifoLogFile(#[source] std::io::Error),

    #[error("failed to create fifo at {}: {source}", path.display())]
    FifoCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create temporary fifo directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("invalid metadata, unable to parse as json: {0}")]
    InvalidMetadata(#[source] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Configuration file {}: {message}", path.display())]
    ConfigFile { path: PathBuf, message: String },
}

impl LaunchError {
    /// Whether this error is an OS "no such file or directory" failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LaunchError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type LaunchResult<T> = std::result::Result<T, LaunchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let missing = LaunchError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(missing.is_not_found());

        let denied = LaunchError::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(!denied.is_not_found());
        assert!(!LaunchError::NoSuffix.is_not_found());
    }

    #[test]
    fn test_fifo_log_file_prefix() {
        let err = LaunchError::FifoLogFile(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(err.to_string().starts_with("failed to create fifo log file"));
    }
}
