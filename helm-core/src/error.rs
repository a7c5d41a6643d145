/// Structured error types for helm-core.
///
/// Uses `thiserror` so the CLI can match on failure kinds (a failed kubectl
/// call still carries the stdout it produced).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for helm-core operations
#[derive(Error, Debug)]
pub enum DmError {
    /// The kubectl program could not be started at all
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: io::Error,
    },

    /// kubectl ran but exited non-zero
    #[error("`{command}` exited with status {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    /// I/O while talking to a running child process
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Manifest could not be rendered
    #[error("failed to render manifest: {reason}")]
    Manifest { reason: String },

    /// Settings file could not be read or parsed
    #[error("configuration error in {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },
}

/// Result type alias for helm-core operations
pub type Result<T> = std::result::Result<T, DmError>;

impl DmError {
    /// Create a spawn error for the given command line
    pub fn spawn(command: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    /// Create a manifest error
    pub fn manifest(reason: impl Into<String>) -> Self {
        Self::Manifest {
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Stdout a failed command produced before failing (empty if none)
    pub fn partial_output(&self) -> &str {
        match self {
            Self::CommandFailed { stdout, .. } => stdout,
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DmError::CommandFailed {
            command: "kubectl delete namespace dm".to_string(),
            code: 1,
            stdout: String::new(),
            stderr: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "`kubectl delete namespace dm` exited with status 1: connection refused"
        );

        let err = DmError::config("/tmp/config.toml", "expected a table");
        assert!(err.to_string().contains("/tmp/config.toml"));
    }

    #[test]
    fn test_partial_output() {
        let err = DmError::CommandFailed {
            command: "kubectl get pods".to_string(),
            code: 1,
            stdout: "partial".to_string(),
            stderr: String::new(),
        };
        assert_eq!(err.partial_output(), "partial");

        let err = DmError::manifest("bad yaml");
        assert_eq!(err.partial_output(), "");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        let err: DmError = io_err.into();

        assert!(matches!(err, DmError::Io { .. }));
    }
}
