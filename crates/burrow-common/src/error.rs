//! Unified error types for the burrow workspace.
//!
//! Variants follow the failure classes a caller has to tell apart: bad
//! input, host-side OS failures, failures reported by a forked helper,
//! and commands that did not exit normally.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum BurrowError {
    /// The caller supplied an argument that can never succeed.
    ///
    /// Detected before any process is spawned.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// An I/O operation on the base directory layout failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A host-side system call failed in the calling process.
    ///
    /// `source.raw_os_error()` carries the platform error code.
    #[error("{operation} failed: {source}")]
    Os {
        /// Name of the failed operation.
        operation: &'static str,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// A forked helper reported a setup failure over the error channel.
    #[error("child process error: {message}")]
    Child {
        /// The report written by the helper: failed step and error description.
        message: String,
    },

    /// A joined command was terminated by a signal instead of exiting.
    #[error("child {pid} did not exit normally (signal {signal})")]
    AbnormalTermination {
        /// Pid of the joined process.
        pid: i32,
        /// Name of the terminating signal.
        signal: String,
    },

    /// A checked command exited with a non-zero code.
    #[error("command exited with code {code}")]
    NonZeroExit {
        /// The command's exit code.
        code: i32,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// The anchor process survived the stop grace period.
    #[error("container anchor {pid} still running after stop")]
    StopTimeout {
        /// Pid of the anchor process.
        pid: i32,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl BurrowError {
    /// Builds a [`BurrowError::Os`] from a raw platform error code.
    #[must_use]
    pub fn os(operation: &'static str, errno: i32) -> Self {
        Self::Os {
            operation,
            source: std::io::Error::from_raw_os_error(errno),
        }
    }

    /// Returns the platform error code for host-side failures.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Io { source, .. } | Self::Os { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }

    /// Returns whether this error came from a forked helper or a joined command.
    #[must_use]
    pub const fn is_child_error(&self) -> bool {
        matches!(self, Self::Child { .. } | Self::AbnormalTermination { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, BurrowError>;

#[cfg(test)]
mod tests {
    use super::*;

    // Same value on every Linux architecture.
    const EMFILE: i32 = 24;

    #[test]
    fn os_error_keeps_platform_code() {
        let err = BurrowError::os("pipe", EMFILE);
        assert_eq!(err.raw_os_error(), Some(EMFILE));
        assert!(err.to_string().starts_with("pipe failed: "));
        assert!(!err.is_child_error());
    }

    #[test]
    fn child_error_displays_report() {
        let err = BurrowError::Child {
            message: "mount overlay failed: Invalid argument".into(),
        };
        assert_eq!(
            err.to_string(),
            "child process error: mount overlay failed: Invalid argument"
        );
        assert!(err.is_child_error());
        assert_eq!(err.raw_os_error(), None);
    }

    #[test]
    fn abnormal_termination_is_distinct_from_exit_code() {
        let err = BurrowError::AbnormalTermination {
            pid: 42,
            signal: "SIGKILL".into(),
        };
        assert!(err.is_child_error());
        assert!(err.to_string().contains("did not exit normally"));
    }
}
