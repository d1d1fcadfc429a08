//! Domain primitive types used across the burrow workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BurrowError, Result};

/// Pid of a container's anchor process.
///
/// This is the only handle a container has: the container lives exactly as
/// long as this process does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct AnchorPid(i32);

impl AnchorPid {
    /// Wraps a raw pid.
    ///
    /// # Errors
    ///
    /// Returns an error if `pid` is not a positive process id.
    pub fn new(pid: i32) -> Result<Self> {
        if pid <= 0 {
            return Err(BurrowError::InvalidArgument {
                message: format!("anchor pid must be positive, got {pid}"),
            });
        }
        Ok(Self(pid))
    }

    /// Returns the raw pid value.
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for AnchorPid {
    type Error = BurrowError;

    fn try_from(pid: i32) -> Result<Self> {
        Self::new(pid)
    }
}

impl From<AnchorPid> for i32 {
    fn from(pid: AnchorPid) -> Self {
        pid.0
    }
}

impl FromStr for AnchorPid {
    type Err = BurrowError;

    fn from_str(s: &str) -> Result<Self> {
        let pid = s.trim().parse::<i32>().map_err(|e| BurrowError::InvalidArgument {
            message: format!("invalid pid {s:?}: {e}"),
        })?;
        Self::new(pid)
    }
}

impl fmt::Display for AnchorPid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observed lifecycle state of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    /// The anchor process is alive.
    Running,
    /// The anchor process is gone (or a zombie awaiting its reaper).
    Stopped,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}
