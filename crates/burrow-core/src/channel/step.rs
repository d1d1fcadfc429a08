//! Failures inside forked helpers.

use nix::errno::Errno;
use thiserror::Error;

/// A fallible operation performed inside a helper process.
///
/// The textual form of each step is the prefix of the error report sent to
/// the launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Reading the report descriptor's flags.
    GetFdFlags,
    /// Marking the report descriptor close-on-exec.
    SetFdFlags,
    /// Creating the container namespaces.
    Unshare,
    /// Forking the anchor process.
    SecondFork,
    /// Handing the anchor pid to the orchestrator.
    RelayPid,
    /// Making the host root mount private.
    MountPrivateRoot,
    /// Mounting the overlay root.
    MountOverlay,
    /// Making the new root mount private.
    MountPrivateNewRoot,
    /// Entering the new root directory.
    Chdir,
    /// Pivoting `.` onto itself.
    PivotRoot,
    /// Re-rooting at the pivoted mount.
    Chroot,
    /// Detaching the old root.
    DetachOldRoot,
    /// Mounting a fresh `/proc`.
    MountProc,
    /// Starting a new session.
    Setsid,
    /// Ignoring `SIGCHLD`.
    IgnoreSigchld,
    /// Setting the container hostname.
    SetHostname,
    /// Clearing the inherited environment.
    ClearEnv,
    /// Installing the container environment.
    PutEnv,
    /// Exec'ing the placeholder.
    ExecPlaceholder,
    /// Opening a pid handle to the anchor.
    PidfdOpen,
    /// Joining the anchor's namespaces.
    Setns,
    /// Exec'ing the requested command.
    Exec,
}

impl Step {
    /// Returns the report prefix naming this step.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetFdFlags => "failed to fcntl F_GETFD",
            Self::SetFdFlags => "failed to fcntl F_SETFD",
            Self::Unshare => "unshare failed",
            Self::SecondFork => "second fork failed",
            Self::RelayPid => "relay anchor pid failed",
            Self::MountPrivateRoot => "mount rprivate / failed",
            Self::MountOverlay => "mount overlay failed",
            Self::MountPrivateNewRoot => "mount rprivate newroot failed",
            Self::Chdir => "chdir failed",
            Self::PivotRoot => "pivot_root failed",
            Self::Chroot => "chroot failed",
            Self::DetachOldRoot => "umount2 failed",
            Self::MountProc => "mount /proc failed",
            Self::Setsid => "setsid failed",
            Self::IgnoreSigchld => "ignore SIGCLD failed",
            Self::SetHostname => "sethostname failed",
            Self::ClearEnv => "clearenv failed",
            Self::PutEnv => "putenv failed",
            Self::ExecPlaceholder => "execlp failed",
            Self::PidfdOpen => "failed to pidfd_open",
            Self::Setns => "failed to setns",
            Self::Exec => "failed to execvp",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first failure inside a helper: which step, and the captured errno.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{step}: {}", .errno.desc())]
pub struct StepError {
    /// The step that failed.
    pub step: Step,
    /// The error code captured right after the failing call.
    pub errno: Errno,
}

impl StepError {
    /// Creates a step error.
    #[must_use]
    pub const fn new(step: Step, errno: Errno) -> Self {
        Self { step, errno }
    }

    /// Exit status the helper terminates with.
    ///
    /// This is the captured errno, never zero so the launcher cannot mistake
    /// it for success.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self.errno as i32 {
            0 => 1,
            code => code,
        }
    }
}

/// Attaches a [`Step`] to a failed system call.
pub trait StepContext<T> {
    /// Converts the error into a [`StepError`] for `step`.
    ///
    /// # Errors
    ///
    /// Returns the wrapped error when `self` is an error.
    fn step(self, step: Step) -> Result<T, StepError>;
}

impl<T> StepContext<T> for nix::Result<T> {
    fn step(self, step: Step) -> Result<T, StepError> {
        self.map_err(|errno| StepError::new(step, errno))
    }
}

impl<T> StepContext<T> for std::io::Result<T> {
    fn step(self, step: Step) -> Result<T, StepError> {
        self.map_err(|e| StepError::new(step, Errno::from_raw(e.raw_os_error().unwrap_or(libc::EIO))))
    }
}
