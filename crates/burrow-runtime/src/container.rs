//! Container handle and the explicit stop operation.
//!
//! A container has no state of its own beyond its anchor process: it is
//! running exactly as long as the anchor exists, and stopping it means
//! killing the anchor. Namespaces without other members are then reclaimed
//! by the kernel. Nothing is unmounted and the base directory stays on disk.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use burrow_common::config::ContainerConfig;
use burrow_common::constants::{STOP_GRACE_PERIOD, STOP_POLL_INTERVAL};
use burrow_common::error::{BurrowError, Result};
use burrow_common::types::{AnchorPid, ContainerState};
use burrow_core::namespace::{self, pidfd::PidFd};
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use crate::exec::{self, JoinedProcess};

/// A running container created by this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pid: AnchorPid,
    base_dir: PathBuf,
    hostname: String,
}

impl Container {
    /// Creates a container. See [`crate::process::create_container`].
    ///
    /// # Errors
    ///
    /// Returns an error if the layout, a helper, or the pid relay fails.
    pub fn create(config: &ContainerConfig) -> Result<Self> {
        crate::process::create_container(config)
    }

    pub(crate) const fn new(pid: AnchorPid, base_dir: PathBuf, hostname: String) -> Self {
        Self {
            pid,
            base_dir,
            hostname,
        }
    }

    /// Pid of the anchor process, the container's only identifier.
    #[must_use]
    pub const fn pid(&self) -> AnchorPid {
        self.pid
    }

    /// Canonical base directory holding `rootfs`, `upper`, and `work`.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Hostname set inside the container.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Path of one of the container's namespaces under `/proc`.
    ///
    /// `name` is one of `mnt`, `pid`, `net`, `ipc`, `uts`.
    #[must_use]
    pub fn namespace_path(&self, name: &str) -> Option<PathBuf> {
        namespace::namespace_path(Pid::from_raw(self.pid.as_raw()), name)
    }

    /// Runs a command inside the container and returns its exit code.
    ///
    /// # Errors
    ///
    /// See [`exec::exec_in_container`].
    pub fn exec<I, S>(&self, command: I) -> Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        exec::exec_in_container(self.pid, command)
    }

    /// Starts a command inside the container without waiting for it.
    ///
    /// # Errors
    ///
    /// See [`exec::spawn_in_container`].
    pub fn spawn<I, S>(&self, command: I) -> Result<JoinedProcess>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        exec::spawn_in_container(self.pid, command)
    }

    /// Current state of the anchor.
    #[must_use]
    pub fn state(&self) -> ContainerState {
        state(self.pid)
    }

    /// Stops the container. See [`stop`].
    ///
    /// # Errors
    ///
    /// See [`stop`].
    pub fn stop(self) -> Result<()> {
        stop(self.pid)
    }
}

/// Returns whether the anchor `pid` is alive.
///
/// A zombie counts as stopped: it only waits for its reaper.
#[must_use]
pub fn state(pid: AnchorPid) -> ContainerState {
    let exists = match kill(Pid::from_raw(pid.as_raw()), None) {
        Ok(()) | Err(Errno::EPERM) => true,
        Err(_) => false,
    };
    if exists && !is_zombie(pid) {
        ContainerState::Running
    } else {
        ContainerState::Stopped
    }
}

/// Stops the container anchored at `pid`.
///
/// The anchor is pid 1 of its pid namespace, which ignores signals it has
/// no handler for unless they are `SIGKILL`, so it is killed outright. The
/// signal goes through a pid handle so a recycled pid is never hit.
/// Returns once the anchor is gone.
///
/// # Errors
///
/// - [`BurrowError::NotFound`] if no such process exists.
/// - [`BurrowError::Os`] if the handle cannot be opened or signaled.
/// - [`BurrowError::StopTimeout`] if the anchor is still alive after the
///   grace period.
pub fn stop(pid: AnchorPid) -> Result<()> {
    let handle = PidFd::open(Pid::from_raw(pid.as_raw())).map_err(|errno| match errno {
        Errno::ESRCH => BurrowError::NotFound {
            kind: "container",
            id: pid.to_string(),
        },
        errno => BurrowError::os("pidfd_open", errno as i32),
    })?;

    match handle.send_signal(Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(errno) => return Err(BurrowError::os("pidfd_send_signal", errno as i32)),
    }

    let deadline = Instant::now() + STOP_GRACE_PERIOD;
    while state(pid) == ContainerState::Running {
        if Instant::now() >= deadline {
            return Err(BurrowError::StopTimeout { pid: pid.as_raw() });
        }
        std::thread::sleep(STOP_POLL_INTERVAL);
    }
    tracing::info!(pid = %pid, "container stopped");
    Ok(())
}

/// Reads the state letter from `/proc/<pid>/stat`.
fn is_zombie(pid: AnchorPid) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // The command name is parenthesized and may itself contain ')'.
    stat.rfind(')')
        .and_then(|end| stat[end + 1..].split_whitespace().next())
        .is_some_and(|state| matches!(state, "Z" | "X"))
}

#[cfg(test)]
mod tests {
    use nix::sys::wait::waitpid;
    use nix::unistd::{ForkResult, fork};

    use super::*;

    fn anchor(pid: Pid) -> AnchorPid {
        AnchorPid::new(pid.as_raw()).unwrap()
    }

    #[test]
    fn own_process_is_running() {
        assert_eq!(state(anchor(Pid::this())), ContainerState::Running);
    }

    #[test]
    fn zombie_counts_as_stopped() {
        // SAFETY: the child exits immediately.
        match unsafe { fork() }.unwrap() {
            ForkResult::Child => unsafe { libc::_exit(0) },
            ForkResult::Parent { child } => {
                let deadline = Instant::now() + STOP_GRACE_PERIOD;
                while !is_zombie(anchor(child)) && Instant::now() < deadline {
                    std::thread::sleep(STOP_POLL_INTERVAL);
                }
                assert_eq!(state(anchor(child)), ContainerState::Stopped);
                let _ = waitpid(child, None).unwrap();
            }
        }
    }

    #[test]
    fn stop_kills_the_anchor() {
        // SAFETY: the child only pauses until it is killed.
        match unsafe { fork() }.unwrap() {
            ForkResult::Child => loop {
                nix::unistd::pause();
            },
            ForkResult::Parent { child } => {
                stop(anchor(child)).unwrap();
                assert_eq!(state(anchor(child)), ContainerState::Stopped);
                let _ = waitpid(child, None).unwrap();
            }
        }
    }

    #[test]
    fn stop_missing_anchor_is_not_found() {
        let err = stop(AnchorPid::new(i32::MAX).unwrap()).unwrap_err();
        assert!(matches!(err, BurrowError::NotFound { kind: "container", .. }));
    }

    #[test]
    fn namespace_path_uses_anchor_pid() {
        let c = Container::new(AnchorPid::new(77).unwrap(), "/b".into(), "h".into());
        assert_eq!(c.namespace_path("uts"), Some(PathBuf::from("/proc/77/ns/uts")));
        assert_eq!(c.hostname(), "h");
    }
}
