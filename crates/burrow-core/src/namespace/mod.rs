//! Linux namespace management for container isolation.
//!
//! Every container uses the same fixed namespace set, both when it is
//! created (`unshare(2)`) and when a command joins it (`setns(2)`).

pub mod pidfd;
pub mod uts;

use std::path::PathBuf;

use nix::sched::{CloneFlags, setns, unshare};
use nix::unistd::Pid;

use self::pidfd::PidFd;

/// The namespaces every container gets: mount, pid, network, IPC, and UTS.
///
/// Not configurable. User and cgroup namespaces are deliberately absent.
pub const NAMESPACES: CloneFlags = CloneFlags::from_bits_truncate(
    libc::CLONE_NEWNS | libc::CLONE_NEWPID | libc::CLONE_NEWNET | libc::CLONE_NEWIPC | libc::CLONE_NEWUTS,
);

/// Names of the entries under `/proc/<pid>/ns/` for [`NAMESPACES`].
pub const NAMESPACE_NAMES: [&str; 5] = ["mnt", "pid", "net", "ipc", "uts"];

/// Moves the calling process into fresh namespaces.
///
/// The calling process itself keeps its pid namespace view; only children
/// forked afterwards live entirely inside the new set.
///
/// # Errors
///
/// Returns the errno of the failed `unshare(2)`.
pub fn unshare_namespaces() -> nix::Result<()> {
    unshare(NAMESPACES)
}

/// Joins every namespace of the process behind `target`.
///
/// # Errors
///
/// Returns the errno of the failed `setns(2)`.
pub fn join_namespaces(target: &PidFd) -> nix::Result<()> {
    setns(target, NAMESPACES)
}

/// Returns `/proc/<pid>/ns/<name>` for a namespace of `pid`.
///
/// Returns `None` if `name` is not part of [`NAMESPACES`].
#[must_use]
pub fn namespace_path(pid: Pid, name: &str) -> Option<PathBuf> {
    NAMESPACE_NAMES
        .contains(&name)
        .then(|| PathBuf::from(format!("/proc/{pid}/ns/{name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_set_is_exactly_five() {
        assert!(NAMESPACES.contains(CloneFlags::CLONE_NEWNS));
        assert!(NAMESPACES.contains(CloneFlags::CLONE_NEWPID));
        assert!(NAMESPACES.contains(CloneFlags::CLONE_NEWNET));
        assert!(NAMESPACES.contains(CloneFlags::CLONE_NEWIPC));
        assert!(NAMESPACES.contains(CloneFlags::CLONE_NEWUTS));
        assert!(!NAMESPACES.contains(CloneFlags::CLONE_NEWUSER));
        assert!(!NAMESPACES.contains(CloneFlags::CLONE_NEWCGROUP));
        assert_eq!(NAMESPACES.bits().count_ones(), 5);
    }

    #[test]
    fn namespace_path_points_into_proc() {
        let pid = Pid::from_raw(1234);
        assert_eq!(
            namespace_path(pid, "net"),
            Some(PathBuf::from("/proc/1234/ns/net"))
        );
        assert_eq!(namespace_path(pid, "user"), None);
    }

    #[test]
    fn own_namespace_entries_exist() {
        for name in NAMESPACE_NAMES {
            let path = namespace_path(Pid::this(), name).unwrap();
            assert!(path.exists(), "{} missing", path.display());
        }
    }
}
