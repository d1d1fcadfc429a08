//! Mount utilities for container filesystem setup.

use std::path::Path;

use nix::mount::{MsFlags, mount};

/// Makes the mount at `target` and everything below it private.
///
/// Mount events then no longer propagate back to the host's mount table.
///
/// # Errors
///
/// Returns the errno of the failed `mount(2)`.
pub fn make_rprivate(target: &Path) -> nix::Result<()> {
    mount(
        Some("none"),
        target,
        None::<&str>,
        MsFlags::MS_PRIVATE | MsFlags::MS_REC,
        None::<&str>,
    )
}

/// Mounts a fresh `proc` at `/proc` with `nosuid,noexec,nodev`.
///
/// Must run after the root switch so the instance reflects the new pid
/// namespace.
///
/// # Errors
///
/// Returns the errno of the failed `mount(2)`.
pub fn mount_proc() -> nix::Result<()> {
    mount(
        Some("proc"),
        "/proc",
        Some("proc"),
        MsFlags::MS_NOSUID | MsFlags::MS_NOEXEC | MsFlags::MS_NODEV,
        None::<&str>,
    )
}
