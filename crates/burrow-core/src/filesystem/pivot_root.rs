//! Root filesystem switch via `pivot_root(2)`.
//!
//! Uses the "pivot `.` onto itself" idiom: after `pivot_root(".", ".")` the
//! old root is stacked on top of the new one at `/`, `chroot(".")` moves the
//! process onto the new root, and a lazy unmount detaches the old one. No
//! `put_old` directory is needed inside the new root.

use std::path::Path;

use nix::mount::{MntFlags, umount2};
use nix::unistd::{chdir, chroot, pivot_root};

use crate::channel::{Step, StepContext, StepError};

/// Makes `new_root` the root of the calling process's mount namespace and
/// detaches the old root.
///
/// `new_root` must be a mount point in a private mount tree.
///
/// # Errors
///
/// Returns the first failing step: [`Step::Chdir`], [`Step::PivotRoot`],
/// [`Step::Chroot`], or [`Step::DetachOldRoot`].
pub fn switch_root(new_root: &Path) -> Result<(), StepError> {
    chdir(new_root).step(Step::Chdir)?;
    pivot_root(".", ".").step(Step::PivotRoot)?;
    chroot(".").step(Step::Chroot)?;
    umount2(".", MntFlags::MNT_DETACH).step(Step::DetachOldRoot)?;
    Ok(())
}
