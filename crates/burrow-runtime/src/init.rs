//! Container init bootstrap.
//!
//! Runs once, in the anchor process, right after it was forked into fresh
//! namespaces. Turns an empty namespace set into a running container and
//! then execs the placeholder, which stays pid 1 of the container for its
//! whole life. The order of the steps matters: propagation is cut before
//! anything is mounted, and the old root is detached only after the pivot.

use std::convert::Infallible;
use std::ffi::{CString, OsString};
use std::path::{Path, PathBuf};

use burrow_common::constants::{
    CONTAINER_HOME, CONTAINER_PATH, PLACEHOLDER_ARG, PLACEHOLDER_PROGRAM,
};
use burrow_common::error::{BurrowError, Result};
use burrow_core::channel::{Step, StepContext, StepError};
use burrow_core::filesystem::layout::BaseLayout;
use burrow_core::filesystem::overlayfs::{OverlayConfig, mount_overlay};
use burrow_core::filesystem::{mount, pivot_root};
use burrow_core::namespace::uts;
use burrow_core::process::{self, Argv};

/// Everything the anchor needs, rendered before forking.
#[derive(Debug, Clone)]
pub struct InitPlan {
    new_root: PathBuf,
    overlay_options: String,
    hostname: OsString,
    env: Vec<(CString, CString)>,
    argv: Argv,
}

impl InitPlan {
    /// Prepares the bootstrap of a container rooted at `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`BurrowError::InvalidArgument`] if a value contains NUL.
    pub fn new(layout: &BaseLayout, hostname: &str) -> Result<Self> {
        let overlay = OverlayConfig::host_root(layout);
        Ok(Self {
            overlay_options: overlay.options(),
            new_root: overlay.merged_dir,
            hostname: OsString::from(hostname),
            env: vec![
                (c_string("HOME")?, c_string(CONTAINER_HOME)?),
                (c_string("PATH")?, c_string(CONTAINER_PATH)?),
            ],
            argv: Argv::new(vec![c_string(PLACEHOLDER_PROGRAM)?, c_string(PLACEHOLDER_ARG)?]),
        })
    }

    /// Mount point that becomes the container's `/`.
    #[must_use]
    pub fn new_root(&self) -> &Path {
        &self.new_root
    }

    /// Overlay mount data.
    #[must_use]
    pub fn overlay_options(&self) -> &str {
        &self.overlay_options
    }
}

/// Runs the bootstrap sequence and execs the placeholder.
///
/// Only returns on failure, with the first failing step.
///
/// # Errors
///
/// Returns the [`StepError`] of the first step that failed.
pub fn bootstrap(plan: &InitPlan) -> std::result::Result<Infallible, StepError> {
    process::close_stdio();

    mount::make_rprivate(Path::new("/")).step(Step::MountPrivateRoot)?;
    mount_overlay(&plan.new_root, &plan.overlay_options).step(Step::MountOverlay)?;
    mount::make_rprivate(&plan.new_root).step(Step::MountPrivateNewRoot)?;
    pivot_root::switch_root(&plan.new_root)?;
    mount::mount_proc().step(Step::MountProc)?;

    process::detach_session()?;
    process::ignore_child_signals()?;
    uts::set_hostname(&plan.hostname).step(Step::SetHostname)?;
    process::reset_environment(&plan.env)?;

    plan.argv.exec().step(Step::ExecPlaceholder)
}

fn c_string(value: &str) -> Result<CString> {
    CString::new(value).map_err(|e| BurrowError::InvalidArgument {
        message: format!("{value:?} contains NUL: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_targets_layout_rootfs() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = BaseLayout::ensure(tmp.path()).unwrap();
        let plan = InitPlan::new(&layout, "gs-3").unwrap();

        assert_eq!(plan.new_root(), layout.rootfs());
        assert!(plan.overlay_options().starts_with("lowerdir=/,upperdir="));
        assert_eq!(plan.hostname, OsString::from("gs-3"));
    }

    #[test]
    fn plan_env_is_minimal() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = BaseLayout::ensure(tmp.path()).unwrap();
        let plan = InitPlan::new(&layout, "n").unwrap();

        let keys: Vec<_> = plan.env.iter().map(|(k, _)| k.to_str().unwrap()).collect();
        assert_eq!(keys, ["HOME", "PATH"]);
        assert_eq!(plan.argv.program().unwrap().to_str().unwrap(), PLACEHOLDER_PROGRAM);
        assert_eq!(plan.argv.args().len(), 2);
    }
}
