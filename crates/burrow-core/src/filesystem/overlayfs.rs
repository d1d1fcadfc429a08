//! `OverlayFS` root for a container.
//!
//! The host root is the single read-only lower layer; writes land in the
//! base directory's `upper`. No data is copied up front.

use std::path::{Path, PathBuf};

use nix::mount::{MsFlags, mount};

use super::layout::BaseLayout;

/// Configuration for an `OverlayFS` mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayConfig {
    /// Read-only lower layers (bottom to top).
    pub lower_dirs: Vec<PathBuf>,
    /// Writable upper layer directory.
    pub upper_dir: PathBuf,
    /// Work directory required by `OverlayFS`.
    pub work_dir: PathBuf,
    /// Final merged mount point.
    pub merged_dir: PathBuf,
}

impl OverlayConfig {
    /// Overlay of the host root onto the layout's `rootfs`.
    #[must_use]
    pub fn host_root(layout: &BaseLayout) -> Self {
        Self {
            lower_dirs: vec![PathBuf::from("/")],
            upper_dir: layout.upper(),
            work_dir: layout.work(),
            merged_dir: layout.rootfs(),
        }
    }

    /// Mount data string: `lowerdir=...,upperdir=...,workdir=...`.
    #[must_use]
    pub fn options(&self) -> String {
        let lowers = self
            .lower_dirs
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(":");
        format!(
            "lowerdir={},upperdir={},workdir={}",
            lowers,
            self.upper_dir.display(),
            self.work_dir.display()
        )
    }
}

/// Mounts an overlay at `merged_dir` with a precomputed option string.
///
/// Takes the options already rendered so nothing is allocated after a fork.
///
/// # Errors
///
/// Returns the errno of the failed `mount(2)`.
pub fn mount_overlay(merged_dir: &Path, options: &str) -> nix::Result<()> {
    mount(
        Some("overlay"),
        merged_dir,
        Some("overlay"),
        MsFlags::empty(),
        Some(options),
    )
}
