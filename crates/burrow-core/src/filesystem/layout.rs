//! The base directory layout of a container.
//!
//! ```text
//! <base>/
//!   rootfs/   overlay mountpoint and pivot target
//!   upper/    overlay upper layer (container-private writes)
//!   work/     overlay work directory
//! ```
//!
//! Creation is idempotent: existing entries are reused as they are.

use std::fs::{DirBuilder, Permissions};
use std::io::ErrorKind;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};

use burrow_common::config::validate_base_dir;
use burrow_common::constants::{LAYOUT_DIR_MODE, ROOTFS_DIR, UPPER_DIR, WORK_DIR};
use burrow_common::error::{BurrowError, Result};

/// A base directory whose three subdirectories are known to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseLayout {
    base_dir: PathBuf,
}

impl BaseLayout {
    /// Creates whatever part of the layout is missing.
    ///
    /// The base directory itself is created non-recursively: its parent must
    /// already exist. New directories get mode `0755` regardless of umask.
    /// The stored base path is canonical so overlay options are absolute.
    /// It is resolved and checked before anything is created.
    ///
    /// # Errors
    ///
    /// - [`BurrowError::InvalidArgument`] if the resolved path contains an
    ///   overlay option separator.
    /// - [`BurrowError::Io`] naming the path that could not be created or
    ///   resolved.
    pub fn ensure(base_dir: &Path) -> Result<Self> {
        let base_dir = resolve(base_dir)?;
        validate_base_dir(&base_dir)?;
        ensure_dir(&base_dir)?;
        for name in [UPPER_DIR, WORK_DIR, ROOTFS_DIR] {
            ensure_dir(&base_dir.join(name))?;
        }
        tracing::debug!(base_dir = %base_dir.display(), "base layout ready");
        Ok(Self { base_dir })
    }

    /// Canonical base directory.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Overlay mountpoint, the container's future root.
    #[must_use]
    pub fn rootfs(&self) -> PathBuf {
        self.base_dir.join(ROOTFS_DIR)
    }

    /// Overlay upper layer.
    #[must_use]
    pub fn upper(&self) -> PathBuf {
        self.base_dir.join(UPPER_DIR)
    }

    /// Overlay work directory.
    #[must_use]
    pub fn work(&self) -> PathBuf {
        self.base_dir.join(WORK_DIR)
    }
}

/// Canonicalizes `base_dir`, or its parent when it does not exist yet.
fn resolve(base_dir: &Path) -> Result<PathBuf> {
    let io_err = |source| BurrowError::Io {
        path: base_dir.to_path_buf(),
        source,
    };

    match base_dir.canonicalize() {
        Ok(path) => Ok(path),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let (Some(parent), Some(name)) = (base_dir.parent(), base_dir.file_name()) else {
                return Err(io_err(e));
            };
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            Ok(parent.canonicalize().map_err(io_err)?.join(name))
        }
        Err(e) => Err(io_err(e)),
    }
}

/// Creates `path` with the layout mode unless something already exists there.
fn ensure_dir(path: &Path) -> Result<()> {
    let io_err = |source| BurrowError::Io {
        path: path.to_path_buf(),
        source,
    };

    if path.try_exists().map_err(io_err)? {
        return Ok(());
    }
    match DirBuilder::new().mode(LAYOUT_DIR_MODE).create(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(()),
        Err(e) => return Err(io_err(e)),
    }
    std::fs::set_permissions(path, Permissions::from_mode(LAYOUT_DIR_MODE)).map_err(io_err)?;
    tracing::debug!(path = %path.display(), "created layout directory");
    Ok(())
}
