//! Container configuration model.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{CONTAINERS_DIR, HOST_NAME_MAX};
use crate::error::{BurrowError, Result};

/// Everything needed to create a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Base directory holding `rootfs`, `upper`, and `work`.
    pub base_dir: PathBuf,
    /// Hostname set inside the container's UTS namespace.
    pub hostname: String,
}

impl ContainerConfig {
    /// Creates a configuration from an explicit base directory.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, hostname: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            hostname: hostname.into(),
        }
    }

    /// Creates a configuration whose base directory is
    /// `<data_dir>/containers/<hostname>`.
    #[must_use]
    pub fn under(data_dir: &Path, hostname: impl Into<String>) -> Self {
        let hostname = hostname.into();
        Self {
            base_dir: data_dir.join(CONTAINERS_DIR).join(&hostname),
            hostname,
        }
    }

    /// Loads a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not describe a configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks the configuration before any directory or process is touched.
    ///
    /// # Errors
    ///
    /// Returns [`BurrowError::InvalidArgument`] when the hostname is empty,
    /// too long or contains NUL, or when the base directory cannot be
    /// expressed in overlay mount options.
    pub fn validate(&self) -> Result<()> {
        validate_hostname(&self.hostname)?;
        validate_base_dir(&self.base_dir)
    }
}

/// Checks that `hostname` is acceptable to `sethostname(2)`.
///
/// # Errors
///
/// Returns [`BurrowError::InvalidArgument`] describing the problem.
pub fn validate_hostname(hostname: &str) -> Result<()> {
    if hostname.is_empty() {
        return Err(invalid("hostname must not be empty"));
    }
    if hostname.len() > HOST_NAME_MAX {
        return Err(invalid(format!(
            "hostname is {} bytes, at most {HOST_NAME_MAX} allowed",
            hostname.len()
        )));
    }
    if hostname.contains('\0') {
        return Err(invalid("hostname must not contain NUL"));
    }
    Ok(())
}

/// Checks that `base_dir` can be spelled inside overlay mount options.
///
/// Call it again on the resolved path: a symlink anywhere along the way can
/// introduce a separator.
///
/// # Errors
///
/// Returns [`BurrowError::InvalidArgument`] for an empty path or one
/// containing NUL, `,` or `:`.
pub fn validate_base_dir(base_dir: &Path) -> Result<()> {
    let text = base_dir.as_os_str().as_encoded_bytes();
    if text.is_empty() {
        return Err(invalid("base directory must not be empty"));
    }
    if let Some(c) = text.iter().find(|&&b| matches!(b, b'\0' | b',' | b':')) {
        return Err(invalid(format!(
            "base directory {} contains {:?}, which overlay options cannot express",
            base_dir.display(),
            char::from(*c)
        )));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> BurrowError {
    BurrowError::InvalidArgument {
        message: message.into(),
    }
}
