//! UTS namespace configuration.

use std::ffi::OsStr;

/// Sets the hostname inside the current UTS namespace.
///
/// # Errors
///
/// Returns the errno of the failed `sethostname(2)`.
pub fn set_hostname(hostname: &OsStr) -> nix::Result<()> {
    nix::unistd::sethostname(hostname)
}
