//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Default base directory for burrow data when `$HOME` is unusable.
pub const SYSTEM_DATA_DIR: &str = "/var/lib/burrow";

/// Returns the data directory, preferring `$HOME/.burrow` and falling back
/// to `/var/lib/burrow`.
fn resolve_data_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        let user_dir = PathBuf::from(home).join(".burrow");
        if std::fs::create_dir_all(&user_dir).is_ok() {
            return user_dir;
        }
    }
    PathBuf::from(SYSTEM_DATA_DIR)
}

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved data directory for this session.
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(resolve_data_dir)
}

/// Returns the directory holding per-container base directories.
pub fn containers_dir() -> PathBuf {
    data_dir().join(CONTAINERS_DIR)
}

/// Subdirectory of the data directory holding one base directory per container.
pub const CONTAINERS_DIR: &str = "containers";

/// Overlay mountpoint and pivot target inside a base directory.
pub const ROOTFS_DIR: &str = "rootfs";
/// Overlay upper layer inside a base directory.
pub const UPPER_DIR: &str = "upper";
/// Overlay work directory inside a base directory.
pub const WORK_DIR: &str = "work";

/// Permission bits for every layout directory (`rwxr-xr-x`).
pub const LAYOUT_DIR_MODE: u32 = 0o755;

/// `HOME` inside a container.
pub const CONTAINER_HOME: &str = "/root";
/// `PATH` inside a container.
pub const CONTAINER_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Program the anchor process becomes once the container is set up.
pub const PLACEHOLDER_PROGRAM: &str = "sleep";
/// Argument keeping the placeholder alive forever.
pub const PLACEHOLDER_ARG: &str = "infinity";

/// Upper bound on the size of an error report, in bytes.
pub const MAX_REPORT_LEN: usize = 255;

/// Maximum hostname length accepted by `sethostname(2)`.
pub const HOST_NAME_MAX: usize = 64;

/// How long `stop` waits for the anchor to disappear.
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(5);
/// Poll interval while waiting for the anchor to disappear.
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);
