//! `burrow stop` — Stop a container.

use burrow_common::types::AnchorPid;
use clap::Args;

/// Arguments for the `stop` command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Anchor pids of the containers to stop.
    #[arg(required = true)]
    pub pids: Vec<AnchorPid>,
}

/// Executes the `stop` command.
///
/// The base directories are left on disk.
///
/// # Errors
///
/// Returns the first error; the remaining containers are still attempted.
pub fn execute(args: StopArgs) -> anyhow::Result<()> {
    let mut first_error = None;
    for pid in args.pids {
        if let Err(err) = burrow_runtime::container::stop(pid) {
            tracing::error!(pid = %pid, error = %err, "stop failed");
            let _ = first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), |err| Err(err.into()))
}
