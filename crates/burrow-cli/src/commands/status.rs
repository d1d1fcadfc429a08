//! `burrow status` — Show whether a container is running.

use burrow_common::types::AnchorPid;
use clap::Args;

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Anchor pid of the container.
    pub pid: AnchorPid,
}

/// Executes the `status` command.
///
/// # Errors
///
/// Never fails; a missing anchor is reported as `stopped`.
pub fn execute(args: StatusArgs) -> anyhow::Result<()> {
    let state = burrow_runtime::container::state(args.pid);
    #[allow(clippy::print_stdout)]
    {
        println!("{state}");
    }
    Ok(())
}
