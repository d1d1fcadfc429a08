//! `burrow exec` — Execute a command inside a running container.

use std::ffi::OsString;

use burrow_common::types::AnchorPid;
use clap::Args;

/// Arguments for the `exec` command.
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Anchor pid of the container.
    pub pid: AnchorPid,

    /// Command to execute.
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<OsString>,
}

/// Executes the `exec` command.
///
/// Joins the container's namespaces and runs the command with this
/// process's standard streams, then exits with the command's exit code.
///
/// # Errors
///
/// Returns an error if joining fails or the command is killed by a signal.
pub fn execute(args: ExecArgs) -> anyhow::Result<()> {
    let code = burrow_runtime::exec_in_container(args.pid, &args.command)?;
    tracing::debug!(pid = %args.pid, code, "command finished");
    std::process::exit(code);
}
