//! Container creation: the orchestrator and the namespace helper.
//!
//! ```text
//! orchestrator ──fork──▶ helper ──unshare──▶ fork ──▶ anchor (init bootstrap, exec sleep)
//!      ▲                   │                              │
//!      │   pid relay ◀─────┘                              │
//!      └────────────── error channel ◀────────────────────┘
//! ```
//!
//! The helper exists so the orchestrator never moves into the new
//! namespaces, and so the anchor is forked strictly after `unshare(2)`,
//! which makes it pid 1 of the new pid namespace.

use burrow_common::config::ContainerConfig;
use burrow_common::error::{BurrowError, Result};
use burrow_common::types::AnchorPid;
use burrow_core::channel::{self, PidSender, ReportWriter, Step, StepContext, StepError};
use burrow_core::filesystem::layout::BaseLayout;
use burrow_core::namespace;
use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork};

use crate::container::Container;
use crate::init::{self, InitPlan};

/// Creates a container and returns its handle.
///
/// Blocks until the anchor has exec'd the placeholder or a helper reported
/// a failure. The namespace helper is always reaped before returning.
///
/// # Errors
///
/// - [`BurrowError::InvalidArgument`] for a bad configuration, before
///   anything is touched.
/// - [`BurrowError::Io`] if the base layout cannot be created, before any
///   process is forked.
/// - [`BurrowError::Os`] if a pipe, fork, wait, or the pid relay fails in the
///   calling process.
/// - [`BurrowError::Child`] with the helper's report if a setup step failed.
pub fn create_container(config: &ContainerConfig) -> Result<Container> {
    config.validate()?;
    let layout = BaseLayout::ensure(&config.base_dir)?;
    let plan = InitPlan::new(&layout, &config.hostname)?;

    let (report_rx, report_tx) = channel::error_channel()?;
    let (pid_rx, pid_tx) = channel::pid_relay()?;

    // SAFETY: the child only runs `spawn_anchor` and then `_exit`s; it never
    // returns into the caller's code.
    let helper = match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            drop(report_rx);
            drop(pid_rx);
            let outcome = spawn_anchor(&report_tx, pid_tx, &plan);
            report_tx.conclude(outcome)
        }
        Ok(ForkResult::Parent { child }) => child,
        Err(errno) => return Err(BurrowError::os("fork", errno as i32)),
    };
    drop(report_tx);
    drop(pid_tx);

    let outcome = report_rx.receive();
    let status = reap(helper)?;
    tracing::debug!(helper = %helper, ?status, "namespace helper reaped");
    if let Err(err) = outcome?.into_result() {
        tracing::warn!(hostname = %config.hostname, error = %err, "container setup failed");
        return Err(err);
    }

    let anchor = AnchorPid::new(pid_rx.recv()?.as_raw())?;
    tracing::info!(
        pid = %anchor,
        hostname = %config.hostname,
        base_dir = %layout.base_dir().display(),
        "container created"
    );
    Ok(Container::new(
        anchor,
        layout.base_dir().to_path_buf(),
        config.hostname.clone(),
    ))
}

/// Body of the namespace helper.
///
/// Unshares the namespace set, forks the anchor, and relays its pid. The
/// anchor keeps a copy of `report` until its exec closes it.
fn spawn_anchor(
    report: &ReportWriter,
    relay: PidSender,
    plan: &InitPlan,
) -> std::result::Result<(), StepError> {
    report.arm()?;
    namespace::unshare_namespaces().step(Step::Unshare)?;

    // SAFETY: the anchor runs the bootstrap and either execs or `_exit`s.
    match unsafe { fork() }.step(Step::SecondFork)? {
        ForkResult::Child => {
            drop(relay);
            let Err(error) = report.arm().and_then(|()| init::bootstrap(plan));
            report.conclude(Err(error))
        }
        ForkResult::Parent { child } => relay.send(child).step(Step::RelayPid),
    }
}

/// Waits for `pid` to terminate, retrying on `EINTR`.
pub(crate) fn reap(pid: Pid) -> Result<WaitStatus> {
    loop {
        match waitpid(pid, None) {
            Err(Errno::EINTR) => {}
            Err(errno) => return Err(BurrowError::os("waitpid", errno as i32)),
            Ok(status) => return Ok(status),
        }
    }
}
