//! Namespace joining for executing commands in running containers.
//!
//! A joiner process is forked, opens a pid handle to the anchor, joins its
//! namespaces through it, and execs the command. The caller learns about
//! failures before the exec through the error channel; after a successful
//! exec it owns the joiner and reaps it for the exit code.

use std::convert::Infallible;
use std::ffi::{CString, OsStr};
use std::os::unix::ffi::OsStrExt;

use burrow_common::error::{BurrowError, Result};
use burrow_common::types::AnchorPid;
use burrow_core::channel::{self, ReportWriter, Step, StepContext, StepError};
use burrow_core::namespace::{self, pidfd::PidFd};
use burrow_core::process::Argv;
use nix::sys::wait::WaitStatus;
use nix::unistd::{ForkResult, Pid, fork};

use crate::process::reap;

/// A command running inside a container.
///
/// Dropping it without calling [`JoinedProcess::wait`] blocks until the
/// command exits, so the process is never left as a zombie.
#[derive(Debug)]
pub struct JoinedProcess {
    pid: Option<Pid>,
}

impl JoinedProcess {
    /// Pid of the joined command, as seen from the caller.
    #[must_use]
    pub fn pid(&self) -> Option<i32> {
        self.pid.map(Pid::as_raw)
    }

    /// Waits for the command and returns its exit code.
    ///
    /// # Errors
    ///
    /// - [`BurrowError::AbnormalTermination`] if the command was killed by a
    ///   signal.
    /// - [`BurrowError::Os`] if waiting fails.
    pub fn wait(mut self) -> Result<i32> {
        match self.pid.take() {
            Some(pid) => exit_code(reap(pid)?),
            None => Err(BurrowError::os("waitpid", libc::ECHILD)),
        }
    }
}

impl Drop for JoinedProcess {
    fn drop(&mut self) {
        if let Some(pid) = self.pid.take() {
            if let Err(error) = reap(pid) {
                tracing::warn!(pid = %pid, %error, "failed to reap joined process");
            }
        }
    }
}

/// Starts `command` inside the container anchored at `anchor`.
///
/// `command[0]` is resolved through `PATH`. The command inherits the
/// caller's standard descriptors. Returns once the command has been exec'd.
///
/// # Errors
///
/// - [`BurrowError::InvalidArgument`] if `command` is empty or an argument
///   contains NUL.
/// - [`BurrowError::Os`] if the pipe or fork cannot be allocated.
/// - [`BurrowError::Child`] if opening the anchor, joining its namespaces, or
///   exec'ing failed. The joiner is reaped first.
pub fn spawn_in_container<I, S>(anchor: AnchorPid, command: I) -> Result<JoinedProcess>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let argv = to_argv(command)?;
    let target = Pid::from_raw(anchor.as_raw());
    let (report_rx, report_tx) = channel::error_channel()?;

    // SAFETY: the child only runs `join_and_exec` and then execs or `_exit`s.
    let joiner = match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            drop(report_rx);
            let Err(error) = join_and_exec(&report_tx, target, &argv);
            report_tx.conclude(Err(error))
        }
        Ok(ForkResult::Parent { child }) => child,
        Err(errno) => return Err(BurrowError::os("fork", errno as i32)),
    };
    drop(report_tx);

    let joined = JoinedProcess { pid: Some(joiner) };
    match report_rx.receive()? {
        channel::HelperOutcome::Success => {
            tracing::info!(anchor = %anchor, pid = %joiner, cmd = ?argv, "exec into container");
            Ok(joined)
        }
        channel::HelperOutcome::Failure(message) => {
            let status = joined.wait();
            tracing::debug!(anchor = %anchor, ?status, "joiner reaped after failure");
            Err(BurrowError::Child { message })
        }
    }
}

/// Runs `command` inside the container and returns its exit code (0-255).
///
/// # Errors
///
/// Everything [`spawn_in_container`] and [`JoinedProcess::wait`] return.
pub fn exec_in_container<I, S>(anchor: AnchorPid, command: I) -> Result<i32>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    spawn_in_container(anchor, command)?.wait()
}

/// Runs `command` inside the container and requires a zero exit code.
///
/// # Errors
///
/// [`BurrowError::NonZeroExit`] for a non-zero code, plus everything
/// [`exec_in_container`] returns.
pub fn exec_checked<I, S>(anchor: AnchorPid, command: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    match exec_in_container(anchor, command)? {
        0 => Ok(()),
        code => Err(BurrowError::NonZeroExit { code }),
    }
}

/// Body of the joiner. Only returns on failure.
fn join_and_exec(
    report: &ReportWriter,
    anchor: Pid,
    argv: &Argv,
) -> std::result::Result<Infallible, StepError> {
    report.arm()?;
    let handle = PidFd::open(anchor).step(Step::PidfdOpen)?;
    namespace::join_namespaces(&handle).step(Step::Setns)?;
    drop(handle);
    argv.exec().step(Step::Exec)
}

fn to_argv<I, S>(command: I) -> Result<Argv>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let argv = command
        .into_iter()
        .map(|arg| {
            CString::new(arg.as_ref().as_bytes()).map_err(|e| BurrowError::InvalidArgument {
                message: format!("command argument contains NUL: {e}"),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    if argv.is_empty() {
        return Err(BurrowError::InvalidArgument {
            message: "command must have at least one element".into(),
        });
    }
    Ok(Argv::new(argv))
}

fn exit_code(status: WaitStatus) -> Result<i32> {
    match status {
        WaitStatus::Exited(_, code) => Ok(code),
        WaitStatus::Signaled(pid, signal, _) => Err(BurrowError::AbnormalTermination {
            pid: pid.as_raw(),
            signal: signal.as_str().to_owned(),
        }),
        other => Err(BurrowError::Os {
            operation: "waitpid",
            source: std::io::Error::other(format!("unexpected wait status {other:?}")),
        }),
    }
}
