//! Per-process setup performed by a helper before it execs.
//!
//! These run between `fork(2)` and `execve(2)`, so they only make system
//! calls and never log.

use std::convert::Infallible;
use std::ffi::{CStr, CString};
use std::fmt;

use nix::errno::Errno;
use nix::sys::signal::{SigHandler, Signal, signal};

use crate::channel::{Step, StepContext, StepError};

/// An argument vector rendered for `execvp(3)` ahead of a fork.
///
/// Holds the null-terminated pointer array next to the strings it points
/// into, so [`Argv::exec`] makes no Rust allocation.
pub struct Argv {
    args: Vec<CString>,
    ptrs: Vec<*const libc::c_char>,
}

impl Argv {
    /// Renders `args`. `args[0]` is the program, resolved through `PATH`.
    #[must_use]
    pub fn new(args: Vec<CString>) -> Self {
        let ptrs = args
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(std::ptr::null()))
            .collect();
        Self { args, ptrs }
    }

    /// The program name, if any.
    #[must_use]
    pub fn program(&self) -> Option<&CStr> {
        self.args.first().map(CString::as_c_str)
    }

    /// The arguments, program first.
    #[must_use]
    pub fn args(&self) -> &[CString] {
        &self.args
    }

    /// Replaces the process image. Only returns on failure.
    ///
    /// # Errors
    ///
    /// Returns `EINVAL` for an empty vector, otherwise the errno of the
    /// failed `execvp(3)`.
    pub fn exec(&self) -> nix::Result<Infallible> {
        let Some(program) = self.program() else {
            return Err(Errno::EINVAL);
        };
        // SAFETY: `ptrs` is null-terminated and every entry points into a
        // `CString` owned by `self.args`, which outlives the call.
        let _ = unsafe { libc::execvp(program.as_ptr(), self.ptrs.as_ptr()) };
        Err(Errno::last())
    }
}

impl Clone for Argv {
    fn clone(&self) -> Self {
        Self::new(self.args.clone())
    }
}

impl fmt::Debug for Argv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.args).finish()
    }
}

/// Closes standard input, output, and error.
///
/// A container anchor has no console. Descriptors that are already closed
/// are ignored.
pub fn close_stdio() {
    for fd in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        // SAFETY: closing a standard descriptor owned by this process; no
        // Rust object in the helper refers to it afterwards.
        let _ = unsafe { libc::close(fd) };
    }
}

/// Starts a new session, detaching from any controlling terminal.
///
/// # Errors
///
/// Returns a [`Step::Setsid`] error if `setsid(2)` fails.
pub fn detach_session() -> Result<(), StepError> {
    nix::unistd::setsid().step(Step::Setsid).map(drop)
}

/// Sets `SIGCHLD` to `SIG_IGN` so exited children are reaped by the kernel.
///
/// # Errors
///
/// Returns a [`Step::IgnoreSigchld`] error if `signal(2)` fails.
pub fn ignore_child_signals() -> Result<(), StepError> {
    // SAFETY: SIG_IGN installs no Rust handler.
    unsafe { signal(Signal::SIGCHLD, SigHandler::SigIgn) }
        .step(Step::IgnoreSigchld)
        .map(drop)
}

/// Replaces the whole environment with `vars`.
///
/// `vars` are rendered before forking; only libc's own environment
/// bookkeeping allocates here.
///
/// # Errors
///
/// Returns [`Step::ClearEnv`] or [`Step::PutEnv`] on failure.
pub fn reset_environment(vars: &[(CString, CString)]) -> Result<(), StepError> {
    // SAFETY: the helper is single-threaded after fork; nothing else reads
    // or writes the environment concurrently.
    Errno::result(unsafe { libc::clearenv() }).step(Step::ClearEnv)?;
    for (key, value) in vars {
        // SAFETY: as above; setenv copies both strings.
        Errno::result(unsafe { libc::setenv(key.as_ptr(), value.as_ptr(), 1) })
            .step(Step::PutEnv)?;
    }
    Ok(())
}
