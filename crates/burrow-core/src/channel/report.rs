//! The error channel.
//!
//! Every forked helper owns the write end. Before any fallible work it marks
//! the descriptor close-on-exec ([`ReportWriter::arm`]); on its first failure
//! it writes `"<step>: <error description>"` and exits with the errno
//! ([`ReportWriter::conclude`]). The launcher reads until data or end-of-file:
//! data is the complete report, end-of-file means the helper either exec'd or
//! exited successfully.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::os::fd::OwnedFd;

use burrow_common::constants::MAX_REPORT_LEN;
use burrow_common::error::{BurrowError, Result};
use nix::fcntl::{FcntlArg, FdFlag, OFlag, fcntl};

use super::step::{Step, StepContext, StepError};

/// Creates a fresh error channel.
///
/// # Errors
///
/// Returns [`BurrowError::Os`] if the pipe cannot be allocated.
pub fn error_channel() -> Result<(ReportReader, ReportWriter)> {
    let (read, write) = nix::unistd::pipe2(OFlag::O_CLOEXEC)
        .map_err(|errno| BurrowError::os("pipe", errno as i32))?;
    Ok((ReportReader { fd: read }, ReportWriter { fd: write }))
}

/// Outcome of a helper as observed by its launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperOutcome {
    /// End-of-file without data: every step succeeded.
    Success,
    /// The helper's report.
    Failure(String),
}

impl HelperOutcome {
    /// Converts a failure report into [`BurrowError::Child`].
    ///
    /// # Errors
    ///
    /// Returns the report as an error when the helper failed.
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Success => Ok(()),
            Self::Failure(message) => Err(BurrowError::Child { message }),
        }
    }
}

/// Launcher side of the error channel.
#[derive(Debug)]
pub struct ReportReader {
    fd: OwnedFd,
}

impl ReportReader {
    /// Blocks until the helper reports or every write end is closed.
    ///
    /// Consumes the reader, so the descriptor is closed on every path.
    ///
    /// # Errors
    ///
    /// Returns [`BurrowError::Os`] if reading the pipe fails.
    pub fn receive(self) -> Result<HelperOutcome> {
        let mut file = File::from(self.fd);
        let mut buf = [0_u8; MAX_REPORT_LEN];
        let mut len = 0;
        while len < buf.len() {
            match file.read(&mut buf[len..]) {
                Ok(0) => break,
                Ok(n) => len += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(source) => {
                    return Err(BurrowError::Os {
                        operation: "read error channel",
                        source,
                    });
                }
            }
        }

        if len == 0 {
            return Ok(HelperOutcome::Success);
        }
        let report = &buf[..len];
        let end = report.iter().position(|&b| b == 0).unwrap_or(len);
        Ok(HelperOutcome::Failure(
            String::from_utf8_lossy(&report[..end]).into_owned(),
        ))
    }
}

/// Helper side of the error channel.
#[derive(Debug)]
pub struct ReportWriter {
    fd: OwnedFd,
}

impl ReportWriter {
    /// Marks the write end close-on-exec.
    ///
    /// First step of every helper, so that a successful exec closes the
    /// channel and the launcher sees end-of-file.
    ///
    /// # Errors
    ///
    /// Returns a [`Step::GetFdFlags`] or [`Step::SetFdFlags`] error if
    /// `fcntl(2)` fails.
    pub fn arm(&self) -> std::result::Result<(), StepError> {
        let flags = fcntl(&self.fd, FcntlArg::F_GETFD).step(Step::GetFdFlags)?;
        let flags = FdFlag::from_bits_retain(flags) | FdFlag::FD_CLOEXEC;
        let _ = fcntl(&self.fd, FcntlArg::F_SETFD(flags)).step(Step::SetFdFlags)?;
        Ok(())
    }

    /// Writes the report for `error` in a single `write(2)`.
    ///
    /// Does not allocate. Reports longer than [`MAX_REPORT_LEN`] are cut.
    pub fn report(&self, error: &StepError) {
        let mut buf = [0_u8; MAX_REPORT_LEN];
        let mut len = 0;
        for part in [error.step.as_str(), ": ", error.errno.desc()] {
            let n = part.len().min(buf.len() - len);
            buf[len..len + n].copy_from_slice(&part.as_bytes()[..n]);
            len += n;
        }
        // Nobody is left to tell if this fails.
        let _ = nix::unistd::write(&self.fd, &buf[..len]);
    }

    /// Terminates the helper.
    ///
    /// Exits with status 0 on success. On failure, writes the report and
    /// exits with the captured errno. Never runs destructors or `atexit`
    /// handlers inherited from the launcher.
    pub fn conclude(&self, outcome: std::result::Result<(), StepError>) -> ! {
        let code = match outcome {
            Ok(()) => 0,
            Err(error) => {
                self.report(&error);
                error.exit_code()
            }
        };
        // SAFETY: `_exit(2)` ends the process without touching any state
        // shared with the launcher.
        unsafe { libc::_exit(code) }
    }
}

#[cfg(test)]
mod tests {
    use nix::errno::Errno;
    use nix::sys::wait::{WaitStatus, waitpid};
    use nix::unistd::{ForkResult, fork};

    use super::*;

    fn run_helper(outcome: std::result::Result<(), StepError>) -> (HelperOutcome, WaitStatus) {
        let (reader, writer) = error_channel().unwrap();
        match unsafe { fork() }.unwrap() {
            ForkResult::Child => {
                drop(reader);
                let armed = writer.arm().and(outcome);
                writer.conclude(armed)
            }
            ForkResult::Parent { child } => {
                drop(writer);
                let outcome = reader.receive().unwrap();
                (outcome, waitpid(child, None).unwrap())
            }
        }
    }

    #[test]
    fn failure_is_reported_with_errno_exit() {
        let (outcome, status) = run_helper(Err(StepError::new(Step::Unshare, Errno::EPERM)));
        assert_eq!(
            outcome,
            HelperOutcome::Failure("unshare failed: Operation not permitted".into())
        );
        assert!(matches!(status, WaitStatus::Exited(_, code) if code == libc::EPERM));
    }

    #[test]
    fn success_is_end_of_file() {
        let (outcome, status) = run_helper(Ok(()));
        assert_eq!(outcome, HelperOutcome::Success);
        assert!(matches!(status, WaitStatus::Exited(_, 0)));
    }

    #[test]
    fn arm_sets_cloexec() {
        let (_reader, writer) = error_channel().unwrap();
        writer.arm().unwrap();
        let flags = FdFlag::from_bits_retain(fcntl(&writer.fd, FcntlArg::F_GETFD).unwrap());
        assert!(flags.contains(FdFlag::FD_CLOEXEC));
    }

    #[test]
    fn report_is_bounded() {
        let (reader, writer) = error_channel().unwrap();
        writer.report(&StepError::new(Step::MountPrivateNewRoot, Errno::ENOTDIR));
        drop(writer);
        let HelperOutcome::Failure(message) = reader.receive().unwrap() else {
            panic!("expected a failure report");
        };
        assert_eq!(message, "mount rprivate newroot failed: Not a directory");
        assert!(message.len() <= MAX_REPORT_LEN);
    }

    #[test]
    fn failure_converts_to_child_error() {
        let err = HelperOutcome::Failure("chdir failed: No such file or directory".into())
            .into_result()
            .unwrap_err();
        assert!(matches!(err, BurrowError::Child { ref message } if message.starts_with("chdir failed")));
        assert!(HelperOutcome::Success.into_result().is_ok());
    }
}
