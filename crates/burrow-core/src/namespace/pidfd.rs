//! Stable process handles (`pidfd_open(2)`).
//!
//! A pid can be recycled the moment its process is reaped; a pidfd always
//! refers to the process it was opened for.

use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::unistd::Pid;

/// An open pid file descriptor. Closed on drop.
#[derive(Debug)]
pub struct PidFd(OwnedFd);

impl PidFd {
    /// Opens a handle to `pid`.
    ///
    /// # Errors
    ///
    /// Returns `ESRCH` if the process does not exist, or the errno of the
    /// failed syscall.
    pub fn open(pid: Pid) -> nix::Result<Self> {
        // SAFETY: pidfd_open takes a pid and a flags word and returns a new
        // descriptor (close-on-exec) or -1.
        let ret = unsafe { libc::syscall(libc::SYS_pidfd_open, pid.as_raw(), 0) };
        let fd = RawFd::try_from(Errno::result(ret)?).map_err(|_| Errno::EBADF)?;
        // SAFETY: fd was just returned by the kernel and is owned by nobody else.
        Ok(Self(unsafe { OwnedFd::from_raw_fd(fd) }))
    }

    /// Sends `signal` to the process behind this handle.
    ///
    /// # Errors
    ///
    /// Returns `ESRCH` if the process has already exited.
    pub fn send_signal(&self, signal: Signal) -> nix::Result<()> {
        // SAFETY: a null siginfo and zero flags mean "behave like kill(2)".
        let ret = unsafe {
            libc::syscall(
                libc::SYS_pidfd_send_signal,
                self.0.as_raw_fd(),
                signal as libc::c_int,
                std::ptr::null::<libc::siginfo_t>(),
                0_u32,
            )
        };
        Errno::result(ret).map(drop)
    }
}

impl AsFd for PidFd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.0.as_fd()
    }
}
