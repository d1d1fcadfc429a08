//! One-shot hand-off of the anchor pid.
//!
//! The namespace-creating helper forks the anchor and sends its pid, as an
//! 8-byte native-endian value, exactly once. The sender is consumed by
//! [`PidSender::send`]; dropping it without sending makes the receiver see a
//! short read.

use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::os::fd::OwnedFd;

use burrow_common::error::{BurrowError, Result};
use nix::fcntl::OFlag;
use nix::unistd::Pid;

/// Creates a fresh pid relay.
///
/// # Errors
///
/// Returns [`BurrowError::Os`] if the pipe cannot be allocated.
pub fn pid_relay() -> Result<(PidReceiver, PidSender)> {
    let (read, write) = nix::unistd::pipe2(OFlag::O_CLOEXEC)
        .map_err(|errno| BurrowError::os("pipe", errno as i32))?;
    Ok((PidReceiver { fd: read }, PidSender { fd: write }))
}

/// Producing end of the pid relay.
#[derive(Debug)]
pub struct PidSender {
    fd: OwnedFd,
}

impl PidSender {
    /// Sends `pid` and closes the relay.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written in full.
    pub fn send(self, pid: Pid) -> std::io::Result<()> {
        let value = u64::try_from(pid.as_raw())
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidInput, e))?;
        File::from(self.fd).write_all(&value.to_ne_bytes())
    }
}

/// Consuming end of the pid relay.
#[derive(Debug)]
pub struct PidReceiver {
    fd: OwnedFd,
}

impl PidReceiver {
    /// Blocks until the pid arrives or every sender is closed.
    ///
    /// Call only after dropping the local [`PidSender`], otherwise a helper
    /// that died without sending blocks this forever.
    ///
    /// # Errors
    ///
    /// Returns [`BurrowError::Os`] if the relay closed before a full value
    /// arrived or the value is not a valid pid.
    pub fn recv(self) -> Result<Pid> {
        let mut buf = [0_u8; 8];
        File::from(self.fd)
            .read_exact(&mut buf)
            .map_err(|source| BurrowError::Os {
                operation: "receive anchor pid",
                source,
            })?;
        let raw = i32::try_from(u64::from_ne_bytes(buf))
            .ok()
            .filter(|&pid| pid > 0)
            .ok_or_else(|| BurrowError::Os {
                operation: "receive anchor pid",
                source: std::io::Error::new(ErrorKind::InvalidData, "relayed pid out of range"),
            })?;
        Ok(Pid::from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use nix::sys::wait::waitpid;
    use nix::unistd::{ForkResult, fork};

    use super::*;

    #[test]
    fn pid_crosses_fork_boundary() {
        let (receiver, sender) = pid_relay().unwrap();
        match unsafe { fork() }.unwrap() {
            ForkResult::Child => {
                drop(receiver);
                let code = i32::from(sender.send(Pid::from_raw(31337)).is_err());
                // SAFETY: terminates the forked child only.
                unsafe { libc::_exit(code) }
            }
            ForkResult::Parent { child } => {
                drop(sender);
                assert_eq!(receiver.recv().unwrap(), Pid::from_raw(31337));
                let _ = waitpid(child, None).unwrap();
            }
        }
    }

    #[test]
    fn dropped_sender_is_a_short_read() {
        let (receiver, sender) = pid_relay().unwrap();
        drop(sender);
        let err = receiver.recv().unwrap_err();
        assert!(matches!(
            err,
            BurrowError::Os { operation: "receive anchor pid", ref source }
                if source.kind() == ErrorKind::UnexpectedEof
        ));
    }
}
