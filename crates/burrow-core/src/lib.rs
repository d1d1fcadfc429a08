//! # burrow-core
//!
//! Low-level Linux primitives for the burrow runtime.
//!
//! This crate provides safe wrappers over:
//! - **Namespaces**: the fixed mount/pid/net/ipc/uts set, `unshare(2)` and
//!   `setns(2)` through a stable pid handle.
//! - **Filesystem**: the base directory layout, the `OverlayFS` root,
//!   mount propagation, and the `pivot_root` root switch.
//! - **Channels**: the error channel and pid relay used across `fork(2)`.
//! - **Process setup**: session, signal, and environment steps run by a
//!   helper before it execs.
//!
//! Everything that runs inside a forked helper returns a
//! [`channel::StepError`] and never logs. Argument vectors, mount options,
//! and environment strings are rendered before the fork, so the helper makes
//! no Rust allocation; libc's `clearenv`/`setenv` keep their own
//! bookkeeping.
//! [`process::Argv`] carries the prebuilt pointer array for `execvp(3)`.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod channel;
pub mod filesystem;
pub mod namespace;
pub mod process;
