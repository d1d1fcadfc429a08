//! Container lifecycle management for the burrow runtime.
//!
//! A container is a set of fresh namespaces held alive by one anchor
//! process. This crate creates it ([`process`]), turns the anchor into the
//! container's init ([`init`]), runs commands inside it ([`exec`]), and
//! stops it ([`container`]).

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod container;
pub mod exec;
pub mod init;
pub mod process;

pub use container::Container;
pub use exec::{JoinedProcess, exec_checked, exec_in_container, spawn_in_container};
