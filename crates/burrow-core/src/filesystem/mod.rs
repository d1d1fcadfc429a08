//! Filesystem management for container isolation.
//!
//! Provides the on-disk base directory layout, the `OverlayFS` root derived
//! from the host root, mount-propagation helpers, and the `pivot_root`
//! root switch.

pub mod layout;
pub mod mount;
pub mod overlayfs;
pub mod pivot_root;
