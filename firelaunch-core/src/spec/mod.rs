//! Parsers for the compact device specifications accepted on the command line
//!
//! Each parser turns user-supplied strings into validated descriptors:
//! - `path:ro` / `path:rw` for block devices
//! - `device/mac` for the network interface
//! - `path:cid` for vsock devices
//!
//! A batch parse stops at the first malformed entry and returns its error;
//! no partial results are ever handed back.

pub mod drive;
pub mod nic;
pub mod vsock;

pub use drive::parse_block_devices;
pub use nic::parse_nic_config;
pub use vsock::parse_vsocks;
