//! # UVM Hardware Abstraction Layer
//!
//! Interfaces to the host environment consumed by the UVM utility layer:
//!
//! - [`platform::Platform`]: monotonic clock, reschedule query and voluntary
//!   yield, stack dumps, caller identity
//! - [`platform::arch`]: CPU relax hint and speculation barrier
//! - [`process`]: identity and permission helpers, ioctl entry stubs
//! - [`cache`]: object-cache wrapper with idempotent destroy
//! - [`device`]: character device setup
//!
//! With the `std` feature, [`host::HostPlatform`] implements everything on
//! top of the standard library, for user-space tools and tests.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod cache;
pub mod device;
pub mod platform;
pub mod process;

#[cfg(feature = "std")]
pub mod host;

pub use platform::Platform;
