//! # UVM Core
//!
//! Leaf crate of the unified virtual memory driver's shared utility layer.
//!
//! Everything here is free of host-environment dependencies:
//!
//! - **Status codes**: the driver's result domain and its mapping to errno
//! - **Arithmetic**: power-of-two alignment, inclusive range overlap,
//!   three-way comparison
//! - **Types**: canonical virtual addresses, address ranges, processor UUIDs
//! - **Diagnostics**: process-wide debug configuration, assertion and
//!   print macros layered on the `log` facade
//!
//! The host side (clock, scheduler, stack dumps) is reached through the
//! [`debug::DiagSink`] trait, implemented by `uvm-hal`.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod arith;
pub mod config;
pub mod debug;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

// Re-exported for the print macros; not part of the public API.
#[doc(hidden)]
pub use log as __log;
