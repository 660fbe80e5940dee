//! # UVM Sync
//!
//! Bounded polling for code that waits on hardware or on another CPU.
//!
//! There is no blocking primitive here: a waiter re-checks its own condition
//! and calls into [`WaitState`] between checks. The wait state decides when
//! to give up the CPU and when the wait has gone on long enough to print a
//! warning. Waits never fail on their own; callers that need a deadline use
//! [`spin_while_timeout`].
//!
//! ```text
//!  cond()? ──no──► done (no clock read)
//!    │yes
//!    ▼
//!  WaitState::init ──► cond()? ──no──► WaitStats
//!                        │yes  ▲
//!                        ▼     │
//!                  poll_and_report
//!                  (relax, yield after 10us, warn every 30s)
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod spin;
pub mod wait;

#[cfg(test)]
mod testing;

pub use spin::{PollOutcome, SpinConfig, WaitContext, WaitState};
pub use wait::{spin_until, spin_while, spin_while_timeout, spin_while_with, WaitStats};
