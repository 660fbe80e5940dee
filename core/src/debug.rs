//! # Diagnostics
//!
//! Assertion, print and stack-dump plumbing shared by the whole driver.
//!
//! All output goes through the `log` facade under [`LOG_TARGET`]. Call-site
//! file, line and module travel in the `log::Record`; the installed logger
//! and [`DiagSink`] decide how to render them and which pid to attach.
//!
//! ```text
//!  uvm_error!/uvm_debug!/uvm_info!  ──► config::debug_prints_enabled()
//!                                          │
//!                                          ▼
//!                                    log::Record (target "uvm")
//!
//!  uvm_assert!  ──► IS_DEBUG? ──► assert_failed() ──► dump_stack() ──► on_assert()
//! ```

use core::fmt;
use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::config;
use crate::error::{Error, Result};

/// `log` target used by every UVM diagnostic
pub const LOG_TARGET: &str = "uvm";

// =============================================================================
// DIAGNOSTIC SINK
// =============================================================================

/// Host services needed by the diagnostics layer
///
/// Implemented by the platform crate; installed once with [`install_sink`].
pub trait DiagSink: Sync {
    /// Monotonic clock in nanoseconds
    fn now_ns(&self) -> u64;

    /// Print the current call stack
    fn dump_stack(&self) {}

    /// Process id of the caller, for log prefixes
    fn current_pid(&self) -> u32 {
        0
    }
}

static SINK: spin::Once<&'static dyn DiagSink> = spin::Once::new();

/// Install the process-wide diagnostic sink
///
/// Only the first installation takes effect; later ones return
/// [`Error::InvalidState`].
pub fn install_sink(sink: &'static dyn DiagSink) -> Result<()> {
    let mut installed = false;
    SINK.call_once(|| {
        installed = true;
        sink
    });

    if installed {
        Ok(())
    } else {
        Err(Error::InvalidState)
    }
}

/// The installed sink, if any
#[inline]
pub fn sink() -> Option<&'static dyn DiagSink> {
    SINK.get().copied()
}

/// Dump the current call stack through the sink
///
/// Does nothing before a sink is installed or when stack dumps are
/// switched off.
pub fn dump_stack() {
    if !config::stack_dumps_enabled() {
        return;
    }

    if let Some(sink) = sink() {
        sink.dump_stack();
    }
}

// =============================================================================
// RATE LIMITING
// =============================================================================

/// Length of one rate-limit window
pub const RATELIMIT_INTERVAL_NS: u64 = 5 * 1_000_000_000;

/// Messages allowed per window
pub const RATELIMIT_BURST: u32 = 10;

/// Per-call-site rate limiter for the `_rl` print macros
///
/// Allows [`RATELIMIT_BURST`] messages per [`RATELIMIT_INTERVAL_NS`] and
/// counts what it drops. Races between CPUs may let a message or two
/// through past the burst; that is acceptable for diagnostics.
#[derive(Debug)]
pub struct RateLimit {
    window_start_ns: AtomicU64,
    printed: AtomicU32,
    missed: AtomicU32,
}

impl RateLimit {
    /// Create a limiter with no window open yet
    pub const fn new() -> Self {
        Self {
            window_start_ns: AtomicU64::new(0),
            printed: AtomicU32::new(0),
            missed: AtomicU32::new(0),
        }
    }

    /// Check against the sink clock
    ///
    /// Without a sink there is no clock, so nothing is suppressed.
    pub fn allow(&self) -> bool {
        match sink() {
            Some(sink) => self.allow_at(sink.now_ns()),
            None => true,
        }
    }

    /// Check at an explicit timestamp
    pub fn allow_at(&self, now_ns: u64) -> bool {
        let start = self.window_start_ns.load(Ordering::Acquire);

        // 0 marks "no window yet", so a window never starts at 0
        if start == 0 || now_ns.saturating_sub(start) >= RATELIMIT_INTERVAL_NS {
            let opened = self
                .window_start_ns
                .compare_exchange(start, now_ns.max(1), Ordering::AcqRel, Ordering::Acquire)
                .is_ok();

            if opened {
                self.printed.store(0, Ordering::Release);
                let missed = self.missed.swap(0, Ordering::AcqRel);
                if missed > 0 {
                    log::info!(target: LOG_TARGET, "{} messages suppressed", missed);
                }
            }
        }

        if self.printed.fetch_add(1, Ordering::AcqRel) < RATELIMIT_BURST {
            true
        } else {
            self.missed.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Messages dropped in the current window
    pub fn missed(&self) -> u32 {
        self.missed.load(Ordering::Relaxed)
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ASSERTIONS
// =============================================================================

static ASSERT_FAILURES: AtomicU64 = AtomicU64::new(0);

/// Breakpoint hook, reached on every failed assertion
#[inline(never)]
pub fn on_assert() {
    ASSERT_FAILURES.fetch_add(1, Ordering::Relaxed);
    core::hint::black_box(());
}

/// Failed assertions since load
pub fn assert_failures() -> u64 {
    ASSERT_FAILURES.load(Ordering::Relaxed)
}

/// Report a failed assertion
///
/// Called by [`uvm_assert!`](crate::uvm_assert) and
/// [`uvm_assert_msg!`](crate::uvm_assert_msg); not meant to be used directly.
#[cold]
#[inline(never)]
#[track_caller]
pub fn assert_failed(cond: &str, msg: fmt::Arguments<'_>) {
    let location = core::panic::Location::caller();

    crate::uvm_error!(
        "Assert failed, condition {} not true{} at {}:{}",
        cond,
        MsgSuffix(msg),
        location.file(),
        location.line()
    );
    dump_stack();
    on_assert();
}

/// Renders `: msg` for non-empty messages
struct MsgSuffix<'a>(fmt::Arguments<'a>);

impl fmt::Display for MsgSuffix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_str() {
            Some("") => Ok(()),
            _ => write!(f, ": {}", self.0),
        }
    }
}

// =============================================================================
// MACROS
// =============================================================================

/// Error-level print, gated on the debug-prints switch
#[macro_export]
macro_rules! uvm_error {
    ($($arg:tt)+) => {
        if $crate::config::debug_prints_enabled() {
            $crate::__log::error!(target: $crate::debug::LOG_TARGET, $($arg)+);
        }
    };
}

/// Rate-limited [`uvm_error!`]
#[macro_export]
macro_rules! uvm_error_rl {
    ($($arg:tt)+) => {{
        static __UVM_RATELIMIT: $crate::debug::RateLimit = $crate::debug::RateLimit::new();
        if $crate::config::debug_prints_enabled() && __UVM_RATELIMIT.allow() {
            $crate::__log::error!(target: $crate::debug::LOG_TARGET, $($arg)+);
        }
    }};
}

/// Debug-level print, gated on the debug-prints switch
#[macro_export]
macro_rules! uvm_debug {
    ($($arg:tt)+) => {
        if $crate::config::debug_prints_enabled() {
            $crate::__log::debug!(target: $crate::debug::LOG_TARGET, $($arg)+);
        }
    };
}

/// Rate-limited [`uvm_debug!`]
#[macro_export]
macro_rules! uvm_debug_rl {
    ($($arg:tt)+) => {{
        static __UVM_RATELIMIT: $crate::debug::RateLimit = $crate::debug::RateLimit::new();
        if $crate::config::debug_prints_enabled() && __UVM_RATELIMIT.allow() {
            $crate::__log::debug!(target: $crate::debug::LOG_TARGET, $($arg)+);
        }
    }};
}

/// Info-level print, gated on the debug-prints switch
#[macro_export]
macro_rules! uvm_info {
    ($($arg:tt)+) => {
        if $crate::config::debug_prints_enabled() {
            $crate::__log::info!(target: $crate::debug::LOG_TARGET, $($arg)+);
        }
    };
}

/// Error print prefixed with a status
#[macro_export]
macro_rules! uvm_error_status {
    ($status:expr, $($arg:tt)+) => {
        $crate::uvm_error!("ERROR: {} : {}", $status, ::core::format_args!($($arg)+))
    };
}

/// Debug print of a processor UUID
#[macro_export]
macro_rules! uvm_debug_uuid {
    ($msg:expr, $uuid:expr $(,)?) => {
        if $crate::config::debug_prints_enabled() {
            let __uuid: &$crate::types::ProcessorUuid = $uuid;
            $crate::__log::debug!(
                target: $crate::debug::LOG_TARGET,
                "{}: {}",
                $msg,
                __uuid.to_text()
            );
        }
    };
}

/// Error print prefixed with a processor UUID
#[macro_export]
macro_rules! uvm_error_uuid {
    ($uuid:expr, $($arg:tt)+) => {
        if $crate::config::debug_prints_enabled() {
            let __uuid: &$crate::types::ProcessorUuid = $uuid;
            $crate::__log::error!(
                target: $crate::debug::LOG_TARGET,
                "ERROR: {} : {}",
                __uuid.to_text(),
                ::core::format_args!($($arg)+)
            );
        }
    };
}

/// Check an internal invariant
///
/// In debug builds a false condition is logged with a stack dump and
/// [`on_assert`](crate::debug::on_assert) is called; execution continues.
/// In release builds the condition is type-checked but never evaluated.
#[macro_export]
macro_rules! uvm_assert {
    ($cond:expr $(,)?) => {
        if $crate::config::IS_DEBUG && !($cond) {
            $crate::debug::assert_failed(::core::stringify!($cond), ::core::format_args!(""));
        }
    };
}

/// [`uvm_assert!`] with a formatted message
#[macro_export]
macro_rules! uvm_assert_msg {
    ($cond:expr, $($arg:tt)+) => {
        if $crate::config::IS_DEBUG && !($cond) {
            $crate::debug::assert_failed(
                ::core::stringify!($cond),
                ::core::format_args!($($arg)+),
            );
        }
    };
}

/// Halt with a message
#[macro_export]
macro_rules! uvm_panic {
    () => {
        ::core::panic!("uvm: fatal error")
    };
    ($($arg:tt)+) => {
        ::core::panic!($($arg)+)
    };
}

/// Halt if the condition holds
#[macro_export]
macro_rules! uvm_panic_on {
    ($cond:expr $(,)?) => {
        if $cond {
            ::core::panic!("failed cond {}", ::core::stringify!($cond));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if $cond {
            ::core::panic!($($arg)+);
        }
    };
}
