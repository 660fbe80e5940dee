//! # Diagnostics Configuration
//!
//! Build-time flags and the process-wide diagnostics switches.
//!
//! The switches are resolved once at module start through [`init`]. After
//! that, only the [`admin`] interface may change them.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::error::{Error, Result};

// =============================================================================
// BUILD FLAGS
// =============================================================================

/// Debug build: assertions are checked and reported
pub const IS_DEBUG: bool = cfg!(any(debug_assertions, feature = "debug"));

/// Developer build; always implies [`IS_DEBUG`]
pub const IS_DEVELOP: bool = cfg!(feature = "develop");

static_assertions::const_assert!(!IS_DEVELOP || IS_DEBUG);

// =============================================================================
// RUNTIME FLAGS
// =============================================================================

bitflags::bitflags! {
    /// Process-wide diagnostics switches
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DiagFlags: u32 {
        /// Emit `uvm_error!`/`uvm_debug!`/`uvm_info!` output
        const DEBUG_PRINTS = 1 << 0;
        /// Allow the built-in self tests to be triggered
        const BUILTIN_TESTS = 1 << 1;
        /// Dump the stack alongside assertion and stuck-wait reports
        const STACK_DUMPS = 1 << 2;
    }
}

impl DiagFlags {
    /// Flags in effect before [`init`] runs
    pub const fn build_default() -> Self {
        if IS_DEBUG {
            Self::DEBUG_PRINTS.union(Self::STACK_DUMPS)
        } else {
            Self::empty()
        }
    }
}

/// Startup configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagConfig {
    /// Initial switches
    pub flags: DiagFlags,
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            flags: DiagFlags::build_default(),
        }
    }
}

static FLAGS: AtomicU32 = AtomicU32::new(DiagFlags::build_default().bits());
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Apply the startup configuration
///
/// Must be called once, from module init. A second call is rejected with
/// [`Error::InvalidState`] and leaves the current switches untouched.
pub fn init(config: DiagConfig) -> Result<()> {
    if INITIALIZED.swap(true, Ordering::AcqRel) {
        return Err(Error::InvalidState);
    }

    FLAGS.store(config.flags.bits(), Ordering::Release);
    log::debug!(target: crate::debug::LOG_TARGET, "diagnostics configured: {:?}", config.flags);
    Ok(())
}

/// Whether [`init`] has run
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Current switches
#[inline]
pub fn flags() -> DiagFlags {
    DiagFlags::from_bits_truncate(FLAGS.load(Ordering::Relaxed))
}

/// Whether debug prints are enabled
#[inline]
pub fn debug_prints_enabled() -> bool {
    flags().contains(DiagFlags::DEBUG_PRINTS)
}

/// Whether the built-in self tests may run
#[inline]
pub fn builtin_tests_enabled() -> bool {
    flags().contains(DiagFlags::BUILTIN_TESTS)
}

/// Whether diagnostics should include stack dumps
#[inline]
pub fn stack_dumps_enabled() -> bool {
    flags().contains(DiagFlags::STACK_DUMPS)
}

// =============================================================================
// ADMINISTRATIVE INTERFACE
// =============================================================================

/// Runtime mutation of the diagnostics switches
///
/// Wired to the driver's administrative controls (module parameters,
/// debugfs). Nothing else writes the switches after [`init`].
pub mod admin {
    use super::*;

    fn set(flag: DiagFlags, enabled: bool) {
        if enabled {
            FLAGS.fetch_or(flag.bits(), Ordering::AcqRel);
        } else {
            FLAGS.fetch_and(!flag.bits(), Ordering::AcqRel);
        }
    }

    /// Toggle debug prints
    pub fn set_debug_prints(enabled: bool) {
        set(DiagFlags::DEBUG_PRINTS, enabled);
    }

    /// Toggle the built-in self tests
    pub fn set_builtin_tests(enabled: bool) {
        set(DiagFlags::BUILTIN_TESTS, enabled);
    }

    /// Toggle stack dumps in diagnostics
    pub fn set_stack_dumps(enabled: bool) {
        set(DiagFlags::STACK_DUMPS, enabled);
    }
}
