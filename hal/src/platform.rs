//! # Platform Abstraction
//!
//! The host kernel services the UVM utility layer depends on.

use uvm_core::debug::DiagSink;
use uvm_core::Uid;

// =============================================================================
// PLATFORM TRAIT
// =============================================================================

/// Host environment interface
///
/// The clock, stack dump and pid come from [`DiagSink`], so any platform
/// can also be installed as the diagnostics sink.
pub trait Platform: DiagSink {
    /// Get platform name
    fn name(&self) -> &'static str;

    /// Whether the caller may be descheduled right now
    ///
    /// False in interrupt context and while holding spinlocks.
    fn may_sleep(&self) -> bool;

    /// Voluntarily give up the CPU
    ///
    /// Only called when [`may_sleep`](Self::may_sleep) returned true.
    fn schedule(&self);

    /// Pause hint inside a busy-wait
    fn cpu_relax(&self) {
        arch::spin_hint();
    }

    /// Thread id of the caller
    fn current_tid(&self) -> u32;

    /// Effective user id of the caller
    fn current_euid(&self) -> Uid;
}

// =============================================================================
// ARCHITECTURE HELPERS
// =============================================================================

/// Architecture-specific operations
pub mod arch {
    //! Architecture-specific helpers

    /// Pause hint for spin loops
    #[inline(always)]
    pub fn spin_hint() {
        core::hint::spin_loop();
    }

    /// Memory barrier
    #[inline(always)]
    pub fn memory_barrier() {
        core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
    }

    cfg_if::cfg_if! {
        if #[cfg(any(target_arch = "x86", target_arch = "x86_64"))] {
            /// Stop speculative execution past this point
            ///
            /// Placed after bounds checks on user-controlled indices.
            #[inline(always)]
            pub fn speculation_barrier() {
                // SAFETY: lfence has no operands and only orders execution
                unsafe {
                    core::arch::asm!("lfence", options(nostack, preserves_flags));
                }
            }
        } else {
            /// Stop speculative execution past this point (no-op on this CPU)
            #[inline(always)]
            pub fn speculation_barrier() {
                core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arch_helpers_do_not_fault() {
        arch::spin_hint();
        arch::memory_barrier();
        arch::speculation_barrier();
    }
}
