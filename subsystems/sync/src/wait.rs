//! # Condition Waits
//!
//! The loop every "wait until the hardware/other CPU catches up" call site
//! uses, built on [`WaitState`].

use uvm_core::{Error, Result};
use uvm_hal::Platform;

use crate::spin::{SpinConfig, WaitContext, WaitState};

/// Summary of a finished wait
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitStats {
    /// Polls performed
    pub polls: u64,
    /// Stuck-wait warnings raised
    pub warnings: u64,
    /// Time spent in the wait; zero if the condition was already satisfied
    pub elapsed_ns: u64,
}

impl WaitStats {
    /// Check if the caller had to wait at all
    #[inline]
    pub fn waited(&self) -> bool {
        self.polls > 0
    }
}

/// Spin while `cond` holds, with the default policy
///
/// If `cond` is false at the first check, returns at once without reading
/// the clock or yielding.
pub fn spin_while<P, F>(platform: &P, ctx: WaitContext, cond: F) -> WaitStats
where
    P: Platform + ?Sized,
    F: FnMut() -> bool,
{
    spin_while_with(platform, ctx, SpinConfig::DEFAULT, cond)
}

/// Spin while `cond` holds, with an explicit policy
pub fn spin_while_with<P, F>(
    platform: &P,
    ctx: WaitContext,
    config: SpinConfig,
    mut cond: F,
) -> WaitStats
where
    P: Platform + ?Sized,
    F: FnMut() -> bool,
{
    let mut stats = WaitStats::default();

    if !cond() {
        return stats;
    }

    let mut state = WaitState::init_with(platform, config);
    while cond() {
        stats.polls += 1;
        if state.poll_and_report(platform, ctx).is_warning() {
            stats.warnings += 1;
        }
    }

    stats.elapsed_ns = state.elapsed_ns(platform);
    stats
}

/// Spin until `cond` holds, with the default policy
pub fn spin_until<P, F>(platform: &P, ctx: WaitContext, mut cond: F) -> WaitStats
where
    P: Platform + ?Sized,
    F: FnMut() -> bool,
{
    spin_while(platform, ctx, || !cond())
}

/// Spin while `cond` holds, giving up after `timeout_ns`
///
/// Returns [`Error::Timeout`] if the condition still held once `timeout_ns`
/// had passed. The condition is always checked at least once more after the
/// deadline, so a wait that completes in its last poll still succeeds.
pub fn spin_while_timeout<P, F>(
    platform: &P,
    ctx: WaitContext,
    timeout_ns: u64,
    mut cond: F,
) -> Result<WaitStats>
where
    P: Platform + ?Sized,
    F: FnMut() -> bool,
{
    let mut stats = WaitStats::default();

    if !cond() {
        return Ok(stats);
    }

    let mut state = WaitState::init(platform);
    while cond() {
        let elapsed = state.elapsed_ns(platform);
        if elapsed >= timeout_ns {
            uvm_core::uvm_debug!(
                timeout_ns = timeout_ns, polls = stats.polls;
                "Timed out after {}ns",
                elapsed
            );
            return Err(Error::Timeout);
        }

        stats.polls += 1;
        if state.poll_and_report(platform, ctx).is_warning() {
            stats.warnings += 1;
        }
    }

    stats.elapsed_ns = state.elapsed_ns(platform);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spin::{NSEC_PER_SEC, NSEC_PER_USEC};
    use crate::testing::FakePlatform;
    use core::sync::atomic::{AtomicBool, Ordering};
    use uvm_hal::host::HostPlatform;

    /// Condition that holds for its first `n` checks
    fn holds_for(mut n: u32) -> impl FnMut() -> bool {
        move || {
            if n == 0 {
                false
            } else {
                n -= 1;
                true
            }
        }
    }

    #[test]
    fn test_satisfied_condition_costs_nothing() {
        let platform = FakePlatform::new(NSEC_PER_SEC);

        let stats = spin_while(&platform, WaitContext::Preemptible, || false);

        assert_eq!(stats, WaitStats::default());
        assert!(!stats.waited());
        assert_eq!(platform.clock_reads(), 0);
        assert_eq!(platform.yields(), 0);
        assert_eq!(platform.relaxes(), 0);
    }

    #[test]
    fn test_long_wait_warns_then_succeeds() {
        // Each poll reads the clock twice (before and after the yield): 2s
        // per poll, so a warning every 15 polls
        let platform = FakePlatform::new(NSEC_PER_SEC);

        let stats = spin_while(&platform, WaitContext::Preemptible, holds_for(41));

        assert_eq!(stats.polls, 40);
        assert_eq!(stats.warnings, 2);
        assert_eq!(platform.yields(), 40);
        assert!(stats.elapsed_ns >= 80 * NSEC_PER_SEC);
    }

    #[test]
    fn test_short_wait_never_warns() {
        let platform = FakePlatform::new(NSEC_PER_USEC);

        let stats = spin_while(&platform, WaitContext::Atomic, holds_for(6));

        assert_eq!(stats.polls, 5);
        assert_eq!(stats.warnings, 0);
        assert_eq!(platform.yields(), 0);
        assert_eq!(platform.relaxes(), 5);
    }

    #[test]
    fn test_condition_rechecked_after_init() {
        let platform = FakePlatform::new(1);

        // True at the outer check only
        let stats = spin_while(&platform, WaitContext::Preemptible, holds_for(1));

        assert_eq!(stats.polls, 0);
        assert_eq!(platform.clock_reads(), 2);
        assert_eq!(platform.relaxes(), 0);
    }

    #[test]
    fn test_custom_policy() {
        let config = SpinConfig {
            schedule_after_ns: 0,
            report_interval_ns: 10,
        };
        let platform = FakePlatform::new(1);

        let stats = spin_while_with(&platform, WaitContext::Atomic, config, holds_for(31));

        assert_eq!(stats.polls, 30);
        assert_eq!(stats.warnings, 3);
    }

    #[test]
    fn test_spin_until() {
        let platform = FakePlatform::new(1);
        let mut checks = 0;

        let stats = spin_until(&platform, WaitContext::Atomic, || {
            checks += 1;
            checks >= 4
        });

        assert_eq!(stats.polls, 2);
    }

    #[test]
    fn test_timeout_expires() {
        let platform = FakePlatform::new(NSEC_PER_USEC);

        let result = spin_while_timeout(&platform, WaitContext::Atomic, 50 * NSEC_PER_USEC, || true);

        assert_eq!(result, Err(Error::Timeout));
    }

    #[test]
    fn test_timeout_not_reached() {
        let platform = FakePlatform::new(NSEC_PER_USEC);

        let stats = spin_while_timeout(&platform, WaitContext::Atomic, NSEC_PER_SEC, holds_for(4));

        assert_eq!(stats.map(|s| s.polls), Ok(3));
    }

    #[test]
    fn test_host_platform_wait() {
        let platform = HostPlatform::new();
        let ready = AtomicBool::new(false);

        std::thread::scope(|s| {
            s.spawn(|| {
                std::thread::sleep(std::time::Duration::from_millis(5));
                ready.store(true, Ordering::Release);
            });

            let stats = spin_until(&platform, WaitContext::Preemptible, || {
                ready.load(Ordering::Acquire)
            });
            assert_eq!(stats.warnings, 0);
        });

        assert!(ready.load(Ordering::Acquire));
    }
}
