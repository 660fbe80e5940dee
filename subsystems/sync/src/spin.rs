//! # Bounded Polling
//!
//! Per-call-site state for busy-waits on hardware or shared-memory
//! conditions.
//!
//! A [`WaitState`] is created right before the first condition check and
//! [`poll_once`](WaitState::poll_once) is called after every failed check.
//! Each poll relaxes the CPU, gives it up once the wait has gone on for more
//! than [`SpinConfig::schedule_after_ns`] (when the context allows it), and
//! raises [`PollOutcome::TimeoutWarning`] every
//! [`SpinConfig::report_interval_ns`]. The warning is advisory: the wait
//! itself never fails.
//!
//! Polls do not yield from the start. The first
//! [`SpinConfig::schedule_after_ns`] of a wait are pure spinning, and only
//! later polls in a preemptible context give up the CPU.

use core::cell::Cell;
use core::marker::PhantomData;

use uvm_core::{config, Error, Result};
use uvm_hal::Platform;

/// Nanoseconds per microsecond
pub const NSEC_PER_USEC: u64 = 1_000;

/// Nanoseconds per second
pub const NSEC_PER_SEC: u64 = 1_000_000_000;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Timing policy of a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinConfig {
    /// Spin without yielding for this long
    pub schedule_after_ns: u64,
    /// Minimum time between two stuck-wait warnings
    pub report_interval_ns: u64,
}

impl SpinConfig {
    /// Yield after 10us, warn every 30s
    pub const DEFAULT: Self = Self {
        schedule_after_ns: 10 * NSEC_PER_USEC,
        report_interval_ns: 30 * NSEC_PER_SEC,
    };
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Execution context of the waiting caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitContext {
    /// Process context; may be descheduled
    Preemptible,
    /// Interrupt context or under a spinlock; must never yield
    Atomic,
}

impl WaitContext {
    /// Whether this context permits a voluntary yield
    #[inline]
    pub const fn can_yield(self) -> bool {
        matches!(self, Self::Preemptible)
    }
}

// =============================================================================
// POLL OUTCOME
// =============================================================================

/// Result of one poll
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Keep polling
    Continue,
    /// The wait has been running for another report interval
    TimeoutWarning,
}

impl PollOutcome {
    /// Check if a warning is due
    #[inline]
    pub const fn is_warning(self) -> bool {
        matches!(self, Self::TimeoutWarning)
    }
}

impl From<PollOutcome> for Result<()> {
    fn from(outcome: PollOutcome) -> Self {
        match outcome {
            PollOutcome::Continue => Ok(()),
            PollOutcome::TimeoutWarning => Err(Error::TimeoutRetry),
        }
    }
}

// =============================================================================
// WAIT STATE
// =============================================================================

/// Timestamps of one in-progress wait
///
/// Owned by the waiting stack frame. It can move to another thread with its
/// owner but is never shared.
#[derive(Debug)]
pub struct WaitState {
    start_ns: u64,
    last_report_ns: u64,
    config: SpinConfig,
    _not_sync: PhantomData<Cell<()>>,
}

static_assertions::assert_impl_all!(WaitState: Send);
static_assertions::assert_not_impl_any!(WaitState: Sync);

impl WaitState {
    /// Start a wait with the default policy
    pub fn init<P: Platform + ?Sized>(platform: &P) -> Self {
        Self::init_with(platform, SpinConfig::DEFAULT)
    }

    /// Start a wait with an explicit policy
    pub fn init_with<P: Platform + ?Sized>(platform: &P, config: SpinConfig) -> Self {
        let now = platform.now_ns();
        Self {
            start_ns: now,
            last_report_ns: now,
            config,
            _not_sync: PhantomData,
        }
    }

    /// Clock value when the wait started
    #[inline]
    pub fn start_ns(&self) -> u64 {
        self.start_ns
    }

    /// Clock value of the last warning (or the start)
    #[inline]
    pub fn last_report_ns(&self) -> u64 {
        self.last_report_ns
    }

    /// Policy in use
    #[inline]
    pub fn config(&self) -> SpinConfig {
        self.config
    }

    /// Time spent waiting so far
    pub fn elapsed_ns<P: Platform + ?Sized>(&self, platform: &P) -> u64 {
        platform.now_ns().saturating_sub(self.start_ns)
    }

    /// One iteration of the wait, after the condition was found still false
    pub fn poll_once<P: Platform + ?Sized>(&mut self, platform: &P, ctx: WaitContext) -> PollOutcome {
        let mut now = platform.now_ns();

        if now.saturating_sub(self.start_ns) >= self.config.schedule_after_ns
            && ctx.can_yield()
            && platform.may_sleep()
        {
            platform.schedule();
            now = platform.now_ns();
        }

        platform.cpu_relax();

        uvm_core::uvm_assert!(self.last_report_ns >= self.start_ns);

        if now.saturating_sub(self.last_report_ns) >= self.config.report_interval_ns {
            self.last_report_ns = now;
            PollOutcome::TimeoutWarning
        } else {
            PollOutcome::Continue
        }
    }

    /// [`poll_once`](Self::poll_once), printing the stuck-wait warning
    /// (and a stack dump) when one is due
    pub fn poll_and_report<P: Platform + ?Sized>(
        &mut self,
        platform: &P,
        ctx: WaitContext,
    ) -> PollOutcome {
        let outcome = self.poll_once(platform, ctx);

        if outcome.is_warning() {
            let secs = self.last_report_ns.saturating_sub(self.start_ns) / NSEC_PER_SEC;
            uvm_core::uvm_debug!(elapsed_s = secs; "Warning: stuck waiting for {}s", secs);

            if config::debug_prints_enabled() && config::stack_dumps_enabled() {
                platform.dump_stack();
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FakePlatform};

    #[test]
    fn test_default_policy() {
        let config = SpinConfig::default();
        assert_eq!(config.schedule_after_ns, 10_000);
        assert_eq!(config.report_interval_ns, 30 * NSEC_PER_SEC);
    }

    #[test]
    fn test_init_stamps_both_times() {
        let platform = FakePlatform::starting_at(500, 1);
        let state = WaitState::init(&platform);

        assert_eq!(state.start_ns(), 500);
        assert_eq!(state.last_report_ns(), 500);
        assert_eq!(platform.clock_reads(), 1);
    }

    #[test]
    fn test_no_yield_before_threshold() {
        let platform = FakePlatform::new(NSEC_PER_USEC);
        let mut state = WaitState::init(&platform);

        for _ in 0..9 {
            assert_eq!(state.poll_once(&platform, WaitContext::Preemptible), PollOutcome::Continue);
        }
        assert_eq!(platform.yields(), 0);
        assert_eq!(platform.relaxes(), 9);

        let _ = state.poll_once(&platform, WaitContext::Preemptible);
        assert_eq!(platform.yields(), 1);
    }

    #[test]
    fn test_atomic_context_never_yields() {
        let platform = FakePlatform::new(NSEC_PER_SEC);
        let mut state = WaitState::init(&platform);

        for _ in 0..100 {
            let _ = state.poll_once(&platform, WaitContext::Atomic);
        }
        assert_eq!(platform.yields(), 0);
        assert_eq!(platform.relaxes(), 100);
    }

    #[test]
    fn test_platform_that_cannot_sleep_never_yields() {
        let platform = FakePlatform::new(NSEC_PER_SEC).without_sleep();
        let mut state = WaitState::init(&platform);

        for _ in 0..10 {
            let _ = state.poll_once(&platform, WaitContext::Preemptible);
        }
        assert_eq!(platform.yields(), 0);
    }

    #[test]
    fn test_warning_every_interval() {
        let config = SpinConfig {
            schedule_after_ns: 0,
            report_interval_ns: 5,
        };
        let platform = FakePlatform::new(1);
        let mut state = WaitState::init_with(&platform, config);

        let warnings: Vec<u64> = (1..=12)
            .filter_map(|i| state.poll_once(&platform, WaitContext::Atomic).is_warning().then_some(i))
            .collect();

        assert_eq!(warnings, [5, 10]);
        assert_eq!(state.last_report_ns(), 10);
        assert!(state.last_report_ns() >= state.start_ns());
    }

    #[test]
    fn test_clock_reread_after_yield() {
        // Each read advances 20s: the poll reads 20s, yields, then reads 40s
        let platform = FakePlatform::new(20 * NSEC_PER_SEC);
        let mut state = WaitState::init(&platform);

        let outcome = state.poll_and_report(&platform, WaitContext::Preemptible);
        assert_eq!(outcome, PollOutcome::TimeoutWarning);
        assert_eq!(state.last_report_ns(), 40 * NSEC_PER_SEC);
        assert_eq!(platform.yields(), 1);
    }

    #[test]
    fn test_stuck_wait_report() {
        testing::capture_logs();
        config::admin::set_debug_prints(true);
        config::admin::set_stack_dumps(true);

        let policy = SpinConfig {
            schedule_after_ns: 0,
            report_interval_ns: 77 * NSEC_PER_SEC,
        };

        let platform = FakePlatform::new(77 * NSEC_PER_SEC);
        let mut state = WaitState::init_with(&platform, policy);
        assert!(state.poll_and_report(&platform, WaitContext::Atomic).is_warning());
        assert_eq!(platform.stack_dumps(), 1);
        assert!(testing::captured_logs()
            .iter()
            .any(|line| line.ends_with("Warning: stuck waiting for 77s elapsed_s=77")));

        // No warning, no dump
        let slow = FakePlatform::new(NSEC_PER_SEC);
        let mut state = WaitState::init_with(&slow, policy);
        assert!(!state.poll_and_report(&slow, WaitContext::Atomic).is_warning());
        assert_eq!(slow.stack_dumps(), 0);

        config::admin::set_stack_dumps(false);
        let quiet = FakePlatform::new(77 * NSEC_PER_SEC);
        let mut state = WaitState::init_with(&quiet, policy);
        let outcome = state.poll_and_report(&quiet, WaitContext::Atomic);
        config::admin::set_stack_dumps(true);

        assert!(outcome.is_warning());
        assert_eq!(quiet.stack_dumps(), 0);
    }

    #[test]
    fn test_outcome_to_status() {
        assert_eq!(Result::from(PollOutcome::Continue), Ok(()));
        assert_eq!(Result::from(PollOutcome::TimeoutWarning), Err(Error::TimeoutRetry));
        assert!(WaitContext::Preemptible.can_yield());
        assert!(!WaitContext::Atomic.can_yield());
    }
}
