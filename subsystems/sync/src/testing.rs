//! Deterministic platform and log capture for wait tests

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, Once};

use log::{LevelFilter, Log, Metadata, Record};
use uvm_core::debug::{DiagSink, LOG_TARGET};
use uvm_core::{Uid, ROOT_UID};
use uvm_hal::host::format_record;
use uvm_hal::Platform;

/// Platform whose clock advances by a fixed step on every read
#[derive(Debug)]
pub(crate) struct FakePlatform {
    now: AtomicU64,
    step: u64,
    may_sleep: AtomicBool,
    clock_reads: AtomicU64,
    yields: AtomicU64,
    relaxes: AtomicU64,
    stack_dumps: AtomicU64,
}

impl FakePlatform {
    pub(crate) fn new(step: u64) -> Self {
        Self::starting_at(0, step)
    }

    pub(crate) fn starting_at(now: u64, step: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
            step,
            may_sleep: AtomicBool::new(true),
            clock_reads: AtomicU64::new(0),
            yields: AtomicU64::new(0),
            relaxes: AtomicU64::new(0),
            stack_dumps: AtomicU64::new(0),
        }
    }

    pub(crate) fn without_sleep(self) -> Self {
        self.may_sleep.store(false, Ordering::Relaxed);
        self
    }

    pub(crate) fn clock_reads(&self) -> u64 {
        self.clock_reads.load(Ordering::Relaxed)
    }

    pub(crate) fn yields(&self) -> u64 {
        self.yields.load(Ordering::Relaxed)
    }

    pub(crate) fn relaxes(&self) -> u64 {
        self.relaxes.load(Ordering::Relaxed)
    }

    pub(crate) fn stack_dumps(&self) -> u64 {
        self.stack_dumps.load(Ordering::Relaxed)
    }
}

impl DiagSink for FakePlatform {
    fn now_ns(&self) -> u64 {
        self.clock_reads.fetch_add(1, Ordering::Relaxed);
        self.now.fetch_add(self.step, Ordering::Relaxed)
    }

    fn dump_stack(&self) {
        self.stack_dumps.fetch_add(1, Ordering::Relaxed);
    }
}

impl Platform for FakePlatform {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn may_sleep(&self) -> bool {
        self.may_sleep.load(Ordering::Relaxed)
    }

    fn schedule(&self) {
        self.yields.fetch_add(1, Ordering::Relaxed);
    }

    fn cpu_relax(&self) {
        self.relaxes.fetch_add(1, Ordering::Relaxed);
    }

    fn current_tid(&self) -> u32 {
        1
    }

    fn current_euid(&self) -> Uid {
        ROOT_UID
    }
}

// =============================================================================
// LOG CAPTURE
// =============================================================================

/// Logger keeping every `uvm` record as its rendered line
struct CaptureLogger;

static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());
static LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        if record.target() == LOG_TARGET {
            if let Ok(mut lines) = CAPTURED.lock() {
                lines.push(format_record(record, 0));
            }
        }
    }

    fn flush(&self) {}
}

/// Route all log output of this test binary into the capture buffer
pub(crate) fn capture_logs() {
    INSTALL.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Lines captured so far, from every test in the binary
pub(crate) fn captured_logs() -> Vec<String> {
    CAPTURED.lock().map(|lines| lines.clone()).unwrap_or_default()
}
