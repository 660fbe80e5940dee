//! # Host Platform
//!
//! [`Platform`] on top of the Rust standard library, for user-space tools
//! and tests, plus a `log` backend rendering records the way the kernel
//! module prints them.

use std::backtrace::Backtrace;
use std::cell::Cell;
use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use log::kv::{self, Key, Value, VisitSource};
use log::{LevelFilter, Log, Metadata, Record};
use uvm_core::debug::{self, DiagSink, LOG_TARGET};
use uvm_core::{Error, Result, Uid};

use crate::platform::Platform;

// =============================================================================
// HOST PLATFORM
// =============================================================================

static NEXT_TID: AtomicU32 = AtomicU32::new(1);

std::thread_local! {
    static TID: Cell<u32> = const { Cell::new(0) };
}

/// Standard-library platform
#[derive(Debug)]
pub struct HostPlatform {
    epoch: Instant,
    euid: Uid,
}

impl HostPlatform {
    /// Create a platform whose caller runs as root
    pub fn new() -> Self {
        Self::with_euid(uvm_core::ROOT_UID)
    }

    /// Create a platform whose caller runs as `euid`
    pub fn with_euid(euid: Uid) -> Self {
        Self {
            epoch: Instant::now(),
            euid,
        }
    }

    /// Leak the platform and install it as the diagnostics sink
    pub fn install(self) -> Result<&'static Self> {
        let platform: &'static Self = Box::leak(Box::new(self));
        debug::install_sink(platform)?;
        Ok(platform)
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagSink for HostPlatform {
    fn now_ns(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn dump_stack(&self) {
        log::debug!(target: LOG_TARGET, "stack:\n{}", Backtrace::force_capture());
    }

    fn current_pid(&self) -> u32 {
        std::process::id()
    }
}

impl Platform for HostPlatform {
    fn name(&self) -> &'static str {
        "host"
    }

    fn may_sleep(&self) -> bool {
        true
    }

    fn schedule(&self) {
        std::thread::yield_now();
    }

    fn current_tid(&self) -> u32 {
        TID.with(|tid| {
            if tid.get() == 0 {
                tid.set(NEXT_TID.fetch_add(1, Ordering::Relaxed));
            }
            tid.get()
        })
    }

    fn current_euid(&self) -> Uid {
        self.euid
    }
}

// =============================================================================
// HOST LOGGER
// =============================================================================

/// Prefix on every line, as printed by the kernel module
pub const PRINT_PREFIX: &str = "nvidia-uvm: ";

/// `log` backend writing `nvidia-uvm: file:line [pid:N] message key=value`
/// lines to stderr
#[derive(Debug)]
pub struct HostLogger;

static LOGGER: HostLogger = HostLogger;

/// Install [`HostLogger`] as the global logger
pub fn init_logger(level: LevelFilter) -> Result<()> {
    log::set_logger(&LOGGER).map_err(|_| Error::InvalidState)?;
    log::set_max_level(level);
    Ok(())
}

/// Render a record as one line (without the trailing newline)
pub fn format_record(record: &Record<'_>, pid: u32) -> String {
    let mut line = String::from(PRINT_PREFIX);

    let file = record
        .file()
        .map(|f| f.rsplit('/').next().unwrap_or(f))
        .unwrap_or("?");
    let _ = write!(
        line,
        "{}:{} [pid:{}] {}",
        file,
        record.line().unwrap_or(0),
        pid,
        record.args()
    );

    let mut fields = FieldWriter(&mut line);
    let _ = record.key_values().visit(&mut fields);
    line
}

struct FieldWriter<'a>(&'a mut String);

impl<'kvs> VisitSource<'kvs> for FieldWriter<'_> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> core::result::Result<(), kv::Error> {
        let _ = write!(self.0, " {}={}", key, value);
        Ok(())
    }
}

impl Log for HostLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let pid = debug::sink().map_or_else(std::process::id, |s| s.current_pid());
        let line = format_record(record, pid);
        let _ = writeln!(std::io::stderr().lock(), "{}", line);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
