//! # Process Identity
//!
//! Caller identity, the permission check used by cross-process operations,
//! and the trivial ioctl entry points.

use uvm_core::{Error, Result, Uid, ROOT_UID};

use crate::platform::Platform;

/// Process id of the caller
///
/// The value may be stale by the time it is used (the process can exit);
/// suitable for logging and heuristics only.
pub fn stale_process_id<P: Platform + ?Sized>(platform: &P) -> u32 {
    platform.current_pid()
}

/// Thread id of the caller, with the same caveat as [`stale_process_id`]
pub fn stale_thread_id<P: Platform + ?Sized>(platform: &P) -> u32 {
    platform.current_tid()
}

/// Whether the caller may act on objects owned by `euid_target`
///
/// Root may act on anything; everyone else only on their own objects.
pub fn user_id_security_check<P: Platform + ?Sized>(platform: &P, euid_target: Uid) -> bool {
    let euid = platform.current_euid();
    euid == ROOT_UID || euid == euid_target
}

/// ioctl handler that accepts and ignores its parameters
pub fn api_stub<T: ?Sized, F: ?Sized>(_params: &mut T, _file: &F) -> Result<()> {
    Ok(())
}

/// ioctl handler for commands this build does not implement
pub fn api_unsupported<T: ?Sized, F: ?Sized>(_params: &mut T, _file: &F) -> Result<()> {
    Err(Error::NotSupported)
}

/// Resource-manager object owned by a user-mode client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RmUserObject {
    /// Control file descriptor the client opened on the RM device
    pub rm_control_fd: i32,
    /// Client handle
    pub user_client: u32,
    /// Object handle within the client
    pub user_object: u32,
}

static_assertions::assert_impl_all!(RmUserObject: Copy, Send, Sync);
