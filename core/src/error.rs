//! # UVM Status Codes
//!
//! The driver's own result domain and its translation to and from the host
//! kernel's errno values.
//!
//! Success is `Ok(())`; every failure is an [`Error`] variant. Translation
//! is total in both directions: foreign errno values with no counterpart
//! collapse to [`Error::Generic`], and statuses the host has no errno for
//! fall back to `-EINVAL`.

use core::fmt;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// UVM Result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// UVM status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Unspecified failure
    Generic,
    /// Resource temporarily busy, retry the operation
    BusyRetry,
    /// Operation timed out
    Timeout,
    /// Timed out waiting, but the caller should keep retrying
    TimeoutRetry,
    /// Operation not supported
    NotSupported,
    /// Object is in use
    InUse,
    /// Object is in a state that does not allow the operation
    InvalidState,

    // =========================================================================
    // Argument Errors
    // =========================================================================
    /// Invalid argument
    InvalidArgument,
    /// Invalid parameter
    InvalidParameter,
    /// Invalid request
    InvalidRequest,
    /// Invalid device
    InvalidDevice,
    /// Value out of range
    OutOfRange,

    // =========================================================================
    // Memory Errors
    // =========================================================================
    /// Out of memory
    NoMemory,
    /// Out of some other resource
    InsufficientResources,
    /// Invalid address
    InvalidAddress,
    /// Access type not permitted on the target
    InvalidAccessType,
    /// Virtual address range already in use
    AddressInUse,

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    /// Object not found
    ObjectNotFound,
    /// No valid path to the object
    NoValidPath,
    /// Process not found
    PidNotFound,
    /// No GPU registered with the given UUID
    GpuUuidNotFound,

    // =========================================================================
    // Environment Errors
    // =========================================================================
    /// Caller lacks the required permissions
    InsufficientPermissions,
    /// A dependent module failed to load
    ModuleLoadFailed,
    /// Robust-channel error reported by the resource manager
    RcError,
}

impl Error {
    /// Stable name of the status, used in log lines
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic failure",
            Self::BusyRetry => "busy, retry",
            Self::Timeout => "timeout",
            Self::TimeoutRetry => "timeout, retry",
            Self::NotSupported => "not supported",
            Self::InUse => "in use",
            Self::InvalidState => "invalid state",
            Self::InvalidArgument => "invalid argument",
            Self::InvalidParameter => "invalid parameter",
            Self::InvalidRequest => "invalid request",
            Self::InvalidDevice => "invalid device",
            Self::OutOfRange => "out of range",
            Self::NoMemory => "out of memory",
            Self::InsufficientResources => "insufficient resources",
            Self::InvalidAddress => "invalid address",
            Self::InvalidAccessType => "invalid access type",
            Self::AddressInUse => "address range in use",
            Self::ObjectNotFound => "object not found",
            Self::NoValidPath => "no valid path",
            Self::PidNotFound => "process not found",
            Self::GpuUuidNotFound => "GPU UUID not found",
            Self::InsufficientPermissions => "insufficient permissions",
            Self::ModuleLoadFailed => "module load failed",
            Self::RcError => "robust channel error",
        }
    }

    /// Translate to a negative errno value
    ///
    /// Statuses without a host equivalent become `-EINVAL`; the fallback is
    /// logged so the lossy conversion is visible.
    pub fn to_errno(self) -> i32 {
        use errno::*;

        let code = match self {
            Self::BusyRetry => EAGAIN,
            Self::InsufficientPermissions => EPERM,
            Self::GpuUuidNotFound => ENODEV,
            Self::InsufficientResources | Self::NoMemory => ENOMEM,
            Self::InvalidAccessType => EACCES,
            Self::InvalidAddress => EFAULT,
            Self::InvalidArgument
            | Self::InvalidDevice
            | Self::InvalidParameter
            | Self::InvalidRequest
            | Self::InvalidState => EINVAL,
            Self::NotSupported => ENOSYS,
            Self::ObjectNotFound | Self::ModuleLoadFailed => ENOENT,
            Self::OutOfRange => ERANGE,
            Self::PidNotFound => ESRCH,
            Self::Timeout | Self::TimeoutRetry => ETIMEDOUT,
            Self::AddressInUse => EADDRINUSE,
            Self::InUse => EBUSY,
            Self::Generic | Self::NoValidPath | Self::RcError => {
                crate::uvm_info!(
                    status = self.as_str();
                    "converting status '{}' to -EINVAL",
                    self
                );
                EINVAL
            }
        };

        -code
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERRNO TRANSLATION
// =============================================================================

/// Linux errno values understood by the translation layer
pub mod errno {
    //! Host errno constants (positive values)

    /// Operation not permitted
    pub const EPERM: i32 = 1;
    /// No such file or directory
    pub const ENOENT: i32 = 2;
    /// No such process
    pub const ESRCH: i32 = 3;
    /// Interrupted system call
    pub const EINTR: i32 = 4;
    /// I/O error
    pub const EIO: i32 = 5;
    /// No such device or address
    pub const ENXIO: i32 = 6;
    /// Argument list too long
    pub const E2BIG: i32 = 7;
    /// Try again
    pub const EAGAIN: i32 = 11;
    /// Out of memory
    pub const ENOMEM: i32 = 12;
    /// Permission denied
    pub const EACCES: i32 = 13;
    /// Bad address
    pub const EFAULT: i32 = 14;
    /// Device or resource busy
    pub const EBUSY: i32 = 16;
    /// File exists
    pub const EEXIST: i32 = 17;
    /// No such device
    pub const ENODEV: i32 = 19;
    /// Invalid argument
    pub const EINVAL: i32 = 22;
    /// Math result not representable
    pub const ERANGE: i32 = 34;
    /// Function not implemented
    pub const ENOSYS: i32 = 38;
    /// No data available
    pub const ENODATA: i32 = 61;
    /// Value too large for defined data type
    pub const EOVERFLOW: i32 = 75;
    /// Operation not supported
    pub const EOPNOTSUPP: i32 = 95;
    /// Address already in use
    pub const EADDRINUSE: i32 = 98;
    /// Cannot assign requested address
    pub const EADDRNOTAVAIL: i32 = 99;
    /// Connection timed out
    pub const ETIMEDOUT: i32 = 110;
}

/// Translate a host errno into a status
///
/// Both `-EFOO` and `EFOO` are accepted; zero is success.
pub fn errno_to_status(code: i32) -> Result<()> {
    use errno::*;

    let status = match code.saturating_abs() {
        0 => return Ok(()),
        E2BIG | EINVAL => Error::InvalidArgument,
        EACCES => Error::InvalidAccessType,
        EADDRINUSE | EADDRNOTAVAIL => Error::AddressInUse,
        EFAULT => Error::InvalidAddress,
        EOVERFLOW => Error::OutOfRange,
        EINTR | EBUSY | EAGAIN => Error::BusyRetry,
        ENXIO | ENODEV => Error::ModuleLoadFailed,
        ENOMEM => Error::NoMemory,
        EPERM => Error::InsufficientPermissions,
        ESRCH => Error::PidNotFound,
        ETIMEDOUT => Error::Timeout,
        EEXIST => Error::InUse,
        ENOSYS | EOPNOTSUPP => Error::NotSupported,
        ENOENT => Error::NoValidPath,
        EIO => Error::RcError,
        ENODATA => Error::ObjectNotFound,
        _ => Error::Generic,
    };

    Err(status)
}

/// Translate a status into a host errno (zero or negative)
pub fn status_to_errno(status: Result<()>) -> i32 {
    match status {
        Ok(()) => 0,
        Err(e) => e.to_errno(),
    }
}
