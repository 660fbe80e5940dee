//! # UVM Core Types
//!
//! Virtual addresses and their canonical form, inclusive address ranges,
//! processor UUIDs and user ids.

use core::fmt::{self, Write};

use arrayvec::ArrayString;

use crate::arith;

// =============================================================================
// CANONICAL ADDRESSES
// =============================================================================

/// Width of the virtual address space the driver manages
pub const VA_BITS: u32 = 49;

/// Sign-extend `addr` from bit `bits - 1` through bit 63
///
/// `bits` must be in `1..=64`; 64 returns `addr` unchanged.
#[inline]
pub const fn sign_extend(addr: u64, bits: u32) -> u64 {
    debug_assert!(matches!(bits, 1..=64), "sign_extend width out of range");
    let shift = 64 - bits;
    (((addr << shift) as i64) >> shift) as u64
}

cfg_if::cfg_if! {
    if #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))] {
        /// Whether this CPU requires canonical-form pointers
        pub const REQUIRES_CANONICAL: bool = true;

        /// Canonical form of a virtual address
        ///
        /// Sign-extends from bit 48 on every architecture that checks the
        /// high bits, whatever its native VA width, so that GPU and CPU
        /// agree on one 49-bit layout.
        #[inline]
        pub const fn canonical_form(addr: u64) -> u64 {
            sign_extend(addr, VA_BITS)
        }
    } else {
        /// Whether this CPU requires canonical-form pointers
        pub const REQUIRES_CANONICAL: bool = false;

        /// Canonical form of a virtual address (identity on this CPU)
        #[inline]
        pub const fn canonical_form(addr: u64) -> u64 {
            addr
        }
    }
}

// =============================================================================
// VIRTUAL ADDRESS
// =============================================================================

/// Virtual address in the unified (CPU and GPU) address space
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct VirtAddr(u64);

impl VirtAddr {
    /// Create a virtual address (no canonicalization)
    #[inline]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Get the raw value
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Canonical form of this address
    #[inline]
    pub const fn canonical(self) -> Self {
        Self(canonical_form(self.0))
    }

    /// Check if already canonical
    #[inline]
    pub const fn is_canonical(self) -> bool {
        canonical_form(self.0) == self.0
    }

    /// Align down
    #[inline]
    pub fn align_down(self, alignment: u64) -> Self {
        Self(arith::align_down(self.0, alignment))
    }

    /// Align up
    #[inline]
    pub fn align_up(self, alignment: u64) -> Self {
        Self(arith::align_up(self.0, alignment))
    }

    /// Check alignment
    #[inline]
    pub fn is_aligned(self, alignment: u64) -> bool {
        arith::is_aligned(self.0, alignment)
    }
}

impl From<u64> for VirtAddr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtAddr(0x{:016x})", self.0)
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

// =============================================================================
// ADDRESS RANGE
// =============================================================================

/// Contiguous virtual address range, both ends inclusive
///
/// Callers keep `start <= end`; nothing here normalizes the bounds.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddrRange {
    /// First address in the range
    pub start: u64,
    /// Last address in the range
    pub end: u64,
}

impl AddrRange {
    /// Create a range from inclusive bounds
    #[inline]
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Create a range from a start address and a non-zero length
    #[inline]
    pub fn from_len(start: u64, len: u64) -> Self {
        crate::uvm_assert!(len != 0);
        Self {
            start,
            end: start.wrapping_add(len).wrapping_sub(1),
        }
    }

    /// Number of addresses covered; `None` for the full 2^64 span
    #[inline]
    pub const fn len(&self) -> Option<u64> {
        (self.end - self.start).checked_add(1)
    }

    /// Check if address is in range
    #[inline]
    pub const fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr <= self.end
    }

    /// Check if ranges overlap (a shared endpoint counts)
    #[inline]
    pub const fn overlaps(&self, other: &AddrRange) -> bool {
        arith::ranges_overlap(self.start, self.end, other.start, other.end)
    }
}

impl fmt::Debug for AddrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:x}, 0x{:x}]", self.start, self.end)
    }
}

// =============================================================================
// PROCESSOR UUID
// =============================================================================

/// Length of the textual UUID form: prefix, 32 hex digits, 4 dashes
pub const UUID_TEXT_LEN: usize = 8 + 16 * 2 + 4;

/// Fixed-capacity buffer holding a formatted UUID
pub type UuidText = ArrayString<UUID_TEXT_LEN>;

static_assertions::const_assert_eq!(UUID_TEXT_LEN, 44);

/// UUID identifying a processor (the CPU or one GPU)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct ProcessorUuid(pub [u8; 16]);

impl ProcessorUuid {
    /// UUID reserved for the CPU
    pub const CPU: Self = Self([0; 16]);

    /// Create from raw bytes
    #[inline]
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Check if this names the CPU
    #[inline]
    pub fn is_cpu(&self) -> bool {
        *self == Self::CPU
    }

    /// Short form for log lines: the first four bytes
    #[inline]
    pub const fn abbrev(&self) -> u32 {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Format as `UVM-GPU-xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`
    pub fn to_text(&self) -> UuidText {
        let mut text = UuidText::new();
        // Capacity is exact, the writes cannot fail
        let _ = write!(text, "{}", self);
        text
    }
}

impl fmt::Display for ProcessorUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UVM-GPU-")?;
        for (i, byte) in self.0.iter().enumerate() {
            write!(f, "{:02x}", byte)?;
            if matches!(i + 1, 4 | 6 | 8 | 10) {
                f.write_char('-')?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ProcessorUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessorUuid({})", self)
    }
}

// =============================================================================
// USER ID
// =============================================================================

/// Effective user id of a host process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Uid(pub u32);

/// The superuser
pub const ROOT_UID: Uid = Uid(0);

static_assertions::assert_impl_all!(VirtAddr: Send, Sync, Copy);
static_assertions::assert_impl_all!(AddrRange: Send, Sync, Copy);
static_assertions::assert_impl_all!(ProcessorUuid: Send, Sync, Copy);
