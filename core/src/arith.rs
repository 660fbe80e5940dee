//! # Address Arithmetic
//!
//! Bit-exact helpers for power-of-two alignment, power-of-two division,
//! inclusive range overlap and three-way comparison.
//!
//! Alignments and divisors must be powers of two. That is an internal
//! invariant checked with [`uvm_assert!`](crate::uvm_assert), not an error:
//! the result for a bad alignment is whatever the bitmask produces.

use core::fmt;
use core::ops::{BitAnd, Not, Shr};

// =============================================================================
// UNSIGNED WIDTHS
// =============================================================================

mod sealed {
    pub trait Sealed {}
}

/// Unsigned integer widths accepted by the alignment helpers
pub trait Unsigned:
    sealed::Sealed
    + Copy
    + Eq
    + Ord
    + fmt::Debug
    + BitAnd<Output = Self>
    + Not<Output = Self>
    + Shr<u32, Output = Self>
{
    /// Zero
    const ZERO: Self;
    /// One
    const ONE: Self;

    /// Whether exactly one bit is set
    fn is_pow2(self) -> bool;
    /// Index of the lowest set bit
    fn trailing_zeros(self) -> u32;
    /// Modular addition
    fn wrapping_add(self, rhs: Self) -> Self;
    /// Modular subtraction
    fn wrapping_sub(self, rhs: Self) -> Self;
}

macro_rules! impl_unsigned {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Unsigned for $ty {
                const ZERO: Self = 0;
                const ONE: Self = 1;

                #[inline(always)]
                fn is_pow2(self) -> bool {
                    self.is_power_of_two()
                }

                #[inline(always)]
                fn trailing_zeros(self) -> u32 {
                    <$ty>::trailing_zeros(self)
                }

                #[inline(always)]
                fn wrapping_add(self, rhs: Self) -> Self {
                    <$ty>::wrapping_add(self, rhs)
                }

                #[inline(always)]
                fn wrapping_sub(self, rhs: Self) -> Self {
                    <$ty>::wrapping_sub(self, rhs)
                }
            }
        )*
    };
}

impl_unsigned!(u8, u16, u32, u64, usize);

// =============================================================================
// ALIGNMENT
// =============================================================================

/// Round `value` down to a multiple of `alignment`
///
/// Already-aligned values are returned unchanged.
#[inline]
pub fn align_down<T: Unsigned>(value: T, alignment: T) -> T {
    crate::uvm_assert_msg!(alignment.is_pow2(), "alignment {:?}", alignment);
    value & !alignment.wrapping_sub(T::ONE)
}

/// Round `value` up to a multiple of `alignment`
///
/// Wraps like the underlying bitmask when `value` is within `alignment` of
/// the type's maximum.
#[inline]
pub fn align_up<T: Unsigned>(value: T, alignment: T) -> T {
    crate::uvm_assert_msg!(alignment.is_pow2(), "alignment {:?}", alignment);
    let mask = alignment.wrapping_sub(T::ONE);
    value.wrapping_add(mask) & !mask
}

/// Check alignment
#[inline]
pub fn is_aligned<T: Unsigned>(value: T, alignment: T) -> bool {
    crate::uvm_assert_msg!(alignment.is_pow2(), "alignment {:?}", alignment);
    value & alignment.wrapping_sub(T::ONE) == T::ZERO
}

/// CPU page size assumed by the page helpers
pub const PAGE_SIZE: u64 = 4096;

/// Round up to a page boundary
#[inline]
pub fn page_align_up(value: u64) -> u64 {
    align_up(value, PAGE_SIZE)
}

/// Round down to a page boundary
#[inline]
pub fn page_align_down(value: u64) -> u64 {
    align_down(value, PAGE_SIZE)
}

// =============================================================================
// DIVISION
// =============================================================================

/// Divide by a runtime power of two
///
/// A shift by the divisor's log2; matches `numerator / denominator` for
/// every valid divisor.
#[inline]
pub fn div_pow2<T: Unsigned>(numerator: T, denominator_pow2: T) -> T {
    crate::uvm_assert!(denominator_pow2 != T::ZERO);
    crate::uvm_assert_msg!(denominator_pow2.is_pow2(), "divisor {:?}", denominator_pow2);
    numerator >> denominator_pow2.trailing_zeros()
}

/// 32-bit [`div_pow2`]
#[inline]
pub fn div_pow2_32(numerator: u32, denominator_pow2: u32) -> u32 {
    div_pow2(numerator, denominator_pow2)
}

/// 64-bit [`div_pow2`]
#[inline]
pub fn div_pow2_64(numerator: u64, denominator_pow2: u64) -> u64 {
    div_pow2(numerator, denominator_pow2)
}

/// `0 + 1 + ... + n`, modulo 2^64
///
/// The halving happens on whichever factor is even, so no intermediate
/// value overflows before the final multiply.
#[inline]
pub const fn sum_from_0_to_n(n: u64) -> u64 {
    if n % 2 == 0 {
        (n / 2).wrapping_mul(n + 1)
    } else {
        n.wrapping_mul(n / 2 + 1)
    }
}

// =============================================================================
// RANGES AND COMPARISON
// =============================================================================

/// Whether two inclusive ranges share at least one value
///
/// Ranges that only touch at an endpoint overlap. Both ranges must have
/// `start <= end`.
#[inline]
pub const fn ranges_overlap(a_start: u64, a_end: u64, b_start: u64, b_end: u64) -> bool {
    // !(a_end < b_start || b_end < a_start)
    a_end >= b_start && b_end >= a_start
}

/// Three-way comparison: -1, 0 or 1
///
/// Both operands share one type, so their widths always match. Unordered
/// values (NaN) compare as equal.
#[inline]
pub fn cmp_default<T: PartialOrd>(a: T, b: T) -> i32 {
    if a < b {
        -1
    } else if b < a {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALIGNMENTS: [u64; 6] = [1, 2, 8, 4096, 1 << 21, 1 << 40];
    const VALUES: [u64; 8] = [0, 1, 7, 8, 4095, 4096, 0x1234_5678_9abc, u64::MAX >> 2];

    #[test]
    fn test_align_down_bounds() {
        for &a in &ALIGNMENTS {
            for &v in &VALUES {
                let d = align_down(v, a);
                assert!(d <= v);
                assert!(v < d + a);
                assert_eq!(d % a, 0);
            }
        }
    }

    #[test]
    fn test_align_up_bounds() {
        for &a in &ALIGNMENTS {
            for &v in &VALUES {
                let u = align_up(v, a);
                assert!(u >= v);
                assert!(u - v < a);
                assert_eq!(u % a, 0);
            }
        }
    }

    #[test]
    fn test_align_already_aligned() {
        assert_eq!(align_down(0x2000u64, 0x1000), 0x2000);
        assert_eq!(align_up(0x2000u64, 0x1000), 0x2000);
        assert_eq!(align_up(0x2001u32, 0x1000), 0x3000);
        assert_eq!(align_down(0xFFu8, 0x10), 0xF0);
        assert!(is_aligned(0x3000usize, 0x1000));
        assert!(!is_aligned(0x3001usize, 0x1000));
    }

    #[test]
    fn test_align_up_wraps_at_top() {
        assert_eq!(align_up(u64::MAX, 8), 0);
    }

    #[test]
    fn test_page_align() {
        assert_eq!(page_align_up(1), PAGE_SIZE);
        assert_eq!(page_align_down(PAGE_SIZE + 1), PAGE_SIZE);
        assert_eq!(page_align_up(0), 0);
    }

    #[test]
    fn test_div_pow2_matches_division() {
        for shift in 0..64 {
            let d = 1u64 << shift;
            for &n in &VALUES {
                assert_eq!(div_pow2_64(n, d), n / d);
            }
            assert_eq!(div_pow2_64(u64::MAX, d), u64::MAX / d);
        }

        for shift in 0..32 {
            let d = 1u32 << shift;
            assert_eq!(div_pow2_32(u32::MAX, d), u32::MAX / d);
            assert_eq!(div_pow2_32(12345, d), 12345 / d);
        }
    }

    #[test]
    fn test_sum_from_0_to_n() {
        assert_eq!(sum_from_0_to_n(0), 0);
        assert_eq!(sum_from_0_to_n(1), 1);
        assert_eq!(sum_from_0_to_n(10), 55);
        assert_eq!(sum_from_0_to_n(11), 66);
    }

    #[test]
    fn test_sum_from_0_to_n_large() {
        let n = 1u64 << 32;
        assert_eq!(sum_from_0_to_n(n), (1 << 63) + (1 << 31));
        assert_eq!(sum_from_0_to_n(n - 1), (1 << 63) - (1 << 31));

        // Wraps instead of trapping
        assert_eq!(sum_from_0_to_n(u64::MAX), 1 << 63);
        assert_eq!(sum_from_0_to_n(u64::MAX - 1), (1 << 63) + 1);
    }

    #[test]
    fn test_ranges_overlap() {
        assert!(ranges_overlap(0, 10, 10, 20));
        assert!(!ranges_overlap(0, 9, 10, 20));
        assert!(ranges_overlap(5, 5, 0, u64::MAX));
        assert!(ranges_overlap(3, 3, 3, 3));
        assert!(!ranges_overlap(21, 30, 10, 20));
    }

    #[test]
    fn test_ranges_overlap_symmetric() {
        let ranges = [(0, 0), (0, 9), (5, 15), (10, 20), (20, 20), (21, u64::MAX)];
        for &(a0, a1) in &ranges {
            for &(b0, b1) in &ranges {
                assert_eq!(ranges_overlap(a0, a1, b0, b1), ranges_overlap(b0, b1, a0, a1));
            }
        }
    }

    #[test]
    fn test_cmp_default() {
        assert_eq!(cmp_default(3, 5), -1);
        assert_eq!(cmp_default(5, 3), 1);
        assert_eq!(cmp_default(5, 5), 0);
        assert_eq!(cmp_default(u64::MAX, 0), 1);
        assert_eq!(cmp_default(-1i32, 1), -1);
        assert_eq!(cmp_default(f64::NAN, 1.0), 0);
    }
}
