//! Processor status register (P).
//!
//! The status register contains flags that reflect the result of
//! operations and control CPU behavior. Both operating modes keep the
//! status byte 8 bits wide; only the operand width the flags describe
//! changes.

use crate::registers::Width;

/// Carry flag - set if operation resulted in carry/borrow.
pub const C: u8 = 0x01;

/// Zero flag - set if result is zero.
pub const Z: u8 = 0x02;

/// Interrupt disable - when set, IRQ interrupts are ignored.
pub const I: u8 = 0x04;

/// Decimal mode - flag exists and is push/pop/set/clearable, but
/// arithmetic ignores it.
pub const D: u8 = 0x08;

/// Break flag - not a real flag, only appears when status is pushed.
/// Set when BRK pushes status, clear when IRQ/NMI pushes status.
pub const B: u8 = 0x10;

/// Unused bit - always reads as 1.
pub const U: u8 = 0x20;

/// Overflow flag - set if signed arithmetic overflowed.
pub const V: u8 = 0x40;

/// Negative flag - set if result has its most significant bit set.
pub const N: u8 = 0x80;

/// Processor status register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    /// Create a new status register in the reset pattern: unused and
    /// interrupt-disable set, everything else clear.
    #[must_use]
    pub const fn new() -> Self {
        Self(U | I)
    }

    /// Create status from raw value, ensuring unused bit is set.
    #[must_use]
    pub const fn from_byte(value: u8) -> Self {
        Self(value | U)
    }

    /// Get raw value with unused bit set and break clear.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        (self.0 | U) & !B
    }

    /// Composite byte pushed by BRK/PHP: `{P[7:5], 1, P[3:0]}`, i.e. the
    /// break bit forced set.
    #[must_use]
    pub const fn to_byte_brk(self) -> u8 {
        self.0 | U | B
    }

    /// Composite byte pushed by IRQ/NMI entry (break clear).
    #[must_use]
    pub const fn to_byte_irq(self) -> u8 {
        (self.0 | U) & !B
    }

    /// Check if a flag is set.
    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Set a flag.
    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    /// Clear a flag.
    pub fn clear(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    /// Set or clear a flag based on condition.
    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// Update N and Z from a result at the given operand width.
    pub fn update_nz(&mut self, value: u32, width: Width) {
        self.set_if(N, value & width.msb() != 0);
        self.set_if(Z, value & width.mask() == 0);
    }

    /// Merge ALU-computed flag bits under a mask of affected flags.
    pub fn merge(&mut self, flags: u8, mask: u8) {
        self.0 = (self.0 & !mask) | (flags & mask) | U;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_bit_only_appears_in_pushes() {
        let p = Status::from_byte(N | C);
        assert_eq!(p.to_byte(), N | U | C);
        assert_eq!(p.to_byte_brk(), N | U | B | C);
        assert_eq!(p.to_byte_irq(), N | U | C);
    }

    #[test]
    fn reset_pattern_masks_interrupts() {
        let p = Status::new();
        assert!(p.is_set(U));
        assert!(p.is_set(I));
        assert!(!p.is_set(C));
    }

    #[test]
    fn update_nz_respects_width() {
        let mut p = Status::new();
        p.update_nz(0x80, Width::Byte);
        assert!(p.is_set(N));
        p.update_nz(0x80, Width::Word);
        assert!(!p.is_set(N));
        p.update_nz(0x8000_0000, Width::Word);
        assert!(p.is_set(N));
        p.update_nz(0, Width::Word);
        assert!(p.is_set(Z));
    }

    #[test]
    fn merge_touches_only_masked_bits() {
        let mut p = Status::from_byte(D | C);
        p.merge(N | Z, N | Z | C);
        assert!(p.is_set(N));
        assert!(p.is_set(Z));
        assert!(!p.is_set(C));
        assert!(p.is_set(D));
        assert!(p.is_set(U));
    }
}
