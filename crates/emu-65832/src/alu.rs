//! ALU operations for the 6502/65832 core.
//!
//! Pure combinational functions: (operation, width, inputs) in, result and
//! flags out, no other state. Arithmetic is computed in one extra bit of
//! precision so the carry out of the MSB is a real bit at either width.
//! The sequencer invokes these identically whether the operand came from
//! memory, the accumulator, or an immediate — flag semantics never depend
//! on addressing mode.

use crate::flags::{C, N, V, Z};
use crate::registers::Width;

/// Result of an ALU operation: the value truncated to width, the computed
/// flag bits, and the set of status bits the operation affects.
#[derive(Debug, Clone, Copy)]
pub struct AluResult {
    pub value: u32,
    pub flags: u8,
    pub affects: u8,
}

fn nz(value: u32, width: Width) -> u8 {
    let mut flags = 0;
    if value & width.msb() != 0 {
        flags |= N;
    }
    if value == 0 {
        flags |= Z;
    }
    flags
}

/// Add with carry (ADC; ADD passes `carry = false`).
#[must_use]
pub fn add(width: Width, a: u32, b: u32, carry: bool) -> AluResult {
    let mask = u64::from(width.mask());
    let msb = u64::from(width.msb());
    let a = u64::from(a) & mask;
    let b = u64::from(b) & mask;

    let sum = a + b + u64::from(carry);
    let value = sum & mask;

    let mut flags = nz(value as u32, width);
    if sum > mask {
        flags |= C;
    }
    // Overflow: both operands same sign, result different sign.
    if (a ^ b) & msb == 0 && (a ^ value) & msb != 0 {
        flags |= V;
    }

    AluResult {
        value: value as u32,
        flags,
        affects: N | V | Z | C,
    }
}

/// Subtract with borrow (SBC; SUB passes `carry = true`, i.e. no incoming
/// borrow). Carry set in the result means no borrow occurred.
#[must_use]
pub fn sub(width: Width, a: u32, b: u32, carry: bool) -> AluResult {
    let mask = u64::from(width.mask());
    let msb = u64::from(width.msb());
    let a = u64::from(a) & mask;
    let b = u64::from(b) & mask;

    // a - b - !carry == a + !b + carry in two's complement.
    let sum = a + (!b & mask) + u64::from(carry);
    let value = sum & mask;

    let mut flags = nz(value as u32, width);
    if sum > mask {
        flags |= C;
    }
    // Overflow: operands differ in sign and the result sign left a's.
    if (a ^ b) & msb != 0 && (a ^ value) & msb != 0 {
        flags |= V;
    }

    AluResult {
        value: value as u32,
        flags,
        affects: N | V | Z | C,
    }
}

/// Compare (CMP/CPX/CPY): subtract without borrow, flags only, no V.
#[must_use]
pub fn cmp(width: Width, a: u32, b: u32) -> AluResult {
    let r = sub(width, a, b, true);
    AluResult {
        value: r.value,
        flags: r.flags,
        affects: N | Z | C,
    }
}

/// Bitwise AND.
#[must_use]
pub fn and(width: Width, a: u32, b: u32) -> AluResult {
    let value = a & b & width.mask();
    AluResult {
        value,
        flags: nz(value, width),
        affects: N | Z,
    }
}

/// Bitwise OR.
#[must_use]
pub fn or(width: Width, a: u32, b: u32) -> AluResult {
    let value = (a | b) & width.mask();
    AluResult {
        value,
        flags: nz(value, width),
        affects: N | Z,
    }
}

/// Bitwise exclusive OR.
#[must_use]
pub fn eor(width: Width, a: u32, b: u32) -> AluResult {
    let value = (a ^ b) & width.mask();
    AluResult {
        value,
        flags: nz(value, width),
        affects: N | Z,
    }
}

/// BIT against memory: Z from the AND, N from the operand MSB, V from the
/// bit below it. The accumulator is not modified; `value` is the tested
/// AND for inspection only.
#[must_use]
pub fn bit(width: Width, a: u32, operand: u32) -> AluResult {
    let tested = a & operand & width.mask();
    let mut flags = 0;
    if tested == 0 {
        flags |= Z;
    }
    if operand & width.msb() != 0 {
        flags |= N;
    }
    if operand & width.v_bit() != 0 {
        flags |= V;
    }
    AluResult {
        value: tested,
        flags,
        affects: N | V | Z,
    }
}

/// BIT with an immediate operand: only Z is affected.
#[must_use]
pub fn bit_imm(width: Width, a: u32, operand: u32) -> AluResult {
    let tested = a & operand & width.mask();
    AluResult {
        value: tested,
        flags: if tested == 0 { Z } else { 0 },
        affects: Z,
    }
}

/// Arithmetic shift left: C takes the MSB, zero fills bit 0.
#[must_use]
pub fn asl(width: Width, v: u32) -> AluResult {
    let v = v & width.mask();
    let carry_out = v & width.msb() != 0;
    let value = (v << 1) & width.mask();
    let mut flags = nz(value, width);
    if carry_out {
        flags |= C;
    }
    AluResult {
        value,
        flags,
        affects: N | Z | C,
    }
}

/// Logical shift right: C takes bit 0, zero fills the MSB (N always
/// clears).
#[must_use]
pub fn lsr(width: Width, v: u32) -> AluResult {
    let carry_out = v & 1 != 0;
    let value = (v & width.mask()) >> 1;
    let mut flags = nz(value, width);
    if carry_out {
        flags |= C;
    }
    AluResult {
        value,
        flags,
        affects: N | Z | C,
    }
}

/// Rotate left through carry: prior C enters bit 0, MSB leaves into C.
#[must_use]
pub fn rol(width: Width, v: u32, carry: bool) -> AluResult {
    let v = v & width.mask();
    let carry_out = v & width.msb() != 0;
    let value = ((v << 1) | u32::from(carry)) & width.mask();
    let mut flags = nz(value, width);
    if carry_out {
        flags |= C;
    }
    AluResult {
        value,
        flags,
        affects: N | Z | C,
    }
}

/// Rotate right through carry: prior C enters the MSB, bit 0 leaves into
/// C.
#[must_use]
pub fn ror(width: Width, v: u32, carry: bool) -> AluResult {
    let carry_out = v & 1 != 0;
    let mut value = (v & width.mask()) >> 1;
    if carry {
        value |= width.msb();
    }
    let mut flags = nz(value, width);
    if carry_out {
        flags |= C;
    }
    AluResult {
        value,
        flags,
        affects: N | Z | C,
    }
}

/// Increment: N/Z only, carry never changes.
#[must_use]
pub fn inc(width: Width, v: u32) -> AluResult {
    let value = v.wrapping_add(1) & width.mask();
    AluResult {
        value,
        flags: nz(value, width),
        affects: N | Z,
    }
}

/// Decrement: N/Z only, carry never changes.
#[must_use]
pub fn dec(width: Width, v: u32) -> AluResult {
    let value = v.wrapping_sub(1) & width.mask();
    AluResult {
        value,
        flags: nz(value, width),
        affects: N | Z,
    }
}

/// Two's-complement negate: N/Z only.
#[must_use]
pub fn neg(width: Width, v: u32) -> AluResult {
    let value = v.wrapping_neg() & width.mask();
    AluResult {
        value,
        flags: nz(value, width),
        affects: N | Z,
    }
}

/// Bitwise complement: N/Z only.
#[must_use]
pub fn not(width: Width, v: u32) -> AluResult {
    let value = !v & width.mask();
    AluResult {
        value,
        flags: nz(value, width),
        affects: N | Z,
    }
}

/// Test and set bits: memory gets `operand | a`, Z reflects the overlap
/// before modification.
#[must_use]
pub fn tsb(width: Width, a: u32, operand: u32) -> AluResult {
    AluResult {
        value: (operand | a) & width.mask(),
        flags: if a & operand & width.mask() == 0 { Z } else { 0 },
        affects: Z,
    }
}

/// Test and reset bits: memory gets `operand & !a`, Z reflects the
/// overlap before modification.
#[must_use]
pub fn trb(width: Width, a: u32, operand: u32) -> AluResult {
    AluResult {
        value: operand & !a & width.mask(),
        flags: if a & operand & width.mask() == 0 { Z } else { 0 },
        affects: Z,
    }
}

/// Reset memory bit `which`: no flags.
#[must_use]
pub fn rmb(operand: u32, which: u8) -> AluResult {
    AluResult {
        value: (operand & !(1 << which)) & 0xFF,
        flags: 0,
        affects: 0,
    }
}

/// Set memory bit `which`: no flags.
#[must_use]
pub fn smb(operand: u32, which: u8) -> AluResult {
    AluResult {
        value: (operand | (1 << which)) & 0xFF,
        flags: 0,
        affects: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_basic_no_flags() {
        let r = add(Width::Byte, 0x3C, 0x04, false);
        assert_eq!(r.value, 0x40);
        assert_eq!(r.flags & (N | V | Z | C), 0);
    }

    #[test]
    fn add_carries_out_at_each_width() {
        let r = add(Width::Byte, 0xFF, 0x01, false);
        assert_eq!(r.value, 0x00);
        assert_ne!(r.flags & C, 0);
        assert_ne!(r.flags & Z, 0);

        let r = add(Width::Word, 0xFFFF_FFFF, 0x01, false);
        assert_eq!(r.value, 0x0000_0000);
        assert_ne!(r.flags & C, 0);
        assert_ne!(r.flags & Z, 0);

        // A byte-width carry is not a word-width carry.
        let r = add(Width::Word, 0xFF, 0x01, false);
        assert_eq!(r.value, 0x100);
        assert_eq!(r.flags & C, 0);
    }

    #[test]
    fn add_signed_overflow() {
        let r = add(Width::Byte, 0x7F, 0x01, false);
        assert_eq!(r.value, 0x80);
        assert_ne!(r.flags & V, 0);
        assert_ne!(r.flags & N, 0);

        let r = add(Width::Word, 0x7FFF_FFFF, 0x01, false);
        assert_eq!(r.value, 0x8000_0000);
        assert_ne!(r.flags & V, 0);
        assert_ne!(r.flags & N, 0);

        // Mixed signs never overflow.
        let r = add(Width::Byte, 0x80, 0x7F, true);
        assert_eq!(r.flags & V, 0);
    }

    #[test]
    fn sub_borrow_and_carry_convention() {
        // 5 - 3 with no incoming borrow: carry stays set (no borrow out).
        let r = sub(Width::Byte, 0x05, 0x03, true);
        assert_eq!(r.value, 0x02);
        assert_ne!(r.flags & C, 0);

        // 3 - 5 borrows: carry clears.
        let r = sub(Width::Byte, 0x03, 0x05, true);
        assert_eq!(r.value, 0xFE);
        assert_eq!(r.flags & C, 0);
        assert_ne!(r.flags & N, 0);

        // Incoming borrow consumes one.
        let r = sub(Width::Byte, 0x05, 0x03, false);
        assert_eq!(r.value, 0x01);
    }

    #[test]
    fn sub_signed_overflow() {
        // -128 - 1 overflows at byte width.
        let r = sub(Width::Byte, 0x80, 0x01, true);
        assert_eq!(r.value, 0x7F);
        assert_ne!(r.flags & V, 0);

        let r = sub(Width::Word, 0x8000_0000, 0x01, true);
        assert_eq!(r.value, 0x7FFF_FFFF);
        assert_ne!(r.flags & V, 0);
    }

    #[test]
    fn cmp_never_affects_v() {
        let r = cmp(Width::Byte, 0x80, 0x01);
        assert_eq!(r.affects & V, 0);
        assert_ne!(r.flags & C, 0); // 0x80 >= 0x01

        let r = cmp(Width::Byte, 0x01, 0x02);
        assert_eq!(r.flags & C, 0);
    }

    #[test]
    fn logical_ops_set_nz_only() {
        let r = and(Width::Byte, 0xF0, 0x0F);
        assert_ne!(r.flags & Z, 0);
        assert_eq!(r.affects, N | Z);

        let r = or(Width::Word, 0x8000_0000, 0x1);
        assert_ne!(r.flags & N, 0);

        let r = eor(Width::Byte, 0xFF, 0x0F);
        assert_eq!(r.value, 0xF0);
        assert_ne!(r.flags & N, 0);
    }

    #[test]
    fn bit_copies_top_operand_bits() {
        let r = bit(Width::Byte, 0x01, 0xC0);
        assert_ne!(r.flags & N, 0);
        assert_ne!(r.flags & V, 0);
        assert_ne!(r.flags & Z, 0);

        // Word width: V comes from bit 30.
        let r = bit(Width::Word, 0xFFFF_FFFF, 0x4000_0000);
        assert_eq!(r.flags & N, 0);
        assert_ne!(r.flags & V, 0);
        assert_eq!(r.flags & Z, 0);

        // Immediate form touches Z only.
        let r = bit_imm(Width::Byte, 0x01, 0xC0);
        assert_eq!(r.affects, Z);
    }

    #[test]
    fn shifts_move_bits_through_carry() {
        let r = asl(Width::Byte, 0x81);
        assert_eq!(r.value, 0x02);
        assert_ne!(r.flags & C, 0);

        let r = lsr(Width::Byte, 0x01);
        assert_eq!(r.value, 0x00);
        assert_ne!(r.flags & C, 0);
        assert_ne!(r.flags & Z, 0);

        let r = rol(Width::Byte, 0x80, true);
        assert_eq!(r.value, 0x01);
        assert_ne!(r.flags & C, 0);

        let r = ror(Width::Byte, 0x01, true);
        assert_eq!(r.value, 0x80);
        assert_ne!(r.flags & C, 0);
        assert_ne!(r.flags & N, 0);

        let r = asl(Width::Word, 0x8000_0001);
        assert_eq!(r.value, 0x0000_0002);
        assert_ne!(r.flags & C, 0);

        let r = ror(Width::Word, 0x0000_0000, true);
        assert_eq!(r.value, 0x8000_0000);
        assert_ne!(r.flags & N, 0);
    }

    #[test]
    fn inc_dec_wrap_without_carry() {
        let r = inc(Width::Byte, 0xFF);
        assert_eq!(r.value, 0x00);
        assert_ne!(r.flags & Z, 0);
        assert_eq!(r.affects & C, 0);

        let r = dec(Width::Byte, 0x00);
        assert_eq!(r.value, 0xFF);
        assert_ne!(r.flags & N, 0);
    }

    #[test]
    fn neg_not_set_nz_only() {
        let r = neg(Width::Byte, 0x01);
        assert_eq!(r.value, 0xFF);
        assert_ne!(r.flags & N, 0);
        assert_eq!(r.affects, N | Z);

        let r = neg(Width::Word, 0x0000_0000);
        assert_eq!(r.value, 0x0000_0000);
        assert_ne!(r.flags & Z, 0);

        let r = not(Width::Byte, 0x0F);
        assert_eq!(r.value, 0xF0);
        assert_ne!(r.flags & N, 0);

        let r = not(Width::Word, 0xFFFF_FFFF);
        assert_eq!(r.value, 0x0000_0000);
        assert_ne!(r.flags & Z, 0);
    }

    #[test]
    fn tsb_trb_test_before_modify() {
        let r = tsb(Width::Byte, 0x0F, 0xF0);
        assert_eq!(r.value, 0xFF);
        assert_ne!(r.flags & Z, 0); // no overlap before the set

        let r = trb(Width::Byte, 0x0F, 0xFF);
        assert_eq!(r.value, 0xF0);
        assert_eq!(r.flags & Z, 0); // overlap existed
    }

    #[test]
    fn rmb_smb_pick_single_bits() {
        assert_eq!(rmb(0xFF, 3).value, 0xF7);
        assert_eq!(smb(0x00, 7).value, 0x80);
        assert_eq!(rmb(0xFF, 0).affects, 0);
    }
}
