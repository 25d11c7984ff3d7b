//! CPU register file for both operating modes.
//!
//! The hardware keeps two parallel register banks and a mode flag; here
//! the banks are a tagged union, so "exactly one live register set" holds
//! by construction. Accessors are width-generic: reads zero-extend to
//! `u32`, writes truncate to the live width.

use crate::flags::Status;

/// Operating mode: which register bank is live and how wide operands are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuMode {
    /// 8-bit registers, 16-bit addresses, classic instruction set.
    Legacy,
    /// 32-bit registers and addresses, reduced addressing repertoire.
    Extended,
}

impl CpuMode {
    /// Operand width for this mode.
    #[must_use]
    pub const fn width(self) -> Width {
        match self {
            CpuMode::Legacy => Width::Byte,
            CpuMode::Extended => Width::Word,
        }
    }

    /// Mask for addresses issued on the bus.
    #[must_use]
    pub const fn addr_mask(self) -> u32 {
        match self {
            CpuMode::Legacy => 0xFFFF,
            CpuMode::Extended => 0xFFFF_FFFF,
        }
    }

    /// Bytes in an absolute address operand.
    #[must_use]
    pub const fn addr_bytes(self) -> u8 {
        match self {
            CpuMode::Legacy => 2,
            CpuMode::Extended => 4,
        }
    }

    /// Bytes in a program-counter-relative branch offset.
    #[must_use]
    pub const fn rel_bytes(self) -> u8 {
        match self {
            CpuMode::Legacy => 1,
            CpuMode::Extended => 3,
        }
    }

    /// Mode name for observability queries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CpuMode::Legacy => "legacy",
            CpuMode::Extended => "extended",
        }
    }
}

/// Operand width the ALU and flag unit work at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// 8-bit operands (legacy mode).
    Byte,
    /// 32-bit operands (extended mode).
    Word,
}

impl Width {
    /// All-ones mask at this width.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Width::Byte => 0xFF,
            Width::Word => 0xFFFF_FFFF,
        }
    }

    /// The most significant bit at this width.
    #[must_use]
    pub const fn msb(self) -> u32 {
        match self {
            Width::Byte => 0x80,
            Width::Word => 0x8000_0000,
        }
    }

    /// The bit BIT copies into V: one below the MSB.
    #[must_use]
    pub const fn v_bit(self) -> u32 {
        self.msb() >> 1
    }

    /// Bytes per operand at this width.
    #[must_use]
    pub const fn bytes(self) -> u8 {
        match self {
            Width::Byte => 1,
            Width::Word => 4,
        }
    }
}

/// Legacy-mode register bank.
///
/// - A, X, Y: 8-bit
/// - PC, SP: 16-bit. SP is a free pointer, not the classic S + $0100
///   scheme: the stack may live anywhere in the 64 KiB space.
/// - P: 8-bit processor status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyRegisters {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Program counter.
    pub pc: u16,
    /// Stack pointer (points at the most recently pushed byte).
    pub sp: u16,
    /// Processor status flags.
    pub p: Status,
}

/// Extended-mode register bank: every register 32 bits wide except the
/// 8-bit status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedRegisters {
    /// Accumulator.
    pub a: u32,
    /// X index register.
    pub x: u32,
    /// Y index register.
    pub y: u32,
    /// Program counter.
    pub pc: u32,
    /// Stack pointer (points at the most recently pushed byte).
    pub sp: u32,
    /// Processor status flags.
    pub p: Status,
}

/// The live register set, tagged by mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterFile {
    /// Legacy bank is live.
    Legacy(LegacyRegisters),
    /// Extended bank is live.
    Extended(ExtendedRegisters),
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::legacy()
    }
}

impl RegisterFile {
    /// Legacy bank in reset state: A/X/Y zero, SP at $0200 so the first
    /// pushed byte lands at $01FF, status in the reset pattern. PC is
    /// loaded from the reset vector by the sequencer.
    #[must_use]
    pub const fn legacy() -> Self {
        Self::Legacy(LegacyRegisters {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0x0200,
            p: Status::new(),
        })
    }

    /// Extended bank with everything zeroed except the status reset
    /// pattern. Reached through `switch_mode`, never through reset.
    #[must_use]
    pub const fn extended() -> Self {
        Self::Extended(ExtendedRegisters {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0,
            p: Status::new(),
        })
    }

    /// Which bank is live.
    #[must_use]
    pub const fn mode(&self) -> CpuMode {
        match self {
            RegisterFile::Legacy(_) => CpuMode::Legacy,
            RegisterFile::Extended(_) => CpuMode::Extended,
        }
    }

    /// Operand width of the live bank.
    #[must_use]
    pub const fn width(&self) -> Width {
        self.mode().width()
    }

    /// Address mask of the live bank.
    #[must_use]
    pub const fn addr_mask(&self) -> u32 {
        self.mode().addr_mask()
    }

    /// Accumulator, zero-extended.
    #[must_use]
    pub const fn a(&self) -> u32 {
        match self {
            RegisterFile::Legacy(r) => r.a as u32,
            RegisterFile::Extended(r) => r.a,
        }
    }

    /// Write the accumulator, truncating to the live width.
    pub fn set_a(&mut self, value: u32) {
        match self {
            RegisterFile::Legacy(r) => r.a = value as u8,
            RegisterFile::Extended(r) => r.a = value,
        }
    }

    /// X index register, zero-extended.
    #[must_use]
    pub const fn x(&self) -> u32 {
        match self {
            RegisterFile::Legacy(r) => r.x as u32,
            RegisterFile::Extended(r) => r.x,
        }
    }

    /// Write X, truncating to the live width.
    pub fn set_x(&mut self, value: u32) {
        match self {
            RegisterFile::Legacy(r) => r.x = value as u8,
            RegisterFile::Extended(r) => r.x = value,
        }
    }

    /// Y index register, zero-extended.
    #[must_use]
    pub const fn y(&self) -> u32 {
        match self {
            RegisterFile::Legacy(r) => r.y as u32,
            RegisterFile::Extended(r) => r.y,
        }
    }

    /// Write Y, truncating to the live width.
    pub fn set_y(&mut self, value: u32) {
        match self {
            RegisterFile::Legacy(r) => r.y = value as u8,
            RegisterFile::Extended(r) => r.y = value,
        }
    }

    /// Program counter, zero-extended.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        match self {
            RegisterFile::Legacy(r) => r.pc as u32,
            RegisterFile::Extended(r) => r.pc,
        }
    }

    /// Write the program counter, truncating to the address width.
    pub fn set_pc(&mut self, value: u32) {
        match self {
            RegisterFile::Legacy(r) => r.pc = value as u16,
            RegisterFile::Extended(r) => r.pc = value,
        }
    }

    /// Advance the program counter, wrapping in the address width.
    pub fn advance_pc(&mut self, count: u32) {
        match self {
            RegisterFile::Legacy(r) => r.pc = r.pc.wrapping_add(count as u16),
            RegisterFile::Extended(r) => r.pc = r.pc.wrapping_add(count),
        }
    }

    /// Stack pointer, zero-extended.
    #[must_use]
    pub const fn sp(&self) -> u32 {
        match self {
            RegisterFile::Legacy(r) => r.sp as u32,
            RegisterFile::Extended(r) => r.sp,
        }
    }

    /// Write the stack pointer, truncating to the address width.
    pub fn set_sp(&mut self, value: u32) {
        match self {
            RegisterFile::Legacy(r) => r.sp = value as u16,
            RegisterFile::Extended(r) => r.sp = value,
        }
    }

    /// Processor status.
    #[must_use]
    pub const fn p(&self) -> Status {
        match self {
            RegisterFile::Legacy(r) => r.p,
            RegisterFile::Extended(r) => r.p,
        }
    }

    /// Mutable processor status.
    pub fn p_mut(&mut self) -> &mut Status {
        match self {
            RegisterFile::Legacy(r) => &mut r.p,
            RegisterFile::Extended(r) => &mut r.p,
        }
    }

    /// Switch the live bank, carrying A/X/Y/PC/SP across zero-extended or
    /// truncated and copying the status byte. No-op if already in `mode`.
    pub fn switch_mode(&mut self, mode: CpuMode) {
        if self.mode() == mode {
            return;
        }
        let (a, x, y, pc, sp, p) =
            (self.a(), self.x(), self.y(), self.pc(), self.sp(), self.p());
        *self = match mode {
            CpuMode::Legacy => RegisterFile::Legacy(LegacyRegisters {
                a: a as u8,
                x: x as u8,
                y: y as u8,
                pc: pc as u16,
                sp: sp as u16,
                p,
            }),
            CpuMode::Extended => RegisterFile::Extended(ExtendedRegisters {
                a,
                x,
                y,
                pc,
                sp,
                p,
            }),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{C, I, U};

    #[test]
    fn accessors_truncate_to_live_width() {
        let mut regs = RegisterFile::legacy();
        assert_eq!(regs.sp(), 0x0200);
        regs.set_a(0x1234_5678);
        assert_eq!(regs.a(), 0x78);

        regs.switch_mode(CpuMode::Extended);
        regs.set_a(0x1234_5678);
        assert_eq!(regs.a(), 0x1234_5678);
    }

    #[test]
    fn pc_wraps_in_the_address_width() {
        let mut regs = RegisterFile::legacy();
        regs.set_pc(0xFFFF);
        regs.advance_pc(2);
        assert_eq!(regs.pc(), 0x0001);

        regs.switch_mode(CpuMode::Extended);
        regs.set_pc(0xFFFF_FFFF);
        regs.advance_pc(2);
        assert_eq!(regs.pc(), 0x0000_0001);
    }

    #[test]
    fn mode_switch_carries_registers_and_status() {
        let mut regs = RegisterFile::legacy();
        regs.set_a(0x42);
        regs.set_pc(0x8000);
        regs.p_mut().set(C);

        regs.switch_mode(CpuMode::Extended);
        assert_eq!(regs.mode(), CpuMode::Extended);
        assert_eq!(regs.a(), 0x42);
        assert_eq!(regs.pc(), 0x8000);
        assert!(regs.p().is_set(C));
        assert!(regs.p().is_set(U));
        assert!(regs.p().is_set(I));

        regs.set_a(0xABCD_0042);
        regs.switch_mode(CpuMode::Legacy);
        assert_eq!(regs.a(), 0x42);
    }
}
