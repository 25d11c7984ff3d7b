//! Static opcode decode tables.
//!
//! One 256-entry table per operating mode, keyed by the opcode byte.
//! Unlisted opcodes decode to `None`; the sequencer runs them as
//! two-cycle no-ops and records the opcode byte for diagnostics.
//!
//! The legacy table carries the full documented set plus the extension
//! opcodes (ADD/SUB, RMB/SMB/BBR/BBS with a 3-bit which-field, WAI, STP,
//! JSR through indirect vectors). The extended table reuses the same
//! mnemonics over 32-bit operands but has no zero-page family and no
//! bit-indexed opcodes. Three oddities are part of the contract: legacy
//! `0x52` decodes as EOR zero-page and `0x92` as STA zp,y (the 65C02 has
//! indirect forms in both slots), and extended `0x8E` duplicates `0x86`
//! as STX absolute.

use crate::registers::CpuMode;

/// Operation selected by an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Adc,
    Add,
    And,
    Asl,
    Bbr,
    Bbs,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Bra,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Phx,
    Phy,
    Pla,
    Plp,
    Plx,
    Ply,
    Rmb,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Smb,
    Sta,
    Stp,
    Stx,
    Sty,
    Stz,
    Sub,
    Tax,
    Tay,
    Trb,
    Tsb,
    Tsx,
    Txa,
    Txs,
    Tya,
    Wai,
}

/// Addressing mode of an opcode.
///
/// The indirect family reads a pointer from memory; the `Ind*`/`*Ind`
/// naming mirrors the assembler forms `(a,x)`, `(a)`, `(a),y` and their
/// zero-page counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// Absolute: `a`.
    Abs,
    /// Absolute indexed indirect: `(a,x)`.
    AbsIndX,
    /// Absolute indirect indexed: `(a),y` (extended mode only).
    AbsIndY,
    /// Absolute indirect: `(a)`.
    AbsInd,
    /// Absolute indexed with X: `a,x`.
    AbsX,
    /// Absolute indexed with Y: `a,y`.
    AbsY,
    /// Accumulator.
    Acc,
    /// Immediate: `#`.
    Imm,
    /// Implied.
    Imp,
    /// Program-counter relative: `r`.
    Rel,
    /// Stack.
    Stack,
    /// Zero page: `zp`.
    Zp,
    /// Zero page indexed indirect: `(zp,x)`.
    ZpIndX,
    /// Zero page indirect indexed: `(zp),y`.
    ZpIndY,
    /// Zero page indirect: `(zp)`.
    ZpInd,
    /// Zero page indexed with X: `zp,x`.
    ZpX,
    /// Zero page indexed with Y: `zp,y`.
    ZpY,
}

/// One decode-table entry. `which` selects a bit position and is only
/// meaningful for RMB/SMB/BBR/BBS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeEntry {
    pub operation: Operation,
    pub mode: AddressMode,
    pub which: u8,
}

const fn op(operation: Operation, mode: AddressMode) -> Option<OpcodeEntry> {
    Some(OpcodeEntry {
        operation,
        mode,
        which: 0,
    })
}

const fn op_w(operation: Operation, mode: AddressMode, which: u8) -> Option<OpcodeEntry> {
    Some(OpcodeEntry {
        operation,
        mode,
        which,
    })
}

/// Look up an opcode in the table for the given mode.
#[must_use]
pub fn lookup(mode: CpuMode, opcode: u8) -> Option<&'static OpcodeEntry> {
    let table = match mode {
        CpuMode::Legacy => &LEGACY,
        CpuMode::Extended => &EXTENDED,
    };
    table[opcode as usize].as_ref()
}

static LEGACY: [Option<OpcodeEntry>; 256] = build_legacy();
static EXTENDED: [Option<OpcodeEntry>; 256] = build_extended();

#[allow(clippy::too_many_lines)] // One line per opcode; splitting would obscure the table.
#[allow(clippy::enum_glob_use)] // Bare variant names keep the table legible.
const fn build_legacy() -> [Option<OpcodeEntry>; 256] {
    use AddressMode::*;
    use Operation::*;

    let mut t: [Option<OpcodeEntry>; 256] = [None; 256];

    t[0x00] = op(Brk, Stack);
    t[0x01] = op(Ora, ZpIndX);
    t[0x02] = op(Add, ZpIndX);
    t[0x04] = op(Tsb, Zp);
    t[0x05] = op(Ora, Zp);
    t[0x06] = op(Asl, Zp);
    t[0x07] = op_w(Rmb, Zp, 0);
    t[0x08] = op(Php, Stack);
    t[0x09] = op(Ora, Imm);
    t[0x0A] = op(Asl, Acc);
    t[0x0C] = op(Tsb, Abs);
    t[0x0D] = op(Ora, Abs);
    t[0x0E] = op(Asl, Abs);
    t[0x0F] = op_w(Bbr, Rel, 0);

    t[0x10] = op(Bpl, Rel);
    t[0x11] = op(Ora, ZpIndY);
    t[0x12] = op(Ora, ZpInd);
    t[0x14] = op(Trb, Zp);
    t[0x15] = op(Ora, ZpX);
    t[0x16] = op(Asl, ZpX);
    t[0x17] = op_w(Rmb, Zp, 1);
    t[0x18] = op(Clc, Imp);
    t[0x19] = op(Ora, AbsY);
    t[0x1A] = op(Inc, Acc);
    t[0x1C] = op(Trb, Abs);
    t[0x1D] = op(Ora, AbsX);
    t[0x1E] = op(Asl, AbsX);
    t[0x1F] = op_w(Bbr, Rel, 1);

    t[0x20] = op(Jsr, Abs);
    t[0x21] = op(And, ZpIndX);
    t[0x22] = op(Jsr, AbsInd);
    t[0x23] = op(Sub, ZpIndX);
    t[0x24] = op(Bit, Zp);
    t[0x25] = op(And, Zp);
    t[0x26] = op(Rol, Zp);
    t[0x27] = op_w(Rmb, Zp, 2);
    t[0x28] = op(Plp, Stack);
    t[0x29] = op(And, Imm);
    t[0x2A] = op(Rol, Acc);
    t[0x2C] = op(Bit, Abs);
    t[0x2D] = op(And, Abs);
    t[0x2E] = op(Rol, Abs);
    t[0x2F] = op_w(Bbr, Rel, 2);

    t[0x30] = op(Bmi, Rel);
    t[0x31] = op(And, ZpIndY);
    t[0x32] = op(And, ZpInd);
    t[0x34] = op(Bit, ZpX);
    t[0x35] = op(And, ZpX);
    t[0x36] = op(Rol, ZpX);
    t[0x37] = op_w(Rmb, Zp, 3);
    t[0x38] = op(Sec, Imp);
    t[0x39] = op(And, AbsY);
    t[0x3A] = op(Dec, Acc);
    t[0x3C] = op(Bit, AbsX);
    t[0x3D] = op(And, AbsX);
    t[0x3E] = op(Rol, AbsX);
    t[0x3F] = op_w(Bbr, Rel, 3);

    t[0x40] = op(Rti, Stack);
    t[0x41] = op(Eor, ZpIndX);
    t[0x45] = op(Eor, Zp);
    t[0x46] = op(Lsr, Zp);
    t[0x47] = op_w(Rmb, Zp, 4);
    t[0x48] = op(Pha, Stack);
    t[0x49] = op(Eor, Imm);
    t[0x4A] = op(Lsr, Acc);
    t[0x4C] = op(Jmp, Abs);
    t[0x4D] = op(Eor, Abs);
    t[0x4E] = op(Lsr, Abs);
    t[0x4F] = op_w(Bbr, Rel, 4);

    t[0x50] = op(Bvc, Rel);
    t[0x51] = op(Eor, ZpIndY);
    // The 65C02 has EOR (zp) here; this core decodes plain zero page.
    t[0x52] = op(Eor, Zp);
    t[0x55] = op(Eor, ZpX);
    t[0x56] = op(Lsr, ZpX);
    t[0x57] = op_w(Rmb, Zp, 5);
    t[0x58] = op(Cli, Imp);
    t[0x59] = op(Eor, AbsY);
    t[0x5A] = op(Phy, Stack);
    t[0x5C] = op(Jsr, AbsIndX);
    t[0x5D] = op(Eor, AbsX);
    t[0x5E] = op(Lsr, AbsX);
    t[0x5F] = op_w(Bbr, Rel, 5);

    t[0x60] = op(Rts, Stack);
    t[0x61] = op(Adc, ZpIndX);
    t[0x64] = op(Stz, Zp);
    t[0x65] = op(Adc, Zp);
    t[0x66] = op(Ror, Zp);
    t[0x67] = op_w(Rmb, Zp, 6);
    t[0x68] = op(Pla, Stack);
    t[0x69] = op(Adc, Imm);
    t[0x6A] = op(Ror, Acc);
    t[0x6C] = op(Jmp, AbsInd);
    t[0x6D] = op(Adc, Abs);
    t[0x6E] = op(Ror, Abs);
    t[0x6F] = op_w(Bbr, Rel, 6);

    t[0x70] = op(Bvs, Rel);
    t[0x71] = op(Adc, ZpIndY);
    t[0x72] = op(Adc, ZpInd);
    t[0x74] = op(Stz, ZpX);
    t[0x75] = op(Adc, ZpX);
    t[0x76] = op(Ror, ZpX);
    t[0x77] = op_w(Rmb, Zp, 7);
    t[0x78] = op(Sei, Imp);
    t[0x79] = op(Adc, AbsY);
    t[0x7A] = op(Ply, Stack);
    t[0x7C] = op(Jmp, AbsIndX);
    t[0x7D] = op(Adc, AbsX);
    t[0x7E] = op(Ror, AbsX);
    t[0x7F] = op_w(Bbr, Rel, 7);

    t[0x80] = op(Bra, Rel);
    t[0x81] = op(Sta, ZpIndX);
    t[0x84] = op(Sty, Zp);
    t[0x85] = op(Sta, Zp);
    t[0x86] = op(Stx, Zp);
    t[0x87] = op_w(Smb, Zp, 0);
    t[0x88] = op(Dey, Imp);
    t[0x89] = op(Bit, Imm);
    t[0x8A] = op(Txa, Imp);
    t[0x8C] = op(Sty, Abs);
    t[0x8D] = op(Sta, Abs);
    t[0x8E] = op(Stx, Abs);
    t[0x8F] = op_w(Bbs, Rel, 0);

    t[0x90] = op(Bcc, Rel);
    t[0x91] = op(Sta, ZpIndY);
    // The 65C02 has STA (zp) here; this core decodes zp,y.
    t[0x92] = op(Sta, ZpY);
    t[0x94] = op(Sty, ZpX);
    t[0x95] = op(Sta, ZpX);
    t[0x96] = op(Stx, ZpY);
    t[0x97] = op_w(Smb, Zp, 1);
    t[0x98] = op(Tya, Imp);
    t[0x99] = op(Sta, AbsY);
    t[0x9A] = op(Txs, Imp);
    t[0x9C] = op(Stz, Abs);
    t[0x9D] = op(Sta, AbsX);
    t[0x9E] = op(Stz, AbsX);
    t[0x9F] = op_w(Bbs, Rel, 1);

    t[0xA0] = op(Ldy, Imm);
    t[0xA1] = op(Lda, ZpIndX);
    t[0xA2] = op(Ldx, Imm);
    t[0xA4] = op(Ldy, Zp);
    t[0xA5] = op(Lda, Zp);
    t[0xA6] = op(Ldx, Zp);
    t[0xA7] = op_w(Smb, Zp, 2);
    t[0xA8] = op(Tay, Imp);
    t[0xA9] = op(Lda, Imm);
    t[0xAA] = op(Tax, Imp);
    t[0xAC] = op(Ldy, Abs);
    t[0xAD] = op(Lda, Abs);
    t[0xAE] = op(Ldx, Abs);
    t[0xAF] = op_w(Bbs, Rel, 2);

    t[0xB0] = op(Bcs, Rel);
    t[0xB1] = op(Lda, ZpIndY);
    t[0xB2] = op(Lda, ZpInd);
    t[0xB4] = op(Ldy, ZpX);
    t[0xB5] = op(Lda, ZpX);
    t[0xB6] = op(Ldx, ZpY);
    t[0xB7] = op_w(Smb, Zp, 3);
    t[0xB8] = op(Clv, Imp);
    t[0xB9] = op(Lda, AbsY);
    t[0xBA] = op(Tsx, Imp);
    t[0xBC] = op(Ldy, AbsX);
    t[0xBD] = op(Lda, AbsX);
    t[0xBE] = op(Ldx, AbsY);
    t[0xBF] = op_w(Bbs, Rel, 3);

    t[0xC0] = op(Cpy, Imm);
    t[0xC1] = op(Cmp, ZpIndX);
    t[0xC4] = op(Cpy, Zp);
    t[0xC5] = op(Cmp, Zp);
    t[0xC6] = op(Dec, Zp);
    t[0xC7] = op_w(Smb, Zp, 4);
    t[0xC8] = op(Iny, Imp);
    t[0xC9] = op(Cmp, Imm);
    t[0xCA] = op(Dex, Imp);
    t[0xCB] = op(Wai, Imp);
    t[0xCC] = op(Cpy, Abs);
    t[0xCD] = op(Cmp, Abs);
    t[0xCE] = op(Dec, Abs);
    t[0xCF] = op_w(Bbs, Rel, 4);

    t[0xD0] = op(Bne, Rel);
    t[0xD1] = op(Cmp, ZpIndY);
    t[0xD2] = op(Cmp, ZpInd);
    t[0xD5] = op(Cmp, ZpX);
    t[0xD6] = op(Dec, ZpX);
    t[0xD7] = op_w(Smb, Zp, 5);
    t[0xD8] = op(Cld, Imp);
    t[0xD9] = op(Cmp, AbsY);
    t[0xDA] = op(Phx, Stack);
    t[0xDB] = op(Stp, Imp);
    t[0xDD] = op(Cmp, AbsX);
    t[0xDE] = op(Dec, AbsX);
    t[0xDF] = op_w(Bbs, Rel, 5);

    t[0xE0] = op(Cpx, Imm);
    t[0xE1] = op(Sbc, ZpIndX);
    t[0xE4] = op(Cpx, Zp);
    t[0xE5] = op(Sbc, Zp);
    t[0xE6] = op(Inc, Zp);
    t[0xE7] = op_w(Smb, Zp, 6);
    t[0xE8] = op(Inx, Imp);
    t[0xE9] = op(Sbc, Imm);
    t[0xEA] = op(Nop, Imp);
    t[0xEC] = op(Cpx, Abs);
    t[0xED] = op(Sbc, Abs);
    t[0xEE] = op(Inc, Abs);
    t[0xEF] = op_w(Bbs, Rel, 6);

    t[0xF0] = op(Beq, Rel);
    t[0xF1] = op(Sbc, ZpIndY);
    t[0xF2] = op(Sbc, ZpInd);
    t[0xF5] = op(Sbc, ZpX);
    t[0xF6] = op(Inc, ZpX);
    t[0xF7] = op_w(Smb, Zp, 7);
    t[0xF8] = op(Sed, Imp);
    t[0xF9] = op(Sbc, AbsY);
    t[0xFA] = op(Plx, Stack);
    t[0xFD] = op(Sbc, AbsX);
    t[0xFE] = op(Inc, AbsX);
    t[0xFF] = op_w(Bbs, Rel, 7);

    t
}

#[allow(clippy::too_many_lines)] // One line per opcode; splitting would obscure the table.
#[allow(clippy::enum_glob_use)] // Bare variant names keep the table legible.
const fn build_extended() -> [Option<OpcodeEntry>; 256] {
    use AddressMode::*;
    use Operation::*;

    let mut t: [Option<OpcodeEntry>; 256] = [None; 256];

    t[0x00] = op(Brk, Stack);
    t[0x01] = op(Ora, AbsIndX);
    t[0x06] = op(Asl, Abs);
    t[0x08] = op(Php, Stack);
    t[0x09] = op(Ora, Imm);
    t[0x0A] = op(Asl, Acc);
    t[0x0C] = op(Tsb, Abs);
    t[0x0D] = op(Ora, Abs);

    t[0x10] = op(Bpl, Rel);
    t[0x11] = op(Ora, AbsIndY);
    t[0x12] = op(Ora, AbsInd);
    t[0x16] = op(Asl, AbsX);
    t[0x18] = op(Clc, Imp);
    t[0x19] = op(Ora, AbsY);
    t[0x1A] = op(Inc, Acc);
    t[0x1C] = op(Trb, Abs);
    t[0x1D] = op(Ora, AbsX);

    t[0x20] = op(Jsr, Abs);
    t[0x21] = op(And, AbsIndX);
    t[0x22] = op(Jsr, AbsInd);
    t[0x26] = op(Rol, Abs);
    t[0x28] = op(Plp, Stack);
    t[0x29] = op(And, Imm);
    t[0x2A] = op(Rol, Acc);
    t[0x2C] = op(Bit, Abs);
    t[0x2D] = op(And, Abs);

    t[0x30] = op(Bmi, Rel);
    t[0x31] = op(And, AbsIndY);
    t[0x32] = op(And, AbsInd);
    t[0x36] = op(Rol, AbsX);
    t[0x38] = op(Sec, Imp);
    t[0x39] = op(And, AbsY);
    t[0x3A] = op(Dec, Acc);
    t[0x3C] = op(Bit, AbsX);
    t[0x3D] = op(And, AbsX);

    t[0x40] = op(Rti, Stack);
    t[0x41] = op(Eor, AbsIndX);
    t[0x46] = op(Lsr, Abs);
    t[0x48] = op(Pha, Stack);
    t[0x49] = op(Eor, Imm);
    t[0x4A] = op(Lsr, Acc);
    t[0x4C] = op(Jmp, Abs);
    t[0x4D] = op(Eor, Abs);

    t[0x50] = op(Bvc, Rel);
    t[0x51] = op(Eor, AbsIndY);
    t[0x52] = op(Eor, AbsInd);
    t[0x56] = op(Lsr, AbsX);
    t[0x58] = op(Cli, Imp);
    t[0x59] = op(Eor, AbsY);
    t[0x5A] = op(Phy, Stack);
    t[0x5C] = op(Jsr, AbsIndX);
    t[0x5D] = op(Eor, AbsX);

    t[0x60] = op(Rts, Stack);
    t[0x61] = op(Adc, AbsIndX);
    t[0x66] = op(Ror, Abs);
    t[0x68] = op(Pla, Stack);
    t[0x69] = op(Adc, Imm);
    t[0x6A] = op(Ror, Acc);
    t[0x6C] = op(Jmp, AbsInd);
    t[0x6D] = op(Adc, Abs);

    t[0x70] = op(Bvs, Rel);
    t[0x71] = op(Adc, AbsIndY);
    t[0x72] = op(Adc, AbsInd);
    t[0x76] = op(Ror, AbsX);
    t[0x78] = op(Sei, Imp);
    t[0x79] = op(Adc, AbsY);
    t[0x7A] = op(Ply, Stack);
    t[0x7C] = op(Jmp, AbsIndX);
    t[0x7D] = op(Adc, AbsX);

    t[0x80] = op(Bra, Rel);
    t[0x81] = op(Sta, AbsIndX);
    t[0x86] = op(Stx, Abs);
    t[0x88] = op(Dey, Imp);
    t[0x89] = op(Bit, Imm);
    t[0x8A] = op(Txa, Imp);
    t[0x8C] = op(Sty, Abs);
    t[0x8D] = op(Sta, Abs);
    // STX absolute occupies both 0x86 and 0x8E.
    t[0x8E] = op(Stx, Abs);

    t[0x90] = op(Bcc, Rel);
    t[0x91] = op(Sta, AbsIndY);
    t[0x92] = op(Sta, AbsInd);
    t[0x96] = op(Stz, AbsX);
    t[0x98] = op(Tya, Imp);
    t[0x99] = op(Sta, AbsY);
    t[0x9A] = op(Txs, Imp);
    t[0x9C] = op(Sty, AbsX);
    t[0x9D] = op(Sta, AbsX);
    t[0x9E] = op(Stx, AbsY);

    t[0xA0] = op(Ldy, Imm);
    t[0xA1] = op(Lda, AbsIndX);
    t[0xA2] = op(Ldx, Imm);
    t[0xA8] = op(Tay, Imp);
    t[0xA9] = op(Lda, Imm);
    t[0xAA] = op(Tax, Imp);
    t[0xAC] = op(Ldy, Abs);
    t[0xAD] = op(Lda, Abs);
    t[0xAE] = op(Ldx, Abs);

    t[0xB0] = op(Bcs, Rel);
    t[0xB1] = op(Lda, AbsIndY);
    t[0xB2] = op(Lda, AbsInd);
    t[0xB8] = op(Clv, Imp);
    t[0xB9] = op(Lda, AbsY);
    t[0xBA] = op(Tsx, Imp);
    t[0xBC] = op(Ldy, AbsX);
    t[0xBD] = op(Lda, AbsX);
    t[0xBE] = op(Ldx, AbsY);

    t[0xC0] = op(Cpy, Imm);
    t[0xC1] = op(Cmp, AbsIndX);
    t[0xC6] = op(Dec, Abs);
    t[0xC8] = op(Iny, Imp);
    t[0xC9] = op(Cmp, Imm);
    t[0xCA] = op(Dex, Imp);
    t[0xCC] = op(Cpy, Abs);
    t[0xCD] = op(Cmp, Abs);

    t[0xD0] = op(Bne, Rel);
    t[0xD1] = op(Cmp, AbsIndY);
    t[0xD2] = op(Cmp, AbsInd);
    t[0xD6] = op(Dec, AbsX);
    t[0xD8] = op(Cld, Imp);
    t[0xD9] = op(Cmp, AbsY);
    t[0xDA] = op(Phx, Stack);
    t[0xDD] = op(Cmp, AbsX);

    t[0xE0] = op(Cpx, Imm);
    t[0xE1] = op(Sbc, AbsIndX);
    t[0xE6] = op(Inc, Abs);
    t[0xE8] = op(Inx, Imp);
    t[0xE9] = op(Sbc, Imm);
    t[0xEA] = op(Nop, Imp);
    t[0xEC] = op(Cpx, Abs);
    t[0xED] = op(Sbc, Abs);

    t[0xF0] = op(Beq, Rel);
    t[0xF1] = op(Sbc, AbsIndY);
    t[0xF2] = op(Sbc, AbsInd);
    t[0xF6] = op(Inc, AbsX);
    t[0xF8] = op(Sed, Imp);
    t[0xF9] = op(Sbc, AbsY);
    t[0xFA] = op(Plx, Stack);
    t[0xFD] = op(Sbc, AbsX);

    t
}
