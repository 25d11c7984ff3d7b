//! 65832 CPU implementation.
//!
//! Cycle-accurate emulation where each `tick()` advances exactly one
//! clock cycle and performs at most one bus access. The sequencer walks
//! a small set of states (fetch, resolve, execute, write-back and the
//! control-flow paths) and burns one cycle per operand byte, data byte
//! or internal operation, so instruction timings follow from byte
//! counts instead of a per-opcode table and scale with the operating
//! mode. All memory traffic goes through a [`BusArbiter`]; a device
//! holding a transfer open stalls the instruction in place while the
//! cycle counter keeps running.

use emu_core::{Bus, Cpu, Observable, Value};

use crate::alu;
use crate::arbiter::BusArbiter;
use crate::flags::{B, C, D, I, N, Status, U, V, Z};
use crate::opcodes::{self, AddressMode, Operation};
use crate::registers::{CpuMode, RegisterFile};

/// NMI vector. Vectors always live in the 16-bit space and hold 16-bit
/// entry points, in both operating modes.
const VECTOR_NMI: u32 = 0xFFFA;
/// Reset vector.
const VECTOR_RESET: u32 = 0xFFFC;
/// IRQ and BRK vector.
const VECTOR_IRQ: u32 = 0xFFFE;

/// Internal state tracking instruction execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Stepped reset sequence: internal cycles, then the vector read.
    Reset,
    /// Fetching the opcode byte. Interrupts are polled here.
    FetchOpcode,
    /// Fetching operand bytes and chasing indirect pointers.
    ResolveAddress,
    /// Data reads, stack traffic and internal computation cycles.
    Execute,
    /// Write cycles of stores and read-modify-write instructions.
    WriteBack,
    /// PC redirection and stack traffic of branches, jumps, calls and
    /// returns.
    BranchOrJump,
    /// Pushing state and reading the vector for BRK, IRQ and NMI.
    InterruptEntry,
    /// STP stopped the clock, or WAI is holding for an interrupt.
    Halted,
}

impl State {
    fn as_str(self) -> &'static str {
        match self {
            State::Reset => "reset",
            State::FetchOpcode => "fetch-opcode",
            State::ResolveAddress => "resolve-address",
            State::Execute => "execute",
            State::WriteBack => "write-back",
            State::BranchOrJump => "branch-or-jump",
            State::InterruptEntry => "interrupt-entry",
            State::Halted => "halted",
        }
    }
}

/// Which vector an interrupt entry sequence reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptKind {
    Brk,
    Irq,
    Nmi,
}

/// Execution shape of an instruction. Decided once after the opcode
/// fetch and used to route the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpClass {
    Read,
    Store,
    Rmw,
    Push,
    Pop,
    Implied,
    Branch,
    BranchOnBit,
    Jump,
    Call,
    Return,
    Break,
    Halt,
}

fn classify(operation: Operation, mode: AddressMode) -> OpClass {
    use Operation::*;
    match operation {
        Brk => OpClass::Break,
        Wai | Stp => OpClass::Halt,
        Jmp => OpClass::Jump,
        Jsr => OpClass::Call,
        Rts | Rti => OpClass::Return,
        Bbr | Bbs => OpClass::BranchOnBit,
        Bra | Bpl | Bmi | Bvc | Bvs | Bcc | Bcs | Bne | Beq => OpClass::Branch,
        Pha | Phx | Phy | Php => OpClass::Push,
        Pla | Plx | Ply | Plp => OpClass::Pop,
        Sta | Stx | Sty | Stz => OpClass::Store,
        Asl | Lsr | Rol | Ror | Inc | Dec | Tsb | Trb | Rmb | Smb
            if mode != AddressMode::Acc =>
        {
            OpClass::Rmw
        }
        _ if matches!(mode, AddressMode::Imp | AddressMode::Acc) => OpClass::Implied,
        _ => OpClass::Read,
    }
}

/// The 65832 CPU.
///
/// One core executes both instruction sets: the live register bank
/// decides operand widths, address masks and operand lengths, and the
/// shared sequencer scales with them. Each `tick()` advances exactly
/// one cycle.
#[derive(Debug)]
pub struct Cpu65832 {
    /// CPU registers. The live bank is the operating mode.
    pub regs: RegisterFile,

    /// Current execution state.
    state: State,

    /// Current opcode being executed.
    opcode: u8,

    /// Decoded operation. Undefined opcodes decode to NOP.
    operation: Operation,

    /// Decoded addressing mode.
    addr_mode: AddressMode,

    /// Bit position for RMB/SMB/BBR/BBS.
    which: u8,

    /// Current cycle within the instruction (0 = opcode fetch).
    cycle: u8,

    /// Byte counter within the current state.
    step: u8,

    /// Effective address for the data phase.
    addr: u32,

    /// Pointer being chased by an indirect mode.
    pointer: u32,

    /// Operand and data assembly register.
    data: u32,

    /// Value staged for store and write-back cycles.
    staged: u32,

    /// Which interrupt sequence is being entered.
    interrupt_kind: InterruptKind,

    /// NMI edge detector - true when the NMI line went low.
    nmi_pending: bool,

    /// IRQ latch - true while an interrupt request is outstanding.
    irq_pending: bool,

    /// True when Halted came from WAI rather than STP.
    waiting: bool,

    /// Serialises bus traffic and carries peripheral wait states.
    arbiter: BusArbiter,

    /// Total cycles executed, stalls included.
    total_cycles: u64,

    /// Cycles the most recently completed instruction took.
    last_instruction_cycles: u8,

    /// Undefined opcodes fetched so far.
    undefined_count: u64,

    /// Most recent undefined opcode, if any was fetched.
    last_undefined: Option<u8>,
}

impl Default for Cpu65832 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu65832 {
    /// Create a new CPU in legacy mode at an instruction boundary.
    ///
    /// PC is zero; call [`Cpu::reset`] to run the reset sequence and
    /// load it from the vector instead.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: RegisterFile::legacy(),
            state: State::FetchOpcode,
            opcode: 0,
            operation: Operation::Nop,
            addr_mode: AddressMode::Imp,
            which: 0,
            cycle: 0,
            step: 0,
            addr: 0,
            pointer: 0,
            data: 0,
            staged: 0,
            interrupt_kind: InterruptKind::Brk,
            nmi_pending: false,
            irq_pending: false,
            waiting: false,
            arbiter: BusArbiter::new(),
            total_cycles: 0,
            last_instruction_cycles: 0,
            undefined_count: 0,
            last_undefined: None,
        }
    }

    /// Operating mode of the live register bank.
    #[must_use]
    pub fn mode(&self) -> CpuMode {
        self.regs.mode()
    }

    /// Switch operating mode, carrying registers across zero-extended
    /// or truncated. No opcode does this; it is an external control,
    /// only meaningful at an instruction boundary.
    pub fn set_mode(&mut self, mode: CpuMode) {
        self.regs.switch_mode(mode);
    }

    /// True at an instruction boundary: the next tick fetches an
    /// opcode.
    #[must_use]
    pub fn is_instruction_complete(&self) -> bool {
        self.state == State::FetchOpcode && self.cycle == 0
    }

    /// Cycles the most recently completed instruction consumed.
    #[must_use]
    pub fn instruction_cycles(&self) -> u8 {
        self.last_instruction_cycles
    }

    /// Undefined opcodes fetched since power-on.
    #[must_use]
    pub fn undefined_opcode_count(&self) -> u64 {
        self.undefined_count
    }

    /// Execute one complete instruction, ticking through stalls.
    /// Returns the number of cycles consumed.
    ///
    /// Only available in test builds.
    #[cfg(feature = "test-utils")]
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let mut ticks = 0u32;
        loop {
            self.tick(bus);
            ticks += 1;
            if self.is_instruction_complete() || self.state == State::Halted {
                return ticks;
            }
            assert!(ticks < 200, "instruction did not complete");
        }
    }

    // ========================================================================
    // Cycle bookkeeping
    // ========================================================================

    /// The current cycle completed and the instruction continues.
    fn next_cycle(&mut self) {
        self.cycle += 1;
    }

    /// The current cycle completed the instruction.
    fn finish(&mut self) {
        self.last_instruction_cycles = self.cycle + 1;
        self.state = State::FetchOpcode;
        self.cycle = 0;
        self.step = 0;
        self.data = 0;
        self.pointer = 0;
    }

    /// Execute one CPU cycle.
    fn execute_cycle<B: Bus>(&mut self, bus: &mut B) {
        match self.state {
            State::Reset => self.reset_cycle(bus),
            State::FetchOpcode => self.fetch_cycle(bus),
            State::ResolveAddress => self.resolve_cycle(bus),
            State::Execute => self.execute_op_cycle(bus),
            State::WriteBack => self.write_back_cycle(bus),
            State::BranchOrJump => self.branch_or_jump_cycle(bus),
            State::InterruptEntry => self.interrupt_entry_cycle(bus),
            State::Halted => self.halted_cycle(bus),
        }
    }

    // ========================================================================
    // Stack primitives
    // ========================================================================

    /// Push one byte: decrement SP, store at the new SP. SP only moves
    /// once the arbiter completes the store, so a stalled push retries
    /// without double-decrementing.
    fn push_byte<B: Bus>(&mut self, bus: &mut B, value: u8) -> bool {
        let addr = self.regs.sp().wrapping_sub(1) & self.regs.addr_mask();
        if !self.arbiter.store(bus, addr, value) {
            return false;
        }
        self.regs.set_sp(addr);
        true
    }

    /// Pop one byte: load at SP, then increment. SP only moves once the
    /// arbiter completes the load.
    fn pop_byte<B: Bus>(&mut self, bus: &mut B) -> Option<u8> {
        let addr = self.regs.sp();
        let byte = self.arbiter.load(bus, addr)?;
        self.regs.set_sp(addr.wrapping_add(1) & self.regs.addr_mask());
        Some(byte)
    }

    // ========================================================================
    // Fetch and decode
    // ========================================================================

    fn fetch_cycle<B: Bus>(&mut self, bus: &mut B) {
        // Interrupts are taken at instruction boundaries, before the
        // fetch. The poll cycle becomes the first entry cycle. A fetch
        // already stalled in the arbiter finishes first: the entry
        // sequence pushes through the same arbiter, which carries one
        // transaction at a time, so the poll waits for the next
        // boundary.
        if !self.arbiter.is_busy() {
            if self.nmi_pending {
                self.nmi_pending = false;
                self.begin_interrupt(InterruptKind::Nmi);
                self.interrupt_entry_cycle(bus);
                return;
            }
            if self.irq_pending && !self.regs.p().is_set(I) {
                self.irq_pending = false;
                self.begin_interrupt(InterruptKind::Irq);
                self.interrupt_entry_cycle(bus);
                return;
            }
        }

        let Some(byte) = self.arbiter.load(bus, self.regs.pc()) else {
            return;
        };
        self.regs.advance_pc(1);
        self.opcode = byte;
        self.next_cycle();
        self.step = 0;
        self.data = 0;

        match opcodes::lookup(self.regs.mode(), byte) {
            Some(entry) => {
                self.operation = entry.operation;
                self.addr_mode = entry.mode;
                self.which = entry.which;
            }
            None => {
                // Undefined opcodes execute as no-ops; the event is
                // recorded for debuggers.
                self.undefined_count += 1;
                self.last_undefined = Some(byte);
                self.operation = Operation::Nop;
                self.addr_mode = AddressMode::Imp;
                self.which = 0;
            }
        }

        match classify(self.operation, self.addr_mode) {
            OpClass::Implied | OpClass::Halt | OpClass::Push | OpClass::Pop => {
                self.state = State::Execute;
            }
            OpClass::Return | OpClass::BranchOnBit => {
                self.state = State::BranchOrJump;
            }
            OpClass::Break => {
                // Return address is the byte after the opcode.
                self.begin_interrupt(InterruptKind::Brk);
            }
            OpClass::Read
            | OpClass::Store
            | OpClass::Rmw
            | OpClass::Branch
            | OpClass::Jump
            | OpClass::Call => {
                self.state = State::ResolveAddress;
            }
        }
    }

    // ========================================================================
    // Address resolution
    // ========================================================================

    /// Operand bytes following the opcode, per mode and bank width.
    fn operand_len(&self) -> u8 {
        let mode = self.regs.mode();
        match self.addr_mode {
            AddressMode::Imm => mode.width().bytes(),
            AddressMode::Rel => mode.rel_bytes(),
            AddressMode::Zp
            | AddressMode::ZpX
            | AddressMode::ZpY
            | AddressMode::ZpInd
            | AddressMode::ZpIndX
            | AddressMode::ZpIndY => 1,
            AddressMode::Abs
            | AddressMode::AbsX
            | AddressMode::AbsY
            | AddressMode::AbsInd
            | AddressMode::AbsIndX
            | AddressMode::AbsIndY => mode.addr_bytes(),
            AddressMode::Acc | AddressMode::Imp | AddressMode::Stack => 0,
        }
    }

    /// Pointer bytes an indirect mode reads from memory.
    fn pointer_len(&self) -> u8 {
        match self.addr_mode {
            AddressMode::ZpInd
            | AddressMode::ZpIndX
            | AddressMode::ZpIndY
            | AddressMode::AbsInd
            | AddressMode::AbsIndX
            | AddressMode::AbsIndY => self.regs.mode().addr_bytes(),
            _ => 0,
        }
    }

    /// Address of pointer byte `k`. Zero-page pointers wrap within the
    /// page; absolute pointers increment through the full space.
    fn pointer_byte_addr(&self, k: u8) -> u32 {
        let addr = self.pointer.wrapping_add(u32::from(k));
        match self.addr_mode {
            AddressMode::ZpInd | AddressMode::ZpIndX | AddressMode::ZpIndY => addr & 0xFF,
            _ => addr & self.regs.addr_mask(),
        }
    }

    fn resolve_cycle<B: Bus>(&mut self, bus: &mut B) {
        let operand_len = self.operand_len();
        if self.step < operand_len {
            let Some(byte) = self.arbiter.load(bus, self.regs.pc()) else {
                return;
            };
            self.regs.advance_pc(1);
            self.data |= u32::from(byte) << (8 * self.step);
            self.step += 1;
            if self.step == operand_len {
                self.end_operand_phase();
            } else {
                self.next_cycle();
            }
            return;
        }

        let k = self.step - operand_len;
        let Some(byte) = self.arbiter.load(bus, self.pointer_byte_addr(k)) else {
            return;
        };
        self.data |= u32::from(byte) << (8 * k);
        self.step += 1;
        if self.step == operand_len + self.pointer_len() {
            self.end_pointer_phase();
        } else {
            self.next_cycle();
        }
    }

    /// The last operand byte just arrived: commit the mode's address
    /// arithmetic and hand over to the next phase. Indexing adds the
    /// zero-extended index register and wraps in the address width;
    /// zero-page indexing wraps within the page.
    fn end_operand_phase(&mut self) {
        let mask = self.regs.addr_mask();
        match self.addr_mode {
            AddressMode::Imm => {
                // The operand is the data; the operation applies on
                // this cycle.
                let value = self.data & self.regs.width().mask();
                self.apply_read(value);
                self.finish();
            }
            AddressMode::Rel => self.decide_branch(),
            AddressMode::Zp => {
                self.addr = self.data & 0xFF;
                self.begin_access();
            }
            AddressMode::ZpX => {
                self.addr = self.data.wrapping_add(self.regs.x()) & 0xFF;
                self.begin_access();
            }
            AddressMode::ZpY => {
                self.addr = self.data.wrapping_add(self.regs.y()) & 0xFF;
                self.begin_access();
            }
            AddressMode::Abs => {
                self.addr = self.data & mask;
                self.begin_access();
            }
            AddressMode::AbsX => {
                self.addr = self.data.wrapping_add(self.regs.x()) & mask;
                self.begin_access();
            }
            AddressMode::AbsY => {
                self.addr = self.data.wrapping_add(self.regs.y()) & mask;
                self.begin_access();
            }
            AddressMode::ZpInd => {
                self.pointer = self.data & 0xFF;
                self.begin_pointer();
            }
            AddressMode::ZpIndX => {
                self.pointer = self.data.wrapping_add(self.regs.x()) & 0xFF;
                self.begin_pointer();
            }
            AddressMode::ZpIndY => {
                self.pointer = self.data & 0xFF;
                self.begin_pointer();
            }
            AddressMode::AbsInd => {
                self.pointer = self.data & mask;
                self.begin_pointer();
            }
            AddressMode::AbsIndX => {
                self.pointer = self.data.wrapping_add(self.regs.x()) & mask;
                self.begin_pointer();
            }
            AddressMode::AbsIndY => {
                self.pointer = self.data & mask;
                self.begin_pointer();
            }
            AddressMode::Acc | AddressMode::Imp | AddressMode::Stack => unreachable!(),
        }
    }

    fn begin_pointer(&mut self) {
        self.data = 0;
        self.next_cycle();
    }

    /// The last pointer byte just arrived: post-index if the mode asks
    /// for it, then the pointed-to address becomes effective.
    fn end_pointer_phase(&mut self) {
        let mask = self.regs.addr_mask();
        let value = self.data & mask;
        self.addr = match self.addr_mode {
            AddressMode::ZpIndY | AddressMode::AbsIndY => {
                value.wrapping_add(self.regs.y()) & mask
            }
            _ => value,
        };
        self.begin_access();
    }

    /// The effective address is known; route to the data phase.
    fn begin_access(&mut self) {
        match classify(self.operation, self.addr_mode) {
            OpClass::Jump => {
                // The redirect is free: JMP costs its fetch and
                // resolution cycles only.
                self.regs.set_pc(self.addr);
                self.finish();
            }
            OpClass::Call => {
                self.state = State::BranchOrJump;
                self.step = 0;
                self.next_cycle();
            }
            OpClass::Store => {
                self.staged = self.store_value();
                self.state = State::WriteBack;
                self.step = 0;
                self.next_cycle();
            }
            OpClass::Read | OpClass::Rmw => {
                self.data = 0;
                self.state = State::Execute;
                self.step = 0;
                self.next_cycle();
            }
            _ => unreachable!(),
        }
    }

    fn store_value(&self) -> u32 {
        match self.operation {
            Operation::Sta => self.regs.a(),
            Operation::Stx => self.regs.x(),
            Operation::Sty => self.regs.y(),
            Operation::Stz => 0,
            _ => unreachable!(),
        }
    }

    // ========================================================================
    // Branches
    // ========================================================================

    fn branch_taken(&self) -> bool {
        let p = self.regs.p();
        match self.operation {
            Operation::Bra => true,
            Operation::Bpl => !p.is_set(N),
            Operation::Bmi => p.is_set(N),
            Operation::Bvc => !p.is_set(V),
            Operation::Bvs => p.is_set(V),
            Operation::Bcc => !p.is_set(C),
            Operation::Bcs => p.is_set(C),
            Operation::Bne => !p.is_set(Z),
            Operation::Beq => p.is_set(Z),
            _ => unreachable!(),
        }
    }

    /// Branch target: PC after the offset operand plus the
    /// sign-extended offset, wrapping in the address width.
    fn branch_target(&self) -> u32 {
        let shift = 32 - 8 * u32::from(self.regs.mode().rel_bytes());
        let offset = (((self.data << shift) as i32) >> shift) as u32;
        self.regs.pc().wrapping_add(offset) & self.regs.addr_mask()
    }

    /// The offset operand just arrived. A branch not taken ends here; a
    /// taken branch spends one more cycle redirecting.
    fn decide_branch(&mut self) {
        if self.branch_taken() {
            self.addr = self.branch_target();
            self.state = State::BranchOrJump;
            self.next_cycle();
        } else {
            self.finish();
        }
    }

    fn branch_or_jump_cycle<B: Bus>(&mut self, bus: &mut B) {
        match classify(self.operation, self.addr_mode) {
            OpClass::Branch => {
                // Internal cycle of a taken branch.
                self.regs.set_pc(self.addr);
                self.finish();
            }
            OpClass::BranchOnBit => self.branch_on_bit_cycle(bus),
            OpClass::Call => self.call_cycle(bus),
            OpClass::Return => self.return_cycle(bus),
            _ => unreachable!(),
        }
    }

    /// BBR/BBS: zero-page operand, data read, offset operand, then the
    /// decision. Legacy mode only.
    fn branch_on_bit_cycle<B: Bus>(&mut self, bus: &mut B) {
        match self.step {
            0 => {
                let Some(byte) = self.arbiter.load(bus, self.regs.pc()) else {
                    return;
                };
                self.regs.advance_pc(1);
                self.pointer = u32::from(byte);
                self.step = 1;
                self.next_cycle();
            }
            1 => {
                let Some(byte) = self.arbiter.load(bus, self.pointer) else {
                    return;
                };
                self.data = u32::from(byte);
                self.step = 2;
                self.next_cycle();
            }
            2 => {
                let Some(byte) = self.arbiter.load(bus, self.regs.pc()) else {
                    return;
                };
                self.regs.advance_pc(1);
                let offset = byte as i8 as i32 as u32;
                let target = self.regs.pc().wrapping_add(offset) & self.regs.addr_mask();
                let bit = self.data & (1 << self.which) != 0;
                let taken = match self.operation {
                    Operation::Bbs => bit,
                    Operation::Bbr => !bit,
                    _ => unreachable!(),
                };
                if taken {
                    self.addr = target;
                    self.step = 3;
                    self.next_cycle();
                } else {
                    self.finish();
                }
            }
            3 => {
                self.regs.set_pc(self.addr);
                self.finish();
            }
            _ => unreachable!(),
        }
    }

    /// JSR: push the return address (the instruction after the
    /// operand), high byte first so it sits little-endian in memory,
    /// then redirect on the final push.
    fn call_cycle<B: Bus>(&mut self, bus: &mut B) {
        let addr_bytes = self.regs.mode().addr_bytes();
        let shift = 8 * (addr_bytes - 1 - self.step);
        let byte = (self.regs.pc() >> shift) as u8;
        if !self.push_byte(bus, byte) {
            return;
        }
        self.step += 1;
        if self.step == addr_bytes {
            self.regs.set_pc(self.addr);
            self.finish();
        } else {
            self.next_cycle();
        }
    }

    /// RTS/RTI: pop the return address low byte first; RTI restores the
    /// status byte before it. The popped address is used as-is.
    fn return_cycle<B: Bus>(&mut self, bus: &mut B) {
        let restore_status = self.operation == Operation::Rti;
        if restore_status && self.step == 0 {
            let Some(byte) = self.pop_byte(bus) else {
                return;
            };
            *self.regs.p_mut() = Status::from_byte(byte);
            self.step = 1;
            self.next_cycle();
            return;
        }

        let base = u8::from(restore_status);
        let k = self.step - base;
        let Some(byte) = self.pop_byte(bus) else {
            return;
        };
        self.data |= u32::from(byte) << (8 * k);
        self.step += 1;
        if self.step - base == self.regs.mode().addr_bytes() {
            self.regs.set_pc(self.data & self.regs.addr_mask());
            self.finish();
        } else {
            self.next_cycle();
        }
    }

    // ========================================================================
    // Data phase
    // ========================================================================

    fn execute_op_cycle<B: Bus>(&mut self, bus: &mut B) {
        match classify(self.operation, self.addr_mode) {
            OpClass::Implied => {
                // Single internal cycle; no bus access.
                self.apply_implied();
                self.finish();
            }
            OpClass::Halt => {
                self.waiting = self.operation == Operation::Wai;
                self.last_instruction_cycles = self.cycle + 1;
                self.state = State::Halted;
                self.cycle = 0;
                self.step = 0;
            }
            OpClass::Push => self.push_cycle(bus),
            OpClass::Pop => self.pop_cycle(bus),
            OpClass::Read => self.data_read_cycle(bus),
            OpClass::Rmw => self.rmw_cycle(bus),
            _ => unreachable!(),
        }
    }

    /// One data byte per cycle, low byte first; the operation applies
    /// on the final byte's cycle.
    fn data_read_cycle<B: Bus>(&mut self, bus: &mut B) {
        let addr = self.addr.wrapping_add(u32::from(self.step)) & self.regs.addr_mask();
        let Some(byte) = self.arbiter.load(bus, addr) else {
            return;
        };
        self.data |= u32::from(byte) << (8 * self.step);
        self.step += 1;
        if self.step == self.regs.width().bytes() {
            let value = self.data & self.regs.width().mask();
            self.apply_read(value);
            self.finish();
        } else {
            self.next_cycle();
        }
    }

    /// Read the operand, then one internal modify cycle staging the
    /// result for write-back.
    fn rmw_cycle<B: Bus>(&mut self, bus: &mut B) {
        if self.step < self.regs.width().bytes() {
            let addr = self.addr.wrapping_add(u32::from(self.step)) & self.regs.addr_mask();
            let Some(byte) = self.arbiter.load(bus, addr) else {
                return;
            };
            self.data |= u32::from(byte) << (8 * self.step);
            self.step += 1;
            self.next_cycle();
            return;
        }

        let value = self.data & self.regs.width().mask();
        let result = self.modify(value);
        self.staged = result.value;
        self.regs.p_mut().merge(result.flags, result.affects);
        self.state = State::WriteBack;
        self.step = 0;
        self.next_cycle();
    }

    /// One staged byte per cycle, low byte first.
    fn write_back_cycle<B: Bus>(&mut self, bus: &mut B) {
        let addr = self.addr.wrapping_add(u32::from(self.step)) & self.regs.addr_mask();
        let byte = (self.staged >> (8 * self.step)) as u8;
        if !self.arbiter.store(bus, addr, byte) {
            return;
        }
        self.step += 1;
        if self.step == self.regs.width().bytes() {
            self.finish();
        } else {
            self.next_cycle();
        }
    }

    /// One pushed byte per cycle, high byte first so multi-byte values
    /// sit little-endian in memory. PHP pushes the composite status
    /// with B set.
    fn push_cycle<B: Bus>(&mut self, bus: &mut B) {
        let total = self.push_len();
        let shift = 8 * (total - 1 - self.step);
        let byte = (self.push_source() >> shift) as u8;
        if !self.push_byte(bus, byte) {
            return;
        }
        self.step += 1;
        if self.step == total {
            self.finish();
        } else {
            self.next_cycle();
        }
    }

    fn push_len(&self) -> u8 {
        if self.operation == Operation::Php {
            1
        } else {
            self.regs.width().bytes()
        }
    }

    fn push_source(&self) -> u32 {
        match self.operation {
            Operation::Pha => self.regs.a(),
            Operation::Phx => self.regs.x(),
            Operation::Phy => self.regs.y(),
            Operation::Php => u32::from(self.regs.p().to_byte_brk()),
            _ => unreachable!(),
        }
    }

    /// One popped byte per cycle, low byte first; the register loads on
    /// the final byte's cycle.
    fn pop_cycle<B: Bus>(&mut self, bus: &mut B) {
        let total = if self.operation == Operation::Plp {
            1
        } else {
            self.regs.width().bytes()
        };
        let Some(byte) = self.pop_byte(bus) else {
            return;
        };
        self.data |= u32::from(byte) << (8 * self.step);
        self.step += 1;
        if self.step < total {
            self.next_cycle();
            return;
        }

        let value = self.data & self.regs.width().mask();
        match self.operation {
            Operation::Pla => {
                self.regs.set_a(value);
                self.update_nz(value);
            }
            Operation::Plx => {
                self.regs.set_x(value);
                self.update_nz(value);
            }
            Operation::Ply => {
                self.regs.set_y(value);
                self.update_nz(value);
            }
            Operation::Plp => *self.regs.p_mut() = Status::from_byte(self.data as u8),
            _ => unreachable!(),
        }
        self.finish();
    }

    // ========================================================================
    // Operation application
    // ========================================================================

    fn update_nz(&mut self, value: u32) {
        let width = self.regs.width();
        self.regs.p_mut().update_nz(value, width);
    }

    fn merge_flags(&mut self, result: alu::AluResult) {
        self.regs.p_mut().merge(result.flags, result.affects);
    }

    /// Apply a read-class operation to the fetched value.
    fn apply_read(&mut self, value: u32) {
        let width = self.regs.width();
        let carry = self.regs.p().is_set(C);
        let a = self.regs.a();
        match self.operation {
            Operation::Lda => {
                self.regs.set_a(value);
                self.update_nz(value);
            }
            Operation::Ldx => {
                self.regs.set_x(value);
                self.update_nz(value);
            }
            Operation::Ldy => {
                self.regs.set_y(value);
                self.update_nz(value);
            }
            Operation::Adc => {
                let r = alu::add(width, a, value, carry);
                self.regs.set_a(r.value);
                self.merge_flags(r);
            }
            Operation::Sbc => {
                let r = alu::sub(width, a, value, carry);
                self.regs.set_a(r.value);
                self.merge_flags(r);
            }
            // ADD and SUB ignore the incoming carry.
            Operation::Add => {
                let r = alu::add(width, a, value, false);
                self.regs.set_a(r.value);
                self.merge_flags(r);
            }
            Operation::Sub => {
                let r = alu::sub(width, a, value, true);
                self.regs.set_a(r.value);
                self.merge_flags(r);
            }
            Operation::And => {
                let r = alu::and(width, a, value);
                self.regs.set_a(r.value);
                self.merge_flags(r);
            }
            Operation::Ora => {
                let r = alu::or(width, a, value);
                self.regs.set_a(r.value);
                self.merge_flags(r);
            }
            Operation::Eor => {
                let r = alu::eor(width, a, value);
                self.regs.set_a(r.value);
                self.merge_flags(r);
            }
            Operation::Bit => {
                // The accumulator is not modified.
                let r = if self.addr_mode == AddressMode::Imm {
                    alu::bit_imm(width, a, value)
                } else {
                    alu::bit(width, a, value)
                };
                self.merge_flags(r);
            }
            Operation::Cmp => self.merge_flags(alu::cmp(width, a, value)),
            Operation::Cpx => self.merge_flags(alu::cmp(width, self.regs.x(), value)),
            Operation::Cpy => self.merge_flags(alu::cmp(width, self.regs.y(), value)),
            _ => unreachable!(),
        }
    }

    /// Compute a read-modify-write result. Shared by the accumulator
    /// forms and the memory forms.
    fn modify(&mut self, value: u32) -> alu::AluResult {
        let width = self.regs.width();
        let carry = self.regs.p().is_set(C);
        match self.operation {
            Operation::Asl => alu::asl(width, value),
            Operation::Lsr => alu::lsr(width, value),
            Operation::Rol => alu::rol(width, value, carry),
            Operation::Ror => alu::ror(width, value, carry),
            Operation::Inc => alu::inc(width, value),
            Operation::Dec => alu::dec(width, value),
            Operation::Tsb => alu::tsb(width, self.regs.a(), value),
            Operation::Trb => alu::trb(width, self.regs.a(), value),
            Operation::Rmb => alu::rmb(value, self.which),
            Operation::Smb => alu::smb(value, self.which),
            _ => unreachable!(),
        }
    }

    /// Apply an implied or accumulator operation.
    fn apply_implied(&mut self) {
        match self.operation {
            Operation::Asl
            | Operation::Lsr
            | Operation::Rol
            | Operation::Ror
            | Operation::Inc
            | Operation::Dec => {
                let result = self.modify(self.regs.a());
                self.regs.set_a(result.value);
                self.merge_flags(result);
            }
            Operation::Nop => {}
            Operation::Clc => self.regs.p_mut().clear(C),
            Operation::Sec => self.regs.p_mut().set(C),
            Operation::Cli => self.regs.p_mut().clear(I),
            Operation::Sei => self.regs.p_mut().set(I),
            Operation::Cld => self.regs.p_mut().clear(D),
            Operation::Sed => self.regs.p_mut().set(D),
            Operation::Clv => self.regs.p_mut().clear(V),
            Operation::Tax => {
                let v = self.regs.a();
                self.regs.set_x(v);
                self.update_nz(self.regs.x());
            }
            Operation::Tay => {
                let v = self.regs.a();
                self.regs.set_y(v);
                self.update_nz(self.regs.y());
            }
            Operation::Txa => {
                let v = self.regs.x();
                self.regs.set_a(v);
                self.update_nz(self.regs.a());
            }
            Operation::Tya => {
                let v = self.regs.y();
                self.regs.set_a(v);
                self.update_nz(self.regs.a());
            }
            Operation::Tsx => {
                // SP is wider than X in legacy mode; flags reflect the
                // truncated value that lands in X.
                let v = self.regs.sp();
                self.regs.set_x(v);
                self.update_nz(self.regs.x());
            }
            Operation::Txs => {
                // No flags.
                let v = self.regs.x();
                self.regs.set_sp(v);
            }
            Operation::Inx => {
                let r = alu::inc(self.regs.width(), self.regs.x());
                self.regs.set_x(r.value);
                self.merge_flags(r);
            }
            Operation::Iny => {
                let r = alu::inc(self.regs.width(), self.regs.y());
                self.regs.set_y(r.value);
                self.merge_flags(r);
            }
            Operation::Dex => {
                let r = alu::dec(self.regs.width(), self.regs.x());
                self.regs.set_x(r.value);
                self.merge_flags(r);
            }
            Operation::Dey => {
                let r = alu::dec(self.regs.width(), self.regs.y());
                self.regs.set_y(r.value);
                self.merge_flags(r);
            }
            _ => unreachable!(),
        }
    }

    // ========================================================================
    // Interrupts, reset, halt
    // ========================================================================

    fn begin_interrupt(&mut self, kind: InterruptKind) {
        self.interrupt_kind = kind;
        self.state = State::InterruptEntry;
        self.step = 0;
        self.data = 0;
    }

    /// Push PC (high byte first) and the composite status, raise I,
    /// then read the 16-bit vector. BRK pushes with B set; hardware
    /// interrupts push with B clear. D is left alone.
    fn interrupt_entry_cycle<B: Bus>(&mut self, bus: &mut B) {
        let addr_bytes = self.regs.mode().addr_bytes();
        if self.step < addr_bytes {
            let shift = 8 * (addr_bytes - 1 - self.step);
            let byte = (self.regs.pc() >> shift) as u8;
            if !self.push_byte(bus, byte) {
                return;
            }
            self.step += 1;
            self.next_cycle();
            return;
        }

        if self.step == addr_bytes {
            let byte = match self.interrupt_kind {
                InterruptKind::Brk => self.regs.p().to_byte_brk(),
                InterruptKind::Irq | InterruptKind::Nmi => self.regs.p().to_byte_irq(),
            };
            if !self.push_byte(bus, byte) {
                return;
            }
            self.regs.p_mut().set(I);
            self.step += 1;
            self.next_cycle();
            return;
        }

        // Vector read: low byte, then high. The entry point is
        // zero-extended into PC in extended mode.
        let vector = match self.interrupt_kind {
            InterruptKind::Brk | InterruptKind::Irq => VECTOR_IRQ,
            InterruptKind::Nmi => VECTOR_NMI,
        };
        let k = self.step - addr_bytes - 1;
        let Some(byte) = self.arbiter.load(bus, vector + u32::from(k)) else {
            return;
        };
        self.data |= u32::from(byte) << (8 * k);
        self.step += 1;
        if k == 1 {
            self.regs.set_pc(self.data & 0xFFFF);
            self.finish();
        } else {
            self.next_cycle();
        }
    }

    /// Stepped reset: internal start-up cycles, then the vector read.
    /// Registers were already forced to the legacy reset bank when the
    /// sequence began.
    fn reset_cycle<B: Bus>(&mut self, bus: &mut B) {
        match self.step {
            0..=4 => {
                self.step += 1;
                self.next_cycle();
            }
            5 => {
                let Some(byte) = self.arbiter.load(bus, VECTOR_RESET) else {
                    return;
                };
                self.data = u32::from(byte);
                self.step = 6;
                self.next_cycle();
            }
            6 => {
                let Some(byte) = self.arbiter.load(bus, VECTOR_RESET + 1) else {
                    return;
                };
                self.regs.set_pc(self.data | (u32::from(byte) << 8));
                self.finish();
            }
            _ => unreachable!(),
        }
    }

    /// STP holds until reset. WAI holds until an interrupt: NMI and an
    /// unmasked IRQ vector immediately, a masked IRQ just resumes at
    /// the next instruction.
    fn halted_cycle<B: Bus>(&mut self, bus: &mut B) {
        if !self.waiting {
            return;
        }
        if self.nmi_pending {
            self.nmi_pending = false;
            self.waiting = false;
            self.begin_interrupt(InterruptKind::Nmi);
            self.interrupt_entry_cycle(bus);
        } else if self.irq_pending {
            self.irq_pending = false;
            self.waiting = false;
            if self.regs.p().is_set(I) {
                self.state = State::FetchOpcode;
                self.fetch_cycle(bus);
            } else {
                self.begin_interrupt(InterruptKind::Irq);
                self.interrupt_entry_cycle(bus);
            }
        }
    }
}

// ============================================================================
// Trait implementations
// ============================================================================

impl Cpu for Cpu65832 {
    type Registers = RegisterFile;

    fn tick<B: Bus>(&mut self, bus: &mut B) {
        self.total_cycles += 1;
        self.execute_cycle(bus);
    }

    fn pc(&self) -> u32 {
        self.regs.pc()
    }

    fn registers(&self) -> Self::Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    fn interrupt(&mut self) -> bool {
        // The request latches even when masked so WAI can resume on it.
        self.irq_pending = true;
        !self.regs.p().is_set(I)
    }

    fn nmi(&mut self) {
        self.nmi_pending = true;
    }

    fn reset(&mut self) {
        self.regs = RegisterFile::legacy();
        self.state = State::Reset;
        self.opcode = 0;
        self.operation = Operation::Nop;
        self.addr_mode = AddressMode::Imp;
        self.which = 0;
        self.cycle = 0;
        self.step = 0;
        self.addr = 0;
        self.pointer = 0;
        self.data = 0;
        self.staged = 0;
        self.interrupt_kind = InterruptKind::Brk;
        self.nmi_pending = false;
        self.irq_pending = false;
        self.waiting = false;
        self.arbiter.reset();
        // total_cycles and the undefined-opcode record survive reset.
    }
}

impl Observable for Cpu65832 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(match self.regs {
                RegisterFile::Legacy(r) => r.pc.into(),
                RegisterFile::Extended(r) => r.pc.into(),
            }),
            "a" => Some(match self.regs {
                RegisterFile::Legacy(r) => r.a.into(),
                RegisterFile::Extended(r) => r.a.into(),
            }),
            "x" => Some(match self.regs {
                RegisterFile::Legacy(r) => r.x.into(),
                RegisterFile::Extended(r) => r.x.into(),
            }),
            "y" => Some(match self.regs {
                RegisterFile::Legacy(r) => r.y.into(),
                RegisterFile::Extended(r) => r.y.into(),
            }),
            "sp" | "s" => Some(match self.regs {
                RegisterFile::Legacy(r) => r.sp.into(),
                RegisterFile::Extended(r) => r.sp.into(),
            }),
            "p" | "status" => Some(self.regs.p().0.into()),
            "opcode" => Some(self.opcode.into()),
            "addr" => Some(Value::U32(self.addr)),
            "pointer" => Some(Value::U32(self.pointer)),
            "data" => Some(Value::U32(self.data)),
            "cycle" => Some(self.cycle.into()),
            "total_cycles" => Some(Value::U64(self.total_cycles)),
            "state" => Some(self.state.as_str().into()),
            "mode" => Some(self.regs.mode().as_str().into()),
            "bus.phase" => Some(self.arbiter.phase().as_str().into()),
            "halted" => Some(self.is_halted().into()),
            "flags.c" | "c" => Some(self.regs.p().is_set(C).into()),
            "flags.z" | "z" => Some(self.regs.p().is_set(Z).into()),
            "flags.i" | "i" => Some(self.regs.p().is_set(I).into()),
            "flags.d" | "d" => Some(self.regs.p().is_set(D).into()),
            "flags.b" | "b" => Some(self.regs.p().is_set(B).into()),
            "flags.u" | "u" => Some(self.regs.p().is_set(U).into()),
            "flags.v" | "v" => Some(self.regs.p().is_set(V).into()),
            "flags.n" | "n" => Some(self.regs.p().is_set(N).into()),
            "undefined.count" => Some(Value::U64(self.undefined_count)),
            "undefined.opcode" => self.last_undefined.map(Value::from),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc",
            "a",
            "x",
            "y",
            "sp",
            "p",
            "opcode",
            "addr",
            "pointer",
            "data",
            "cycle",
            "total_cycles",
            "state",
            "mode",
            "halted",
            "bus.phase",
            "flags.c",
            "flags.z",
            "flags.i",
            "flags.d",
            "flags.b",
            "flags.u",
            "flags.v",
            "flags.n",
            "undefined.count",
            "undefined.opcode",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::SimpleBus;

    #[test]
    fn test_lda_immediate() {
        let mut cpu = Cpu65832::new();
        let mut bus = SimpleBus::new();

        // LDA #$42
        bus.load(0x0000, &[0xA9, 0x42]);
        cpu.regs.set_pc(0x0000);

        // Cycle 1: fetch opcode
        cpu.tick(&mut bus);
        // Cycle 2: fetch operand, execute
        cpu.tick(&mut bus);

        assert_eq!(cpu.regs.a(), 0x42);
        assert_eq!(cpu.regs.pc(), 0x0002);
        assert!(cpu.is_instruction_complete());
        assert_eq!(cpu.instruction_cycles(), 2);
    }

    #[test]
    fn test_adc_immediate() {
        let mut cpu = Cpu65832::new();
        let mut bus = SimpleBus::new();

        cpu.regs.set_a(0x3C);
        // ADC #$04
        bus.load(0x0000, &[0x69, 0x04]);

        for _ in 0..2 {
            cpu.tick(&mut bus);
        }

        assert_eq!(cpu.regs.a(), 0x40);
        assert!(!cpu.regs.p().is_set(C));
        assert!(!cpu.regs.p().is_set(Z));
        assert!(!cpu.regs.p().is_set(N));
        assert!(!cpu.regs.p().is_set(V));
        assert!(cpu.is_instruction_complete());
    }

    #[test]
    fn test_sta_zeropage() {
        let mut cpu = Cpu65832::new();
        let mut bus = SimpleBus::new();

        cpu.regs.set_a(0x55);
        // STA $10
        bus.load(0x0000, &[0x85, 0x10]);

        // 3 cycles for STA zp
        for _ in 0..3 {
            cpu.tick(&mut bus);
        }

        assert_eq!(bus.peek(0x0010), 0x55);
        assert!(cpu.is_instruction_complete());
    }

    #[test]
    fn test_jmp_absolute() {
        let mut cpu = Cpu65832::new();
        let mut bus = SimpleBus::new();

        // JMP $1234
        bus.load(0x0000, &[0x4C, 0x34, 0x12]);

        // 3 cycles for JMP abs
        for _ in 0..3 {
            cpu.tick(&mut bus);
        }

        assert_eq!(cpu.regs.pc(), 0x1234);
        assert!(cpu.is_instruction_complete());
    }

    #[test]
    fn test_branch_not_taken_is_two_cycles() {
        let mut cpu = Cpu65832::new();
        let mut bus = SimpleBus::new();

        cpu.regs.p_mut().set(C);
        // BCC +5 with carry set: not taken
        bus.load(0x0000, &[0x90, 0x05]);

        for _ in 0..2 {
            cpu.tick(&mut bus);
        }

        assert_eq!(cpu.regs.pc(), 0x0002);
        assert!(cpu.is_instruction_complete());
        assert_eq!(cpu.instruction_cycles(), 2);
    }

    #[test]
    fn test_branch_taken_is_three_cycles() {
        let mut cpu = Cpu65832::new();
        let mut bus = SimpleBus::new();

        // BCC +4 with carry clear: taken
        bus.load(0x0000, &[0x90, 0x04]);

        for _ in 0..3 {
            cpu.tick(&mut bus);
        }

        // Offset is relative to the byte after the operand.
        assert_eq!(cpu.regs.pc(), 0x0006);
        assert_eq!(cpu.instruction_cycles(), 3);
    }

    #[test]
    fn test_undefined_opcode_executes_as_nop() {
        let mut cpu = Cpu65832::new();
        let mut bus = SimpleBus::new();

        bus.load(0x0000, &[0x03]);

        for _ in 0..2 {
            cpu.tick(&mut bus);
        }

        assert_eq!(cpu.regs.pc(), 0x0001);
        assert!(cpu.is_instruction_complete());
        assert_eq!(cpu.undefined_opcode_count(), 1);
        assert_eq!(cpu.query("undefined.opcode"), Some(Value::U8(0x03)));
    }

    #[test]
    fn test_reset_sequence_loads_the_vector() {
        let mut cpu = Cpu65832::new();
        let mut bus = SimpleBus::new();

        bus.poke(0xFFFC, 0x00);
        bus.poke(0xFFFD, 0x80);
        cpu.set_mode(CpuMode::Extended);
        cpu.reset();

        // 7 cycles: internal start-up, then the vector.
        for _ in 0..7 {
            cpu.tick(&mut bus);
        }

        assert_eq!(cpu.mode(), CpuMode::Legacy);
        assert_eq!(cpu.regs.pc(), 0x8000);
        assert_eq!(cpu.regs.sp(), 0x0200);
        assert!(cpu.is_instruction_complete());
    }

    #[test]
    fn test_extended_immediate_is_four_bytes() {
        let mut cpu = Cpu65832::new();
        let mut bus = SimpleBus::new();

        cpu.set_mode(CpuMode::Extended);
        // LDA #$DEADBEEF, little-endian operand
        bus.load(0x0000, &[0xA9, 0xEF, 0xBE, 0xAD, 0xDE]);

        for _ in 0..5 {
            cpu.tick(&mut bus);
        }

        assert_eq!(cpu.regs.a(), 0xDEAD_BEEF);
        assert!(cpu.regs.p().is_set(N));
        assert_eq!(cpu.regs.pc(), 0x0005);
        assert_eq!(cpu.instruction_cycles(), 5);
    }
}
