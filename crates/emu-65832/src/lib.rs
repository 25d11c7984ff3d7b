//! Cycle-accurate 65832 CPU emulator.
//!
//! A 6502-compatible core with a second, 32-bit operating mode. Legacy
//! mode executes the classic 8-bit instruction set with 16-bit
//! addresses; extended mode reuses the same opcode map with 32-bit
//! registers, addresses and operands. One sequencer serves both: operand
//! widths and address arithmetic come from the live register bank, so
//! instruction timings scale with the mode instead of being tabled twice.
//!
//! Each call to `tick()` advances exactly one cycle and performs at most
//! one bus access, routed through a [`BusArbiter`] that stalls the core
//! for devices with a request/ready handshake.

pub mod alu;
mod arbiter;
mod cpu;
mod flags;
mod opcodes;
mod registers;

pub use arbiter::{BusArbiter, BusPhase, PERIPHERAL_BASE, PERIPHERAL_MASK, is_peripheral};
pub use cpu::Cpu65832;
pub use flags::{B, C, D, I, N, Status, U, V, Z};
pub use opcodes::{AddressMode, OpcodeEntry, Operation, lookup};
pub use registers::{CpuMode, ExtendedRegisters, LegacyRegisters, RegisterFile, Width};
