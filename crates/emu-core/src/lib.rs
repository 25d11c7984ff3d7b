//! Core traits and types for cycle-accurate emulation.
//!
//! Everything ticks at the master crystal frequency. All component timing
//! derives from this. No exceptions.
//!
//! CPUs consume memory and peripherals through [`Bus`], one byte per
//! cycle; buses report wait states for accesses that require a
//! request/ready handshake. Every component exposes its state through
//! [`Observable`] so any tick can be inspected without disturbing it.

mod bus;
mod clock;
mod cpu;
mod observable;
mod tickable;
mod ticks;

pub use bus::{Bus, ReadResult, SimpleBus};
pub use clock::MasterClock;
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use tickable::Tickable;
pub use ticks::Ticks;
