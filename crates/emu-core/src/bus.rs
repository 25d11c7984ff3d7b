//! Byte-wide memory bus with wait-state reporting.
//!
//! The bus always answers in the tick the access is issued, but may report
//! wait states: the number of additional ticks before the device's ready
//! pulse. Plain RAM reports zero. Memory-mapped peripherals report however
//! many ticks their request/ready handshake needs; the CPU core stalls for
//! that many ticks before its next access.

/// Result of a bus read: the data byte plus any wait states the device
/// imposes before it is actually ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadResult {
    /// The byte on the data lines.
    pub data: u8,
    /// Ticks the accessor must stall before proceeding.
    pub wait: u8,
}

impl ReadResult {
    /// A read that completes in the issuing tick.
    #[must_use]
    pub const fn new(data: u8) -> Self {
        Self { data, wait: 0 }
    }

    /// A read with wait states from a slow device.
    #[must_use]
    pub const fn with_wait(data: u8, wait: u8) -> Self {
        Self { data, wait }
    }
}

/// Byte-wide memory bus.
///
/// Components access memory and memory-mapped peripherals through this
/// trait. The bus handles address decoding and routing to the appropriate
/// device. Addresses are `u32` to cover every CPU address width; narrower
/// CPUs mask before issuing.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u32) -> ReadResult;

    /// Write a byte to the given address. Returns wait states, as for
    /// reads.
    fn write(&mut self, address: u32, value: u8) -> u8;
}

/// Flat-RAM bus for tests and tools.
///
/// Every address maps to RAM and answers with zero wait states. Reads past
/// the end of RAM float high (0xFF); writes past the end are dropped.
#[derive(Debug, Clone)]
pub struct SimpleBus {
    ram: Vec<u8>,
}

impl SimpleBus {
    /// A 64 KiB bus, enough for any 16-bit address space.
    #[must_use]
    pub fn new() -> Self {
        Self::with_size(0x1_0000)
    }

    /// A bus backed by `size` bytes of RAM, for wider address spaces.
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self {
            ram: vec![0; size],
        }
    }

    /// Copy `data` into RAM starting at `addr`.
    ///
    /// # Panics
    /// Panics if the slice does not fit.
    pub fn load(&mut self, addr: u32, data: &[u8]) {
        let start = addr as usize;
        self.ram[start..start + data.len()].copy_from_slice(data);
    }

    /// Read a byte without going through the bus protocol.
    #[must_use]
    pub fn peek(&self, addr: u32) -> u8 {
        self.ram.get(addr as usize).copied().unwrap_or(0xFF)
    }

    /// Write a byte without going through the bus protocol.
    pub fn poke(&mut self, addr: u32, value: u8) {
        if let Some(slot) = self.ram.get_mut(addr as usize) {
            *slot = value;
        }
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u32) -> ReadResult {
        ReadResult::new(self.peek(address))
    }

    fn write(&mut self, address: u32, value: u8) -> u8 {
        self.poke(address, value);
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_bus_round_trip() {
        let mut bus = SimpleBus::new();
        bus.load(0x0200, &[0xDE, 0xAD]);

        assert_eq!(bus.read(0x0200), ReadResult::new(0xDE));
        assert_eq!(bus.read(0x0201), ReadResult::new(0xAD));

        let wait = bus.write(0x0200, 0x01);
        assert_eq!(wait, 0);
        assert_eq!(bus.peek(0x0200), 0x01);
    }

    #[test]
    fn out_of_range_reads_float_high() {
        let mut bus = SimpleBus::with_size(0x100);
        assert_eq!(bus.read(0x0200).data, 0xFF);
        bus.write(0x0200, 0x42);
        assert_eq!(bus.read(0x0200).data, 0xFF);
    }
}
