//! Memory interface for the 65C816 instruction core.
//!
//! The core never owns memory; the embedding system implements [`Memory`]
//! and every instruction entry point issues its reads and writes through it.
//! Word accesses come in two wrap flavors: *bank-wrapped* (the low 16 bits
//! wrap within the current 64KB bank, used for direct-page and most
//! 16-bit-operand reads) and *unwrapped* (the address carries into the next
//! bank, used for absolute addressing).

/// Add an offset to an address, wrapping within the address's 64KB bank.
///
/// Bits 16-23 (the bank) are preserved; only the low 16 bits participate in
/// the addition.
#[inline]
pub fn add_bank_wrap(addr: u32, offset: u16) -> u32 {
    (addr & 0xFF_0000) | ((addr as u16).wrapping_add(offset) as u32)
}

/// Bus interface the embedding system provides to the core.
///
/// `setacc` marks an access the real CPU would perform on the bus; probes
/// the core makes purely for timing decisions pass `false` so that
/// access-sensitive implementations (I/O watchpoints, open-bus models) do
/// not observe them.
pub trait Memory {
    /// Read a byte from the 24-bit address space.
    fn read(&mut self, addr: u32, setacc: bool) -> u8;

    /// Write a byte to the 24-bit address space.
    fn write(&mut self, addr: u32, val: u8, setacc: bool);

    /// Read a little-endian word; the high byte may cross into the next bank.
    fn read_word(&mut self, addr: u32, setacc: bool) -> u16 {
        let lo = self.read(addr, setacc) as u16;
        let hi = self.read(addr.wrapping_add(1) & 0xFF_FFFF, setacc) as u16;
        (hi << 8) | lo
    }

    /// Read a little-endian word; the high byte wraps within the bank.
    fn read_word_bank_wrap(&mut self, addr: u32, setacc: bool) -> u16 {
        let lo = self.read(addr, setacc) as u16;
        let hi = self.read(add_bank_wrap(addr, 1), setacc) as u16;
        (hi << 8) | lo
    }

    /// Write a little-endian word; the high byte may cross into the next bank.
    fn write_word(&mut self, addr: u32, val: u16, setacc: bool) {
        self.write(addr, (val & 0xFF) as u8, setacc);
        self.write(addr.wrapping_add(1) & 0xFF_FFFF, (val >> 8) as u8, setacc);
    }

    /// Write a little-endian word; the high byte wraps within the bank.
    fn write_word_bank_wrap(&mut self, addr: u32, val: u16, setacc: bool) {
        self.write(addr, (val & 0xFF) as u8, setacc);
        self.write(add_bank_wrap(addr, 1), (val >> 8) as u8, setacc);
    }
}

/// Simple flat 16MB memory, used by tests and benchmarks.
pub struct ArrayMemory {
    data: Vec<u8>,
}

impl ArrayMemory {
    pub fn new() -> Self {
        Self {
            data: vec![0; 16 * 1024 * 1024],
        }
    }
}

impl Default for ArrayMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory for ArrayMemory {
    fn read(&mut self, addr: u32, _setacc: bool) -> u8 {
        self.data[(addr as usize) & 0xFF_FFFF]
    }

    fn write(&mut self, addr: u32, val: u8, _setacc: bool) {
        self.data[(addr as usize) & 0xFF_FFFF] = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_bank_wrap_stays_in_bank() {
        assert_eq!(add_bank_wrap(0x01_FFFF, 1), 0x01_0000);
        assert_eq!(add_bank_wrap(0x01_1234, 2), 0x01_1236);
    }

    #[test]
    fn test_word_wrap_flavors() {
        let mut mem = ArrayMemory::new();
        mem.write(0x01_FFFF, 0x34, true);
        mem.write(0x02_0000, 0x12, true);
        mem.write(0x01_0000, 0xAB, true);

        // Unwrapped read crosses the bank boundary.
        assert_eq!(mem.read_word(0x01_FFFF, true), 0x1234);
        // Bank-wrapped read picks the high byte from the start of the bank.
        assert_eq!(mem.read_word_bank_wrap(0x01_FFFF, true), 0xAB34);
    }

    #[test]
    fn test_write_word_bank_wrap() {
        let mut mem = ArrayMemory::new();
        mem.write_word_bank_wrap(0x03_FFFF, 0xBEEF, true);
        assert_eq!(mem.read(0x03_FFFF, true), 0xEF);
        assert_eq!(mem.read(0x03_0000, true), 0xBE);
    }
}
