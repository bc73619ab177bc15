//! Logical & bit-test engine: AND, ORA, EOR, BIT, TRB, TSB.

use crate::cpu::{AddrMode, Cpu, Width};
use crate::memory::Memory;

impl Cpu {
    pub fn and<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        self.bitwise(mem, size, cycles, mode, addr, |a, v| a & v);
    }

    pub fn ora<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        self.bitwise(mem, size, cycles, mode, addr, |a, v| a | v);
    }

    pub fn eor<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        self.bitwise(mem, size, cycles, mode, addr, |a, v| a ^ v);
    }

    /// Shared AND/ORA/EOR body: combine the accumulator with the operand
    /// at the active width, leaving the upper byte untouched in 8-bit
    /// mode, then apply the timing protocol.
    fn bitwise<M, F>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32, f: F)
    where
        M: Memory,
        F: Fn(u16, u16) -> u16,
    {
        let mut size = size as u16;
        match self.width_a() {
            Width::W8 => {
                let val = mem.read(addr, self.setacc) as u16;
                self.c = (self.c & 0xFF00) | (f(self.c & 0xFF, val) & 0xFF);
            }
            Width::W16 => {
                let val = self.read_operand_word(mem, mode, addr);
                self.c = f(self.c, val);
                self.cycles += 1;
                if mode == AddrMode::Immediate {
                    size += 1;
                }
            }
        }
        self.set_zn_a();

        self.index_cross_penalty(mode, addr);
        self.dp_penalty(mode);
        self.update_pc(size);
        self.cycles += cycles as u64;
    }

    /// BIT: Zero from the masked comparison; non-immediate modes also
    /// copy the operand's top two bits into Negative/Overflow.
    pub fn bit<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        let mut size = size as u16;
        match self.width_a() {
            Width::W8 => {
                let val = mem.read(addr, self.setacc);
                self.p.z = (self.c as u8) & val == 0;
                if mode != AddrMode::Immediate {
                    self.p.n = val & 0x80 != 0;
                    self.p.v = val & 0x40 != 0;
                }
            }
            Width::W16 => {
                let val = self.read_operand_word(mem, mode, addr);
                self.p.z = self.c & val == 0;
                if mode != AddrMode::Immediate {
                    self.p.n = val & 0x8000 != 0;
                    self.p.v = val & 0x4000 != 0;
                }
                self.cycles += 1;
                if mode == AddrMode::Immediate {
                    size += 1;
                }
            }
        }

        if mode == AddrMode::AbsoluteX {
            self.operand_cross_penalty(mem, addr);
        }
        self.dp_penalty(mode);
        self.update_pc(size);
        self.cycles += cycles as u64;
    }

    /// TRB: clear the accumulator's set bits in the memory operand.
    pub fn trb<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        self.bit_rmw(mem, size, cycles, mode, addr, |a, v| v & !a);
    }

    /// TSB: set the accumulator's set bits in the memory operand.
    pub fn tsb<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        self.bit_rmw(mem, size, cycles, mode, addr, |a, v| v | a);
    }

    fn bit_rmw<M, F>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32, f: F)
    where
        M: Memory,
        F: Fn(u16, u16) -> u16,
    {
        match self.width_a() {
            Width::W8 => {
                let val = mem.read(addr, self.setacc);
                let a = (self.c & 0xFF) as u8;
                mem.write(addr, (f(a as u16, val as u16) & 0xFF) as u8, self.setacc);
                self.p.z = a & val == 0;
            }
            Width::W16 => {
                // Direct page bank-wraps the wide access; absolute does not.
                let val = if mode == AddrMode::DirectPage {
                    let val = mem.read_word_bank_wrap(addr, self.setacc);
                    mem.write_word_bank_wrap(addr, f(self.c, val), self.setacc);
                    val
                } else {
                    let val = mem.read_word(addr, self.setacc);
                    mem.write_word(addr, f(self.c, val), self.setacc);
                    val
                };
                self.p.z = self.c & val == 0;
                // Wide read plus wide write.
                self.cycles += 2;
            }
        }

        self.dp_penalty(mode);
        self.update_pc(size as u16);
        self.cycles += cycles as u64;
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::{AddrMode, Cpu};
    use crate::memory::{ArrayMemory, Memory};

    fn setup() -> (Cpu, ArrayMemory) {
        (Cpu::new(), ArrayMemory::new())
    }

    #[test]
    fn test_and_8bit_preserves_high_byte() {
        let (mut cpu, mut mem) = setup();
        cpu.c = 0xBEF0;
        mem.write(0x0030, 0x3C, true);
        cpu.and(&mut mem, 2, 3, AddrMode::DirectPage, 0x0030);
        assert_eq!(cpu.c, 0xBE30);
        assert!(!cpu.p.z);
        assert!(!cpu.p.n);
    }

    #[test]
    fn test_ora_16bit() {
        let (mut cpu, mut mem) = setup();
        cpu.p.e = false;
        cpu.p.m = false;
        cpu.c = 0x00F0;
        mem.write_word(0x0030, 0x8001, true);
        cpu.ora(&mut mem, 3, 4, AddrMode::Absolute, 0x0030);
        assert_eq!(cpu.c, 0x80F1);
        assert!(cpu.p.n);
        assert_eq!(cpu.cycles, 5);
    }

    #[test]
    fn test_eor_zero_result() {
        let (mut cpu, mut mem) = setup();
        cpu.c = 0x55;
        mem.write(0x0030, 0x55, true);
        cpu.eor(&mut mem, 2, 3, AddrMode::DirectPage, 0x0030);
        assert_eq!(cpu.c & 0xFF, 0);
        assert!(cpu.p.z);
    }

    #[test]
    fn test_bit_copies_top_bits() {
        let (mut cpu, mut mem) = setup();
        cpu.c = 0x01;
        mem.write(0x0030, 0xC0, true);
        cpu.bit(&mut mem, 2, 3, AddrMode::DirectPage, 0x0030);
        assert!(cpu.p.z, "no common bits");
        assert!(cpu.p.n);
        assert!(cpu.p.v);
        assert_eq!(cpu.c, 0x01, "accumulator untouched");
    }

    #[test]
    fn test_bit_immediate_only_updates_zero() {
        let (mut cpu, mut mem) = setup();
        cpu.p.n = false;
        cpu.p.v = false;
        cpu.c = 0x80;
        cpu.pc = 0x1000;
        mem.write(0x1001, 0x80, true);
        cpu.bit(&mut mem, 2, 2, AddrMode::Immediate, 0x1001);
        assert!(!cpu.p.z);
        assert!(!cpu.p.n, "immediate BIT leaves N alone");
        assert!(!cpu.p.v, "immediate BIT leaves V alone");
    }

    #[test]
    fn test_trb_tsb() {
        let (mut cpu, mut mem) = setup();
        cpu.c = 0x0F;
        mem.write(0x0030, 0x3C, true);
        cpu.trb(&mut mem, 2, 5, AddrMode::DirectPage, 0x0030);
        assert_eq!(mem.read(0x0030, true), 0x30);
        assert!(!cpu.p.z, "operand and accumulator shared bits");

        cpu.tsb(&mut mem, 2, 5, AddrMode::DirectPage, 0x0030);
        assert_eq!(mem.read(0x0030, true), 0x3F);
        assert!(cpu.p.z, "no shared bits before the set");
    }

    #[test]
    fn test_trb_16bit_costs_two_extra_cycles() {
        let (mut cpu, mut mem) = setup();
        cpu.p.e = false;
        cpu.p.m = false;
        cpu.c = 0xFFFF;
        mem.write_word(0x0030, 0x1234, true);
        cpu.trb(&mut mem, 3, 6, AddrMode::Absolute, 0x0030);
        assert_eq!(mem.read_word(0x0030, true), 0x0000);
        assert_eq!(cpu.cycles, 8);
    }
}
