//! Shift/rotate engine: ASL, LSR, ROL, ROR.
//!
//! Targets are the accumulator (implied mode), direct-page memory, or
//! absolute memory. Any other decoded mode is a decoder contract
//! violation: the core crashes and the error is returned to the driver.

use crate::cpu::{AddrMode, Cpu, CpuError, Width};
use crate::memory::Memory;

impl Cpu {
    pub fn asl<M: Memory>(
        &mut self,
        mem: &mut M,
        size: u8,
        cycles: u8,
        mode: AddrMode,
        addr: u32,
    ) -> Result<(), CpuError> {
        self.shift_rmw(mem, "asl", size, cycles, mode, addr, |pre, _, w| match w {
            Width::W8 => ((pre << 1) & 0xFF, pre & 0x80 != 0),
            Width::W16 => (pre << 1, pre & 0x8000 != 0),
        })
    }

    pub fn lsr<M: Memory>(
        &mut self,
        mem: &mut M,
        size: u8,
        cycles: u8,
        mode: AddrMode,
        addr: u32,
    ) -> Result<(), CpuError> {
        self.shift_rmw(mem, "lsr", size, cycles, mode, addr, |pre, _, w| match w {
            Width::W8 => ((pre & 0xFF) >> 1, pre & 0x01 != 0),
            Width::W16 => (pre >> 1, pre & 0x01 != 0),
        })
    }

    pub fn rol<M: Memory>(
        &mut self,
        mem: &mut M,
        size: u8,
        cycles: u8,
        mode: AddrMode,
        addr: u32,
    ) -> Result<(), CpuError> {
        self.shift_rmw(mem, "rol", size, cycles, mode, addr, |pre, c, w| match w {
            Width::W8 => (((pre << 1) & 0xFF) | c as u16, pre & 0x80 != 0),
            Width::W16 => ((pre << 1) | c as u16, pre & 0x8000 != 0),
        })
    }

    pub fn ror<M: Memory>(
        &mut self,
        mem: &mut M,
        size: u8,
        cycles: u8,
        mode: AddrMode,
        addr: u32,
    ) -> Result<(), CpuError> {
        self.shift_rmw(mem, "ror", size, cycles, mode, addr, |pre, c, w| match w {
            Width::W8 => (((pre & 0xFF) >> 1) | ((c as u16) << 7), pre & 0x01 != 0),
            Width::W16 => ((pre >> 1) | ((c as u16) << 15), pre & 0x01 != 0),
        })
    }

    /// Shared shift/rotate body. `f(operand, carry_in, width)` returns the
    /// shifted value and the bit shifted out (the new carry).
    fn shift_rmw<M, F>(
        &mut self,
        mem: &mut M,
        op: &'static str,
        size: u8,
        cycles: u8,
        mode: AddrMode,
        addr: u32,
        f: F,
    ) -> Result<(), CpuError>
    where
        M: Memory,
        F: Fn(u16, bool, Width) -> (u16, bool),
    {
        let w = self.width_a();
        let carry_in = self.p.c;
        let (post, carry_out) = match mode {
            AddrMode::DirectPage | AddrMode::DirectPageX => {
                let (post, carry_out) = match w {
                    Width::W8 => {
                        let pre = mem.read(addr, self.setacc) as u16;
                        let out = f(pre, carry_in, w);
                        mem.write(addr, out.0 as u8, self.setacc);
                        out
                    }
                    Width::W16 => {
                        let pre = mem.read_word_bank_wrap(addr, self.setacc);
                        let out = f(pre, carry_in, w);
                        mem.write_word_bank_wrap(addr, out.0, self.setacc);
                        // Wide read plus wide write.
                        self.cycles += 2;
                        out
                    }
                };
                self.dp_penalty(mode);
                (post, carry_out)
            }
            AddrMode::Absolute | AddrMode::AbsoluteX => match w {
                Width::W8 => {
                    let pre = mem.read(addr, self.setacc) as u16;
                    let out = f(pre, carry_in, w);
                    mem.write(addr, out.0 as u8, self.setacc);
                    out
                }
                Width::W16 => {
                    let pre = mem.read_word(addr, self.setacc);
                    let out = f(pre, carry_in, w);
                    mem.write_word(addr, out.0, self.setacc);
                    self.cycles += 2;
                    out
                }
            },
            AddrMode::Implied => {
                let (post, carry_out) = f(self.c, carry_in, w);
                match w {
                    Width::W8 => self.c = (self.c & 0xFF00) | (post & 0xFF),
                    Width::W16 => self.c = post,
                }
                (post, carry_out)
            }
            _ => return Err(self.crash(op, mode)),
        };

        self.p.c = carry_out;
        self.set_zn(post, w);
        self.update_pc(size as u16);
        self.cycles += cycles as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::{AddrMode, Cpu, CpuError};
    use crate::memory::{ArrayMemory, Memory};

    fn setup() -> (Cpu, ArrayMemory) {
        (Cpu::new(), ArrayMemory::new())
    }

    #[test]
    fn test_asl_accumulator_8bit() {
        let (mut cpu, mut mem) = setup();
        cpu.c = 0xAB81;
        cpu.asl(&mut mem, 1, 2, AddrMode::Implied, 0).unwrap();
        assert_eq!(cpu.c, 0xAB02, "bit 7 shifted out, high byte preserved");
        assert!(cpu.p.c);
        assert!(!cpu.p.z);
        assert!(!cpu.p.n);
    }

    #[test]
    fn test_lsr_carry_from_bit_zero() {
        let (mut cpu, mut mem) = setup();
        cpu.c = 0x03;
        cpu.lsr(&mut mem, 1, 2, AddrMode::Implied, 0).unwrap();
        assert_eq!(cpu.c & 0xFF, 0x01);
        assert!(cpu.p.c);
        cpu.lsr(&mut mem, 1, 2, AddrMode::Implied, 0).unwrap();
        assert_eq!(cpu.c & 0xFF, 0x00);
        assert!(cpu.p.c);
        assert!(cpu.p.z);
    }

    #[test]
    fn test_rol_ror_fold_carry() {
        let (mut cpu, mut mem) = setup();
        cpu.c = 0x80;
        cpu.p.c = false;
        cpu.rol(&mut mem, 1, 2, AddrMode::Implied, 0).unwrap();
        assert_eq!(cpu.c & 0xFF, 0x00);
        assert!(cpu.p.c, "bit 7 rotated out");

        cpu.ror(&mut mem, 1, 2, AddrMode::Implied, 0).unwrap();
        assert_eq!(cpu.c & 0xFF, 0x80, "carry rotated back into bit 7");
        assert!(!cpu.p.c);
    }

    #[test]
    fn test_asl_memory_16bit_costs_two_extra() {
        let (mut cpu, mut mem) = setup();
        cpu.p.e = false;
        cpu.p.m = false;
        mem.write_word(0x0040, 0x4001, true);
        cpu.asl(&mut mem, 3, 6, AddrMode::Absolute, 0x0040).unwrap();
        assert_eq!(mem.read_word(0x0040, true), 0x8002);
        assert!(cpu.p.n);
        assert!(!cpu.p.c);
        assert_eq!(cpu.cycles, 8);
    }

    #[test]
    fn test_ror_16bit_rotates_into_bit_15() {
        let (mut cpu, mut mem) = setup();
        cpu.p.e = false;
        cpu.p.m = false;
        cpu.c = 0x0001;
        cpu.p.c = true;
        cpu.ror(&mut mem, 1, 2, AddrMode::Implied, 0).unwrap();
        assert_eq!(cpu.c, 0x8000);
        assert!(cpu.p.c);
        assert!(cpu.p.n);
    }

    #[test]
    fn test_invalid_mode_crashes() {
        let (mut cpu, mut mem) = setup();
        let err = cpu
            .asl(&mut mem, 2, 5, AddrMode::IndirectIndexedY, 0x0040)
            .unwrap_err();
        assert_eq!(
            err,
            CpuError::InvalidAddressingMode {
                op: "asl",
                mode: AddrMode::IndirectIndexedY
            }
        );
        assert!(cpu.p.crash);
        assert_eq!(cpu.cycles, 0, "no cycles charged on the crash path");
        assert_eq!(cpu.pc, 0, "PC not advanced on the crash path");
    }
}
