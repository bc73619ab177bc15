//! Arithmetic engine: ADC, SBC (binary and BCD decimal) and the
//! compare family (CMP, CPX, CPY).
//!
//! Decimal mode corrects each nibble by +/-6 with carry into the next
//! nibble (the 6502.org decimal-mode algorithm), two nibbles for 8-bit
//! operands and four for 16-bit. Overflow is always derived from the
//! binary result; Negative and Zero come from the stored (possibly
//! decimal-corrected) value. ADC's carry-out reflects the corrected sum
//! (decimal carry); SBC's carry-out is the binary no-borrow condition.

use crate::cpu::{AddrMode, Cpu, Width};
use crate::memory::Memory;

/// Two-nibble decimal addition, returning the corrected sum (carry in
/// bit 8 and above).
fn bcd_add_8(a: u32, val: u32, carry_in: u32) -> u32 {
    let mut al = (a & 0x0F) + (val & 0x0F) + carry_in;
    if al >= 0x0A {
        al = ((al + 0x06) & 0x0F) + 0x10;
    }
    al = (a & 0xF0) + (val & 0xF0) + al;
    if al >= 0xA0 {
        al += 0x60;
    }
    al
}

/// Four-nibble decimal addition, carry in bit 16 and above.
fn bcd_add_16(a: u32, val: u32, carry_in: u32) -> u32 {
    let mut al = (a & 0x000F) + (val & 0x000F) + carry_in;
    if al >= 0x000A {
        al = ((al + 0x0006) & 0x000F) + 0x0010;
    }
    al = (a & 0x00F0) + (val & 0x00F0) + al;
    if al >= 0x00A0 {
        al = ((al + 0x0060) & 0x00FF) + 0x0100;
    }
    al = (a & 0x0F00) + (val & 0x0F00) + al;
    if al >= 0x0A00 {
        al = ((al + 0x0600) & 0x0FFF) + 0x1000;
    }
    al = (a & 0xF000) + (val & 0xF000) + al;
    if al >= 0xA000 {
        al += 0x6000;
    }
    al
}

/// Two-nibble decimal subtraction; the caller keeps flags from the
/// binary difference, only the stored value comes from here.
fn bcd_sub_8(a: i32, val: i32, carry_in: i32) -> i32 {
    let mut al = (a & 0x0F) - (val & 0x0F) + carry_in - 1;
    if al < 0 {
        al = ((al - 0x06) & 0x0F) - 0x10;
    }
    al = (a & 0xF0) - (val & 0xF0) + al;
    if al < 0 {
        al -= 0x60;
    }
    al
}

/// Four-nibble decimal subtraction.
fn bcd_sub_16(a: i32, val: i32, carry_in: i32) -> i32 {
    let mut al = (a & 0x000F) - (val & 0x000F) + carry_in - 1;
    if al < 0 {
        al = ((al - 0x0006) & 0x000F) - 0x0010;
    }
    al = (a & 0x00F0) - (val & 0x00F0) + al;
    if al < 0 {
        al = ((al - 0x0060) & 0x00FF) - 0x0100;
    }
    al = (a & 0x0F00) - (val & 0x0F00) + al;
    if al < 0 {
        al = ((al - 0x0600) & 0x0FFF) - 0x1000;
    }
    al = (a & 0xF000) - (val & 0xF000) + al;
    if al < 0 {
        al -= 0x6000;
    }
    al
}

impl Cpu {
    pub fn adc<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        let mut size = size as u16;
        let carry_in = self.p.c as u32;
        match self.width_a() {
            Width::W8 => {
                let a = (self.c & 0xFF) as u32;
                let val = mem.read(addr, self.setacc) as u32;
                let bsum = a + val + carry_in;
                let result = if self.p.d {
                    bcd_add_8(a, val, carry_in)
                } else {
                    bsum
                };
                self.p.v = (a ^ bsum) & (val ^ bsum) & 0x80 != 0;
                self.c = (self.c & 0xFF00) | (result & 0xFF) as u16;
                self.p.c = result >= 0x100;
                self.p.n = result & 0x80 != 0;
                self.p.z = result & 0xFF == 0;
            }
            Width::W16 => {
                let a = self.c as u32;
                let val = self.read_operand_word(mem, mode, addr) as u32;
                let bsum = a + val + carry_in;
                let result = if self.p.d {
                    bcd_add_16(a, val, carry_in)
                } else {
                    bsum
                };
                self.p.v = (a ^ bsum) & (val ^ bsum) & 0x8000 != 0;
                self.c = (result & 0xFFFF) as u16;
                self.p.c = result >= 0x1_0000;
                self.p.n = result & 0x8000 != 0;
                self.p.z = result & 0xFFFF == 0;

                self.cycles += 1;
                if mode == AddrMode::Immediate {
                    size += 1;
                }
            }
        }

        self.index_cross_penalty(mode, addr);
        self.dp_penalty(mode);
        self.update_pc(size);
        self.cycles += cycles as u64;
    }

    pub fn sbc<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        let mut size = size as u16;
        let carry_in = self.p.c as u32;
        match self.width_a() {
            Width::W8 => {
                let a = (self.c & 0xFF) as u32;
                let val = mem.read(addr, self.setacc) as u32;
                // Binary difference as A + !B + C; bit 8 is the
                // no-borrow carry.
                let bsum = a + (!val & 0xFF) + carry_in;
                let result = if self.p.d {
                    (bcd_sub_8(a as i32, val as i32, carry_in as i32) & 0xFF) as u32
                } else {
                    bsum & 0xFF
                };
                self.p.v = (a ^ bsum) & ((!val & 0xFF) ^ bsum) & 0x80 != 0;
                self.p.c = bsum >= 0x100;
                self.c = (self.c & 0xFF00) | result as u16;
                self.p.n = result & 0x80 != 0;
                self.p.z = result == 0;
            }
            Width::W16 => {
                let a = self.c as u32;
                let val = self.read_operand_word(mem, mode, addr) as u32;
                let bsum = a + (!val & 0xFFFF) + carry_in;
                let result = if self.p.d {
                    (bcd_sub_16(a as i32, val as i32, carry_in as i32) & 0xFFFF) as u32
                } else {
                    bsum & 0xFFFF
                };
                self.p.v = (a ^ bsum) & ((!val & 0xFFFF) ^ bsum) & 0x8000 != 0;
                self.p.c = bsum >= 0x1_0000;
                self.c = result as u16;
                self.p.n = result & 0x8000 != 0;
                self.p.z = result == 0;

                self.cycles += 1;
                if mode == AddrMode::Immediate {
                    size += 1;
                }
            }
        }

        self.index_cross_penalty(mode, addr);
        self.dp_penalty(mode);
        self.update_pc(size);
        self.cycles += cycles as u64;
    }

    pub fn cmp<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        let mut size = size as u16;
        match self.width_a() {
            Width::W8 => {
                let val = mem.read(addr, self.setacc) as u16;
                self.compare8(self.c, val);
            }
            Width::W16 => {
                let val = self.read_operand_word(mem, mode, addr);
                self.compare16(self.c, val);
                self.cycles += 1;
                if mode == AddrMode::Immediate {
                    size += 1;
                }
            }
        }

        self.index_cross_penalty(mode, addr);
        self.dp_penalty(mode);
        self.update_pc(size);
        self.cycles += cycles as u64;
    }

    pub fn cpx<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        let x = self.x;
        self.compare_index(mem, x, size, cycles, mode, addr);
    }

    pub fn cpy<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        let y = self.y;
        self.compare_index(mem, y, size, cycles, mode, addr);
    }

    /// CPX/CPY body: direct-page, immediate or absolute only.
    fn compare_index<M: Memory>(
        &mut self,
        mem: &mut M,
        reg: u16,
        size: u8,
        cycles: u8,
        mode: AddrMode,
        addr: u32,
    ) {
        let mut size = size as u16;
        match self.width_x() {
            Width::W8 => {
                let val = mem.read(addr, self.setacc) as u16;
                self.compare8(reg, val);
            }
            Width::W16 => {
                let val = self.read_operand_word(mem, mode, addr);
                self.compare16(reg, val);
                self.cycles += 1;
                if mode == AddrMode::Immediate {
                    size += 1;
                }
            }
        }

        self.dp_penalty(mode);
        self.update_pc(size);
        self.cycles += cycles as u64;
    }

    fn compare8(&mut self, reg: u16, val: u16) {
        let res = (reg & 0xFF).wrapping_sub(val & 0xFF) & 0xFF;
        self.p.n = res & 0x80 != 0;
        self.p.z = res == 0;
        self.p.c = (reg & 0xFF) >= (val & 0xFF);
    }

    fn compare16(&mut self, reg: u16, val: u16) {
        let res = reg.wrapping_sub(val);
        self.p.n = res & 0x8000 != 0;
        self.p.z = res == 0;
        self.p.c = reg >= val;
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
    fn test_adc_binary_8bit() {
        let (mut cpu, mut mem) = setup();
        cpu.c = 0xAB10;
        mem.write(0x0020, 0x20, true);

        cpu.adc(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);
        assert_eq!(cpu.c, 0xAB30, "high byte preserved in 8-bit mode");
        assert!(!cpu.p.c);
        assert!(!cpu.p.z);
        assert!(!cpu.p.n);
        assert!(!cpu.p.v);
        assert_eq!(cpu.pc, 2);
        assert_eq!(cpu.cycles, 3);
    }

    #[test]
    fn test_adc_overflow_from_binary_sum() {
        let (mut cpu, mut mem) = setup();
        mem.write(0x0020, 0x50, true);
        cpu.c = 0x50;
        cpu.adc(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);
        assert!(cpu.p.v, "0x50 + 0x50 overflows signed 8-bit");
        assert!(!cpu.p.c);

        let (mut cpu, mut mem) = setup();
        mem.write(0x0020, 0xF0, true);
        cpu.c = 0xF0;
        cpu.adc(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);
        assert!(!cpu.p.v, "-16 + -16 does not overflow");
        assert!(cpu.p.c);
        assert_eq!(cpu.c & 0xFF, 0xE0);
    }

    #[test]
    fn test_adc_16bit_immediate_grows_operand() {
        let (mut cpu, mut mem) = setup();
        cpu.p.e = false;
        cpu.p.m = false;
        cpu.pc = 0x1000;
        cpu.c = 0x0001;
        mem.write_word(0x1001, 0x1234, true);

        cpu.adc(&mut mem, 2, 2, AddrMode::Immediate, 0x1001);
        assert_eq!(cpu.c, 0x1235);
        assert_eq!(cpu.pc, 0x1003, "16-bit immediate is one byte longer");
        assert_eq!(cpu.cycles, 3, "one extra cycle for the 16-bit read");
    }

    #[test]
    fn test_adc_decimal_8bit() {
        let (mut cpu, mut mem) = setup();
        cpu.p.d = true;
        cpu.c = 0x25;
        mem.write(0x0020, 0x18, true);
        cpu.adc(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);
        assert_eq!(cpu.c & 0xFF, 0x43);
        assert!(!cpu.p.c);

        let (mut cpu, mut mem) = setup();
        cpu.p.d = true;
        cpu.c = 0x99;
        mem.write(0x0020, 0x01, true);
        cpu.adc(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);
        assert_eq!(cpu.c & 0xFF, 0x00);
        assert!(cpu.p.c, "decimal carry out of 0x99 + 0x01");
        assert!(cpu.p.z);
    }

    #[test]
    fn test_decimal_round_trip() {
        for &(a, b) in &[
            (0x25u16, 0x18u16),
            (0x50, 0x50),
            (0x99, 0x01),
            (0x00, 0x00),
            (0x10, 0x05),
            (0x81, 0x19),
        ] {
            let (mut cpu, mut mem) = setup();
            cpu.p.d = true;
            cpu.c = a;
            cpu.p.c = false;
            mem.write(0x0020, b as u8, true);
            cpu.adc(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);

            // Borrow-free subtract of the same operand undoes the
            // addition, whether or not the sum carried.
            cpu.p.c = true;
            cpu.sbc(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);
            assert_eq!(
                cpu.c & 0xFF,
                a,
                "decimal round trip failed for {a:#04x} + {b:#04x}"
            );
        }
    }

    #[test]
    fn test_sbc_binary_carry_is_no_borrow() {
        let (mut cpu, mut mem) = setup();
        cpu.c = 10;
        cpu.p.c = true;
        mem.write(0x0020, 5, true);
        cpu.sbc(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);
        assert_eq!(cpu.c & 0xFF, 5);
        assert!(cpu.p.c, "no borrow leaves carry set");

        let (mut cpu, mut mem) = setup();
        cpu.c = 5;
        cpu.p.c = true;
        mem.write(0x0020, 10, true);
        cpu.sbc(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);
        assert_eq!(cpu.c & 0xFF, 0xFB);
        assert!(!cpu.p.c, "borrow clears carry");
        assert!(cpu.p.n);
    }

    #[test]
    fn test_sbc_binary_flags_unchanged_by_decimal_mode() {
        for &(a, b, cin) in &[
            (0x50u16, 0x21u8, true),
            (0x12, 0x34, true),
            (0x80, 0x01, true),
            (0x00, 0x99, false),
        ] {
            let (mut cpu, mut mem) = setup();
            cpu.c = a;
            cpu.p.c = cin;
            mem.write(0x0020, b, true);
            cpu.sbc(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);
            let (bin_c, bin_v) = (cpu.p.c, cpu.p.v);

            let (mut cpu, mut mem) = setup();
            cpu.p.d = true;
            cpu.c = a;
            cpu.p.c = cin;
            mem.write(0x0020, b, true);
            cpu.sbc(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);
            assert_eq!(cpu.p.c, bin_c, "carry differs for {a:#04x} - {b:#04x}");
            assert_eq!(cpu.p.v, bin_v, "overflow differs for {a:#04x} - {b:#04x}");
        }
    }

    #[test]
    fn test_adc_16bit_decimal() {
        let (mut cpu, mut mem) = setup();
        cpu.p.e = false;
        cpu.p.m = false;
        cpu.p.d = true;
        cpu.c = 0x1234;
        mem.write_word(0x0020, 0x0766, true);
        cpu.adc(&mut mem, 3, 4, AddrMode::Absolute, 0x0020);
        assert_eq!(cpu.c, 0x2000);
        assert!(!cpu.p.c);
    }

    #[test]
    fn test_adc_page_cross_penalty_is_exactly_one() {
        let run = |addr: u32| {
            let (mut cpu, mut mem) = setup();
            cpu.x = 0x20;
            mem.write(addr, 1, true);
            cpu.adc(&mut mem, 3, 4, AddrMode::AbsoluteX, addr);
            cpu.cycles
        };
        // base 0x10F0 + 0x20 crosses into page 0x11xx
        assert_eq!(run(0x1110) - run(0x1020), 1);
    }

    #[test]
    fn test_adc_dp_penalty_is_exactly_one() {
        let run = |d: u16| {
            let (mut cpu, mut mem) = setup();
            cpu.d = d;
            mem.write(0x0020, 1, true);
            cpu.adc(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);
            cpu.cycles
        };
        assert_eq!(run(0x0001) - run(0x0000), 1);
        assert_eq!(run(0x0100), run(0x0000), "only the low byte of D counts");
    }

    #[test]
    fn test_cmp_flags() {
        let (mut cpu, mut mem) = setup();
        cpu.c = 0x40;
        mem.write(0x0020, 0x40, true);
        cpu.cmp(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);
        assert!(cpu.p.z);
        assert!(cpu.p.c);
        assert!(!cpu.p.n);
        assert_eq!(cpu.c, 0x40, "compare does not modify the accumulator");

        let (mut cpu, mut mem) = setup();
        cpu.c = 0x10;
        mem.write(0x0020, 0x20, true);
        cpu.cmp(&mut mem, 2, 3, AddrMode::DirectPage, 0x0020);
        assert!(!cpu.p.z);
        assert!(!cpu.p.c);
        assert!(cpu.p.n);
    }

    #[test]
    fn test_cpx_16bit() {
        let (mut cpu, mut mem) = setup();
        cpu.p.e = false;
        cpu.p.xb = false;
        cpu.x = 0x1234;
        mem.write_word(0x0040, 0x1234, true);
        cpu.cpx(&mut mem, 3, 4, AddrMode::Absolute, 0x0040);
        assert!(cpu.p.z);
        assert!(cpu.p.c);
        assert_eq!(cpu.cycles, 5, "wide compare costs one extra cycle");
    }
}
