//! Data movement engine: loads, stores, transfers, increment/decrement,
//! stack push/pull, and the re-entrant block-move pair MVN/MVP.

use crate::cpu::{AddrMode, Cpu, CpuError, StackWrap, Width};
use crate::memory::{add_bank_wrap, Memory};

impl Cpu {
    pub fn lda<M: Memory>(
        &mut self,
        mem: &mut M,
        size: u8,
        cycles: u8,
        mode: AddrMode,
        addr: u32,
    ) -> Result<(), CpuError> {
        let mut size = size as u16;
        let w = self.width_a();
        if mode == AddrMode::Immediate && w == Width::W16 {
            size += 1;
        }

        match mode {
            AddrMode::DirectPage | AddrMode::DirectPageX => {
                self.dp_penalty(mode);
                self.load_a(mem, addr, true);
            }
            AddrMode::Immediate | AddrMode::StackRelative => self.load_a(mem, addr, true),
            AddrMode::IndirectIndexedY => {
                self.inddpy_cross_penalty(mem, addr);
                self.dp_penalty(mode);
                self.load_a(mem, addr, false);
            }
            AddrMode::DirectPageIndirect
            | AddrMode::DirectPageIndirectLong
            | AddrMode::DirectPageIndexedIndirectX
            | AddrMode::IndirectIndexedLongY => {
                self.dp_penalty(mode);
                self.load_a(mem, addr, false);
            }
            AddrMode::Absolute
            | AddrMode::AbsoluteLong
            | AddrMode::AbsoluteLongX
            | AddrMode::StackRelativeIndirectY => self.load_a(mem, addr, false),
            AddrMode::AbsoluteX | AddrMode::AbsoluteY => {
                self.operand_cross_penalty(mem, addr);
                self.load_a(mem, addr, false);
            }
            _ => return Err(self.crash("lda", mode)),
        }

        self.set_zn_a();
        if w == Width::W16 {
            self.cycles += 1;
        }
        self.update_pc(size);
        self.cycles += cycles as u64;
        Ok(())
    }

    pub fn sta<M: Memory>(
        &mut self,
        mem: &mut M,
        size: u8,
        cycles: u8,
        mode: AddrMode,
        addr: u32,
    ) -> Result<(), CpuError> {
        match mode {
            AddrMode::DirectPage | AddrMode::DirectPageX => {
                self.dp_penalty(mode);
                self.store_a(mem, addr, true);
            }
            AddrMode::StackRelative => self.store_a(mem, addr, true),
            AddrMode::IndirectIndexedY => {
                self.inddpy_cross_penalty(mem, addr);
                self.dp_penalty(mode);
                self.store_a(mem, addr, false);
            }
            AddrMode::DirectPageIndirect
            | AddrMode::DirectPageIndirectLong
            | AddrMode::DirectPageIndexedIndirectX
            | AddrMode::IndirectIndexedLongY => {
                self.dp_penalty(mode);
                self.store_a(mem, addr, false);
            }
            AddrMode::Absolute
            | AddrMode::AbsoluteLong
            | AddrMode::AbsoluteLongX
            | AddrMode::StackRelativeIndirectY => self.store_a(mem, addr, false),
            AddrMode::AbsoluteX | AddrMode::AbsoluteY => {
                self.operand_cross_penalty(mem, addr);
                self.store_a(mem, addr, false);
            }
            _ => return Err(self.crash("sta", mode)),
        }

        if self.width_a() == Width::W16 {
            self.cycles += 1;
        }
        self.update_pc(size as u16);
        self.cycles += cycles as u64;
        Ok(())
    }

    pub fn ldx<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        let mut size = size as u16;
        match mode {
            AddrMode::DirectPage | AddrMode::DirectPageY => {
                self.x = self.read_index(mem, addr, true);
                self.dp_penalty(mode);
            }
            AddrMode::Absolute => self.x = self.read_index(mem, addr, false),
            AddrMode::AbsoluteY => {
                self.x = self.read_index(mem, addr, false);
                self.operand_cross_penalty(mem, addr);
            }
            AddrMode::Immediate => {
                self.x = self.read_index(mem, addr, true);
                if self.width_x() == Width::W16 {
                    size += 1;
                }
            }
            _ => {}
        }
        self.update_pc(size);
        self.cycles += cycles as u64;
    }

    pub fn ldy<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        let mut size = size as u16;
        match mode {
            AddrMode::DirectPage | AddrMode::DirectPageX => {
                self.y = self.read_index(mem, addr, true);
                self.dp_penalty(mode);
            }
            AddrMode::Absolute => self.y = self.read_index(mem, addr, false),
            AddrMode::AbsoluteX => {
                self.y = self.read_index(mem, addr, false);
                self.operand_cross_penalty(mem, addr);
            }
            AddrMode::Immediate => {
                self.y = self.read_index(mem, addr, true);
                if self.width_x() == Width::W16 {
                    size += 1;
                }
            }
            _ => {}
        }
        self.update_pc(size);
        self.cycles += cycles as u64;
    }

    pub fn stx<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        if matches!(
            mode,
            AddrMode::DirectPage | AddrMode::DirectPageY | AddrMode::Absolute
        ) {
            let wide = self.width_x() == Width::W16;
            let x = self.x;
            self.store_low_high(mem, mode, addr, x, wide);
        }
        self.update_pc(size as u16);
        self.cycles += cycles as u64;
    }

    pub fn sty<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        if matches!(
            mode,
            AddrMode::DirectPage | AddrMode::DirectPageX | AddrMode::Absolute
        ) {
            let wide = self.width_x() == Width::W16;
            let y = self.y;
            self.store_low_high(mem, mode, addr, y, wide);
        }
        self.update_pc(size as u16);
        self.cycles += cycles as u64;
    }

    pub fn stz<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        if matches!(
            mode,
            AddrMode::DirectPage | AddrMode::DirectPageX | AddrMode::Absolute | AddrMode::AbsoluteX
        ) {
            let wide = self.width_a() == Width::W16;
            self.store_low_high(mem, mode, addr, 0, wide);
        }
        self.update_pc(size as u16);
        self.cycles += cycles as u64;
    }

    fn load_a<M: Memory>(&mut self, mem: &mut M, addr: u32, wrapped: bool) {
        match self.width_a() {
            Width::W8 => self.c = (self.c & 0xFF00) | mem.read(addr, self.setacc) as u16,
            Width::W16 => {
                self.c = if wrapped {
                    mem.read_word_bank_wrap(addr, self.setacc)
                } else {
                    mem.read_word(addr, self.setacc)
                }
            }
        }
    }

    fn store_a<M: Memory>(&mut self, mem: &mut M, addr: u32, wrapped: bool) {
        match self.width_a() {
            Width::W8 => mem.write(addr, (self.c & 0xFF) as u8, self.setacc),
            Width::W16 => {
                if wrapped {
                    mem.write_word_bank_wrap(addr, self.c, self.setacc);
                } else {
                    mem.write_word(addr, self.c, self.setacc);
                }
            }
        }
    }

    /// Read an index-register operand at the active index width, setting
    /// Z/N and charging the wide-read cycle.
    fn read_index<M: Memory>(&mut self, mem: &mut M, addr: u32, wrapped: bool) -> u16 {
        match self.width_x() {
            Width::W8 => {
                let val = mem.read(addr, self.setacc) as u16;
                self.p.z = val == 0;
                self.p.n = val & 0x80 != 0;
                val
            }
            Width::W16 => {
                let val = if wrapped {
                    mem.read_word_bank_wrap(addr, self.setacc)
                } else {
                    mem.read_word(addr, self.setacc)
                };
                self.p.z = val == 0;
                self.p.n = val & 0x8000 != 0;
                self.cycles += 1;
                val
            }
        }
    }

    /// Write a register low byte (and, when wide, its high byte) at the
    /// store-address wrap flavor the mode requires: direct page wraps the
    /// high-byte write within the bank, absolute does not.
    fn store_low_high<M: Memory>(
        &mut self,
        mem: &mut M,
        mode: AddrMode,
        addr: u32,
        val: u16,
        wide: bool,
    ) {
        mem.write(addr, (val & 0xFF) as u8, self.setacc);
        if wide {
            let hi_addr = if mode.is_direct_page_based() {
                add_bank_wrap(addr, 1)
            } else {
                addr.wrapping_add(1) & 0xFF_FFFF
            };
            mem.write(hi_addr, (val >> 8) as u8, self.setacc);
            self.cycles += 1;
        }
        self.dp_penalty(mode);
    }

    // ------------------------------------------------------------------
    // Register transfers
    // ------------------------------------------------------------------

    pub fn tax(&mut self) {
        let w = self.width_x();
        self.x = match w {
            Width::W8 => self.c & 0xFF,
            Width::W16 => self.c,
        };
        let x = self.x;
        self.set_zn(x, w);
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn tay(&mut self) {
        let w = self.width_x();
        self.y = match w {
            Width::W8 => self.c & 0xFF,
            Width::W16 => self.c,
        };
        let y = self.y;
        self.set_zn(y, w);
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn txa(&mut self) {
        match self.width_a() {
            Width::W8 => self.c = (self.c & 0xFF00) | (self.x & 0xFF),
            Width::W16 => self.c = self.x,
        }
        self.set_zn_a();
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn tya(&mut self) {
        match self.width_a() {
            Width::W8 => self.c = (self.c & 0xFF00) | (self.y & 0xFF),
            Width::W16 => self.c = self.y,
        }
        self.set_zn_a();
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn txy(&mut self) {
        let w = self.width_x();
        self.y = match w {
            Width::W8 => self.x & 0xFF,
            Width::W16 => self.x,
        };
        let y = self.y;
        self.set_zn(y, w);
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn tyx(&mut self) {
        let w = self.width_x();
        self.x = match w {
            Width::W8 => self.y & 0xFF,
            Width::W16 => self.y,
        };
        let x = self.x;
        self.set_zn(x, w);
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn tsx(&mut self) {
        let w = self.width_x();
        self.x = match w {
            Width::W8 => self.sp & 0xFF,
            Width::W16 => self.sp,
        };
        let x = self.x;
        self.set_zn(x, w);
        self.update_pc(1);
        self.cycles += 2;
    }

    /// TXS sets no flags; the written width follows the index flag, and
    /// emulation mode keeps the pointer on page 1.
    pub fn txs(&mut self) {
        if self.p.e {
            self.sp = (self.x & 0xFF) | 0x0100;
        } else if self.p.xb {
            self.sp = self.x & 0xFF;
        } else {
            self.sp = self.x;
        }
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn tcs(&mut self) {
        self.sp = if self.p.e {
            (self.c & 0xFF) | 0x0100
        } else {
            self.c
        };
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn tsc(&mut self) {
        self.c = if self.p.e {
            (self.sp & 0xFF) | 0x0100
        } else {
            self.sp
        };
        self.p.n = self.c & 0x8000 != 0;
        self.p.z = self.c == 0;
        self.update_pc(1);
        self.cycles += 2;
    }

    /// TCD/TDC always transfer the full 16 bits regardless of width flags.
    pub fn tcd(&mut self) {
        self.d = self.c;
        self.p.z = self.d == 0;
        self.p.n = self.d & 0x8000 != 0;
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn tdc(&mut self) {
        self.c = self.d;
        self.p.z = self.c == 0;
        self.p.n = self.c & 0x8000 != 0;
        self.update_pc(1);
        self.cycles += 2;
    }

    /// XBA swaps accumulator bytes; N/Z always reflect the new low byte.
    pub fn xba(&mut self) {
        self.c = (self.c << 8) | (self.c >> 8);
        self.p.n = self.c & 0x80 != 0;
        self.p.z = self.c & 0xFF == 0;
        self.update_pc(1);
        self.cycles += 3;
    }

    // ------------------------------------------------------------------
    // Increment / decrement
    // ------------------------------------------------------------------

    pub fn ina(&mut self) {
        match self.width_a() {
            Width::W8 => self.c = (self.c & 0xFF00) | (self.c.wrapping_add(1) & 0xFF),
            Width::W16 => self.c = self.c.wrapping_add(1),
        }
        self.set_zn_a();
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn dea(&mut self) {
        match self.width_a() {
            Width::W8 => self.c = (self.c & 0xFF00) | (self.c.wrapping_sub(1) & 0xFF),
            Width::W16 => self.c = self.c.wrapping_sub(1),
        }
        self.set_zn_a();
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn inx(&mut self) {
        let x = self.x.wrapping_add(1);
        self.step_index_x(x);
    }

    pub fn dex(&mut self) {
        let x = self.x.wrapping_sub(1);
        self.step_index_x(x);
    }

    pub fn iny(&mut self) {
        let y = self.y.wrapping_add(1);
        self.step_index_y(y);
    }

    pub fn dey(&mut self) {
        let y = self.y.wrapping_sub(1);
        self.step_index_y(y);
    }

    fn step_index_x(&mut self, val: u16) {
        let w = self.width_x();
        self.x = match w {
            Width::W8 => val & 0xFF,
            Width::W16 => val,
        };
        let x = self.x;
        self.set_zn(x, w);
        self.update_pc(1);
        self.cycles += 2;
    }

    fn step_index_y(&mut self, val: u16) {
        let w = self.width_x();
        self.y = match w {
            Width::W8 => val & 0xFF,
            Width::W16 => val,
        };
        let y = self.y;
        self.set_zn(y, w);
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn inc<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        self.rmw_delta(mem, size, cycles, mode, addr, 1);
    }

    pub fn dec<M: Memory>(&mut self, mem: &mut M, size: u8, cycles: u8, mode: AddrMode, addr: u32) {
        self.rmw_delta(mem, size, cycles, mode, addr, 0xFFFF);
    }

    fn rmw_delta(
        &mut self,
        mem: &mut impl Memory,
        size: u8,
        cycles: u8,
        mode: AddrMode,
        addr: u32,
        delta: u16,
    ) {
        if matches!(
            mode,
            AddrMode::DirectPage | AddrMode::DirectPageX | AddrMode::Absolute | AddrMode::AbsoluteX
        ) {
            let w = self.width_a();
            let wrapped = mode.is_direct_page_based();
            match w {
                Width::W8 => {
                    let val = mem.read(addr, self.setacc).wrapping_add(delta as u8);
                    mem.write(addr, val, self.setacc);
                    self.set_zn(val as u16, w);
                }
                Width::W16 => {
                    let val = if wrapped {
                        mem.read_word_bank_wrap(addr, self.setacc)
                    } else {
                        mem.read_word(addr, self.setacc)
                    }
                    .wrapping_add(delta);
                    if wrapped {
                        mem.write_word_bank_wrap(addr, val, self.setacc);
                    } else {
                        mem.write_word(addr, val, self.setacc);
                    }
                    self.set_zn(val, w);
                    // Wide read plus wide write.
                    self.cycles += 2;
                }
            }
            self.dp_penalty(mode);
        }
        self.update_pc(size as u16);
        self.cycles += cycles as u64;
    }

    // ------------------------------------------------------------------
    // Stack push / pull
    // ------------------------------------------------------------------

    pub fn pha<M: Memory>(&mut self, mem: &mut M) {
        match self.width_a() {
            Width::W8 => {
                let val = (self.c & 0xFF) as u8;
                self.stack_push_byte(mem, val);
                self.cycles += 3;
            }
            Width::W16 => {
                let val = self.c;
                self.stack_push_word(mem, val, StackWrap::Page1);
                self.cycles += 4;
            }
        }
        self.update_pc(1);
    }

    pub fn pla<M: Memory>(&mut self, mem: &mut M) {
        match self.width_a() {
            Width::W8 => {
                let val = self.stack_pop_byte(mem, StackWrap::Page1);
                self.c = (self.c & 0xFF00) | val as u16;
                self.cycles += 4;
            }
            Width::W16 => {
                self.c = self.stack_pop_word(mem, StackWrap::Page1);
                self.cycles += 5;
            }
        }
        self.set_zn_a();
        self.update_pc(1);
    }

    pub fn phx<M: Memory>(&mut self, mem: &mut M) {
        let x = self.x;
        self.push_index(mem, x);
    }

    pub fn phy<M: Memory>(&mut self, mem: &mut M) {
        let y = self.y;
        self.push_index(mem, y);
    }

    pub fn plx<M: Memory>(&mut self, mem: &mut M) {
        self.x = self.pull_index(mem);
        self.update_pc(1);
    }

    pub fn ply<M: Memory>(&mut self, mem: &mut M) {
        self.y = self.pull_index(mem);
        self.update_pc(1);
    }

    fn push_index<M: Memory>(&mut self, mem: &mut M, val: u16) {
        match self.width_x() {
            Width::W8 => {
                self.stack_push_byte(mem, (val & 0xFF) as u8);
                self.cycles += 3;
            }
            Width::W16 => {
                self.stack_push_word(mem, val, StackWrap::Page1);
                self.cycles += 4;
            }
        }
        self.update_pc(1);
    }

    fn pull_index<M: Memory>(&mut self, mem: &mut M) -> u16 {
        let w = self.width_x();
        let val = match w {
            Width::W8 => {
                self.cycles += 4;
                self.stack_pop_byte(mem, StackWrap::Page1) as u16
            }
            Width::W16 => {
                self.cycles += 5;
                self.stack_pop_word(mem, StackWrap::Page1)
            }
        };
        self.set_zn(val, w);
        val
    }

    pub fn phb<M: Memory>(&mut self, mem: &mut M) {
        let dbr = self.dbr;
        self.stack_push_byte(mem, dbr);
        self.cycles += 3;
        self.update_pc(1);
    }

    pub fn phk<M: Memory>(&mut self, mem: &mut M) {
        let pbr = self.pbr;
        self.stack_push_byte(mem, pbr);
        self.cycles += 3;
        self.update_pc(1);
    }

    pub fn php<M: Memory>(&mut self, mem: &mut M) {
        let sr = self.p.as_byte();
        self.stack_push_byte(mem, sr);
        self.cycles += 3;
        self.update_pc(1);
    }

    pub fn plp<M: Memory>(&mut self, mem: &mut M) {
        let sr = self.p.as_byte();
        let val = self.stack_pop_byte(mem, StackWrap::Page1);
        if self.p.e {
            // Bit 5 is unaffected by the pull in emulation mode.
            self.p.set_from_byte((sr & 0x20) | (val & 0xDF));
        } else {
            self.p.set_from_byte(val);
        }
        self.cycles += 4;
        self.update_pc(1);
    }

    /// PHD/PLD and PLB run the stack pointer across the full 16-bit range
    /// even in emulation mode.
    pub fn phd<M: Memory>(&mut self, mem: &mut M) {
        let d = self.d;
        self.stack_push_word(mem, d, StackWrap::Free);
        self.cycles += 4;
        self.update_pc(1);
    }

    pub fn pld<M: Memory>(&mut self, mem: &mut M) {
        self.d = self.stack_pop_word(mem, StackWrap::Free);
        self.p.z = self.d == 0;
        self.p.n = self.d & 0x8000 != 0;
        self.cycles += 5;
        self.update_pc(1);
    }

    pub fn plb<M: Memory>(&mut self, mem: &mut M) {
        self.dbr = self.stack_pop_byte(mem, StackWrap::Free);
        self.p.z = self.dbr == 0;
        self.p.n = self.dbr & 0x80 != 0;
        self.cycles += 4;
        self.update_pc(1);
    }

    pub fn pea<M: Memory>(&mut self, mem: &mut M) {
        let val = self.operand_word(mem);
        self.stack_push_word(mem, val, StackWrap::Free);
        self.cycles += 5;
        self.update_pc(3);
    }

    pub fn pei<M: Memory>(&mut self, mem: &mut M) {
        let ptr = add_bank_wrap(self.d as u32, self.operand_byte(mem) as u16);
        let val = mem.read_word_bank_wrap(ptr, self.setacc);
        self.stack_push_word(mem, val, StackWrap::Free);
        self.update_pc(2);
        self.cycles += 6;
        if self.d & 0xFF != 0 {
            self.cycles += 1;
        }
    }

    pub fn per<M: Memory>(&mut self, mem: &mut M) {
        let displacement = self.operand_word(mem);
        self.update_pc(3);
        let val = self.pc.wrapping_add(displacement);
        self.stack_push_word(mem, val, StackWrap::Free);
        self.cycles += 6;
    }

    // ------------------------------------------------------------------
    // Block move
    // ------------------------------------------------------------------

    /// MVN: ascending block move, one byte per invocation.
    pub fn mvn<M: Memory>(&mut self, mem: &mut M) {
        self.block_move(mem, true);
    }

    /// MVP: descending block move, one byte per invocation.
    pub fn mvp<M: Memory>(&mut self, mem: &mut M) {
        self.block_move(mem, false);
    }

    fn block_move<M: Memory>(&mut self, mem: &mut M, ascending: bool) {
        let operand_addr = self.immediate_addr();
        let dst_bank = mem.read(operand_addr, self.setacc);
        let src_bank = mem.read(add_bank_wrap(operand_addr, 1), self.setacc);

        let src = ((src_bank as u32) << 16) | self.x as u32;
        let dst = ((dst_bank as u32) << 16) | self.y as u32;
        let val = mem.read(src, self.setacc);
        mem.write(dst, val, self.setacc);

        if ascending {
            self.x = self.x.wrapping_add(1);
            self.y = self.y.wrapping_add(1);
        } else {
            self.x = self.x.wrapping_sub(1);
            self.y = self.y.wrapping_sub(1);
        }
        self.dbr = dst_bank;
        self.c = self.c.wrapping_sub(1);

        // The counter underflowing past zero marks the move complete;
        // until then PC stays on this instruction so the driver re-enters
        // it for the next byte.
        if self.c == 0xFFFF {
            self.update_pc(3);
        }
        self.cycles += 7;
    }
}
