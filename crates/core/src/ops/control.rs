//! Control-flow engine: branches, jumps, subroutine linkage, software
//! interrupts, status-flag manipulation, and the run-state instructions.

use crate::cpu::{vectors, AddrMode, Cpu, StackWrap};
use crate::memory::{add_bank_wrap, Memory};

/// State of the break bit COP pushes in emulation mode. The hardware
/// leaves it undefined inside the handler; we push it cleared.
const COP_EMULATION_BREAK_BIT: bool = false;

impl Cpu {
    // ------------------------------------------------------------------
    // Branches
    // ------------------------------------------------------------------

    /// Shared conditional-branch body: 2 cycles base, +1 when taken, +1
    /// more when the taken branch crosses a page in emulation mode.
    fn branch_if<M: Memory>(&mut self, mem: &mut M, taken: bool) {
        if taken {
            let new_pc = self.relative8_target(mem);
            self.cycles += 1;
            if self.p.e && (new_pc & 0xFF00) != (self.pc & 0xFF00) {
                self.cycles += 1;
            }
            self.pc = new_pc;
        } else {
            self.update_pc(2);
        }
        self.cycles += 2;
    }

    pub fn bcc<M: Memory>(&mut self, mem: &mut M) {
        let taken = !self.p.c;
        self.branch_if(mem, taken);
    }

    pub fn bcs<M: Memory>(&mut self, mem: &mut M) {
        let taken = self.p.c;
        self.branch_if(mem, taken);
    }

    pub fn beq<M: Memory>(&mut self, mem: &mut M) {
        let taken = self.p.z;
        self.branch_if(mem, taken);
    }

    pub fn bne<M: Memory>(&mut self, mem: &mut M) {
        let taken = !self.p.z;
        self.branch_if(mem, taken);
    }

    pub fn bmi<M: Memory>(&mut self, mem: &mut M) {
        let taken = self.p.n;
        self.branch_if(mem, taken);
    }

    pub fn bpl<M: Memory>(&mut self, mem: &mut M) {
        let taken = !self.p.n;
        self.branch_if(mem, taken);
    }

    pub fn bvc<M: Memory>(&mut self, mem: &mut M) {
        let taken = !self.p.v;
        self.branch_if(mem, taken);
    }

    pub fn bvs<M: Memory>(&mut self, mem: &mut M) {
        let taken = self.p.v;
        self.branch_if(mem, taken);
    }

    pub fn bra<M: Memory>(&mut self, mem: &mut M) {
        let new_pc = self.relative8_target(mem);
        self.cycles += 3;
        if self.p.e && (new_pc & 0xFF00) != (self.pc & 0xFF00) {
            self.cycles += 1;
        }
        self.pc = new_pc;
    }

    pub fn brl<M: Memory>(&mut self, mem: &mut M) {
        self.pc = self.relative16_target(mem);
        self.cycles += 4;
    }

    // ------------------------------------------------------------------
    // Jumps and subroutine linkage
    // ------------------------------------------------------------------

    pub fn jmp(&mut self, cycles: u8, mode: AddrMode, addr: u32) {
        if mode == AddrMode::AbsoluteLong {
            self.pbr = (addr >> 16) as u8;
        }
        self.pc = addr as u16;
        self.cycles += cycles as u64;
    }

    pub fn jsr<M: Memory>(&mut self, mem: &mut M, cycles: u8, addr: u32) {
        let ret = self.pc.wrapping_add(2);
        self.stack_push_word(mem, ret, StackWrap::Page1);
        self.pc = addr as u16;
        self.cycles += cycles as u64;
    }

    pub fn jsl<M: Memory>(&mut self, mem: &mut M, cycles: u8, addr: u32) {
        let ret = add_bank_wrap(self.effective_pc(), 3);
        self.stack_push_24(mem, ret);
        self.pbr = (addr >> 16) as u8;
        self.pc = addr as u16;
        self.cycles += cycles as u64;
    }

    pub fn rts<M: Memory>(&mut self, mem: &mut M) {
        self.pc = self.stack_pop_word(mem, StackWrap::Page1).wrapping_add(1);
        self.cycles += 6;
    }

    pub fn rtl<M: Memory>(&mut self, mem: &mut M) {
        let ret = self.stack_pop_24(mem);
        self.pc = (ret as u16).wrapping_add(1);
        self.pbr = (ret >> 16) as u8;
        self.cycles += 6;
    }

    // ------------------------------------------------------------------
    // Software interrupts
    // ------------------------------------------------------------------

    /// Shared BRK/COP body: push the return state, load the vector, and
    /// enter binary-mode interrupt handling.
    fn software_interrupt<M: Memory>(
        &mut self,
        mem: &mut M,
        emu_vector: u32,
        native_vector: u32,
        emu_break_bit: bool,
    ) {
        self.update_pc(2);

        if self.p.e {
            let ret = self.pc;
            self.stack_push_word(mem, ret, StackWrap::Page1);
            let sr = if emu_break_bit {
                self.p.as_byte() | 0x10
            } else {
                self.p.as_byte() & 0xEF
            };
            self.stack_push_byte(mem, sr);
            self.pc = mem.read_word(emu_vector, self.setacc);
            self.pbr = 0;
            self.cycles += 7;
        } else {
            let ret = self.effective_pc();
            self.stack_push_24(mem, ret);
            let sr = self.p.as_byte();
            self.stack_push_byte(mem, sr);
            self.pc = mem.read_word(native_vector, self.setacc);
            self.pbr = 0;
            self.cycles += 8;
        }

        self.p.d = false;
        self.p.i = true;
    }

    pub fn brk<M: Memory>(&mut self, mem: &mut M) {
        // The emulation-mode break bit distinguishes BRK from a hardware
        // IRQ, which shares the same vector.
        self.software_interrupt(mem, vectors::EMU_IRQ, vectors::NATIVE_BRK, true);
    }

    pub fn cop<M: Memory>(&mut self, mem: &mut M) {
        let immd = self.operand_byte(mem);
        self.software_interrupt(
            mem,
            vectors::EMU_COP,
            vectors::NATIVE_COP,
            COP_EMULATION_BREAK_BIT,
        );

        // Optional extension: re-dispatch through a handler table indexed
        // by the signature byte. The table entry addresses do not wrap on
        // pages or banks, and the lookup is not a normal bus access.
        if self.cop_vect_enable {
            let entry = (self.pc as u32).wrapping_add(((immd as u32) << 1) & 0xFF);
            self.pc = mem.read_word(entry, false);
        }
    }

    pub fn rti<M: Memory>(&mut self, mem: &mut M) {
        let sr = self.p.as_byte();
        let val = self.stack_pop_byte(mem, StackWrap::Page1);

        if self.p.e {
            // Bits 4 and 5 are unaffected by the pull in emulation mode.
            self.p.set_from_byte((sr & 0x30) | (val & 0xCF));
            self.pc = self.stack_pop_word(mem, StackWrap::Page1);
            self.cycles += 6;
        } else {
            self.p.set_from_byte(val);
            let ret = self.stack_pop_24(mem);
            self.pbr = (ret >> 16) as u8;
            self.pc = ret as u16;
            self.cycles += 7;
        }
    }

    // ------------------------------------------------------------------
    // Status-flag manipulation
    // ------------------------------------------------------------------

    pub fn rep<M: Memory>(&mut self, mem: &mut M) {
        let sr = self.p.as_byte();
        let val = self.operand_byte(mem);

        if self.p.e {
            // Bits 4 and 5 are unaffected by the operation in emulation
            // mode.
            self.p.set_from_byte(sr & (!val | 0x30));
        } else {
            self.p.set_from_byte(sr & !val);
            if self.p.xb {
                self.x &= 0xFF;
                self.y &= 0xFF;
            }
        }

        self.update_pc(2);
        self.cycles += 3;
    }

    pub fn sep<M: Memory>(&mut self, mem: &mut M) {
        let sr = self.p.as_byte();
        let val = self.operand_byte(mem);

        if self.p.e {
            self.p.set_from_byte(sr | (val & 0xCF));
        } else {
            self.p.set_from_byte(sr | val);
            if self.p.xb {
                self.x &= 0xFF;
                self.y &= 0xFF;
            }
        }

        self.update_pc(2);
        self.cycles += 3;
    }

    /// XCE exchanges carry with the emulation bit. Entering emulation
    /// forces the 8-bit widths and drags the stack pointer onto page 1;
    /// any exchange that lands in native mode leaves M and X set, so the
    /// registers stay 8-bit until software widens them.
    pub fn xce(&mut self) {
        let carry = self.p.c;
        self.p.c = self.p.e;
        self.p.e = carry;

        if self.p.e {
            self.p.m = true;
            self.x &= 0xFF;
            self.y &= 0xFF;
            self.sp = (self.sp & 0xFF) | 0x0100;
        } else {
            self.p.m = true;
            self.p.xb = true;
        }

        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn clc(&mut self) {
        self.p.c = false;
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn cld(&mut self) {
        self.p.d = false;
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn cli(&mut self) {
        self.p.i = false;
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn clv(&mut self) {
        self.p.v = false;
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn sec(&mut self) {
        self.p.c = true;
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn sed(&mut self) {
        self.p.d = true;
        self.update_pc(1);
        self.cycles += 2;
    }

    pub fn sei(&mut self) {
        self.p.i = true;
        self.update_pc(1);
        self.cycles += 2;
    }

    // ------------------------------------------------------------------
    // Run state
    // ------------------------------------------------------------------

    /// WAI stalls in place until the interrupt controller raises NMI or
    /// IRQ; the driver keeps re-dispatching it and services the interrupt
    /// after the instruction finally completes.
    pub fn wai(&mut self) {
        if self.p.nmi || self.p.irq {
            self.cycles += 3;
            self.update_pc(1);
        }
    }

    /// STP halts the clock until reset. PC intentionally stays on the
    /// instruction.
    pub fn stp(&mut self) {
        self.p.stp = true;
        self.cycles += 3;
    }

    pub fn nop(&mut self) {
        self.update_pc(1);
        self.cycles += 2;
    }

    /// WDM is reserved; it consumes its operand byte and does nothing.
    pub fn wdm(&mut self) {
        self.update_pc(2);
        self.cycles += 2;
    }
}
