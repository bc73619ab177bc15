//! 65C816 processor state and the shared machinery every instruction uses.
//!
//! The state record is owned by the simulation driver and passed by mutable
//! reference into every instruction entry point — there is no global or
//! hidden CPU state. The driver's decoder resolves each instruction into
//! (operation, addressing mode, effective address, base size, base cycles)
//! and calls the matching method from the [`crate::ops`] modules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::{log, LogCategory, LogLevel};
use crate::memory::{add_bank_wrap, Memory};

/// Fixed interrupt/reset vector locations (bank 0).
pub mod vectors {
    pub const NATIVE_COP: u32 = 0x00FFE4;
    pub const NATIVE_BRK: u32 = 0x00FFE6;
    pub const NATIVE_ABORT: u32 = 0x00FFE8;
    pub const NATIVE_NMI: u32 = 0x00FFEA;
    pub const NATIVE_IRQ: u32 = 0x00FFEE;
    pub const EMU_COP: u32 = 0x00FFF4;
    pub const EMU_ABORT: u32 = 0x00FFF8;
    pub const EMU_NMI: u32 = 0x00FFFA;
    pub const RESET: u32 = 0x00FFFC;
    pub const EMU_IRQ: u32 = 0x00FFFE;
}

/// Errors the core can raise. The only fatal condition is a decoder
/// contract violation: an addressing mode handed to an instruction that
/// does not support it. The core sets [`Status::crash`] and refuses to be
/// stepped further; the driver decides what to do with the halted state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    #[error("addressing mode {mode:?} is not valid for {op}")]
    InvalidAddressingMode { op: &'static str, mode: AddrMode },
}

/// Addressing-mode tag supplied by the decoder alongside the resolved
/// effective address. The core never computes effective addresses itself
/// (branch displacements excepted); it only needs the tag to pick wrap
/// flavors and timing penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddrMode {
    Implied,
    Immediate,
    DirectPage,
    DirectPageX,
    DirectPageY,
    DirectPageIndirect,
    DirectPageIndirectLong,
    DirectPageIndexedIndirectX,
    IndirectIndexedY,
    IndirectIndexedLongY,
    Absolute,
    AbsoluteLong,
    AbsoluteX,
    AbsoluteY,
    AbsoluteLongX,
    StackRelative,
    StackRelativeIndirectY,
}

impl AddrMode {
    /// True for every mode that goes through the direct-page register and
    /// therefore pays the extra cycle when DL (the low byte of D) is
    /// nonzero.
    pub fn is_direct_page_based(self) -> bool {
        matches!(
            self,
            AddrMode::DirectPage
                | AddrMode::DirectPageX
                | AddrMode::DirectPageY
                | AddrMode::DirectPageIndirect
                | AddrMode::DirectPageIndirectLong
                | AddrMode::DirectPageIndexedIndirectX
                | AddrMode::IndirectIndexedY
                | AddrMode::IndirectIndexedLongY
        )
    }

    /// Modes whose 16-bit operand reads wrap within the bank rather than
    /// crossing into the next one.
    pub fn operand_bank_wraps(self) -> bool {
        matches!(
            self,
            AddrMode::DirectPage
                | AddrMode::DirectPageX
                | AddrMode::DirectPageY
                | AddrMode::Immediate
                | AddrMode::StackRelative
        )
    }
}

/// Operand width resolved once per instruction from the three orthogonal
/// mode flags, instead of re-deriving the same emulation/width test inside
/// every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W8,
    W16,
}

/// Processor status flags plus the run-state bits the driver inspects.
///
/// `m`/`xb` select 8-bit accumulator/index widths in native mode; when `e`
/// is set the CPU behaves as an 8-bit 6502 regardless of their stored
/// values. `stp`/`crash` gate further dispatch; `nmi`/`irq` are set by the
/// external interrupt controller and only observed here (WAI).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub c: bool,
    pub z: bool,
    pub i: bool,
    pub d: bool,
    pub xb: bool,
    pub m: bool,
    pub v: bool,
    pub n: bool,
    pub e: bool,
    pub stp: bool,
    pub crash: bool,
    pub nmi: bool,
    pub irq: bool,
}

impl Status {
    /// Pack the architectural flags into the NVMXDIZC status byte. Bits 5
    /// and 4 carry M and X; in emulation mode the same bit positions are
    /// the unused and break bits, masked by the individual instructions.
    pub fn as_byte(&self) -> u8 {
        (self.n as u8) << 7
            | (self.v as u8) << 6
            | (self.m as u8) << 5
            | (self.xb as u8) << 4
            | (self.d as u8) << 3
            | (self.i as u8) << 2
            | (self.z as u8) << 1
            | (self.c as u8)
    }

    /// Unpack a status byte into the architectural flags. Emulation-mode
    /// bit-4/5 masking is the caller's responsibility (PLP/RTI/REP/SEP
    /// apply different rules).
    pub fn set_from_byte(&mut self, val: u8) {
        self.n = val & 0x80 != 0;
        self.v = val & 0x40 != 0;
        self.m = val & 0x20 != 0;
        self.xb = val & 0x10 != 0;
        self.d = val & 0x08 != 0;
        self.i = val & 0x04 != 0;
        self.z = val & 0x02 != 0;
        self.c = val & 0x01 != 0;
    }
}

/// 65C816 register file and cycle counter.
///
/// Created once by the driver and mutated in place by every instruction;
/// memory is a separate collaborator passed into each call, so the state
/// record serializes cleanly for save states and test fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// Accumulator (C); the low byte is the 8-bit accumulator A.
    pub c: u16,
    /// X index register.
    pub x: u16,
    /// Y index register.
    pub y: u16,
    /// Direct-page base register; a nonzero low byte costs direct-page
    /// instructions an extra cycle.
    pub d: u16,
    /// Stack pointer; pinned to page 1 while in emulation mode.
    pub sp: u16,
    /// Program counter (offset within the program bank).
    pub pc: u16,
    /// Data bank register.
    pub dbr: u8,
    /// Program bank register.
    pub pbr: u8,
    /// Status flags and run-state bits.
    pub p: Status,
    /// Total elapsed clock cycles; monotonically increasing.
    pub cycles: u64,
    /// Whether the core's own reads/writes count as real bus accesses.
    /// Timing probes always pass `false` regardless of this setting.
    pub setacc: bool,
    /// Optional extension: route COP through a vector table indexed by its
    /// operand byte instead of the single COP vector.
    pub cop_vect_enable: bool,
}

impl Cpu {
    /// Power-on state: emulation mode, 8-bit widths, IRQs masked, stack at
    /// the top of page 1. PC/PBR are left for [`Cpu::reset`] to load.
    pub fn new() -> Self {
        Self {
            c: 0,
            x: 0,
            y: 0,
            d: 0,
            sp: 0x01FF,
            pc: 0,
            dbr: 0,
            pbr: 0,
            p: Status {
                m: true,
                xb: true,
                i: true,
                e: true,
                ..Status::default()
            },
            cycles: 0,
            setacc: true,
            cop_vect_enable: false,
        }
    }

    /// Reset the CPU and load PC from the emulation-mode reset vector.
    pub fn reset<M: Memory>(&mut self, mem: &mut M) {
        let setacc = self.setacc;
        let cop_vect_enable = self.cop_vect_enable;
        *self = Self::new();
        self.setacc = setacc;
        self.cop_vect_enable = cop_vect_enable;
        self.pc = mem.read_word(vectors::RESET, self.setacc);
    }

    /// Serialize the register file for a driver save state.
    pub fn save_state(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Restore the register file from a driver save state.
    pub fn load_state(&mut self, v: &serde_json::Value) -> Result<(), serde_json::Error> {
        *self = serde_json::from_value(v.clone())?;
        Ok(())
    }

    /// Active accumulator width: 8-bit under emulation mode or M=1.
    #[inline]
    pub fn width_a(&self) -> Width {
        if self.p.e || self.p.m {
            Width::W8
        } else {
            Width::W16
        }
    }

    /// Active index-register width: 8-bit under emulation mode or X=1.
    #[inline]
    pub fn width_x(&self) -> Width {
        if self.p.e || self.p.xb {
            Width::W8
        } else {
            Width::W16
        }
    }

    /// Full 24-bit address of the current instruction (PBR:PC).
    #[inline]
    pub fn effective_pc(&self) -> u32 {
        ((self.pbr as u32) << 16) | (self.pc as u32)
    }

    /// Advance PC by an instruction size, wrapping within the program bank.
    #[inline]
    pub fn update_pc(&mut self, size: u16) {
        self.pc = self.pc.wrapping_add(size);
    }

    /// Record a decoder contract violation: log it, mark the core crashed
    /// and hand the error back for the driver to surface. No further
    /// instructions should be dispatched once `p.crash` is set.
    pub(crate) fn crash(&mut self, op: &'static str, mode: AddrMode) -> CpuError {
        self.p.crash = true;
        log(LogCategory::Cpu, LogLevel::Error, || {
            format!(
                "crash: {op} given mode {mode:?} at {:02X}:{:04X}",
                self.pbr, self.pc
            )
        });
        CpuError::InvalidAddressingMode { op, mode }
    }

    // ------------------------------------------------------------------
    // Operand helpers
    //
    // These read instruction operand bytes relative to PC. They are not
    // effective-address computation (the decoder owns that); branches and
    // a handful of instructions (REP/SEP, MVN/MVP, COP) consume their
    // operand directly.
    // ------------------------------------------------------------------

    /// Address of the first operand byte, bank-wrapped after PC.
    #[inline]
    pub(crate) fn immediate_addr(&self) -> u32 {
        add_bank_wrap(self.effective_pc(), 1)
    }

    /// Read the instruction's one-byte operand.
    pub(crate) fn operand_byte<M: Memory>(&self, mem: &mut M) -> u8 {
        mem.read(self.immediate_addr(), self.setacc)
    }

    /// Read the instruction's two-byte operand (bank-wrapped).
    pub(crate) fn operand_word<M: Memory>(&self, mem: &mut M) -> u16 {
        mem.read_word_bank_wrap(self.immediate_addr(), self.setacc)
    }

    /// Branch target for an 8-bit displacement: PC after the 2-byte
    /// instruction plus the signed operand, wrapped within the bank.
    pub(crate) fn relative8_target<M: Memory>(&self, mem: &mut M) -> u16 {
        let offset = self.operand_byte(mem) as i8;
        self.pc.wrapping_add(2).wrapping_add(offset as u16)
    }

    /// Branch target for a 16-bit displacement (BRL/PER).
    pub(crate) fn relative16_target<M: Memory>(&self, mem: &mut M) -> u16 {
        let offset = self.operand_word(mem) as i16;
        self.pc.wrapping_add(3).wrapping_add(offset as u16)
    }

    /// Base address a direct-page indirect instruction resolved before Y
    /// indexing: the pointer read back out of the direct page, in the data
    /// bank. Used for the indirect-indexed page-cross probe, so the reads
    /// never count as bus accesses.
    pub(crate) fn indirect_dp_base<M: Memory>(&self, mem: &mut M) -> u32 {
        let ptr = add_bank_wrap(self.d as u32, self.operand_byte(mem) as u16);
        let base = mem.read_word_bank_wrap(ptr, false) as u32;
        ((self.dbr as u32) << 16) | base
    }

    // ------------------------------------------------------------------
    // Cycle-timing adjustment protocol
    // ------------------------------------------------------------------

    /// +1 cycle when adding the active index register to the base address
    /// moved the effective address into a different page. The base is
    /// recovered by subtracting the index that was added, which matches
    /// hardware for the arithmetic/logical class of instructions.
    pub(crate) fn index_cross_penalty(&mut self, mode: AddrMode, addr: u32) {
        match mode {
            AddrMode::AbsoluteX => {
                if (addr & 0xFF00) != (addr.wrapping_sub(self.x as u32) & 0xFF00) {
                    self.cycles += 1;
                }
            }
            AddrMode::AbsoluteY | AddrMode::IndirectIndexedY => {
                if (addr & 0xFF00) != (addr.wrapping_sub(self.y as u32) & 0xFF00) {
                    self.cycles += 1;
                }
            }
            _ => {}
        }
    }

    /// +1 cycle when a direct-page-based mode runs with a nonzero DL.
    pub(crate) fn dp_penalty(&mut self, mode: AddrMode) {
        if mode.is_direct_page_based() && (self.d & 0xFF) != 0 {
            self.cycles += 1;
        }
    }

    /// Index-cross probe for the load/store class: re-reads the operand
    /// word (the pre-index base) and compares pages against the effective
    /// address. The re-read is a timing probe, never a bus access.
    pub(crate) fn operand_cross_penalty<M: Memory>(&mut self, mem: &mut M, addr: u32) {
        let base = mem.read_word_bank_wrap(self.immediate_addr(), false) as u32;
        if (base & 0xFF00) != (addr & 0xFF00) {
            self.cycles += 1;
        }
    }

    /// Index-cross probe for indirect-indexed-Y in the load/store class:
    /// compares the page of the direct-page pointer target (before Y)
    /// against the page of the effective address.
    pub(crate) fn inddpy_cross_penalty<M: Memory>(&mut self, mem: &mut M, addr: u32) {
        if (self.indirect_dp_base(mem) & 0xFF00) != (addr & 0xFF00) {
            self.cycles += 1;
        }
    }

    /// Read a 16-bit memory operand with the wrap flavor the addressing
    /// mode requires.
    pub(crate) fn read_operand_word<M: Memory>(
        &mut self,
        mem: &mut M,
        mode: AddrMode,
        addr: u32,
    ) -> u16 {
        if mode.operand_bank_wraps() {
            mem.read_word_bank_wrap(addr, self.setacc)
        } else {
            mem.read_word(addr, self.setacc)
        }
    }

    // ------------------------------------------------------------------
    // Stack primitives
    //
    // 8-bit pushes/pulls always honor the emulation-mode page-1 pinning.
    // 16-bit accesses take a wrap selector: legacy instructions keep the
    // pointer inside page 1 under emulation, while 65816-only instructions
    // (PEA, PEI, PER, PHD, PLD, PLB) run it across the full 16-bit range
    // even in emulation mode.
    // ------------------------------------------------------------------

    fn stack_push_raw<M: Memory>(&mut self, mem: &mut M, val: u8, wrap: StackWrap) {
        mem.write(self.sp as u32, val, self.setacc);
        self.sp = self.sp.wrapping_sub(1);
        if self.p.e && wrap == StackWrap::Page1 {
            self.sp = 0x0100 | (self.sp & 0xFF);
        }
    }

    fn stack_pop_raw<M: Memory>(&mut self, mem: &mut M, wrap: StackWrap) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        if self.p.e && wrap == StackWrap::Page1 {
            self.sp = 0x0100 | (self.sp & 0xFF);
        }
        mem.read(self.sp as u32, self.setacc)
    }

    pub(crate) fn stack_push_byte<M: Memory>(&mut self, mem: &mut M, val: u8) {
        self.stack_push_raw(mem, val, StackWrap::Page1);
    }

    pub(crate) fn stack_push_word<M: Memory>(&mut self, mem: &mut M, val: u16, wrap: StackWrap) {
        self.stack_push_raw(mem, (val >> 8) as u8, wrap);
        self.stack_push_raw(mem, (val & 0xFF) as u8, wrap);
    }

    /// Push a 24-bit value (bank, then high, then low). Only native-mode
    /// paths use this, so the pointer always runs free.
    pub(crate) fn stack_push_24<M: Memory>(&mut self, mem: &mut M, val: u32) {
        self.stack_push_raw(mem, (val >> 16) as u8, StackWrap::Free);
        self.stack_push_raw(mem, (val >> 8) as u8, StackWrap::Free);
        self.stack_push_raw(mem, (val & 0xFF) as u8, StackWrap::Free);
    }

    pub(crate) fn stack_pop_byte<M: Memory>(&mut self, mem: &mut M, wrap: StackWrap) -> u8 {
        self.stack_pop_raw(mem, wrap)
    }

    pub(crate) fn stack_pop_word<M: Memory>(&mut self, mem: &mut M, wrap: StackWrap) -> u16 {
        let lo = self.stack_pop_raw(mem, wrap) as u16;
        let hi = self.stack_pop_raw(mem, wrap) as u16;
        (hi << 8) | lo
    }

    pub(crate) fn stack_pop_24<M: Memory>(&mut self, mem: &mut M) -> u32 {
        let lo = self.stack_pop_raw(mem, StackWrap::Free) as u32;
        let hi = self.stack_pop_raw(mem, StackWrap::Free) as u32;
        let bank = self.stack_pop_raw(mem, StackWrap::Free) as u32;
        (bank << 16) | (hi << 8) | lo
    }

    // ------------------------------------------------------------------
    // Flag epilogues shared across the engines
    // ------------------------------------------------------------------

    /// Set Z/N from the accumulator at the active width.
    pub(crate) fn set_zn_a(&mut self) {
        match self.width_a() {
            Width::W8 => {
                self.p.z = self.c & 0xFF == 0;
                self.p.n = self.c & 0x80 != 0;
            }
            Width::W16 => {
                self.p.z = self.c == 0;
                self.p.n = self.c & 0x8000 != 0;
            }
        }
    }

    /// Set Z/N from an arbitrary value at the given width.
    pub(crate) fn set_zn(&mut self, val: u16, width: Width) {
        match width {
            Width::W8 => {
                self.p.z = val & 0xFF == 0;
                self.p.n = val & 0x80 != 0;
            }
            Width::W16 => {
                self.p.z = val == 0;
                self.p.n = val & 0x8000 != 0;
            }
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap selector for 16-bit stack accesses (see the stack primitives
/// above). `Page1` honors emulation-mode pinning; `Free` never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackWrap {
    Page1,
    Free,
}
