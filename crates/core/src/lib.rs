//! Cycle-accurate 65C816 instruction core.
//!
//! The crate owns the register file, flags, and per-instruction semantics
//! (memory mutation plus exact cycle accounting) of the 65(C)816, including
//! emulation mode, the 8/16-bit width machinery, and decimal arithmetic. It
//! deliberately owns nothing else: the embedding system decodes opcodes,
//! resolves effective addresses, implements the [`memory::Memory`] bus, and
//! drives interrupts, calling the instruction methods on [`cpu::Cpu`] one at
//! a time.

pub mod cpu;
pub mod logging;
pub mod memory;
pub mod ops;

pub use cpu::{vectors, AddrMode, Cpu, CpuError, StackWrap, Status, Width};
pub use memory::{add_bank_wrap, ArrayMemory, Memory};
