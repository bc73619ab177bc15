//! Instruction entry points, grouped by engine.
//!
//! Every operation is an inherent method on [`crate::cpu::Cpu`] taking the
//! memory collaborator and the decoder-resolved (size, cycles, mode,
//! address) tuple where applicable. Implied operations take only what they
//! use.

mod arithmetic;
mod control;
mod logic;
mod movement;
mod shift;
