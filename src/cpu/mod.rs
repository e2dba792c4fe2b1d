//! 6502 CPU emulation for the NES.
//!
//! Documented instruction set plus the undocumented NOPs; nestest-compatible up to the first
//! other undocumented opcode. Bus trait used for memory and I/O (PPU, APU, cartridge, controller).

pub mod cpu;
pub mod decode;
pub mod flags;
