//! Nestrel: a cycle-stepped NES (Nintendo Entertainment System) emulator core.
//!
//! Implements the NES chipset as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide): the 2A03 CPU, the 2C02 PPU,
//! cartridge mappers and controller I/O. Hosts drive a [`console::Console`] and receive video
//! through a [`video::VideoSink`].
//!
//! ## Modules (NESdev references)
//!
//! - **apu** – [APU](https://www.nesdev.org/wiki/APU) register file; no synthesis
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map): RAM, PPU, APU,
//!   controllers, cartridge, OAM DMA
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading; [Mapper](https://www.nesdev.org/wiki/Mapper)
//!   NROM (0), MMC1 (1), CNROM (3), MMC3 (4)
//! - **config** – console options (start address, PPU warm-up)
//! - **console** – the orchestrator; 3 PPU dots per CPU cycle
//! - **controller** – [Controller reading](https://www.nesdev.org/wiki/Controller_reading): $4016 latch, shift-out
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) / 2A03: documented opcodes + undocumented NOPs, [NMI](https://www.nesdev.org/wiki/NMI), IRQ
//! - **error** – CPU and cartridge errors
//! - **ppu** – [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers), OAM, nametables, 256×240
//! - **trace** – nestest-format trace rows
//! - **video** – pixel sink and framebuffer

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod config;
pub mod console;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod ppu;
pub mod trace;
pub mod video;
