//! Mapper 4 (MMC3): bank switching, switchable mirroring, optional PRG RAM, scanline IRQ.
//!
//! [MMC3](https://www.nesdev.org/wiki/MMC3): Bank select at $8000–$9FFE (even), bank data at
//! $8001–$9FFF (odd). R0/R1 = 2 KiB CHR, R2–R5 = 1 KiB CHR, R6/R7 = 8 KiB PRG. Mirroring at
//! $A000–$BFFE (even). IRQ latch $C000, reload $C001, disable $E000, enable $E001. The IRQ
//! counter is clocked once per rendered scanline by the PPU.

use tracing::debug;

use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::{Mirroring, mapper::Mapper};

/// MMC3 state: bank registers, mirroring, PRG RAM, IRQ counter/latch/enable.
pub struct Mapper4 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Vec<u8>,
    /// Bank select ($8000): bits 0–2 = register index, bit 6 = PRG mode, bit 7 = CHR A12 invert.
    bank_select: u8,
    /// R0–R5 CHR, R6–R7 PRG (R0/R1 are 2 KiB, others 1 KiB / 8 KiB).
    regs: [u8; 8],
    mirroring: Mirroring,
    four_screen: bool,
    irq_latch: u8,
    irq_counter: u8,
    irq_reload_pending: bool,
    irq_enabled: bool,
    irq_pending: bool,
}

impl Mapper4 {
    /// PRG RAM 8 KiB is always allocated.
    pub fn new(cart: Cartridge) -> Self {
        let four_screen = cart.mirroring == Mirroring::FourScreen;
        Self {
            prg_rom: cart.prg_rom,
            chr: cart.chr,
            chr_is_ram: cart.chr_is_ram,
            prg_ram: vec![0; 0x2000],
            bank_select: 0,
            regs: [0; 8],
            mirroring: cart.mirroring,
            four_screen,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload_pending: false,
            irq_enabled: false,
            irq_pending: false,
        }
    }

    fn prg_bank_count(&self) -> usize {
        (self.prg_rom.len() / 0x2000).max(1)
    }

    fn chr_bank_count(&self) -> usize {
        (self.chr.len() / 0x400).max(1)
    }

    fn prg_offset(&self, addr: u16) -> usize {
        let count = self.prg_bank_count();
        let last = count - 1;
        let second_last = count.saturating_sub(2);
        let r6 = self.regs[6] as usize;
        let r7 = self.regs[7] as usize;
        let banks = if self.bank_select & 0x40 == 0 {
            [r6, r7, second_last, last]
        } else {
            [second_last, r7, r6, last]
        };
        let segment = (addr as usize - 0x8000) >> 13;
        (banks[segment] % count) * 0x2000 + (addr as usize & 0x1FFF)
    }

    /// CHR bank layout: eight 1 KiB windows, with bank select bit 7 swapping the halves.
    fn chr_offset(&self, addr: u16) -> usize {
        let mut slot = (addr as usize & 0x1C00) >> 10;
        if self.bank_select & 0x80 != 0 {
            slot ^= 4;
        }
        let bank = if slot < 4 {
            (self.regs[slot / 2] | (slot as u8 & 1)) as usize
        } else {
            self.regs[slot - 2] as usize
        };
        (bank % self.chr_bank_count()) * 0x400 + (addr as usize & 0x3FF)
    }
}

impl Mapper for Mapper4 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.chr.get(self.chr_offset(addr)).copied().unwrap_or(0),
            0x6000..=0x7FFF => self.prg_ram[(addr - 0x6000) as usize],
            0x8000..=0xFFFF => self.prg_rom.get(self.prg_offset(addr)).copied().unwrap_or(0),
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        let even = addr & 1 == 0;
        match addr {
            0x0000..=0x1FFF if self.chr_is_ram => {
                let offset = self.chr_offset(addr);
                if let Some(b) = self.chr.get_mut(offset) {
                    *b = data;
                }
            }
            0x6000..=0x7FFF => self.prg_ram[(addr - 0x6000) as usize] = data,
            0x8000..=0x9FFF if even => self.bank_select = data,
            0x8000..=0x9FFF => {
                let r = (self.bank_select & 7) as usize;
                self.regs[r] = match r {
                    0 | 1 => data & 0xFE,
                    6 | 7 => data & 0x3F,
                    _ => data,
                };
                debug!(register = r, value = self.regs[r], "MMC3 bank");
            }
            0xA000..=0xBFFF if even => {
                if !self.four_screen {
                    self.mirroring = if data & 1 == 0 {
                        Mirroring::Vertical
                    } else {
                        Mirroring::Horizontal
                    };
                }
            }
            // PRG RAM protect: not enforced, MMC6 boards share this mapper number.
            0xA000..=0xBFFF => {}
            0xC000..=0xDFFF if even => self.irq_latch = data,
            0xC000..=0xDFFF => {
                self.irq_reload_pending = true;
                self.irq_counter = 0;
            }
            0xE000..=0xFFFF if even => {
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            0xE000..=0xFFFF => self.irq_enabled = true,
            _ => {}
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn on_scanline(&mut self) {
        if self.irq_counter == 0 || self.irq_reload_pending {
            self.irq_counter = self.irq_latch;
            self.irq_reload_pending = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }
}
