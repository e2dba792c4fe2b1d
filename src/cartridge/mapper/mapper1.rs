//! Mapper 1 (MMC1): bank switching via 5-bit shift register.
//!
//! [MMC1](https://www.nesdev.org/wiki/MMC1): writes to $8000–$9FFF (control), $A000–$BFFF (CHR0),
//! $C000–$DFFF (CHR1), $E000–$FFFF (PRG bank). Any write with bit 7 set resets the shift register.
//! Otherwise, bit 0 is shifted in (LSB first); after 5 writes, the value is latched to the selected
//! register. Control (bits 0–1) = mirroring; bits 2–3 = PRG mode; bit 4 = CHR mode.

use tracing::debug;

use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::{Mirroring, mapper::Mapper};

/// MMC1 state: shift register, control byte (mirroring + PRG/CHR mode), bank selects, PRG RAM.
pub struct Mapper1 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Vec<u8>,
    shift_reg: u8,
    shift_count: u8,
    control: u8,
    chr_bank_0: u8,
    chr_bank_1: u8,
    prg_bank: u8,
}

impl Mapper1 {
    /// Control defaults to $0C (PRG mode 3: $8000 switchable, $C000 fixed last).
    pub fn new(cart: Cartridge) -> Self {
        Self {
            prg_rom: cart.prg_rom,
            chr: cart.chr,
            chr_is_ram: cart.chr_is_ram,
            prg_ram: vec![0; 0x2000],
            shift_reg: 0,
            shift_count: 0,
            control: 0x0C,
            chr_bank_0: 0,
            chr_bank_1: 0,
            prg_bank: 0,
        }
    }

    /// Last committed control register value.
    pub fn control(&self) -> u8 {
        self.control
    }

    /// PRG bank mode from control bits 2–3: 0/1 = 32 KiB mode; 2 = $8000 fixed first, $C000 switchable; 3 = $8000 switchable, $C000 fixed last.
    fn prg_bank_mode(&self) -> u8 {
        (self.control >> 2) & 0b11
    }

    fn prg_bank_count(&self) -> usize {
        (self.prg_rom.len() / 0x4000).max(1)
    }

    fn chr_bank_count_4k(&self) -> usize {
        (self.chr.len() / 0x1000).max(1)
    }

    fn prg_ram_enabled(&self) -> bool {
        self.prg_bank & 0x10 == 0
    }

    fn prg_offset(&self, addr: u16) -> usize {
        let count = self.prg_bank_count();
        let select = (self.prg_bank & 0x0F) as usize;
        let offset = addr as usize & 0x3FFF;
        let bank = match (self.prg_bank_mode(), addr) {
            (0 | 1, 0x8000..=0xBFFF) => select & !1,
            (0 | 1, _) => select | 1,
            (2, 0x8000..=0xBFFF) => 0,
            (2, _) => select,
            (_, 0x8000..=0xBFFF) => select,
            (_, _) => count - 1,
        };
        (bank % count) * 0x4000 + offset
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let count = self.chr_bank_count_4k();
        let bank = if self.control & 0x10 == 0 {
            // 8 KiB mode: CHR0 with the low bit ignored covers both halves.
            (self.chr_bank_0 & !1) as usize + (addr as usize >> 12)
        } else if addr < 0x1000 {
            self.chr_bank_0 as usize
        } else {
            self.chr_bank_1 as usize
        };
        (bank % count) * 0x1000 + (addr as usize & 0x0FFF)
    }

    fn commit(&mut self, addr: u16, value: u8) {
        match (addr >> 13) & 0b11 {
            0 => self.control = value,
            1 => self.chr_bank_0 = value,
            2 => self.chr_bank_1 = value,
            _ => self.prg_bank = value,
        }
        debug!("MMC1 register ${addr:04X} = ${value:02X}");
    }
}

impl Mapper for Mapper1 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.chr.get(self.chr_offset(addr)).copied().unwrap_or(0),
            0x6000..=0x7FFF if self.prg_ram_enabled() => self.prg_ram[(addr - 0x6000) as usize],
            0x8000..=0xFFFF => self.prg_rom.get(self.prg_offset(addr)).copied().unwrap_or(0),
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF if self.chr_is_ram => {
                let offset = self.chr_offset(addr);
                if let Some(b) = self.chr.get_mut(offset) {
                    *b = data;
                }
            }
            0x6000..=0x7FFF if self.prg_ram_enabled() => {
                self.prg_ram[(addr - 0x6000) as usize] = data;
            }
            0x8000..=0xFFFF => {
                if data & 0x80 != 0 {
                    self.shift_reg = 0;
                    self.shift_count = 0;
                    self.control |= 0x0C;
                    return;
                }

                self.shift_reg |= (data & 1) << self.shift_count;
                self.shift_count += 1;

                if self.shift_count == 5 {
                    let value = self.shift_reg & 0x1F;
                    self.shift_reg = 0;
                    self.shift_count = 0;
                    self.commit(addr, value);
                }
            }
            _ => {}
        }
    }

    /// Mirroring from control bits 0–1: 0 = one-screen lower, 1 = one-screen upper, 2 = vertical, 3 = horizontal.
    fn mirroring(&self) -> Mirroring {
        match self.control & 0b11 {
            0 => Mirroring::SingleScreenA,
            1 => Mirroring::SingleScreenB,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }
}
