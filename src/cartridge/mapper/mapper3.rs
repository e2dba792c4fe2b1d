//! Mapper 3 (CNROM): fixed PRG, 8 KiB CHR bank selected by any write to $8000–$FFFF.
//!
//! [CNROM](https://www.nesdev.org/wiki/INES_Mapper_003). Bus conflicts are not modelled.

use tracing::debug;

use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::{Mirroring, mapper::Mapper, mapper0::read_fixed_prg};

pub struct Mapper3 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    chr_bank: usize,
    mirroring: Mirroring,
}

impl Mapper3 {
    /// Boots with the last CHR bank selected.
    pub fn new(cart: Cartridge) -> Self {
        let banks = (cart.chr.len() / 0x2000).max(1);
        Self {
            prg_rom: cart.prg_rom,
            chr: cart.chr,
            chr_is_ram: cart.chr_is_ram,
            chr_bank: banks - 1,
            mirroring: cart.mirroring,
        }
    }

    fn chr_bank_count(&self) -> usize {
        (self.chr.len() / 0x2000).max(1)
    }

    fn chr_offset(&self, addr: u16) -> usize {
        self.chr_bank * 0x2000 + (addr as usize & 0x1FFF)
    }
}

impl Mapper for Mapper3 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.chr.get(self.chr_offset(addr)).copied().unwrap_or(0),
            0x8000..=0xFFFF => read_fixed_prg(&self.prg_rom, addr),
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
            0x8000..=0xFFFF => {
                self.chr_bank = data as usize % self.chr_bank_count();
                debug!(bank = self.chr_bank, "CNROM CHR bank");
            }
            _ => {}
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
