//! Mapper 0 (NROM): no bank switching, 16/32KB PRG, 8KB CHR.

use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::{Mirroring, mapper::Mapper};

/// Read PRG ROM at $8000–$FFFF; a 16 KiB image appears in both halves.
pub(crate) fn read_fixed_prg(prg_rom: &[u8], addr: u16) -> u8 {
    if prg_rom.is_empty() {
        return 0;
    }
    prg_rom[(addr as usize - 0x8000) % prg_rom.len()]
}

/// NROM mapper: fixed PRG and CHR, with optional battery-backed PRG RAM.
pub struct Mapper0 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Option<Vec<u8>>,
    mirroring: Mirroring,
}

impl Mapper0 {
    pub fn new(cart: Cartridge) -> Self {
        Self {
            prg_ram: cart.battery.then(|| vec![0; 0x2000]),
            prg_rom: cart.prg_rom,
            chr: cart.chr,
            chr_is_ram: cart.chr_is_ram,
            mirroring: cart.mirroring,
        }
    }
}

impl Mapper for Mapper0 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.chr.get(addr as usize).copied().unwrap_or(0),
            0x6000..=0x7FFF => self
                .prg_ram
                .as_ref()
                .map_or(0, |ram| ram[(addr - 0x6000) as usize]),
            0x8000..=0xFFFF => read_fixed_prg(&self.prg_rom, addr),
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF if self.chr_is_ram => {
                if let Some(b) = self.chr.get_mut(addr as usize) {
                    *b = data;
                }
            }
            0x6000..=0x7FFF => {
                if let Some(ram) = self.prg_ram.as_mut() {
                    ram[(addr - 0x6000) as usize] = data;
                }
            }
            _ => {}
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
