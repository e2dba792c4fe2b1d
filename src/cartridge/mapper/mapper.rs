//! Mapper trait: PRG/CHR memory access, mirroring, and the scanline IRQ hooks.

use crate::cartridge::mapper::Mirroring;

/// Trait for NES cartridge mappers. CPU/PPU use these for all cartridge address space.
///
/// CPU addresses ($4020–$FFFF) and PPU pattern-table addresses ($0000–$1FFF) never overlap,
/// so one address space covers both. Anything a board does not decode reads as 0 and ignores
/// writes.
pub trait Mapper {
    /// Read from PRG ROM/RAM ($6000–$FFFF) or CHR ROM/RAM ($0000–$1FFF).
    fn read(&self, addr: u16) -> u8;
    /// Write to CHR RAM, PRG RAM, or mapper registers (ROM is read-only).
    fn write(&mut self, addr: u16, data: u8);
    /// Current nametable mirroring for the PPU.
    fn mirroring(&self) -> Mirroring;

    /// Nametable RAM index for a PPU address in $2000–$3EFF.
    fn nametable_index(&self, addr: u16) -> usize {
        self.mirroring().nametable_index(addr)
    }

    /// Called by the PPU once per rendered scanline (dot 260) while rendering is enabled.
    fn on_scanline(&mut self) {}

    /// IRQ line level. Stays asserted until the mapper is acknowledged.
    fn irq_pending(&self) -> bool {
        false
    }
}
