//! NES mappers for PRG/CHR memory mapping.
//!
//! Mapper0 (NROM), Mapper1 (MMC1), Mapper3 (CNROM), Mapper4 (MMC3), and the nametable
//! mirroring translation they all share.

/// Nametable mirroring mode for PPU.
///
/// See [Mirroring](https://www.nesdev.org/wiki/Mirroring). Each mode maps the four logical
/// nametables at $2000/$2400/$2800/$2C00 onto physical 1 KiB banks of nametable RAM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    SingleScreenA,
    SingleScreenB,
    FourScreen,
}

impl Mirroring {
    /// Physical bank for each of the four logical nametables.
    const fn banks(self) -> [usize; 4] {
        match self {
            Mirroring::Horizontal => [0, 0, 1, 1],
            Mirroring::Vertical => [0, 1, 0, 1],
            Mirroring::SingleScreenA => [0, 0, 0, 0],
            Mirroring::SingleScreenB => [1, 1, 1, 1],
            Mirroring::FourScreen => [0, 1, 2, 3],
        }
    }

    /// Translate a PPU nametable address ($2000–$2FFF, or its $3000–$3EFF mirror) into an
    /// index into nametable RAM. Only four-screen boards reach past the first 2 KiB.
    pub fn nametable_index(self, addr: u16) -> usize {
        let offset = (addr & 0x0FFF) as usize;
        let table = offset / 0x400;
        self.banks()[table] * 0x400 + (offset & 0x3FF)
    }
}

pub mod mapper;

pub mod mapper0;
pub mod mapper1;
pub mod mapper3;
pub mod mapper4;
