//! NES cartridge loading and mapper support.
//!
//! - **cartridge**: Parses iNES (.nes) images into PRG/CHR and board flags.
//! - **mapper**: NROM (0), MMC1 (1), CNROM (3), MMC3 (4); PRG/CHR bank switching and nametable mirroring.

pub mod cartridge;
pub mod mapper;
