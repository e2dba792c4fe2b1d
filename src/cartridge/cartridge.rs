//! NES cartridge loading from iNES format (.nes files).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mapper, etc.), an optional
//! 512-byte trainer, then PRG ROM, then CHR ROM. CHR size 0 means the board carries 8 KiB of CHR RAM.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::cartridge::mapper::Mirroring;
use crate::cartridge::mapper::mapper::Mapper;
use crate::cartridge::mapper::mapper0::Mapper0;
use crate::cartridge::mapper::mapper1::Mapper1;
use crate::cartridge::mapper::mapper3::Mapper3;
use crate::cartridge::mapper::mapper4::Mapper4;
use crate::error::CartridgeError;

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];

/// Parsed cartridge image: ROM contents plus what the header says about the board.
#[derive(Clone, Debug)]
pub struct Cartridge {
    pub prg_rom: Vec<u8>,
    /// CHR ROM, or 8 KiB of zeroed CHR RAM when the header declares none.
    pub chr: Vec<u8>,
    pub chr_is_ram: bool,
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    /// Flag 6 bit 1: PRG RAM at $6000–$7FFF is battery backed.
    pub battery: bool,
}

impl Cartridge {
    /// Read and parse an iNES file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CartridgeError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| CartridgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&data)
    }

    /// Parse an in-memory iNES image. Missing bytes are an error, never zero-filled.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_LEN {
            return Err(CartridgeError::TooShort(data.len()));
        }
        let magic = [data[0], data[1], data[2], data[3]];
        if magic != MAGIC {
            return Err(CartridgeError::BadMagic(magic));
        }

        let prg_rom_size = data[4] as usize * 0x4000;
        let chr_rom_size = data[5] as usize * 0x2000;
        let flags6 = data[6];
        let flags7 = data[7];

        let mapper_id = (flags7 & 0xF0) | (flags6 >> 4);
        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let mut cursor = HEADER_LEN;
        if flags6 & 0x04 != 0 {
            take(data, &mut cursor, TRAINER_LEN, "trainer")?;
        }
        let prg_rom = take(data, &mut cursor, prg_rom_size, "PRG ROM")?.to_vec();
        let (chr, chr_is_ram) = if chr_rom_size == 0 {
            (vec![0; 0x2000], true)
        } else {
            (take(data, &mut cursor, chr_rom_size, "CHR ROM")?.to_vec(), false)
        };

        info!(
            mapper = mapper_id,
            prg_kib = prg_rom.len() / 1024,
            chr_kib = chr.len() / 1024,
            chr_ram = chr_is_ram,
            ?mirroring,
            "loaded cartridge"
        );

        Ok(Self {
            prg_rom,
            chr,
            chr_is_ram,
            mapper_id,
            mirroring,
            battery: flags6 & 0x02 != 0,
        })
    }

    /// Build the board's mapper. Chosen once; the console never re-selects it.
    pub fn into_mapper(self) -> Result<Box<dyn Mapper>, CartridgeError> {
        let mapper: Box<dyn Mapper> = match self.mapper_id {
            0 => Box::new(Mapper0::new(self)),
            1 => Box::new(Mapper1::new(self)),
            3 => Box::new(Mapper3::new(self)),
            4 => Box::new(Mapper4::new(self)),
            id => return Err(CartridgeError::UnsupportedMapper(id)),
        };
        Ok(mapper)
    }
}

fn take<'a>(
    data: &'a [u8],
    cursor: &mut usize,
    len: usize,
    section: &'static str,
) -> Result<&'a [u8], CartridgeError> {
    let start = *cursor;
    let available = data.len().saturating_sub(start);
    if available < len {
        return Err(CartridgeError::Truncated {
            section,
            expected: len,
            actual: available,
        });
    }
    *cursor += len;
    Ok(&data[start..start + len])
}
