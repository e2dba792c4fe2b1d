//! NES PPU: registers, dot scheduling, sprite pipeline, palette and debug views.
//!
//! See [PPU](https://www.nesdev.org/wiki/PPU) and
//! [PPU frame timing](https://www.nesdev.org/wiki/PPU_frame_timing).

pub mod debug;
pub mod palette;
pub mod phase;
pub mod ppu;
pub mod registers;
pub mod sprites;

#[cfg(test)]
mod tests;

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;
pub const DOTS_PER_SCANLINE: u64 = 341;
