//! Console construction options.

use crate::ppu::ppu::DEFAULT_WARMUP_DOTS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Start here instead of at the reset vector (nestest's automated mode starts at $C000).
    pub start_pc: Option<u16>,
    /// Dots after power-on during which the PPU ignores PPUCTRL writes.
    pub ppu_warmup_dots: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            start_pc: None,
            ppu_warmup_dots: DEFAULT_WARMUP_DOTS,
        }
    }
}
