//! Debug views drawn over the picture: OAM sprite boxes and both pattern tables.
//!
//! The frontend cycles through [`DebugView`]s and draws the active one over a copy of the
//! frame before presenting it.

use crate::cartridge::mapper::mapper::Mapper;
use crate::ppu::ppu::PPU;
use crate::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Both pattern tables side by side, $0000 on the left and $1000 on the right.
pub const PATTERN_VIEW_WIDTH: usize = 256;
pub const PATTERN_VIEW_HEIGHT: usize = 128;

const BOX_COLOUR: u32 = 0x00FF00;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DebugView {
    #[default]
    Off,
    SpriteBoxes,
    PatternTables,
}

impl DebugView {
    /// The next view, wrapping back to `Off`.
    pub fn next(self) -> Self {
        match self {
            DebugView::Off => DebugView::SpriteBoxes,
            DebugView::SpriteBoxes => DebugView::PatternTables,
            DebugView::PatternTables => DebugView::Off,
        }
    }

    /// Draw this view over `frame` (256×240, row-major).
    pub fn draw(self, ppu: &PPU, mapper: &dyn Mapper, frame: &mut [u32]) {
        match self {
            DebugView::Off => {}
            DebugView::SpriteBoxes => ppu.draw_sprite_boxes(frame),
            DebugView::PatternTables => ppu.render_pattern_tables(mapper, frame),
        }
    }
}

impl PPU {
    /// Outline all 64 OAM entries. Sprites are drawn one line below their OAM Y, and boxes
    /// are clipped to the screen.
    pub fn draw_sprite_boxes(&self, frame: &mut [u32]) {
        let height = self.ctrl.sprite_height() as usize;
        for sprite in self.oam.chunks_exact(4) {
            let (left, top) = (sprite[3] as usize, sprite[0] as usize + 1);
            let (right, bottom) = (left + 7, top + height - 1);
            for x in left..=right {
                plot(frame, x, top);
                plot(frame, x, bottom);
            }
            for y in top..=bottom {
                plot(frame, left, y);
                plot(frame, right, y);
            }
        }
    }

    /// Render both pattern tables as 16×16 grids of tiles into the top 128 rows of `out`
    /// (256 pixels wide). Colour indices 0–3 become four shades of grey.
    pub fn render_pattern_tables(&self, mapper: &dyn Mapper, out: &mut [u32]) {
        for y in 0..PATTERN_VIEW_HEIGHT {
            for x in 0..PATTERN_VIEW_WIDTH {
                let table: u16 = if x >= 128 { 0x1000 } else { 0 };
                let tile = ((y / 8) * 16 + (x % 128) / 8) as u16;
                let addr = table | tile << 4 | (y % 8) as u16;

                let bit = 7 - (x % 8);
                let lo = (mapper.read(addr) >> bit) & 1;
                let hi = (mapper.read(addr + 8) >> bit) & 1;
                let shade = (u32::from(hi << 1 | lo) + 1) * 60;

                if let Some(p) = out.get_mut(y * PATTERN_VIEW_WIDTH + x) {
                    *p = shade << 16 | shade << 8 | shade;
                }
            }
        }
    }
}

fn plot(frame: &mut [u32], x: usize, y: usize) {
    if x < SCREEN_WIDTH
        && y < SCREEN_HEIGHT
        && let Some(p) = frame.get_mut(y * SCREEN_WIDTH + x)
    {
        *p = BOX_COLOUR;
    }
}
