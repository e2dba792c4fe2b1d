//! Sprite evaluation and the eight per-line sprite output units.
//!
//! Evaluation runs over dots 65–256: odd dots read primary OAM, even dots write secondary OAM.
//! After eight sprites are found the scan continues looking for a ninth, but the byte index
//! `m` is incremented together with the sprite index `n`, so it checks tile/attribute/X bytes
//! as if they were Y coordinates. That is the hardware's overflow bug and is kept as is.

pub const SECONDARY_OAM_LEN: usize = 32;
pub const MAX_SPRITES_PER_LINE: usize = 8;

#[derive(Clone, Debug, Default)]
pub struct SpriteEvaluator {
    /// Primary OAM sprite index (0..=64, 64 = scan finished).
    n: usize,
    /// Byte within the sprite.
    m: usize,
    found: usize,
    latch: u8,
    done: bool,
    overflow: bool,
    sprite_zero: bool,
}

impl SpriteEvaluator {
    /// Advance one dot of evaluation. `dot` is in 65..=256; the scan restarts at 65.
    pub fn tick(
        &mut self,
        dot: u16,
        scanline: i16,
        height: i16,
        oam: &[u8; 256],
        secondary: &mut [u8; SECONDARY_OAM_LEN],
    ) {
        if dot == 65 {
            *self = Self::default();
        }
        if self.done {
            return;
        }
        if dot % 2 == 1 {
            self.latch = oam[self.n * 4 + self.m];
            return;
        }

        let in_range = {
            let row = scanline - self.latch as i16;
            (0..height).contains(&row)
        };

        if self.found < MAX_SPRITES_PER_LINE {
            secondary[self.found * 4 + self.m] = self.latch;
            if self.m == 0 {
                if in_range {
                    self.sprite_zero |= self.n == 0;
                    self.m = 1;
                } else {
                    self.next_sprite();
                }
            } else {
                self.m += 1;
                if self.m == 4 {
                    self.m = 0;
                    self.found += 1;
                    self.next_sprite();
                }
            }
        } else if in_range {
            self.overflow = true;
            self.done = true;
        } else {
            self.m = (self.m + 1) & 3;
            self.next_sprite();
        }
    }

    fn next_sprite(&mut self) {
        self.n += 1;
        if self.n == 64 {
            self.done = true;
        }
    }

    /// Sprites copied to secondary OAM so far.
    pub fn found(&self) -> usize {
        self.found
    }

    pub fn overflow(&self) -> bool {
        self.overflow
    }

    /// Sprite 0 is among the selected sprites.
    pub fn sprite_zero(&self) -> bool {
        self.sprite_zero
    }
}

/// One of the eight sprite output units: pattern shift registers, attributes, X counter.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpriteSlot {
    pub pattern_lo: u8,
    pub pattern_hi: u8,
    pub attributes: u8,
    pub x: u8,
}

/// An opaque sprite pixel picked for the current dot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpritePixel {
    pub pixel: u8,
    pub palette: u8,
    pub behind_background: bool,
    pub slot: usize,
}

impl SpriteSlot {
    /// Count down X, then shift out one pixel per dot. Returns the 2-bit pixel once active.
    pub fn clock(&mut self) -> Option<u8> {
        if self.x > 0 {
            self.x -= 1;
            return None;
        }
        let pixel = ((self.pattern_hi >> 7) << 1) | (self.pattern_lo >> 7);
        self.pattern_lo <<= 1;
        self.pattern_hi <<= 1;
        Some(pixel)
    }
}

/// Clock every active slot and return the first opaque pixel, lowest slot winning.
pub fn clock_slots(slots: &mut [SpriteSlot]) -> Option<SpritePixel> {
    let mut chosen = None;
    for (i, slot) in slots.iter_mut().enumerate() {
        let Some(pixel) = slot.clock() else { continue };
        if chosen.is_none() && pixel != 0 {
            chosen = Some(SpritePixel {
                pixel,
                palette: slot.attributes & 3,
                behind_background: slot.attributes & 0x20 != 0,
                slot: i,
            });
        }
    }
    chosen
}
