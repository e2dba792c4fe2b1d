//! NES PPU (Picture Processing Unit) implementation.
//!
//! Walks the 341×262 dot grid one dot at a time and runs the tasks [`Phase::tasks`] schedules
//! for each position: sprite evaluation into secondary OAM, sprite pattern fetches, per-pixel
//! background/sprite composition, scroll reloads, the MMC3 scanline clock and vblank.
//! Registers: $2000–$2007 (mirrored).

use tracing::debug;

use crate::cartridge::mapper::mapper::Mapper;
use crate::ppu::palette::{palette_index, rgb};
use crate::ppu::phase::{LAST_DOT, LAST_SCANLINE, PRERENDER_SCANLINE, Phase, Task};
use crate::ppu::registers::{Control, Mask, Status};
use crate::ppu::sprites::{
    MAX_SPRITES_PER_LINE, SECONDARY_OAM_LEN, SpriteEvaluator, SpriteSlot, clock_slots,
};
use crate::video::VideoSink;

/// OAM (Object Attribute Memory): 64 sprites × 4 bytes. Each entry: Y, tile, attr, X.
pub const OAM_LEN: usize = 256;

/// Dots after power-on during which PPUCTRL writes are dropped (29658 CPU cycles).
pub const DEFAULT_WARMUP_DOTS: u64 = 29658 * 3;

/// PPU state: timing, registers, nametable RAM, palettes, OAM and the sprite pipeline.
pub struct PPU {
    pub scanline: i16,
    pub dot: u16,
    /// Completed frames (incremented on entering vblank).
    pub frame: u64,
    /// Dots elapsed since power-on.
    pub cycles: u64,
    pub ctrl: Control,
    pub mask: Mask,
    pub status: Status,
    /// Last value written to any register; the low bits of PPUSTATUS read back from it.
    latch: u8,
    /// Shared first/second write toggle of $2005/$2006.
    toggle: bool,
    /// VRAM address for $2007.
    pub v: u16,
    pub scroll_x: u8,
    pub scroll_y: u8,
    read_buffer: u8,
    /// Nametable RAM: 2 KiB on the console plus 2 KiB that only four-screen boards reach.
    pub nametables: [u8; 0x1000],
    /// Palette RAM $3F00-$3F1F.
    pub palette: [u8; 32],
    /// OAM, written via $2003/$2004 or $4014 DMA.
    pub oam: [u8; OAM_LEN],
    pub oam_addr: u8,
    secondary_oam: [u8; SECONDARY_OAM_LEN],
    evaluator: SpriteEvaluator,
    slots: [SpriteSlot; MAX_SPRITES_PER_LINE],
    slot_count: usize,
    sprite_zero_on_line: bool,
    render_scroll_x: u8,
    render_scroll_y: u8,
    render_nt_x: bool,
    render_nt_y: bool,
    /// Between prerender dot 1 and vblank.
    rendering: bool,
    warmup_dots: u64,
    /// NMI enabled during vblank by a PPUCTRL write; delivered on the next `step`.
    nmi_deferred: bool,
}

impl PPU {
    /// Create PPU in power-on state (prerender scanline −1, dot 0).
    pub fn new() -> Self {
        Self::with_warmup(DEFAULT_WARMUP_DOTS)
    }

    pub fn with_warmup(warmup_dots: u64) -> Self {
        Self {
            scanline: PRERENDER_SCANLINE,
            dot: 0,
            frame: 0,
            cycles: 0,
            ctrl: Control::empty(),
            mask: Mask::empty(),
            status: Status::empty(),
            latch: 0,
            toggle: false,
            v: 0,
            scroll_x: 0,
            scroll_y: 0,
            read_buffer: 0,
            nametables: [0; 0x1000],
            palette: [0; 32],
            oam: [0; OAM_LEN],
            oam_addr: 0,
            secondary_oam: [0xFF; SECONDARY_OAM_LEN],
            evaluator: SpriteEvaluator::default(),
            slots: [SpriteSlot::default(); MAX_SPRITES_PER_LINE],
            slot_count: 0,
            sprite_zero_on_line: false,
            render_scroll_x: 0,
            render_scroll_y: 0,
            render_nt_x: false,
            render_nt_y: false,
            rendering: false,
            warmup_dots,
            nmi_deferred: false,
        }
    }

    pub fn vblank(&self) -> bool {
        self.status.contains(Status::VBLANK)
    }

    pub fn sprite_zero_hit(&self) -> bool {
        self.status.contains(Status::SPRITE_ZERO_HIT)
    }

    pub fn sprite_overflow(&self) -> bool {
        self.status.contains(Status::SPRITE_OVERFLOW)
    }

    /// Advance exactly `dots` dots. Pixels and frame ends go to `video`; `raise_nmi` is called
    /// when the PPU asserts NMI.
    pub fn step(
        &mut self,
        dots: u64,
        mapper: &mut dyn Mapper,
        video: &mut dyn VideoSink,
        raise_nmi: &mut dyn FnMut(),
    ) {
        if std::mem::take(&mut self.nmi_deferred) {
            raise_nmi();
        }
        for _ in 0..dots {
            self.tick(mapper, video, raise_nmi);
        }
    }

    fn tick(
        &mut self,
        mapper: &mut dyn Mapper,
        video: &mut dyn VideoSink,
        raise_nmi: &mut dyn FnMut(),
    ) {
        self.cycles += 1;
        self.dot += 1;

        // Odd frames drop the last prerender dot.
        if self.scanline == PRERENDER_SCANLINE && self.dot == LAST_DOT && self.frame % 2 == 1 {
            self.dot += 1;
        }
        if self.dot > LAST_DOT {
            self.dot = 0;
            self.scanline = if self.scanline == LAST_SCANLINE {
                PRERENDER_SCANLINE
            } else {
                self.scanline + 1
            };
        }

        for &task in Phase::at(self.scanline, self.dot).tasks() {
            if task.fires_at(self.dot) {
                self.run(task, mapper, video, raise_nmi);
            }
        }
    }

    fn run(
        &mut self,
        task: Task,
        mapper: &mut dyn Mapper,
        video: &mut dyn VideoSink,
        raise_nmi: &mut dyn FnMut(),
    ) {
        match task {
            Task::StartFrame => {
                self.status.remove(Status::VBLANK | Status::SPRITE_ZERO_HIT);
                self.status.insert(Status::SPRITE_OVERFLOW);
                self.rendering = true;
            }
            Task::ClearSecondaryOam => {
                if self.dot % 2 == 0 {
                    self.secondary_oam[(self.dot as usize - 1) / 2] = 0xFF;
                }
            }
            Task::EvaluateSprites => {
                if self.mask.rendering_enabled() {
                    self.evaluator.tick(
                        self.dot,
                        self.scanline,
                        self.ctrl.sprite_height(),
                        &self.oam,
                        &mut self.secondary_oam,
                    );
                    if self.evaluator.overflow() {
                        self.status.insert(Status::SPRITE_OVERFLOW);
                    }
                }
            }
            Task::FetchSprite => self.fetch_sprite((self.dot as usize - 257) / 8, mapper),
            Task::DrawPixel => self.draw_pixel(mapper, video),
            Task::ReloadScrollX => {
                self.render_scroll_x = self.scroll_x;
                self.render_nt_x = self.ctrl.contains(Control::NAMETABLE_X);
            }
            Task::ReloadScrollY => {
                self.render_scroll_y = self.scroll_y;
                self.render_nt_y = self.ctrl.contains(Control::NAMETABLE_Y);
            }
            Task::ClockScanlineIrq => {
                if self.mask.rendering_enabled() {
                    mapper.on_scanline();
                }
            }
            Task::EnterVBlank => {
                video.frame_complete();
                self.status.insert(Status::VBLANK);
                if self.ctrl.contains(Control::NMI_ENABLE) {
                    raise_nmi();
                }
                self.frame += 1;
                self.rendering = false;
            }
        }
    }

    /// Load sprite slot `slot` for the next line from secondary OAM.
    fn fetch_sprite(&mut self, slot: usize, mapper: &dyn Mapper) {
        if slot == 0 {
            let active = self.scanline != PRERENDER_SCANLINE && self.mask.rendering_enabled();
            self.slot_count = if active { self.evaluator.found() } else { 0 };
            self.sprite_zero_on_line = active && self.evaluator.sprite_zero();
        }
        if slot >= self.slot_count {
            self.slots[slot] = SpriteSlot { x: 0xFF, ..SpriteSlot::default() };
            return;
        }

        let entry = &self.secondary_oam[slot * 4..slot * 4 + 4];
        let (y, tile, attributes, x) = (entry[0], entry[1], entry[2], entry[3]);
        let height = self.ctrl.sprite_height();

        let mut row = (self.scanline - y as i16).clamp(0, height - 1);
        if attributes & 0x80 != 0 {
            row = height - 1 - row;
        }

        let (table, tile) = if height == 16 {
            ((tile & 1) as u16 * 0x1000, (tile & 0xFE) + u8::from(row >= 8))
        } else if self.ctrl.contains(Control::SPRITE_TABLE) {
            (0x1000, tile)
        } else {
            (0x0000, tile)
        };
        let addr = table + tile as u16 * 16 + (row & 7) as u16;
        let (mut lo, mut hi) = (mapper.read(addr), mapper.read(addr + 8));
        if attributes & 0x40 != 0 {
            lo = lo.reverse_bits();
            hi = hi.reverse_bits();
        }

        self.slots[slot] = SpriteSlot {
            pattern_lo: lo,
            pattern_hi: hi,
            attributes,
            x,
        };
    }

    fn draw_pixel(&mut self, mapper: &dyn Mapper, video: &mut dyn VideoSink) {
        let x = self.dot as usize - 1;
        let y = self.scanline as usize;
        let left = x < 8;

        let show_background = self.mask.contains(Mask::SHOW_BACKGROUND)
            && (!left || self.mask.contains(Mask::SHOW_BACKGROUND_LEFT));
        let show_sprites = self.mask.contains(Mask::SHOW_SPRITES)
            && (!left || self.mask.contains(Mask::SHOW_SPRITES_LEFT));

        let (bg_pixel, bg_group) = if show_background {
            self.background_pixel(x, y, mapper)
        } else {
            (0, 0)
        };
        // Slots shift every dot even while hidden.
        let sprite = clock_slots(&mut self.slots).filter(|_| show_sprites);

        if let Some(s) = sprite
            && s.slot == 0
            && self.sprite_zero_on_line
            && bg_pixel != 0
            && x != 255
        {
            self.status.insert(Status::SPRITE_ZERO_HIT);
        }

        let addr = match sprite {
            Some(s) if !(s.behind_background && bg_pixel != 0) => 0x10 + s.palette * 4 + s.pixel,
            _ if bg_pixel != 0 => bg_group * 4 + bg_pixel,
            _ => 0,
        };
        let mut color = self.palette[palette_index(addr as u16)];
        if self.mask.contains(Mask::GRAYSCALE) {
            color &= 0x30;
        }
        video.put_pixel(x, y, rgb(color));
    }

    /// Background pixel value (0–3) and attribute palette group at screen (x, y).
    fn background_pixel(&self, x: usize, y: usize, mapper: &dyn Mapper) -> (u8, u8) {
        let wx = (x + self.render_scroll_x as usize + 256 * self.render_nt_x as usize) % 512;
        let wy = (y + self.render_scroll_y as usize + 240 * self.render_nt_y as usize) % 480;
        let nt = wx / 256 + 2 * (wy / 240);
        let tx = (wx % 256) / 8;
        let ty = (wy % 240) / 8;

        let base = 0x2000 + nt as u16 * 0x400;
        let tile = self.nametables[mapper.nametable_index(base + (ty * 32 + tx) as u16)];
        let attr_addr = base + 0x3C0 + (ty / 4 * 8 + tx / 4) as u16;
        let attr = self.nametables[mapper.nametable_index(attr_addr)];
        let group = (attr >> (((tx % 4) / 2) * 2 + ((ty % 4) / 2) * 4)) & 3;

        let table = if self.ctrl.contains(Control::BACKGROUND_TABLE) { 0x1000 } else { 0 };
        let addr = table + tile as u16 * 16 + (wy % 8) as u16;
        let (lo, hi) = (mapper.read(addr), mapper.read(addr + 8));
        let bit = 7 - (wx % 8);
        let pixel = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
        (pixel, group)
    }

    /// CPU read of register `reg` (0–7).
    pub fn read_register(&mut self, reg: u16, mapper: &dyn Mapper) -> u8 {
        match reg {
            2 => {
                let value = (self.latch & 0x1F) | self.status.bits();
                self.status.remove(Status::VBLANK);
                self.toggle = false;
                self.latch = value;
                value
            }
            4 => self.oam[self.oam_addr as usize],
            7 => {
                let addr = self.v & 0x3FFF;
                let data = if addr >= 0x3F00 {
                    self.read_buffer = self.mem_read(addr - 0x1000, mapper);
                    self.mem_read(addr, mapper)
                } else {
                    let fresh = self.mem_read(addr, mapper);
                    std::mem::replace(&mut self.read_buffer, fresh)
                };
                self.v = self.v.wrapping_add(self.ctrl.vram_increment());
                data
            }
            _ => self.latch,
        }
    }

    /// CPU write of register `reg` (0–7).
    pub fn write_register(&mut self, reg: u16, data: u8, mapper: &mut dyn Mapper) {
        self.latch = data;
        match reg {
            0 => {
                if self.cycles < self.warmup_dots {
                    debug!(data, cycles = self.cycles, "PPUCTRL write during warm-up ignored");
                    return;
                }
                let before = self.ctrl;
                self.ctrl = Control::from_bits_retain(data);
                if !before.contains(Control::NMI_ENABLE)
                    && self.ctrl.contains(Control::NMI_ENABLE)
                    && self.vblank()
                {
                    self.nmi_deferred = true;
                }
            }
            1 => self.mask = Mask::from_bits_retain(data),
            3 => self.oam_addr = data,
            4 => {
                if self.rendering && self.mask.rendering_enabled() {
                    return;
                }
                self.oam[self.oam_addr as usize] = data;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            5 => {
                if self.toggle {
                    self.scroll_y = data;
                } else {
                    self.scroll_x = data;
                }
                self.toggle = !self.toggle;
            }
            6 => {
                if self.toggle {
                    self.v = (self.v & 0xFF00) | data as u16;
                } else {
                    self.v = ((data as u16) << 8) | (self.v & 0x00FF);
                }
                self.toggle = !self.toggle;
            }
            7 => {
                self.mem_write(self.v & 0x3FFF, data, mapper);
                self.v = self.v.wrapping_add(self.ctrl.vram_increment());
            }
            _ => {}
        }
    }

    /// Copy a page into OAM starting at the OAM cursor ($4014 DMA).
    pub fn oam_dma(&mut self, data: &[u8; 256]) {
        for (i, &b) in data.iter().enumerate() {
            self.oam[self.oam_addr.wrapping_add(i as u8) as usize] = b;
        }
    }

    fn mem_read(&self, addr: u16, mapper: &dyn Mapper) -> u8 {
        match addr & 0x3FFF {
            a @ 0x0000..=0x1FFF => mapper.read(a),
            a @ 0x2000..=0x3EFF => self.nametables[mapper.nametable_index(a)],
            a => self.palette[palette_index(a)],
        }
    }

    fn mem_write(&mut self, addr: u16, data: u8, mapper: &mut dyn Mapper) {
        match addr & 0x3FFF {
            a @ 0x0000..=0x1FFF => mapper.write(a, data),
            a @ 0x2000..=0x3EFF => self.nametables[mapper.nametable_index(a)] = data,
            a => self.palette[palette_index(a)] = data & 0x3F,
        }
    }
}

impl Default for PPU {
    fn default() -> Self {
        Self::new()
    }
}
