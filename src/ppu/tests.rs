use super::debug::{DebugView, PATTERN_VIEW_WIDTH};
use super::palette::rgb;
use super::phase::{Phase, Task};
use super::ppu::PPU;
use super::registers::Control;
use super::sprites::{SECONDARY_OAM_LEN, SpriteEvaluator};
use super::{DOTS_PER_SCANLINE, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::Mirroring;
use crate::cartridge::mapper::mapper::Mapper;
use crate::video::VideoSink;

struct Recorder {
    pixels: Vec<u32>,
    puts: usize,
    frames: usize,
}

impl Recorder {
    fn new() -> Self {
        Self {
            pixels: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            puts: 0,
            frames: 0,
        }
    }

    fn at(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * SCREEN_WIDTH + x]
    }
}

impl VideoSink for Recorder {
    fn put_pixel(&mut self, x: usize, y: usize, rgb: u32) {
        self.pixels[y * SCREEN_WIDTH + x] = rgb;
        self.puts += 1;
    }

    fn frame_complete(&mut self) {
        self.frames += 1;
    }
}

fn setup(mirroring: Mirroring) -> (PPU, Box<dyn Mapper>) {
    let cart = Cartridge {
        prg_rom: vec![0; 0x4000],
        chr: vec![0; 0x2000],
        chr_is_ram: true,
        mapper_id: 0,
        mirroring,
        battery: false,
    };
    (PPU::with_warmup(0), cart.into_mapper().unwrap())
}

/// Advance `dots`, returning how many NMIs were raised.
fn run(ppu: &mut PPU, mapper: &mut Box<dyn Mapper>, video: &mut Recorder, dots: u64) -> usize {
    let mut nmis = 0;
    ppu.step(dots, mapper.as_mut(), video, &mut || nmis += 1);
    nmis
}

/// Dots from power-on to scanline 241, dot 1.
const TO_FIRST_VBLANK: u64 = 242 * DOTS_PER_SCANLINE + 1;

fn set_addr(ppu: &mut PPU, mapper: &mut Box<dyn Mapper>, addr: u16) {
    ppu.write_register(6, (addr >> 8) as u8, mapper.as_mut());
    ppu.write_register(6, addr as u8, mapper.as_mut());
}

#[test]
fn frames_alternate_between_89341_and_89342_dots() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    let mut video = Recorder::new();
    let mut vblank_starts = Vec::new();

    while vblank_starts.len() < 4 {
        let frame = ppu.frame;
        run(&mut ppu, &mut mapper, &mut video, 1);
        if ppu.frame != frame {
            vblank_starts.push(ppu.cycles);
        }
    }

    assert_eq!(vblank_starts[0], TO_FIRST_VBLANK);
    assert_eq!(vblank_starts[1] - vblank_starts[0], 89341);
    assert_eq!(vblank_starts[2] - vblank_starts[1], 89342);
    assert_eq!(vblank_starts[3] - vblank_starts[2], 89341);
}

#[test]
fn vblank_is_set_at_241_1_and_cleared_at_prerender_dot_1() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    let mut video = Recorder::new();

    run(&mut ppu, &mut mapper, &mut video, TO_FIRST_VBLANK - 1);
    assert_eq!((ppu.scanline, ppu.dot), (241, 0));
    assert!(!ppu.vblank());

    run(&mut ppu, &mut mapper, &mut video, 1);
    assert_eq!((ppu.scanline, ppu.dot), (241, 1));
    assert!(ppu.vblank());
    assert_eq!(ppu.frame, 1);
    assert_eq!(video.frames, 1);

    // 241/1 → −1/0 is 20 lines.
    run(&mut ppu, &mut mapper, &mut video, 20 * DOTS_PER_SCANLINE - 1);
    assert_eq!((ppu.scanline, ppu.dot), (-1, 0));
    assert!(ppu.vblank());

    run(&mut ppu, &mut mapper, &mut video, 1);
    assert!(!ppu.vblank());
    assert!(ppu.sprite_overflow());
}

#[test]
fn status_read_clears_vblank() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    let mut video = Recorder::new();
    run(&mut ppu, &mut mapper, &mut video, TO_FIRST_VBLANK);

    assert_eq!(ppu.read_register(2, mapper.as_ref()) & 0x80, 0x80);
    assert_eq!(ppu.read_register(2, mapper.as_ref()) & 0x80, 0);
}

#[test]
fn status_low_bits_come_from_the_last_write() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    ppu.write_register(3, 0x1B, mapper.as_mut());

    assert_eq!(ppu.read_register(2, mapper.as_ref()), 0x1B);
    assert_eq!(ppu.read_register(0, mapper.as_ref()), 0x1B);
}

#[test]
fn status_read_resets_the_write_toggle() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    ppu.write_register(6, 0x21, mapper.as_mut());
    ppu.read_register(2, mapper.as_ref());
    set_addr(&mut ppu, &mut mapper, 0x2345);

    assert_eq!(ppu.v, 0x2345);
}

#[test]
fn nmi_is_raised_on_vblank_when_enabled() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    let mut video = Recorder::new();

    assert_eq!(run(&mut ppu, &mut mapper, &mut video, TO_FIRST_VBLANK), 0);

    ppu.write_register(0, 0x80, mapper.as_mut());
    // Enabling NMI inside vblank raises it on the next step.
    assert_eq!(run(&mut ppu, &mut mapper, &mut video, 0), 1);
    assert_eq!(run(&mut ppu, &mut mapper, &mut video, 0), 0);

    assert_eq!(run(&mut ppu, &mut mapper, &mut video, 89341), 1);
}

#[test]
fn ctrl_writes_are_ignored_during_warmup() {
    let mut ppu = PPU::with_warmup(100);
    let (_, mut mapper) = setup(Mirroring::Horizontal);
    let mut video = Recorder::new();

    ppu.write_register(0, 0x80, mapper.as_mut());
    assert!(ppu.ctrl.is_empty());

    run(&mut ppu, &mut mapper, &mut video, 100);
    ppu.write_register(0, 0x80, mapper.as_mut());
    assert_eq!(ppu.ctrl.bits(), 0x80);
}

#[test]
fn every_visible_pixel_is_emitted_once_per_frame() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    let mut video = Recorder::new();

    run(&mut ppu, &mut mapper, &mut video, TO_FIRST_VBLANK);
    assert_eq!(video.puts, SCREEN_WIDTH * SCREEN_HEIGHT);
    assert_eq!(video.frames, 1);

    run(&mut ppu, &mut mapper, &mut video, 89341);
    assert_eq!(video.puts, 2 * SCREEN_WIDTH * SCREEN_HEIGHT);
    assert_eq!(video.frames, 2);
}

#[test]
fn backdrop_color_fills_a_blank_screen() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    let mut video = Recorder::new();
    ppu.palette[0] = 0x21;

    run(&mut ppu, &mut mapper, &mut video, TO_FIRST_VBLANK);
    assert!(video.pixels.iter().all(|&p| p == rgb(0x21)));
}

#[test]
fn palette_mirrors_and_reads_immediately() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    set_addr(&mut ppu, &mut mapper, 0x3F10);
    ppu.write_register(7, 0xEA, mapper.as_mut());

    assert_eq!(ppu.palette[0], 0x2A);

    set_addr(&mut ppu, &mut mapper, 0x3F00);
    assert_eq!(ppu.read_register(7, mapper.as_ref()), 0x2A);
}

#[test]
fn ppudata_reads_are_buffered_below_the_palette() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    set_addr(&mut ppu, &mut mapper, 0x2000);
    ppu.write_register(7, 0x11, mapper.as_mut());
    ppu.write_register(7, 0x22, mapper.as_mut());

    set_addr(&mut ppu, &mut mapper, 0x2000);
    ppu.read_register(7, mapper.as_ref());
    assert_eq!(ppu.read_register(7, mapper.as_ref()), 0x11);
    assert_eq!(ppu.read_register(7, mapper.as_ref()), 0x22);
}

#[test]
fn ppudata_increment_follows_ctrl() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    ppu.write_register(0, 0x04, mapper.as_mut());
    set_addr(&mut ppu, &mut mapper, 0x2000);
    ppu.write_register(7, 0x01, mapper.as_mut());

    assert_eq!(ppu.v, 0x2020);
}

#[test]
fn nametable_writes_follow_mirroring() {
    let (mut ppu, mut mapper) = setup(Mirroring::Vertical);
    set_addr(&mut ppu, &mut mapper, 0x2005);
    ppu.write_register(7, 0x77, mapper.as_mut());

    // $2800 mirrors $2000 under vertical mirroring; $3000 mirrors $2000.
    for addr in [0x2805, 0x3005] {
        set_addr(&mut ppu, &mut mapper, addr);
        ppu.read_register(7, mapper.as_ref());
        set_addr(&mut ppu, &mut mapper, addr);
        assert_eq!(ppu.read_register(7, mapper.as_ref()), 0x77);
    }
    assert_eq!(ppu.nametables[0x005], 0x77);
}

#[test]
fn ppudata_reaches_chr_ram() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    set_addr(&mut ppu, &mut mapper, 0x0123);
    ppu.write_register(7, 0x5A, mapper.as_mut());

    assert_eq!(mapper.read(0x0123), 0x5A);
}

#[test]
fn oam_data_writes_increment_the_cursor() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    ppu.write_register(3, 0xFF, mapper.as_mut());
    ppu.write_register(4, 0x12, mapper.as_mut());
    ppu.write_register(4, 0x34, mapper.as_mut());

    assert_eq!(ppu.oam[0xFF], 0x12);
    assert_eq!(ppu.oam[0x00], 0x34);
    ppu.write_register(3, 0xFF, mapper.as_mut());
    assert_eq!(ppu.read_register(4, mapper.as_ref()), 0x12);
}

#[test]
fn oam_data_writes_are_ignored_while_rendering() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    let mut video = Recorder::new();
    ppu.write_register(1, 0x18, mapper.as_mut());
    run(&mut ppu, &mut mapper, &mut video, 10 * DOTS_PER_SCANLINE);

    ppu.write_register(3, 0x00, mapper.as_mut());
    ppu.write_register(4, 0x99, mapper.as_mut());
    assert_eq!(ppu.oam[0], 0x00);
}

#[test]
fn oam_dma_starts_at_the_cursor() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    let mut page = [0u8; 256];
    page[0] = 0xAB;
    ppu.write_register(3, 0x04, mapper.as_mut());
    ppu.oam_dma(&page);

    assert_eq!(ppu.oam[0x04], 0xAB);
}

/// Solid tile 1 (pixel value 1) in CHR, background made of tile 1, sprite 0 at (20, 11).
fn sprite_scene(mask: u8) -> (PPU, Box<dyn Mapper>) {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    for row in 0..8 {
        mapper.write(0x0010 + row, 0xFF);
    }
    ppu.nametables[..0x3C0].fill(1);
    ppu.oam.fill(0xFF);
    ppu.oam[..4].copy_from_slice(&[10, 1, 0, 20]);
    ppu.palette[0x01] = 0x0F;
    ppu.palette[0x11] = 0x16;
    ppu.write_register(1, mask, mapper.as_mut());
    (ppu, mapper)
}

#[test]
fn sprite_zero_hit_needs_both_layers() {
    let (mut ppu, mut mapper) = sprite_scene(0x1E);
    let mut video = Recorder::new();
    run(&mut ppu, &mut mapper, &mut video, TO_FIRST_VBLANK);
    assert!(ppu.sprite_zero_hit());

    let (mut ppu, mut mapper) = sprite_scene(0x16);
    run(&mut ppu, &mut mapper, &mut video, TO_FIRST_VBLANK);
    assert!(!ppu.sprite_zero_hit());
}

#[test]
fn sprites_draw_one_line_below_their_y() {
    let (mut ppu, mut mapper) = sprite_scene(0x14);
    let mut video = Recorder::new();
    run(&mut ppu, &mut mapper, &mut video, TO_FIRST_VBLANK);

    assert_eq!(video.at(20, 11), rgb(0x16));
    assert_eq!(video.at(27, 18), rgb(0x16));
    assert_eq!(video.at(19, 11), rgb(0x00));
    assert_eq!(video.at(28, 11), rgb(0x00));
    assert_eq!(video.at(20, 10), rgb(0x00));
    assert_eq!(video.at(20, 19), rgb(0x00));
}

#[test]
fn background_priority_sprites_hide_behind_opaque_background() {
    let (mut ppu, mut mapper) = sprite_scene(0x1E);
    ppu.oam[2] = 0x20;
    let mut video = Recorder::new();
    run(&mut ppu, &mut mapper, &mut video, TO_FIRST_VBLANK);

    assert_eq!(video.at(20, 11), rgb(0x0F));
}

#[test]
fn grayscale_masks_the_color() {
    let (mut ppu, mut mapper) = setup(Mirroring::Horizontal);
    let mut video = Recorder::new();
    ppu.palette[0] = 0x16;
    ppu.write_register(1, 0x01, mapper.as_mut());
    run(&mut ppu, &mut mapper, &mut video, TO_FIRST_VBLANK);

    assert_eq!(video.at(0, 0), rgb(0x10));
}

#[test]
fn horizontal_scroll_shifts_the_background() {
    let (mut ppu, mut mapper) = setup(Mirroring::Vertical);
    for row in 0..8 {
        mapper.write(0x0010 + row, 0xFF);
    }
    // Only column 1 of nametable 0 is tile 1.
    for ty in 0..30 {
        ppu.nametables[ty * 32 + 1] = 1;
    }
    ppu.palette[0x01] = 0x30;
    ppu.write_register(1, 0x0A, mapper.as_mut());
    ppu.write_register(5, 8, mapper.as_mut());
    ppu.write_register(5, 0, mapper.as_mut());
    let mut video = Recorder::new();
    run(&mut ppu, &mut mapper, &mut video, TO_FIRST_VBLANK);

    // Scroll is latched at dot 257, so from line 0 the column appears at x 0–7.
    assert_eq!(video.at(0, 5), rgb(0x30));
    assert_eq!(video.at(8, 5), rgb(0x00));
}

fn evaluate(oam: &[u8; 256], scanline: i16) -> (SpriteEvaluator, [u8; SECONDARY_OAM_LEN]) {
    let mut evaluator = SpriteEvaluator::default();
    let mut secondary = [0xFF; SECONDARY_OAM_LEN];
    for dot in 65..=256 {
        evaluator.tick(dot, scanline, 8, oam, &mut secondary);
    }
    (evaluator, secondary)
}

#[test]
fn evaluation_selects_at_most_eight_sprites() {
    let mut oam = [0xFF; 256];
    for i in 0..8 {
        oam[i * 4..i * 4 + 4].copy_from_slice(&[10, i as u8, 0, 8 * i as u8]);
    }
    let (evaluator, secondary) = evaluate(&oam, 12);
    assert_eq!(evaluator.found(), 8);
    assert!(!evaluator.overflow());
    assert!(evaluator.sprite_zero());
    assert_eq!(&secondary[28..32], &[10, 7, 0, 56]);

    oam[32] = 12;
    let (evaluator, _) = evaluate(&oam, 12);
    assert_eq!(evaluator.found(), 8);
    assert!(evaluator.overflow());
}

#[test]
fn evaluation_skips_out_of_range_sprites() {
    let mut oam = [0xFF; 256];
    oam[..4].copy_from_slice(&[100, 0, 0, 0]);
    oam[4..8].copy_from_slice(&[5, 3, 0x40, 9]);

    let (evaluator, secondary) = evaluate(&oam, 10);
    assert_eq!(evaluator.found(), 1);
    assert!(!evaluator.sprite_zero());
    assert_eq!(&secondary[..4], &[5, 3, 0x40, 9]);
}

#[test]
fn overflow_scan_reads_the_wrong_byte_after_eight() {
    let mut oam = [0xF0; 256];
    for i in 0..8 {
        oam[i * 4] = 10;
    }
    // Sprite 8 is out of range, so the scan moves to sprite 9 byte 1 (its tile) and treats
    // it as a Y coordinate.
    oam[9 * 4 + 1] = 12;
    let (evaluator, _) = evaluate(&oam, 12);
    assert!(evaluator.overflow());

    oam[9 * 4 + 1] = 0xF0;
    let (evaluator, _) = evaluate(&oam, 12);
    assert!(!evaluator.overflow());
}

#[test]
fn phases_cover_the_frame() {
    assert_eq!(Phase::at(-1, 1), Phase::PreRenderStart);
    assert_eq!(Phase::at(-1, 280), Phase::PreRenderFetch);
    assert_eq!(Phase::at(-1, 0), Phase::PreRenderIdle);
    assert_eq!(Phase::at(0, 1), Phase::VisibleClear);
    assert_eq!(Phase::at(100, 65), Phase::VisibleEvaluate);
    assert_eq!(Phase::at(239, 256), Phase::VisibleEvaluate);
    assert_eq!(Phase::at(239, 257), Phase::VisibleFetch);
    assert_eq!(Phase::at(5, 0), Phase::VisibleIdle);
    assert_eq!(Phase::at(5, 340), Phase::VisibleIdle);
    assert_eq!(Phase::at(240, 1), Phase::PostRender);
    assert_eq!(Phase::at(241, 1), Phase::VBlankStart);
    assert_eq!(Phase::at(241, 2), Phase::VBlank);
    assert_eq!(Phase::at(260, 340), Phase::VBlank);
}

#[test]
fn timed_tasks_fire_on_their_dot() {
    let fired = |phase: Phase, dot| -> Vec<Task> {
        phase.tasks().iter().copied().filter(|t| t.fires_at(dot)).collect()
    };

    assert_eq!(
        fired(Phase::VisibleFetch, 257),
        vec![Task::FetchSprite, Task::ReloadScrollX]
    );
    assert_eq!(fired(Phase::VisibleFetch, 260), vec![Task::ClockScanlineIrq]);
    assert_eq!(fired(Phase::VisibleFetch, 265), vec![Task::FetchSprite]);
    assert_eq!(fired(Phase::VisibleFetch, 266), vec![]);
    assert_eq!(fired(Phase::PreRenderFetch, 280), vec![Task::ReloadScrollY]);
}

#[test]
fn debug_views_cycle_back_to_off() {
    let view = DebugView::default();
    assert_eq!(view, DebugView::Off);
    assert_eq!(view.next(), DebugView::SpriteBoxes);
    assert_eq!(view.next().next(), DebugView::PatternTables);
    assert_eq!(view.next().next().next(), DebugView::Off);
}

#[test]
fn sprite_boxes_outline_each_oam_entry() {
    let (mut ppu, _) = setup(Mirroring::Horizontal);
    ppu.oam.fill(0xFF); // every entry below the screen
    ppu.oam[..4].copy_from_slice(&[9, 0x00, 0x00, 20]);
    let mut frame = vec![0; SCREEN_WIDTH * SCREEN_HEIGHT];

    ppu.draw_sprite_boxes(&mut frame);

    let at = |frame: &[u32], x: usize, y: usize| frame[y * SCREEN_WIDTH + x];
    assert_eq!(at(&frame, 20, 10), 0x00FF00);
    assert_eq!(at(&frame, 27, 10), 0x00FF00);
    assert_eq!(at(&frame, 20, 17), 0x00FF00);
    assert_eq!(at(&frame, 27, 14), 0x00FF00);
    assert_eq!(at(&frame, 24, 13), 0);
    assert_eq!(at(&frame, 28, 10), 0);
    assert_eq!(at(&frame, 20, 18), 0);
    assert_eq!(frame.iter().filter(|&&p| p != 0).count(), 28);

    ppu.ctrl.insert(Control::TALL_SPRITES);
    ppu.draw_sprite_boxes(&mut frame);
    assert_eq!(at(&frame, 23, 25), 0x00FF00);
}

#[test]
fn sprite_boxes_are_clipped_at_the_screen_edge() {
    let (mut ppu, _) = setup(Mirroring::Horizontal);
    ppu.oam.fill(0xFF);
    ppu.oam[..4].copy_from_slice(&[235, 0x00, 0x00, 252]);
    let mut frame = vec![0; SCREEN_WIDTH * SCREEN_HEIGHT];

    ppu.draw_sprite_boxes(&mut frame);

    assert_eq!(frame[236 * SCREEN_WIDTH + 255], 0x00FF00);
    assert_eq!(frame[239 * SCREEN_WIDTH + 252], 0x00FF00);
}

#[test]
fn pattern_tables_render_as_grey_tiles() {
    let (ppu, mut mapper) = setup(Mirroring::Horizontal);
    // $0000 table, tile 1, row 0: leftmost pixel is colour 3.
    mapper.write(0x0010, 0x80);
    mapper.write(0x0018, 0x80);
    // $1000 table, tile 0x21, row 2: rightmost pixel is colour 1.
    mapper.write(0x1212, 0x01);
    let mut frame = vec![0; SCREEN_WIDTH * SCREEN_HEIGHT];

    ppu.render_pattern_tables(mapper.as_ref(), &mut frame);

    let at = |x: usize, y: usize| frame[y * PATTERN_VIEW_WIDTH + x];
    assert_eq!(at(8, 0), 0xF0F0F0);
    assert_eq!(at(9, 0), 0x3C3C3C);
    assert_eq!(at(128 + 8 + 7, 16 + 2), 0x787878);
    assert_eq!(at(0, 0), 0x3C3C3C);
    // Rows below the tables are left alone.
    assert_eq!(frame[128 * SCREEN_WIDTH], 0);
}

#[test]
fn debug_view_off_leaves_the_frame_untouched() {
    let (ppu, mapper) = setup(Mirroring::Horizontal);
    let mut frame = vec![7; SCREEN_WIDTH * SCREEN_HEIGHT];

    DebugView::Off.draw(&ppu, mapper.as_ref(), &mut frame);
    assert!(frame.iter().all(|&p| p == 7));

    DebugView::PatternTables.draw(&ppu, mapper.as_ref(), &mut frame);
    assert_eq!(frame[0], 0x3C3C3C);
}
