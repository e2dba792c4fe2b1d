//! Video output: the PPU pushes pixels into a [`VideoSink`].

use crate::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Receives the PPU's output. `put_pixel` is called once per visible pixel in raster order,
/// `frame_complete` once per frame at the start of vblank.
pub trait VideoSink {
    fn put_pixel(&mut self, x: usize, y: usize, rgb: u32);
    fn frame_complete(&mut self);
}

/// 256×240 framebuffer (0xRRGGBB per pixel). Row-major, left-to-right, top-to-bottom.
pub struct FrameBuffer {
    pub pixels: Vec<u32>,
    /// Set when a frame completes; clear after presenting.
    pub frame_ready: bool,
    pub frames: u64,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            frame_ready: false,
            frames: 0,
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSink for FrameBuffer {
    fn put_pixel(&mut self, x: usize, y: usize, rgb: u32) {
        if let Some(p) = self.pixels.get_mut(y * SCREEN_WIDTH + x) {
            *p = rgb;
        }
    }

    fn frame_complete(&mut self) {
        self.frame_ready = true;
        self.frames += 1;
    }
}
