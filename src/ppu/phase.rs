//! Per-dot schedule of the PPU.
//!
//! [`Phase::at`] classifies a (scanline, dot) position and [`Phase::tasks`] lists the work the
//! PPU performs there. The PPU itself only walks the grid and runs whatever the table says, so
//! the timing contract can be checked without rendering anything.
//!
//! See [PPU rendering](https://www.nesdev.org/wiki/PPU_rendering) and
//! [PPU sprite evaluation](https://www.nesdev.org/wiki/PPU_sprite_evaluation).

pub const PRERENDER_SCANLINE: i16 = -1;
pub const LAST_VISIBLE_SCANLINE: i16 = 239;
pub const POSTRENDER_SCANLINE: i16 = 240;
pub const VBLANK_SCANLINE: i16 = 241;
pub const LAST_SCANLINE: i16 = 260;
pub const LAST_DOT: u16 = 340;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Prerender line, dot 1: flags reset, rendering window opens.
    PreRenderStart,
    /// Prerender line, dots 257–320: sprite slots emptied for line 0, scroll reloads.
    PreRenderFetch,
    /// Everything else on the prerender line.
    PreRenderIdle,
    /// Visible line, dots 1–64: secondary OAM cleared while pixels are drawn.
    VisibleClear,
    /// Visible line, dots 65–256: sprite evaluation while pixels are drawn.
    VisibleEvaluate,
    /// Visible line, dots 257–320: sprite pattern fetches for the next line.
    VisibleFetch,
    /// Visible line, dot 0 and 321–340.
    VisibleIdle,
    PostRender,
    /// Scanline 241, dot 1.
    VBlankStart,
    VBlank,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    StartFrame,
    ClearSecondaryOam,
    EvaluateSprites,
    DrawPixel,
    FetchSprite,
    ReloadScrollX,
    ReloadScrollY,
    ClockScanlineIrq,
    EnterVBlank,
}

impl Phase {
    pub fn at(scanline: i16, dot: u16) -> Phase {
        match scanline {
            PRERENDER_SCANLINE => match dot {
                1 => Phase::PreRenderStart,
                257..=320 => Phase::PreRenderFetch,
                _ => Phase::PreRenderIdle,
            },
            0..=LAST_VISIBLE_SCANLINE => match dot {
                1..=64 => Phase::VisibleClear,
                65..=256 => Phase::VisibleEvaluate,
                257..=320 => Phase::VisibleFetch,
                _ => Phase::VisibleIdle,
            },
            POSTRENDER_SCANLINE => Phase::PostRender,
            VBLANK_SCANLINE if dot == 1 => Phase::VBlankStart,
            _ => Phase::VBlank,
        }
    }

    pub fn tasks(self) -> &'static [Task] {
        use Task::*;
        match self {
            Phase::PreRenderStart => &[StartFrame],
            Phase::PreRenderFetch => &[FetchSprite, ReloadScrollX, ClockScanlineIrq, ReloadScrollY],
            Phase::VisibleClear => &[ClearSecondaryOam, DrawPixel],
            Phase::VisibleEvaluate => &[EvaluateSprites, DrawPixel],
            Phase::VisibleFetch => &[FetchSprite, ReloadScrollX, ClockScanlineIrq],
            Phase::VBlankStart => &[EnterVBlank],
            Phase::PreRenderIdle | Phase::VisibleIdle | Phase::PostRender | Phase::VBlank => &[],
        }
    }
}

/// Fetch/reload tasks span a range of dots but act on a single one.
impl Task {
    pub fn fires_at(self, dot: u16) -> bool {
        match self {
            Task::FetchSprite => dot >= 257 && (dot - 257) % 8 == 0,
            Task::ReloadScrollX => dot == 257,
            Task::ClockScanlineIrq => dot == 260,
            Task::ReloadScrollY => dot == 280,
            _ => true,
        }
    }
}
