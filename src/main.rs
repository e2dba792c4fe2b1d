//! NES emulator entry point.
//!
//! Loads a cartridge and runs it in a window, headless for a fixed number of frames, or
//! against a nestest.log reference trace.
//! Usage: nestrel <path/to/game.nes> [--start-pc C000] [--trace] [--compare-log nestest.log]
//!
//! In the window, Space pauses and ` cycles the debug views (sprite boxes, pattern tables).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ansi_term::Colour;
use anyhow::{Context, Result, bail};
use clap::Parser;
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};
use nestrel::{
    cartridge::cartridge::Cartridge,
    config::ConsoleConfig,
    console::Console,
    controller::{Button, Port},
    ppu::{SCREEN_HEIGHT, SCREEN_WIDTH, debug::DebugView},
    trace::TraceRow,
    video::FrameBuffer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// NES runs at ~60.0988 Hz (NTSC). Target one frame per 16.67 ms for ~60 fps.
const FRAME_DURATION: Duration = Duration::from_nanos(16_666_667);

const KEY_MAP: [(Key, Button); 8] = [
    (Key::Z, Button::A),
    (Key::X, Button::B),
    (Key::RightShift, Button::Select),
    (Key::Enter, Button::Start),
    (Key::Up, Button::Up),
    (Key::Down, Button::Down),
    (Key::Left, Button::Left),
    (Key::Right, Button::Right),
];

/// Cycle-stepped NES emulator
#[derive(Parser, Debug)]
#[command(name = "nestrel", version, about, long_about = None)]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Start executing here instead of at the reset vector (hex, e.g. C000)
    #[arg(long, value_parser = parse_hex)]
    start_pc: Option<u16>,

    /// Print a coloured trace row before every instruction
    #[arg(long)]
    trace: bool,

    /// Compare execution against a nestest.log reference trace and exit
    #[arg(long)]
    compare_log: Option<PathBuf>,

    /// Run this many frames without a window and exit
    #[arg(long)]
    frames: Option<u64>,

    /// Window scale factor (1, 2, 4 or 8)
    #[arg(long, default_value_t = 2)]
    scale: u8,
}

fn parse_hex(s: &str) -> Result<u16, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches('$');
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid address {s:?}: {e}"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let cart = Cartridge::load(&args.rom)
        .with_context(|| format!("loading {}", args.rom.display()))?;
    let config = ConsoleConfig {
        start_pc: args.start_pc,
        ..ConsoleConfig::default()
    };
    let mut console =
        Console::new(cart, FrameBuffer::new(), config).context("creating the console")?;

    if let Some(log) = &args.compare_log {
        return compare(&mut console, log);
    }
    if let Some(frames) = args.frames {
        for _ in 0..frames {
            run_frame(&mut console, args.trace)?;
        }
        info!(frames, cycles = console.cpu().cycles, "headless run finished");
        return Ok(());
    }
    run_window(&mut console, args.scale, args.trace)
}

fn print_row(row: &TraceRow) {
    println!(
        "{}  {}",
        Colour::Cyan.paint(format!("{:04X}", row.pc)),
        Colour::White.dimmed().paint(format!(
            "A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
            row.a, row.x, row.y, row.p, row.sp
        )),
    );
}

/// Step until the PPU finishes a frame, printing each instruction when `trace` is set.
fn run_frame(console: &mut Console<FrameBuffer>, trace: bool) -> Result<()> {
    if !trace {
        console.run_frame().context("CPU halted")?;
        return Ok(());
    }
    let frame = console.ppu().frame;
    while console.ppu().frame == frame {
        print_row(&console.trace_row());
        console.step().context("CPU halted")?;
    }
    Ok(())
}

/// Step alongside a nestest.log and stop at the first divergence.
fn compare(console: &mut Console<FrameBuffer>, log: &Path) -> Result<()> {
    let text =
        fs::read_to_string(log).with_context(|| format!("reading {}", log.display()))?;

    let mut matched = 0;
    for (n, line) in text.lines().enumerate() {
        let expected = TraceRow::parse(line)
            .with_context(|| format!("{}:{}: unparseable trace line", log.display(), n + 1))?;
        let actual = console.trace_row();
        if actual != expected {
            println!("{} {expected}", Colour::Green.paint("expected"));
            println!("{} {actual}", Colour::Red.bold().paint("actual  "));
            bail!("trace diverged at line {}", n + 1);
        }
        matched += 1;

        if let Err(err) = console.step() {
            println!("{} after {matched} rows: {err}", Colour::Yellow.paint("stopped"));
            return Ok(());
        }
    }
    println!("{} {matched} rows", Colour::Green.bold().paint("matched"));
    Ok(())
}

fn run_window(console: &mut Console<FrameBuffer>, scale: u8, trace: bool) -> Result<()> {
    let scale = match scale {
        1 => Scale::X1,
        4 => Scale::X4,
        8 => Scale::X8,
        _ => Scale::X2,
    };
    let mut window = Window::new(
        "Nestrel",
        SCREEN_WIDTH,
        SCREEN_HEIGHT,
        WindowOptions {
            resize: true,
            scale,
            scale_mode: minifb::ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        },
    )
    .context("failed to create window")?;

    let mut display = vec![0; SCREEN_WIDTH * SCREEN_HEIGHT];
    let mut view = DebugView::Off;
    let mut paused = false;
    let mut fps_timer = Instant::now();
    let mut frames_shown = 0u32;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        if window.is_key_pressed(Key::Space, KeyRepeat::No) {
            paused = !paused;
            info!(paused, "pause toggled");
        }
        if window.is_key_pressed(Key::Backquote, KeyRepeat::No) {
            view = view.next();
            info!(?view, "debug view");
        }
        for (key, button) in KEY_MAP {
            console.set_button(Port::One, button, window.is_key_down(key));
        }

        if !paused {
            run_frame(console, trace)?;
        }

        display.copy_from_slice(&console.video().pixels);
        console.draw_debug(view, &mut display);
        window
            .update_with_buffer(&display, SCREEN_WIDTH, SCREEN_HEIGHT)
            .context("failed to update window")?;
        console.video_mut().frame_ready = false;

        // Pace to ~60 fps so we don't burn CPU (emulation is far faster than real NES)
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }

        frames_shown += 1;
        let spent = fps_timer.elapsed();
        if spent >= Duration::from_secs(1) {
            let fps = f64::from(frames_shown) / spent.as_secs_f64();
            window.set_title(&format!("Nestrel - FPS: {fps:.0}"));
            fps_timer = Instant::now();
            frames_shown = 0;
        }
    }
    Ok(())
}
