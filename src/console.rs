//! The console: CPU, bus, PPU and cartridge wired together.
//!
//! Each [`Console::step`] runs one CPU instruction and then advances the PPU three dots per
//! CPU cycle it took. The PPU raises NMI through a callback that sets the CPU's latch, which
//! the CPU services at its next instruction boundary.

use tracing::{info, trace, warn};

use crate::{
    bus::NesBus,
    cartridge::cartridge::Cartridge,
    config::ConsoleConfig,
    controller::{Button, Controller, Port},
    cpu::cpu::CPU,
    error::{CartridgeError, CpuError},
    ppu::{debug::DebugView, ppu::PPU},
    trace::TraceRow,
    video::VideoSink,
};

/// PPU dots per CPU cycle (NTSC).
pub const DOTS_PER_CPU_CYCLE: u64 = 3;

pub struct Console<V: VideoSink> {
    cpu: CPU<NesBus>,
    video: V,
    config: ConsoleConfig,
}

impl<V: VideoSink> Console<V> {
    /// Power on with `cart` inserted and run the reset sequence.
    pub fn new(cart: Cartridge, video: V, config: ConsoleConfig) -> Result<Self, CartridgeError> {
        let mapper = cart.into_mapper()?;
        let bus = NesBus::new(mapper, PPU::with_warmup(config.ppu_warmup_dots));
        let mut console = Self {
            cpu: CPU::new(bus),
            video,
            config,
        };
        console.reset();
        Ok(console)
    }

    /// Reset the CPU, honouring the configured start address.
    pub fn reset(&mut self) {
        self.cpu.reset();
        if let Some(pc) = self.config.start_pc {
            self.cpu.pc = pc;
        }
        info!("reset, PC=${:04X}", self.cpu.pc);
    }

    /// Run one CPU instruction (plus any interrupt entry or DMA stall) and the PPU dots it
    /// covers. Returns the CPU cycles consumed.
    pub fn step(&mut self) -> Result<u64, CpuError> {
        trace!(target: "nestrel::trace", "{}", TraceRow::capture(&self.cpu));

        let cycles = self
            .cpu
            .step(1)
            .inspect_err(|err| warn!(%err, cycles = self.cpu.cycles, "CPU halted"))?;

        let CPU {
            bus, nmi_pending, ..
        } = &mut self.cpu;
        bus.tick(cycles * DOTS_PER_CPU_CYCLE, &mut self.video, &mut || *nmi_pending = true);
        Ok(cycles)
    }

    /// Step until the PPU completes a frame (enters vblank). Returns the CPU cycles consumed.
    pub fn run_frame(&mut self) -> Result<u64, CpuError> {
        let frame = self.cpu.bus.ppu.frame;
        let mut cycles = 0;
        while self.cpu.bus.ppu.frame == frame {
            cycles += self.step()?;
        }
        Ok(cycles)
    }

    pub fn cpu(&self) -> &CPU<NesBus> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CPU<NesBus> {
        &mut self.cpu
    }

    pub fn ppu(&self) -> &PPU {
        &self.cpu.bus.ppu
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut V {
        &mut self.video
    }

    pub fn controller_mut(&mut self, port: Port) -> &mut Controller {
        &mut self.cpu.bus.controllers[port as usize]
    }

    pub fn set_button(&mut self, port: Port, button: Button, pressed: bool) {
        self.controller_mut(port).set_button(button, pressed);
    }

    /// Draw `view` over `frame`, a copy of the last picture.
    pub fn draw_debug(&self, view: DebugView, frame: &mut [u32]) {
        view.draw(&self.cpu.bus.ppu, self.cpu.bus.mapper.as_ref(), frame);
    }

    /// Register snapshot for the next instruction.
    pub fn trace_row(&self) -> TraceRow {
        TraceRow::capture(&self.cpu)
    }
}
