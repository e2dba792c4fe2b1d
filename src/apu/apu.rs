//! APU register file.
//!
//! Holds the last value written to each of $4000–$4013, $4015 and $4017 so the CPU sees a
//! well-behaved device. Reads return 0, including $4015 (no channel is ever active).

use tracing::trace;

/// Number of registers in $4000–$4017.
const REGISTER_COUNT: usize = 0x18;

#[derive(Clone, Debug, Default)]
pub struct APU {
    registers: [u8; REGISTER_COUNT],
}

impl APU {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&mut self, addr: u16) -> u8 {
        trace!("APU read ${addr:04X}");
        0
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        trace!("APU write ${addr:04X} = ${data:02X}");
        if let Some(r) = self.registers.get_mut((addr as usize).wrapping_sub(0x4000)) {
            *r = data;
        }
    }

    /// Last value written to `addr`, for debuggers.
    pub fn register(&self, addr: u16) -> u8 {
        self.registers
            .get((addr as usize).wrapping_sub(0x4000))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_writes_and_reads_zero() {
        let mut apu = APU::new();
        apu.write(0x4000, 0xBF);
        apu.write(0x4017, 0x40);

        assert_eq!(apu.register(0x4000), 0xBF);
        assert_eq!(apu.register(0x4017), 0x40);
        assert_eq!(apu.read(0x4015), 0);
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut apu = APU::new();
        apu.write(0x4018, 1);
        assert_eq!(apu.register(0x4018), 0);
        assert_eq!(apu.register(0x3FFF), 0);
    }
}
