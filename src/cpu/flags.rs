//! 6502 processor status register (P) flag bits.

pub const FLAG_CARRY: u8 = 1 << 0;
pub const FLAG_ZERO: u8 = 1 << 1;
pub const FLAG_INTERRUPT_DISABLE: u8 = 1 << 2;
pub const FLAG_DECIMAL: u8 = 1 << 3;  // Stored only; the 2A03 has no decimal mode
pub const FLAG_BREAK: u8 = 1 << 4;    // Set by BRK / PHP stack frame
pub const FLAG_UNUSED: u8 = 1 << 5;   // Always 1 when read on 6502
pub const FLAG_OVERFLOW: u8 = 1 << 6;
pub const FLAG_NEGATIVE: u8 = 1 << 7;

/// Status flags held individually; packed into P only for the stack and traces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusFlags {
    pub carry: bool,
    pub zero: bool,
    pub interrupt_disable: bool,
    pub decimal: bool,
    pub break_command: bool,
    pub overflow: bool,
    pub negative: bool,
}

impl StatusFlags {
    /// Pack into the P byte. The unused bit is always set.
    pub fn pack(self) -> u8 {
        let mut p = FLAG_UNUSED;
        for (set, bit) in [
            (self.carry, FLAG_CARRY),
            (self.zero, FLAG_ZERO),
            (self.interrupt_disable, FLAG_INTERRUPT_DISABLE),
            (self.decimal, FLAG_DECIMAL),
            (self.break_command, FLAG_BREAK),
            (self.overflow, FLAG_OVERFLOW),
            (self.negative, FLAG_NEGATIVE),
        ] {
            if set {
                p |= bit;
            }
        }
        p
    }

    pub fn unpack(p: u8) -> Self {
        Self {
            carry: p & FLAG_CARRY != 0,
            zero: p & FLAG_ZERO != 0,
            interrupt_disable: p & FLAG_INTERRUPT_DISABLE != 0,
            decimal: p & FLAG_DECIMAL != 0,
            break_command: p & FLAG_BREAK != 0,
            overflow: p & FLAG_OVERFLOW != 0,
            negative: p & FLAG_NEGATIVE != 0,
        }
    }
}
