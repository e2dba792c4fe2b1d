//! NES APU (Audio Processing Unit) registers.
//!
//! Sound synthesis is outside this crate; the [APU](https://www.nesdev.org/wiki/APU) is a
//! register-file stub so programs that poke $4000–$4017 run unaffected.

pub mod apu;
