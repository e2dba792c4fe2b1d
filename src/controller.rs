//! NES controller input handling.
//!
//! Implements the standard NES controller shift register protocol: while bit 0 of the last
//! $4016 write is set the read cursor is held at button A; once it is cleared, each read of
//! $4016/$4017 returns one button (A, B, Select, Start, Up, Down, Left, Right) and advances.

/// Button order as shifted out by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    A = 0,
    B = 1,
    Select = 2,
    Start = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
}

/// Controller port: $4016 or $4017.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Port {
    One = 0,
    Two = 1,
}

/// Represents a single NES controller.
#[derive(Clone, Debug, Default)]
pub struct Controller {
    /// Current button states: bit 0 = A, 1 = B, 2 = Select, 3 = Start, 4 = Up, 5 = Down, 6 = Left, 7 = Right.
    pub state: u8,
    index: u8,
    strobe: bool,
}

impl Controller {
    /// Create a new controller with no buttons pressed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        let bit = 1 << button as u8;
        if pressed {
            self.state |= bit;
        } else {
            self.state &= !bit;
        }
    }

    /// Read one button state. Returns the button bit OR'd with open bus ($40); 0 past the
    /// eighth button.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            self.index = 0;
        }
        let bit = if self.index < 8 {
            (self.state >> self.index) & 1
        } else {
            0
        };
        if !self.strobe && self.index < 8 {
            self.index += 1;
        }
        bit | 0x40
    }

    /// Write to $4016. Bit 0 set holds the cursor at the first button.
    pub fn write(&mut self, data: u8) {
        self.strobe = data & 1 != 0;
        if self.strobe {
            self.index = 0;
        }
    }
}
