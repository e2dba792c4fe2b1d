//! Opcode decoding.
//!
//! Documented opcodes follow the `aaabbbcc` layout: `cc` picks the instruction group, `aaa`
//! the operation and `bbb` the addressing mode. Opcodes outside the groups (stack, flag and
//! transfer instructions, branches, and the undocumented NOPs) are matched first.

/// Addressing modes. See [CPU addressing modes](https://www.nesdev.org/wiki/CPU_addressing_modes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

impl Mode {
    /// Instruction length in bytes, opcode included.
    pub fn size(self) -> u16 {
        match self {
            Mode::Implied | Mode::Accumulator => 1,
            Mode::Immediate
            | Mode::ZeroPage
            | Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::IndirectX
            | Mode::IndirectY
            | Mode::Relative => 2,
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => 3,
        }
    }
}

/// Flag tested by a branch, from opcode bits 7–6.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchFlag {
    Negative,
    Overflow,
    Carry,
    Zero,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    // cc = 01
    Ora,
    And,
    Eor,
    Adc,
    Sta,
    Lda,
    Cmp,
    Sbc,
    // cc = 10; STX/LDX in accumulator mode are TXA/TAX
    Asl,
    Rol,
    Lsr,
    Ror,
    Stx,
    Ldx,
    Dec,
    Inc,
    // cc = 00
    Bit,
    Jmp,
    Sty,
    Ldy,
    Cpy,
    Cpx,
    Branch { flag: BranchFlag, expect: bool },
    Brk,
    Jsr,
    Rti,
    Rts,
    Php,
    Plp,
    Pha,
    Pla,
    Dey,
    Tay,
    Iny,
    Inx,
    Clc,
    Sec,
    Cli,
    Sei,
    Tya,
    Clv,
    Cld,
    Sed,
    Txs,
    Tsx,
    Dex,
    Nop,
}

/// A decoded opcode with its base cycle cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub mode: Mode,
    pub cycles: u8,
    /// +1 cycle when the indexed address crosses a page. Stores and read-modify-write
    /// instructions already include that cycle in `cycles`.
    pub page_penalty: bool,
}

const fn instr(op: Op, mode: Mode, cycles: u8) -> Instruction {
    Instruction {
        op,
        mode,
        cycles,
        page_penalty: false,
    }
}

const fn indexed_read(op: Op, mode: Mode) -> Instruction {
    Instruction {
        op,
        mode,
        cycles: 4,
        page_penalty: true,
    }
}

/// Decode an opcode, or `None` when it is not an instruction this CPU implements.
pub fn decode(opcode: u8) -> Option<Instruction> {
    if let Some(i) = decode_fixed(opcode) {
        return Some(i);
    }
    if opcode & 0x1F == 0x10 {
        let flag = match opcode >> 6 {
            0 => BranchFlag::Negative,
            1 => BranchFlag::Overflow,
            2 => BranchFlag::Carry,
            _ => BranchFlag::Zero,
        };
        let expect = opcode & 0x20 != 0;
        return Some(instr(Op::Branch { flag, expect }, Mode::Relative, 2));
    }

    let aaa = opcode >> 5;
    let bbb = (opcode >> 2) & 0b111;
    match opcode & 0b11 {
        0b01 => decode_group_01(aaa, bbb),
        0b10 => decode_group_10(aaa, bbb),
        0b00 => decode_group_00(aaa, bbb),
        _ => None,
    }
}

fn decode_fixed(opcode: u8) -> Option<Instruction> {
    use Mode::*;
    let i = match opcode {
        0x00 => instr(Op::Brk, Implied, 7),
        0x20 => instr(Op::Jsr, Absolute, 6),
        0x40 => instr(Op::Rti, Implied, 6),
        0x60 => instr(Op::Rts, Implied, 6),
        0x08 => instr(Op::Php, Implied, 3),
        0x28 => instr(Op::Plp, Implied, 4),
        0x48 => instr(Op::Pha, Implied, 3),
        0x68 => instr(Op::Pla, Implied, 4),
        0x88 => instr(Op::Dey, Implied, 2),
        0xA8 => instr(Op::Tay, Implied, 2),
        0xC8 => instr(Op::Iny, Implied, 2),
        0xE8 => instr(Op::Inx, Implied, 2),
        0x18 => instr(Op::Clc, Implied, 2),
        0x38 => instr(Op::Sec, Implied, 2),
        0x58 => instr(Op::Cli, Implied, 2),
        0x78 => instr(Op::Sei, Implied, 2),
        0x98 => instr(Op::Tya, Implied, 2),
        0xB8 => instr(Op::Clv, Implied, 2),
        0xD8 => instr(Op::Cld, Implied, 2),
        0xF8 => instr(Op::Sed, Implied, 2),
        0x9A => instr(Op::Txs, Implied, 2),
        0xBA => instr(Op::Tsx, Implied, 2),
        0xCA => instr(Op::Dex, Implied, 2),
        0xEA => instr(Op::Nop, Implied, 2),
        // Undocumented NOPs
        0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => instr(Op::Nop, Implied, 2),
        0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => instr(Op::Nop, Immediate, 2),
        0x04 | 0x44 | 0x64 => instr(Op::Nop, ZeroPage, 3),
        0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => instr(Op::Nop, ZeroPageX, 4),
        0x0C => instr(Op::Nop, Absolute, 4),
        0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => indexed_read(Op::Nop, AbsoluteX),
        _ => return None,
    };
    Some(i)
}

/// ORA AND EOR ADC STA LDA CMP SBC.
fn decode_group_01(aaa: u8, bbb: u8) -> Option<Instruction> {
    use Mode::*;
    let op = [
        Op::Ora,
        Op::And,
        Op::Eor,
        Op::Adc,
        Op::Sta,
        Op::Lda,
        Op::Cmp,
        Op::Sbc,
    ][aaa as usize];
    let store = op == Op::Sta;
    let i = match bbb {
        0 => instr(op, IndirectX, 6),
        1 => instr(op, ZeroPage, 3),
        2 if store => return None,
        2 => instr(op, Immediate, 2),
        3 => instr(op, Absolute, 4),
        4 if store => instr(op, IndirectY, 6),
        4 => Instruction {
            cycles: 5,
            ..indexed_read(op, IndirectY)
        },
        5 => instr(op, ZeroPageX, 4),
        6 if store => instr(op, AbsoluteY, 5),
        6 => indexed_read(op, AbsoluteY),
        _ if store => instr(op, AbsoluteX, 5),
        _ => indexed_read(op, AbsoluteX),
    };
    Some(i)
}

/// ASL ROL LSR ROR STX LDX DEC INC.
fn decode_group_10(aaa: u8, bbb: u8) -> Option<Instruction> {
    use Mode::*;
    let op = [
        Op::Asl,
        Op::Rol,
        Op::Lsr,
        Op::Ror,
        Op::Stx,
        Op::Ldx,
        Op::Dec,
        Op::Inc,
    ][aaa as usize];
    let xfer = matches!(op, Op::Stx | Op::Ldx);
    let i = match bbb {
        0 if op == Op::Ldx => instr(op, Immediate, 2),
        1 if xfer => instr(op, ZeroPage, 3),
        1 => instr(op, ZeroPage, 5),
        2 if matches!(op, Op::Dec | Op::Inc) => return None,
        2 => instr(op, Accumulator, 2),
        3 if xfer => instr(op, Absolute, 4),
        3 => instr(op, Absolute, 6),
        5 if xfer => instr(op, ZeroPageY, 4),
        5 => instr(op, ZeroPageX, 6),
        7 if op == Op::Ldx => indexed_read(op, AbsoluteY),
        7 if op == Op::Stx => return None,
        7 => instr(op, AbsoluteX, 7),
        _ => return None,
    };
    Some(i)
}

/// BIT JMP STY LDY CPY CPX.
fn decode_group_00(aaa: u8, bbb: u8) -> Option<Instruction> {
    use Mode::*;
    let op = match aaa {
        1 => Op::Bit,
        2 | 3 => Op::Jmp,
        4 => Op::Sty,
        5 => Op::Ldy,
        6 => Op::Cpy,
        7 => Op::Cpx,
        _ => return None,
    };
    let i = match (bbb, aaa) {
        (0, 5..=7) => instr(op, Immediate, 2),
        (1, 1 | 4..=7) => instr(op, ZeroPage, 3),
        (3, 2) => instr(op, Absolute, 3),
        (3, 3) => instr(op, Indirect, 5),
        (3, _) => instr(op, Absolute, 4),
        (5, 4 | 5) => instr(op, ZeroPageX, 4),
        (7, 5) => indexed_read(op, AbsoluteX),
        _ => return None,
    };
    Some(i)
}
