use crate::{
    bus::Bus,
    cpu::{
        decode::{BranchFlag, Instruction, Mode, Op, decode},
        flags::{FLAG_BREAK, StatusFlags},
    },
    error::CpuError,
};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Cost of pushing PC and P and loading a vector (NMI, IRQ).
const INTERRUPT_CYCLES: u64 = 7;

/// Effective address of an instruction's operand.
#[derive(Clone, Copy, Debug, Default)]
struct Operand {
    addr: u16,
    page_crossed: bool,
    /// Indexed modes: the address before the carry into the high byte, where the 6502
    /// performs its dummy read.
    uncarried: Option<u16>,
}

pub struct CPU<B: Bus> {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub flags: StatusFlags,
    pub cycles: u64,
    /// Edge-triggered NMI latch, set by the PPU and consumed at the next instruction boundary.
    pub nmi_pending: bool,
    pub bus: B,
}

impl<B: Bus> CPU<B> {
    pub fn new(bus: B) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            flags: StatusFlags::default(),
            cycles: 0,
            nmi_pending: false,
            bus,
        }
    }

    pub fn reset(&mut self) {
        self.pc = self.read_u16(RESET_VECTOR);

        // The reset sequence runs three pushes with writes suppressed: $00 - 3.
        self.sp = 0xFD;
        self.flags = StatusFlags {
            interrupt_disable: true,
            break_command: true,
            ..StatusFlags::default()
        };

        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.nmi_pending = false;

        self.cycles = 7;
    }

    /// Packed P register.
    pub fn status(&self) -> u8 {
        self.flags.pack()
    }

    /// Execute whole instructions until at least `min_cycles` cycles have elapsed and return
    /// the cycles actually consumed. May overshoot by up to one instruction.
    pub fn step(&mut self, min_cycles: u64) -> Result<u64, CpuError> {
        let mut consumed = 0;
        while consumed < min_cycles {
            consumed += self.step_instruction()?;
        }
        Ok(consumed)
    }

    /// Service a pending interrupt, if any, then execute one instruction.
    fn step_instruction(&mut self) -> Result<u64, CpuError> {
        let mut cycles = 0;
        if self.nmi_pending {
            self.nmi_pending = false;
            self.interrupt(NMI_VECTOR, false);
            cycles += INTERRUPT_CYCLES;
        } else if !self.flags.interrupt_disable && self.bus.irq_line() {
            self.interrupt(IRQ_VECTOR, false);
            cycles += INTERRUPT_CYCLES;
        }

        cycles += self.execute()?;

        let stall = self.bus.take_stall_cycles();
        if stall > 0 {
            // OAM DMA waits an extra cycle to align when it begins on an odd CPU cycle.
            cycles += stall + (self.cycles + cycles) % 2;
        }

        self.cycles += cycles;
        Ok(cycles)
    }

    fn execute(&mut self) -> Result<u64, CpuError> {
        let pc = self.pc;
        let opcode = self.bus.read(pc);
        let Some(instruction) = decode(opcode) else {
            return Err(CpuError::UnknownOpcode { pc, opcode });
        };
        let Instruction {
            op,
            mode,
            cycles,
            page_penalty,
        } = instruction;

        let operand = self.resolve(mode);
        if let Some(uncarried) = operand.uncarried {
            if operand.page_crossed || !page_penalty {
                self.bus.read(uncarried);
            }
        }
        self.pc = pc.wrapping_add(mode.size());

        let mut cycles = cycles as u64;
        if page_penalty && operand.page_crossed {
            cycles += 1;
        }
        cycles += self.run(op, mode, operand);
        Ok(cycles)
    }

    /// Compute the operand address for `mode`. The PC still points at the opcode.
    fn resolve(&mut self, mode: Mode) -> Operand {
        let arg = self.pc.wrapping_add(1);
        match mode {
            Mode::Implied | Mode::Accumulator => Operand::default(),
            Mode::Immediate => Operand {
                addr: arg,
                ..Operand::default()
            },
            Mode::ZeroPage => Operand {
                addr: self.bus.read(arg) as u16,
                ..Operand::default()
            },
            Mode::ZeroPageX => Operand {
                addr: self.bus.read(arg).wrapping_add(self.x) as u16,
                ..Operand::default()
            },
            Mode::ZeroPageY => Operand {
                addr: self.bus.read(arg).wrapping_add(self.y) as u16,
                ..Operand::default()
            },
            Mode::Absolute => Operand {
                addr: self.read_u16(arg),
                ..Operand::default()
            },
            Mode::AbsoluteX => {
                let base = self.read_u16(arg);
                Self::indexed(base, self.x)
            }
            Mode::AbsoluteY => {
                let base = self.read_u16(arg);
                Self::indexed(base, self.y)
            }
            Mode::Indirect => {
                let ptr = self.read_u16(arg);
                Operand {
                    addr: self.read_u16_wrapped(ptr),
                    ..Operand::default()
                }
            }
            Mode::IndirectX => {
                let ptr = self.bus.read(arg).wrapping_add(self.x);
                Operand {
                    addr: self.read_u16_wrapped(ptr as u16),
                    ..Operand::default()
                }
            }
            Mode::IndirectY => {
                let ptr = self.bus.read(arg);
                let base = self.read_u16_wrapped(ptr as u16);
                Self::indexed(base, self.y)
            }
            Mode::Relative => {
                let offset = self.bus.read(arg) as i8;
                let next = self.pc.wrapping_add(2);
                let target = next.wrapping_add(offset as u16);
                Operand {
                    addr: target,
                    page_crossed: next & 0xFF00 != target & 0xFF00,
                    uncarried: None,
                }
            }
        }
    }

    fn indexed(base: u16, index: u8) -> Operand {
        let addr = base.wrapping_add(index as u16);
        Operand {
            addr,
            page_crossed: base & 0xFF00 != addr & 0xFF00,
            uncarried: Some((base & 0xFF00) | (addr & 0x00FF)),
        }
    }

    /// Execute `op`; returns cycles beyond the base cost (taken branches only).
    fn run(&mut self, op: Op, mode: Mode, operand: Operand) -> u64 {
        let addr = operand.addr;
        match op {
            Op::Ora => {
                self.a |= self.bus.read(addr);
                self.update_zero_and_negative_flags(self.a);
            }
            Op::And => {
                self.a &= self.bus.read(addr);
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Eor => {
                self.a ^= self.bus.read(addr);
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Adc => {
                let value = self.bus.read(addr);
                self.add_with_carry(value);
            }
            Op::Sbc => {
                let value = self.bus.read(addr);
                self.add_with_carry(!value);
            }
            Op::Sta => self.bus.write(addr, self.a),
            Op::Lda => {
                self.a = self.bus.read(addr);
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Cmp => {
                let value = self.bus.read(addr);
                self.compare(self.a, value);
            }

            Op::Asl => self.modify(mode, addr, |cpu, v| {
                cpu.flags.carry = v & 0x80 != 0;
                v << 1
            }),
            Op::Lsr => self.modify(mode, addr, |cpu, v| {
                cpu.flags.carry = v & 0x01 != 0;
                v >> 1
            }),
            Op::Rol => self.modify(mode, addr, |cpu, v| {
                let carry_in = cpu.flags.carry as u8;
                cpu.flags.carry = v & 0x80 != 0;
                (v << 1) | carry_in
            }),
            Op::Ror => self.modify(mode, addr, |cpu, v| {
                let carry_in = (cpu.flags.carry as u8) << 7;
                cpu.flags.carry = v & 0x01 != 0;
                (v >> 1) | carry_in
            }),
            Op::Dec => self.modify(mode, addr, |_, v| v.wrapping_sub(1)),
            Op::Inc => self.modify(mode, addr, |_, v| v.wrapping_add(1)),
            Op::Stx if mode == Mode::Accumulator => {
                self.a = self.x;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Stx => self.bus.write(addr, self.x),
            Op::Ldx if mode == Mode::Accumulator => {
                self.x = self.a;
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Ldx => {
                self.x = self.bus.read(addr);
                self.update_zero_and_negative_flags(self.x);
            }

            Op::Bit => {
                let value = self.bus.read(addr);
                self.flags.zero = self.a & value == 0;
                self.flags.negative = value & 0x80 != 0;
                self.flags.overflow = value & 0x40 != 0;
            }
            Op::Jmp => self.pc = addr,
            Op::Sty => self.bus.write(addr, self.y),
            Op::Ldy => {
                self.y = self.bus.read(addr);
                self.update_zero_and_negative_flags(self.y);
            }
            Op::Cpy => {
                let value = self.bus.read(addr);
                self.compare(self.y, value);
            }
            Op::Cpx => {
                let value = self.bus.read(addr);
                self.compare(self.x, value);
            }

            Op::Branch { flag, expect } => return self.branch(flag, expect, operand),

            Op::Brk => {
                // PC already skips the opcode; +1 skips the padding byte.
                self.pc = self.pc.wrapping_add(1);
                self.interrupt(IRQ_VECTOR, true);
                self.flags.break_command = true;
            }
            Op::Jsr => {
                let return_addr = self.pc.wrapping_sub(1);
                self.push((return_addr >> 8) as u8);
                self.push(return_addr as u8);
                self.pc = addr;
            }
            Op::Rti => {
                let status = self.pop();
                self.flags = StatusFlags::unpack(status);
                let lo = self.pop() as u16;
                let hi = self.pop() as u16;
                self.pc = (hi << 8) | lo;
            }
            Op::Rts => {
                let lo = self.pop() as u16;
                let hi = self.pop() as u16;
                self.pc = ((hi << 8) | lo).wrapping_add(1);
            }
            Op::Php => self.push(self.flags.pack() | FLAG_BREAK),
            Op::Plp => {
                let status = self.pop();
                self.flags = StatusFlags::unpack(status);
            }
            Op::Pha => self.push(self.a),
            Op::Pla => {
                self.a = self.pop();
                self.update_zero_and_negative_flags(self.a);
            }

            Op::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.y);
            }
            Op::Iny => {
                self.y = self.y.wrapping_add(1);
                self.update_zero_and_negative_flags(self.y);
            }
            Op::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Inx => {
                self.x = self.x.wrapping_add(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Tay => {
                self.y = self.a;
                self.update_zero_and_negative_flags(self.y);
            }
            Op::Tya => {
                self.a = self.y;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::Tsx => {
                self.x = self.sp;
                self.update_zero_and_negative_flags(self.x);
            }
            Op::Txs => self.sp = self.x,

            Op::Clc => self.flags.carry = false,
            Op::Sec => self.flags.carry = true,
            Op::Cli => self.flags.interrupt_disable = false,
            Op::Sei => self.flags.interrupt_disable = true,
            Op::Clv => self.flags.overflow = false,
            Op::Cld => self.flags.decimal = false,
            Op::Sed => self.flags.decimal = true,

            Op::Nop => {
                // Undocumented NOPs still perform their operand read.
                if !matches!(mode, Mode::Implied | Mode::Immediate) {
                    self.bus.read(addr);
                }
            }
        }
        0
    }

    /// Read-modify-write on the accumulator or memory, then set N/Z from the result.
    fn modify(&mut self, mode: Mode, addr: u16, f: impl FnOnce(&mut Self, u8) -> u8) {
        if mode == Mode::Accumulator {
            let value = self.a;
            let result = f(self, value);
            self.a = result;
            self.update_zero_and_negative_flags(result);
        } else {
            let value = self.bus.read(addr);
            let result = f(self, value);
            self.bus.write(addr, result);
            self.update_zero_and_negative_flags(result);
        }
    }

    fn add_with_carry(&mut self, value: u8) {
        let sum = self.a as u16 + value as u16 + self.flags.carry as u16;
        let result = sum as u8;

        self.flags.carry = sum > 0xFF;
        self.flags.overflow = (!(self.a ^ value) & (self.a ^ result)) & 0x80 != 0;

        self.a = result;
        self.update_zero_and_negative_flags(self.a);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.flags.carry = register >= value;
        self.update_zero_and_negative_flags(register.wrapping_sub(value));
    }

    fn branch(&mut self, flag: BranchFlag, expect: bool, operand: Operand) -> u64 {
        let set = match flag {
            BranchFlag::Negative => self.flags.negative,
            BranchFlag::Overflow => self.flags.overflow,
            BranchFlag::Carry => self.flags.carry,
            BranchFlag::Zero => self.flags.zero,
        };
        if set != expect {
            return 0;
        }
        self.pc = operand.addr;
        if operand.page_crossed { 2 } else { 1 }
    }

    fn update_zero_and_negative_flags(&mut self, value: u8) {
        self.flags.zero = value == 0;
        self.flags.negative = value & 0x80 != 0;
    }

    /// Push PC and P, set I, and jump through `vector`. B is set in the pushed copy only for BRK.
    fn interrupt(&mut self, vector: u16, break_flag: bool) {
        self.push((self.pc >> 8) as u8);
        self.push(self.pc as u8);

        let status = if break_flag {
            self.flags.pack() | FLAG_BREAK
        } else {
            self.flags.pack() & !FLAG_BREAK
        };
        self.push(status);

        self.flags.interrupt_disable = true;
        self.pc = self.read_u16(vector);
    }

    fn read_u16(&mut self, addr: u16) -> u16 {
        let lo = self.bus.read(addr) as u16;
        let hi = self.bus.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// 16-bit read whose high byte comes from the same page: $xxFF wraps to $xx00.
    fn read_u16_wrapped(&mut self, addr: u16) -> u16 {
        let lo = self.bus.read(addr) as u16;
        let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
        let hi = self.bus.read(hi_addr) as u16;
        (hi << 8) | lo
    }

    fn push(&mut self, value: u8) {
        let addr = 0x0100 | self.sp as u16;
        self.bus.write(addr, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        let addr = 0x0100 | self.sp as u16;
        self.bus.read(addr)
    }
}
