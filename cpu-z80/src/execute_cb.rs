//! CB-prefixed instructions: rotates, shifts and bit operations.

use emu_core::IoBus;

use crate::alu::{self, AluResult};
use crate::cpu::{Z80, Z80Error};
use crate::flags::{CF, HF, PF, SF, XF, YF, ZF};

impl Z80 {
    /// One of the eight CB rotate/shift operations, selected by bits 5-3
    /// of the sub-opcode.
    pub(crate) fn shift_op(index: u8, value: u8, carry_in: bool) -> AluResult {
        match index & 7 {
            0 => alu::rlc8(value),
            1 => alu::rrc8(value),
            2 => alu::rl8(value, carry_in),
            3 => alu::rr8(value, carry_in),
            4 => alu::sla8(value),
            5 => alu::sra8(value),
            6 => alu::sll8(value),
            _ => alu::srl8(value),
        }
    }

    /// BIT n flag effects. X/Y come from `xy_source`: the tested value
    /// for register forms, the high byte of the effective address for
    /// memory forms.
    pub(crate) fn bit_flags(&mut self, bit: u8, value: u8, xy_source: u8) {
        let set = value & (1 << bit) != 0;
        let mut f = (self.regs.f & CF) | HF | (xy_source & (YF | XF));
        if !set {
            f |= ZF | PF;
        }
        if bit == 7 && set {
            f |= SF;
        }
        self.regs.f = f;
    }

    pub(crate) fn execute_cb<B: IoBus>(
        &mut self,
        bus: &mut B,
        opcode: u8,
    ) -> Result<u32, Z80Error> {
        let target = opcode & 7;
        let carry_in = self.regs.f & CF != 0;

        let cycles = match opcode >> 6 {
            // RLC/RRC/RL/RR/SLA/SRA/SLL/SRL
            0 => {
                if target == 6 {
                    let result = Self::shift_op(opcode >> 3, bus.read(self.regs.hl()), carry_in);
                    bus.write(self.regs.hl(), result.value);
                    self.regs.f = result.flags;
                    15
                } else {
                    let result = Self::shift_op(opcode >> 3, self.get_reg8(target), carry_in);
                    self.set_reg8(target, result.value);
                    self.regs.f = result.flags;
                    8
                }
            }

            // BIT n
            1 => {
                let bit = (opcode >> 3) & 7;
                if target == 6 {
                    let value = bus.read(self.regs.hl());
                    let high = (self.regs.hl() >> 8) as u8;
                    self.bit_flags(bit, value, high);
                    12
                } else {
                    let value = self.get_reg8(target);
                    self.bit_flags(bit, value, value);
                    8
                }
            }

            // RES n
            2 => {
                let mask = !(1u8 << ((opcode >> 3) & 7));
                if target == 6 {
                    let value = bus.read(self.regs.hl()) & mask;
                    bus.write(self.regs.hl(), value);
                    15
                } else {
                    let value = self.get_reg8(target) & mask;
                    self.set_reg8(target, value);
                    8
                }
            }

            // SET n
            _ => {
                let mask = 1u8 << ((opcode >> 3) & 7);
                if target == 6 {
                    let value = bus.read(self.regs.hl()) | mask;
                    bus.write(self.regs.hl(), value);
                    15
                } else {
                    let value = self.get_reg8(target) | mask;
                    self.set_reg8(target, value);
                    8
                }
            }
        };
        Ok(cycles)
    }
}
