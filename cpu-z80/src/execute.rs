//! Unprefixed instruction execution.

use emu_core::IoBus;

use crate::alu;
use crate::cpu::{Z80, Z80Error};
use crate::execute_index::Index;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};

impl Z80 {
    /// Read an 8-bit register by its opcode encoding (0=B 1=C 2=D 3=E
    /// 4=H 5=L 7=A). Encoding 6 is (HL) and is handled by the caller.
    pub(crate) fn get_reg8(&self, index: u8) -> u8 {
        match index {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            7 => self.regs.a,
            _ => unreachable!("(HL) is not a simple register"),
        }
    }

    pub(crate) fn set_reg8(&mut self, index: u8, value: u8) {
        match index {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            7 => self.regs.a = value,
            _ => unreachable!("(HL) is not a simple register"),
        }
    }

    /// Read a register pair by its opcode encoding (0=BC 1=DE 2=HL 3=SP).
    pub(crate) fn get_rp(&self, index: u8) -> u16 {
        match index & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.sp,
        }
    }

    pub(crate) fn set_rp(&mut self, index: u8, value: u16) {
        match index & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            _ => self.regs.sp = value,
        }
    }

    /// Register pair encoding used by PUSH/POP (3=AF instead of SP).
    fn get_rp2(&self, index: u8) -> u16 {
        match index & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.af(),
        }
    }

    fn set_rp2(&mut self, index: u8, value: u16) {
        match index & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            _ => self.regs.set_af(value),
        }
    }

    /// Branch condition by opcode encoding: NZ Z NC C PO PE P M.
    pub(crate) fn condition(&self, index: u8) -> bool {
        match index & 7 {
            0 => self.regs.f & ZF == 0,
            1 => self.regs.f & ZF != 0,
            2 => self.regs.f & CF == 0,
            3 => self.regs.f & CF != 0,
            4 => self.regs.f & PF == 0,
            5 => self.regs.f & PF != 0,
            6 => self.regs.f & SF == 0,
            _ => self.regs.f & SF != 0,
        }
    }

    /// Apply one of the eight accumulator operations (ADD ADC SUB SBC
    /// AND XOR OR CP) selected by bits 5-3 of the opcode.
    pub(crate) fn alu_op_a(&mut self, index: u8, value: u8) {
        let carry = self.regs.f & CF != 0;
        let result = match index & 7 {
            0 => alu::add8(self.regs.a, value, false),
            1 => alu::add8(self.regs.a, value, carry),
            2 => alu::sub8(self.regs.a, value, false),
            3 => alu::sub8(self.regs.a, value, carry),
            4 => alu::and8(self.regs.a, value),
            5 => alu::xor8(self.regs.a, value),
            6 => alu::or8(self.regs.a, value),
            _ => alu::cp8(self.regs.a, value),
        };
        if index & 7 != 7 {
            self.regs.a = result.value;
        }
        self.regs.f = result.flags;
    }

    /// Add a signed displacement to PC (JR, DJNZ).
    fn relative_jump(&mut self, displacement: u8) {
        self.regs.pc = self.regs.pc.wrapping_add(displacement as i8 as i16 as u16);
    }

    pub(crate) fn execute_unprefixed<B: IoBus>(
        &mut self,
        bus: &mut B,
        opcode: u8,
    ) -> Result<u32, Z80Error> {
        let cycles = match opcode {
            // NOP
            0x00 => 4,

            // LD rr, nn
            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.read_imm16(bus);
                self.set_rp(opcode >> 4, value);
                10
            }

            // LD (BC), A
            0x02 => {
                bus.write(self.regs.bc(), self.regs.a);
                7
            }

            // INC rr
            0x03 | 0x13 | 0x23 | 0x33 => {
                let rp = opcode >> 4;
                self.set_rp(rp, self.get_rp(rp).wrapping_add(1));
                6
            }

            // INC r
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x3C => {
                let r = (opcode >> 3) & 7;
                let result = alu::inc8(self.get_reg8(r));
                self.set_reg8(r, result.value);
                self.regs.f = (self.regs.f & CF) | result.flags;
                4
            }

            // DEC r
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x3D => {
                let r = (opcode >> 3) & 7;
                let result = alu::dec8(self.get_reg8(r));
                self.set_reg8(r, result.value);
                self.regs.f = (self.regs.f & CF) | result.flags;
                4
            }

            // LD r, n
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                let value = self.read_imm8(bus);
                self.set_reg8((opcode >> 3) & 7, value);
                7
            }

            // RLCA
            0x07 => {
                let carry = self.regs.a >> 7;
                self.regs.a = (self.regs.a << 1) | carry;
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | (self.regs.a & (YF | XF)) | carry;
                4
            }

            // EX AF, AF'
            0x08 => {
                self.regs.swap_af();
                4
            }

            // ADD HL, rr
            0x09 | 0x19 | 0x29 | 0x39 => {
                let (value, flags) = alu::add16(self.regs.hl(), self.get_rp(opcode >> 4));
                self.regs.set_hl(value);
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | flags;
                11
            }

            // LD A, (BC)
            0x0A => {
                self.regs.a = bus.read(self.regs.bc());
                7
            }

            // DEC rr
            0x0B | 0x1B | 0x2B | 0x3B => {
                let rp = opcode >> 4;
                self.set_rp(rp, self.get_rp(rp).wrapping_sub(1));
                6
            }

            // RRCA
            0x0F => {
                let carry = self.regs.a & 1;
                self.regs.a = (self.regs.a >> 1) | (carry << 7);
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | (self.regs.a & (YF | XF)) | carry;
                4
            }

            // DJNZ e
            0x10 => {
                let displacement = self.read_imm8(bus);
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.relative_jump(displacement);
                    13
                } else {
                    8
                }
            }

            // LD (DE), A
            0x12 => {
                bus.write(self.regs.de(), self.regs.a);
                7
            }

            // RLA
            0x17 => {
                let carry = self.regs.a >> 7;
                self.regs.a = (self.regs.a << 1) | (self.regs.f & CF);
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | (self.regs.a & (YF | XF)) | carry;
                4
            }

            // JR e
            0x18 => {
                let displacement = self.read_imm8(bus);
                self.relative_jump(displacement);
                12
            }

            // LD A, (DE)
            0x1A => {
                self.regs.a = bus.read(self.regs.de());
                7
            }

            // RRA
            0x1F => {
                let carry = self.regs.a & 1;
                self.regs.a = (self.regs.a >> 1) | ((self.regs.f & CF) << 7);
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | (self.regs.a & (YF | XF)) | carry;
                4
            }

            // JR cc, e - the displacement is read even when not taken
            0x20 | 0x28 | 0x30 | 0x38 => {
                let displacement = self.read_imm8(bus);
                if self.condition((opcode >> 3) & 3) {
                    self.relative_jump(displacement);
                    12
                } else {
                    7
                }
            }

            // LD (nn), HL
            0x22 => {
                let address = self.read_imm16(bus);
                self.write16(bus, address, self.regs.hl());
                16
            }

            // DAA
            0x27 => {
                let result = alu::daa(self.regs.a, self.regs.f);
                self.regs.a = result.value;
                self.regs.f = result.flags;
                4
            }

            // LD HL, (nn)
            0x2A => {
                let address = self.read_imm16(bus);
                let value = self.read16(bus, address);
                self.regs.set_hl(value);
                16
            }

            // CPL
            0x2F => {
                self.regs.a = !self.regs.a;
                self.regs.f = (self.regs.f & (SF | ZF | PF | CF))
                    | HF
                    | NF
                    | (self.regs.a & (YF | XF));
                4
            }

            // LD (nn), A
            0x32 => {
                let address = self.read_imm16(bus);
                bus.write(address, self.regs.a);
                13
            }

            // INC (HL)
            0x34 => {
                let result = alu::inc8(bus.read(self.regs.hl()));
                bus.write(self.regs.hl(), result.value);
                self.regs.f = (self.regs.f & CF) | result.flags;
                11
            }

            // DEC (HL)
            0x35 => {
                let result = alu::dec8(bus.read(self.regs.hl()));
                bus.write(self.regs.hl(), result.value);
                self.regs.f = (self.regs.f & CF) | result.flags;
                11
            }

            // LD (HL), n
            0x36 => {
                let value = self.read_imm8(bus);
                bus.write(self.regs.hl(), value);
                10
            }

            // SCF
            0x37 => {
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | CF | (self.regs.a & (YF | XF));
                4
            }

            // LD A, (nn)
            0x3A => {
                let address = self.read_imm16(bus);
                self.regs.a = bus.read(address);
                13
            }

            // CCF
            0x3F => {
                let old_carry = self.regs.f & CF;
                self.regs.f = (self.regs.f & (SF | ZF | PF))
                    | (self.regs.a & (YF | XF))
                    | (old_carry << 4)
                    | (old_carry ^ CF);
                4
            }

            // HALT
            0x76 => {
                self.halted = true;
                4
            }

            // LD r, r' / LD r, (HL) / LD (HL), r
            0x40..=0x7F => {
                let dst = (opcode >> 3) & 7;
                let src = opcode & 7;
                if src == 6 {
                    let value = bus.read(self.regs.hl());
                    self.set_reg8(dst, value);
                    7
                } else if dst == 6 {
                    bus.write(self.regs.hl(), self.get_reg8(src));
                    7
                } else {
                    let value = self.get_reg8(src);
                    self.set_reg8(dst, value);
                    4
                }
            }

            // ADD/ADC/SUB/SBC/AND/XOR/OR/CP A, r / (HL)
            0x80..=0xBF => {
                let (value, cycles) = if opcode & 7 == 6 {
                    (bus.read(self.regs.hl()), 7)
                } else {
                    (self.get_reg8(opcode & 7), 4)
                };
                self.alu_op_a(opcode >> 3, value);
                cycles
            }

            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                if self.condition(opcode >> 3) {
                    self.regs.pc = self.pop16(bus);
                    11
                } else {
                    5
                }
            }

            // POP rr
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop16(bus);
                self.set_rp2(opcode >> 4, value);
                10
            }

            // JP cc, nn - the address is read even when not taken
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let address = self.read_imm16(bus);
                if self.condition(opcode >> 3) {
                    self.regs.pc = address;
                }
                10
            }

            // JP nn
            0xC3 => {
                self.regs.pc = self.read_imm16(bus);
                10
            }

            // CALL cc, nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let address = self.read_imm16(bus);
                if self.condition(opcode >> 3) {
                    self.push16(bus, self.regs.pc);
                    self.regs.pc = address;
                    17
                } else {
                    10
                }
            }

            // PUSH rr
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                self.push16(bus, self.get_rp2(opcode >> 4));
                11
            }

            // ADD/ADC/SUB/SBC/AND/XOR/OR/CP A, n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let value = self.read_imm8(bus);
                self.alu_op_a(opcode >> 3, value);
                7
            }

            // RST n
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.push16(bus, self.regs.pc);
                self.regs.pc = u16::from(opcode & 0x38);
                11
            }

            // RET
            0xC9 => {
                self.regs.pc = self.pop16(bus);
                10
            }

            // CB prefix
            0xCB => {
                let sub = self.fetch_opcode(bus);
                return self.execute_cb(bus, sub);
            }

            // CALL nn
            0xCD => {
                let address = self.read_imm16(bus);
                self.push16(bus, self.regs.pc);
                self.regs.pc = address;
                17
            }

            // OUT (n), A
            0xD3 => {
                let port = self.read_imm8(bus);
                bus.write_io(port, self.regs.a);
                11
            }

            // EXX
            0xD9 => {
                self.regs.swap_main();
                4
            }

            // IN A, (n)
            0xDB => {
                let port = self.read_imm8(bus);
                self.regs.a = bus.read_io(port);
                11
            }

            // DD prefix
            0xDD => return self.execute_index(bus, Index::Ix),

            // EX (SP), HL
            0xE3 => {
                let value = self.read16(bus, self.regs.sp);
                self.write16(bus, self.regs.sp, self.regs.hl());
                self.regs.set_hl(value);
                19
            }

            // JP (HL)
            0xE9 => {
                self.regs.pc = self.regs.hl();
                4
            }

            // EX DE, HL - main bank only, shadows untouched
            0xEB => {
                let de = self.regs.de();
                let hl = self.regs.hl();
                self.regs.set_de(hl);
                self.regs.set_hl(de);
                4
            }

            // ED prefix
            0xED => {
                let sub = self.fetch_opcode(bus);
                return self.execute_ed(bus, sub);
            }

            // DI - immediate
            0xF3 => {
                self.interrupts_enabled = false;
                self.next_interrupts_enabled = false;
                4
            }

            // LD SP, HL
            0xF9 => {
                self.regs.sp = self.regs.hl();
                6
            }

            // EI - takes effect after the following instruction
            0xFB => {
                self.next_interrupts_enabled = true;
                4
            }

            // FD prefix
            0xFD => return self.execute_index(bus, Index::Iy),
        };
        Ok(cycles)
    }
}
