use super::instruction::{Instruction, Op, Operand};
use super::{Bus, Cpu, Flag};

impl Cpu {
    /// Execute one decoded instruction.
    ///
    /// Returns the extra M-cycles on top of `instr.cycles`, which is non-zero
    /// only for taken conditional branches.
    pub(super) fn execute<B: Bus>(&mut self, bus: &mut B, instr: &Instruction) -> u8 {
        match instr.op {
            Op::Nop | Op::Prefix => {}
            Op::Halt => self.halted = true,
            Op::Stop => {
                // Padding byte; low-power STOP is not modelled.
                let _ = self.fetch8(bus);
            }
            Op::Di => {
                self.ime = false;
                self.ime_enabling = false;
            }
            Op::Ei => self.ime_enabling = true,

            Op::Ld => self.exec_ld(bus, instr),
            Op::LdHlSp => {
                let e = self.fetch8(bus);
                let value = self.alu_add16_signed(self.regs.sp, e);
                self.regs.set_hl(value);
            }
            Op::Inc | Op::Dec => self.exec_inc_dec(bus, instr),
            Op::Add => {
                if instr.lhs == Operand::Reg16(super::Reg16::HL) {
                    let value = self.read_operand16(bus, instr.rhs);
                    self.alu_add16_hl(value);
                } else {
                    let value = self.read_operand8(bus, instr.rhs);
                    self.alu_add(value, false);
                }
            }
            Op::AddSp => {
                let e = self.fetch8(bus);
                self.regs.sp = self.alu_add16_signed(self.regs.sp, e);
            }
            Op::Adc => {
                let value = self.read_operand8(bus, instr.rhs);
                self.alu_add(value, true);
            }
            Op::Sub => {
                let value = self.read_operand8(bus, instr.rhs);
                self.alu_sub(value, false);
            }
            Op::Sbc => {
                let value = self.read_operand8(bus, instr.rhs);
                self.alu_sub(value, true);
            }
            Op::And => {
                let value = self.read_operand8(bus, instr.rhs);
                self.alu_and(value);
            }
            Op::Xor => {
                let value = self.read_operand8(bus, instr.rhs);
                self.alu_xor(value);
            }
            Op::Or => {
                let value = self.read_operand8(bus, instr.rhs);
                self.alu_or(value);
            }
            Op::Cp => {
                let value = self.read_operand8(bus, instr.rhs);
                self.alu_cp(value);
            }

            Op::Push => {
                let value = self.read_operand16(bus, instr.lhs);
                self.push_u16(bus, value);
            }
            Op::Pop => {
                if let Operand::Reg16(rr) = instr.lhs {
                    // AF goes through `set16`, which masks the low nibble of F.
                    self.pop_into(bus, rr);
                }
            }

            Op::Jp => {
                let target = self.fetch16(bus);
                if self.condition_met(instr.lhs) {
                    self.regs.pc = target;
                    return 1;
                }
            }
            Op::JpHl => self.regs.pc = self.regs.hl(),
            Op::Jr => {
                let offset = self.fetch8(bus) as i8;
                if self.condition_met(instr.lhs) {
                    self.regs.pc = self.regs.pc.wrapping_add(offset as i16 as u16);
                    return 1;
                }
            }
            Op::Call => {
                let target = self.fetch16(bus);
                if self.condition_met(instr.lhs) {
                    self.push_u16(bus, self.regs.pc);
                    self.regs.pc = target;
                    return 3;
                }
            }
            Op::Ret => {
                if self.condition_met(instr.lhs) {
                    self.regs.pc = self.pop_u16(bus);
                    return 3;
                }
            }
            Op::Reti => {
                self.regs.pc = self.pop_u16(bus);
                // Unlike EI there is no one-instruction delay.
                self.ime = true;
                self.ime_enabling = false;
            }
            Op::Rst => {
                if let Operand::Target(vector) = instr.lhs {
                    self.push_u16(bus, self.regs.pc);
                    self.regs.pc = vector;
                }
            }

            Op::Rlca => {
                let a = self.alu_rlc(self.regs.a(), false);
                self.regs.set_a(a);
            }
            Op::Rrca => {
                let a = self.alu_rrc(self.regs.a(), false);
                self.regs.set_a(a);
            }
            Op::Rla => {
                let a = self.alu_rl(self.regs.a(), false);
                self.regs.set_a(a);
            }
            Op::Rra => {
                let a = self.alu_rr(self.regs.a(), false);
                self.regs.set_a(a);
            }
            Op::Daa => self.alu_daa(),
            Op::Cpl => {
                self.regs.set_a(!self.regs.a());
                self.set_flag(Flag::N, true);
                self.set_flag(Flag::H, true);
            }
            Op::Scf => {
                self.set_flag(Flag::N, false);
                self.set_flag(Flag::H, false);
                self.set_flag(Flag::C, true);
            }
            Op::Ccf => {
                let carry = self.get_flag(Flag::C);
                self.set_flag(Flag::N, false);
                self.set_flag(Flag::H, false);
                self.set_flag(Flag::C, !carry);
            }

            Op::Rlc | Op::Rrc | Op::Rl | Op::Rr | Op::Sla | Op::Sra | Op::Swap | Op::Srl => {
                self.exec_shift(bus, instr)
            }
            Op::Bit => {
                if let Operand::Bit(bit) = instr.lhs {
                    let value = self.read_operand8(bus, instr.rhs);
                    self.alu_bit(bit, value);
                }
            }
            Op::Res | Op::Set => {
                if let Operand::Bit(bit) = instr.lhs {
                    let place = self.resolve(bus, instr.rhs);
                    let value = self.load(bus, place);
                    let result = if instr.op == Op::Set {
                        value | (1 << bit)
                    } else {
                        value & !(1 << bit)
                    };
                    self.store(bus, place, result);
                }
            }

            Op::Illegal => {
                log::error!(
                    "illegal opcode executed at PC=0x{:04X}; CPU locked",
                    self.regs.pc.wrapping_sub(1)
                );
                self.locked = true;
            }
        }
        0
    }

    fn exec_ld<B: Bus>(&mut self, bus: &mut B, instr: &Instruction) {
        if instr.rhs.is_wide() {
            // LD rr,n16 / LD SP,HL / LD (a16),SP
            let value = self.read_operand16(bus, instr.rhs);
            self.write_operand16(bus, instr.lhs, value);
            return;
        }
        // Destination first: `(HL±)` and immediate addresses resolve in
        // encoding order.
        let dst = self.resolve(bus, instr.lhs);
        let value = self.read_operand8(bus, instr.rhs);
        self.store(bus, dst, value);
    }

    fn exec_inc_dec<B: Bus>(&mut self, bus: &mut B, instr: &Instruction) {
        let increment = instr.op == Op::Inc;
        if let Operand::Reg16(rr) = instr.lhs {
            let value = self.regs.get16(rr);
            let next = if increment {
                value.wrapping_add(1)
            } else {
                value.wrapping_sub(1)
            };
            self.regs.set16(rr, next);
            return;
        }
        let place = self.resolve(bus, instr.lhs);
        let value = self.load(bus, place);
        let result = if increment {
            self.alu_inc8(value)
        } else {
            self.alu_dec8(value)
        };
        self.store(bus, place, result);
    }

    fn exec_shift<B: Bus>(&mut self, bus: &mut B, instr: &Instruction) {
        let place = self.resolve(bus, instr.lhs);
        let value = self.load(bus, place);
        let result = match instr.op {
            Op::Rlc => self.alu_rlc(value, true),
            Op::Rrc => self.alu_rrc(value, true),
            Op::Rl => self.alu_rl(value, true),
            Op::Rr => self.alu_rr(value, true),
            Op::Sla => self.alu_sla(value),
            Op::Sra => self.alu_sra(value),
            Op::Swap => self.alu_swap(value),
            _ => self.alu_srl(value),
        };
        self.store(bus, place, result);
    }
}
