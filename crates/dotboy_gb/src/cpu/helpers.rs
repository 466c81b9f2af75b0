use super::instruction::{Condition, Operand};
use super::regs::Reg16;
use super::{Bus, Cpu, Flag};

/// A resolved 8-bit operand.
///
/// Memory addresses are computed exactly once, so the HL auto-increment of
/// `(HL+)`/`(HL-)` happens at resolution and a read-modify-write on
/// `(HL)` touches the same byte twice.
#[derive(Clone, Copy, Debug)]
pub(super) enum Place {
    Register(super::Reg8),
    Memory(u16),
    Value(u8),
}

impl Cpu {
    #[inline]
    pub(super) fn fetch8<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read8(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    #[inline]
    pub(super) fn fetch16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch8(bus) as u16;
        let hi = self.fetch8(bus) as u16;
        (hi << 8) | lo
    }

    /// Resolve an 8-bit operand to a register, address or immediate value.
    pub(super) fn resolve<B: Bus>(&mut self, bus: &mut B, operand: Operand) -> Place {
        match operand {
            Operand::Reg8(r) => Place::Register(r),
            Operand::Imm8 | Operand::Offset8 => Place::Value(self.fetch8(bus)),
            Operand::Indirect(rr) => Place::Memory(self.regs.get16(rr)),
            Operand::IndirectHlInc => {
                let hl = self.regs.hl();
                self.regs.set_hl(hl.wrapping_add(1));
                Place::Memory(hl)
            }
            Operand::IndirectHlDec => {
                let hl = self.regs.hl();
                self.regs.set_hl(hl.wrapping_sub(1));
                Place::Memory(hl)
            }
            Operand::IndirectImm8 => Place::Memory(0xFF00 | self.fetch8(bus) as u16),
            Operand::IndirectImm16 => Place::Memory(self.fetch16(bus)),
            Operand::IndirectReg8(r) => Place::Memory(0xFF00 | self.regs.get8(r) as u16),
            Operand::Bit(b) => Place::Value(b),
            Operand::None
            | Operand::Imm16
            | Operand::Reg16(_)
            | Operand::Cond(_)
            | Operand::Target(_) => {
                debug_assert!(false, "operand {operand:?} is not 8-bit");
                Place::Value(0xFF)
            }
        }
    }

    #[inline]
    pub(super) fn load<B: Bus>(&mut self, bus: &mut B, place: Place) -> u8 {
        match place {
            Place::Register(r) => self.regs.get8(r),
            Place::Memory(addr) => bus.read8(addr),
            Place::Value(v) => v,
        }
    }

    #[inline]
    pub(super) fn store<B: Bus>(&mut self, bus: &mut B, place: Place, value: u8) {
        match place {
            Place::Register(r) => self.regs.set8(r, value),
            Place::Memory(addr) => bus.write8(addr, value),
            Place::Value(_) => debug_assert!(false, "store to an immediate"),
        }
    }

    /// Read an 8-bit source operand.
    #[inline]
    pub(super) fn read_operand8<B: Bus>(&mut self, bus: &mut B, operand: Operand) -> u8 {
        let place = self.resolve(bus, operand);
        self.load(bus, place)
    }

    /// Read a 16-bit source operand (register or immediate).
    pub(super) fn read_operand16<B: Bus>(&mut self, bus: &mut B, operand: Operand) -> u16 {
        match operand {
            Operand::Reg16(rr) => self.regs.get16(rr),
            Operand::Imm16 => self.fetch16(bus),
            _ => {
                debug_assert!(false, "operand {operand:?} is not 16-bit");
                0
            }
        }
    }

    /// Write a 16-bit value to a register or to memory at an immediate address.
    pub(super) fn write_operand16<B: Bus>(&mut self, bus: &mut B, operand: Operand, value: u16) {
        match operand {
            Operand::Reg16(rr) => self.regs.set16(rr, value),
            Operand::IndirectImm16 => {
                let addr = self.fetch16(bus);
                bus.write16(addr, value);
            }
            _ => debug_assert!(false, "operand {operand:?} is not a 16-bit destination"),
        }
    }

    pub(super) fn condition_met(&self, operand: Operand) -> bool {
        match operand {
            Operand::Cond(Condition::Always) | Operand::None => true,
            Operand::Cond(Condition::Z) => self.get_flag(Flag::Z),
            Operand::Cond(Condition::NZ) => !self.get_flag(Flag::Z),
            Operand::Cond(Condition::C) => self.get_flag(Flag::C),
            Operand::Cond(Condition::NC) => !self.get_flag(Flag::C),
            _ => true,
        }
    }

    #[inline]
    pub(super) fn push_u16<B: Bus>(&mut self, bus: &mut B, value: u16) {
        let lo = value as u8;
        let hi = (value >> 8) as u8;
        // High byte first, so the low byte ends at the lower address.
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write8(self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write8(self.regs.sp, lo);
    }

    #[inline]
    pub(super) fn pop_u16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = bus.read8(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = bus.read8(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        (hi << 8) | lo
    }

    #[inline]
    pub(super) fn pop_into<B: Bus>(&mut self, bus: &mut B, reg: Reg16) {
        let value = self.pop_u16(bus);
        self.regs.set16(reg, value);
    }
}
