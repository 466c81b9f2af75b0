use bitflags::bitflags;

use super::{Bus, Cpu};

bitflags! {
    /// Interrupt sources as laid out in IF (0xFF0F) and IE (0xFFFF).
    ///
    /// Bit order is also the service priority: lower bits win.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct Interrupt: u8 {
        const VBLANK = 0x01;
        const STAT = 0x02;
        const TIMER = 0x04;
        const SERIAL = 0x08;
        const JOYPAD = 0x10;
    }
}

impl Interrupt {
    pub(crate) const IF_ADDR: u16 = 0xFF0F;
    pub(crate) const IE_ADDR: u16 = 0xFFFF;

    /// Jump vector of a single-bit source.
    pub fn vector(self) -> u16 {
        0x0040 + 8 * self.bits().trailing_zeros() as u16
    }

    /// Highest-priority source in the set, if any.
    pub fn highest(self) -> Option<Interrupt> {
        if self.is_empty() {
            None
        } else {
            Some(Interrupt::from_bits_truncate(1 << self.bits().trailing_zeros()))
        }
    }
}

/// M-cycles consumed by servicing an interrupt.
pub(super) const SERVICE_CYCLES: u8 = 5;

impl Cpu {
    /// Enabled interrupt requests currently latched in IF.
    pub(super) fn pending_interrupts<B: Bus>(&self, bus: &mut B) -> Interrupt {
        let ie = bus.read8(Interrupt::IE_ADDR);
        let iflags = bus.read8(Interrupt::IF_ADDR);
        Interrupt::from_bits_truncate(ie & iflags)
    }

    /// Dispatch the highest-priority pending interrupt: push PC, clear its
    /// IF bit, disable IME and jump to the vector.
    pub(super) fn service_interrupt<B: Bus>(&mut self, bus: &mut B, pending: Interrupt) -> bool {
        let Some(source) = pending.highest() else {
            return false;
        };

        let iflags = bus.read8(Interrupt::IF_ADDR);
        bus.write8(Interrupt::IF_ADDR, iflags & !source.bits());
        self.ime = false;

        let return_pc = self.regs.pc;
        self.push_u16(bus, return_pc);
        self.regs.pc = source.vector();

        log::debug!(
            "interrupt {:?} -> vector 0x{:04X} (return PC=0x{:04X})",
            source,
            self.regs.pc,
            return_pc
        );
        true
    }
}
