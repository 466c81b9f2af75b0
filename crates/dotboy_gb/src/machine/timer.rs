/// Timer / divider unit.
///
/// A 16-bit system counter advances once per clock tick; DIV exposes its
/// upper byte. TIMA increments on the falling edge of the counter bit that
/// TAC selects, so writes to DIV or TAC can produce an extra increment.
mod io;

use crate::cpu::Interrupt;

/// Ticks between a TIMA overflow and the TMA reload plus interrupt request.
const RELOAD_DELAY: u8 = 4;

pub(crate) struct Timer {
    /// Hidden system counter; DIV is bits 15:8.
    pub(super) internal_counter: u16,
    /// TIMA (FF05).
    pub(super) tima: u8,
    /// TMA (FF06).
    pub(super) tma: u8,
    /// TAC raw value (lower 3 bits meaningful).
    pub(super) tac: u8,
    /// Ticks left until an overflowed TIMA is reloaded. Zero when idle.
    pub(super) overflow_ticks: u8,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Post-boot DMG state.
    pub(crate) fn new() -> Self {
        Self {
            internal_counter: 0xABCC,
            tima: 0x00,
            tma: 0x00,
            tac: 0x00,
            overflow_ticks: 0,
        }
    }

    #[inline]
    pub(super) fn enabled(&self) -> bool {
        (self.tac & 0x04) != 0
    }

    /// Currently selected input bit of the system counter:
    /// - 00 -> bit 9 (4096 Hz)
    /// - 01 -> bit 3 (262144 Hz)
    /// - 10 -> bit 5 (65536 Hz)
    /// - 11 -> bit 7 (16384 Hz)
    #[inline]
    pub(super) fn counter_bit(&self) -> bool {
        let shift = match self.tac & 0x03 {
            0x00 => 9,
            0x01 => 3,
            0x02 => 5,
            _ => 7,
        };
        (self.internal_counter >> shift) & 1 != 0
    }

    /// Timer input after the enable gate.
    #[inline]
    fn input(&self) -> bool {
        self.enabled() && self.counter_bit()
    }

    #[inline]
    pub(super) fn increment_tima(&mut self) {
        let (next, overflow) = self.tima.overflowing_add(1);
        self.tima = next;
        if overflow {
            // TIMA reads 0x00 until the reload lands.
            self.overflow_ticks = RELOAD_DELAY;
        }
    }

    /// Advance by one clock tick.
    pub(crate) fn tick(&mut self, if_reg: &mut u8) {
        if self.overflow_ticks > 0 {
            self.overflow_ticks -= 1;
            if self.overflow_ticks == 0 {
                self.tima = self.tma;
                *if_reg |= Interrupt::TIMER.bits();
            }
        }

        let before = self.input();
        self.internal_counter = self.internal_counter.wrapping_add(1);
        if before && !self.input() {
            self.increment_tima();
        }
    }
}
