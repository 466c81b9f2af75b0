use super::Timer;

impl Timer {
    /// DIV (FF04).
    #[inline]
    pub(crate) fn div(&self) -> u8 {
        (self.internal_counter >> 8) as u8
    }

    /// DIV write.
    ///
    /// Any value resets the system counter. If the selected bit was high,
    /// the reset is a falling edge and TIMA increments once.
    pub(crate) fn write_div(&mut self) {
        let before = self.input();
        self.internal_counter = 0;
        if before {
            self.increment_tima();
        }
    }

    #[inline]
    pub(crate) fn tima(&self) -> u8 {
        self.tima
    }

    /// TIMA write. A write while a reload is pending cancels the reload and
    /// its interrupt.
    pub(crate) fn write_tima(&mut self, value: u8) {
        self.tima = value;
        self.overflow_ticks = 0;
    }

    #[inline]
    pub(crate) fn tma(&self) -> u8 {
        self.tma
    }

    pub(crate) fn write_tma(&mut self, value: u8) {
        self.tma = value;
    }

    /// TAC (FF07); unused bits read as 1.
    #[inline]
    pub(crate) fn tac(&self) -> u8 {
        self.tac | 0b1111_1000
    }

    /// TAC write.
    ///
    /// Disabling the timer or switching the clock source while the selected
    /// input bit is high produces one TIMA increment.
    pub(crate) fn write_tac(&mut self, value: u8) {
        let before = self.input();
        self.tac = value & 0x07;
        if before && !self.input() {
            self.increment_tima();
        }
    }
}
