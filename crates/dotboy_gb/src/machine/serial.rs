use crate::cpu::Interrupt;

/// Loop-back serial port modelled via SB/SC.
///
/// No link partner exists. A transfer started with the internal clock
/// (SC bits 7 and 0 set) completes at once: SB is captured into `output`
/// and left unchanged, the start bit clears and the serial interrupt is
/// requested.
#[derive(Default)]
pub(crate) struct Serial {
    pub(crate) sb: u8,
    pub(crate) sc: u8,
    pub(crate) output: Vec<u8>,
}

impl Serial {
    pub(super) fn read_sc(&self) -> u8 {
        // Unused bits read as 1.
        self.sc | 0x7E
    }

    pub(super) fn write_sb(&mut self, value: u8) {
        self.sb = value;
    }

    pub(super) fn write_sc(&mut self, value: u8, if_reg: &mut u8) {
        self.sc = value;
        if (self.sc & 0x81) == 0x81 {
            self.output.push(self.sb);
            log::debug!("serial byte 0x{:02X} ({:?})", self.sb, self.sb as char);
            self.sc &= !0x80;
            *if_reg |= Interrupt::SERIAL.bits();
        }
    }
}
