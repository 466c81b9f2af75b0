use super::{GameBoyBus, IO_LATCH_SIZE};

/// Post-boot contents of I/O slots that no subsystem owns (mostly audio).
const DMG_IO_LATCH: [(u16, u8); 21] = [
    (0xFF10, 0x80),
    (0xFF11, 0xBF),
    (0xFF12, 0xF3),
    (0xFF13, 0xFF),
    (0xFF14, 0xBF),
    (0xFF16, 0x3F),
    (0xFF17, 0x00),
    (0xFF18, 0xFF),
    (0xFF19, 0xBF),
    (0xFF1A, 0x7F),
    (0xFF1B, 0xFF),
    (0xFF1C, 0x9F),
    (0xFF1D, 0xFF),
    (0xFF1E, 0xBF),
    (0xFF20, 0xFF),
    (0xFF21, 0x00),
    (0xFF22, 0x00),
    (0xFF23, 0xBF),
    (0xFF24, 0x77),
    (0xFF25, 0xF3),
    (0xFF26, 0xF1),
];

impl GameBoyBus {
    /// Initialize I/O registers to the state the DMG boot ROM leaves behind.
    pub(super) fn apply_dmg_initial_io_state(&mut self) {
        self.io = [0xFF; IO_LATCH_SIZE];
        for (addr, value) in DMG_IO_LATCH {
            self.io[(addr - 0xFF00) as usize] = value;
        }

        self.serial.sb = 0x00;
        self.serial.sc = 0x7E;

        // VBlank is already requested at PC=0x0100.
        self.if_reg = 0x01;
        self.ie_reg = 0x00;

        self.dma.last = 0xFF;
    }
}
