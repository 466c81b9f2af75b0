use super::GameBoyBus;

/// Number of bytes (and ticks) in one OAM DMA transfer.
pub(crate) const DMA_LENGTH: u8 = 0xA0;

/// OAM DMA engine state.
#[derive(Default)]
pub(crate) struct Dma {
    pub(crate) active: bool,
    /// Source page (high byte of the source address).
    pub(crate) page: u8,
    /// Next byte to copy, 0..=0x9F.
    pub(crate) offset: u8,
    /// Last value written to FF46, read back by the CPU.
    pub(crate) last: u8,
}

impl GameBoyBus {
    /// FF46 write: start (or restart) a transfer from `value << 8`.
    pub(super) fn start_dma(&mut self, value: u8) {
        log::debug!("OAM DMA from 0x{:02X}00", value);
        self.dma.last = value;
        self.dma.page = value;
        self.dma.offset = 0;
        self.dma.active = true;
    }

    /// Copy one byte. Called once per clock tick while active.
    pub(super) fn tick_dma(&mut self) {
        if !self.dma.active {
            return;
        }
        // Sources above 0xDFFF read the WRAM echo.
        let page = if self.dma.page >= 0xE0 {
            self.dma.page.wrapping_sub(0x20)
        } else {
            self.dma.page
        };
        let src = u16::from_be_bytes([page, self.dma.offset]);
        let byte = self.read_unblocked(src);
        self.ppu.write_oam_direct(self.dma.offset, byte);

        self.dma.offset += 1;
        if self.dma.offset >= DMA_LENGTH {
            self.dma.active = false;
        }
    }
}
