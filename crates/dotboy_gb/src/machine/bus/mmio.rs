mod read;
mod write;

use super::GameBoyBus;

impl GameBoyBus {
    /// VRAM and OAM belong to the DMA engine while a transfer runs.
    #[inline]
    fn dma_blocks(&self, addr: u16) -> bool {
        self.dma.active && matches!(addr, 0x8000..=0x9FFF | 0xFE00..=0xFE9F)
    }

    /// WRAM index for 0xC000..=0xFDFF (echo included).
    #[inline]
    fn wram_index(addr: u16) -> usize {
        ((addr - 0xC000) & 0x1FFF) as usize
    }

    pub(super) fn read8_mmio(&self, addr: u16) -> u8 {
        if self.dma_blocks(addr) {
            return 0xFF;
        }
        self.read_unblocked(addr)
    }

    pub(super) fn write8_mmio(&mut self, addr: u16, value: u8) {
        if self.dma_blocks(addr) {
            return;
        }
        self.write8_mmio_impl(addr, value)
    }
}
