use super::super::GameBoyBus;

impl GameBoyBus {
    /// Address decode for reads, ignoring DMA contention. The DMA engine
    /// reads its source through here.
    pub(in super::super) fn read_unblocked(&self, addr: u16) -> u8 {
        match addr {
            // Cartridge ROM and external RAM. An empty slot floats high.
            0x0000..=0x7FFF | 0xA000..=0xBFFF => match &self.cartridge {
                Some(cart) => cart.read(addr),
                None => 0xFF,
            },

            0x8000..=0x9FFF => self.ppu.read_vram(addr),

            // Work RAM and its echo at 0xE000..0xFDFF.
            0xC000..=0xFDFF => self.wram[Self::wram_index(addr)],

            0xFE00..=0xFE9F => self.ppu.read_oam((addr - 0xFE00) as u8),

            // Unusable area.
            0xFEA0..=0xFEFF => 0x00,

            0xFF00 => self.joypad.read(),
            0xFF01 => self.serial.sb,
            0xFF02 => self.serial.read_sc(),

            0xFF04 => self.timer.div(),
            0xFF05 => self.timer.tima(),
            0xFF06 => self.timer.tma(),
            0xFF07 => self.timer.tac(),

            // Upper 3 bits of IF always read as 1.
            0xFF0F => self.if_reg | 0b1110_0000,

            0xFF46 => self.dma.last,
            0xFF40..=0xFF45 | 0xFF47..=0xFF4B => self.ppu.read_register(addr),

            0xFF03 | 0xFF08..=0xFF0E | 0xFF10..=0xFF3F | 0xFF4C..=0xFF7F => {
                self.io[(addr - 0xFF00) as usize]
            }

            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize],
            0xFFFF => self.ie_reg,
        }
    }
}
