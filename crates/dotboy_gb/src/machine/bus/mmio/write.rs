use super::super::GameBoyBus;

impl GameBoyBus {
    pub(super) fn write8_mmio_impl(&mut self, addr: u16, value: u8) {
        match addr {
            // ROM writes drive the mapper registers; RAM writes may persist.
            0x0000..=0x7FFF | 0xA000..=0xBFFF => {
                if let Some(cart) = self.cartridge.as_mut() {
                    cart.write(addr, value);
                }
            }

            0x8000..=0x9FFF => self.ppu.write_vram(addr, value),

            0xC000..=0xFDFF => self.wram[Self::wram_index(addr)] = value,

            0xFE00..=0xFE9F => self.ppu.write_oam_direct((addr - 0xFE00) as u8, value),

            // Writes to the unusable area are ignored.
            0xFEA0..=0xFEFF => {}

            0xFF00 => self.joypad.write(value),
            0xFF01 => self.serial.write_sb(value),
            0xFF02 => self.serial.write_sc(value, &mut self.if_reg),

            0xFF04 => self.timer.write_div(),
            0xFF05 => self.timer.write_tima(value),
            0xFF06 => self.timer.write_tma(value),
            0xFF07 => self.timer.write_tac(value),

            // Only the five source bits are writable.
            0xFF0F => self.if_reg = value & 0x1F,

            0xFF46 => self.start_dma(value),
            0xFF40..=0xFF45 | 0xFF47..=0xFF4B => self.ppu.write_register(addr, value),

            0xFF03 | 0xFF08..=0xFF0E | 0xFF10..=0xFF3F | 0xFF4C..=0xFF7F => {
                self.io[(addr - 0xFF00) as usize] = value;
            }

            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize] = value,
            0xFFFF => self.ie_reg = value,
        }
    }
}
