use super::{RamAccess, ROM_BANK_SIZE};

/// Built-in MBC2 RAM: 512 half-bytes.
pub(super) const MBC2_RAM_SIZE: usize = 0x200;

/// MBC2: 4-bit ROM banking and 512x4 bits of internal RAM.
///
/// Both registers live in 0x0000..=0x3FFF; address bit 8 picks which one a
/// write hits. RAM repeats every 512 bytes across 0xA000..=0xBFFF.
pub(super) struct Mbc2 {
    rom_banks: usize,
    ram_enabled: bool,
    rom_bank: u8,
}

impl Mbc2 {
    pub(super) fn new(rom_banks: usize) -> Self {
        Self {
            rom_banks: rom_banks.max(1),
            ram_enabled: false,
            rom_bank: 1,
        }
    }

    pub(super) fn rom_offset(&self, addr: u16) -> usize {
        if addr < 0x4000 {
            addr as usize
        } else {
            (self.rom_bank as usize % self.rom_banks) * ROM_BANK_SIZE + (addr - 0x4000) as usize
        }
    }

    pub(super) fn ram_access(&self, addr: u16) -> RamAccess {
        if !self.ram_enabled {
            return RamAccess::Disabled;
        }
        RamAccess::Ram((addr & 0x01FF) as usize)
    }

    pub(super) fn write_register(&mut self, addr: u16, value: u8) {
        if addr >= 0x4000 {
            return;
        }
        if addr & 0x0100 == 0 {
            self.ram_enabled = (value & 0x0F) == 0x0A;
        } else {
            self.rom_bank = match value & 0x0F {
                0 => 1,
                bank => bank,
            };
            log::debug!("MBC2 ROM bank {}", self.rom_bank);
        }
    }
}
