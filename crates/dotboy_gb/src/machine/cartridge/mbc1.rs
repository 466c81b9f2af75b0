use super::{RamAccess, RAM_BANK_SIZE, ROM_BANK_SIZE};

/// MBC1 banking registers.
///
/// A 5-bit ROM bank register and a 2-bit register that either extends the
/// ROM bank (mode 0) or selects the RAM bank (mode 1).
pub(super) struct Mbc1 {
    rom_banks: usize,
    ram_banks: usize,
    ram_enabled: bool,
    bank_low: u8,
    bank_high: u8,
    ram_banking_mode: bool,
}

impl Mbc1 {
    pub(super) fn new(rom_banks: usize, ram_banks: usize) -> Self {
        Self {
            rom_banks: rom_banks.max(1),
            ram_banks,
            ram_enabled: false,
            bank_low: 1,
            bank_high: 0,
            ram_banking_mode: false,
        }
    }

    pub(super) fn rom_bank(&self) -> usize {
        let bank = if self.ram_banking_mode {
            self.bank_low as usize
        } else {
            ((self.bank_high as usize) << 5) | self.bank_low as usize
        };
        bank % self.rom_banks
    }

    pub(super) fn rom_offset(&self, addr: u16) -> usize {
        if addr < 0x4000 {
            addr as usize
        } else {
            self.rom_bank() * ROM_BANK_SIZE + (addr - 0x4000) as usize
        }
    }

    pub(super) fn ram_access(&self, addr: u16) -> RamAccess {
        if !self.ram_enabled || self.ram_banks == 0 {
            return RamAccess::Disabled;
        }
        let bank = if self.ram_banking_mode {
            self.bank_high as usize % self.ram_banks
        } else {
            0
        };
        RamAccess::Ram(bank * RAM_BANK_SIZE + (addr - 0xA000) as usize)
    }

    pub(super) fn write_register(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram_enabled = (value & 0x0F) == 0x0A,
            0x2000..=0x3FFF => {
                // Bank 0 cannot be mapped into the switchable window.
                self.bank_low = match value & 0x1F {
                    0 => 1,
                    bank => bank,
                };
                log::debug!("MBC1 ROM bank {}", self.rom_bank());
            }
            0x4000..=0x5FFF => {
                self.bank_high = value & 0x03;
                log::debug!("MBC1 upper bank bits {}", self.bank_high);
            }
            0x6000..=0x7FFF => self.ram_banking_mode = (value & 0x01) != 0,
            _ => {}
        }
    }
}
