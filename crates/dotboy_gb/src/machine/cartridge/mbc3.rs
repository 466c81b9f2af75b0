use std::time::SystemTime;

use super::{rtc::Rtc, RamAccess, RAM_BANK_SIZE, ROM_BANK_SIZE};

/// MBC3: 7-bit ROM banking, four RAM banks and an optional real-time
/// clock whose registers share the RAM bank select (0x08..=0x0C).
pub(super) struct Mbc3 {
    rom_banks: usize,
    ram_banks: usize,
    ram_enabled: bool,
    rom_bank: u8,
    /// 0x00..=0x03 picks a RAM bank, 0x08..=0x0C an RTC register.
    select: u8,
    /// Last write to the latch register was 0.
    latch_armed: bool,
    rtc: Option<Rtc>,
}

impl Mbc3 {
    pub(super) fn new(rom_banks: usize, ram_banks: usize, rtc: Option<Rtc>) -> Self {
        Self {
            rom_banks: rom_banks.max(1),
            ram_banks,
            ram_enabled: false,
            rom_bank: 1,
            select: 0,
            latch_armed: false,
            rtc,
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
        match self.select {
            0x00..=0x03 if self.ram_banks > 0 => {
                let bank = self.select as usize % self.ram_banks;
                RamAccess::Ram(bank * RAM_BANK_SIZE + (addr - 0xA000) as usize)
            }
            0x08..=0x0C if self.rtc.is_some() => RamAccess::Rtc(self.select),
            _ => RamAccess::Disabled,
        }
    }

    pub(super) fn write_register(&mut self, addr: u16, value: u8, now: SystemTime) {
        match addr {
            0x0000..=0x1FFF => self.ram_enabled = (value & 0x0F) == 0x0A,
            0x2000..=0x3FFF => {
                self.rom_bank = match value & 0x7F {
                    0 => 1,
                    bank => bank,
                };
                log::debug!("MBC3 ROM bank {}", self.rom_bank);
            }
            0x4000..=0x5FFF => self.select = value,
            0x6000..=0x7FFF => {
                if self.latch_armed && value == 0x01 {
                    if let Some(rtc) = self.rtc.as_mut() {
                        rtc.latch(now);
                    }
                }
                self.latch_armed = value == 0x00;
            }
            _ => {}
        }
    }

    pub(super) fn read_rtc(&self, reg: u8) -> u8 {
        self.rtc.as_ref().map_or(0xFF, |rtc| rtc.read(reg))
    }

    pub(super) fn write_rtc(&mut self, reg: u8, value: u8, now: SystemTime) {
        if let Some(rtc) = self.rtc.as_mut() {
            rtc.write(reg, value, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn bank_select_switches_between_ram_and_rtc() {
        let mut mbc = Mbc3::new(8, 4, Some(Rtc::new(at(0))));
        mbc.write_register(0x0000, 0x0A, at(0));

        mbc.write_register(0x4000, 0x02, at(0));
        assert!(matches!(
            mbc.ram_access(0xA001),
            RamAccess::Ram(off) if off == 2 * RAM_BANK_SIZE + 1
        ));
        mbc.write_register(0x4000, 0x0A, at(0));
        assert!(matches!(mbc.ram_access(0xA000), RamAccess::Rtc(0x0A)));
        mbc.write_register(0x4000, 0x05, at(0));
        assert!(matches!(mbc.ram_access(0xA000), RamAccess::Disabled));
    }

    #[test]
    fn latch_requires_zero_then_one() {
        let mut mbc = Mbc3::new(8, 0, Some(Rtc::new(at(0))));

        mbc.write_register(0x6000, 0x01, at(30));
        assert_eq!(mbc.read_rtc(0x08), 0);

        mbc.write_register(0x6000, 0x00, at(40));
        mbc.write_register(0x6000, 0x01, at(42));
        assert_eq!(mbc.read_rtc(0x08), 42);
    }

    #[test]
    fn seven_bit_rom_bank_with_zero_remap() {
        let mut mbc = Mbc3::new(128, 0, None);
        mbc.write_register(0x2000, 0xFF, at(0));
        assert_eq!(mbc.rom_offset(0x4000), 0x7F * ROM_BANK_SIZE);
        mbc.write_register(0x2000, 0x80, at(0));
        assert_eq!(mbc.rom_offset(0x4000), ROM_BANK_SIZE);
    }
}
