mod header;
mod mbc1;
mod mbc2;
mod mbc3;
mod rtc;
mod save;

use std::time::SystemTime;

use crate::error::{Error, Result};

pub use header::{CartridgeType, Header, MbcKind};
pub use save::{FileStorage, SaveStorage};

#[cfg(test)]
pub(crate) use header::compute_header_checksum;

use mbc1::Mbc1;
use mbc2::{Mbc2, MBC2_RAM_SIZE};
use mbc3::Mbc3;
use rtc::Rtc;

pub(crate) const ROM_BANK_SIZE: usize = 0x4000;
pub(crate) const RAM_BANK_SIZE: usize = 0x2000;

/// Where an access to 0xA000..=0xBFFF lands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RamAccess {
    /// RAM disabled or nothing mapped: reads float high, writes are dropped.
    Disabled,
    /// Byte offset into the external RAM image.
    Ram(usize),
    /// MBC3 clock register.
    Rtc(u8),
}

/// Mapper variant and its banking registers.
enum Mbc {
    /// No mapper: fixed 32 KiB ROM, fixed 8 KiB RAM.
    Mbc0,
    Mbc1(Mbc1),
    Mbc2(Mbc2),
    Mbc3(Mbc3),
}

/// An inserted cartridge: ROM image, external RAM and the mapper that
/// decodes cartridge-space addresses onto them.
pub(crate) struct Cartridge {
    header: Header,
    rom: Vec<u8>,
    ram: Vec<u8>,
    mbc: Mbc,
    storage: Option<Box<dyn SaveStorage>>,
    /// Persistence failure not yet reported to the caller.
    save_error: Option<Error>,
}

impl Cartridge {
    /// Build a cartridge from a parsed header and its ROM image.
    ///
    /// `storage` is only kept for battery-backed types; their RAM is
    /// restored from it here.
    pub(crate) fn new(
        header: Header,
        rom: Vec<u8>,
        storage: Option<Box<dyn SaveStorage>>,
    ) -> Result<Self> {
        let declared = header.rom_size()?;
        if rom.len() < declared {
            log::warn!(
                "rejecting '{}': header declares {} bytes, image has {}",
                header.title,
                declared,
                rom.len()
            );
            return Err(Error::RomTruncated {
                declared,
                actual: rom.len(),
            });
        }

        let kind = header.cartridge_type;
        let rom_banks = declared / ROM_BANK_SIZE;
        let ram_size = match kind.mbc {
            MbcKind::Mbc0 => RAM_BANK_SIZE,
            MbcKind::Mbc2 => MBC2_RAM_SIZE,
            MbcKind::Mbc1 | MbcKind::Mbc3 => header.ram_size()?,
        };
        let ram_banks = ram_size / RAM_BANK_SIZE;

        let mbc = match kind.mbc {
            MbcKind::Mbc0 => Mbc::Mbc0,
            MbcKind::Mbc1 => Mbc::Mbc1(Mbc1::new(rom_banks, ram_banks)),
            MbcKind::Mbc2 => Mbc::Mbc2(Mbc2::new(rom_banks)),
            MbcKind::Mbc3 => {
                let rtc = kind.has_rtc.then(|| Rtc::new(SystemTime::now()));
                Mbc::Mbc3(Mbc3::new(rom_banks, ram_banks, rtc))
            }
        };

        let storage = storage.filter(|_| kind.has_battery && ram_size > 0);
        let mut cart = Self {
            header,
            rom,
            ram: vec![0; ram_size],
            mbc,
            storage,
            save_error: None,
        };
        cart.restore();

        log::info!(
            "loaded '{}': type 0x{:02X} ({:?}), ROM {} KiB, RAM {} bytes{}",
            cart.header.title,
            kind.code,
            kind.mbc,
            declared / 1024,
            ram_size,
            if cart.storage.is_some() { ", battery" } else { "" }
        );
        Ok(cart)
    }

    pub(crate) fn header(&self) -> &Header {
        &self.header
    }

    fn restore(&mut self) {
        let Some(storage) = self.storage.as_mut() else {
            return;
        };
        match storage.load() {
            Ok(Some(data)) => {
                // Short images fill the prefix; the rest stays zeroed.
                let len = data.len().min(self.ram.len());
                self.ram[..len].copy_from_slice(&data[..len]);
                log::info!("restored {} bytes of cartridge RAM", len);
            }
            Ok(None) => {}
            Err(e) => log::warn!("ignoring unreadable save: {}", e),
        }
    }

    fn rom_offset(&self, addr: u16) -> usize {
        match &self.mbc {
            Mbc::Mbc0 => addr as usize,
            Mbc::Mbc1(m) => m.rom_offset(addr),
            Mbc::Mbc2(m) => m.rom_offset(addr),
            Mbc::Mbc3(m) => m.rom_offset(addr),
        }
    }

    fn ram_access(&self, addr: u16) -> RamAccess {
        match &self.mbc {
            Mbc::Mbc0 => RamAccess::Ram((addr - 0xA000) as usize),
            Mbc::Mbc1(m) => m.ram_access(addr),
            Mbc::Mbc2(m) => m.ram_access(addr),
            Mbc::Mbc3(m) => m.ram_access(addr),
        }
    }

    /// Read from 0x0000..=0x7FFF or 0xA000..=0xBFFF.
    pub(crate) fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF => self.rom.get(self.rom_offset(addr)).copied().unwrap_or(0xFF),
            0xA000..=0xBFFF => match self.ram_access(addr) {
                RamAccess::Disabled => 0xFF,
                RamAccess::Ram(offset) => {
                    let value = self.ram.get(offset).copied().unwrap_or(0xFF);
                    match self.mbc {
                        // Only the low nibble exists.
                        Mbc::Mbc2(_) => value | 0xF0,
                        _ => value,
                    }
                }
                RamAccess::Rtc(reg) => match &self.mbc {
                    Mbc::Mbc3(m) => m.read_rtc(reg),
                    _ => 0xFF,
                },
            },
            _ => 0xFF,
        }
    }

    /// Write to the mapper registers (0x0000..=0x7FFF) or external RAM.
    pub(crate) fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x7FFF => match &mut self.mbc {
                // ROM is read-only without a mapper.
                Mbc::Mbc0 => {}
                Mbc::Mbc1(m) => m.write_register(addr, value),
                Mbc::Mbc2(m) => m.write_register(addr, value),
                Mbc::Mbc3(m) => m.write_register(addr, value, SystemTime::now()),
            },
            0xA000..=0xBFFF => self.write_ram(addr, value),
            _ => {}
        }
    }

    fn write_ram(&mut self, addr: u16, value: u8) {
        match self.ram_access(addr) {
            RamAccess::Disabled => {}
            RamAccess::Ram(offset) => {
                let value = match self.mbc {
                    Mbc::Mbc2(_) => value & 0x0F,
                    _ => value,
                };
                let Some(slot) = self.ram.get_mut(offset) else {
                    return;
                };
                if *slot != value {
                    *slot = value;
                    self.persist();
                }
            }
            RamAccess::Rtc(reg) => {
                if let Mbc::Mbc3(m) = &mut self.mbc {
                    m.write_rtc(reg, value, SystemTime::now());
                }
            }
        }
    }

    /// Store the RAM image, keeping the first failure for the caller.
    fn persist(&mut self) {
        let Some(storage) = self.storage.as_mut() else {
            return;
        };
        if let Err(e) = storage.store(&self.ram) {
            if self.save_error.is_none() {
                log::warn!("{}", e);
                self.save_error = Some(e);
            }
        }
    }

    pub(crate) fn take_save_error(&mut self) -> Option<Error> {
        self.save_error.take()
    }

    /// Write battery RAM out now. No-op for carts without a battery.
    /// A successful write supersedes any earlier failure.
    pub(crate) fn save(&mut self) -> Result<()> {
        self.save_error = None;
        match self.storage.as_mut() {
            Some(storage) => storage.store(&self.ram),
            None => Ok(()),
        }
    }
}

impl Drop for Cartridge {
    fn drop(&mut self) {
        let Some(storage) = self.storage.as_mut() else {
            return;
        };
        match storage.store(&self.ram) {
            Ok(()) => log::info!("saved cartridge RAM for '{}'", self.header.title),
            Err(e) => log::error!("{}", e),
        }
    }
}
