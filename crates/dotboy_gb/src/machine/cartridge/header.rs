use crate::error::{Error, Result};

/// Header ends at 0x014F; anything shorter cannot be a cartridge.
pub(crate) const HEADER_END: usize = 0x150;

const TITLE: std::ops::Range<usize> = 0x134..0x144;
const CHECKSUM_RANGE: std::ops::RangeInclusive<usize> = 0x134..=0x14C;

/// Memory bank controller family.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MbcKind {
    Mbc0,
    Mbc1,
    Mbc2,
    Mbc3,
}

/// Cartridge-type byte (0x0147) decoded into mapper and capabilities.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CartridgeType {
    pub code: u8,
    pub mbc: MbcKind,
    pub has_ram: bool,
    pub has_battery: bool,
    pub has_rtc: bool,
}

impl CartridgeType {
    pub fn from_code(code: u8) -> Result<Self> {
        // (mbc, ram, battery, rtc)
        let (mbc, has_ram, has_battery, has_rtc) = match code {
            0x00 => (MbcKind::Mbc0, false, false, false),
            0x08 => (MbcKind::Mbc0, true, false, false),
            0x09 => (MbcKind::Mbc0, true, true, false),
            0x01 => (MbcKind::Mbc1, false, false, false),
            0x02 => (MbcKind::Mbc1, true, false, false),
            0x03 => (MbcKind::Mbc1, true, true, false),
            0x05 => (MbcKind::Mbc2, true, false, false),
            0x06 => (MbcKind::Mbc2, true, true, false),
            0x0F => (MbcKind::Mbc3, false, true, true),
            0x10 => (MbcKind::Mbc3, true, true, true),
            0x11 => (MbcKind::Mbc3, false, false, false),
            0x12 => (MbcKind::Mbc3, true, false, false),
            0x13 => (MbcKind::Mbc3, true, true, false),
            other => return Err(Error::UnsupportedCartridge(other)),
        };
        Ok(Self {
            code,
            mbc,
            has_ram,
            has_battery,
            has_rtc,
        })
    }
}

/// Parsed cartridge header. Immutable after load.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    pub entry_point: [u8; 4],
    pub logo: [u8; 48],
    pub title: String,
    pub cgb_flag: u8,
    pub new_licensee: [u8; 2],
    pub sgb_flag: u8,
    pub cartridge_type: CartridgeType,
    pub rom_size_code: u8,
    pub ram_size_code: u8,
    pub destination: u8,
    pub old_licensee: u8,
    pub version: u8,
    pub header_checksum: u8,
    pub global_checksum: u16,
}

impl Header {
    pub fn parse(rom: &[u8]) -> Result<Self> {
        if rom.len() < HEADER_END {
            return Err(Error::RomTooSmall { len: rom.len() });
        }

        let cartridge_type = CartridgeType::from_code(rom[0x147])?;
        let header = Self {
            entry_point: copy_array(&rom[0x100..0x104]),
            logo: copy_array(&rom[0x104..0x134]),
            title: parse_title(&rom[TITLE]),
            cgb_flag: rom[0x143],
            new_licensee: copy_array(&rom[0x144..0x146]),
            sgb_flag: rom[0x146],
            cartridge_type,
            rom_size_code: rom[0x148],
            ram_size_code: rom[0x149],
            destination: rom[0x14A],
            old_licensee: rom[0x14B],
            version: rom[0x14C],
            header_checksum: rom[0x14D],
            global_checksum: u16::from_be_bytes([rom[0x14E], rom[0x14F]]),
        };

        // Validate both size codes up front.
        header.rom_size()?;
        header.ram_size()?;

        let computed = compute_header_checksum(rom);
        if computed != header.header_checksum {
            log::warn!(
                "header checksum mismatch for '{}': header 0x{:02X}, computed 0x{:02X}",
                header.title,
                header.header_checksum,
                computed
            );
        }
        Ok(header)
    }

    /// ROM size in bytes: 32 KiB << code.
    pub fn rom_size(&self) -> Result<usize> {
        match self.rom_size_code {
            code @ 0x00..=0x08 => Ok(0x8000 << code),
            other => Err(Error::InvalidRomSize(other)),
        }
    }

    /// External RAM size in bytes as declared by the header.
    pub fn ram_size(&self) -> Result<usize> {
        match self.ram_size_code {
            0x00 | 0x01 => Ok(0),
            0x02 => Ok(0x2000),
            0x03 => Ok(0x8000),
            0x04 => Ok(0x20000),
            0x05 => Ok(0x10000),
            other => Err(Error::InvalidRamSize(other)),
        }
    }

    /// File name stem for battery saves: the title with anything outside
    /// `[A-Za-z0-9 _-]` replaced.
    pub fn save_stem(&self) -> String {
        let stem: String = self
            .title
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if stem.is_empty() {
            "untitled".to_string()
        } else {
            stem
        }
    }
}

/// `x = x - byte - 1` over 0x0134..=0x014C.
pub(crate) fn compute_header_checksum(rom: &[u8]) -> u8 {
    rom[CHECKSUM_RANGE]
        .iter()
        .fold(0u8, |x, &b| x.wrapping_sub(b).wrapping_sub(1))
}

fn parse_title(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .filter(|b| b.is_ascii_graphic() || **b == b' ')
        .map(|&b| b as char)
        .collect()
}

fn copy_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}
