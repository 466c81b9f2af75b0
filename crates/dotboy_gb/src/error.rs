use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the emulation core.
///
/// Everything here is reported to the caller; nothing in the core panics on
/// bad ROM data or a failing save medium.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ROM image is {len} bytes, too small to hold a cartridge header")]
    RomTooSmall { len: usize },

    #[error("ROM header declares {declared} bytes but the image holds only {actual}")]
    RomTruncated { declared: usize, actual: usize },

    #[error("unsupported cartridge type 0x{0:02X}")]
    UnsupportedCartridge(u8),

    #[error("invalid ROM size code 0x{0:02X}")]
    InvalidRomSize(u8),

    #[error("invalid RAM size code 0x{0:02X}")]
    InvalidRamSize(u8),

    #[error("failed to persist cartridge RAM to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
