mod bus;
mod cartridge;
mod gameboy;
mod ppu;
mod serial;
mod timer;

pub(crate) use bus::GameBoyBus;
pub use bus::Button;
pub use cartridge::{CartridgeType, FileStorage, Header, MbcKind, SaveStorage};
pub use gameboy::{GameBoy, RegisterSnapshot, CLOCKS_PER_FRAME};

#[cfg(test)]
mod tests;
