pub mod app;
pub mod cpu;
pub mod machine;

mod config;
mod error;

pub use app::GameBoyApp;
pub use config::GameBoyConfig;
pub use error::{Error, Result};
pub use machine::{
    Button, CartridgeType, FileStorage, GameBoy, Header, MbcKind, RegisterSnapshot, SaveStorage,
    CLOCKS_PER_FRAME,
};

/// Logical screen width in pixels for the Game Boy DMG.
pub const SCREEN_WIDTH: usize = 160;
/// Logical screen height in pixels.
pub const SCREEN_HEIGHT: usize = 144;
