use crate::cpu::{Bus, Interrupt};

use super::{cartridge::Cartridge, ppu::Ppu, serial::Serial, timer::Timer};

mod dma;
mod init;
mod joypad;
mod mmio;

pub(crate) use dma::DMA_LENGTH;
pub use joypad::Button;
use dma::Dma;
use joypad::Joypad;

const WRAM_SIZE: usize = 0x2000;
const HRAM_SIZE: usize = 0x7F;
const IO_LATCH_SIZE: usize = 0x80;

/// The memory router. Owns every subsystem except the CPU and decodes each
/// access to exactly one of them.
pub(crate) struct GameBoyBus {
    pub(crate) cartridge: Option<Cartridge>,
    pub(crate) ppu: Ppu,
    wram: [u8; WRAM_SIZE],
    hram: [u8; HRAM_SIZE],
    pub(crate) timer: Timer,
    pub(crate) dma: Dma,
    joypad: Joypad,
    pub(crate) serial: Serial,
    pub(crate) if_reg: u8,
    pub(crate) ie_reg: u8,
    /// Plain storage for I/O slots nothing interprets.
    io: [u8; IO_LATCH_SIZE],
}

impl Default for GameBoyBus {
    fn default() -> Self {
        let mut bus = Self {
            cartridge: None,
            ppu: Ppu::new(),
            wram: [0; WRAM_SIZE],
            hram: [0; HRAM_SIZE],
            timer: Timer::new(),
            dma: Dma::default(),
            joypad: Joypad::default(),
            serial: Serial::default(),
            if_reg: 0,
            ie_reg: 0,
            io: [0xFF; IO_LATCH_SIZE],
        };
        bus.apply_dmg_initial_io_state();
        bus
    }
}

impl Bus for GameBoyBus {
    fn read8(&mut self, addr: u16) -> u8 {
        self.read8_mmio(addr)
    }

    fn write8(&mut self, addr: u16, value: u8) {
        self.write8_mmio(addr, value)
    }
}

impl GameBoyBus {
    /// Advance every bus-side subsystem by one clock tick, in hardware
    /// order: timer, DMA, PPU.
    pub(crate) fn tick(&mut self) {
        self.timer.tick(&mut self.if_reg);
        self.tick_dma();
        self.ppu.tick(&mut self.if_reg);
    }

    /// Side-effect-free read for inspection.
    pub(crate) fn peek(&self, addr: u16) -> u8 {
        self.read8_mmio(addr)
    }

    pub(crate) fn set_button(&mut self, button: Button, pressed: bool) {
        if self.joypad.set(button, pressed) {
            log::debug!("joypad press {:?}", button);
            self.if_reg |= Interrupt::JOYPAD.bits();
        }
    }
}
