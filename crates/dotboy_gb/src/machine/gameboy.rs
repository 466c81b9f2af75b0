use std::fs;
use std::path::Path;

use crate::config::GameBoyConfig;
use crate::cpu::{Bus, Cpu, Flag};
use crate::error::{Error, Result};

use super::bus::Button;
use super::cartridge::{Cartridge, FileStorage, Header, SaveStorage};
use super::GameBoyBus;

/// Clock ticks advanced by one `update_frame` call (4.194304 MHz / ~59.7 Hz).
pub const CLOCKS_PER_FRAME: u32 = 69_905;

/// CPU registers as seen by debuggers and frontends.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RegisterSnapshot {
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub sp: u16,
    pub pc: u16,
    /// Upper nibble of F.
    pub flags: u8,
    pub ime: bool,
    pub halted: bool,
}

impl RegisterSnapshot {
    pub fn flag(&self, flag: Flag) -> bool {
        self.flags & (1 << flag as u8) != 0
    }
}

/// High-level Game Boy machine.
///
/// Holds the CPU core and the bus. One `clock` call is one 4.19 MHz tick:
/// the CPU runs on every fourth tick, the timer, DMA and PPU on every tick,
/// in that order.
pub struct GameBoy {
    pub cpu: Cpu,
    pub(crate) bus: GameBoyBus,
    config: GameBoyConfig,
    ticks: u64,
    running: bool,
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}

impl GameBoy {
    pub fn new() -> Self {
        Self::with_config(GameBoyConfig::default())
    }

    pub fn with_config(config: GameBoyConfig) -> Self {
        Self {
            cpu: Cpu::new(),
            bus: GameBoyBus::default(),
            config,
            ticks: 0,
            running: false,
        }
    }

    pub fn config(&self) -> &GameBoyConfig {
        &self.config
    }

    /// A cartridge is inserted and the machine advances on `update_frame`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Return every subsystem to its post-boot state. The inserted
    /// cartridge and its RAM stay.
    pub fn reset(&mut self) {
        let cartridge = self.bus.cartridge.take();
        self.cpu.reset();
        self.bus = GameBoyBus::default();
        self.bus.cartridge = cartridge;
        self.ticks = 0;
    }

    /// Load a ROM image. Battery saves go to the configured save directory.
    ///
    /// On error the machine is left exactly as it was.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        let header = Header::parse(rom)?;
        let storage = self.default_storage(&header);
        self.insert(header, rom.to_vec(), storage)
    }

    pub fn load_rom_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let rom = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_rom(&rom)
    }

    /// Load a ROM image whose battery RAM lives in `storage`.
    pub fn load_rom_with_storage(
        &mut self,
        rom: &[u8],
        storage: Box<dyn SaveStorage>,
    ) -> Result<()> {
        let header = Header::parse(rom)?;
        self.insert(header, rom.to_vec(), Some(storage))
    }

    fn default_storage(&self, header: &Header) -> Option<Box<dyn SaveStorage>> {
        if !self.config.persist_saves || !header.cartridge_type.has_battery {
            return None;
        }
        let path = self
            .config
            .save_dir
            .join(format!("{}.sav", header.save_stem()));
        Some(Box::new(FileStorage::new(path)))
    }

    fn insert(
        &mut self,
        header: Header,
        rom: Vec<u8>,
        storage: Option<Box<dyn SaveStorage>>,
    ) -> Result<()> {
        // Flush the outgoing cartridge first so reloading the same game
        // restores its latest RAM.
        if let Some(old) = self.bus.cartridge.as_mut() {
            if let Err(e) = old.save() {
                log::warn!("{}", e);
            }
        }

        let cartridge = Cartridge::new(header, rom, storage)?;
        self.cpu.reset();
        self.bus = GameBoyBus::default();
        self.bus.cartridge = Some(cartridge);
        self.ticks = 0;
        self.running = true;
        Ok(())
    }

    /// Advance by one clock tick.
    pub fn clock(&mut self) {
        if self.ticks % 4 == 0 {
            self.cpu.clock(&mut self.bus);
        }
        self.bus.tick();
        self.ticks = self.ticks.wrapping_add(1);
    }

    /// Advance one video frame's worth of ticks.
    ///
    /// Does nothing until a ROM is loaded. A battery save that failed during
    /// the frame is reported here.
    pub fn update_frame(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        for _ in 0..CLOCKS_PER_FRAME {
            self.clock();
        }
        match self.bus.cartridge.as_mut().and_then(Cartridge::take_save_error) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn registers(&self) -> RegisterSnapshot {
        let regs = &self.cpu.regs;
        RegisterSnapshot {
            af: regs.af(),
            bc: regs.bc(),
            de: regs.de(),
            hl: regs.hl(),
            sp: regs.sp,
            pc: regs.pc,
            flags: regs.f(),
            ime: self.cpu.ime,
            halted: self.cpu.halted,
        }
    }

    /// Read through the normal address decode without side effects.
    pub fn read(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        self.bus.write8(addr, value);
    }

    pub fn read16(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    pub fn write16(&mut self, addr: u16, value: u16) {
        self.bus.write16(addr, value);
    }

    /// Last completed frame: 160x144 packed RGBA.
    pub fn framebuffer(&self) -> &[u8] {
        self.bus.ppu.framebuffer()
    }

    pub fn frame_count(&self) -> u64 {
        self.bus.ppu.frame_count()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.bus.set_button(button, pressed);
    }

    /// Write battery RAM out now.
    pub fn save(&mut self) -> Result<()> {
        match self.bus.cartridge.as_mut() {
            Some(cartridge) => cartridge.save(),
            None => Ok(()),
        }
    }

    /// Bytes sent over the serial port and not yet taken.
    pub fn serial_output(&self) -> &[u8] {
        &self.bus.serial.output
    }

    /// Drain the captured serial bytes. Long-running callers should use
    /// this so the capture buffer does not grow without bound.
    pub fn take_serial_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bus.serial.output)
    }

    pub fn header(&self) -> Option<&Header> {
        self.bus.cartridge.as_ref().map(Cartridge::header)
    }

    /// Disassemble the instruction at `addr`; returns text and length.
    pub fn disassemble(&mut self, addr: u16) -> (String, u16) {
        self.cpu.disassemble(&mut self.bus, addr)
    }
}
