use bitflags::bitflags;

use super::{Mode, Ppu};

bitflags! {
    /// LCDC (FF40).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub(crate) struct Lcdc: u8 {
        const BG_WINDOW_ENABLE = 0x01;
        const OBJ_ENABLE = 0x02;
        const OBJ_SIZE = 0x04;
        const BG_TILE_MAP = 0x08;
        const TILE_DATA = 0x10;
        const WINDOW_ENABLE = 0x20;
        const WINDOW_TILE_MAP = 0x40;
        const LCD_ENABLE = 0x80;
    }
}

bitflags! {
    /// Writable STAT (FF41) interrupt selects.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub(crate) struct Stat: u8 {
        const HBLANK = 0x08;
        const VBLANK = 0x10;
        const OAM_SCAN = 0x20;
        const LYC = 0x40;
    }
}

const COINCIDENCE: u8 = 0x04;

impl Ppu {
    pub(crate) fn read_register(&self, addr: u16) -> u8 {
        match addr {
            0xFF40 => self.lcdc.bits(),
            0xFF41 => self.read_stat(),
            0xFF42 => self.scy,
            0xFF43 => self.scx,
            0xFF44 => self.ly,
            0xFF45 => self.lyc,
            0xFF47 => self.bgp,
            0xFF48 => self.obp0,
            0xFF49 => self.obp1,
            0xFF4A => self.wy,
            0xFF4B => self.wx,
            _ => 0xFF,
        }
    }

    pub(crate) fn write_register(&mut self, addr: u16, value: u8) {
        match addr {
            0xFF40 => self.write_lcdc(value),
            0xFF41 => self.stat = Stat::from_bits_truncate(value),
            0xFF42 => self.scy = value,
            0xFF43 => self.scx = value,
            // LY is read-only.
            0xFF44 => {}
            0xFF45 => {
                self.lyc = value;
                self.coincidence = self.ly == self.lyc;
            }
            0xFF47 => self.bgp = value,
            0xFF48 => self.obp0 = value,
            0xFF49 => self.obp1 = value,
            0xFF4A => self.wy = value,
            0xFF4B => self.wx = value,
            _ => {}
        }
    }

    /// Bit 7 reads as 1; bits 0-1 report the mode.
    fn read_stat(&self) -> u8 {
        let coincidence = if self.coincidence { COINCIDENCE } else { 0 };
        0x80 | self.stat.bits() | coincidence | self.mode as u8
    }

    fn write_lcdc(&mut self, value: u8) {
        let was_enabled = self.lcd_enabled();
        self.lcdc = Lcdc::from_bits_retain(value);
        match (was_enabled, self.lcd_enabled()) {
            (true, false) => self.switch_off(),
            (false, true) => self.switch_on(),
            _ => {}
        }
    }

    fn switch_off(&mut self) {
        log::debug!("LCD off at LY={}", self.ly);
        self.ly = 0;
        self.dot = 0;
        self.mode = Mode::HBlank;
        self.coincidence = self.ly == self.lyc;
        self.clear_line_state();
        self.front.fill(0xFF);
        self.back.fill(0xFF);
    }

    fn switch_on(&mut self) {
        log::debug!("LCD on");
        self.ly = 0;
        self.dot = 0;
        self.mode = Mode::OamScan;
        self.window_line = 0;
        self.window_y_triggered = false;
        self.coincidence = self.ly == self.lyc;
    }
}
