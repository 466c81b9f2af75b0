//! Dot-stepped DMG picture processing unit.
//!
//! Each scanline runs OAM scan (80 dots), pixel transfer (variable) and
//! HBlank, padded to 456 dots. Lines 144..=153 are VBlank. Pixels leave a
//! background FIFO one per dot and are merged with a per-line sprite row
//! before being written to the back buffer; the buffers swap when VBlank
//! begins so readers only ever see a completed frame.

mod fetcher;
mod registers;
mod sprite;

use std::collections::VecDeque;

use dotboy_common::Color;

use crate::cpu::Interrupt;
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};
use fetcher::Fetcher;
use registers::{Lcdc, Stat};
use sprite::{Sprite, SpritePixel};

const VRAM_SIZE: usize = 0x2000;
const OAM_SIZE: usize = 0xA0;
const MAX_SPRITES_PER_LINE: usize = 10;
const VBLANK_START: u8 = 144;

pub(crate) const OAM_SCAN_DOTS: u16 = 80;
pub(crate) const DOTS_PER_LINE: u16 = 456;
pub(crate) const LINES_PER_FRAME: u8 = 154;
pub(crate) const FRAMEBUFFER_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT * Color::BYTES;

/// Shade for each 2-bit palette entry.
const SHADES: [Color; 4] = [
    Color::WHITE,
    Color::LIGHT_GRAY,
    Color::DARK_GRAY,
    Color::BLACK,
];

/// STAT mode, numbered as the register reports it.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    Drawing = 3,
}

pub(crate) struct Ppu {
    vram: [u8; VRAM_SIZE],
    oam: [u8; OAM_SIZE],

    lcdc: Lcdc,
    stat: Stat,
    scy: u8,
    scx: u8,
    ly: u8,
    lyc: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,
    coincidence: bool,

    mode: Mode,
    /// Dots elapsed on the current line.
    dot: u16,

    sprites: Vec<Sprite>,
    next_sprite: usize,
    fetcher: Fetcher,
    /// Background/window colour indices awaiting output.
    bg_fifo: VecDeque<u8>,
    sprite_line: [Option<SpritePixel>; SCREEN_WIDTH],
    /// Pixels written to the current row.
    pushed_x: u8,
    /// Leading pixels to drop (fine scroll, or a window left of column 0).
    discard: u8,

    window_line: u8,
    window_active: bool,
    window_drawn: bool,
    window_y_triggered: bool,

    back: Vec<u8>,
    front: Vec<u8>,
    frames: u64,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    /// Post-boot state: LCD on, line 0, OAM scan.
    pub(crate) fn new() -> Self {
        Self {
            vram: [0; VRAM_SIZE],
            oam: [0; OAM_SIZE],
            lcdc: Lcdc::from_bits_retain(0x91),
            stat: Stat::empty(),
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            bgp: 0xFC,
            obp0: 0xFF,
            obp1: 0xFF,
            wy: 0,
            wx: 0,
            coincidence: true,
            mode: Mode::OamScan,
            dot: 0,
            sprites: Vec::with_capacity(MAX_SPRITES_PER_LINE),
            next_sprite: 0,
            fetcher: Fetcher::new(),
            bg_fifo: VecDeque::with_capacity(16),
            sprite_line: [None; SCREEN_WIDTH],
            pushed_x: 0,
            discard: 0,
            window_line: 0,
            window_active: false,
            window_drawn: false,
            window_y_triggered: false,
            back: vec![0xFF; FRAMEBUFFER_SIZE],
            front: vec![0xFF; FRAMEBUFFER_SIZE],
            frames: 0,
        }
    }

    #[inline]
    pub(crate) fn lcd_enabled(&self) -> bool {
        self.lcdc.contains(Lcdc::LCD_ENABLE)
    }

    pub(crate) fn ly(&self) -> u8 {
        self.ly
    }

    pub(crate) fn mode(&self) -> Mode {
        self.mode
    }

    /// Last completed frame, packed RGBA.
    pub(crate) fn framebuffer(&self) -> &[u8] {
        &self.front
    }

    pub(crate) fn frame_count(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub(super) fn vram_byte(&self, addr: u16) -> u8 {
        self.vram[(addr & 0x1FFF) as usize]
    }

    pub(crate) fn read_vram(&self, addr: u16) -> u8 {
        self.vram_byte(addr)
    }

    pub(crate) fn write_vram(&mut self, addr: u16, value: u8) {
        self.vram[(addr & 0x1FFF) as usize] = value;
    }

    pub(crate) fn read_oam(&self, offset: u8) -> u8 {
        self.oam.get(offset as usize).copied().unwrap_or(0xFF)
    }

    /// OAM write with no access checks; used by the CPU path and DMA.
    pub(crate) fn write_oam_direct(&mut self, offset: u8, value: u8) {
        if let Some(slot) = self.oam.get_mut(offset as usize) {
            *slot = value;
        }
    }

    /// Advance by one dot.
    pub(crate) fn tick(&mut self, if_reg: &mut u8) {
        if !self.lcd_enabled() {
            return;
        }

        self.dot += 1;
        match self.mode {
            Mode::OamScan => {
                if self.dot == OAM_SCAN_DOTS {
                    self.scan_oam();
                    self.begin_drawing();
                }
            }
            Mode::Drawing => {
                self.draw_dot();
                if self.pushed_x as usize == SCREEN_WIDTH {
                    self.enter_hblank(if_reg);
                }
            }
            Mode::HBlank | Mode::VBlank => {}
        }

        if self.dot >= DOTS_PER_LINE {
            self.dot = 0;
            self.next_line(if_reg);
        }
    }

    fn clear_line_state(&mut self) {
        self.bg_fifo.clear();
        self.sprite_line = [None; SCREEN_WIDTH];
        self.fetcher.restart(false);
        self.pushed_x = 0;
        self.discard = 0;
        self.window_active = false;
        self.window_drawn = false;
    }

    fn begin_drawing(&mut self) {
        if self.ly == self.wy {
            self.window_y_triggered = true;
        }
        self.clear_line_state();
        self.discard = self.scx % 8;
        self.mode = Mode::Drawing;
    }

    fn draw_dot(&mut self) {
        self.check_window_start();
        self.step_fetcher();

        let Some(bg) = self.bg_fifo.pop_front() else {
            return;
        };
        if self.discard > 0 {
            self.discard -= 1;
            return;
        }
        self.fetch_due_sprites();
        self.output_pixel(bg);
    }

    /// Switch the fetcher to the window once column `WX - 7` is next.
    fn check_window_start(&mut self) {
        if self.window_active
            || !self.window_y_triggered
            || !self.lcdc.contains(Lcdc::WINDOW_ENABLE)
            || !self.lcdc.contains(Lcdc::BG_WINDOW_ENABLE)
            || self.wx > 166
        {
            return;
        }
        if (self.pushed_x as u16) + 7 < self.wx as u16 {
            return;
        }

        self.window_active = true;
        self.window_drawn = true;
        self.bg_fifo.clear();
        self.fetcher.restart(true);
        // WX < 7 starts the window left of the screen.
        self.discard = 7u8.saturating_sub(self.wx);
    }

    fn output_pixel(&mut self, bg: u8) {
        let x = self.pushed_x as usize;
        let shade = match self.sprite_line[x] {
            Some(pixel) if bg == 0 || !pixel.behind_bg => {
                let palette = if pixel.obp1 { self.obp1 } else { self.obp0 };
                palette_shade(palette, pixel.color)
            }
            _ => palette_shade(self.bgp, bg),
        };

        let offset = (self.ly as usize * SCREEN_WIDTH + x) * Color::BYTES;
        if let Some(dst) = self.back.get_mut(offset..offset + Color::BYTES) {
            dst.copy_from_slice(&SHADES[shade as usize].to_bytes());
        }
        self.pushed_x += 1;
    }

    fn enter_hblank(&mut self, if_reg: &mut u8) {
        self.mode = Mode::HBlank;
        if self.window_drawn {
            self.window_line = self.window_line.wrapping_add(1);
        }
        self.bg_fifo.clear();
        if self.coincidence {
            self.request_stat(if_reg, Stat::LYC);
        }
        self.request_stat(if_reg, Stat::HBLANK);
    }

    fn next_line(&mut self, if_reg: &mut u8) {
        match self.mode {
            Mode::VBlank if self.ly + 1 >= LINES_PER_FRAME => {
                self.set_ly(0);
                self.window_line = 0;
                self.window_y_triggered = false;
                self.enter_oam_scan(if_reg);
            }
            Mode::VBlank => {
                self.set_ly(self.ly + 1);
                if self.coincidence {
                    self.request_stat(if_reg, Stat::LYC);
                }
            }
            _ => {
                self.set_ly(self.ly + 1);
                if self.ly >= VBLANK_START {
                    self.enter_vblank(if_reg);
                } else {
                    self.enter_oam_scan(if_reg);
                }
            }
        }
    }

    fn enter_oam_scan(&mut self, if_reg: &mut u8) {
        self.mode = Mode::OamScan;
        self.request_stat(if_reg, Stat::OAM_SCAN);
    }

    fn enter_vblank(&mut self, if_reg: &mut u8) {
        self.mode = Mode::VBlank;
        *if_reg |= Interrupt::VBLANK.bits();
        self.request_stat(if_reg, Stat::VBLANK);
        if self.coincidence {
            self.request_stat(if_reg, Stat::LYC);
        }

        std::mem::swap(&mut self.front, &mut self.back);
        self.frames += 1;
        log::trace!("frame {} complete", self.frames);
    }

    fn set_ly(&mut self, ly: u8) {
        self.ly = ly;
        self.coincidence = self.ly == self.lyc;
    }

    fn request_stat(&self, if_reg: &mut u8, source: Stat) {
        if self.stat.contains(source) {
            log::debug!("STAT interrupt {:?} at LY={}", source, self.ly);
            *if_reg |= Interrupt::STAT.bits();
        }
    }
}

/// Map a 2-bit colour index through a palette register.
#[inline]
fn palette_shade(palette: u8, index: u8) -> u8 {
    (palette >> (index * 2)) & 0x03
}

#[cfg(test)]
mod tests;
