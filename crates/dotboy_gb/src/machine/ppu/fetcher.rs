use super::{registers::Lcdc, Ppu};

/// Background/window fetcher steps. The first three take two dots each;
/// `Push` retries every dot until the FIFO has room.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum FetchPhase {
    TileIndex,
    DataLow,
    DataHigh,
    Push,
}

pub(super) struct Fetcher {
    phase: FetchPhase,
    /// Set on the first dot of a two-dot phase.
    half: bool,
    /// Tile column, counted from the start of the line (or window).
    tile_x: u8,
    tile: u8,
    low: u8,
    high: u8,
    pub(super) window: bool,
}

impl Fetcher {
    pub(super) fn new() -> Self {
        Self {
            phase: FetchPhase::TileIndex,
            half: false,
            tile_x: 0,
            tile: 0,
            low: 0,
            high: 0,
            window: false,
        }
    }

    pub(super) fn restart(&mut self, window: bool) {
        *self = Self::new();
        self.window = window;
    }
}

impl Ppu {
    /// Advance the fetcher by one dot.
    pub(super) fn step_fetcher(&mut self) {
        if self.fetcher.phase == FetchPhase::Push {
            if self.bg_fifo.len() <= 8 {
                self.push_tile_row();
                self.fetcher.tile_x = self.fetcher.tile_x.wrapping_add(1);
                self.fetcher.phase = FetchPhase::TileIndex;
            }
            return;
        }

        if !self.fetcher.half {
            self.fetcher.half = true;
            return;
        }
        self.fetcher.half = false;

        match self.fetcher.phase {
            FetchPhase::TileIndex => {
                self.fetcher.tile = self.vram_byte(self.tile_map_addr());
                self.fetcher.phase = FetchPhase::DataLow;
            }
            FetchPhase::DataLow => {
                self.fetcher.low = self.vram_byte(self.tile_row_addr());
                self.fetcher.phase = FetchPhase::DataHigh;
            }
            FetchPhase::DataHigh => {
                self.fetcher.high = self.vram_byte(self.tile_row_addr().wrapping_add(1));
                self.fetcher.phase = FetchPhase::Push;
            }
            FetchPhase::Push => {}
        }
    }

    /// Row within the 256x256 map being fetched.
    fn fetch_y(&self) -> u8 {
        if self.fetcher.window {
            self.window_line
        } else {
            self.ly.wrapping_add(self.scy)
        }
    }

    fn tile_map_addr(&self) -> u16 {
        let (select, column) = if self.fetcher.window {
            (Lcdc::WINDOW_TILE_MAP, self.fetcher.tile_x)
        } else {
            (Lcdc::BG_TILE_MAP, (self.scx / 8).wrapping_add(self.fetcher.tile_x))
        };
        let base: u16 = if self.lcdc.contains(select) { 0x9C00 } else { 0x9800 };
        let row = (self.fetch_y() / 8) as u16;
        base + row * 32 + (column & 0x1F) as u16
    }

    fn tile_row_addr(&self) -> u16 {
        let fine_y = (self.fetch_y() % 8) as u16;
        self.tile_data_addr(self.fetcher.tile) + fine_y * 2
    }

    /// Tile data base for `tile`: unsigned from 0x8000 or signed around 0x9000.
    fn tile_data_addr(&self, tile: u8) -> u16 {
        if self.lcdc.contains(Lcdc::TILE_DATA) {
            0x8000 + (tile as u16) * 16
        } else {
            (0x9000i32 + (tile as i8 as i32) * 16) as u16
        }
    }

    fn push_tile_row(&mut self) {
        let enabled = self.lcdc.contains(Lcdc::BG_WINDOW_ENABLE);
        for bit in (0..8).rev() {
            let lo = (self.fetcher.low >> bit) & 1;
            let hi = (self.fetcher.high >> bit) & 1;
            let index = if enabled { (hi << 1) | lo } else { 0 };
            self.bg_fifo.push_back(index);
        }
    }
}
