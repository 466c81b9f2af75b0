use bitflags::bitflags;

use super::{registers::Lcdc, Ppu, MAX_SPRITES_PER_LINE};
use crate::SCREEN_WIDTH;

bitflags! {
    /// OAM attribute byte.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub(super) struct SpriteFlags: u8 {
        const PALETTE = 0x10;
        const X_FLIP = 0x20;
        const Y_FLIP = 0x40;
        const BEHIND_BG = 0x80;
    }
}

/// One OAM entry selected for the current line.
#[derive(Clone, Copy, Debug)]
pub(super) struct Sprite {
    pub(super) y: u8,
    pub(super) x: u8,
    pub(super) tile: u8,
    pub(super) flags: SpriteFlags,
}

/// An opaque sprite pixel waiting for its screen column.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) struct SpritePixel {
    pub(super) color: u8,
    pub(super) obp1: bool,
    pub(super) behind_bg: bool,
}

impl Ppu {
    fn sprite_height(&self) -> u8 {
        if self.lcdc.contains(Lcdc::OBJ_SIZE) {
            16
        } else {
            8
        }
    }

    /// Collect up to ten sprites overlapping LY, ordered by X. The sort is
    /// stable so equal X keeps OAM order.
    pub(super) fn scan_oam(&mut self) {
        self.sprites.clear();
        self.next_sprite = 0;
        let height = self.sprite_height() as u16;
        let line = self.ly as u16 + 16;

        for entry in self.oam.chunks_exact(4) {
            if self.sprites.len() >= MAX_SPRITES_PER_LINE {
                break;
            }
            let y = entry[0] as u16;
            if line >= y && line < y + height {
                self.sprites.push(Sprite {
                    y: entry[0],
                    x: entry[1],
                    tile: entry[2],
                    flags: SpriteFlags::from_bits_truncate(entry[3]),
                });
            }
        }
        self.sprites.sort_by_key(|sprite| sprite.x);
    }

    /// Fetch every buffered sprite whose left edge the pipeline has reached.
    pub(super) fn fetch_due_sprites(&mut self) {
        while let Some(&sprite) = self.sprites.get(self.next_sprite) {
            if sprite.x as i16 - 8 > self.pushed_x as i16 {
                break;
            }
            self.next_sprite += 1;
            if self.lcdc.contains(Lcdc::OBJ_ENABLE) {
                self.fetch_sprite(sprite);
            }
        }
    }

    fn fetch_sprite(&mut self, sprite: Sprite) {
        let height = self.sprite_height();
        let mut row = self.ly.wrapping_add(16).wrapping_sub(sprite.y) % height;
        if sprite.flags.contains(SpriteFlags::Y_FLIP) {
            row = height - 1 - row;
        }
        let tile = if height == 16 {
            sprite.tile & 0xFE
        } else {
            sprite.tile
        };
        let addr = 0x8000 + (tile as u16) * 16 + (row as u16) * 2;
        let lo = self.vram_byte(addr);
        let hi = self.vram_byte(addr + 1);

        for i in 0..8u8 {
            let column = sprite.x as i16 - 8 + i as i16;
            if !(0..SCREEN_WIDTH as i16).contains(&column) {
                continue;
            }
            let bit = if sprite.flags.contains(SpriteFlags::X_FLIP) {
                i
            } else {
                7 - i
            };
            let color = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
            let slot = &mut self.sprite_line[column as usize];
            // Earlier sprites keep their opaque pixels.
            if color != 0 && slot.is_none() {
                *slot = Some(SpritePixel {
                    color,
                    obp1: sprite.flags.contains(SpriteFlags::PALETTE),
                    behind_bg: sprite.flags.contains(SpriteFlags::BEHIND_BG),
                });
            }
        }
    }
}
