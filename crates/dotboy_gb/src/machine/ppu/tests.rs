use super::*;

fn run(ppu: &mut Ppu, dots: u32) -> u8 {
    let mut if_reg = 0;
    for _ in 0..dots {
        ppu.tick(&mut if_reg);
    }
    if_reg
}

fn run_frame(ppu: &mut Ppu) -> u8 {
    run(ppu, DOTS_PER_LINE as u32 * LINES_PER_FRAME as u32)
}

fn pixel(ppu: &Ppu, x: usize, y: usize) -> Color {
    let i = (y * SCREEN_WIDTH + x) * Color::BYTES;
    let b = &ppu.framebuffer()[i..i + Color::BYTES];
    Color::new_rgba(b[0], b[1], b[2], b[3])
}

fn fill_tile(ppu: &mut Ppu, tile_addr: u16, lo: u8, hi: u8) {
    for row in 0..8 {
        ppu.write_vram(tile_addr + row * 2, lo);
        ppu.write_vram(tile_addr + row * 2 + 1, hi);
    }
}

fn write_oam(ppu: &mut Ppu, index: u8, y: u8, x: u8, tile: u8, flags: u8) {
    let base = index * 4;
    ppu.write_oam_direct(base, y);
    ppu.write_oam_direct(base + 1, x);
    ppu.write_oam_direct(base + 2, tile);
    ppu.write_oam_direct(base + 3, flags);
}

#[test]
fn scanline_is_456_dots_and_frame_is_154_lines() {
    let mut ppu = Ppu::new();

    run(&mut ppu, 79);
    assert_eq!(ppu.mode(), Mode::OamScan);
    run(&mut ppu, 1);
    assert_eq!(ppu.mode(), Mode::Drawing);

    run(&mut ppu, 456 - 80 - 1);
    assert_eq!(ppu.ly(), 0);
    assert_eq!(ppu.mode(), Mode::HBlank);
    run(&mut ppu, 1);
    assert_eq!(ppu.ly(), 1);
    assert_eq!(ppu.mode(), Mode::OamScan);

    let if_reg = run(&mut ppu, 456 * 143);
    assert_eq!(ppu.ly(), 144);
    assert_eq!(ppu.mode(), Mode::VBlank);
    assert_eq!(if_reg & Interrupt::VBLANK.bits(), Interrupt::VBLANK.bits());
    assert_eq!(ppu.frame_count(), 1);

    run(&mut ppu, 456 * 9);
    assert_eq!(ppu.ly(), 153);
    run(&mut ppu, 456);
    assert_eq!(ppu.ly(), 0);
    assert_eq!(ppu.mode(), Mode::OamScan);
    assert_eq!(ppu.frame_count(), 1);
}

#[test]
fn pixel_transfer_without_scroll_or_sprites_takes_166_dots() {
    let mut ppu = Ppu::new();
    run(&mut ppu, 245);
    assert_eq!(ppu.mode(), Mode::Drawing);
    run(&mut ppu, 1);
    assert_eq!(ppu.mode(), Mode::HBlank);
}

#[test]
fn oam_scan_keeps_first_ten_sprites_in_oam_order_for_equal_x() {
    let mut ppu = Ppu::new();
    for i in 0..12 {
        write_oam(&mut ppu, i, 16, 50, i, 0);
    }
    run(&mut ppu, OAM_SCAN_DOTS as u32);

    let tiles: Vec<u8> = ppu.sprites.iter().map(|s| s.tile).collect();
    assert_eq!(tiles, (0..10).collect::<Vec<u8>>());
}

#[test]
fn lower_x_sprite_wins_overlapping_columns() {
    let mut ppu = Ppu::new();
    // LCD, BG on, sprites on, unsigned tile data.
    ppu.write_register(0xFF40, 0x93);
    ppu.write_register(0xFF47, 0xE4);
    ppu.write_register(0xFF48, 0xE4);
    fill_tile(&mut ppu, 0x8010, 0xFF, 0xFF); // colour 3
    fill_tile(&mut ppu, 0x8020, 0xFF, 0x00); // colour 1

    // Higher OAM priority but larger X: columns 12..=19.
    write_oam(&mut ppu, 0, 16, 20, 2, 0);
    // Columns 8..=15.
    write_oam(&mut ppu, 1, 16, 16, 1, 0);

    run_frame(&mut ppu);

    assert_eq!(pixel(&ppu, 5, 0), Color::WHITE);
    assert_eq!(pixel(&ppu, 9, 0), Color::BLACK);
    assert_eq!(pixel(&ppu, 14, 0), Color::BLACK);
    assert_eq!(pixel(&ppu, 18, 0), Color::LIGHT_GRAY);
    assert_eq!(pixel(&ppu, 14, 7), Color::BLACK);
    assert_eq!(pixel(&ppu, 14, 8), Color::WHITE);
}

#[test]
fn behind_bg_sprite_only_shows_over_colour_zero() {
    let mut ppu = Ppu::new();
    ppu.write_register(0xFF40, 0x93);
    ppu.write_register(0xFF47, 0xE4);
    // Sprite colour 3 maps to shade 1.
    ppu.write_register(0xFF48, 0x54);
    fill_tile(&mut ppu, 0x8010, 0xFF, 0xFF);
    // Only the first background tile is opaque.
    ppu.write_vram(0x9800, 1);

    write_oam(&mut ppu, 0, 16, 12, 1, 0x80);
    run_frame(&mut ppu);

    assert_eq!(pixel(&ppu, 5, 0), Color::BLACK);
    assert_eq!(pixel(&ppu, 9, 0), Color::LIGHT_GRAY);
}

fn tall_sprite_setup(flags: u8) -> Ppu {
    let mut ppu = Ppu::new();
    // As 0x93 plus 8x16 sprites.
    ppu.write_register(0xFF40, 0x97);
    ppu.write_register(0xFF47, 0xE4);
    ppu.write_register(0xFF48, 0xE4);
    fill_tile(&mut ppu, 0x8020, 0xFF, 0x00); // tile 2, colour 1
    fill_tile(&mut ppu, 0x8030, 0xFF, 0xFF); // tile 3, colour 3
    // Odd index: the top half still comes from tile 2.
    write_oam(&mut ppu, 0, 16, 16, 3, flags);
    run_frame(&mut ppu);
    ppu
}

#[test]
fn tall_sprite_ignores_low_bit_of_tile_index() {
    let ppu = tall_sprite_setup(0);

    assert_eq!(pixel(&ppu, 8, 0), Color::LIGHT_GRAY);
    assert_eq!(pixel(&ppu, 15, 7), Color::LIGHT_GRAY);
    assert_eq!(pixel(&ppu, 8, 8), Color::BLACK);
    assert_eq!(pixel(&ppu, 15, 15), Color::BLACK);
    assert_eq!(pixel(&ppu, 8, 16), Color::WHITE);
}

#[test]
fn y_flip_mirrors_the_whole_tall_sprite() {
    let ppu = tall_sprite_setup(0x40);

    assert_eq!(pixel(&ppu, 8, 0), Color::BLACK);
    assert_eq!(pixel(&ppu, 8, 7), Color::BLACK);
    assert_eq!(pixel(&ppu, 8, 8), Color::LIGHT_GRAY);
    assert_eq!(pixel(&ppu, 8, 15), Color::LIGHT_GRAY);
}

#[test]
fn x_flip_mirrors_sprite_columns() {
    let mut ppu = Ppu::new();
    ppu.write_register(0xFF40, 0x93);
    ppu.write_register(0xFF47, 0xE4);
    ppu.write_register(0xFF48, 0xE4);
    // Only the leftmost pixel of each row.
    fill_tile(&mut ppu, 0x8010, 0x80, 0x00);

    // Columns 8..=15, unflipped.
    write_oam(&mut ppu, 0, 16, 16, 1, 0);
    // Columns 40..=47, flipped.
    write_oam(&mut ppu, 1, 16, 48, 1, 0x20);
    run_frame(&mut ppu);

    assert_eq!(pixel(&ppu, 8, 0), Color::LIGHT_GRAY);
    assert_eq!(pixel(&ppu, 15, 0), Color::WHITE);
    assert_eq!(pixel(&ppu, 40, 0), Color::WHITE);
    assert_eq!(pixel(&ppu, 47, 0), Color::LIGHT_GRAY);
}

#[test]
fn palette_flag_selects_obp1() {
    let mut ppu = Ppu::new();
    ppu.write_register(0xFF40, 0x93);
    ppu.write_register(0xFF47, 0xE4);
    ppu.write_register(0xFF48, 0xE4);
    // Colour 3 maps to shade 1.
    ppu.write_register(0xFF49, 0x54);
    fill_tile(&mut ppu, 0x8010, 0xFF, 0xFF);

    write_oam(&mut ppu, 0, 16, 16, 1, 0x10);
    write_oam(&mut ppu, 1, 16, 48, 1, 0);
    run_frame(&mut ppu);

    assert_eq!(pixel(&ppu, 10, 0), Color::LIGHT_GRAY);
    assert_eq!(pixel(&ppu, 42, 0), Color::BLACK);
}

#[test]
fn signed_tile_data_is_addressed_around_0x9000() {
    let mut ppu = Ppu::new();
    // LCD, signed tile data, BG on.
    ppu.write_register(0xFF40, 0x81);
    ppu.write_register(0xFF47, 0xE4);
    // Unsigned tile 0, which must not be used.
    fill_tile(&mut ppu, 0x8000, 0xFF, 0xFF);
    fill_tile(&mut ppu, 0x9000, 0xFF, 0x00);
    // Tile 0x80 is -128: 0x9000 - 0x800.
    fill_tile(&mut ppu, 0x8800, 0x00, 0xFF);
    for i in 1..0x400 {
        ppu.write_vram(0x9800 + i, 0x80);
    }

    run_frame(&mut ppu);

    // Index 0 reads 0x9000, not 0x8000.
    assert_eq!(pixel(&ppu, 0, 0), Color::LIGHT_GRAY);
    assert_eq!(pixel(&ppu, 8, 0), Color::DARK_GRAY);
    assert_eq!(pixel(&ppu, 100, 50), Color::DARK_GRAY);
}

#[test]
fn window_rows_follow_their_own_line_counter() {
    let mut ppu = Ppu::new();
    ppu.write_register(0xFF40, 0xF1);
    ppu.write_register(0xFF47, 0xE4);
    // Tile 1: only row 0 is opaque.
    ppu.write_vram(0x8010, 0xFF);
    ppu.write_vram(0x8011, 0xFF);
    for i in 0..0x400 {
        ppu.write_vram(0x9C00 + i, 1);
    }
    ppu.write_register(0xFF4A, 10);
    ppu.write_register(0xFF4B, 7);

    run_frame(&mut ppu);

    assert_eq!(pixel(&ppu, 0, 9), Color::WHITE);
    // Window row 0 lands on LY == WY, not LY % 8.
    assert_eq!(pixel(&ppu, 0, 10), Color::BLACK);
    assert_eq!(pixel(&ppu, 0, 11), Color::WHITE);
    assert_eq!(pixel(&ppu, 159, 17), Color::WHITE);
    assert_eq!(pixel(&ppu, 0, 18), Color::BLACK);
    assert_eq!(pixel(&ppu, 80, 26), Color::BLACK);
}

#[test]
fn window_line_counter_pauses_while_window_is_hidden() {
    let mut ppu = Ppu::new();
    ppu.write_register(0xFF40, 0xF1);
    ppu.write_register(0xFF47, 0xE4);
    ppu.write_vram(0x8010, 0xFF);
    ppu.write_vram(0x8011, 0xFF);
    for i in 0..0x400 {
        ppu.write_vram(0x9C00 + i, 1);
    }
    ppu.write_register(0xFF4A, 10);
    ppu.write_register(0xFF4B, 7);

    run(&mut ppu, 456 * 12);
    // Window off for lines 12 and 13.
    ppu.write_register(0xFF40, 0xD1);
    run(&mut ppu, 456 * 2);
    ppu.write_register(0xFF40, 0xF1);
    run(&mut ppu, 456 * (LINES_PER_FRAME as u32 - 14));

    assert_eq!(pixel(&ppu, 0, 10), Color::BLACK);
    assert_eq!(pixel(&ppu, 0, 18), Color::WHITE);
    assert_eq!(pixel(&ppu, 0, 20), Color::BLACK);
}

#[test]
fn fine_scroll_x_discards_leading_pixels() {
    let mut ppu = Ppu::new();
    ppu.write_register(0xFF47, 0xE4);
    // Only pixel 3 of each tile row is set.
    fill_tile(&mut ppu, 0x8010, 0b0001_0000, 0x00);
    for i in 0..0x400 {
        ppu.write_vram(0x9800 + i, 1);
    }
    ppu.write_register(0xFF43, 3);

    run_frame(&mut ppu);

    assert_eq!(pixel(&ppu, 0, 0), Color::LIGHT_GRAY);
    assert_eq!(pixel(&ppu, 1, 0), Color::WHITE);
    assert_eq!(pixel(&ppu, 8, 0), Color::LIGHT_GRAY);
    assert_eq!(pixel(&ppu, 8, 100), Color::LIGHT_GRAY);
}

#[test]
fn window_covers_from_wx_minus_7_and_wy_down() {
    let mut ppu = Ppu::new();
    // LCD, window map 0x9C00, window on, unsigned data, BG on.
    ppu.write_register(0xFF40, 0xF1);
    ppu.write_register(0xFF47, 0xE4);
    fill_tile(&mut ppu, 0x8010, 0xFF, 0xFF);
    for i in 0..0x400 {
        ppu.write_vram(0x9C00 + i, 1);
    }
    ppu.write_register(0xFF4A, 10);
    ppu.write_register(0xFF4B, 87);

    run_frame(&mut ppu);

    assert_eq!(pixel(&ppu, 100, 9), Color::WHITE);
    assert_eq!(pixel(&ppu, 100, 10), Color::BLACK);
    assert_eq!(pixel(&ppu, 79, 50), Color::WHITE);
    assert_eq!(pixel(&ppu, 80, 50), Color::BLACK);
    assert_eq!(pixel(&ppu, 159, 143), Color::BLACK);
}

#[test]
fn lyc_match_raises_stat_at_end_of_pixel_transfer() {
    let mut ppu = Ppu::new();
    ppu.write_register(0xFF45, 2);
    ppu.write_register(0xFF41, 0x40);

    let if_reg = run(&mut ppu, 456 * 2 + 200);
    assert_eq!(if_reg, 0);
    // Coincidence is visible as soon as LY changes.
    assert_eq!(ppu.read_register(0xFF41), 0xC7);

    let if_reg = run(&mut ppu, 50);
    assert_eq!(if_reg, Interrupt::STAT.bits());
    assert_eq!(ppu.read_register(0xFF41), 0xC4);
}

#[test]
fn stat_and_ly_writes_are_masked() {
    let mut ppu = Ppu::new();
    ppu.write_register(0xFF41, 0xFF);
    assert_eq!(ppu.read_register(0xFF41), 0xFE);

    run(&mut ppu, 456);
    ppu.write_register(0xFF44, 0x42);
    assert_eq!(ppu.read_register(0xFF44), 1);
}

#[test]
fn lcd_off_idles_and_blanks_the_frame() {
    let mut ppu = Ppu::new();
    ppu.write_register(0xFF47, 0xFF);
    run_frame(&mut ppu);
    assert_eq!(pixel(&ppu, 0, 0), Color::BLACK);

    run(&mut ppu, 1000);
    ppu.write_register(0xFF40, 0x11);
    assert_eq!(ppu.ly(), 0);
    assert_eq!(ppu.read_register(0xFF41) & 0x03, 0);
    assert_eq!(pixel(&ppu, 0, 0), Color::WHITE);

    let if_reg = run(&mut ppu, 1000);
    assert_eq!(if_reg, 0);
    assert_eq!(ppu.ly(), 0);

    ppu.write_register(0xFF40, 0x91);
    assert_eq!(ppu.mode(), Mode::OamScan);
    run(&mut ppu, 456);
    assert_eq!(ppu.ly(), 1);
}
