use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use super::bus::DMA_LENGTH;
use super::cartridge::compute_header_checksum;
use super::*;
use crate::cpu::Flag;
use crate::error::{Error, Result};
use crate::GameBoyConfig;

/// ROM image of `0x8000 << rom_code` bytes. Every byte outside the header
/// holds its bank number, so bank switches are visible at any address.
fn rom(cart_type: u8, rom_code: u8, ram_code: u8, title: &[u8]) -> Vec<u8> {
    let size = 0x8000usize << rom_code;
    let mut rom: Vec<u8> = (0..size).map(|i| (i / 0x4000) as u8).collect();
    rom[0x100..0x150].fill(0);
    rom[0x134..0x134 + title.len()].copy_from_slice(title);
    rom[0x147] = cart_type;
    rom[0x148] = rom_code;
    rom[0x149] = ram_code;
    rom[0x14D] = compute_header_checksum(&rom);
    rom
}

/// Plain 32 KiB cartridge whose program area is all NOPs.
fn nop_rom() -> Vec<u8> {
    let mut rom = rom(0x00, 0x00, 0x00, b"NOPS");
    rom[0x150..].fill(0);
    rom
}

fn in_memory_machine() -> GameBoy {
    GameBoy::with_config(GameBoyConfig::builder().persist_saves(false).build())
}

fn running(rom: &[u8]) -> GameBoy {
    let mut gb = in_memory_machine();
    gb.load_rom(rom).unwrap();
    gb
}

/// Storage whose contents stay visible to the test after the cartridge
/// takes ownership of it.
#[derive(Clone, Default)]
struct SharedStorage {
    data: Rc<RefCell<Option<Vec<u8>>>>,
    stores: Rc<RefCell<usize>>,
}

impl SaveStorage for SharedStorage {
    fn load(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.data.borrow().clone())
    }

    fn store(&mut self, data: &[u8]) -> Result<()> {
        *self.data.borrow_mut() = Some(data.to_vec());
        *self.stores.borrow_mut() += 1;
        Ok(())
    }
}

struct FailingStorage;

impl SaveStorage for FailingStorage {
    fn load(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn store(&mut self, _data: &[u8]) -> Result<()> {
        Err(Error::Save {
            path: PathBuf::from("full.sav"),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        })
    }
}

#[test]
fn new_machine_idles_until_a_rom_is_loaded() {
    let mut gb = GameBoy::new();
    assert!(!gb.is_running());
    gb.update_frame().unwrap();
    assert_eq!(gb.ticks(), 0);
    assert_eq!(gb.frame_count(), 0);
    // Cartridge space floats high when empty.
    assert_eq!(gb.read(0x0100), 0xFF);
    assert_eq!(gb.read(0xA000), 0xFF);
}

#[test]
fn post_boot_registers_are_visible_in_snapshot() {
    let gb = running(&nop_rom());
    let regs = gb.registers();
    assert_eq!(regs.af, 0x01B0);
    assert_eq!(regs.bc, 0x0013);
    assert_eq!(regs.de, 0x00D8);
    assert_eq!(regs.hl, 0x014D);
    assert_eq!(regs.sp, 0xFFFE);
    assert_eq!(regs.pc, 0x0100);
    assert!(regs.flag(Flag::Z));
    assert!(!regs.flag(Flag::N));
    assert!(regs.flag(Flag::H));
    assert!(regs.flag(Flag::C));
    assert!(!regs.ime);
}

#[test]
fn mbc0_maps_rom_directly_and_provides_8k_ram() {
    let image = rom(0x00, 0x00, 0x00, b"PLAIN");
    let mut gb = running(&image);

    for addr in (0x0000..0x8000).step_by(0x123) {
        assert_eq!(gb.read(addr as u16), image[addr], "addr 0x{:04X}", addr);
    }
    assert_eq!(gb.read(0x7FFF), 1);

    // ROM is read-only.
    gb.write(0x4000, 0x55);
    assert_eq!(gb.read(0x4000), 1);

    assert_eq!(gb.read(0xA000), 0);
    assert_eq!(gb.read(0xBFFF), 0);
    gb.write(0xBFFF, 0x99);
    assert_eq!(gb.read(0xBFFF), 0x99);
}

#[test]
fn cpu_runs_from_cartridge_one_m_cycle_per_four_ticks() {
    let mut image = nop_rom();
    // LD A,$42; INC B
    image[0x100..0x103].copy_from_slice(&[0x3E, 0x42, 0x04]);
    let mut gb = running(&image);

    assert_eq!(gb.disassemble(0x0100), ("LD A, $42".to_string(), 2));

    for _ in 0..12 {
        gb.clock();
    }
    let regs = gb.registers();
    assert_eq!(regs.af >> 8, 0x42);
    assert_eq!(regs.bc >> 8, 0x01);
    assert_eq!(regs.pc, 0x0103);
    assert_eq!(gb.ticks(), 12);
}

#[test]
fn mbc1_bank_zero_write_selects_bank_one() {
    // 128 KiB, 8 banks.
    let mut gb = running(&rom(0x01, 0x02, 0x00, b"MBC1"));

    assert_eq!(gb.read(0x4000), 1);
    gb.write(0x2000, 0x00);
    assert_eq!(gb.read(0x4000), 1);
    gb.write(0x2000, 0x05);
    assert_eq!(gb.read(0x4000), 5);
    assert_eq!(gb.read(0x7FFF), 5);
    // Bank 0 area is fixed.
    assert_eq!(gb.read(0x3FFF), 0);
    // Bank numbers wrap to the ROM size.
    gb.write(0x2000, 0x0B);
    assert_eq!(gb.read(0x4000), 3);
}

#[test]
fn mbc1_ram_needs_enable() {
    let mut gb = running(&rom(0x02, 0x00, 0x02, b"MBC1RAM"));

    gb.write(0xA000, 0x12);
    assert_eq!(gb.read(0xA000), 0xFF);

    gb.write(0x0000, 0x0A);
    gb.write(0xA000, 0x12);
    assert_eq!(gb.read(0xA000), 0x12);

    gb.write(0x0000, 0x00);
    assert_eq!(gb.read(0xA000), 0xFF);
}

#[test]
fn mbc2_ram_stores_nibbles_and_aliases() {
    let mut gb = running(&rom(0x05, 0x01, 0x00, b"MBC2"));

    gb.write(0x0000, 0x0A);
    gb.write(0xA000, 0xAB);
    assert_eq!(gb.read(0xA000), 0xFB);
    assert_eq!(gb.read(0xA200), 0xFB);
    assert_eq!(gb.read(0xBE00), 0xFB);

    // Bit 8 set: ROM bank register.
    gb.write(0x2100, 0x03);
    assert_eq!(gb.read(0x4000), 3);
}

#[test]
fn mbc3_switches_ram_banks_and_exposes_rtc() {
    let mut gb = running(&rom(0x10, 0x02, 0x03, b"MBC3"));
    gb.write(0x0000, 0x0A);

    gb.write(0x4000, 0x02);
    gb.write(0xA000, 0x22);
    gb.write(0x4000, 0x00);
    assert_eq!(gb.read(0xA000), 0x00);
    gb.write(0x4000, 0x02);
    assert_eq!(gb.read(0xA000), 0x22);

    // Halt the clock, then set seconds.
    gb.write(0x4000, 0x0C);
    gb.write(0xA000, 0x40);
    gb.write(0x4000, 0x08);
    gb.write(0xA000, 30);

    gb.write(0x6000, 0x00);
    gb.write(0x6000, 0x01);
    assert_eq!(gb.read(0xA000), 30);
    gb.write(0x4000, 0x0C);
    assert_eq!(gb.read(0xA000), 0x40);

    gb.write(0x2000, 0x06);
    assert_eq!(gb.read(0x4000), 6);
}

#[test]
fn battery_ram_persists_on_write_and_restores_on_load() {
    let storage = SharedStorage::default();
    let image = rom(0x03, 0x00, 0x02, b"BATTERY");

    let mut gb = in_memory_machine();
    gb.load_rom_with_storage(&image, Box::new(storage.clone()))
        .unwrap();
    gb.write(0x0000, 0x0A);
    gb.write(0xA010, 0x5A);
    assert_eq!(*storage.stores.borrow(), 1);
    // Unchanged bytes do not hit the medium.
    gb.write(0xA010, 0x5A);
    assert_eq!(*storage.stores.borrow(), 1);

    let saved = storage.data.borrow().clone().unwrap();
    assert_eq!(saved.len(), 0x2000);
    assert_eq!(saved[0x10], 0x5A);

    let mut gb = in_memory_machine();
    gb.load_rom_with_storage(&image, Box::new(storage.clone()))
        .unwrap();
    gb.write(0x0000, 0x0A);
    assert_eq!(gb.read(0xA010), 0x5A);
}

#[test]
fn battery_save_goes_to_title_file_in_save_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = GameBoyConfig::builder().save_dir(dir.path()).build();
    let image = rom(0x03, 0x00, 0x02, b"ZELDA");
    let path = dir.path().join("ZELDA.sav");

    {
        let mut gb = GameBoy::with_config(config.clone());
        gb.load_rom(&image).unwrap();
        gb.write(0x0000, 0x0A);
        gb.write(0xA000, 0x77);
        assert!(path.exists());
    }

    let saved = std::fs::read(&path).unwrap();
    assert_eq!(saved.len(), 0x2000);
    assert_eq!(saved[0], 0x77);

    let mut gb = GameBoy::with_config(config);
    gb.load_rom(&image).unwrap();
    gb.write(0x0000, 0x0A);
    assert_eq!(gb.read(0xA000), 0x77);
}

#[test]
fn carts_without_battery_never_touch_storage() {
    let storage = SharedStorage::default();
    let mut gb = in_memory_machine();
    gb.load_rom_with_storage(&rom(0x02, 0x00, 0x02, b"NOBATT"), Box::new(storage.clone()))
        .unwrap();
    gb.write(0x0000, 0x0A);
    gb.write(0xA000, 0x01);
    gb.save().unwrap();
    drop(gb);

    assert_eq!(*storage.stores.borrow(), 0);
}

#[test]
fn failed_save_is_reported_by_the_next_frame() {
    let mut gb = in_memory_machine();
    gb.load_rom_with_storage(&rom(0x03, 0x00, 0x02, b"FAIL"), Box::new(FailingStorage))
        .unwrap();
    gb.write(0x0000, 0x0A);
    gb.write(0xA000, 0x01);

    assert!(matches!(gb.update_frame(), Err(Error::Save { .. })));
    // Reported once; emulation carries on.
    gb.update_frame().unwrap();
    assert_eq!(gb.frame_count(), 2);
}

#[test]
fn load_errors_leave_the_machine_untouched() {
    let mut gb = GameBoy::new();
    assert!(matches!(
        gb.load_rom(&[0u8; 0x100]),
        Err(Error::RomTooSmall { len: 0x100 })
    ));
    assert!(!gb.is_running());

    let mut gb = running(&rom(0x01, 0x01, 0x00, b"FIRST"));
    gb.write(0x2000, 0x03);

    let mut truncated = rom(0x00, 0x01, 0x00, b"SECOND");
    truncated.truncate(0x8000);
    assert!(matches!(
        gb.load_rom(&truncated),
        Err(Error::RomTruncated {
            declared: 0x10000,
            actual: 0x8000
        })
    ));
    assert!(matches!(
        gb.load_rom(&rom(0x19, 0x00, 0x00, b"MBC5")),
        Err(Error::UnsupportedCartridge(0x19))
    ));

    assert!(gb.is_running());
    assert_eq!(gb.header().map(|h| h.title.as_str()), Some("FIRST"));
    assert_eq!(gb.read(0x4000), 3);
}

#[test]
fn missing_rom_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut gb = GameBoy::new();
    assert!(matches!(
        gb.load_rom_file(dir.path().join("missing.gb")),
        Err(Error::Io { .. })
    ));
}

#[test]
fn reset_keeps_cartridge_ram() {
    let mut gb = running(&rom(0x00, 0x00, 0x00, b"RESET"));
    gb.write(0xA000, 0x42);
    gb.write(0xC000, 0x42);
    for _ in 0..100 {
        gb.clock();
    }

    gb.reset();
    assert_eq!(gb.ticks(), 0);
    assert_eq!(gb.registers().pc, 0x0100);
    assert_eq!(gb.read(0xA000), 0x42);
    assert_eq!(gb.read(0xC000), 0x00);
    assert!(gb.is_running());
}

#[test]
fn oam_dma_copies_160_bytes_and_blocks_video_memory() {
    let mut gb = running(&nop_rom());
    for i in 0..DMA_LENGTH as u16 {
        gb.write(0xC000 + i, i as u8);
    }
    gb.write(0x8000, 0x33);

    gb.write(0xFF46, 0xC0);
    assert_eq!(gb.read(0xFF46), 0xC0);
    assert_eq!(gb.read(0xFE00), 0xFF);
    assert_eq!(gb.read(0x8000), 0xFF);
    // Writes to blocked regions are dropped.
    gb.write(0x8000, 0x44);
    // WRAM and HRAM stay reachable.
    assert_eq!(gb.read(0xC001), 1);

    for _ in 0..DMA_LENGTH - 1 {
        gb.clock();
    }
    assert_eq!(gb.read(0xFE00), 0xFF);

    gb.clock();
    assert_eq!(gb.read(0x8000), 0x33);
    for i in 0..DMA_LENGTH as u16 {
        assert_eq!(gb.read(0xFE00 + i), i as u8);
    }
}

#[test]
fn oam_dma_from_echo_page_reads_wram() {
    let mut gb = running(&nop_rom());
    gb.write(0xC005, 0xAB);
    gb.write(0xFF46, 0xE0);
    for _ in 0..DMA_LENGTH {
        gb.clock();
    }
    assert_eq!(gb.read(0xFE05), 0xAB);
}

#[test]
fn one_frame_raises_vblank_and_publishes_a_frame() {
    let mut gb = running(&nop_rom());
    gb.write(0xFF0F, 0x00);

    gb.update_frame().unwrap();
    assert_eq!(gb.ticks(), CLOCKS_PER_FRAME as u64);
    assert_eq!(gb.frame_count(), 1);
    assert_eq!(gb.read(0xFF0F) & 0x01, 0x01);
    assert_eq!(gb.framebuffer().len(), 160 * 144 * 4);
}

#[test]
fn joypad_press_raises_interrupt_and_reads_active_low() {
    let mut gb = running(&nop_rom());
    gb.write(0xFF0F, 0x00);

    gb.set_button(Button::Start, true);
    assert_eq!(gb.read(0xFF0F) & 0x10, 0x10);

    gb.write(0xFF00, 0x10);
    assert_eq!(gb.read(0xFF00), 0xD7);

    gb.write(0xFF0F, 0x00);
    gb.set_button(Button::Start, false);
    assert_eq!(gb.read(0xFF0F) & 0x10, 0x00);
    assert_eq!(gb.read(0xFF00), 0xDF);
}

#[test]
fn serial_transfer_collects_output() {
    let mut gb = running(&nop_rom());
    gb.write(0xFF0F, 0x00);
    for &b in b"ok" {
        gb.write(0xFF01, b);
        gb.write(0xFF02, 0x81);
    }
    assert_eq!(gb.serial_output(), b"ok");
    assert_eq!(gb.read(0xFF0F) & 0x08, 0x08);
}

#[test]
fn taking_serial_output_drains_the_capture() {
    let mut gb = running(&nop_rom());
    gb.write(0xFF01, b'a');
    gb.write(0xFF02, 0x81);
    assert_eq!(gb.take_serial_output(), b"a");
    assert!(gb.serial_output().is_empty());

    gb.write(0xFF01, b'b');
    gb.write(0xFF02, 0x81);
    assert_eq!(gb.take_serial_output(), b"b");
}

#[test]
fn config_is_kept_by_the_machine() {
    let gb = GameBoy::with_config(
        GameBoyConfig::builder()
            .save_dir("saves")
            .persist_saves(false)
            .build(),
    );
    assert_eq!(gb.config().save_dir, PathBuf::from("saves"));
    assert!(!gb.config().persist_saves);
}

#[test]
fn echo_ram_mirrors_work_ram() {
    let mut gb = GameBoy::new();
    gb.write(0xC123, 0x77);
    assert_eq!(gb.read(0xE123), 0x77);
    gb.write(0xFDFF, 0x11);
    assert_eq!(gb.read(0xDDFF), 0x11);
}

#[test]
fn unusable_region_reads_zero_and_ignores_writes() {
    let mut gb = GameBoy::new();
    gb.write(0xFEA0, 0x12);
    assert_eq!(gb.read(0xFEA0), 0x00);
    assert_eq!(gb.read(0xFEFF), 0x00);
}

#[test]
fn interrupt_registers_mask_unused_bits() {
    let mut gb = GameBoy::new();
    gb.write(0xFF0F, 0x00);
    assert_eq!(gb.read(0xFF0F), 0xE0);
    gb.write(0xFF0F, 0xFF);
    assert_eq!(gb.read(0xFF0F), 0xFF);

    gb.write(0xFFFF, 0x1F);
    assert_eq!(gb.read(0xFFFF), 0x1F);
    gb.write16(0xFF80, 0xBEEF);
    assert_eq!(gb.read16(0xFF80), 0xBEEF);
}
