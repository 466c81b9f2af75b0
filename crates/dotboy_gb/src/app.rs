use dotboy_common::app::App;
use dotboy_common::key::Key;

use crate::{Button, Error, GameBoy, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Runner-facing wrapper for the Game Boy machine.
///
/// Implements the shared `App` trait so a frontend can drive the emulator
/// one frame at a time and feed it key events.
#[derive(Default)]
pub struct GameBoyApp {
    pub gb: GameBoy,
    should_exit: bool,
    frame_counter: u64,
    last_pc: u16,
    pc_stagnant_frames: u32,
    /// First failure the `App` callbacks could not return.
    error: Option<Error>,
}

impl GameBoyApp {
    pub fn new(gb: GameBoy) -> Self {
        Self {
            gb,
            ..Self::default()
        }
    }

    /// Take the first error raised during `update` or `exit`, such as a
    /// battery save that could not be written.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    fn record(&mut self, result: crate::Result<()>) {
        if let Err(e) = result {
            log::error!("{}", e);
            if self.error.is_none() {
                self.error = Some(e);
            }
        }
    }
}

fn button_for(key: Key) -> Option<Button> {
    match key {
        Key::Right => Some(Button::Right),
        Key::Left => Some(Button::Left),
        Key::Up => Some(Button::Up),
        Key::Down => Some(Button::Down),
        Key::Z => Some(Button::A),
        Key::X => Some(Button::B),
        Key::Enter => Some(Button::Start),
        Key::Backspace => Some(Button::Select),
        _ => None,
    }
}

impl App for GameBoyApp {
    fn init(&mut self) {
        match self.gb.header() {
            Some(header) => log::info!("Game Boy init: '{}'", header.title),
            None => log::info!("Game Boy init: no cartridge"),
        }
        self.last_pc = self.gb.cpu.regs.pc;
    }

    fn update(&mut self, screen: &mut [u8]) {
        let result = self.gb.update_frame();
        self.record(result);

        let frame = self.gb.framebuffer();
        let len = frame.len().min(screen.len());
        screen[..len].copy_from_slice(&frame[..len]);

        self.frame_counter = self.frame_counter.wrapping_add(1);

        let regs = self.gb.registers();
        if regs.pc == self.last_pc {
            self.pc_stagnant_frames = self.pc_stagnant_frames.saturating_add(1);
        } else {
            self.pc_stagnant_frames = 0;
            self.last_pc = regs.pc;
        }

        if self.frame_counter == 1 || self.frame_counter % 60 == 0 {
            log::info!(
                "GB: frame={} pc=0x{:04X} sp=0x{:04X} af=0x{:04X} bc=0x{:04X} de=0x{:04X} hl=0x{:04X} ime={} halted={} locked={} IF=0x{:02X} IE=0x{:02X} LCDC=0x{:02X} STAT=0x{:02X} LY={}",
                self.frame_counter,
                regs.pc,
                regs.sp,
                regs.af,
                regs.bc,
                regs.de,
                regs.hl,
                regs.ime,
                regs.halted,
                self.gb.cpu.is_locked(),
                self.gb.read(0xFF0F),
                self.gb.read(0xFFFF),
                self.gb.read(0xFF40),
                self.gb.read(0xFF41),
                self.gb.read(0xFF44),
            );
        }

        if self.pc_stagnant_frames == 600 {
            log::warn!(
                "GB: PC unchanged for ~600 frames at 0x{:04X} (halted={} locked={})",
                regs.pc,
                regs.halted,
                self.gb.cpu.is_locked(),
            );
        }
    }

    fn handle_key_event(&mut self, key: Key, is_down: bool) {
        if key == Key::Escape && is_down {
            self.should_exit = true;
            return;
        }
        if let Some(button) = button_for(key) {
            self.gb.set_button(button, is_down);
        }
    }

    fn should_exit(&self) -> bool {
        self.should_exit
    }

    fn exit(&mut self) {
        let result = self.gb.save();
        self.record(result);
        log::info!("Game Boy exit after {} frames", self.frame_counter);
    }

    fn width(&self) -> u32 {
        SCREEN_WIDTH as u32
    }

    fn height(&self) -> u32 {
        SCREEN_HEIGHT as u32
    }

    fn title(&self) -> String {
        match self.gb.header() {
            Some(header) if !header.title.is_empty() => format!("DotBoy - {}", header.title),
            _ => "DotBoy".to_string(),
        }
    }
}
