use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dotboy_common::app::App;
use dotboy_gb::{GameBoy, GameBoyApp, GameBoyConfig};
use typed_builder::TypedBuilder;

/// Options for a headless run.
#[derive(Clone, Debug, TypedBuilder)]
pub struct RunConfig {
    #[builder(setter(into))]
    pub rom_path: PathBuf,
    /// Frames to emulate before exiting.
    #[builder(default = 600)]
    pub frames: u32,
    /// Where battery saves go. Defaults to the ROM's directory.
    #[builder(default, setter(strip_option, into))]
    pub save_dir: Option<PathBuf>,
    /// Write the last frame here as raw RGBA.
    #[builder(default, setter(strip_option, into))]
    pub dump_path: Option<PathBuf>,
}

/// Load the ROM and drive it for `config.frames` frames, echoing serial
/// output to stdout.
pub fn run(config: &RunConfig) -> Result<()> {
    let save_dir = match &config.save_dir {
        Some(dir) => dir.clone(),
        None => config
            .rom_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let mut gb = GameBoy::with_config(GameBoyConfig::builder().save_dir(save_dir).build());
    gb.load_rom_file(&config.rom_path)
        .with_context(|| format!("loading '{}'", config.rom_path.display()))?;

    let mut app = GameBoyApp::new(gb);
    log::info!(
        "Running '{}' for {} frames, saves in '{}'",
        app.title(),
        config.frames,
        app.gb.config().save_dir.display()
    );
    app.init();

    let mut screen = vec![0u8; (app.width() * app.height() * 4) as usize];
    let mut stdout = std::io::stdout();
    for _ in 0..config.frames {
        if app.should_exit() {
            break;
        }
        app.update(&mut screen);

        let serial = app.gb.take_serial_output();
        if !serial.is_empty() {
            stdout.write_all(&serial).context("writing serial output")?;
            stdout.flush().context("writing serial output")?;
        }
    }
    let regs = app.gb.registers();
    log::info!(
        "Stopped after {} frames: pc=0x{:04X} sp=0x{:04X} af=0x{:04X} bc=0x{:04X} de=0x{:04X} hl=0x{:04X}",
        app.gb.frame_count(),
        regs.pc,
        regs.sp,
        regs.af,
        regs.bc,
        regs.de,
        regs.hl,
    );
    app.exit();

    if let Some(path) = &config.dump_path {
        fs::write(path, &screen)
            .with_context(|| format!("writing frame to '{}'", path.display()))?;
        log::info!(
            "Wrote {}x{} RGBA frame to '{}'",
            app.width(),
            app.height(),
            path.display()
        );
    }

    match app.take_error() {
        Some(e) => Err(e).context("persisting battery RAM"),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_frames_and_dumps_the_last_one() {
        let dir = tempfile::tempdir().unwrap();
        let rom_path = dir.path().join("blank.gb");
        // All-zero image: ROM-only cartridge running NOPs.
        fs::write(&rom_path, vec![0u8; 0x8000]).unwrap();
        let dump_path = dir.path().join("frame.rgba");

        let config = RunConfig::builder()
            .rom_path(&rom_path)
            .frames(3)
            .dump_path(&dump_path)
            .build();
        run(&config).unwrap();

        let frame = fs::read(&dump_path).unwrap();
        assert_eq!(frame.len(), 160 * 144 * 4);
    }

    #[test]
    fn unwritable_battery_save_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let rom_path = dir.path().join("battery.gb");
        // MBC1+RAM+BATTERY with 8 KiB of RAM.
        let mut rom = vec![0u8; 0x8000];
        rom[0x147] = 0x03;
        rom[0x149] = 0x02;
        fs::write(&rom_path, rom).unwrap();

        let config = RunConfig::builder()
            .rom_path(&rom_path)
            .frames(2)
            .save_dir(dir.path().join("missing"))
            .build();
        let err = run(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("persisting battery RAM"));
    }

    #[test]
    fn missing_rom_reports_context() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::builder()
            .rom_path(dir.path().join("none.gb"))
            .build();
        let err = run(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("loading"));
    }
}
