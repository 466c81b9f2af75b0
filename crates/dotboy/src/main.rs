use anyhow::{bail, Context, Result};
use dotboy::RunConfig;

const USAGE: &str = "Usage: dotboy <rom_path> [frames] [dump_path]";

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(rom_path) = args.next() else {
        bail!("{}", USAGE);
    };
    let frames = match args.next() {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid frame count '{}'\n{}", arg, USAGE))?,
        None => 600,
    };

    log::info!("Playing ROM path: '{}'", rom_path);
    let config = match args.next() {
        Some(dump) => RunConfig::builder()
            .rom_path(rom_path)
            .frames(frames)
            .dump_path(dump)
            .build(),
        None => RunConfig::builder().rom_path(rom_path).frames(frames).build(),
    };
    dotboy::run(&config)
}
