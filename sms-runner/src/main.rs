//! Headless Sega Master System runner.
//!
//! Loads a ROM (and a BIOS when one is found), then runs the machine
//! for a number of frames. Presentation is left to other frontends;
//! this binary exists to boot software and surface core errors.

use std::path::{Path, PathBuf};
use std::process;

use machine_sms::{Sms, SmsConfig};

/// Fixed relative path the BIOS is searched at when none is given.
const DEFAULT_BIOS_PATH: &str = "bios13fx.sms";

struct CliArgs {
    rom_path: PathBuf,
    bios_path: Option<PathBuf>,
    frames: u32,
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <rom.sms> [--bios <file>] [--frames <n>]");
    process::exit(1);
}

fn parse_args() -> CliArgs {
    let argv: Vec<String> = std::env::args().collect();
    let program = argv.first().map_or("sms-runner", |s| s.as_str());

    let mut rom_path = None;
    let mut bios_path = None;
    let mut frames = 600;

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--bios" => {
                i += 1;
                let Some(path) = argv.get(i) else {
                    usage(program);
                };
                bios_path = Some(PathBuf::from(path));
            }
            "--frames" => {
                i += 1;
                let Some(n) = argv.get(i).and_then(|s| s.parse().ok()) else {
                    usage(program);
                };
                frames = n;
            }
            arg if !arg.starts_with('-') && rom_path.is_none() => {
                rom_path = Some(PathBuf::from(arg));
            }
            _ => usage(program),
        }
        i += 1;
    }

    let Some(rom_path) = rom_path else {
        usage(program);
    };
    CliArgs {
        rom_path,
        bios_path,
        frames,
    }
}

/// The BIOS is optional: without it the bus just never sees a BIOS
/// contribution.
fn load_bios(explicit: Option<&Path>) -> Option<Vec<u8>> {
    let path = explicit.unwrap_or(Path::new(DEFAULT_BIOS_PATH));
    match std::fs::read(path) {
        Ok(data) => {
            log::info!("loaded bios from {}", path.display());
            Some(data)
        }
        Err(err) => {
            log::info!("no bios at {}: {err}", path.display());
            None
        }
    }
}

fn main() {
    env_logger::init();
    let args = parse_args();

    let rom = match std::fs::read(&args.rom_path) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("failed to read {}: {err}", args.rom_path.display());
            process::exit(1);
        }
    };
    let bios = load_bios(args.bios_path.as_deref());

    let mut sms = match Sms::new(SmsConfig { rom, bios }) {
        Ok(sms) => sms,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    for frame in 0..args.frames {
        if let Err(err) = sms.run_frame() {
            eprintln!("frame {frame}: {err}");
            process::exit(1);
        }
    }
    log::info!("ran {} frames", args.frames);
}
