use clap::{arg, command, value_parser, ArgAction};
use log::{error, LevelFilter};
use simple_logger::SimpleLogger;
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use chip8::config::{Config, Quirks};
use chip8::display::MonoTermDisplay;
use chip8::input::StdinInput;
use chip8::interpreter::{Chip8Interpreter, CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH};
use chip8::sound::{Mute, SimpleBeep, Sound};

fn main() -> Result<(), Box<dyn Error>> {
    let matches = command!()
        .arg(
            arg!(<rom> "CHIP-8 program image to run")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--ips <N> "Instructions to execute per second")
                .value_parser(value_parser!(u32))
                .default_value("700"),
        )
        .arg(arg!(--seed <SEED> "Seed for the random number generator").value_parser(value_parser!(u64)))
        .arg(arg!(--cycles <N> "Stop after this many cycles").value_parser(value_parser!(u64)))
        .arg(
            arg!(--"fix-key-up" "Make EXA1 skip when the key is up, not down")
                .action(ArgAction::SetTrue),
        )
        .arg(arg!(--beep "Buzz the PC speaker (needs access to the console)").action(ArgAction::SetTrue))
        .arg(
            arg!(--"log-level" <LEVEL> "How much to log")
                .value_parser(["off", "error", "warn", "info", "debug", "trace"])
                .default_value("error"),
        )
        .get_matches();

    let level = match matches.get_one::<String>("log-level").map(String::as_str) {
        Some("off") => LevelFilter::Off,
        Some("warn") => LevelFilter::Warn,
        Some("info") => LevelFilter::Info,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        _ => LevelFilter::Error,
    };
    SimpleLogger::new().with_level(level).init()?;

    let rom = matches
        .get_one::<PathBuf>("rom")
        .ok_or("no program given")?;
    let config = Config {
        instructions_per_second: *matches.get_one::<u32>("ips").unwrap_or(&700),
        seed: matches.get_one::<u64>("seed").copied(),
        max_cycles: matches.get_one::<u64>("cycles").copied(),
        quirks: Quirks {
            key_up_skip_checks_release: matches.get_flag("fix-key-up"),
        },
        ..Config::default()
    };

    // load the program before touching the terminal, so a bad path is readable
    let mut f = File::open(rom)?;

    // initialise
    let mut display = MonoTermDisplay::new(CHIP8_DISPLAY_WIDTH, CHIP8_DISPLAY_HEIGHT)?;
    let mut input = StdinInput::new()?;
    let mut beeper = SimpleBeep::new();
    let mut mute = Mute::new();
    let sound: &mut dyn Sound = if matches.get_flag("beep") {
        &mut beeper
    } else {
        &mut mute
    };

    let result = {
        let mut interpreter = Chip8Interpreter::with_config(&mut display, &mut input, sound, config)?;
        interpreter.load_program(&mut f)?;
        interpreter.main_loop()
    };

    // put the terminal back before saying anything
    drop(input);
    drop(display);
    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..CHIP8_DISPLAY_HEIGHT / 2 {
        println!();
    }

    match result {
        Err(e) if e.is_quit_request() => Ok(()),
        Err(e) => {
            error!("{}", e);
            Err(e.into())
        }
        Ok(()) => Ok(()),
    }
}
