use std::{
    io::{
        self,
        Write,
    },
    path::PathBuf,
};

use anyhow::Result;
use clap::Parser;
use d5700::RomError;
use log::LevelFilter;
use simple_logger::SimpleLogger;

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "d5700", about = "Emulator for the D5700 8-register CPU", long_about = None)]
struct Args {
    /// ROM image to run; prompted for when omitted.
    rom: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Don't draw the screen to the terminal.
    #[arg(long)]
    headless: bool,
}

fn prompt_for_rom() -> Result<Option<PathBuf>> {
    println!("Welcome to the D5700 Emulator.");
    print!("Enter the path to the ROM file: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let path = line.trim();

    Ok((!path.is_empty()).then(|| PathBuf::from(path)))
}

fn main() -> Result<()> {
    let args = Args::parse();
    SimpleLogger::new().with_level(args.log_level.into()).init()?;

    let path = match args.rom {
        Some(path) => path,
        None => match prompt_for_rom()? {
            Some(path) => path,
            None => {
                println!("No path entered.");
                return Ok(());
            }
        },
    };

    if let Err(err) = d5700::run(&path, args.headless) {
        if err.downcast_ref::<RomError>().is_some() {
            println!("Please enter correct filepath.");
        }
        return Err(err);
    }

    Ok(())
}
