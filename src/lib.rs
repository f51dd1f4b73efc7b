use std::{
    path::Path,
    sync::{
        Mutex,
        MutexGuard,
        PoisonError,
    },
};

use anyhow::Error;

pub mod clock;
pub mod constants;
pub mod cpu;
pub mod display;
pub mod emulator;
pub mod instruction;
pub mod keyboard;
pub mod mem;
pub mod process;
pub mod timer;

pub use cpu::{
    Cpu,
    CpuError,
    Step,
};
pub use emulator::Emulator;
pub use mem::{
    Bank,
    Memory,
    RomError,
};

/// Loads the ROM at `path`, runs it and returns once the CPU has halted or faulted.
pub fn run(path: &Path, headless: bool) -> Result<(), Error> {
    let keyboard = keyboard::ConsoleKeyboard::stdio();
    let mut emulator = if headless {
        Emulator::new(display::Headless::default(), keyboard)
    } else {
        Emulator::new(display::TermRender::stdout(), keyboard)
    };

    emulator.load_program(path)?;
    emulator.run()?;
    emulator.wait();

    Ok(())
}

/// A poisoned lock only means another step panicked; the machine state is still usable.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
