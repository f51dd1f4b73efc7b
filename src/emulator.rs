use std::{
    path::Path,
    sync::{
        Arc,
        Mutex,
    },
    thread,
};

use crate::{
    constants,
    cpu::{
        Cpu,
        CpuError,
    },
    display::{
        Render,
        Screen,
    },
    keyboard::Keyboard,
    lock,
    mem::{
        Memory,
        Rom,
        RomError,
    },
    timer::Timer,
};

/// One complete machine: memory, screen, timer and the CPU wired to them.
pub struct Emulator {
    memory: Arc<Mutex<Memory>>,
    screen: Arc<Mutex<Screen>>,
    timer: Arc<Timer>,
    cpu: Cpu,
}

impl Emulator {
    pub fn new(render: impl Render + 'static, keyboard: impl Keyboard + 'static) -> Self {
        let memory = Arc::new(Mutex::new(Memory::new()));
        let screen = Arc::new(Mutex::new(Screen::new(render)));
        let timer = Arc::new(Timer::new());
        let cpu = Cpu::new(
            Arc::clone(&memory),
            Arc::clone(&screen),
            Arc::clone(&timer),
            keyboard,
        );

        Self {
            memory,
            screen,
            timer,
            cpu,
        }
    }

    pub fn load_program<P: AsRef<Path>>(&mut self, path: P) -> Result<(), RomError> {
        let rom = Rom::load(path)?;
        lock(&self.memory).load_rom(&rom)
    }

    pub fn load_bytes(&mut self, image: &[u8]) -> Result<(), RomError> {
        lock(&self.memory).load(image)
    }

    pub fn run(&mut self) -> Result<(), CpuError> {
        self.cpu.start()
    }

    pub fn stop(&mut self) {
        self.cpu.stop();
    }

    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }

    /// Blocks until the CPU halts, faults or is stopped.
    pub fn wait(&self) {
        while self.cpu.is_running() {
            thread::sleep(constants::INSTRUCTION_PERIOD);
        }
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn memory(&self) -> &Arc<Mutex<Memory>> {
        &self.memory
    }

    pub fn screen(&self) -> &Arc<Mutex<Screen>> {
        &self.screen
    }

    pub fn timer(&self) -> &Arc<Timer> {
        &self.timer
    }
}
