use std::{
    io,
    ops::ControlFlow,
    sync::{
        atomic::{
            AtomicBool,
            Ordering,
        },
        Arc,
        Mutex,
    },
};

use log::{
    error,
    info,
    trace,
};
use thiserror::Error;

use crate::{
    clock::Clock,
    constants,
    display::Screen,
    instruction::{
        DecodeError,
        Instruction,
    },
    keyboard::Keyboard,
    lock,
    mem::{
        Bank,
        Memory,
        MemoryError,
        RegisterError,
        RegisterFile,
    },
    process::{
        self,
        ProcessingError,
    },
    timer::Timer,
};

const HALT: u16 = 0x0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramCounter(u16);

impl ProgramCounter {
    pub fn new(value: u16) -> Self {
        Self(value)
    }

    pub fn inner(&self) -> &u16 {
        &self.0
    }

    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(2);
    }

    pub fn skip(&mut self) {
        self.0 = self.0.wrapping_add(4);
    }

    pub fn jump(&mut self, address: u16) {
        self.0 = address;
    }
}

/// Outcome of a successful step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Halted,
}

#[derive(Error, Debug)]
pub enum CpuError {
    #[error("program counter must be even. PC = {0}")]
    OddProgramCounter(u16),

    #[error("instruction fetch failed {source}")]
    Fetch {
        #[from]
        source: MemoryError,
    },

    #[error("{source}")]
    Decode {
        #[from]
        source: DecodeError,
    },

    #[error("{source}")]
    Processing {
        #[from]
        source: ProcessingError,
    },

    #[error("could not start clock {source}")]
    Spawn {
        #[from]
        source: io::Error,
    },
}

/// Everything a single fetch-decode-execute step reads or writes.
struct Core {
    registers: RegisterFile,
    pc: ProgramCounter,
    address: u16,
    bank: Bank,
    timer_mirror: u8,
    /// Bumped by every start, so a clock left over from an earlier run can tell it is stale.
    schedule: u64,
    memory: Arc<Mutex<Memory>>,
    screen: Arc<Mutex<Screen>>,
    timer: Arc<Timer>,
    keyboard: Box<dyn Keyboard>,
}

impl Core {
    fn step(&mut self) -> Result<Step, CpuError> {
        let pc = *self.pc.inner();
        if pc % 2 != 0 {
            return Err(CpuError::OddProgramCounter(pc));
        }

        let op_code = lock(&self.memory).op_code(&self.pc)?;
        if op_code == HALT {
            return Ok(Step::Halted);
        }

        let instruction = Instruction::decode(op_code)?;
        trace!("{pc:#05x}: {op_code:04x} {instruction}");

        if self.execute(instruction)? {
            self.pc.increment();
        }
        Ok(Step::Continue)
    }

    /// Runs one decoded instruction and reports whether the program counter should advance.
    fn execute(&mut self, instruction: Instruction) -> Result<bool, ProcessingError> {
        match instruction {
            Instruction::Store { x, value } => {
                process::op_0XNN(&mut self.registers, x, value)?;
            }
            Instruction::Add { x, y, z } => {
                process::op_1XYZ(&mut self.registers, x, y, z)?;
            }
            Instruction::Sub { x, y, z } => {
                process::op_2XYZ(&mut self.registers, x, y, z)?;
            }
            Instruction::Read { x } => {
                process::op_3X00(&mut self.registers, &lock(&self.memory), x, self.address, self.bank)?;
            }
            Instruction::Write { x } => {
                process::op_4X00(&self.registers, &mut lock(&self.memory), x, self.address, self.bank)?;
            }
            Instruction::Jump { address } => {
                process::op_5AAA(&mut self.pc, address)?;
                return Ok(false);
            }
            Instruction::ReadKeyboard { x } => {
                process::op_6X00(&mut self.registers, self.keyboard.as_mut(), x)?;
            }
            Instruction::SwitchMemory => {
                process::op_7000(&mut self.bank);
            }
            Instruction::SkipEqual { x, y } => {
                return process::op_8XY0(&self.registers, &mut self.pc, x, y);
            }
            Instruction::SkipNotEqual { x, y } => {
                return process::op_9XY0(&self.registers, &mut self.pc, x, y);
            }
            Instruction::SetAddress { address } => {
                process::op_AAAA(&mut self.address, address);
            }
            Instruction::SetTimer { value } => {
                process::op_BVV0(&mut self.timer_mirror, &self.timer, value);
            }
            Instruction::ReadTimer { x } => {
                process::op_CX00(&mut self.registers, &self.timer, x)?;
            }
            Instruction::ToBase10 { x } => {
                process::op_DX00(&self.registers, &mut lock(&self.memory), x, self.address, self.bank)?;
            }
            Instruction::ToAscii { x, y } => {
                process::op_EXY0(&mut self.registers, x, y)?;
            }
            Instruction::Draw { x, row, col } => {
                process::op_FXRC(&self.registers, &mut lock(&self.screen), x, row, col)?;
            }
        }

        Ok(true)
    }
}

/// The D5700 processor.
///
/// Memory, the screen and the timer are shared with whoever built the CPU; the register
/// file, program counter, address register, bank selector and timer mirror belong to it
/// alone. While started, a 500Hz clock thread runs [`Cpu::execute`]-equivalent steps; steps
/// are serialized on the core lock, so direct calls never interleave with scheduled ones.
pub struct Cpu {
    core: Arc<Mutex<Core>>,
    running: Arc<AtomicBool>,
    timer: Arc<Timer>,
    clock: Option<Clock>,
}

impl Cpu {
    pub fn new(
        memory: Arc<Mutex<Memory>>,
        screen: Arc<Mutex<Screen>>,
        timer: Arc<Timer>,
        keyboard: impl Keyboard + 'static,
    ) -> Self {
        let core = Core {
            registers: RegisterFile::new(),
            pc: ProgramCounter::new(0),
            address: 0,
            bank: Bank::default(),
            timer_mirror: 0,
            schedule: 0,
            memory,
            screen,
            timer: Arc::clone(&timer),
            keyboard: Box::new(keyboard),
        };

        Self {
            core: Arc::new(Mutex::new(core)),
            running: Arc::new(AtomicBool::new(false)),
            timer,
            clock: None,
        }
    }

    /// Resets the program counter, starts the timer and begins stepping at 500Hz. Calling it
    /// again replaces the running schedule.
    pub fn start(&mut self) -> Result<(), CpuError> {
        self.cancel_clock();
        info!("CPU started at {}Hz.", constants::INSTRUCTIONS_PER_SECOND);

        // Holding the core lock waits out a step still in flight on the old clock.
        let schedule = {
            let mut core = lock(&self.core);
            core.schedule = core.schedule.wrapping_add(1);
            core.pc = ProgramCounter::new(0);
            self.running.store(true, Ordering::SeqCst);
            if let Err(err) = self.timer.start() {
                halt(&self.running, &self.timer);
                return Err(err.into());
            }
            core.schedule
        };

        let shared = Arc::clone(&self.core);
        let running = Arc::clone(&self.running);
        let timer = Arc::clone(&self.timer);
        let clock = Clock::spawn("d5700-cpu", constants::INSTRUCTION_PERIOD, move || {
            let mut core = lock(&shared);
            if core.schedule != schedule || !running.load(Ordering::SeqCst) {
                return ControlFlow::Break(());
            }
            match cycle(&mut core, &running, &timer) {
                Ok(Step::Continue) => ControlFlow::Continue(()),
                _ => ControlFlow::Break(()),
            }
        });

        match clock {
            Ok(clock) => {
                self.clock = Some(clock);
                Ok(())
            }
            Err(err) => {
                halt(&self.running, &self.timer);
                Err(err.into())
            }
        }
    }

    /// One fetch-decode-execute step. Halting or failing stops the machine; the outcome is
    /// returned as well so a caller single-stepping can see what happened.
    pub fn execute(&mut self) -> Result<Step, CpuError> {
        let outcome = cycle(&mut lock(&self.core), &self.running, &self.timer);
        if !matches!(outcome, Ok(Step::Continue)) {
            self.cancel_clock();
        }
        outcome
    }

    pub fn stop(&mut self) {
        self.cancel_clock();
        halt(&self.running, &self.timer);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn register(&self, index: usize) -> Result<u8, RegisterError> {
        lock(&self.core).registers.get(index)
    }

    pub fn set_register(&mut self, index: usize, value: u8) -> Result<(), RegisterError> {
        lock(&self.core).registers.set(index, value)
    }

    pub fn program_counter(&self) -> u16 {
        *lock(&self.core).pc.inner()
    }

    pub fn set_program_counter(&mut self, value: u16) {
        lock(&self.core).pc.jump(value);
    }

    pub fn address(&self) -> u16 {
        lock(&self.core).address
    }

    pub fn set_address(&mut self, value: u16) {
        lock(&self.core).address = value;
    }

    pub fn bank(&self) -> Bank {
        lock(&self.core).bank
    }

    pub fn set_bank(&mut self, bank: Bank) {
        lock(&self.core).bank = bank;
    }

    pub fn timer(&self) -> u8 {
        lock(&self.core).timer_mirror
    }

    pub fn set_timer(&mut self, value: u8) {
        lock(&self.core).timer_mirror = value;
        self.timer.set(value);
    }

    fn cancel_clock(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.cancel();
        }
    }
}

impl Drop for Cpu {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Steps the locked core, stopping the machine before the lock is released if the step
/// halted or failed.
fn cycle(core: &mut Core, running: &AtomicBool, timer: &Timer) -> Result<Step, CpuError> {
    let outcome = core.step();
    match &outcome {
        Ok(Step::Continue) => {}
        Ok(Step::Halted) => {
            info!("program terminated (halt instruction 0000)");
            halt(running, timer);
        }
        Err(err) => {
            error!("CPU error: {err}");
            halt(running, timer);
        }
    }
    outcome
}

fn halt(running: &AtomicBool, timer: &Timer) {
    running.store(false, Ordering::SeqCst);
    timer.stop();
}
