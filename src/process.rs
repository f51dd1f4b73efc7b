#![allow(non_snake_case)]
use thiserror::Error;

use crate::{
    constants,
    cpu::ProgramCounter,
    display::{
        DisplayError,
        Screen,
    },
    keyboard::Keyboard,
    mem::{
        Bank,
        Memory,
        MemoryError,
        RegisterError,
        RegisterFile,
    },
    timer::Timer,
};

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("invalid register {source}")]
    RegisterError {
        #[from]
        source: RegisterError,
    },

    #[error("invalid memory address {source}")]
    AddressOutOfBounds {
        #[from]
        source: MemoryError,
    },

    #[error("display failed {source}")]
    DisplayError {
        #[from]
        source: DisplayError,
    },

    #[error("digit value must be 0-F, got: {0:x}")]
    InvalidDigit(u8),

    #[error("invalid draw parameters: char {char_code:#x}, row {row}, col {col}")]
    InvalidDrawParameters { char_code: u8, row: u8, col: u8 },

    #[error("jump address must be even: {0}")]
    OddJumpTarget(u16),
}

pub fn op_0XNN(registers: &mut RegisterFile, x: u8, nn: u8) -> Result<(), ProcessingError> {
    registers.set(x, nn)?;
    Ok(())
}

pub fn op_1XYZ(registers: &mut RegisterFile, x: u8, y: u8, z: u8) -> Result<(), ProcessingError> {
    let val = registers.get(x)?.wrapping_add(registers.get(y)?);
    registers.set(z, val)?;
    Ok(())
}

pub fn op_2XYZ(registers: &mut RegisterFile, x: u8, y: u8, z: u8) -> Result<(), ProcessingError> {
    let val = registers.get(x)?.wrapping_sub(registers.get(y)?);
    registers.set(z, val)?;
    Ok(())
}

pub fn op_3X00(
    registers: &mut RegisterFile,
    memory: &Memory,
    x: u8,
    address: u16,
    bank: Bank,
) -> Result<(), ProcessingError> {
    // validate the destination before touching memory
    registers.get(x)?;
    registers.set(x, memory.read(address, bank)?)?;
    Ok(())
}

pub fn op_4X00(
    registers: &RegisterFile,
    memory: &mut Memory,
    x: u8,
    address: u16,
    bank: Bank,
) -> Result<(), ProcessingError> {
    memory.write(address, registers.get(x)?, bank)?;
    Ok(())
}

pub fn op_5AAA(pc: &mut ProgramCounter, address: u16) -> Result<(), ProcessingError> {
    if address % 2 != 0 {
        return Err(ProcessingError::OddJumpTarget(address));
    }
    pc.jump(address);
    Ok(())
}

pub fn op_6X00(registers: &mut RegisterFile, keyboard: &mut dyn Keyboard, x: u8) -> Result<(), ProcessingError> {
    registers.get(x)?;
    registers.set(x, keyboard.read_key())?;
    Ok(())
}

pub fn op_7000(bank: &mut Bank) {
    *bank = bank.toggle();
}

/// Returns whether the program counter should still advance normally.
pub fn op_8XY0(registers: &RegisterFile, pc: &mut ProgramCounter, x: u8, y: u8) -> Result<bool, ProcessingError> {
    if registers.cmp_registers(x, y)? {
        pc.skip();
        return Ok(false);
    }
    Ok(true)
}

/// Returns whether the program counter should still advance normally.
pub fn op_9XY0(registers: &RegisterFile, pc: &mut ProgramCounter, x: u8, y: u8) -> Result<bool, ProcessingError> {
    if !registers.cmp_registers(x, y)? {
        pc.skip();
        return Ok(false);
    }
    Ok(true)
}

pub fn op_AAAA(address_register: &mut u16, address: u16) {
    *address_register = address;
}

pub fn op_BVV0(timer_mirror: &mut u8, timer: &Timer, value: u8) {
    *timer_mirror = value;
    timer.set(value);
}

pub fn op_CX00(registers: &mut RegisterFile, timer: &Timer, x: u8) -> Result<(), ProcessingError> {
    registers.set(x, timer.get())?;
    Ok(())
}

pub fn op_DX00(
    registers: &RegisterFile,
    memory: &mut Memory,
    x: u8,
    address: u16,
    bank: Bank,
) -> Result<(), ProcessingError> {
    let val = registers.get(x)?;

    let last = address as usize + 2;
    if last >= constants::MEMORY_SIZE {
        Err(MemoryError::OutOfBounds { bank, address: last })?
    }

    let digits = [val / 100, (val % 100) / 10, val % 10];
    for (offset, digit) in digits.into_iter().enumerate() {
        memory.write(address as usize + offset, digit, bank)?;
    }

    Ok(())
}

pub fn op_EXY0(registers: &mut RegisterFile, x: u8, y: u8) -> Result<(), ProcessingError> {
    let digit = registers.get(x)?;
    let ascii = match digit {
        0x0..=0x9 => b'0' + digit,
        0xA..=0xF => b'A' + (digit - 0xA),
        _ => return Err(ProcessingError::InvalidDigit(digit)),
    };
    registers.set(y, ascii)?;
    Ok(())
}

pub fn op_FXRC(registers: &RegisterFile, screen: &mut Screen, x: u8, row: u8, col: u8) -> Result<(), ProcessingError> {
    let char_code = registers.get(x)?;
    let limit = constants::SCREEN_SIZE as u8;
    if char_code > constants::MAX_CHAR_CODE || row >= limit || col >= limit {
        return Err(ProcessingError::InvalidDrawParameters { char_code, row, col });
    }

    screen.update(col as usize, row as usize, char::from(char_code))?;
    screen.draw()?;
    Ok(())
}
