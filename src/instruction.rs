use std::fmt;

use thiserror::Error;

use crate::constants;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown instruction opcode: {0:x}")]
    UnknownOpcode(u8),
}

/// The raw fields of an instruction word, before they are given meaning by the opcode.
///
/// ```text
///  15..12  11..8   7..4   3..0
///  opcode    x      y      z
///          |----- nnn --------|
///          |--- vv ---|
///                 |--- nn ----|
/// ```
#[derive(Debug, Clone, Copy)]
pub struct InstructionData {
    pub opcode: u8,
    pub x: u8,
    pub y: u8,
    pub z: u8,
    pub nn: u8,
    pub vv: u8,
    pub nnn: u16,
}

impl From<u16> for InstructionData {
    fn from(op_code: u16) -> Self {
        Self {
            opcode: ((op_code >> 12) & 0xF) as u8,
            x: ((op_code >> 8) & 0xF) as u8,
            y: ((op_code >> 4) & 0xF) as u8,
            z: (op_code & 0xF) as u8,
            nn: (op_code & 0xFF) as u8,
            vv: ((op_code >> 4) & 0xFF) as u8,
            nnn: op_code & constants::ADDRESS_MASK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Store { x: u8, value: u8 },
    Add { x: u8, y: u8, z: u8 },
    Sub { x: u8, y: u8, z: u8 },
    Read { x: u8 },
    Write { x: u8 },
    Jump { address: u16 },
    ReadKeyboard { x: u8 },
    SwitchMemory,
    SkipEqual { x: u8, y: u8 },
    SkipNotEqual { x: u8, y: u8 },
    SetAddress { address: u16 },
    SetTimer { value: u8 },
    ReadTimer { x: u8 },
    ToBase10 { x: u8 },
    ToAscii { x: u8, y: u8 },
    Draw { x: u8, row: u8, col: u8 },
}

impl Instruction {
    pub fn decode(op_code: u16) -> Result<Self, DecodeError> {
        let data = InstructionData::from(op_code);
        Self::from_parts(data.opcode, &data)
    }

    fn from_parts(opcode: u8, data: &InstructionData) -> Result<Self, DecodeError> {
        let InstructionData { x, y, z, nn, vv, nnn, .. } = *data;
        let instruction = match opcode {
            0x0 => Instruction::Store { x, value: nn },
            0x1 => Instruction::Add { x, y, z },
            0x2 => Instruction::Sub { x, y, z },
            0x3 => Instruction::Read { x },
            0x4 => Instruction::Write { x },
            0x5 => Instruction::Jump { address: nnn },
            0x6 => Instruction::ReadKeyboard { x },
            0x7 => Instruction::SwitchMemory,
            0x8 => Instruction::SkipEqual { x, y },
            0x9 => Instruction::SkipNotEqual { x, y },
            0xA => Instruction::SetAddress { address: nnn },
            0xB => Instruction::SetTimer { value: vv },
            0xC => Instruction::ReadTimer { x },
            0xD => Instruction::ToBase10 { x },
            0xE => Instruction::ToAscii { x, y },
            0xF => Instruction::Draw { x, row: y, col: z },
            other => return Err(DecodeError::UnknownOpcode(other)),
        };

        Ok(instruction)
    }

    #[cfg(test)]
    fn opcode(&self) -> u8 {
        match self {
            Instruction::Store { .. } => 0x0,
            Instruction::Add { .. } => 0x1,
            Instruction::Sub { .. } => 0x2,
            Instruction::Read { .. } => 0x3,
            Instruction::Write { .. } => 0x4,
            Instruction::Jump { .. } => 0x5,
            Instruction::ReadKeyboard { .. } => 0x6,
            Instruction::SwitchMemory => 0x7,
            Instruction::SkipEqual { .. } => 0x8,
            Instruction::SkipNotEqual { .. } => 0x9,
            Instruction::SetAddress { .. } => 0xA,
            Instruction::SetTimer { .. } => 0xB,
            Instruction::ReadTimer { .. } => 0xC,
            Instruction::ToBase10 { .. } => 0xD,
            Instruction::ToAscii { .. } => 0xE,
            Instruction::Draw { .. } => 0xF,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Store { x, value } => write!(f, "STORE r{x}, {value:#04x}"),
            Instruction::Add { x, y, z } => write!(f, "ADD r{x}, r{y}, r{z}"),
            Instruction::Sub { x, y, z } => write!(f, "SUB r{x}, r{y}, r{z}"),
            Instruction::Read { x } => write!(f, "READ r{x}"),
            Instruction::Write { x } => write!(f, "WRITE r{x}"),
            Instruction::Jump { address } => write!(f, "JUMP {address:#05x}"),
            Instruction::ReadKeyboard { x } => write!(f, "READ_KEYBOARD r{x}"),
            Instruction::SwitchMemory => write!(f, "SWITCH_MEMORY"),
            Instruction::SkipEqual { x, y } => write!(f, "SKIP_EQ r{x}, r{y}"),
            Instruction::SkipNotEqual { x, y } => write!(f, "SKIP_NEQ r{x}, r{y}"),
            Instruction::SetAddress { address } => write!(f, "SET_ADDRESS {address:#05x}"),
            Instruction::SetTimer { value } => write!(f, "SET_TIMER {value:#04x}"),
            Instruction::ReadTimer { x } => write!(f, "READ_TIMER r{x}"),
            Instruction::ToBase10 { x } => write!(f, "BCD r{x}"),
            Instruction::ToAscii { x, y } => write!(f, "TO_ASCII r{x}, r{y}"),
            Instruction::Draw { x, row, col } => write!(f, "DRAW r{x}, {row}, {col}"),
        }
    }
}
