use std::{
    fmt,
    fs,
    io,
    path::{
        Path,
        PathBuf,
    },
};

use log::{
    info,
    warn,
};
use thiserror::Error;

use crate::{
    constants,
    cpu::ProgramCounter,
};

/// Selects which of the two address spaces an access goes to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Bank {
    #[default]
    Ram,
    Rom,
}

impl Bank {
    pub fn toggle(self) -> Self {
        match self {
            Bank::Ram => Bank::Rom,
            Bank::Rom => Bank::Ram,
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bank::Ram => write!(f, "RAM"),
            Bank::Rom => write!(f, "ROM"),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MemoryError {
    #[error("{bank} address {address} out of bounds")]
    OutOfBounds { bank: Bank, address: usize },
}

/// ROM and RAM, each a flat 4 KiB bank. ROM is writable, but every write to it is logged.
pub struct Memory {
    rom: Box<[u8; constants::MEMORY_SIZE]>,
    ram: Box<[u8; constants::MEMORY_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Self {
            rom: Box::new([0; constants::MEMORY_SIZE]),
            ram: Box::new([0; constants::MEMORY_SIZE]),
        }
    }

    /// Replaces the whole ROM bank with `image`, zero-filling whatever the image doesn't cover.
    pub fn load(&mut self, image: &[u8]) -> Result<(), RomError> {
        if image.len() > constants::MEMORY_SIZE {
            Err(RomError::ImageTooLarge {
                rom_size: image.len(),
                capacity: constants::MEMORY_SIZE,
            })?
        }

        self.rom.fill(0);
        self.rom[..image.len()].copy_from_slice(image);
        info!("ROM loaded with {} bytes.", image.len());

        Ok(())
    }

    pub fn load_rom(&mut self, rom: &Rom) -> Result<(), RomError> {
        self.load(rom.data())
    }

    pub fn op_code(&self, pc: &ProgramCounter) -> Result<u16, MemoryError> {
        let pc = *pc.inner() as usize;
        let high = self.read(pc, Bank::Rom)? as u16;
        let low = self.read(pc + 1, Bank::Rom)? as u16;
        Ok((high << 8) | low)
    }

    pub fn read<T: Into<usize>>(&self, index: T, bank: Bank) -> Result<u8, MemoryError> {
        let address = index.into();
        self.bank(bank)
            .get(address)
            .copied()
            .ok_or(MemoryError::OutOfBounds { bank, address })
    }

    pub fn write<T: Into<usize>>(&mut self, index: T, value: u8, bank: Bank) -> Result<(), MemoryError> {
        let address = index.into();
        let cell = self
            .bank_mut(bank)
            .get_mut(address)
            .ok_or(MemoryError::OutOfBounds { bank, address })?;

        if bank == Bank::Rom {
            warn!("writing to ROM at address {address} (value: {value})");
        }
        *cell = value;

        Ok(())
    }

    fn bank(&self, bank: Bank) -> &[u8; constants::MEMORY_SIZE] {
        match bank {
            Bank::Ram => &self.ram,
            Bank::Rom => &self.rom,
        }
    }

    fn bank_mut(&mut self, bank: Bank) -> &mut [u8; constants::MEMORY_SIZE] {
        match bank {
            Bank::Ram => &mut self.ram,
            Bank::Rom => &mut self.rom,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegisterError {
    #[error("register index {0} out of range")]
    IndexOutOfRange(usize),
}

#[derive(Default)]
pub struct RegisterFile([u8; constants::REGISTER_COUNT]);

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Into<usize>>(&self, index: T) -> Result<u8, RegisterError> {
        let idx = index.into();
        self.0.get(idx).copied().ok_or(RegisterError::IndexOutOfRange(idx))
    }

    pub fn set<T: Into<usize>>(&mut self, index: T, val: u8) -> Result<(), RegisterError> {
        let idx = index.into();
        let register = self.0.get_mut(idx).ok_or(RegisterError::IndexOutOfRange(idx))?;
        *register = val;

        Ok(())
    }

    pub fn cmp_registers<T: Into<usize>>(&self, x: T, y: T) -> Result<bool, RegisterError> {
        Ok(self.get(x)? == self.get(y)?)
    }
}

#[derive(Error, Debug)]
pub enum RomError {
    #[error("ROM file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("loading rom failed {0}")]
    IoError(#[from] io::Error),

    #[error("ROM file too large: {rom_size} bytes (max {capacity})")]
    ImageTooLarge { rom_size: usize, capacity: usize },
}

/// A program image read from disk, already checked against ROM capacity.
#[derive(Debug)]
pub struct Rom {
    data: Vec<u8>,
}

impl Rom {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => RomError::FileNotFound(path.to_path_buf()),
            _ => RomError::IoError(err),
        })?;

        Self::try_from(data)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl TryFrom<Vec<u8>> for Rom {
    type Error = RomError;

    fn try_from(data: Vec<u8>) -> Result<Self, Self::Error> {
        if data.len() > constants::MEMORY_SIZE {
            Err(RomError::ImageTooLarge {
                rom_size: data.len(),
                capacity: constants::MEMORY_SIZE,
            })?
        }

        Ok(Self { data })
    }
}
