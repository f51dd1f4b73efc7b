use std::{
    collections::VecDeque,
    io::{
        self,
        BufRead,
        Write,
    },
};

use log::warn;

/// Supplies one byte per READ_KEYBOARD. Implementations recover from bad input themselves
/// and answer 0; nothing here can fault the CPU.
pub trait Keyboard: Send {
    fn read_key(&mut self) -> u8;
}

/// Prompts on a writer and reads a line of hex from a reader, stdin/stdout by default.
pub struct ConsoleKeyboard<R, W> {
    input: R,
    prompt: W,
}

impl ConsoleKeyboard<io::BufReader<io::Stdin>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead + Send, W: Write + Send> ConsoleKeyboard<R, W> {
    pub fn new(input: R, prompt: W) -> Self {
        Self { input, prompt }
    }

    fn read_line(&mut self) -> io::Result<String> {
        write!(self.prompt, "Enter hex value (0-F): ")?;
        self.prompt.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line)
    }
}

impl<R: BufRead + Send, W: Write + Send> Keyboard for ConsoleKeyboard<R, W> {
    fn read_key(&mut self) -> u8 {
        match self.read_line() {
            Ok(line) => parse_key(&line),
            Err(err) => {
                warn!("keyboard unavailable, using 0: {err}");
                0
            }
        }
    }
}

/// Parses up to the first two characters of `line` as a signed hex number and keeps its low
/// byte, so `-1` reads as `0xFF`. Blank input is 0, and so is anything unparseable, with a
/// warning.
pub fn parse_key(line: &str) -> u8 {
    let line = line.trim().to_lowercase();
    if line.is_empty() {
        return 0;
    }

    let digits: String = line.chars().take(2).collect();
    match i32::from_str_radix(&digits, 16) {
        Ok(value) => (value & 0xFF) as u8,
        Err(_) => {
            warn!("invalid input {line:?}, using 0");
            0
        }
    }
}

/// Replays a fixed sequence of keys, then answers 0 forever.
#[derive(Default)]
pub struct ScriptedKeyboard {
    keys: VecDeque<u8>,
}

impl ScriptedKeyboard {
    pub fn new(keys: &[u8]) -> Self {
        Self {
            keys: keys.iter().copied().collect(),
        }
    }
}

impl Keyboard for ScriptedKeyboard {
    fn read_key(&mut self) -> u8 {
        self.keys.pop_front().unwrap_or(0)
    }
}
