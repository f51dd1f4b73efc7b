use std::time::Duration;

pub const MEMORY_SIZE: usize = 0x1000;
pub const REGISTER_COUNT: usize = 8;
pub const SCREEN_SIZE: usize = 8;
pub const INSTRUCTIONS_PER_SECOND: u64 = 500;
pub const TIMER_HZ: u64 = 60;
pub const INSTRUCTION_PERIOD: Duration = Duration::from_millis(1000 / INSTRUCTIONS_PER_SECOND);
pub const TIMER_PERIOD: Duration = Duration::from_millis(1000 / TIMER_HZ);
pub const ADDRESS_MASK: u16 = 0x0FFF;
pub const MAX_CHAR_CODE: u8 = 0x7F;
