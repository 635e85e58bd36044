//! HD44780 instruction set and the PCF8574 framing that carries it over four data lines.

use crate::Backlight;

/// Expander pin P0, selects the instruction or the data register.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    Command = 0x00,
    Data = 0x01,
}

/// Expander pin P2. The controller samples D7..D4 on its falling edge.
pub const ENABLE: u8 = 0x04;

/// Instruction opcodes. Each is combined with its flag bits through [`Command::with`].
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Clear = 0x01,
    ReturnHome = 0x02,
    EntryModeSet = 0x04,
    DisplayControl = 0x08,
    Shift = 0x10,
    FunctionSet = 0x20,
    CgramAddr = 0x40,
    DdramAddr = 0x80,
}

impl Command {
    pub const fn with(self, flags: u8) -> u8 {
        self as u8 | flags
    }

    pub const fn bits(self) -> u8 {
        self as u8
    }
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryMode {
    Increment = 0x02,
    ShiftDisplay = 0x01,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BitMode {
    Bit4 = 0x00,
    Bit8 = 0x10,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Lines {
    One = 0x00,
    Two = 0x08,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShiftTarget {
    Cursor = 0x00,
    Display = 0x08,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShiftDirection {
    Left = 0x00,
    Right = 0x04,
}

/// High nibble of "function set, 8 bit": sent alone three times to resynchronise the controller.
pub const BOOT_8BIT: u8 = Command::FunctionSet.with(BitMode::Bit8 as u8) >> 4;

/// High nibble of "function set, 4 bit": switches the interface width.
pub const BOOT_4BIT: u8 = Command::FunctionSet.with(BitMode::Bit4 as u8) >> 4;

/// DDRAM offset of the first cell of each row. Rows 2 and 3 continue rows 0 and 1.
pub const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Set-DDRAM-address command for a cell. Range checks are up to the caller;
/// out-of-range cells wrap inside the 7-bit address space.
pub const fn ddram_address(row: u8, col: u8) -> u8 {
    Command::DdramAddr.with(ROW_OFFSETS[(row & 0x03) as usize].wrapping_add(col) & 0x7f)
}

/// Set-CGRAM-address command for the first row of a glyph slot; `location` wraps at 8.
pub const fn cgram_address(location: u8) -> u8 {
    Command::CgramAddr.with((location & 0x07) << 3)
}

/// The two expander writes that latch one nibble: enable set, then enable cleared.
pub const fn nibble_frames(nibble: u8, register: Register, backlight: Backlight) -> [u8; 2] {
    let frame = ((nibble & 0x0f) << 4) | backlight as u8 | register as u8;
    [frame | ENABLE, frame & !ENABLE]
}

/// The four expander writes that carry a full byte, high nibble first.
pub const fn frames(value: u8, register: Register, backlight: Backlight) -> [u8; 4] {
    let [high_set, high_clear] = nibble_frames(value >> 4, register, backlight);
    let [low_set, low_clear] = nibble_frames(value & 0x0f, register, backlight);
    [high_set, high_clear, low_set, low_clear]
}

/// Fixed pacing. Nothing is ever polled, so these are the datasheet worst cases plus margin.
pub mod timing {
    /// Power-on reset of the controller.
    pub const POWER_ON_MS: u32 = 50;
    /// After the first 8 bit function set.
    pub const FIRST_BOOT_MS: u32 = 5;
    /// After the second 8 bit function set.
    pub const SECOND_BOOT_US: u32 = 100;
    /// After every latched nibble. Most instructions take 37 us.
    pub const SETTLE_US: u32 = 50;
    /// Clear display and return home take up to 1.52 ms.
    pub const CLEAR_MS: u32 = 2;
}
