#![cfg_attr(not(any(test, feature = "std")), no_std)]
//! Driver for HD44780 character LCDs (16x2, 20x4 and friends) wired to a PCF8574 I/O expander,
//! the "I2C backpack" found on most hobby modules. It requires a byte sink implementing
//! [`Transport`], usually an [`I2cTransport`] around anything implementing
//! [`embedded_hal::i2c::I2c`], and an instance to delay execution with
//! [`embedded_hal::delay::DelayNs`].
//!
//! The expander pins are wired to the controller like so:
//!
//! | P7..P4 | P3        | P2     | P1  | P0  |
//! |--------|-----------|--------|-----|-----|
//! | D7..D4 | backlight | enable | R/W | RS  |
//!
//! which leaves only four data lines, so every byte travels as two nibbles and every nibble as
//! two expander writes (enable set, then enable cleared).
//!
//! Usage:
//! ```ignore
//! use lcd1602_i2c::{sync_lcd::Lcd, Backlight, Font, I2cTransport, DEFAULT_ADDRESS};
//!
//! // Any embedded_hal::i2c::I2c implementation and any DelayNs will do.
//! let transport = I2cTransport::new(i2c, DEFAULT_ADDRESS);
//!
//! let mut lcd = Lcd::new(transport, delay)
//!     .with_columns(16)
//!     .with_rows(2)
//!     .with_font(Font::Dots5x8)
//!     .with_backlight(Backlight::On)
//!     .init()?;
//!
//! lcd.print("Hello!", 0, 5)?;
//! ```
//!
//! The driver never reads the controller back. State such as the backlight or the cursor
//! visibility is mirrored locally and assumed to match the hardware; after any bus error the
//! handle should be dropped and the display initialised again.

pub mod command;
pub mod config;
pub mod error;
pub mod sync_lcd;
pub mod transport;
pub mod walker;

#[cfg(feature = "async")]
pub mod async_lcd;

#[cfg(feature = "std")]
pub mod shared;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, Invalid};
pub use transport::{I2cTransport, Transport};

#[cfg(feature = "async")]
pub use transport::AsyncTransport;

/// Address of the PCF8574T backpack with all address jumpers open.
pub const DEFAULT_ADDRESS: u8 = 0x27;

/// I2C bus exposed on the Raspberry Pi header (`/dev/i2c-1`).
pub const DEFAULT_BUS: u8 = 1;

/// Display flags, sent together in one display control command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayControl {
    Blink = 0x01,
    Cursor = 0x02,
    Display = 0x04,
}

/// Mirror of the display/cursor/blink bits last sent to the controller.
///
/// The controller has no way to change one of them alone, so the whole set is re-sent on every
/// change.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DisplayState(u8);

impl DisplayState {
    pub const fn contains(self, flag: DisplayControl) -> bool {
        self.0 & flag as u8 != 0
    }

    pub const fn with(self, flag: DisplayControl, on: bool) -> Self {
        if on {
            Self(self.0 | flag as u8)
        } else {
            Self(self.0 & !(flag as u8))
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl Default for DisplayState {
    /// Display on, cursor and blink off.
    fn default() -> Self {
        Self(DisplayControl::Display as u8)
    }
}

/// Backlight LED, driven by expander pin P3.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Backlight {
    Off = 0x00,
    On = 0x08,
}

impl Backlight {
    pub const fn toggled(self) -> Self {
        match self {
            Backlight::Off => Backlight::On,
            Backlight::On => Backlight::Off,
        }
    }
}

/// Character font, latched by the function set command during initialisation.
///
/// 5x10 dots is only available on single line displays.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Font {
    Dots5x8 = 0x00,
    Dots5x10 = 0x04,
}

impl TryFrom<u8> for Font {
    type Error = Invalid;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x00 => Ok(Font::Dots5x8),
            0x04 => Ok(Font::Dots5x10),
            other => Err(Invalid::Font(other)),
        }
    }
}
