//! A custom glyph pacing back and forth along one row.

use embedded_hal::delay::DelayNs;

use crate::sync_lcd::Lcd;
use crate::transport::Transport;
use crate::Error;

/// Little tentacled fellow, 5x8 dots.
pub const CREATURE: [u8; 8] = [
    0b01110, 0b11111, 0b10101, 0b11111, 0b01110, 0b11111, 0b10101, 0b10101,
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Heading {
    Right,
    Left,
}

/// Walks between `left_turn` and `right_turn` on one row, one column per [`Walker::step`].
#[derive(Clone, Debug)]
pub struct Walker {
    row: u8,
    col: u8,
    right_turn: u8,
    left_turn: u8,
    heading: Heading,
    location: u8,
    glyph: [u8; 8],
}

impl Walker {
    /// `location` is the CGRAM slot the glyph is stored in.
    pub fn new(row: u8, col: u8, right_turn: u8, left_turn: u8, heading: Heading, location: u8) -> Self {
        Self {
            row,
            col,
            right_turn,
            left_turn,
            heading,
            location: location & 0x07,
            glyph: CREATURE,
        }
    }

    pub fn with_glyph(mut self, glyph: [u8; 8]) -> Self {
        self.glyph = glyph;
        self
    }

    pub fn position(&self) -> (u8, u8) {
        (self.row, self.col)
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// Upload the glyph and draw it at the start position.
    pub fn place<T, D>(&self, lcd: &mut Lcd<T, D>) -> Result<(), Error<T::Error>>
    where
        T: Transport,
        D: DelayNs,
    {
        lcd.upload_custom_char(self.location, &self.glyph)?;
        lcd.print_raw(self.location, self.row, self.col)
    }

    /// Erase the glyph, move one column, draw it again. Turns around on the turn columns.
    pub fn step<T, D>(&mut self, lcd: &mut Lcd<T, D>) -> Result<(), Error<T::Error>>
    where
        T: Transport,
        D: DelayNs,
    {
        match self.heading {
            Heading::Right if self.col >= self.right_turn => self.heading = Heading::Left,
            Heading::Left if self.col <= self.left_turn => self.heading = Heading::Right,
            _ => {}
        }
        lcd.print(" ", self.row, self.col)?;
        self.col = match self.heading {
            Heading::Right => self.col.saturating_add(1),
            Heading::Left => self.col.saturating_sub(1),
        };
        lcd.print_raw(self.location, self.row, self.col)
    }
}
