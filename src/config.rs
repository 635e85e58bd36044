//! Display geometry and font, fixed for the lifetime of a handle.

use crate::command::{self, BitMode, Command, Lines};
use crate::{Font, Invalid};

/// Geometry and font of the attached module.
///
/// Built unchecked through [`crate::sync_lcd::Lcd`]'s builder methods or checked through
/// [`Config::new`]; either way [`Config::validate`] runs before the first bus write.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    columns: u8,
    rows: u8,
    font: Font,
}

impl Config {
    /// 16 columns, 2 rows, 5x8 dots: the common LCD1602.
    pub const LCD1602: Config = Config {
        columns: 16,
        rows: 2,
        font: Font::Dots5x8,
    };

    /// 20 columns, 4 rows, 5x8 dots.
    pub const LCD2004: Config = Config {
        columns: 20,
        rows: 4,
        font: Font::Dots5x8,
    };

    pub fn new(columns: u8, rows: u8, font: Font) -> Result<Self, Invalid> {
        let config = Config {
            columns,
            rows,
            font,
        };
        config.validate()?;
        Ok(config)
    }

    /// Supported modules are 16 or 20 columns by 1, 2 or 4 rows. 5x10 dots needs one row.
    pub fn validate(&self) -> Result<(), Invalid> {
        if !matches!(self.columns, 16 | 20) {
            return Err(Invalid::Columns(self.columns));
        }
        if !matches!(self.rows, 1 | 2 | 4) {
            return Err(Invalid::Rows(self.rows));
        }
        if self.font == Font::Dots5x10 && self.rows != 1 {
            return Err(Invalid::FontNeedsOneRow(self.rows));
        }
        Ok(())
    }

    pub const fn columns(&self) -> u8 {
        self.columns
    }

    pub const fn rows(&self) -> u8 {
        self.rows
    }

    pub const fn font(&self) -> Font {
        self.font
    }

    pub(crate) fn with_columns(mut self, columns: u8) -> Self {
        self.columns = columns;
        self
    }

    pub(crate) fn with_rows(mut self, rows: u8) -> Self {
        self.rows = rows;
        self
    }

    pub(crate) fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    /// Function set for 4 bit operation with this geometry and font.
    pub const fn function_set(&self) -> u8 {
        let lines = if self.rows > 1 { Lines::Two } else { Lines::One };
        Command::FunctionSet.with(BitMode::Bit4 as u8 | lines as u8 | self.font as u8)
    }

    /// Set-DDRAM-address command for the cell at `(row, col)`, if it is on screen.
    pub fn cursor_address(&self, row: u8, col: u8) -> Result<u8, Invalid> {
        if col >= self.columns {
            return Err(Invalid::Column {
                col,
                columns: self.columns,
            });
        }
        if row >= self.rows {
            return Err(Invalid::Row {
                row,
                rows: self.rows,
            });
        }
        Ok(command::ddram_address(row, col))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::LCD1602
    }
}
