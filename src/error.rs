use thiserror::Error;

/// Everything a display operation can fail with.
///
/// `InvalidArgument` is always raised before any byte reaches the bus. `Io` carries the
/// transport's own error; by then the display may already be partially updated.
#[derive(Debug, Error)]
pub enum Error<E> {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] Invalid),
    #[error("bus write failed: {0:?}")]
    Io(E),
}

/// Rejected arguments.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Invalid {
    #[error("columns must be 16 or 20, got {0}")]
    Columns(u8),
    #[error("rows must be 1, 2 or 4, got {0}")]
    Rows(u8),
    #[error("font code {0:#04x} is neither 5x8 nor 5x10")]
    Font(u8),
    #[error("the 5x10 font needs a single row display, got {0} rows")]
    FontNeedsOneRow(u8),
    #[error("row {row} is outside 0..{rows}")]
    Row { row: u8, rows: u8 },
    #[error("column {col} is outside 0..{columns}")]
    Column { col: u8, columns: u8 },
    #[error("address counter points into CGRAM, set the cursor before writing")]
    CgramAddressed,
}

impl<E> Error<E> {
    /// The rejected argument, if this is not a bus error.
    pub fn invalid(&self) -> Option<Invalid> {
        match self {
            Error::InvalidArgument(invalid) => Some(*invalid),
            Error::Io(_) => None,
        }
    }
}
