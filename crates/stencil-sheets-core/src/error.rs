//! Error types for stencil-sheets-core

use thiserror::Error;

/// Shorthand for results carrying [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of reference parsing and workbook edits
#[derive(Debug, Error)]
pub enum Error {
    /// The digit part of a cell reference is missing or not a number
    #[error("Invalid row number in cell reference '{0}'")]
    InvalidRow(String),

    /// The letter part of a cell reference cannot be decoded
    #[error("Invalid column in cell reference '{0}'")]
    InvalidColumn(String),

    /// Row number out of bounds (1-based as written by the caller)
    #[error("Row {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Decoded column is negative or past the last column
    #[error("Column {0} is outside 0..={1}")]
    ColumnOutOfBounds(i32, u16),

    /// No sheet at this position
    #[error("No sheet at index {0} (workbook has {1})")]
    SheetOutOfBounds(usize, usize),

    /// Name the file format cannot store
    #[error("Sheet name rejected: {0}")]
    InvalidSheetName(String),

    /// Another sheet already uses this name (ignoring case)
    #[error("A sheet named '{0}' already exists")]
    DuplicateSheetName(String),
}
