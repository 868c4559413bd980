//! Error types for template filling

use stencil_sheets_core::SheetId;
use stencil_sheets_xlsx::XlsxError;
use thiserror::Error;

/// Result type alias using [`FillError`]
pub type FillResult<T> = std::result::Result<T, FillError>;

/// Errors raised while filling a template
#[derive(Debug, Error)]
pub enum FillError {
    /// Cell reference or workbook model error
    #[error("Core error: {0}")]
    Core(#[from] stencil_sheets_core::Error),

    /// Reading or writing the XLSX package failed
    #[error("XLSX error: {0}")]
    Xlsx(#[from] XlsxError),

    /// IO error outside the XLSX codec
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No sheet at the requested position
    #[error("Sheet index {0} out of range (count: {1})")]
    SheetIndexOutOfRange(usize, usize),

    /// No sheet with the requested name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// A cell operation ran before any sheet was selected
    #[error("No sheet selected")]
    NoSheetSelected,

    /// The sheet behind a handle has been deleted
    #[error("Sheet {0} no longer exists")]
    StaleSheet(SheetId),

    /// The referenced cell has never been written
    #[error("Cell {0} does not exist")]
    CellNotFound(String),

    /// The referenced cell holds something other than text
    #[error("Cell {reference} holds a {actual} value, not a string")]
    NotAString {
        reference: String,
        actual: &'static str,
    },
}
