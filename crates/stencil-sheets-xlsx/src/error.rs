//! Errors raised by the XLSX codec

use thiserror::Error;

/// Result alias for XLSX reading and writing
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// What went wrong while reading or writing an XLSX package
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The ZIP container is damaged or unreadable
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A package part is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The archive is a ZIP file but not a spreadsheet package
    #[error("Not an XLSX workbook: {0}")]
    NotAWorkbook(String),

    /// A part the workbook cannot be read without
    #[error("Package has no {0} part")]
    MissingPart(String),

    /// A `<c r="...">` attribute that is not A1 notation
    #[error("Cell reference '{0}' is not valid A1 notation")]
    BadCellReference(String),

    /// A shared string cell pointing outside the shared string table
    #[error("Shared string index '{index}' out of range ({count} strings)")]
    SharedStringIndex { index: String, count: usize },

    /// Package content the workbook model refuses (e.g., duplicate sheet names)
    #[error("Template content rejected: {0}")]
    Model(#[from] stencil_sheets_core::Error),
}
