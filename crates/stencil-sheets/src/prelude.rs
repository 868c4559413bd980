//! Prelude module - common imports for stencil-sheets users
//!
//! ```rust
//! use stencil_sheets::prelude::*;
//! ```

pub use crate::{
    // Cell types
    CellReference,
    CellValue,

    // Errors
    FillError,
    FillOptions,
    FillResult,

    SheetHandle,
    SpreadsheetEngine,
    TemplateBook,

    Workbook,
    XlsxEngine,
    XlsxReader,
    XlsxWriter,
};
