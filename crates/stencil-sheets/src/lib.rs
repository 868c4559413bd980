//! # stencil-sheets
//!
//! Fill spreadsheet templates from Rust.
//!
//! A template workbook is loaded once, sheets are selected, cloned or
//! deleted by name, and cells are written with textual references such as
//! `"C5"`. The filled workbook is then written back out as XLSX.
//!
//! ## Features
//!
//! - Load templates from a path, a reader or bundled bytes
//! - Template styles, column widths, row heights and merges survive filling
//! - Stable [`SheetHandle`]s that outlive clones and deletions of other sheets
//! - Sheet names matched ignoring case, with opt-in sanitizing of
//!   half-width and full-width forbidden characters
//!
//! ## Example
//!
//! ```rust
//! use std::io::Cursor;
//! use stencil_sheets::prelude::*;
//!
//! let mut template = Workbook::new();
//! template.add_worksheet_with_name("Invoice").unwrap();
//! let mut bytes = Cursor::new(Vec::new());
//! XlsxWriter::write(&template, &mut bytes).unwrap();
//!
//! let options = FillOptions::new().with_sanitize_sheet_names(true);
//! let mut book = TemplateBook::from_bytes(bytes.get_ref())
//!     .unwrap()
//!     .with_options(options);
//! let march = book.clone_sheet("2024/03", "Invoice").unwrap();
//! book.delete_sheet("Invoice").unwrap();
//!
//! book.set_cell_value_in(march, "B2", "ACME Corp").unwrap();
//! book.set_cell_value_in(march, "C5", 1250.5).unwrap();
//! assert_eq!(book.cell_value_in(march, "B2").unwrap(), "ACME Corp");
//! assert_eq!(book.sheet_names(), ["Sheet1", "202403"]);
//!
//! let mut output = Cursor::new(Vec::new());
//! book.write_to(&mut output).unwrap();
//! ```

pub mod engine;
pub mod error;
pub mod options;
pub mod prelude;
pub mod template;

pub use engine::{SpreadsheetEngine, WriteSeek, XlsxEngine};
pub use error::{FillError, FillResult};
pub use options::FillOptions;
pub use template::{SheetHandle, TemplateBook};

// Re-export core types
pub use stencil_sheets_core::{
    digit_value, is_valid_sheet_name, sanitize_sheet_name, Cell, CellReference, CellValue,
    ColumnRange, Error, Result, Row, SheetId, Workbook, Worksheet, FORBIDDEN_SHEET_NAME_CHARS,
    MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN,
};

// Re-export XLSX codec
pub use stencil_sheets_xlsx::{XlsxError, XlsxReader, XlsxResult, XlsxWriter};
