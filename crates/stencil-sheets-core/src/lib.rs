//! # stencil-sheets-core
//!
//! Core data structures for the stencil-sheets template filler.
//!
//! This crate provides the types shared by the reader, the writer and the
//! template façade:
//! - [`CellReference`] - Textual cell references ("B12") and their column encoding
//! - [`CellValue`] and [`Cell`] - Values stored in cells
//! - [`Workbook`], [`Worksheet`], [`Row`] - The in-memory document
//! - [`sanitize_sheet_name`] - Removes characters a sheet name may not contain
//!
//! ## Example
//!
//! ```rust
//! use stencil_sheets_core::{CellReference, CellValue, Workbook};
//!
//! let reference = CellReference::parse("C5").unwrap();
//! assert_eq!(reference.row(), 5);
//! assert_eq!(reference.column().unwrap(), 2);
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! let (row, col) = reference.position().unwrap();
//! sheet.set_value_at(row, col, "Hello").unwrap();
//! assert_eq!(sheet.value_at(row, col), CellValue::from("Hello"));
//! ```

pub mod cell;
pub mod error;
pub mod row;
pub mod sheet_name;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{digit_value, Cell, CellReference, CellValue};
pub use error::{Error, Result};
pub use row::Row;
pub use sheet_name::{is_valid_sheet_name, sanitize_sheet_name, FORBIDDEN_SHEET_NAME_CHARS};
pub use workbook::Workbook;
pub use worksheet::{ColumnRange, SheetId, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
