//! # stencil-sheets-xlsx
//!
//! XLSX (Office Open XML) reader and writer for stencil-sheets.
//!
//! The reader keeps what a template needs to survive a round trip: cell
//! values, formulas, style indices, row and column formatting, merged
//! regions and the raw stylesheet. The writer emits a fresh package from
//! the in-memory workbook.

pub mod error;
pub mod reader;
pub mod writer;

mod address;
mod shared_formula;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
