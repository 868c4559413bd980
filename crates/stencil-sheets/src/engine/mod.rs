//! Spreadsheet engine capability
//!
//! [`TemplateBook`](crate::TemplateBook) never touches a file format
//! directly. It drives a [`SpreadsheetEngine`], which owns the workbook and
//! knows how to clone and remove sheets, hand out cells and serialize the
//! result. [`XlsxEngine`] is the engine backed by the XLSX codec.

mod xlsx;

use std::io::{Seek, Write};

use stencil_sheets_core::{Cell, SheetId};

use crate::error::FillResult;

pub use xlsx::XlsxEngine;

/// Byte sink a workbook can be serialized into
pub trait WriteSeek: Write + Seek {}

impl<T: Write + Seek + ?Sized> WriteSeek for T {}

/// Operations a template filler needs from a spreadsheet engine
///
/// Sheets are addressed by [`SheetId`], which stays valid while other
/// sheets are cloned or removed. Rows and columns are 0-based.
pub trait SpreadsheetEngine {
    /// Number of sheets
    fn sheet_count(&self) -> usize;

    /// Id of the sheet at a position
    fn sheet_id_at(&self, index: usize) -> Option<SheetId>;

    /// Id of the sheet with a name, compared ignoring case
    fn sheet_id_by_name(&self, name: &str) -> Option<SheetId>;

    /// Name of a sheet
    fn sheet_name(&self, sheet: SheetId) -> Option<&str>;

    /// Duplicate a sheet, appending the copy as the last sheet
    fn clone_sheet(&mut self, template: SheetId) -> FillResult<SheetId>;

    /// Rename a sheet
    fn rename_sheet(&mut self, sheet: SheetId, name: &str) -> FillResult<()>;

    /// Remove a sheet
    fn remove_sheet(&mut self, sheet: SheetId) -> FillResult<()>;

    /// Get a cell if it exists
    fn cell(&self, sheet: SheetId, row: u32, col: u16) -> FillResult<Option<&Cell>>;

    /// Get a cell, creating its row and the cell itself if absent
    fn cell_mut(&mut self, sheet: SheetId, row: u32, col: u16) -> FillResult<&mut Cell>;

    /// Serialize the whole workbook
    fn write_to(&self, sink: &mut dyn WriteSeek) -> FillResult<()>;
}
