//! Worksheet type

use std::collections::BTreeMap;
use std::fmt;

use crate::cell::{Cell, CellValue};
use crate::error::{Error, Result};
use crate::row::Row;
use crate::{MAX_COLS, MAX_ROWS};

/// Stable identity of a sheet inside one workbook
///
/// Sheet indices shift when sheets are cloned or removed; ids do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(u32);

impl SheetId {
    pub(crate) fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw id value
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Column formatting carried from a template's `<cols>` element
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRange {
    /// First column (1-based, inclusive)
    pub min: u32,
    /// Last column (1-based, inclusive)
    pub max: u32,
    /// Width in characters
    pub width: Option<f64>,
    /// Style index applied to the columns
    pub style: Option<u32>,
    /// Columns are hidden
    pub hidden: bool,
}

/// A worksheet (single sheet in a workbook)
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Stable id
    id: SheetId,
    /// Sheet name
    name: String,
    /// Row index → row
    rows: BTreeMap<u32, Row>,
    /// Column formatting
    columns: Vec<ColumnRange>,
    /// Merged regions as A1-style ranges ("A1:C3")
    merged_ranges: Vec<String>,
}

impl Worksheet {
    pub(crate) fn new<S: Into<String>>(id: SheetId, name: S) -> Self {
        Self {
            id,
            name: name.into(),
            rows: BTreeMap::new(),
            columns: Vec::new(),
            merged_ranges: Vec::new(),
        }
    }

    /// Deep copy under a new id and name
    pub(crate) fn duplicate<S: Into<String>>(&self, id: SheetId, name: S) -> Self {
        Self {
            id,
            name: name.into(),
            ..self.clone()
        }
    }

    /// Get the sheet id
    pub fn id(&self) -> SheetId {
        self.id
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // === Rows ===

    /// Get a row by 0-based index
    pub fn row(&self, row: u32) -> Option<&Row> {
        self.rows.get(&row)
    }

    /// Get a mutable row by 0-based index
    pub fn row_mut(&mut self, row: u32) -> Option<&mut Row> {
        self.rows.get_mut(&row)
    }

    /// Get a row, creating it if absent
    pub fn row_or_create(&mut self, row: u32) -> Result<&mut Row> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row.saturating_add(1), MAX_ROWS));
        }
        Ok(self.rows.entry(row).or_default())
    }

    /// Iterate over rows in order
    pub fn iter_rows(&self) -> impl Iterator<Item = (u32, &Row)> {
        self.rows.iter().map(|(idx, row)| (*idx, row))
    }

    // === Cell Access ===

    /// Get a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&Cell> {
        self.rows.get(&row).and_then(|r| r.cell(col))
    }

    /// Get a cell, creating its row and the cell itself if absent
    pub fn cell_at_mut_or_create(&mut self, row: u32, col: u16) -> Result<&mut Cell> {
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(i32::from(col), MAX_COLS - 1));
        }
        Ok(self.row_or_create(row)?.cell_or_create(col))
    }

    /// Set a cell value, keeping the style the cell already has
    pub fn set_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) -> Result<()> {
        self.cell_at_mut_or_create(row, col)?.value = value.into();
        Ok(())
    }

    /// Get cell value by indices (Empty when absent)
    pub fn value_at(&self, row: u32, col: u16) -> CellValue {
        self.cell_at(row, col)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    /// Total number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(Row::cell_count).sum()
    }

    /// Check if any cell holds a formula
    pub fn has_formulas(&self) -> bool {
        self.rows
            .values()
            .flat_map(|r| r.cells())
            .any(|(_, c)| c.value.is_formula())
    }

    // === Columns & merges ===

    /// Column formatting ranges
    pub fn columns(&self) -> &[ColumnRange] {
        &self.columns
    }

    /// Add a column formatting range
    pub fn add_column_range(&mut self, range: ColumnRange) {
        self.columns.push(range);
    }

    /// Merged regions
    pub fn merged_ranges(&self) -> &[String] {
        &self.merged_ranges
    }

    /// Add a merged region ("A1:C3")
    pub fn add_merged_range<S: Into<String>>(&mut self, range: S) {
        self.merged_ranges.push(range.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Worksheet {
        Worksheet::new(SheetId::new(1), "Data")
    }

    #[test]
    fn test_set_value_creates_row_and_cell() {
        let mut ws = sheet();
        assert!(ws.row(4).is_none());

        ws.set_value_at(4, 2, "hello").unwrap();
        assert!(ws.row(4).is_some());
        assert_eq!(ws.value_at(4, 2).as_string(), Some("hello"));
        assert_eq!(ws.cell_count(), 1);
    }

    #[test]
    fn test_set_value_keeps_style() {
        let mut ws = sheet();
        ws.cell_at_mut_or_create(0, 0).unwrap().style = 5;
        ws.set_value_at(0, 0, 12.5).unwrap();

        let cell = ws.cell_at(0, 0).unwrap();
        assert_eq!(cell.style, 5);
        assert_eq!(cell.value.as_number(), Some(12.5));
    }

    #[test]
    fn test_bounds() {
        let mut ws = sheet();
        assert!(ws.set_value_at(MAX_ROWS, 0, 1i32).is_err());
        assert!(ws.set_value_at(0, MAX_COLS, 1i32).is_err());
        assert_eq!(ws.cell_count(), 0);
    }

    #[test]
    fn test_duplicate_is_deep() {
        let mut ws = sheet();
        ws.set_value_at(0, 0, "template").unwrap();
        ws.add_merged_range("A1:B1");

        let mut copy = ws.duplicate(SheetId::new(2), "Copy");
        copy.set_value_at(0, 0, "filled").unwrap();

        assert_eq!(copy.id(), SheetId::new(2));
        assert_eq!(copy.name(), "Copy");
        assert_eq!(copy.merged_ranges(), ["A1:B1".to_string()]);
        assert_eq!(ws.value_at(0, 0).as_string(), Some("template"));
    }
}
