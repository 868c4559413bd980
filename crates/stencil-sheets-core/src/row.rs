//! Row types

use std::collections::BTreeMap;

use crate::cell::Cell;

/// A row: sparse cells keyed by 0-based column plus template metadata
#[derive(Debug, Clone, Default)]
pub struct Row {
    /// Cells keyed by column index
    cells: BTreeMap<u16, Cell>,
    /// Custom height in points (None = default)
    pub height: Option<f64>,
    /// Row is hidden
    pub hidden: bool,
}

impl Row {
    /// Create an empty row with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell by column index
    pub fn cell(&self, col: u16) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Get a mutable cell by column index
    pub fn cell_mut(&mut self, col: u16) -> Option<&mut Cell> {
        self.cells.get_mut(&col)
    }

    /// Get a cell, creating an empty one if absent
    pub fn cell_or_create(&mut self, col: u16) -> &mut Cell {
        self.cells.entry(col).or_default()
    }

    /// Remove a cell, returning it
    pub fn remove_cell(&mut self, col: u16) -> Option<Cell> {
        self.cells.remove(&col)
    }

    /// Iterate over cells in column order
    pub fn cells(&self) -> impl Iterator<Item = (u16, &Cell)> {
        self.cells.iter().map(|(col, cell)| (*col, cell))
    }

    /// Number of cells in row
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check if row has any cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check if this row has any custom settings
    pub fn has_custom_settings(&self) -> bool {
        self.height.is_some() || self.hidden
    }
}
