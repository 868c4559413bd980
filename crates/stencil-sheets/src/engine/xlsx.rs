use std::io::{Cursor, Read, Seek};
use std::path::Path;

use stencil_sheets_core::{Cell, SheetId, Workbook};
use stencil_sheets_xlsx::{XlsxReader, XlsxWriter};

use super::{SpreadsheetEngine, WriteSeek};
use crate::error::{FillError, FillResult};

/// Engine backed by the in-memory workbook and the XLSX codec
#[derive(Debug, Default)]
pub struct XlsxEngine {
    workbook: Workbook,
}

impl XlsxEngine {
    /// Load a template from a file
    pub fn open<P: AsRef<Path>>(path: P) -> FillResult<Self> {
        Ok(Self::from_workbook(XlsxReader::read_file(path)?))
    }

    /// Load a template from a reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> FillResult<Self> {
        Ok(Self::from_workbook(XlsxReader::read(reader)?))
    }

    /// Load a template bundled into the binary (e.g., with `include_bytes!`)
    pub fn from_bytes(bytes: &[u8]) -> FillResult<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Wrap an existing workbook
    pub fn from_workbook(workbook: Workbook) -> Self {
        Self { workbook }
    }

    /// The underlying workbook
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Unwrap the underlying workbook
    pub fn into_workbook(self) -> Workbook {
        self.workbook
    }

    fn index_of(&self, sheet: SheetId) -> FillResult<usize> {
        self.workbook
            .sheet_index_of(sheet)
            .ok_or(FillError::StaleSheet(sheet))
    }
}

impl SpreadsheetEngine for XlsxEngine {
    fn sheet_count(&self) -> usize {
        self.workbook.sheet_count()
    }

    fn sheet_id_at(&self, index: usize) -> Option<SheetId> {
        self.workbook.worksheet(index).map(|ws| ws.id())
    }

    fn sheet_id_by_name(&self, name: &str) -> Option<SheetId> {
        self.workbook.worksheet_by_name(name).map(|ws| ws.id())
    }

    fn sheet_name(&self, sheet: SheetId) -> Option<&str> {
        self.workbook.worksheet_by_id(sheet).map(|ws| ws.name())
    }

    fn clone_sheet(&mut self, template: SheetId) -> FillResult<SheetId> {
        let index = self.index_of(template)?;
        let copy = self.workbook.clone_worksheet(index)?;
        self.sheet_id_at(copy)
            .ok_or(FillError::SheetIndexOutOfRange(copy, self.sheet_count()))
    }

    fn rename_sheet(&mut self, sheet: SheetId, name: &str) -> FillResult<()> {
        let index = self.index_of(sheet)?;
        self.workbook.rename_worksheet(index, name)?;
        Ok(())
    }

    fn remove_sheet(&mut self, sheet: SheetId) -> FillResult<()> {
        let index = self.index_of(sheet)?;
        self.workbook.remove_worksheet(index)?;
        Ok(())
    }

    fn cell(&self, sheet: SheetId, row: u32, col: u16) -> FillResult<Option<&Cell>> {
        let worksheet = self
            .workbook
            .worksheet_by_id(sheet)
            .ok_or(FillError::StaleSheet(sheet))?;
        Ok(worksheet.cell_at(row, col))
    }

    fn cell_mut(&mut self, sheet: SheetId, row: u32, col: u16) -> FillResult<&mut Cell> {
        let worksheet = self
            .workbook
            .worksheet_by_id_mut(sheet)
            .ok_or(FillError::StaleSheet(sheet))?;
        Ok(worksheet.cell_at_mut_or_create(row, col)?)
    }

    fn write_to(&self, sink: &mut dyn WriteSeek) -> FillResult<()> {
        XlsxWriter::write(&self.workbook, sink)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_sheets_core::CellValue;

    #[test]
    fn test_ids_follow_sheets() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Template").unwrap();
        let mut engine = XlsxEngine::from_workbook(wb);

        let template = engine.sheet_id_by_name("Template").unwrap();
        let copy = engine.clone_sheet(template).unwrap();
        assert_eq!(engine.sheet_count(), 3);
        assert_eq!(engine.sheet_id_at(2), Some(copy));

        let first = engine.sheet_id_at(0).unwrap();
        engine.remove_sheet(first).unwrap();
        assert_eq!(engine.sheet_id_at(1), Some(copy));
        assert!(matches!(
            engine.cell(first, 0, 0),
            Err(FillError::StaleSheet(id)) if id == first
        ));
    }

    #[test]
    fn test_cell_mut_creates() {
        let mut engine = XlsxEngine::default();
        let sheet = engine.sheet_id_at(0).unwrap();

        assert!(engine.cell(sheet, 3, 1).unwrap().is_none());
        engine.cell_mut(sheet, 3, 1).unwrap().value = CellValue::from("x");
        assert_eq!(
            engine.cell(sheet, 3, 1).unwrap().unwrap().value.as_string(),
            Some("x")
        );
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(matches!(
            XlsxEngine::from_bytes(b"not a workbook"),
            Err(FillError::Xlsx(_))
        ));
    }
}
