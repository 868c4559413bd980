//! Template workbook façade
//!
//! [`TemplateBook`] wraps a loaded template and a single "current sheet"
//! selection. Cells are addressed with textual references such as `"C5"`
//! (see [`CellReference`] for the column encoding).

use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use stencil_sheets_core::{CellReference, CellValue, SheetId};

use crate::engine::{SpreadsheetEngine, XlsxEngine};
use crate::error::{FillError, FillResult};
use crate::options::FillOptions;

/// Handle to one sheet of a [`TemplateBook`]
///
/// Handles stay valid while other sheets are cloned or deleted. A handle
/// to a deleted sheet yields [`FillError::StaleSheet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SheetHandle(SheetId);

impl SheetHandle {
    /// Underlying sheet id
    pub fn id(self) -> SheetId {
        self.0
    }
}

/// A template workbook being filled
#[derive(Debug)]
pub struct TemplateBook<E: SpreadsheetEngine = XlsxEngine> {
    engine: E,
    options: FillOptions,
    current: Option<SheetHandle>,
}

impl TemplateBook<XlsxEngine> {
    /// Load an XLSX template from a file
    pub fn open<P: AsRef<Path>>(path: P) -> FillResult<Self> {
        let path = path.as_ref();
        let engine = XlsxEngine::open(path)?;
        log::debug!(
            "loaded template {} ({} sheets)",
            path.display(),
            engine.sheet_count()
        );
        Ok(Self::with_engine(engine, FillOptions::default()))
    }

    /// Load an XLSX template from a reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> FillResult<Self> {
        let engine = XlsxEngine::from_reader(reader)?;
        log::debug!("loaded template ({} sheets)", engine.sheet_count());
        Ok(Self::with_engine(engine, FillOptions::default()))
    }

    /// Load an XLSX template held in memory
    ///
    /// Typically used with `include_bytes!` to ship the template inside
    /// the binary.
    pub fn from_bytes(bytes: &[u8]) -> FillResult<Self> {
        let engine = XlsxEngine::from_bytes(bytes)?;
        log::debug!(
            "loaded bundled template ({} bytes, {} sheets)",
            bytes.len(),
            engine.sheet_count()
        );
        Ok(Self::with_engine(engine, FillOptions::default()))
    }
}

impl<E: SpreadsheetEngine> TemplateBook<E> {
    /// Wrap an engine. No sheet is selected.
    pub fn with_engine(engine: E, options: FillOptions) -> Self {
        Self {
            engine,
            options,
            current: None,
        }
    }

    /// Replace the options
    pub fn with_options(mut self, options: FillOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options
    pub fn options(&self) -> &FillOptions {
        &self.options
    }

    /// The engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Unwrap the engine
    pub fn into_engine(self) -> E {
        self.engine
    }

    // === Sheet selection ===

    /// Make the sheet at a 0-based position current
    pub fn select_sheet_at(&mut self, index: usize) -> FillResult<SheetHandle> {
        let id = self
            .engine
            .sheet_id_at(index)
            .ok_or_else(|| FillError::SheetIndexOutOfRange(index, self.engine.sheet_count()))?;
        let handle = SheetHandle(id);
        self.current = Some(handle);
        Ok(handle)
    }

    /// Make the sheet with a name current (case is ignored)
    pub fn select_sheet(&mut self, name: &str) -> FillResult<SheetHandle> {
        let handle = self.handle_by_name(name)?;
        self.current = Some(handle);
        Ok(handle)
    }

    /// Currently selected sheet
    pub fn current_sheet(&self) -> Option<SheetHandle> {
        self.current
    }

    /// Name of the sheet behind a handle
    pub fn sheet_name(&self, handle: SheetHandle) -> FillResult<&str> {
        self.engine
            .sheet_name(handle.0)
            .ok_or(FillError::StaleSheet(handle.0))
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        (0..self.engine.sheet_count())
            .filter_map(|i| self.engine.sheet_id_at(i))
            .filter_map(|id| self.engine.sheet_name(id))
            .map(str::to_owned)
            .collect()
    }

    fn handle_by_name(&self, name: &str) -> FillResult<SheetHandle> {
        self.engine
            .sheet_id_by_name(name)
            .map(SheetHandle)
            .ok_or_else(|| FillError::SheetNotFound(name.to_string()))
    }

    fn current_or_err(&self) -> FillResult<SheetHandle> {
        self.current.ok_or(FillError::NoSheetSelected)
    }

    // === Sheet management ===

    /// Duplicate `template_name` as the last sheet and name it `new_name`
    ///
    /// The name is used verbatim, so a name with forbidden characters is
    /// [`Error::InvalidSheetName`](stencil_sheets_core::Error::InvalidSheetName),
    /// unless [`FillOptions::sanitize_sheet_names`] is set. The current
    /// selection is left unchanged.
    pub fn clone_sheet(&mut self, new_name: &str, template_name: &str) -> FillResult<SheetHandle> {
        let template = self.handle_by_name(template_name)?;
        let name = if self.options.sanitize_sheet_names {
            self.sanitize_sheet_name(new_name)
        } else {
            new_name.to_string()
        };

        let copy = self.engine.clone_sheet(template.0)?;
        if let Err(err) = self.engine.rename_sheet(copy, &name) {
            // Drop the half-made copy; the rename error is the one to report
            if let Err(rollback) = self.engine.remove_sheet(copy) {
                log::warn!("failed to remove copy of '{}': {}", template_name, rollback);
            }
            return Err(err);
        }

        log::debug!("cloned sheet '{}' as '{}'", template_name, name);
        Ok(SheetHandle(copy))
    }

    /// Remove the sheet with a name (case is ignored)
    ///
    /// Deleting the current sheet clears the selection.
    pub fn delete_sheet(&mut self, name: &str) -> FillResult<()> {
        let handle = self.handle_by_name(name)?;
        self.engine.remove_sheet(handle.0)?;
        if self.current == Some(handle) {
            self.current = None;
        }
        log::debug!("deleted sheet '{}'", name);
        Ok(())
    }

    /// Strip characters that are not allowed in sheet names
    pub fn sanitize_sheet_name(&self, name: &str) -> String {
        stencil_sheets_core::sanitize_sheet_name(name)
    }

    // === Cells ===

    /// Write a value into the current sheet
    ///
    /// The row and cell are created when absent; an existing cell keeps
    /// its template style.
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, index: &str, value: V) -> FillResult<()> {
        let handle = self.current_or_err()?;
        self.set_cell_value_in(handle, index, value)
    }

    /// Write a value into a specific sheet
    pub fn set_cell_value_in<V: Into<CellValue>>(
        &mut self,
        handle: SheetHandle,
        index: &str,
        value: V,
    ) -> FillResult<()> {
        let (row, col) = CellReference::parse(index)?.position()?;
        self.engine.cell_mut(handle.0, row, col)?.value = value.into();
        Ok(())
    }

    /// Read the string content of a cell on the current sheet
    pub fn cell_value(&self, index: &str) -> FillResult<String> {
        let handle = self.current_or_err()?;
        self.cell_value_in(handle, index)
    }

    /// Read the string content of a cell on a specific sheet
    ///
    /// A missing cell is [`FillError::CellNotFound`]; a blank cell reads
    /// as `""`; any other non-string content is [`FillError::NotAString`].
    /// Formulas are read through their cached result.
    pub fn cell_value_in(&self, handle: SheetHandle, index: &str) -> FillResult<String> {
        let (row, col) = CellReference::parse(index)?.position()?;
        let cell = self
            .engine
            .cell(handle.0, row, col)?
            .ok_or_else(|| FillError::CellNotFound(index.to_string()))?;

        if cell.value.is_empty() {
            return Ok(String::new());
        }
        cell.value
            .as_string()
            .map(str::to_owned)
            .ok_or_else(|| FillError::NotAString {
                reference: index.to_string(),
                actual: cell.value.type_name(),
            })
    }

    // === Output ===

    /// Serialize the workbook into a sink
    pub fn write_to<W: Write + Seek>(&self, mut sink: W) -> FillResult<()> {
        self.engine.write_to(&mut sink)
    }

    /// Serialize the workbook, logging instead of returning any failure
    pub fn write_best_effort<W: Write + Seek>(&self, sink: W) {
        if let Err(err) = self.write_to(sink) {
            log::error!("failed to write workbook: {}", err);
        }
    }

    /// Serialize the workbook to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> FillResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, SeekFrom};
    use stencil_sheets_core::{Error as CoreError, Workbook};

    fn book() -> TemplateBook {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Template").unwrap();
        let sheet = wb.worksheet_mut(1).unwrap();
        sheet.set_value_at(0, 0, "Title").unwrap();
        sheet.cell_at_mut_or_create(4, 2).unwrap().style = 3;
        TemplateBook::with_engine(XlsxEngine::from_workbook(wb), FillOptions::default())
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for BrokenSink {
        fn seek(&mut self, _: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_nothing_selected() {
        let mut book = book();
        assert!(book.current_sheet().is_none());
        assert!(matches!(
            book.set_cell_value("A1", "x"),
            Err(FillError::NoSheetSelected)
        ));
        assert!(matches!(book.cell_value("A1"), Err(FillError::NoSheetSelected)));
    }

    #[test]
    fn test_select() {
        let mut book = book();
        let by_index = book.select_sheet_at(1).unwrap();
        let by_name = book.select_sheet("Template").unwrap();
        assert_eq!(by_index, by_name);
        assert_eq!(book.current_sheet(), Some(by_name));
        assert_eq!(book.sheet_name(by_name).unwrap(), "Template");

        assert!(matches!(
            book.select_sheet_at(2),
            Err(FillError::SheetIndexOutOfRange(2, 2))
        ));
        assert!(matches!(
            book.select_sheet("Missing"),
            Err(FillError::SheetNotFound(name)) if name == "Missing"
        ));
        // failed selection keeps the previous one
        assert_eq!(book.current_sheet(), Some(by_name));
    }

    #[test]
    fn test_names_match_ignoring_case() {
        let mut book = book();
        let template = book.select_sheet("template").unwrap();
        assert_eq!(book.sheet_name(template).unwrap(), "Template");

        let copy = book.clone_sheet("Copy", "TEMPLATE").unwrap();
        assert_eq!(book.cell_value_in(copy, "A1").unwrap(), "Title");

        book.delete_sheet("sheet1").unwrap();
        assert_eq!(book.sheet_names(), ["Template", "Copy"]);
    }

    #[test]
    fn test_set_and_get() {
        let mut book = book();
        book.select_sheet("Template").unwrap();

        book.set_cell_value("C5", "x").unwrap();
        assert_eq!(book.cell_value("C5").unwrap(), "x");
        assert_eq!(book.cell_value("A1").unwrap(), "Title");

        let handle = book.current_sheet().unwrap();
        let cell = book.engine().cell(handle.id(), 4, 2).unwrap().unwrap();
        assert_eq!(cell.style, 3);
    }

    #[test]
    fn test_get_errors() {
        let mut book = book();
        book.select_sheet("Template").unwrap();
        book.set_cell_value("B2", 42i32).unwrap();

        assert!(matches!(
            book.cell_value("B2"),
            Err(FillError::NotAString { actual: "number", .. })
        ));
        assert!(matches!(
            book.cell_value("Z9"),
            Err(FillError::CellNotFound(r)) if r == "Z9"
        ));
        assert!(matches!(
            book.cell_value("B"),
            Err(FillError::Core(CoreError::InvalidRow(_)))
        ));
        assert!(matches!(
            book.cell_value("A0"),
            Err(FillError::Core(CoreError::RowOutOfBounds(..)))
        ));
    }

    #[test]
    fn test_blank_styled_cell_reads_empty() {
        let mut book = book();
        book.select_sheet("Template").unwrap();
        assert_eq!(book.cell_value("C5").unwrap(), "");
    }

    #[test]
    fn test_clone_rejects_forbidden_name_by_default() {
        let mut book = book();
        assert!(matches!(
            book.clone_sheet("Q1/Q2", "Template"),
            Err(FillError::Core(CoreError::InvalidSheetName(_)))
        ));
        assert_eq!(book.sheet_names(), ["Sheet1", "Template"]);
    }

    #[test]
    fn test_clone_sanitizes_and_keeps_selection() {
        let mut book = book().with_options(FillOptions::new().with_sanitize_sheet_names(true));
        let current = book.select_sheet_at(0).unwrap();

        let copy = book.clone_sheet("2024/01: report", "Template").unwrap();
        assert_eq!(book.sheet_name(copy).unwrap(), "202401 report");
        assert_eq!(book.sheet_names(), ["Sheet1", "Template", "202401 report"]);
        assert_eq!(book.current_sheet(), Some(current));

        book.set_cell_value_in(copy, "A1", "Copy").unwrap();
        assert_eq!(book.cell_value_in(copy, "A1").unwrap(), "Copy");
        let template = book.select_sheet("Template").unwrap();
        assert_eq!(book.cell_value_in(template, "A1").unwrap(), "Title");
    }

    #[test]
    fn test_clone_failure_rolls_back() {
        let mut book = book();

        assert!(book.clone_sheet("a/b", "Template").is_err());
        assert!(book.clone_sheet("sheet1", "Template").is_err());
        assert!(matches!(
            book.clone_sheet("Copy", "Missing"),
            Err(FillError::SheetNotFound(_))
        ));
        assert_eq!(book.sheet_names(), ["Sheet1", "Template"]);
    }

    #[test]
    fn test_delete_current_clears_selection() {
        let mut book = book();
        let handle = book.select_sheet("Template").unwrap();

        book.delete_sheet("Template").unwrap();
        assert!(book.current_sheet().is_none());
        assert!(matches!(
            book.cell_value_in(handle, "A1"),
            Err(FillError::StaleSheet(_))
        ));
        assert!(matches!(
            book.delete_sheet("Template"),
            Err(FillError::SheetNotFound(_))
        ));
    }

    #[test]
    fn test_delete_other_keeps_selection() {
        let mut book = book();
        let handle = book.select_sheet("Template").unwrap();
        book.delete_sheet("Sheet1").unwrap();
        assert_eq!(book.current_sheet(), Some(handle));
        assert_eq!(book.cell_value("A1").unwrap(), "Title");
    }

    #[test]
    fn test_write_to_and_best_effort() {
        let book = book();

        let mut buffer = Cursor::new(Vec::new());
        book.write_to(&mut buffer).unwrap();
        assert!(buffer.get_ref().starts_with(b"PK"));

        assert!(book.write_to(BrokenSink).is_err());
        // must not panic or propagate
        book.write_best_effort(BrokenSink);
    }
}
