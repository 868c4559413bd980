//! Workbook: the ordered set of sheets loaded from a template

use crate::error::{Error, Result};
use crate::sheet_name::INVALID_SHEET_NAME_CHARS;
use crate::worksheet::{SheetId, Worksheet};
use crate::MAX_SHEET_NAME_LEN;

/// An in-memory workbook
///
/// Sheets keep their order and a [`SheetId`] that never changes, so callers
/// can hold on to a sheet while others are cloned or removed. A workbook read
/// from a template also carries that template's raw stylesheet.
#[derive(Debug)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    next_id: u32,
    /// Raw `xl/styles.xml`
    styles_xml: Option<Vec<u8>>,
}

impl Workbook {
    /// Workbook holding a single blank "Sheet1"
    pub fn new() -> Self {
        let mut wb = Self::empty();
        wb.push_sheet("Sheet1");
        wb
    }

    /// Workbook without any sheet
    pub fn empty() -> Self {
        Self {
            sheets: Vec::new(),
            next_id: 1,
            styles_xml: None,
        }
    }

    /// Number of sheets
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// True when there are no sheets
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.sheets.get_mut(index)
    }

    pub fn worksheet_by_id(&self, id: SheetId) -> Option<&Worksheet> {
        self.sheets.iter().find(|sheet| sheet.id() == id)
    }

    pub fn worksheet_by_id_mut(&mut self, id: SheetId) -> Option<&mut Worksheet> {
        self.sheets.iter_mut().find(|sheet| sheet.id() == id)
    }

    /// Sheet with this name, ignoring case
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheet_index(name).and_then(|index| self.sheets.get(index))
    }

    /// Position of the sheet with this name, ignoring case
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        let folded = name.to_lowercase();
        self.sheets
            .iter()
            .position(|sheet| sheet.name().to_lowercase() == folded)
    }

    /// Current position of a sheet
    pub fn sheet_index_of(&self, id: SheetId) -> Option<usize> {
        self.sheets.iter().position(|sheet| sheet.id() == id)
    }

    /// Sheets in order
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.sheets.iter()
    }

    /// Append a blank sheet and return its position
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.check_name(name, None)?;
        Ok(self.push_sheet(name))
    }

    /// Duplicate a worksheet and append the copy as the last sheet
    ///
    /// The copy gets a fresh id and a generated name such as `"Data (2)"`.
    pub fn clone_worksheet(&mut self, index: usize) -> Result<usize> {
        let source = self.sheet_at(index)?;
        let copy = source.duplicate(SheetId::new(self.next_id), self.copy_name(source.name()));

        self.next_id += 1;
        self.sheets.push(copy);
        Ok(self.sheets.len() - 1)
    }

    /// Take a sheet out of the workbook
    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet> {
        self.sheet_at(index)?;
        Ok(self.sheets.remove(index))
    }

    /// Give a sheet a new name
    ///
    /// Renaming a sheet to a different casing of its own name is allowed.
    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        let id = self.sheet_at(index)?.id();
        self.check_name(new_name, Some(id))?;
        self.sheets[index].set_name(new_name);
        Ok(())
    }

    /// Raw stylesheet carried from the template
    pub fn styles_xml(&self) -> Option<&[u8]> {
        self.styles_xml.as_deref()
    }

    /// Attach a raw stylesheet
    pub fn set_styles_xml(&mut self, xml: Vec<u8>) {
        self.styles_xml = Some(xml);
    }

    /// True when any sheet holds a formula
    pub fn has_formulas(&self) -> bool {
        self.sheets.iter().any(Worksheet::has_formulas)
    }

    fn sheet_at(&self, index: usize) -> Result<&Worksheet> {
        self.sheets
            .get(index)
            .ok_or(Error::SheetOutOfBounds(index, self.sheets.len()))
    }

    fn push_sheet(&mut self, name: &str) -> usize {
        let id = SheetId::new(self.next_id);
        self.next_id += 1;
        self.sheets.push(Worksheet::new(id, name));
        self.sheets.len() - 1
    }

    /// Reject names the file format cannot store or that clash with
    /// another sheet (ignoring case). `owner` is skipped in the clash check.
    fn check_name(&self, name: &str, owner: Option<SheetId>) -> Result<()> {
        let length = name.chars().count();
        if length == 0 || length > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "'{}' must be 1 to {} characters long",
                name, MAX_SHEET_NAME_LEN
            )));
        }
        if let Some(c) = name.chars().find(|c| INVALID_SHEET_NAME_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!("'{}' contains '{}'", name, c)));
        }

        let folded = name.to_lowercase();
        let clash = self
            .sheets
            .iter()
            .filter(|sheet| Some(sheet.id()) != owner)
            .any(|sheet| sheet.name().to_lowercase() == folded);
        if clash {
            return Err(Error::DuplicateSheetName(name.to_string()));
        }

        Ok(())
    }

    /// First free `"<base> (n)"` name, n >= 2, trimming `base` to fit
    fn copy_name(&self, base: &str) -> String {
        (2..)
            .map(|n| {
                let suffix = format!(" ({})", n);
                let room = MAX_SHEET_NAME_LEN.saturating_sub(suffix.len());
                let stem: String = base.chars().take(room).collect();
                stem + &suffix
            })
            .find(|name| self.check_name(name, None).is_ok())
            .unwrap_or_default()
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(wb: &Workbook) -> Vec<&str> {
        wb.worksheets().map(Worksheet::name).collect()
    }

    #[test]
    fn test_new_has_one_sheet() {
        let wb = Workbook::new();
        assert_eq!(names(&wb), ["Sheet1"]);
        assert!(Workbook::empty().is_empty());
    }

    #[test]
    fn test_names_clash_ignoring_case() {
        let mut wb = Workbook::new();
        assert!(matches!(
            wb.add_worksheet_with_name("SHEET1"),
            Err(Error::DuplicateSheetName(_))
        ));
        assert_eq!(wb.sheet_count(), 1);
    }

    #[test]
    fn test_rejected_names() {
        let mut wb = Workbook::new();
        let too_long = "x".repeat(MAX_SHEET_NAME_LEN + 1);
        for name in ["", "Q1/Q2", "a:b", "[draft]", "why?", "a*", "back\\slash", too_long.as_str()] {
            assert!(
                matches!(wb.add_worksheet_with_name(name), Err(Error::InvalidSheetName(_))),
                "{:?} should be rejected",
                name
            );
        }
        // Full-width forms are legal in the file format
        wb.add_worksheet_with_name("売上／４月").unwrap();
        assert_eq!(wb.sheet_count(), 2);
    }

    #[test]
    fn test_clone_appends_with_copy_name() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Data").unwrap();
        wb.worksheet_mut(1)
            .unwrap()
            .set_value_at(0, 0, "header")
            .unwrap();

        let idx = wb.clone_worksheet(1).unwrap();
        assert_eq!(idx, 2);
        let copy = wb.worksheet(idx).unwrap();
        assert_eq!(copy.name(), "Data (2)");
        assert_eq!(copy.value_at(0, 0).as_string(), Some("header"));
        assert_ne!(wb.worksheet(1).unwrap().id(), copy.id());

        let idx = wb.clone_worksheet(1).unwrap();
        assert_eq!(wb.worksheet(idx).unwrap().name(), "Data (3)");
        assert!(wb.clone_worksheet(7).is_err());
    }

    #[test]
    fn test_copy_name_fits_length_limit() {
        let mut wb = Workbook::empty();
        wb.add_worksheet_with_name(&"月".repeat(MAX_SHEET_NAME_LEN))
            .unwrap();

        let idx = wb.clone_worksheet(0).unwrap();
        let name = wb.worksheet(idx).unwrap().name();
        assert_eq!(name.chars().count(), MAX_SHEET_NAME_LEN);
        assert!(name.ends_with(" (2)"));
    }

    #[test]
    fn test_ids_survive_removal() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Jan").unwrap();
        wb.add_worksheet_with_name("Feb").unwrap();
        let feb = wb.worksheet(2).unwrap().id();

        let removed = wb.remove_worksheet(0).unwrap();
        assert_eq!(removed.name(), "Sheet1");
        assert_eq!(wb.sheet_index_of(feb), Some(1));
        assert_eq!(wb.worksheet_by_id(feb).unwrap().name(), "Feb");
        assert!(matches!(
            wb.remove_worksheet(5),
            Err(Error::SheetOutOfBounds(5, 2))
        ));
    }

    #[test]
    fn test_rename_worksheet() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Data").unwrap();

        wb.rename_worksheet(1, "DATA").unwrap();
        assert_eq!(names(&wb), ["Sheet1", "DATA"]);
        assert_eq!(wb.sheet_index("DATA"), Some(1));
        assert!(wb.rename_worksheet(1, "sheet1").is_err());
        assert!(wb.rename_worksheet(9, "X").is_err());
    }

    #[test]
    fn test_lookup_by_name_ignores_case() {
        let mut wb = Workbook::empty();
        wb.add_worksheet_with_name("Invoice").unwrap();
        wb.add_worksheet_with_name("Ümlaut").unwrap();

        assert_eq!(wb.sheet_index("invoice"), Some(0));
        assert_eq!(wb.sheet_index("INVOICE"), Some(0));
        assert_eq!(wb.sheet_index("ümlaut"), Some(1));
        assert_eq!(wb.worksheet_by_name("iNvOiCe").unwrap().name(), "Invoice");
        assert_eq!(wb.sheet_index("Invoices"), None);
    }
}
