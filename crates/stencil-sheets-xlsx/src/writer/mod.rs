//! XLSX writer

use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use crate::address::to_a1;
use crate::error::XlsxResult;
use stencil_sheets_core::{CellValue, Workbook, Worksheet};

/// Stylesheet written when the workbook did not come from a template
const DEFAULT_STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
    <fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
    <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
    <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
    <cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>
    <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#;

/// Inverse of the reader's `_xHHHH_` decoding
///
/// A literal `_x` becomes `_x005F_x` so it cannot be mistaken for an
/// escape, and control characters XML 1.0 cannot carry become `_xHHHH_`.
fn encode_excel_escapes(s: &str) -> Cow<'_, str> {
    let needs_control_escape = |c: char| c < ' ' && !matches!(c, '\t' | '\n' | '\r');
    if !s.contains("_x") && !s.chars().any(needs_control_escape) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 8);
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' && chars.peek() == Some(&'x') {
            out.push_str("_x005F");
        } else if needs_control_escape(c) {
            let _ = write!(out, "_x{:04X}_", u32::from(c));
            continue;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Save a workbook as an `.xlsx` file
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let path = path.as_ref();
        log::debug!("writing workbook to {}", path.display());
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write(workbook, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialize a workbook into any seekable sink
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);

        Self::write_content_types(&mut zip, workbook)?;
        Self::write_root_rels(&mut zip)?;
        Self::write_workbook_xml(&mut zip, workbook)?;
        Self::write_workbook_rels(&mut zip, workbook)?;
        Self::write_styles_xml(&mut zip, workbook)?;

        for (i, sheet) in workbook.worksheets().enumerate() {
            Self::write_worksheet(&mut zip, i, sheet)?;
        }

        zip.finish()?;
        log::debug!("wrote workbook with {} sheet(s)", workbook.sheet_count());
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        );

        // One override per worksheet part
        for i in 0..workbook.sheet_count() {
            let _ = write!(
                content,
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            );
        }

        content.push_str("\n</Types>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_root_rels<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("_rels/.rels", options)?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/workbook.xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>"#,
        );

        for (i, sheet) in workbook.worksheets().enumerate() {
            let _ = write!(
                content,
                r#"
        <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                Self::escape_xml(sheet.name()),
                i + 1,
                i + 1
            );
        }

        content.push_str("\n    </sheets>");

        // Template formulas are not evaluated here, so let the application do it
        if workbook.has_formulas() {
            content.push_str("\n    <calcPr fullCalcOnLoad=\"1\"/>");
        }

        content.push_str("\n</workbook>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..workbook.sheet_count() {
            let _ = write!(
                content,
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            );
        }

        // Styles relationship
        let _ = write!(
            content,
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            workbook.sheet_count() + 1
        );

        content.push_str("\n</Relationships>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_styles_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/styles.xml", options)?;
        match workbook.styles_xml() {
            Some(xml) => zip.write_all(xml)?,
            None => zip.write_all(DEFAULT_STYLES_XML.as_bytes())?,
        }
        Ok(())
    }

    fn write_worksheet<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        index: usize,
        sheet: &Worksheet,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        Self::write_columns(&mut content, sheet);

        content.push_str("\n    <sheetData>");

        for (row_idx, row) in sheet.iter_rows() {
            let _ = write!(content, "\n        <row r=\"{}\"", row_idx + 1);
            if let Some(height) = row.height {
                let _ = write!(content, " ht=\"{}\" customHeight=\"1\"", height);
            }
            if row.hidden {
                content.push_str(" hidden=\"1\"");
            }
            content.push('>');

            for (col, cell) in row.cells() {
                let cell_ref = to_a1(row_idx, col);
                let style_attr = if cell.style != 0 {
                    format!(" s=\"{}\"", cell.style)
                } else {
                    String::new()
                };

                content.push_str("\n            ");
                Self::write_cell(&mut content, &cell_ref, &style_attr, &cell.value);
            }

            content.push_str("\n        </row>");
        }

        content.push_str("\n    </sheetData>");

        let merged = sheet.merged_ranges();
        if !merged.is_empty() {
            let _ = write!(content, "\n    <mergeCells count=\"{}\">", merged.len());
            for range in merged {
                let _ = write!(
                    content,
                    "\n        <mergeCell ref=\"{}\"/>",
                    Self::escape_xml(range)
                );
            }
            content.push_str("\n    </mergeCells>");
        }

        content.push_str("\n</worksheet>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_columns(content: &mut String, sheet: &Worksheet) {
        let columns = sheet.columns();
        if columns.is_empty() {
            return;
        }

        content.push_str("\n    <cols>");
        for col in columns {
            let _ = write!(content, "\n        <col min=\"{}\" max=\"{}\"", col.min, col.max);
            if let Some(width) = col.width {
                let _ = write!(content, " width=\"{}\" customWidth=\"1\"", width);
            }
            if let Some(style) = col.style {
                let _ = write!(content, " style=\"{}\"", style);
            }
            if col.hidden {
                content.push_str(" hidden=\"1\"");
            }
            content.push_str("/>");
        }
        content.push_str("\n    </cols>");
    }

    fn write_cell(content: &mut String, cell_ref: &str, style_attr: &str, value: &CellValue) {
        match value {
            CellValue::Number(n) if n.is_finite() => {
                let _ = write!(content, "<c r=\"{}\"{}><v>{}</v></c>", cell_ref, style_attr, n);
            }
            CellValue::Number(_) => {
                let _ = write!(
                    content,
                    "<c r=\"{}\"{} t=\"e\"><v>#NUM!</v></c>",
                    cell_ref, style_attr
                );
            }
            CellValue::String(s) => {
                let space = if s.trim() != s.as_str() {
                    " xml:space=\"preserve\""
                } else {
                    ""
                };
                let _ = write!(
                    content,
                    "<c r=\"{}\"{} t=\"inlineStr\"><is><t{}>{}</t></is></c>",
                    cell_ref,
                    style_attr,
                    space,
                    Self::escape_text(s)
                );
            }
            CellValue::Boolean(b) => {
                let _ = write!(
                    content,
                    "<c r=\"{}\"{} t=\"b\"><v>{}</v></c>",
                    cell_ref,
                    style_attr,
                    if *b { 1 } else { 0 }
                );
            }
            CellValue::Error(e) => {
                let _ = write!(
                    content,
                    "<c r=\"{}\"{} t=\"e\"><v>{}</v></c>",
                    cell_ref,
                    style_attr,
                    Self::escape_text(e)
                );
            }
            CellValue::Formula { text, cached } => {
                let (type_attr, cached_xml) = match cached.as_deref() {
                    Some(CellValue::Number(n)) if n.is_finite() => ("", format!("<v>{}</v>", n)),
                    Some(CellValue::String(s)) => {
                        (" t=\"str\"", format!("<v>{}</v>", Self::escape_text(s)))
                    }
                    Some(CellValue::Boolean(b)) => {
                        (" t=\"b\"", format!("<v>{}</v>", if *b { 1 } else { 0 }))
                    }
                    Some(CellValue::Error(e)) => {
                        (" t=\"e\"", format!("<v>{}</v>", Self::escape_text(e)))
                    }
                    _ => ("", String::new()),
                };
                let _ = write!(
                    content,
                    "<c r=\"{}\"{}{}><f>{}</f>{}</c>",
                    cell_ref,
                    style_attr,
                    type_attr,
                    Self::escape_xml(text),
                    cached_xml
                );
            }
            CellValue::Empty => {
                // Styled blanks keep template formatting
                let _ = write!(content, "<c r=\"{}\"{}/>", cell_ref, style_attr);
            }
        }
    }

    /// Cell text: Excel's `_xHHHH_` escapes first, then XML escaping
    fn escape_text(s: &str) -> String {
        Self::escape_xml(&encode_excel_escapes(s))
    }

    fn escape_xml(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XlsxReader;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Read};

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn write_to_vec(workbook: &Workbook) -> Vec<u8> {
        let mut buf = Vec::new();
        XlsxWriter::write(workbook, Cursor::new(&mut buf)).unwrap();
        buf
    }

    #[test]
    fn test_write_escapes_sheet_names_and_text() {
        let mut wb = Workbook::empty();
        wb.add_worksheet_with_name("R&D <2024>").unwrap();
        wb.worksheet_mut(0)
            .unwrap()
            .set_value_at(0, 0, "a < b & c")
            .unwrap();

        let buf = write_to_vec(&wb);
        assert!(part(&buf, "xl/workbook.xml").contains(r#"name="R&amp;D &lt;2024&gt;""#));
        assert!(part(&buf, "xl/worksheets/sheet1.xml").contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_encode_excel_escapes() {
        assert_eq!(encode_excel_escapes("plain"), "plain");
        assert_eq!(encode_excel_escapes("code_x0041_"), "code_x005F_x0041_");
        assert_eq!(encode_excel_escapes("a\u{1}b\u{1f}"), "a_x0001_b_x001F_");
        assert_eq!(encode_excel_escapes("tab\tline\r\n"), "tab\tline\r\n");
        assert_eq!(encode_excel_escapes("snake_case"), "snake_case");
    }

    #[test]
    fn test_escaped_text_roundtrip() {
        let texts = ["code_x0041_", "a\u{1}b", "_x005F_", "bell\u{7}_x000D_"];
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        for (col, text) in texts.iter().enumerate() {
            sheet.set_value_at(0, col as u16, *text).unwrap();
        }
        sheet
            .set_value_at(
                1,
                0,
                CellValue::Formula {
                    text: "A1".into(),
                    cached: Some(Box::new(CellValue::string("x_x0009_\u{2}"))),
                },
            )
            .unwrap();

        let buf = write_to_vec(&wb);
        let xml = part(&buf, "xl/worksheets/sheet1.xml");
        assert!(!xml.contains('\u{1}'));
        assert!(!xml.contains('\u{2}'));

        let wb2 = XlsxReader::read(Cursor::new(buf)).unwrap();
        let sheet2 = wb2.worksheet(0).unwrap();
        for (col, text) in texts.iter().enumerate() {
            assert_eq!(sheet2.value_at(0, col as u16).as_string(), Some(*text));
        }
        assert_eq!(sheet2.value_at(1, 0).as_string(), Some("x_x0009_\u{2}"));
    }

    #[test]
    fn test_write_uses_template_styles() {
        let mut wb = Workbook::new();
        wb.set_styles_xml(b"<styleSheet>custom</styleSheet>".to_vec());

        let buf = write_to_vec(&wb);
        assert_eq!(part(&buf, "xl/styles.xml"), "<styleSheet>custom</styleSheet>");
    }

    #[test]
    fn test_write_default_styles() {
        let buf = write_to_vec(&Workbook::new());
        assert!(part(&buf, "xl/styles.xml").contains("<cellXfs count=\"1\">"));
    }

    #[test]
    fn test_formula_requests_recalculation() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_value_at(0, 0, 2i32).unwrap();
        sheet.set_value_at(0, 1, CellValue::formula("=A1*2")).unwrap();

        let buf = write_to_vec(&wb);
        assert!(part(&buf, "xl/workbook.xml").contains("fullCalcOnLoad=\"1\""));
        assert!(part(&buf, "xl/worksheets/sheet1.xml").contains("<c r=\"B1\"><f>A1*2</f></c>"));
    }

    #[test]
    fn test_roundtrip_values_and_formatting() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_value_at(0, 0, "Name").unwrap();
        sheet.set_value_at(0, 1, " padded ").unwrap();
        sheet.set_value_at(4, 2, 42i32).unwrap();
        sheet.set_value_at(4, 3, true).unwrap();
        sheet.cell_at_mut_or_create(5, 0).unwrap().style = 3;
        sheet.row_or_create(7).unwrap().hidden = true;
        sheet.add_merged_range("A1:B1");

        let wb2 = XlsxReader::read(Cursor::new(write_to_vec(&wb))).unwrap();
        let sheet2 = wb2.worksheet(0).unwrap();

        assert_eq!(sheet2.value_at(0, 0).as_string(), Some("Name"));
        assert_eq!(sheet2.value_at(0, 1).as_string(), Some(" padded "));
        assert_eq!(sheet2.value_at(4, 2).as_number(), Some(42.0));
        assert_eq!(sheet2.value_at(4, 3).as_bool(), Some(true));
        assert_eq!(sheet2.cell_at(5, 0).unwrap().style, 3);
        assert!(sheet2.row(7).unwrap().hidden);
        assert_eq!(sheet2.merged_ranges(), ["A1:B1".to_string()]);
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        let mut wb = Workbook::new();
        wb.worksheet_mut(0).unwrap().set_value_at(2, 1, 7.5).unwrap();
        XlsxWriter::write_file(&wb, &path).unwrap();

        let wb2 = XlsxReader::read_file(&path).unwrap();
        assert_eq!(wb2.worksheet(0).unwrap().value_at(2, 1).as_number(), Some(7.5));
    }
}
