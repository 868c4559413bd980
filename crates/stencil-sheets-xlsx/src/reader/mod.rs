//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::address::{parse_a1, to_a1};
use crate::error::{XlsxError, XlsxResult};
use crate::shared_formula::SharedFormula;
use stencil_sheets_core::{Cell, CellValue, ColumnRange, Error as CoreError, Workbook, Worksheet};

/// Undo the `_xHHHH_` escapes Excel uses for control characters
/// (`_x000d_` is CR, `_x005f_` a literal underscore)
fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = tail
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| tail.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &tail[7..];
            }
            None => {
                out.push_str("_x");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Read an attribute value by key
fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Namespaces a relationship id attribute (`r:id`) can live in
const RELATIONSHIP_NAMESPACES: [&[u8]; 2] = [
    b"http://schemas.openxmlformats.org/officeDocument/2006/relationships",
    b"http://purl.oclc.org/ooxml/officeDocument/relationships",
];

/// Remember every prefix `e` binds to a relationships namespace
fn collect_relationship_prefixes(e: &BytesStart, prefixes: &mut Vec<Vec<u8>>) {
    for a in e.attributes().flatten() {
        if let Some(prefix) = a.key.as_ref().strip_prefix(b"xmlns:") {
            if RELATIONSHIP_NAMESPACES.iter().any(|ns| *ns == a.value.as_ref()) {
                prefixes.push(prefix.to_vec());
            }
        }
    }
}

/// The relationship `id` attribute, whatever prefix the file bound to it
fn relationship_id(e: &BytesStart, prefixes: &[Vec<u8>]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| {
            a.key.local_name().as_ref() == b"id"
                && a.key
                    .prefix()
                    .map_or(false, |p| prefixes.iter().any(|known| known.as_slice() == p.as_ref()))
        })
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn attr_flag(e: &BytesStart, key: &[u8]) -> bool {
    attr(e, key).map_or(false, |v| v == "1" || v == "true")
}

/// A `<c>` element collected while its children are read
#[derive(Default)]
struct PendingCell {
    position: Option<(u32, u16)>,
    cell_type: Option<String>,
    style: u32,
    value: Option<String>,
    inline: Option<String>,
    formula: Option<String>,
    /// `si` of a `t="shared"` formula
    shared_index: Option<u32>,
}

/// Cursor for cells and rows that omit their `r` attribute
#[derive(Default)]
struct SheetCursor {
    row: Option<u32>,
    col: Option<u16>,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Load a workbook from an `.xlsx` file
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let path = path.as_ref();
        log::debug!("reading workbook from {}", path.display());
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Load a workbook from any seekable byte source
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::NotAWorkbook(
                "no [Content_Types].xml in archive".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let styles_xml = Self::read_styles(&mut archive)?;
        let sheet_info = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::empty();
        if let Some(xml) = styles_xml {
            workbook.set_styles_xml(xml);
        }

        for (name, r_id) in &sheet_info {
            let Some(path) = sheet_paths.get(r_id) else {
                log::warn!("sheet '{}' has no worksheet relationship {}", name, r_id);
                continue;
            };

            let sheet_idx = workbook.add_worksheet_with_name(name)?;
            let count = workbook.sheet_count();
            let worksheet = workbook
                .worksheet_mut(sheet_idx)
                .ok_or(CoreError::SheetOutOfBounds(sheet_idx, count))?;
            Self::read_worksheet(&mut archive, path, worksheet, &shared_strings)?;
        }

        log::debug!(
            "read workbook with {} sheet(s), {} shared string(s)",
            workbook.sheet_count(),
            shared_strings.len()
        );

        Ok(workbook)
    }

    /// `xl/sharedStrings.xml`; rich runs are joined, phonetic runs dropped
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings),
        };

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current_string = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current_string));
                        current_string.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    current_string.push_str(&e.unescape()?);
                }
                Ok(Event::CData(e)) if in_t => {
                    current_string.push_str(&String::from_utf8_lossy(&e));
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Keep the stylesheet verbatim so cell style indices stay meaningful
    fn read_styles<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Option<Vec<u8>>> {
        let mut file = match archive.by_name("xl/styles.xml") {
            Ok(f) => f,
            Err(_) => return Ok(None),
        };
        let mut xml = Vec::new();
        file.read_to_end(&mut xml)?;
        Ok(Some(xml))
    }

    /// Sheet names and relationship ids, in workbook order
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();
        let mut rel_prefixes = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                    collect_relationship_prefixes(&e, &mut rel_prefixes);
                    if e.local_name().as_ref() == b"sheet" {
                        let r_id = relationship_id(&e, &rel_prefixes)
                            .or_else(|| attr(&e, b"r:id"));
                        if let (Some(name), Some(r_id)) = (attr(&e, b"name"), r_id) {
                            sheets.push((name, r_id));
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Relationship id → worksheet part path
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attr(&e, b"Id");
                    let target = attr(&e, b"Target");
                    let rel_type = attr(&e, b"Type");

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Relative targets are rooted at xl/
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Fill `worksheet` from its XML part
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut cursor = SheetCursor::default();
        let mut pending: Option<PendingCell> = None;
        let mut in_value = false;
        let mut in_formula = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;
        let mut in_phonetic = false;
        let mut shared_formulas: HashMap<u32, SharedFormula> = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => Self::read_row_attrs(&e, worksheet, &mut cursor)?,
                    b"c" => pending = Some(Self::start_cell(&e, &mut cursor)?),
                    b"v" if pending.is_some() => in_value = true,
                    b"f" => {
                        if let Some(cell) = pending.as_mut() {
                            Self::start_formula(&e, cell);
                            in_formula = true;
                        }
                    }
                    b"is" => {
                        if let Some(cell) = pending.as_mut() {
                            cell.inline = Some(String::new());
                            in_inline_str = true;
                        }
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_inline_str && !in_phonetic => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"row" => Self::read_row_attrs(&e, worksheet, &mut cursor)?,
                    b"c" => {
                        let cell = Self::start_cell(&e, &mut cursor)?;
                        Self::process_cell(worksheet, cell, shared_strings, &mut shared_formulas)?;
                    }
                    b"f" => {
                        // Usually a shared formula follower
                        if let Some(cell) = pending.as_mut() {
                            Self::start_formula(&e, cell);
                        }
                    }
                    b"col" => worksheet.add_column_range(Self::parse_column(&e)),
                    b"mergeCell" => {
                        if let Some(range) = attr(&e, b"ref") {
                            worksheet.add_merged_range(range);
                        }
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        if let Some(cell) = pending.take() {
                            Self::process_cell(worksheet, cell, shared_strings, &mut shared_formulas)?;
                        }
                    }
                    b"v" => in_value = false,
                    b"f" => in_formula = false,
                    b"is" => in_inline_str = false,
                    b"t" => in_inline_text = false,
                    b"rPh" => in_phonetic = false,
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if let Some(cell) = pending.as_mut() {
                        let target = if in_value {
                            Some(&mut cell.value)
                        } else if in_formula {
                            Some(&mut cell.formula)
                        } else if in_inline_text {
                            Some(&mut cell.inline)
                        } else {
                            None
                        };
                        if let Some(target) = target {
                            target
                                .get_or_insert_with(String::new)
                                .push_str(&e.unescape()?);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    fn read_row_attrs(
        e: &BytesStart,
        worksheet: &mut Worksheet,
        cursor: &mut SheetCursor,
    ) -> XlsxResult<()> {
        let row_idx = match attr(e, b"r").and_then(|s| s.parse::<u32>().ok()) {
            Some(r) => r.saturating_sub(1), // 1-based to 0-based
            None => cursor.row.map_or(0, |r| r + 1),
        };
        cursor.row = Some(row_idx);
        cursor.col = None;

        let height = if attr_flag(e, b"customHeight") {
            attr(e, b"ht").and_then(|s| s.parse::<f64>().ok())
        } else {
            None
        };
        let hidden = attr_flag(e, b"hidden");

        if height.is_some() || hidden {
            let row = worksheet.row_or_create(row_idx)?;
            row.height = height;
            row.hidden = hidden;
        }

        Ok(())
    }

    fn start_cell(e: &BytesStart, cursor: &mut SheetCursor) -> XlsxResult<PendingCell> {
        let position = match attr(e, b"r") {
            Some(cell_ref) => {
                parse_a1(&cell_ref).ok_or(XlsxError::BadCellReference(cell_ref))?
            }
            None => (
                cursor.row.unwrap_or(0),
                cursor.col.map_or(0, |c| c.saturating_add(1)),
            ),
        };
        cursor.row = Some(position.0);
        cursor.col = Some(position.1);

        Ok(PendingCell {
            position: Some(position),
            cell_type: attr(e, b"t"),
            style: attr(e, b"s").and_then(|s| s.parse().ok()).unwrap_or(0),
            ..PendingCell::default()
        })
    }

    fn start_formula(e: &BytesStart, cell: &mut PendingCell) {
        cell.formula = Some(String::new());
        if attr(e, b"t").as_deref() == Some("shared") {
            cell.shared_index = attr(e, b"si").and_then(|s| s.parse().ok());
        }
    }

    fn parse_column(e: &BytesStart) -> ColumnRange {
        let min = attr(e, b"min").and_then(|s| s.parse().ok()).unwrap_or(1);
        ColumnRange {
            min,
            max: attr(e, b"max").and_then(|s| s.parse().ok()).unwrap_or(min),
            width: attr(e, b"width").and_then(|s| s.parse().ok()),
            style: attr(e, b"style").and_then(|s| s.parse().ok()),
            hidden: attr_flag(e, b"hidden"),
        }
    }

    /// Store a finished `<c>`; blank unstyled cells are dropped
    ///
    /// A shared formula master is remembered in `shared_formulas` so that
    /// its followers, which come later in the sheet, get their own text.
    fn process_cell(
        worksheet: &mut Worksheet,
        cell: PendingCell,
        shared_strings: &[String],
        shared_formulas: &mut HashMap<u32, SharedFormula>,
    ) -> XlsxResult<()> {
        let Some((row, col)) = cell.position else {
            return Ok(());
        };
        let cell_type = cell.cell_type.as_deref();

        let formula = match (cell.formula, cell.shared_index) {
            (Some(text), Some(si)) if !text.is_empty() => {
                shared_formulas.insert(si, SharedFormula::new(row, col, text.clone()));
                Some(text)
            }
            (Some(_), Some(si)) => match shared_formulas.get(&si) {
                Some(master) => Some(master.text_at(row, col)),
                None => {
                    log::warn!(
                        "shared formula {} has no master before {}; keeping the cached value",
                        si,
                        to_a1(row, col)
                    );
                    None
                }
            },
            (formula, _) => formula,
        };

        let value = match (formula, cell.value, cell.inline) {
            (Some(text), cached, _) if !text.is_empty() => CellValue::Formula {
                text,
                cached: cached
                    .and_then(|v| Self::decode_value(cell_type, &v, shared_strings).ok())
                    .map(Box::new),
            },
            (_, _, Some(inline)) => CellValue::String(decode_excel_escapes(&inline)),
            (_, Some(raw), None) => Self::decode_value(cell_type, &raw, shared_strings)?,
            (_, None, None) => CellValue::Empty,
        };

        if value.is_empty() && cell.style == 0 {
            return Ok(());
        }

        *worksheet.cell_at_mut_or_create(row, col)? = Cell::with_style(value, cell.style);
        Ok(())
    }

    fn decode_value(
        cell_type: Option<&str>,
        raw: &str,
        shared_strings: &[String],
    ) -> XlsxResult<CellValue> {
        let value = match cell_type {
            Some("s") => {
                let s = raw
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| shared_strings.get(idx))
                    .ok_or_else(|| XlsxError::SharedStringIndex {
                        index: raw.to_string(),
                        count: shared_strings.len(),
                    })?;
                CellValue::String(s.clone())
            }
            Some("b") => CellValue::Boolean(raw == "1" || raw.eq_ignore_ascii_case("true")),
            Some("e") => CellValue::Error(decode_excel_escapes(raw)),
            Some("str") | Some("inlineStr") => CellValue::String(decode_excel_escapes(raw)),
            None | Some("n") => match raw.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => {
                    log::warn!("non-numeric value '{}' in numeric cell kept as text", raw);
                    CellValue::String(raw.to_string())
                }
            },
            Some(other) => {
                log::warn!("unknown cell type '{}' read as text", other);
                CellValue::String(raw.to_string())
            }
        };

        Ok(value)
    }
}
