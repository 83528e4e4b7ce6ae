//! Fill colors, fonts and merge areas read straight from an xlsx package.
//!
//! calamine only exposes cell values, so the styling the schedule relies on is
//! recovered here from `xl/styles.xml` and the worksheet parts. Only cells
//! inside the requested window are kept.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

use super::types::{Alignment, BoundedRegion, FontStyle, HorizontalAlign, Rgb, ScheduleError, VerticalAlign};

/// A merged rectangle, 1-based inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeArea {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl MergeArea {
    pub fn row_span(&self) -> u32 {
        self.end_row + 1 - self.start_row
    }

    pub fn col_span(&self) -> u32 {
        self.end_col + 1 - self.start_col
    }

    pub fn is_single_cell(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }

    pub fn as_region(&self) -> BoundedRegion {
        BoundedRegion::new(self.start_row, self.end_row, self.start_col, self.end_col)
    }
}

/// Visual attributes of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellDecor {
    pub fill: Option<Rgb>,
    pub font: FontStyle,
    pub align: Alignment,
}

/// Styling and merges of one worksheet
#[derive(Debug, Default)]
pub struct SheetDecor {
    pub cells: HashMap<(u32, u32), CellDecor>,
    pub merges: Vec<MergeArea>,
}

impl SheetDecor {
    pub fn decor_at(&self, row: u32, col: u32) -> CellDecor {
        self.cells.get(&(row, col)).copied().unwrap_or_default()
    }

    /// Last window row that shows something without holding a value: a
    /// fill or the tail of a merge
    pub fn last_visible_row(&self, window: &BoundedRegion) -> u32 {
        let filled = self
            .cells
            .iter()
            .filter(|(_, decor)| decor.fill.is_some())
            .map(|((row, _), _)| *row);
        let merged = self
            .merges
            .iter()
            .filter(|area| !area.is_single_cell())
            .filter_map(|area| area.as_region().intersect(window))
            .map(|visible| visible.end_row);
        filled.chain(merged).max().unwrap_or(0)
    }
}

/// Resolved `cellXfs` table, indexed by the `s` attribute of a cell
#[derive(Debug, Default)]
struct StyleTable {
    xfs: Vec<CellDecor>,
}

/// Read decor for every sheet of an xlsx file, keyed by sheet name
pub fn read_xlsx_decor(
    path: &Path,
    window: &BoundedRegion,
) -> Result<HashMap<String, SheetDecor>, ScheduleError> {
    let file = File::open(path).map_err(|e| ScheduleError::unreadable(path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| ScheduleError::unreadable(path, e))?;

    let styles = parse_styles(&mut archive).map_err(|e| ScheduleError::unreadable(path, e))?;
    let sheets = sheet_parts(&mut archive).map_err(|e| ScheduleError::unreadable(path, e))?;

    let mut decor = HashMap::new();
    for (name, part) in sheets {
        let sheet = parse_sheet_decor(&mut archive, &part, &styles, window)
            .map_err(|e| ScheduleError::unreadable(path, format!("{}: {}", part, e)))?;
        decor.insert(name, sheet);
    }
    Ok(decor)
}

/// Parse a cell reference like "B3" into (row, col), both 1-based
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.trim().replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let value = (c.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        col = col.checked_mul(26)?.checked_add(value)?;
    }
    let row: u32 = digits.parse().ok()?;
    (row > 0).then_some((row, col))
}

/// Parse a merge reference like "B2:D2"
fn parse_merge_ref(reference: &str) -> Option<MergeArea> {
    let (start, end) = reference.split_once(':')?;
    let (start_row, start_col) = parse_cell_ref(start)?;
    let (end_row, end_col) = parse_cell_ref(end)?;
    Some(MergeArea {
        start_row: start_row.min(end_row),
        start_col: start_col.min(end_col),
        end_row: start_row.max(end_row),
        end_col: start_col.max(end_col),
    })
}

fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return std::str::from_utf8(&attr.value).ok().map(|s| s.to_string());
        }
    }
    None
}

fn attr_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            return std::str::from_utf8(&attr.value).ok().map(|s| s.to_string());
        }
    }
    None
}

fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.parse().ok())
}

/// `<b/>` and `<b val="1"/>` are on, `<b val="0"/>` is off
fn attr_flag(e: &BytesStart) -> bool {
    attr_string(e, b"val").map_or(true, |v| matches!(v.as_str(), "1" | "true"))
}

fn rgb_attr(e: &BytesStart) -> Option<Rgb> {
    let rgb = attr_string(e, b"rgb")?;
    if rgb.eq_ignore_ascii_case("00000000") {
        return None;
    }
    Rgb::from_hex(&rgb)
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
) -> Result<Option<String>, String> {
    let mut file = match archive.by_name(part) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml).map_err(|e| e.to_string())?;
    Ok(Some(xml))
}

/// Map sheet names to their worksheet part paths, in workbook order
fn sheet_parts<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<(String, String)>, String> {
    let mut targets: HashMap<String, String> = HashMap::new();
    if let Some(rels) = read_part(archive, "xl/_rels/workbook.xml.rels")? {
        let mut xml = Reader::from_str(&rels);
        xml.trim_text(true);
        loop {
            match xml.read_event() {
                Ok(Event::Empty(ref e) | Event::Start(ref e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    if let (Some(id), Some(target)) =
                        (attr_string(e, b"Id"), attr_string(e, b"Target"))
                    {
                        let full_path = match target.strip_prefix('/') {
                            Some(stripped) => stripped.to_string(),
                            None => format!("xl/{}", target),
                        };
                        targets.insert(id, full_path);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(format!("workbook relationships: {}", e)),
                _ => {}
            }
        }
    }

    let workbook = read_part(archive, "xl/workbook.xml")?
        .ok_or_else(|| "missing xl/workbook.xml".to_string())?;
    let mut xml = Reader::from_str(&workbook);
    xml.trim_text(true);

    let mut sheets = Vec::new();
    loop {
        match xml.read_event() {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) if e.local_name().as_ref() == b"sheet" => {
                let name = attr_string(e, b"name");
                let part = attr_local(e, b"id").and_then(|id| targets.get(&id).cloned());
                if let (Some(name), Some(part)) = (name, part) {
                    sheets.push((name, part));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("workbook: {}", e)),
            _ => {}
        }
    }
    Ok(sheets)
}

/// Parse fills, fonts and `cellXfs` into a lookup by style index
fn parse_styles<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<StyleTable, String> {
    let Some(styles) = read_part(archive, "xl/styles.xml")? else {
        return Ok(StyleTable::default());
    };

    let mut fills: Vec<Option<Rgb>> = Vec::new();
    let mut fonts: Vec<FontStyle> = Vec::new();
    let mut xf_refs: Vec<(u32, u32, Alignment)> = Vec::new();

    let mut in_fills = false;
    let mut in_fonts = false;
    let mut in_cell_xfs = false;
    let mut pattern_visible = false;

    let mut xml = Reader::from_str(&styles);
    xml.trim_text(true);
    loop {
        let event = xml.read_event();
        let is_start = matches!(event, Ok(Event::Start(_)));
        match event {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => {
                match e.local_name().as_ref() {
                    b"fills" => in_fills = is_start,
                    b"fonts" => in_fonts = is_start,
                    b"cellXfs" => in_cell_xfs = is_start,
                    b"fill" if in_fills => fills.push(None),
                    b"patternFill" if in_fills => {
                        pattern_visible = attr_string(e, b"patternType")
                            .map_or(false, |pattern| pattern != "none");
                    }
                    b"fgColor" if in_fills && pattern_visible => {
                        if let Some(last) = fills.last_mut() {
                            *last = rgb_attr(e);
                        }
                    }
                    b"font" if in_fonts => fonts.push(FontStyle::default()),
                    b"b" if in_fonts => {
                        if let Some(font) = fonts.last_mut() {
                            font.bold = attr_flag(e);
                        }
                    }
                    b"i" if in_fonts => {
                        if let Some(font) = fonts.last_mut() {
                            font.italic = attr_flag(e);
                        }
                    }
                    b"color" if in_fonts => {
                        // Black is the default text color and stays unset
                        if let Some(font) = fonts.last_mut() {
                            font.color = rgb_attr(e).filter(|c| *c != Rgb::new(0, 0, 0));
                        }
                    }
                    b"xf" if in_cell_xfs => {
                        let font_id = attr_u32(e, b"fontId").unwrap_or(0);
                        let fill_id = attr_u32(e, b"fillId").unwrap_or(0);
                        xf_refs.push((font_id, fill_id, Alignment::default()));
                    }
                    b"alignment" if in_cell_xfs => {
                        if let Some((_, _, align)) = xf_refs.last_mut() {
                            align.horizontal = attr_string(e, b"horizontal")
                                .and_then(|h| HorizontalAlign::from_xlsx(&h));
                            align.vertical = attr_string(e, b"vertical")
                                .and_then(|v| VerticalAlign::from_xlsx(&v));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"fills" => in_fills = false,
                b"fonts" => in_fonts = false,
                b"cellXfs" => in_cell_xfs = false,
                b"patternFill" => pattern_visible = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("styles: {}", e)),
            _ => {}
        }
    }

    let xfs = xf_refs
        .into_iter()
        .map(|(font_id, fill_id, align)| CellDecor {
            fill: fills.get(fill_id as usize).copied().flatten(),
            font: fonts.get(font_id as usize).copied().unwrap_or_default(),
            align,
        })
        .collect();
    Ok(StyleTable { xfs })
}

fn parse_sheet_decor<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
    styles: &StyleTable,
    window: &BoundedRegion,
) -> Result<SheetDecor, String> {
    let mut decor = SheetDecor::default();
    let file = match archive.by_name(part) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(decor),
        Err(e) => return Err(e.to_string()),
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"c" => {
                    let style = attr_u32(e, b"s").unwrap_or(0);
                    let position = attr_string(e, b"r").and_then(|r| parse_cell_ref(&r));
                    let cell_decor = styles.xfs.get(style as usize).copied().unwrap_or_default();
                    if let Some((row, col)) = position.filter(|(r, c)| window.contains(*r, *c)) {
                        if cell_decor != CellDecor::default() {
                            decor.cells.insert((row, col), cell_decor);
                        }
                    }
                }
                b"mergeCell" => {
                    if let Some(area) = attr_string(e, b"ref").and_then(|r| parse_merge_ref(&r)) {
                        decor.merges.push(area);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(decor)
}
