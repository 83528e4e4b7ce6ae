//! Minimal xlsx writer for tests: inline strings, numbers, dates, formulas
//! without cached values, solid fills, bold fonts and merges.

use chrono::NaiveDate;
use quick_xml::escape::escape;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::ZipWriter;

use super::reader::column_index_to_letter;

#[derive(Debug, Clone)]
pub(crate) enum FixtureValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Formula(String),
    Blank,
}

#[derive(Debug, Clone)]
pub(crate) struct FixtureCell {
    row: u32,
    col: u32,
    value: FixtureValue,
    fill: Option<String>,
    bold: bool,
    centered: bool,
}

impl FixtureCell {
    fn new(row: u32, col: u32, value: FixtureValue) -> Self {
        FixtureCell {
            row,
            col,
            value,
            fill: None,
            bold: false,
            centered: false,
        }
    }

    pub(crate) fn text(row: u32, col: u32, text: &str) -> Self {
        Self::new(row, col, FixtureValue::Text(text.to_string()))
    }

    pub(crate) fn number(row: u32, col: u32, value: f64) -> Self {
        Self::new(row, col, FixtureValue::Number(value))
    }

    pub(crate) fn date(row: u32, col: u32, date: NaiveDate) -> Self {
        Self::new(row, col, FixtureValue::Date(date))
    }

    pub(crate) fn formula(row: u32, col: u32, formula: &str) -> Self {
        Self::new(row, col, FixtureValue::Formula(formula.to_string()))
    }

    pub(crate) fn blank(row: u32, col: u32) -> Self {
        Self::new(row, col, FixtureValue::Blank)
    }

    pub(crate) fn filled(mut self, argb: &str) -> Self {
        self.fill = Some(argb.to_string());
        self
    }

    pub(crate) fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub(crate) fn centered(mut self) -> Self {
        self.centered = true;
        self
    }

    fn style_key(&self) -> StyleKey {
        (self.is_date(), self.fill.clone(), self.bold, self.centered)
    }

    fn is_date(&self) -> bool {
        matches!(self.value, FixtureValue::Date(_))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FixtureSheet {
    name: String,
    cells: Vec<FixtureCell>,
    merges: Vec<String>,
}

impl FixtureSheet {
    pub(crate) fn new(name: &str) -> Self {
        FixtureSheet {
            name: name.to_string(),
            cells: Vec::new(),
            merges: Vec::new(),
        }
    }

    pub(crate) fn cell(mut self, cell: FixtureCell) -> Self {
        self.cells.push(cell);
        self
    }

    pub(crate) fn merge(mut self, reference: &str) -> Self {
        self.merges.push(reference.to_string());
        self
    }
}

/// (is_date, fill, bold, centered)
type StyleKey = (bool, Option<String>, bool, bool);

/// Distinct style keys, in first-seen order
struct Styles {
    fills: Vec<String>,
    xfs: Vec<StyleKey>,
}

impl Styles {
    fn collect(sheets: &[FixtureSheet]) -> Self {
        let mut styles = Styles {
            fills: Vec::new(),
            xfs: vec![(false, None, false, false)],
        };
        for cell in sheets.iter().flat_map(|s| s.cells.iter()) {
            if let Some(fill) = &cell.fill {
                if !styles.fills.contains(fill) {
                    styles.fills.push(fill.clone());
                }
            }
            let key = cell.style_key();
            if !styles.xfs.contains(&key) {
                styles.xfs.push(key);
            }
        }
        styles
    }

    fn index_of(&self, cell: &FixtureCell) -> usize {
        let key = cell.style_key();
        self.xfs.iter().position(|k| *k == key).unwrap_or(0)
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="2"><font><sz val="11"/><color theme="1"/><name val="Calibri"/></font><font><b/><sz val="11"/><color rgb="FF000000"/><name val="Calibri"/></font></fonts>
"#,
        );
        xml.push_str(&format!("<fills count=\"{}\">", self.fills.len() + 2));
        xml.push_str(r#"<fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill>"#);
        for fill in &self.fills {
            xml.push_str(&format!(
                r#"<fill><patternFill patternType="solid"><fgColor rgb="{}"/><bgColor indexed="64"/></patternFill></fill>"#,
                fill
            ));
        }
        xml.push_str("</fills>\n");
        xml.push_str(r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#);
        xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);
        xml.push_str(&format!("<cellXfs count=\"{}\">", self.xfs.len()));
        for (is_date, fill, bold, centered) in &self.xfs {
            let num_fmt = if *is_date { 14 } else { 0 };
            let fill_id = fill
                .as_ref()
                .and_then(|f| self.fills.iter().position(|x| x == f))
                .map_or(0, |i| i + 2);
            let font_id = usize::from(*bold);
            let alignment = if *centered {
                r#"<alignment horizontal="center" vertical="center" wrapText="1"/>"#
            } else {
                ""
            };
            xml.push_str(&format!(
                r#"<xf numFmtId="{}" fontId="{}" fillId="{}" borderId="0" xfId="0" applyNumberFormat="1" applyFill="1" applyFont="1" applyAlignment="1">{}</xf>"#,
                num_fmt, font_id, fill_id, alignment
            ));
        }
        xml.push_str("</cellXfs>\n</styleSheet>");
        xml
    }
}

fn excel_serial(date: NaiveDate) -> i64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    (date - epoch).num_days()
}

fn sheet_xml(sheet: &FixtureSheet, styles: &Styles) -> String {
    let mut cells: Vec<&FixtureCell> = sheet.cells.iter().collect();
    cells.sort_by_key(|c| (c.row, c.col));

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheetData>"#,
    );
    let mut current_row = None;
    for cell in cells {
        if current_row != Some(cell.row) {
            if current_row.is_some() {
                xml.push_str("</row>");
            }
            xml.push_str(&format!(r#"<row r="{}">"#, cell.row));
            current_row = Some(cell.row);
        }
        let reference = format!("{}{}", column_index_to_letter(cell.col - 1), cell.row);
        let style = styles.index_of(cell);
        match &cell.value {
            FixtureValue::Text(text) => xml.push_str(&format!(
                r#"<c r="{}" s="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                reference,
                style,
                escape(text.as_str())
            )),
            FixtureValue::Number(n) => xml.push_str(&format!(
                r#"<c r="{}" s="{}"><v>{}</v></c>"#,
                reference, style, n
            )),
            FixtureValue::Date(d) => xml.push_str(&format!(
                r#"<c r="{}" s="{}"><v>{}</v></c>"#,
                reference,
                style,
                excel_serial(*d)
            )),
            FixtureValue::Formula(f) => xml.push_str(&format!(
                r#"<c r="{}" s="{}"><f>{}</f></c>"#,
                reference,
                style,
                escape(f.as_str())
            )),
            FixtureValue::Blank => {
                xml.push_str(&format!(r#"<c r="{}" s="{}"/>"#, reference, style))
            }
        }
    }
    if current_row.is_some() {
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");
    if !sheet.merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, sheet.merges.len()));
        for merge in &sheet.merges {
            xml.push_str(&format!(r#"<mergeCell ref="{}"/>"#, merge));
        }
        xml.push_str("</mergeCells>");
    }
    xml.push_str("</worksheet>");
    xml
}

pub(crate) fn write_xlsx(path: &Path, sheets: &[FixtureSheet]) -> zip::result::ZipResult<()> {
    let styles = Styles::collect(sheets);
    let mut zip = ZipWriter::new(File::create(path)?);
    let options = FileOptions::default();

    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    );
    for i in 1..=sheets.len() {
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i
        ));
    }
    content_types.push_str("</Types>");
    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(content_types.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
    )?;

    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (i, sheet) in sheets.iter().enumerate() {
        let n = i + 1;
        workbook.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(sheet.name.as_str()),
            n,
            n
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            n, n
        ));
    }
    let styles_rel = sheets.len() + 1;
    rels.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#,
        styles_rel
    ));
    workbook.push_str("</sheets></workbook>");

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(workbook.as_bytes())?;
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(rels.as_bytes())?;
    zip.start_file("xl/styles.xml", options)?;
    zip.write_all(styles.to_xml().as_bytes())?;

    for (i, sheet) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        zip.write_all(sheet_xml(sheet, &styles).as_bytes())?;
    }

    zip.finish()?;
    Ok(())
}
