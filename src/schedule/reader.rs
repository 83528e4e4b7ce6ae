use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::dates::{from_excel_serial, parse_date_text};
use super::decor::{read_xlsx_decor, SheetDecor};
use super::types::*;

/// Extensions whose package carries styles and merges we can read
const DECORATED_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];

/// One sheet restricted to the schedule window, merges already resolved
#[derive(Debug, Clone)]
pub struct SheetGrid {
    name: String,
    index: usize,
    last_row: u32,
    window: BoundedRegion,
    /// Row-major, every position of `window`
    cells: Vec<Cell>,
}

impl SheetGrid {
    fn build(
        name: String,
        index: usize,
        last_row: u32,
        window: BoundedRegion,
        value_at: impl Fn(u32, u32) -> CellValue,
        decor: Option<&SheetDecor>,
    ) -> Self {
        let roles = decor.map(|d| merge_roles(d, &window)).unwrap_or_default();

        let mut cells = Vec::with_capacity((window.width() * window.height()) as usize);
        for row in window.start_row..=window.end_row {
            for col in window.start_col..=window.end_col {
                let cell_decor = decor.map(|d| d.decor_at(row, col)).unwrap_or_default();
                cells.push(Cell {
                    row,
                    col,
                    value: value_at(row, col),
                    fill: cell_decor.fill,
                    font: cell_decor.font,
                    align: cell_decor.align,
                    merge: roles.get(&(row, col)).copied().unwrap_or_default(),
                });
            }
        }

        SheetGrid {
            name,
            index,
            last_row,
            window,
            cells,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Last used row of the sheet (0 when the sheet is empty)
    pub fn last_row(&self) -> u32 {
        self.last_row
    }

    pub fn window(&self) -> &BoundedRegion {
        &self.window
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        if !self.window.contains(row, col) {
            return None;
        }
        let offset = (row - self.window.start_row) * self.window.width() + (col - self.window.start_col);
        self.cells.get(offset as usize)
    }

    /// Cells of `region` in row-major order, clipped to the window
    pub fn cells_in(&self, region: &BoundedRegion) -> Vec<&Cell> {
        let Some(region) = region.intersect(&self.window) else {
            return Vec::new();
        };
        let mut cells = Vec::with_capacity((region.width() * region.height()) as usize);
        for row in region.start_row..=region.end_row {
            for col in region.start_col..=region.end_col {
                if let Some(cell) = self.cell(row, col) {
                    cells.push(cell);
                }
            }
        }
        cells
    }
}

/// Resolve merge membership for every window position a merge touches
fn merge_roles(decor: &SheetDecor, window: &BoundedRegion) -> HashMap<(u32, u32), MergeRole> {
    let mut roles = HashMap::new();
    for area in decor.merges.iter().filter(|a| !a.is_single_cell()) {
        let Some(visible) = area.as_region().intersect(window) else {
            continue;
        };
        for row in visible.start_row..=visible.end_row {
            for col in visible.start_col..=visible.end_col {
                let role = if row == area.start_row && col == area.start_col {
                    MergeRole::Origin {
                        row_span: area.row_span(),
                        col_span: area.col_span(),
                    }
                } else {
                    MergeRole::Covered {
                        origin_row: area.start_row,
                        origin_col: area.start_col,
                    }
                };
                roles.insert((row, col), role);
            }
        }
    }
    roles
}

/// An opened spreadsheet. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct SpreadsheetHandle {
    path: PathBuf,
    file_name: String,
    modified: DateTime<Local>,
    checksum: String,
    sheets: Vec<SheetGrid>,
}

impl SpreadsheetHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn modified(&self) -> DateTime<Local> {
        self.modified
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet<'a>(&self, key: impl Into<SheetRef<'a>>) -> Result<&SheetGrid, ScheduleError> {
        let key = key.into();
        let found = match key {
            SheetRef::Name(name) => self.sheets.iter().find(|s| s.name == name),
            SheetRef::Index(index) => self.sheets.get(index),
        };
        found.ok_or_else(|| ScheduleError::SheetNotFound(key.to_string()))
    }

    /// Cells of `region` on the given sheet, row-major, clipped to the schedule window
    pub fn cells_in<'a>(
        &self,
        sheet: impl Into<SheetRef<'a>>,
        region: &BoundedRegion,
    ) -> Result<Vec<&Cell>, ScheduleError> {
        Ok(self.sheet(sheet)?.cells_in(region))
    }
}

/// Open a spreadsheet and load the schedule window of every sheet
pub fn open_spreadsheet(path: &Path) -> Result<SpreadsheetHandle, ScheduleError> {
    if !path.exists() {
        return Err(ScheduleError::unreadable(path, "file not found"));
    }

    // One spelling per file, whatever path the caller or the watcher used
    let canonical = path
        .canonicalize()
        .map_err(|e| ScheduleError::unreadable(path, e))?;
    let path = canonical.as_path();

    let checksum = compute_checksum(path)?;
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Local>::from)
        .map_err(|e| ScheduleError::unreadable(path, e))?;

    let window = BoundedRegion::SCHEDULE;
    let extension = file_extension(path).unwrap_or_default();
    let sheets = if extension == "csv" {
        vec![read_csv_sheet(path, &window)?]
    } else {
        read_workbook_sheets(path, &extension, &window)?
    };

    Ok(SpreadsheetHandle {
        path: path.to_path_buf(),
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        modified,
        checksum,
        sheets,
    })
}

fn read_workbook_sheets(
    path: &Path,
    extension: &str,
    window: &BoundedRegion,
) -> Result<Vec<SheetGrid>, ScheduleError> {
    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| ScheduleError::unreadable(path, format!("Failed to open workbook: {}", e)))?;

    let decor = if DECORATED_EXTENSIONS.contains(&extension) {
        read_xlsx_decor(path, window)?
    } else {
        HashMap::new()
    };

    let sheet_names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for (index, name) in sheet_names.into_iter().enumerate() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ScheduleError::unreadable(path, format!("Failed to read sheet '{}': {}", name, e)))?;
        let sheet_decor = decor.get(&name);
        let last_value_row = range.end().map(|(row, _)| row + 1).unwrap_or(0);
        let last_row = sheet_decor
            .map(|d| d.last_visible_row(window))
            .unwrap_or(0)
            .max(last_value_row);

        let value_at = |row: u32, col: u32| convert_cell_value(range.get_value((row - 1, col - 1)));
        let grid = SheetGrid::build(name.clone(), index, last_row, *window, value_at, sheet_decor);
        sheets.push(grid);
    }

    Ok(sheets)
}

/// A CSV file is a single sheet named after the file stem
fn read_csv_sheet(path: &Path, window: &BoundedRegion) -> Result<SheetGrid, ScheduleError> {
    let content = std::fs::read_to_string(path).map_err(|e| ScheduleError::unreadable(path, e))?;
    let first_line = content.lines().next().unwrap_or_default();
    let delimiter = if first_line.matches(';').count() > first_line.matches(',').count() {
        b';'
    } else {
        b','
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ScheduleError::unreadable(path, e))?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Feuil1".to_string());
    let last_row = rows.len() as u32;
    let value_at = |row: u32, col: u32| {
        rows.get((row - 1) as usize)
            .and_then(|r| r.get((col - 1) as usize))
            .map(|field| value_from_text(field))
            .unwrap_or_default()
    };
    Ok(SheetGrid::build(name, 0, last_row, *window, value_at, None))
}

/// Resolve a textual cell. Formula text and blanks are empty; date-like
/// strings become dates.
fn value_from_text(text: &str) -> CellValue {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with('=') {
        return CellValue::Empty;
    }
    match parse_date_text(trimmed) {
        Some(date) => CellValue::Date(date),
        None => CellValue::Text(text.to_string()),
    }
}

/// Convert calamine Data to our CellValue
fn convert_cell_value(cell: Option<&Data>) -> CellValue {
    match cell {
        None => CellValue::Empty,
        Some(data) => match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => value_from_text(s),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => {
                let serial = dt.as_f64();
                from_excel_serial(serial).unwrap_or(CellValue::Number(serial))
            }
            Data::DateTimeIso(s) => parse_iso_datetime(s),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
        },
    }
}

fn parse_iso_datetime(text: &str) -> CellValue {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return if datetime.time() == NaiveTime::MIN {
            CellValue::Date(datetime.date())
        } else {
            CellValue::DateTime(datetime)
        };
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return CellValue::Date(date);
    }
    if let Ok(time) = NaiveTime::parse_from_str(text, "%H:%M:%S%.f") {
        return CellValue::Time(time);
    }
    CellValue::Text(text.to_string())
}

/// Lowercase extension without the dot
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Convert column index (0-based) to Excel column letter (A, B, ..., Z, AA, AB, ...)
pub fn column_index_to_letter(index: u32) -> String {
    let mut result = String::new();
    let mut n = index + 1;

    while n > 0 {
        n -= 1;
        let c = (b'A' + (n % 26) as u8) as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// `B3` style reference for 1-based coordinates
pub fn cell_reference(row: u32, col: u32) -> String {
    format!("{}{}", column_index_to_letter(col.saturating_sub(1)), row)
}

/// Compute SHA-256 checksum of a file
pub fn compute_checksum(path: &Path) -> Result<String, ScheduleError> {
    let mut file = File::open(path)
        .map_err(|e| ScheduleError::unreadable(path, format!("Failed to open file for checksum: {}", e)))?;

    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| ScheduleError::unreadable(path, format!("Failed to read file for checksum: {}", e)))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}
