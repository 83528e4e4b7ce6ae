use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Represents a cell value with type information, resolved once at read time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Error(String),
}

impl CellValue {
    /// Calendar date carried by the value, if any
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// An sRGB color taken from the spreadsheet styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Parse an `RRGGBB` or `AARRGGBB` hex string. Alpha is ignored.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let rgb = match hex.len() {
            6 => hex,
            8 => hex.get(2..)?,
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(rgb.get(i..i + 2)?, 16).ok();
        Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// CSS color notation, e.g. `#FFFF00`
    pub fn to_css(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Font attributes kept for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FontStyle {
    pub color: Option<Rgb>,
    pub bold: bool,
    pub italic: bool,
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl HorizontalAlign {
    /// `alignment@horizontal` of an xlsx style; `general` means unset
    pub fn from_xlsx(value: &str) -> Option<Self> {
        match value {
            "left" => Some(HorizontalAlign::Left),
            "center" | "centerContinuous" => Some(HorizontalAlign::Center),
            "right" => Some(HorizontalAlign::Right),
            "justify" | "distributed" => Some(HorizontalAlign::Justify),
            _ => None,
        }
    }

    pub fn as_css(self) -> &'static str {
        match self {
            HorizontalAlign::Left => "left",
            HorizontalAlign::Center => "center",
            HorizontalAlign::Right => "right",
            HorizontalAlign::Justify => "justify",
        }
    }
}

/// Vertical text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

impl VerticalAlign {
    pub fn from_xlsx(value: &str) -> Option<Self> {
        match value {
            "top" => Some(VerticalAlign::Top),
            "center" | "justify" | "distributed" => Some(VerticalAlign::Middle),
            "bottom" => Some(VerticalAlign::Bottom),
            _ => None,
        }
    }

    pub fn as_css(self) -> &'static str {
        match self {
            VerticalAlign::Top => "top",
            VerticalAlign::Middle => "middle",
            VerticalAlign::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Alignment {
    pub horizontal: Option<HorizontalAlign>,
    pub vertical: Option<VerticalAlign>,
}

/// Membership of a cell in a merged region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MergeRole {
    #[default]
    None,
    /// Top-left cell of the region; carries content and span
    Origin { row_span: u32, col_span: u32 },
    /// Any other cell of the region; never rendered
    Covered { origin_row: u32, origin_col: u32 },
}

/// One cell of the schedule window. Coordinates are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
    pub fill: Option<Rgb>,
    pub font: FontStyle,
    pub align: Alignment,
    pub merge: MergeRole,
}

impl Cell {
    pub fn empty(row: u32, col: u32) -> Self {
        Cell {
            row,
            col,
            value: CellValue::Empty,
            fill: None,
            font: FontStyle::default(),
            align: Alignment::default(),
            merge: MergeRole::None,
        }
    }

    pub fn is_merge_origin(&self) -> bool {
        matches!(self.merge, MergeRole::Origin { .. })
    }

    /// `(row_span, col_span)` for merge origins
    pub fn merge_span(&self) -> Option<(u32, u32)> {
        match self.merge {
            MergeRole::Origin { row_span, col_span } => Some((row_span, col_span)),
            _ => None,
        }
    }

    pub fn is_covered(&self) -> bool {
        matches!(self.merge, MergeRole::Covered { .. })
    }
}

/// Inclusive rectangle of 1-based rows and columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedRegion {
    pub start_row: u32,
    pub end_row: u32,
    pub start_col: u32,
    pub end_col: u32,
}

impl BoundedRegion {
    /// The fixed rendering window: columns A..M, rows 1..24
    pub const SCHEDULE: BoundedRegion = BoundedRegion {
        start_row: 1,
        end_row: 24,
        start_col: 1,
        end_col: 13,
    };

    pub fn new(start_row: u32, end_row: u32, start_col: u32, end_col: u32) -> Self {
        BoundedRegion {
            start_row,
            end_row,
            start_col,
            end_col,
        }
    }

    /// Same columns, different rows
    pub fn with_rows(&self, start_row: u32, end_row: u32) -> Self {
        BoundedRegion {
            start_row,
            end_row,
            ..*self
        }
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.start_row..=self.end_row).contains(&row)
            && (self.start_col..=self.end_col).contains(&col)
    }

    /// Overlap of two regions, `None` when disjoint
    pub fn intersect(&self, other: &BoundedRegion) -> Option<BoundedRegion> {
        let region = BoundedRegion {
            start_row: self.start_row.max(other.start_row),
            end_row: self.end_row.min(other.end_row),
            start_col: self.start_col.max(other.start_col),
            end_col: self.end_col.min(other.end_col),
        };
        (region.start_row <= region.end_row && region.start_col <= region.end_col)
            .then_some(region)
    }

    pub fn width(&self) -> u32 {
        self.end_col + 1 - self.start_col
    }

    pub fn height(&self) -> u32 {
        self.end_row + 1 - self.start_row
    }
}

impl Default for BoundedRegion {
    fn default() -> Self {
        BoundedRegion::SCHEDULE
    }
}

/// A contiguous row range representing one calendar week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekBlock {
    pub index: usize,
    pub label: String,
    pub start_row: u32,
    pub end_row: u32,
    /// Date of the Monday marker that opened the block
    pub monday: Option<NaiveDate>,
}

/// Sheet lookup key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetRef<'a> {
    Name(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for SheetRef<'a> {
    fn from(name: &'a str) -> Self {
        SheetRef::Name(name)
    }
}

impl<'a> From<&'a String> for SheetRef<'a> {
    fn from(name: &'a String) -> Self {
        SheetRef::Name(name.as_str())
    }
}

impl From<usize> for SheetRef<'_> {
    fn from(index: usize) -> Self {
        SheetRef::Index(index)
    }
}

impl std::fmt::Display for SheetRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetRef::Name(name) => write!(f, "{}", name),
            SheetRef::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// Signal pushed to every viewer: something changed, re-fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "file_modified")]
pub struct RefreshEvent {
    pub file_name: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl RefreshEvent {
    pub fn now(file_name: Option<String>) -> Self {
        RefreshEvent {
            file_name,
            timestamp: Local::now(),
        }
    }
}

/// Process status exposed to collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub active_file_name: Option<String>,
    pub last_modified: Option<DateTime<Local>>,
    pub sheet_count: usize,
    pub connected_viewer_count: usize,
}

/// Schedule errors surfaced to requesters
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Unreadable file {}: {reason}", path.display())]
    UnreadableFile { path: PathBuf, reason: String },

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("No active file, upload a schedule first")]
    NoActiveFile,

    #[error("Week {index} out of range ({count} weeks)")]
    WeekOutOfRange { index: usize, count: usize },

    #[error("Week partition broken: {0}")]
    BrokenPartition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Download failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl ScheduleError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        ScheduleError::UnreadableFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ScheduleError::UnreadableFile { .. } => ErrorKind::UnreadableFile,
            ScheduleError::SheetNotFound(_) => ErrorKind::SheetNotFound,
            ScheduleError::UnsupportedExtension(_) => ErrorKind::UnsupportedExtension,
            ScheduleError::NoActiveFile => ErrorKind::NoActiveFile,
            ScheduleError::WeekOutOfRange { .. } => ErrorKind::WeekOutOfRange,
            ScheduleError::BrokenPartition(_) => ErrorKind::Internal,
            ScheduleError::Io(_) | ScheduleError::Watch(_) => ErrorKind::Internal,
            ScheduleError::Fetch(_) => ErrorKind::Fetch,
            ScheduleError::Settings(_) => ErrorKind::Settings,
        }
    }
}

/// Error category carried in structured responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnreadableFile,
    SheetNotFound,
    UnsupportedExtension,
    NoActiveFile,
    WeekOutOfRange,
    Fetch,
    Settings,
    Internal,
}

/// A cell that could not be interpreted. Never propagated: the renderer
/// falls back to `raw`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCellFailure {
    pub row: u32,
    pub col: u32,
    pub raw: String,
    pub reason: &'static str,
}
