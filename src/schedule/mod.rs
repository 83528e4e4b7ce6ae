//! Schedule module: reading, partitioning, rendering and watching spreadsheets.
//!
//! This module provides:
//! - Reading cell values, fills and merge areas inside a fixed window
//! - Partitioning a sheet into week-blocks and locating the current week
//! - Rendering a week-block as a styled HTML table
//! - Debounced file change detection and the active-file pointer

pub mod types;
pub mod dates;
pub mod decor;
pub mod reader;
pub mod segmenter;
pub mod render;
pub mod watcher;
pub mod active;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used types and functions
pub use types::*;
pub use reader::{open_spreadsheet, compute_checksum, SheetGrid, SpreadsheetHandle};
pub use segmenter::{current_week_index, segment};
pub use render::render_block;
pub use watcher::{FileWatcher, run_debounce_loop};
pub use active::ActiveFileState;
