//! Week partitioning of the schedule window.
//!
//! Column A is the date axis: a row whose column-A value is a Monday opens a
//! new week-block. Formula cells are empty at read time, so a Monday produced
//! by a formula without a cached value never opens a block.

use chrono::{Datelike, NaiveDate};

use super::dates::{format_long, is_monday};
use super::reader::SheetGrid;
use super::types::{BoundedRegion, ScheduleError, WeekBlock};

/// Column holding the dates
const DATE_AXIS_COL: u32 = 1;

/// Partition `region` into contiguous week-blocks
pub fn segment(sheet: &SheetGrid, region: &BoundedRegion) -> Vec<WeekBlock> {
    let start = region.start_row;
    let end = region.end_row.min(sheet.last_row()).max(start);

    let mut markers: Vec<(u32, Option<NaiveDate>)> = Vec::new();
    for row in start..=end {
        let monday = sheet
            .cell(row, DATE_AXIS_COL)
            .and_then(|cell| cell.value.as_date())
            .filter(|date| is_monday(*date));
        if row == start || monday.is_some() {
            markers.push((row, monday));
        }
    }

    markers
        .iter()
        .enumerate()
        .map(|(index, (start_row, monday))| {
            let end_row = markers
                .get(index + 1)
                .map(|(next, _)| next - 1)
                .unwrap_or(end);
            WeekBlock {
                index,
                label: block_label(index, *monday),
                start_row: *start_row,
                end_row,
                monday: *monday,
            }
        })
        .collect()
}

fn block_label(index: usize, monday: Option<NaiveDate>) -> String {
    match monday {
        Some(date) => format_long(date),
        None => format!("semaine {}", index + 1),
    }
}

/// Verify that `blocks` cover `region` from its first row without gaps or overlaps
pub fn check_partition(blocks: &[WeekBlock], region: &BoundedRegion) -> Result<(), ScheduleError> {
    let Some(first) = blocks.first() else {
        return Err(ScheduleError::BrokenPartition("no week-blocks".to_string()));
    };
    if first.start_row != region.start_row {
        return Err(ScheduleError::BrokenPartition(format!(
            "first block starts at row {} instead of {}",
            first.start_row, region.start_row
        )));
    }

    for (i, block) in blocks.iter().enumerate() {
        if block.index != i || block.start_row > block.end_row {
            return Err(ScheduleError::BrokenPartition(format!(
                "block {} spans rows {}..{}",
                i, block.start_row, block.end_row
            )));
        }
        if let Some(next) = blocks.get(i + 1) {
            if block.end_row + 1 != next.start_row {
                return Err(ScheduleError::BrokenPartition(format!(
                    "block {} ends at row {} but block {} starts at row {}",
                    i,
                    block.end_row,
                    i + 1,
                    next.start_row
                )));
            }
        }
    }

    let last = &blocks[blocks.len() - 1];
    if last.end_row > region.end_row {
        return Err(ScheduleError::BrokenPartition(format!(
            "last block ends at row {} past row {}",
            last.end_row, region.end_row
        )));
    }
    Ok(())
}

/// Index of the block whose Monday is the latest date not after `today`.
///
/// Falls back to the first block when `today` precedes every Monday. On equal
/// Mondays the later block wins.
pub fn current_week_index(blocks: &[WeekBlock], today: NaiveDate) -> usize {
    blocks
        .iter()
        .filter_map(|block| block.monday.filter(|monday| *monday <= today).map(|m| (m, block.index)))
        .max_by_key(|(monday, index)| (*monday, *index))
        .map(|(_, index)| index)
        .or_else(|| blocks.first().map(|b| b.index))
        .unwrap_or(0)
}

/// Sheet named after the ISO week number of `today`, if the workbook has one
pub fn iso_week_sheet<'a>(names: &[&'a str], today: NaiveDate) -> Option<&'a str> {
    let week = today.iso_week().week();
    names
        .iter()
        .copied()
        .find(|name| name.trim().parse::<u32>().ok() == Some(week))
}
