//! Week-block to HTML table markup.

use quick_xml::escape::escape;
use std::collections::HashMap;
use std::fmt::Write;

use super::dates::format_cell_date;
use super::reader::cell_reference;
use super::types::{Cell, CellValue, MergeRole, RenderCellFailure, Rgb, WeekBlock};

/// Accent applied to the date axis regardless of content
pub const DATE_AXIS_BACKGROUND: Rgb = Rgb::new(0x44, 0x72, 0xC4);
pub const DATE_AXIS_FOREGROUND: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

const DATE_AXIS_COL: u32 = 1;

/// Render the rows of `block` from `cells` (row-major, as returned by `cells_in`).
///
/// Covered merge cells emit nothing; their origin's spans reserve the space.
/// Spans are cut at the block's last row and the last column present. A merge
/// whose origin lies above the block restarts at its first covered cell
/// inside the block, so every row stays aligned.
pub fn render_block(block: &WeekBlock, cells: &[&Cell]) -> String {
    let last_col = cells.iter().map(|c| c.col).max().unwrap_or(0);
    let continuations = continuation_spans(block, cells);

    let mut html = String::new();
    let _ = writeln!(
        html,
        r#"<table class="week-table" data-week="{}" data-label="{}">"#,
        block.index,
        escape(block.label.as_str())
    );

    for row in block.start_row..=block.end_row {
        let _ = writeln!(html, r#"  <tr data-row="{}">"#, row);
        for cell in cells.iter().filter(|c| c.row == row) {
            let span = match cell.merge {
                MergeRole::None => None,
                MergeRole::Origin { row_span, col_span } => Some((
                    row_span.min(block.end_row + 1 - cell.row),
                    col_span.min(last_col + 1 - cell.col),
                )),
                MergeRole::Covered { .. } => match continuations.get(&(cell.row, cell.col)) {
                    Some(span) => Some(*span),
                    None => continue,
                },
            };
            html.push_str("    ");
            html.push_str(&render_cell(cell, span));
            html.push('\n');
        }
        html.push_str("  </tr>\n");
    }

    html.push_str("</table>");
    html
}

/// First visible cell and remaining span of each merge that started above
/// the block
fn continuation_spans(block: &WeekBlock, cells: &[&Cell]) -> HashMap<(u32, u32), (u32, u32)> {
    // origin -> (first row, first col, last row, last col) inside the block
    let mut areas: HashMap<(u32, u32), (u32, u32, u32, u32)> = HashMap::new();
    for cell in cells {
        if cell.row < block.start_row || cell.row > block.end_row {
            continue;
        }
        if let MergeRole::Covered { origin_row, origin_col } = cell.merge {
            if origin_row >= block.start_row {
                continue;
            }
            let area = areas
                .entry((origin_row, origin_col))
                .or_insert((cell.row, cell.col, cell.row, cell.col));
            area.0 = area.0.min(cell.row);
            area.1 = area.1.min(cell.col);
            area.2 = area.2.max(cell.row);
            area.3 = area.3.max(cell.col);
        }
    }

    areas
        .into_values()
        .map(|(top, left, bottom, right)| ((top, left), (bottom + 1 - top, right + 1 - left)))
        .collect()
}

fn render_cell(cell: &Cell, span: Option<(u32, u32)>) -> String {
    let mut attrs = String::new();

    if cell.col == DATE_AXIS_COL {
        attrs.push_str(r#" class="cell date-axis""#);
    } else {
        attrs.push_str(r#" class="cell""#);
    }

    let style = cell_style(cell);
    if !style.is_empty() {
        let _ = write!(attrs, r#" style="{}""#, style);
    }

    if let Some((row_span, col_span)) = span {
        let _ = write!(attrs, r#" rowspan="{}" colspan="{}""#, row_span, col_span);
    }

    let text = display_text(cell).unwrap_or_else(|failure| {
        tracing::debug!(
            cell = %cell_reference(failure.row, failure.col),
            reason = failure.reason,
            "rendering raw cell text"
        );
        failure.raw
    });

    format!("<td{}>{}</td>", attrs, escape(text.as_str()).replace('\n', "<br/>"))
}

fn cell_style(cell: &Cell) -> String {
    let mut styles: Vec<String> = Vec::new();

    if cell.col == DATE_AXIS_COL {
        styles.push(format!("background-color: {}", DATE_AXIS_BACKGROUND.to_css()));
        styles.push(format!("color: {}", DATE_AXIS_FOREGROUND.to_css()));
        styles.push("font-weight: bold".to_string());
        return styles.join("; ");
    }

    if let Some(fill) = cell.fill {
        styles.push(format!("background-color: {}", fill.to_css()));
    }
    if let Some(color) = cell.font.color {
        styles.push(format!("color: {}", color.to_css()));
    }
    if cell.font.bold {
        styles.push("font-weight: bold".to_string());
    }
    if cell.font.italic {
        styles.push("font-style: italic".to_string());
    }
    if let Some(horizontal) = cell.align.horizontal {
        styles.push(format!("text-align: {}", horizontal.as_css()));
    }
    if let Some(vertical) = cell.align.vertical {
        styles.push(format!("vertical-align: {}", vertical.as_css()));
    }
    styles.join("; ")
}

/// Display text of a cell value
pub fn display_text(cell: &Cell) -> Result<String, RenderCellFailure> {
    let failure = |raw: String, reason: &'static str| RenderCellFailure {
        row: cell.row,
        col: cell.col,
        raw,
        reason,
    };

    match &cell.value {
        CellValue::Empty => Ok(String::new()),
        CellValue::Text(s) => Ok(s.clone()),
        CellValue::Number(n) if !n.is_finite() => Err(failure(n.to_string(), "non-finite number")),
        CellValue::Number(n) => Ok(format_number(*n)),
        CellValue::Bool(b) => Ok(if *b { "VRAI" } else { "FAUX" }.to_string()),
        CellValue::Date(d) => Ok(format_cell_date(*d)),
        CellValue::DateTime(dt) => Ok(format_cell_date(dt.date())),
        CellValue::Time(t) => Ok(t.format("%H:%M").to_string()),
        CellValue::Error(e) => Err(failure(e.clone(), "error value")),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
