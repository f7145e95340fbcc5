//! # Tables
//!
//! A grid of rich-text cells drawn at the cursor across the full width of
//! the active box. Row 0 is the header; when rows run past the page limit
//! the table continues on a new page, repeating the header first.
//!
//! Borders follow one rule: with `n` rows, only rows `0..=n-3` get a bottom
//! border. The last row is a total and the one above it is separated from
//! it by whitespace alone.

use serde::{Deserialize, Serialize};

use super::flow::block_height;
use super::Document;
use crate::error::Result;
use crate::render::{Point, Renderer};
use crate::style::{Color, Edges, BORDER_COLOR};
use crate::text::{BrokenLine, RichText, Span};

/// Width of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ColumnWidth {
    /// Width in points.
    Fixed(f64),
    /// Fraction of the table width (0.0 to 1.0).
    Fraction(f64),
    /// Share of whatever the other columns leave over.
    Auto,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableStyle {
    pub cell_padding: Edges,
    pub border_width: f64,
    pub border_color: Color,
    pub font_size: f64,
    /// Redraw row 0 at the top of every continuation page.
    pub repeat_header: bool,
    /// Empty means an even split.
    pub column_widths: Vec<ColumnWidth>,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            cell_padding: Edges::uniform(12.0),
            border_width: 1.0,
            border_color: BORDER_COLOR,
            font_size: 12.0,
            repeat_header: true,
            column_widths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<RichText>>,
    pub style: TableStyle,
}

impl Table {
    pub fn new(rows: Vec<Vec<RichText>>, style: TableStyle) -> Self {
        Self { rows, style }
    }

    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Whether row `index` of an `n`-row table gets a bottom border.
pub fn row_has_bottom_border(index: usize, n: usize) -> bool {
    index + 2 < n
}

/// Distribute `available` width over `count` columns.
pub fn resolve_column_widths(defs: &[ColumnWidth], count: usize, available: f64) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if defs.is_empty() {
        return vec![available / count as f64; count];
    }

    let mut widths = Vec::with_capacity(count);
    let mut remaining = available;
    let mut auto_count = 0;

    for i in 0..count {
        match defs.get(i).copied().unwrap_or(ColumnWidth::Auto) {
            ColumnWidth::Fixed(w) => {
                widths.push(w);
                remaining -= w;
            }
            ColumnWidth::Fraction(f) => {
                let w = available * f;
                widths.push(w);
                remaining -= w;
            }
            ColumnWidth::Auto => {
                widths.push(0.0);
                auto_count += 1;
            }
        }
    }

    if auto_count > 0 {
        let auto_width = (remaining / auto_count as f64).max(0.0);
        for (i, width) in widths.iter_mut().enumerate() {
            if matches!(defs.get(i).copied().unwrap_or(ColumnWidth::Auto), ColumnWidth::Auto) {
                *width = auto_width;
            }
        }
    }

    widths
}

/// A row broken into lines and measured, ready to draw.
struct MeasuredRow {
    cells: Vec<(Vec<Span>, Vec<BrokenLine>)>,
    height: f64,
}

impl<R: Renderer> Document<R> {
    /// Draw a table at the cursor. Returns the total height consumed,
    /// summed over every page the table touches.
    pub fn table(&mut self, table: &Table) -> Result<f64> {
        let n = table.rows.len();
        if n == 0 {
            return Ok(0.0);
        }
        let style = &table.style;
        let table_width = self.bounds_width()?;
        let col_widths =
            resolve_column_widths(&style.column_widths, table.column_count(), table_width);

        let rows: Vec<MeasuredRow> = table
            .rows
            .iter()
            .map(|row| self.measure_row(row, &col_widths, style))
            .collect();

        let mut consumed = 0.0;
        for (i, row) in rows.iter().enumerate() {
            // The header travels with the first body row.
            let keep_with_next = match (i, rows.get(1)) {
                (0, Some(next)) => Some(next.height),
                _ => None,
            };
            let page_before = self.page_count;
            if !self.reserve_row(row.height, keep_with_next)? {
                log::warn!("table truncated at box bottom: {} of {} row(s) drawn", i, n);
                break;
            }
            if self.page_count != page_before && i > 0 && style.repeat_header {
                log::debug!("repeating table header on page {}", self.page_count);
                consumed += self.draw_row(&rows[0], 0, n, &col_widths, table_width, style)?;
                // The header was sized to fit alongside this row on a fresh page.
                if !self.reserve_row(row.height, None)? {
                    break;
                }
            }
            consumed += self.draw_row(row, i, n, &col_widths, table_width, style)?;
        }

        Ok(consumed)
    }

    fn measure_row(&self, row: &[RichText], col_widths: &[f64], style: &TableStyle) -> MeasuredRow {
        let line_height = self.line_height(style.font_size);
        let mut text_height: f64 = 0.0;
        let cells: Vec<(Vec<Span>, Vec<BrokenLine>)> = row
            .iter()
            .zip(col_widths)
            .map(|(cell, &width)| {
                let spans = cell.spans();
                let inner = (width - style.cell_padding.horizontal()).max(0.0);
                let lines = self.break_lines(&spans, inner, style.font_size);
                text_height = text_height.max(block_height(lines.len(), line_height, 0.0));
                (spans, lines)
            })
            .collect();
        MeasuredRow {
            cells,
            height: text_height + style.cell_padding.vertical(),
        }
    }

    fn draw_row(
        &mut self,
        row: &MeasuredRow,
        index: usize,
        n: usize,
        col_widths: &[f64],
        table_width: f64,
        style: &TableStyle,
    ) -> Result<f64> {
        let top = self.cursor_y()?;
        let line_height = self.line_height(style.font_size);

        let mut x = 0.0;
        for ((spans, lines), &width) in row.cells.iter().zip(col_widths) {
            for (j, line) in lines.iter().enumerate() {
                let at = Point::new(
                    x + style.cell_padding.left,
                    top + style.cell_padding.top + j as f64 * line_height,
                );
                self.draw_line(line, spans, at, style.font_size)?;
            }
            x += width;
        }

        if row_has_bottom_border(index, n) && style.border_width > 0.0 {
            let from = self.to_absolute(Point::new(0.0, top + row.height))?;
            let to = self.to_absolute(Point::new(table_width, top + row.height))?;
            self.renderer
                .stroke_line(from, to, style.border_width, style.border_color);
            self.page_is_fresh = false;
        }

        self.boxes.move_down(row.height, false)?;
        Ok(row.height)
    }
}
