//! # Flow Primitives
//!
//! Text, text boxes, images and labels. Flowing primitives draw at the
//! active box's cursor and move it down by what they used; a text box is
//! placed at an explicit position and leaves the cursor alone.
//!
//! Text height follows one rule everywhere:
//! `lines * line_height + (lines - 1) * leading`.

use super::bounds::EPSILON;
use super::page_break::{decide_break, BreakDecision};
use super::{Document, DEFAULT_FONT_SIZE};
use crate::error::{FolioError, Result};
use crate::image_loader::{load_image, ImageSource};
use crate::render::{GlyphRun, Point, Rect, Renderer, TextLine};
use crate::style::{Color, LABEL_COLOR};
use crate::text::{break_spans, BrokenLine, RichText, Span};

/// Size the label primitive draws at.
pub const LABEL_FONT_SIZE: f64 = 8.0;

/// Font size reduction per shrink-to-fit step.
const SHRINK_STEP: f64 = 0.5;

/// What a text box does with content taller than its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Reduce the font size until it fits, down to the configured floor.
    ShrinkToFit,
    /// Draw only the lines that fit.
    Truncate,
    /// Draw everything, past the region's bottom edge.
    Expand,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOptions {
    pub size: f64,
    /// Extra space between consecutive lines.
    pub leading: f64,
    /// Only consulted by [`Document::text_box`].
    pub overflow: Overflow,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_FONT_SIZE,
            leading: 0.0,
            overflow: Overflow::Truncate,
        }
    }
}

impl TextOptions {
    pub fn sized(size: f64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn leading(mut self, leading: f64) -> Self {
        self.leading = leading;
        self
    }

    pub fn overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = overflow;
        self
    }
}

/// What a text box actually drew.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBoxOutcome {
    pub font_size: f64,
    pub lines_drawn: usize,
    pub height_used: f64,
    pub truncated: bool,
}

/// Result of asking for vertical space.
enum Fit {
    Place,
    Truncate,
}

pub(crate) fn block_height(lines: usize, line_height: f64, leading: f64) -> f64 {
    if lines == 0 {
        return 0.0;
    }
    lines as f64 * line_height + (lines - 1) as f64 * leading
}

/// Largest number of lines whose block height stays within `height`.
fn lines_that_fit(total: usize, line_height: f64, leading: f64, height: f64) -> usize {
    let pitch = line_height + leading;
    if pitch <= 0.0 {
        return total;
    }
    let count = ((height + leading + EPSILON) / pitch).floor().max(0.0) as usize;
    count.min(total)
}

impl<R: Renderer> Document<R> {
    /// Flowing text at the cursor, wrapped to the active box width.
    /// Returns the height drawn.
    pub fn text(&mut self, rich: &RichText, options: &TextOptions) -> Result<f64> {
        let width = self.bounds_width()?;
        let spans = rich.spans();
        let lines = self.break_lines(&spans, width, options.size);
        let line_height = self.line_height(options.size);

        let mut drawn = 0;
        for (i, line) in lines.iter().enumerate() {
            let gap = if i > 0 { options.leading } else { 0.0 };
            let page = self.page_count;
            if let Fit::Truncate = self.reserve(gap + line_height, None)? {
                log::warn!(
                    "text truncated at box bottom: {} of {} line(s) drawn",
                    drawn,
                    lines.len()
                );
                break;
            }
            // Leading only separates lines on the same page.
            if self.page_count == page {
                self.boxes.move_down(gap, false)?;
            }
            let y = self.cursor_y()?;
            self.draw_line(line, &spans, Point::new(0.0, y), options.size)?;
            self.boxes.move_down(line_height, false)?;
            drawn += 1;
        }

        Ok(block_height(drawn, line_height, options.leading))
    }

    /// Text in an explicit region of the active box. The cursor does not
    /// move and the region does not count toward the box's extent.
    pub fn text_box(
        &mut self,
        rich: &RichText,
        at: Point,
        width: f64,
        height: f64,
        options: &TextOptions,
    ) -> Result<TextBoxOutcome> {
        self.boxes.active()?;
        let spans = rich.spans();

        let mut size = options.size;
        let mut lines = self.break_lines(&spans, width, size);
        let mut line_height = self.line_height(size);
        let mut truncate = options.overflow == Overflow::Truncate;

        if options.overflow == Overflow::ShrinkToFit {
            let floor = self.config.layout.min_font_size;
            while block_height(lines.len(), line_height, options.leading) > height + EPSILON {
                let next = size - SHRINK_STEP;
                if next < floor - EPSILON {
                    log::debug!("text box still overflows at {}pt, truncating", size);
                    truncate = true;
                    break;
                }
                size = next;
                lines = self.break_lines(&spans, width, size);
                line_height = self.line_height(size);
                log::debug!("shrinking text box to {}pt ({} lines)", size, lines.len());
            }
        }

        let count = if truncate {
            lines_that_fit(lines.len(), line_height, options.leading, height)
        } else {
            lines.len()
        };
        let height_used = block_height(count, line_height, options.leading);

        if options.overflow == Overflow::Expand {
            let bottom = self.to_absolute(Point::new(at.x, at.y + height_used))?.y;
            if bottom > self.page_limit() + EPSILON {
                return Err(FolioError::Overflow(format!(
                    "expanded text box ends at {:.1}pt, past the page limit of {:.1}pt",
                    bottom,
                    self.page_limit()
                )));
            }
        }

        for (i, line) in lines.iter().take(count).enumerate() {
            let y = at.y + i as f64 * (line_height + options.leading);
            self.draw_line(line, &spans, Point::new(at.x, y), size)?;
        }

        let truncated = count < lines.len();
        if truncated {
            log::warn!(
                "text box truncated: {} of {} line(s) drawn at {}pt",
                count,
                lines.len(),
                size
            );
        }

        Ok(TextBoxOutcome {
            font_size: size,
            lines_drawn: count,
            height_used,
            truncated,
        })
    }

    /// An image at the cursor, scaled to `height` with its native aspect
    /// ratio. Returns the height consumed.
    pub fn image(&mut self, source: &ImageSource, height: f64) -> Result<f64> {
        self.boxes.active()?;
        let loaded = load_image(source, &self.config.fetch)?;
        let width = loaded.width_for_height(height);

        if let Fit::Truncate = self.reserve(height, None)? {
            log::warn!("image does not fit in its box, skipped");
            return Ok(0.0);
        }
        let y = self.cursor_y()?;
        let origin = self.to_absolute(Point::new(0.0, y))?;
        self.renderer.draw_image(
            loaded,
            Rect {
                x: origin.x,
                y: origin.y,
                width,
                height,
            },
        );
        self.page_is_fresh = false;
        self.boxes.move_down(height, false)?;
        Ok(height)
    }

    /// Small muted caption text.
    pub fn label(&mut self, text: &RichText) -> Result<f64> {
        let rich = text.clone().colored(LABEL_COLOR);
        self.text(&rich, &TextOptions::sized(LABEL_FONT_SIZE))
    }

    pub(crate) fn line_height(&self, size: f64) -> f64 {
        self.renderer
            .line_metrics(&self.font_family, false, size)
            .height()
    }

    pub(crate) fn break_lines(&self, spans: &[Span], width: f64, size: f64) -> Vec<BrokenLine> {
        break_spans(spans, width, |ch, idx| {
            let bold = spans.get(idx).map(|s| s.bold).unwrap_or(false);
            self.renderer.char_width(ch, &self.font_family, bold, size)
        })
    }

    /// Draw one broken line with its top-left corner at the box-local `at`.
    pub(crate) fn draw_line(
        &mut self,
        line: &BrokenLine,
        spans: &[Span],
        at: Point,
        size: f64,
    ) -> Result<()> {
        let origin = self.to_absolute(at)?;
        let metrics = self.renderer.line_metrics(&self.font_family, false, size);

        let runs: Vec<GlyphRun> = line
            .segments
            .iter()
            .filter_map(|seg| {
                let span = spans.get(seg.span)?;
                Some(GlyphRun {
                    x: origin.x + seg.x,
                    width: seg.width,
                    text: seg.text.clone(),
                    font_family: self.font_family.clone(),
                    bold: span.bold,
                    font_size: size,
                    color: span.color.unwrap_or(Color::BLACK),
                    href: span.href.clone(),
                })
            })
            .collect();
        if runs.is_empty() {
            return Ok(());
        }

        self.renderer.draw_text(TextLine {
            top: origin.y,
            baseline: origin.y + metrics.ascent,
            height: metrics.height(),
            runs,
        });
        self.page_is_fresh = false;
        Ok(())
    }

    /// Make room for `height` at the cursor, starting a new page if the
    /// active box flows to the page bottom. Inside a fixed box that ends
    /// above the page limit nothing moves and the content is truncated.
    fn reserve(&mut self, height: f64, keep_with_next: Option<f64>) -> Result<Fit> {
        let top = self.boxes.absolute_cursor()?;
        let page_limit = self.page_limit();

        if let Some(fixed) = self.boxes.fixed_bottom() {
            if fixed < page_limit - EPSILON {
                return Ok(if top + height > fixed + EPSILON {
                    Fit::Truncate
                } else {
                    Fit::Place
                });
            }
        }

        let fresh_height = page_limit - self.config.layout.pagination.continuation_top;
        match decide_break(
            page_limit - top,
            fresh_height,
            height,
            keep_with_next,
            self.page_is_fresh,
        ) {
            BreakDecision::Place => Ok(Fit::Place),
            BreakDecision::Oversized => {
                log::warn!(
                    "{:.1}pt of content is taller than a page; it will be clipped",
                    height
                );
                Ok(Fit::Place)
            }
            BreakDecision::MoveToNextPage => {
                self.start_new_page();
                self.reserve(height, keep_with_next)
            }
        }
    }

    /// Reserve space for a unit that must share a page with the next one.
    pub(crate) fn reserve_row(&mut self, height: f64, keep_with_next: Option<f64>) -> Result<bool> {
        Ok(matches!(self.reserve(height, keep_with_next)?, Fit::Place))
    }
}
