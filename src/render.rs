//! # Drawing Backend
//!
//! The seam between the layout engine and whatever paints the page. The
//! engine resolves every coordinate to absolute page space (origin at the
//! top-left corner, y growing downward) before calling into a [`Renderer`];
//! a renderer never sees box-local coordinates.
//!
//! [`crate::pdf::PdfRenderer`] is the native implementation.

use crate::error::Result;
use crate::font::LineMetrics;
use crate::image_loader::LoadedImage;
use crate::style::Color;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A styled piece of text on one line, positioned in page space.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub x: f64,
    pub width: f64,
    pub text: String,
    pub font_family: String,
    pub bold: bool,
    pub font_size: f64,
    pub color: Color,
    pub href: Option<String>,
}

/// One line of text in page space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Top edge of the line box.
    pub top: f64,
    /// Baseline the glyphs sit on.
    pub baseline: f64,
    pub height: f64,
    pub runs: Vec<GlyphRun>,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Document metadata embedded in the output.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

/// Measure and paint primitives. Implementations own their font state.
pub trait Renderer {
    /// Advance width of one character in points.
    fn char_width(&self, ch: char, family: &str, bold: bool, size: f64) -> f64;

    /// Vertical metrics of a face at `size`.
    fn line_metrics(&self, family: &str, bold: bool, size: f64) -> LineMetrics;

    /// Make a TrueType face available under `family`.
    fn register_font(&mut self, family: &str, bold: bool, data: Vec<u8>) -> Result<()>;

    /// Start a new page; subsequent draw calls land on it.
    fn begin_page(&mut self, width: f64, height: f64);

    fn draw_text(&mut self, line: TextLine);

    fn draw_image(&mut self, image: LoadedImage, rect: Rect);

    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Color);

    /// Serialize everything drawn so far.
    fn finish(&mut self, metadata: &Metadata) -> Result<Vec<u8>>;

    fn measure_text(&self, text: &str, family: &str, bold: bool, size: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, family, bold, size))
            .sum()
    }
}

/// Lets a caller lend a renderer to a render and inspect it afterwards.
impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn char_width(&self, ch: char, family: &str, bold: bool, size: f64) -> f64 {
        (**self).char_width(ch, family, bold, size)
    }

    fn line_metrics(&self, family: &str, bold: bool, size: f64) -> LineMetrics {
        (**self).line_metrics(family, bold, size)
    }

    fn register_font(&mut self, family: &str, bold: bool, data: Vec<u8>) -> Result<()> {
        (**self).register_font(family, bold, data)
    }

    fn begin_page(&mut self, width: f64, height: f64) {
        (**self).begin_page(width, height)
    }

    fn draw_text(&mut self, line: TextLine) {
        (**self).draw_text(line)
    }

    fn draw_image(&mut self, image: LoadedImage, rect: Rect) {
        (**self).draw_image(image, rect)
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Color) {
        (**self).stroke_line(from, to, width, color)
    }

    fn finish(&mut self, metadata: &Metadata) -> Result<Vec<u8>> {
        (**self).finish(metadata)
    }
}
