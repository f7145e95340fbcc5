//! The native [`Renderer`]: records draw calls per page and hands them to
//! [`PdfWriter`] on finish. Recorded pages stay inspectable through
//! [`PdfRenderer::pages`].

use super::PdfWriter;
use crate::error::Result;
use crate::font::{FontContext, LineMetrics};
use crate::image_loader::LoadedImage;
use crate::render::{Metadata, Point, Rect, Renderer, TextLine};
use crate::style::Color;

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub from: Point,
    pub to: Point,
    pub width: f64,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct PlacedImage {
    pub image: LoadedImage,
    pub rect: Rect,
}

/// Everything drawn on one page, in page space.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub width: f64,
    pub height: f64,
    pub lines: Vec<TextLine>,
    pub images: Vec<PlacedImage>,
    pub strokes: Vec<Stroke>,
}

impl PageContent {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            lines: Vec::new(),
            images: Vec::new(),
            strokes: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct PdfRenderer {
    fonts: FontContext,
    pages: Vec<PageContent>,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[PageContent] {
        &self.pages
    }

    pub fn fonts(&self) -> &FontContext {
        &self.fonts
    }

    fn current_page(&mut self) -> Option<&mut PageContent> {
        let page = self.pages.last_mut();
        if page.is_none() {
            log::warn!("draw call before the first page, ignored");
        }
        page
    }
}

impl Renderer for PdfRenderer {
    fn char_width(&self, ch: char, family: &str, bold: bool, size: f64) -> f64 {
        self.fonts.char_width(ch, family, bold, size)
    }

    fn line_metrics(&self, family: &str, bold: bool, size: f64) -> LineMetrics {
        self.fonts.line_metrics(family, bold, size)
    }

    fn register_font(&mut self, family: &str, bold: bool, data: Vec<u8>) -> Result<()> {
        self.fonts.register(family, bold, data)
    }

    fn begin_page(&mut self, width: f64, height: f64) {
        self.pages.push(PageContent::new(width, height));
    }

    fn draw_text(&mut self, line: TextLine) {
        if let Some(page) = self.current_page() {
            page.lines.push(line);
        }
    }

    fn draw_image(&mut self, image: LoadedImage, rect: Rect) {
        if let Some(page) = self.current_page() {
            page.images.push(PlacedImage { image, rect });
        }
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Color) {
        if let Some(page) = self.current_page() {
            page.strokes.push(Stroke {
                from,
                to,
                width,
                color,
            });
        }
    }

    fn finish(&mut self, metadata: &Metadata) -> Result<Vec<u8>> {
        PdfWriter::new().write(&self.pages, metadata, &self.fonts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::DEFAULT_FAMILY;

    #[test]
    fn test_records_per_page() {
        let mut renderer = PdfRenderer::new();
        renderer.begin_page(612.0, 792.0);
        renderer.stroke_line(Point::new(0.0, 10.0), Point::new(100.0, 10.0), 1.0, Color::BLACK);
        renderer.begin_page(612.0, 792.0);
        renderer.draw_text(TextLine {
            top: 36.0,
            baseline: 44.6,
            height: 13.9,
            runs: Vec::new(),
        });

        let pages = renderer.pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].strokes.len(), 1);
        assert!(pages[0].lines.is_empty());
        assert_eq!(pages[1].lines.len(), 1);
    }

    #[test]
    fn test_draw_before_page_is_ignored() {
        let mut renderer = PdfRenderer::new();
        renderer.stroke_line(Point::default(), Point::default(), 1.0, Color::BLACK);
        assert!(renderer.pages().is_empty());
    }

    #[test]
    fn test_measures_with_helvetica() {
        let renderer = PdfRenderer::new();
        let width = renderer.measure_text("Total", DEFAULT_FAMILY, false, 12.0);
        assert!(width > 0.0);
        assert!(renderer.measure_text("Total", DEFAULT_FAMILY, true, 12.0) >= width);
        assert!((renderer.line_metrics(DEFAULT_FAMILY, false, 10.0).height() - 11.56).abs() < 0.001);
    }

    #[test]
    fn test_finish_writes_every_page() {
        let mut renderer = PdfRenderer::new();
        renderer.begin_page(612.0, 792.0);
        renderer.begin_page(612.0, 792.0);
        let bytes = renderer.finish(&Metadata::default()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 2"));
    }

    #[test]
    fn test_bad_font_data_is_rejected() {
        let mut renderer = PdfRenderer::new();
        assert!(renderer
            .register_font("Primary", false, vec![0, 1, 2, 3])
            .is_err());
    }
}
