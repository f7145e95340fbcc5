//! # Layout Engine
//!
//! [`Document`] is the drawing surface the composer talks to. It owns the
//! box stack, the current font family, the page count and the renderer.
//! All coordinates passed in are local to the active bounding box; they
//! are translated to page space right before the renderer sees them.
//!
//! The flow primitives live in [`flow`], tables in [`table`].

pub mod bounds;
pub mod flow;
pub mod page_break;
pub mod table;

pub use bounds::{BoundingBox, BoxHandle, BoxStack};
pub use flow::{Overflow, TextBoxOutcome, TextOptions};
pub use table::{row_has_bottom_border, ColumnWidth, Table, TableStyle};

use crate::config::RenderConfig;
use crate::error::Result;
use crate::font::DEFAULT_FAMILY;
use crate::render::{Point, Renderer};

/// US Letter at 72 dpi.
pub const PAGE_WIDTH: f64 = 612.0;
pub const PAGE_HEIGHT: f64 = 792.0;

pub const DEFAULT_FONT_SIZE: f64 = 12.0;

/// A document being laid out. Created once per render, consumed by
/// [`Document::finish`].
pub struct Document<R: Renderer> {
    renderer: R,
    boxes: BoxStack,
    config: RenderConfig,
    font_family: String,
    page_count: usize,
    /// A page break just happened and nothing has been drawn since.
    page_is_fresh: bool,
}

impl<R: Renderer> Document<R> {
    /// Open the document and its first page.
    pub fn new(mut renderer: R, config: &RenderConfig) -> Self {
        renderer.begin_page(PAGE_WIDTH, PAGE_HEIGHT);
        Self {
            renderer,
            boxes: BoxStack::new(),
            config: config.clone(),
            font_family: DEFAULT_FAMILY.to_string(),
            page_count: 1,
            page_is_fresh: false,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Use `family` for all subsequent text.
    pub fn set_font_family(&mut self, family: &str) {
        self.font_family = family.to_string();
    }

    pub fn register_font(&mut self, family: &str, bold: bool, data: Vec<u8>) -> Result<()> {
        self.renderer.register_font(family, bold, data)
    }

    // ─── Bounding Boxes ────────────────────────────────────────

    pub fn push_box(&mut self, origin: Point, width: f64, height: Option<f64>) -> BoxHandle {
        self.boxes.push(origin, width, height)
    }

    pub fn pop_box(&mut self, handle: BoxHandle) -> Result<()> {
        self.boxes
            .pop(handle, self.config.layout.strict_cursor)
            .map(|_| ())
    }

    /// Run `body` inside a new box. The box is popped on every exit path;
    /// if `body` fails its error is returned.
    pub fn with_box<T, F>(
        &mut self,
        origin: Point,
        width: f64,
        height: Option<f64>,
        body: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let handle = self.push_box(origin, width, height);
        let result = body(self);
        let popped = self.pop_box(handle);
        let value = result?;
        popped?;
        Ok(value)
    }

    pub fn box_depth(&self) -> usize {
        self.boxes.depth()
    }

    /// Width of the active box.
    pub fn bounds_width(&self) -> Result<f64> {
        Ok(self.boxes.active()?.width)
    }

    pub fn cursor_y(&self) -> Result<f64> {
        Ok(self.boxes.active()?.cursor())
    }

    pub fn move_down(&mut self, dy: f64) -> Result<()> {
        self.boxes.move_down(dy, self.config.layout.strict_cursor)
    }

    pub fn move_cursor_to(&mut self, y: f64) -> Result<()> {
        self.boxes
            .move_cursor_to(y, self.config.layout.strict_cursor)
    }

    pub fn to_absolute(&self, local: Point) -> Result<Point> {
        self.boxes.to_absolute(local)
    }

    // ─── Pages ─────────────────────────────────────────────────

    /// Page-space y that flowing content may not cross.
    pub fn page_limit(&self) -> f64 {
        PAGE_HEIGHT - self.config.layout.pagination.bottom_margin
    }

    pub fn start_new_page(&mut self) {
        self.renderer.begin_page(PAGE_WIDTH, PAGE_HEIGHT);
        self.page_count += 1;
        self.page_is_fresh = true;
        self.boxes
            .restart_page(self.config.layout.pagination.continuation_top);
        log::debug!("started page {}", self.page_count);
    }

    /// Serialize the document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.boxes.depth() > 0 {
            log::debug!("finishing with {} box(es) still open", self.boxes.depth());
        }
        log::debug!("finishing document with {} page(s)", self.page_count);
        self.renderer.finish(&self.config.metadata)
    }
}
